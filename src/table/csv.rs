//! CSV ingestion
//!
//! The first record is the header. The delimiter is sniffed from the header line
//! among `,` `;` tab and `|`. Cells are typed per column: integer, float,
//! boolean, otherwise string. Columns of strings keep the original cell text.

use super::{Column, ColumnType, Table, TableSchema, Value};
use crate::error::{Error, Result};
use crate::types::FileFormat;

/// Candidate delimiters; on a tie the earlier one wins
const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Parse CSV content into a table
pub fn parse(content: &[u8]) -> Result<Table> {
    let content = content.strip_prefix(b"\xef\xbb\xbf").unwrap_or(content);
    let text = std::str::from_utf8(content)
        .map_err(|e| parse_error(format!("content is not valid UTF-8: {}", e)))?;

    let delimiter = sniff_delimiter(text);
    tracing::debug!(delimiter = %(delimiter as char).escape_default(), "sniffed CSV delimiter");

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| parse_error(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    let names = column_names(headers);

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| parse_error(e.to_string()))?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        if record.len() != names.len() {
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            return Err(parse_error(format!(
                "line {} has {} fields, expected {}",
                line,
                record.len(),
                names.len()
            )));
        }
        raw_rows.push(record.iter().map(str::to_string).collect());
    }

    let mut types = vec![ColumnType::Null; names.len()];
    for row in &raw_rows {
        for (ty, field) in types.iter_mut().zip(row) {
            *ty = ty.widen(classify_field(field));
        }
    }

    let rows = raw_rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&types)
                .map(|(field, ty)| typed_cell(field, *ty))
                .collect()
        })
        .collect();

    let columns = names
        .into_iter()
        .zip(types)
        .map(|(name, column_type)| Column { name, column_type })
        .collect();

    Table::new(TableSchema::new(columns), rows)
}

/// Pick the candidate delimiter that occurs most often in the header line
///
/// The header is the first non-blank line. Characters inside double quotes are
/// not counted.
fn sniff_delimiter(text: &str) -> u8 {
    let header = text
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or_default();

    let mut counts = [0usize; DELIMITERS.len()];
    let mut quoted = false;
    for byte in header.bytes() {
        if byte == b'"' {
            quoted = !quoted;
        } else if !quoted && let Some(i) = DELIMITERS.iter().position(|d| *d == byte) {
            counts[i] += 1;
        }
    }

    let mut best = DELIMITERS[0];
    let mut best_count = 0;
    for (candidate, count) in DELIMITERS.into_iter().zip(counts) {
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

/// Fill blank header names and make duplicates unique
fn column_names(headers: Vec<String>) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(headers.len());
    for (index, header) in headers.into_iter().enumerate() {
        let header = header.trim();
        let base = if header.is_empty() {
            format!("column{}", index + 1)
        } else {
            header.to_string()
        };

        let mut name = base.clone();
        let mut suffix = 1;
        while names.contains(&name) {
            name = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        names.push(name);
    }
    names
}

/// Narrowest type of a single raw field
fn classify_field(field: &str) -> ColumnType {
    let field = field.trim();
    if field.is_empty() {
        ColumnType::Null
    } else if parse_int(field).is_some() {
        ColumnType::Integer
    } else if parse_float(field).is_some() {
        ColumnType::Float
    } else if parse_bool(field).is_some() {
        ColumnType::Boolean
    } else {
        ColumnType::String
    }
}

/// Convert a raw field into a cell of the column's final type
fn typed_cell(field: String, column_type: ColumnType) -> Value {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    let value = match column_type {
        ColumnType::Integer => parse_int(trimmed).map(Value::Int),
        ColumnType::Float => parse_float(trimmed).map(Value::Float),
        ColumnType::Boolean => parse_bool(trimmed).map(Value::Bool),
        ColumnType::Null | ColumnType::String => None,
    };
    value.unwrap_or(Value::String(field))
}

/// Codes such as `007` or `0812` are identifiers, not numbers
fn has_leading_zero(field: &str) -> bool {
    let digits = field.trim_start_matches(['-', '+']);
    let mut chars = digits.chars();
    chars.next() == Some('0') && chars.next().is_some_and(|c| c.is_ascii_digit())
}

fn parse_int(field: &str) -> Option<i64> {
    if has_leading_zero(field) {
        return None;
    }
    field.parse().ok()
}

fn parse_float(field: &str) -> Option<f64> {
    if has_leading_zero(field) {
        return None;
    }
    // Rust also accepts "inf" and "NaN", which are words in a CSV
    if !field.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse::<f64>().ok().filter(|f| f.is_finite())
}

fn parse_bool(field: &str) -> Option<bool> {
    if field.eq_ignore_ascii_case("true") {
        Some(true)
    } else if field.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn parse_error(message: String) -> Error {
    Error::Parse {
        format: FileFormat::Csv,
        message,
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn types(table: &Table) -> Vec<ColumnType> {
        table
            .schema()
            .columns()
            .iter()
            .map(|c| c.column_type)
            .collect()
    }

    #[test]
    fn test_header_and_rows() {
        let table = parse(b"id,nama,nilai,lulus\n1,Budi,8.5,true\n2,Siti,9,FALSE\n").unwrap();

        let names: Vec<&str> = table.schema().names().collect();
        assert_eq!(names, vec!["id", "nama", "nilai", "lulus"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(
            types(&table),
            vec![
                ColumnType::Integer,
                ColumnType::String,
                ColumnType::Float,
                ColumnType::Boolean
            ]
        );
        assert_eq!(table.rows()[1][2], Value::Float(9.0));
        assert_eq!(table.rows()[1][3], Value::Bool(false));
    }

    #[test]
    fn test_sniffs_semicolon_and_tab() {
        let table = parse(b"a;b;c\n1;2,5;x\n").unwrap();
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.rows()[0][1], Value::String("2,5".into()));

        let table = parse(b"a\tb\n1\t2\n").unwrap();
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.rows()[0][1], Value::Int(2));
    }

    #[test]
    fn test_sniff_delimiter_prefers_comma_on_tie() {
        assert_eq!(sniff_delimiter("a,b;c\n"), b',');
        assert_eq!(sniff_delimiter("single\n"), b',');
        assert_eq!(sniff_delimiter("a|b|c\n1|2|3"), b'|');
    }

    #[test]
    fn test_sniff_delimiter_skips_leading_blank_lines() {
        assert_eq!(sniff_delimiter("\n  \na;b;c\n1;2;3\n"), b';');

        let table = parse(b"\na;b;c\n1;2;3\n").unwrap();
        let names: Vec<&str> = table.schema().names().collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(table.rows()[0][2], Value::Int(3));
    }

    #[test]
    fn test_sniff_delimiter_ignores_quoted_text() {
        assert_eq!(sniff_delimiter("\"x;y;z\",b\n1,2\n"), b',');

        let table = parse(b"\"x;y;z\",b\n1,2\n").unwrap();
        let names: Vec<&str> = table.schema().names().collect();
        assert_eq!(names, vec!["x;y;z", "b"]);
        assert_eq!(table.rows()[0][1], Value::Int(2));
    }

    #[test]
    fn test_empty_fields_are_null() {
        let table = parse(b"a,b\n1,\n,x\n").unwrap();
        assert_eq!(table.rows()[0][1], Value::Null);
        assert_eq!(table.rows()[1][0], Value::Null);
        assert_eq!(types(&table), vec![ColumnType::Integer, ColumnType::String]);
    }

    #[test]
    fn test_mixed_column_keeps_raw_text() {
        let table = parse(b"v\n1\nabc\n2.50\n").unwrap();
        assert_eq!(types(&table), vec![ColumnType::String]);
        assert_eq!(table.rows()[0][0], Value::String("1".into()));
        assert_eq!(table.rows()[2][0], Value::String("2.50".into()));
    }

    #[test]
    fn test_leading_zero_codes_stay_text() {
        let table = parse(b"kode,telp\n007,0812345\n010,0813\n").unwrap();
        assert_eq!(types(&table), vec![ColumnType::String, ColumnType::String]);
        assert_eq!(table.rows()[0][0], Value::String("007".into()));

        let table = parse(b"n\n0\n0.5\n-3\n").unwrap();
        assert_eq!(types(&table), vec![ColumnType::Float]);
    }

    #[test]
    fn test_words_are_not_floats() {
        let table = parse(b"w\ninf\nNaN\n").unwrap();
        assert_eq!(types(&table), vec![ColumnType::String]);
    }

    #[test]
    fn test_header_names_filled_and_deduplicated() {
        let table = parse(b"a,,a,a\n1,2,3,4\n").unwrap();
        let names: Vec<&str> = table.schema().names().collect();
        assert_eq!(names, vec!["a", "column2", "a_1", "a_2"]);
    }

    #[test]
    fn test_ragged_row_names_line() {
        let err = parse(b"a,b\n1,2\n3\n").unwrap_err();
        match err {
            Error::Parse { format, message } => {
                assert_eq!(format, FileFormat::Csv);
                assert!(message.contains("line 3"), "{}", message);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_blank_rows_skipped() {
        let table = parse(b"a,b\n1,2\n\n,\n3,4\n").unwrap();
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_quoted_fields() {
        let table = parse(b"nama,alamat\nBudi,\"Jl. Merdeka, No. 1\"\n").unwrap();
        assert_eq!(table.rows()[0][1], Value::String("Jl. Merdeka, No. 1".into()));
    }

    #[test]
    fn test_bom_and_crlf() {
        let table = parse(b"\xef\xbb\xbfid,nama\r\n1,Budi\r\n").unwrap();
        let names: Vec<&str> = table.schema().names().collect();
        assert_eq!(names, vec!["id", "nama"]);
        assert_eq!(table.rows()[0][0], Value::Int(1));
    }

    #[test]
    fn test_rejects_invalid_utf8() {
        let err = parse(b"a,b\n\xff,1\n").unwrap_err();
        assert!(matches!(err, Error::Parse { format: FileFormat::Csv, .. }));
    }

    #[test]
    fn test_header_only_has_no_rows() {
        let table = parse(b"a,b,c\n").unwrap();
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.column_count(), 3);
    }
}
