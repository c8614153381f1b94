//! Spreadsheet encoding
//!
//! Serializes a [`Table`] into a single-sheet xlsx workbook: a header row with the
//! column names followed by one row per table row. Null cells are left unwritten.

use crate::error::{Error, Result};
use crate::table::{Table, Value};
use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};

/// Writer library and version, as pinned in Cargo.toml
pub const WRITER_VERSION: &str = "rust_xlsxwriter 0.79";

/// Longest sheet name a workbook accepts
pub const MAX_SHEET_NAME_CHARS: usize = 31;

/// Characters that are not allowed anywhere in a sheet name
const FORBIDDEN_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Check `name` against the workbook sheet name rules
pub fn validate_sheet_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidSheetName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("sheet name must not be empty"));
    }
    if name.chars().count() > MAX_SHEET_NAME_CHARS {
        return Err(invalid("sheet name must be at most 31 characters"));
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_SHEET_CHARS.contains(c)) {
        return Err(invalid(&format!("sheet name must not contain '{}'", c)));
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return Err(invalid("sheet name must not begin or end with an apostrophe"));
    }
    Ok(())
}

/// Encode `table` as xlsx bytes with a single sheet named `sheet_name`
pub fn encode(table: &Table, sheet_name: &str) -> Result<Vec<u8>> {
    validate_sheet_name(sheet_name)?;

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name).map_err(encode_error)?;

    for (col, name) in table.schema().names().enumerate() {
        worksheet
            .write_string(0, column_index(col)?, name)
            .map_err(encode_error)?;
    }

    for (index, row) in table.rows().iter().enumerate() {
        let row_num = u32::try_from(index + 1)
            .map_err(|_| Error::Encode(format!("row {} exceeds the sheet limit", index + 1)))?;
        for (col, value) in row.iter().enumerate() {
            write_cell(worksheet, row_num, column_index(col)?, value)?;
        }
    }

    let bytes = workbook.save_to_buffer().map_err(encode_error)?;
    tracing::debug!(
        sheet = sheet_name,
        rows = table.row_count(),
        columns = table.column_count(),
        bytes = bytes.len(),
        "workbook encoded"
    );
    Ok(bytes)
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, value: &Value) -> Result<()> {
    match value {
        Value::Null => return Ok(()),
        Value::Bool(b) => worksheet.write_boolean(row, col, *b),
        Value::Int(i) => worksheet.write_number(row, col, *i as f64),
        Value::Float(f) => worksheet.write_number(row, col, *f),
        Value::String(s) => worksheet.write_string(row, col, s),
    }
    .map_err(encode_error)?;
    Ok(())
}

fn column_index(col: usize) -> Result<u16> {
    u16::try_from(col).map_err(|_| Error::Encode(format!("column {} exceeds the sheet limit", col + 1)))
}

fn encode_error(e: XlsxError) -> Error {
    Error::Encode(e.to_string())
}
