//! In-memory tables and schema inference
//!
//! A [`Table`] is the intermediate form between ingestion and spreadsheet output:
//! an ordered list of typed columns ([`TableSchema`]) and ordered rows of
//! [`Value`]s. Every row has exactly one cell per column.
//!
//! Column types are inferred explicitly from the observed values:
//!
//! | observed non-null values      | column type |
//! |-------------------------------|-------------|
//! | none                          | `Null`      |
//! | only booleans                 | `Boolean`   |
//! | only integers                 | `Integer`   |
//! | integers and/or floats        | `Float`     |
//! | only strings                  | `String`    |
//! | any other mix                 | `String`    |
//!
//! ## Submodules
//!
//! - [`json`] - arrays of objects, single objects and JSON lines
//! - [`csv`] - delimiter-separated values with a header row

use crate::error::{Error, Result};
use crate::types::FileFormat;
use serde::Serialize;

pub mod csv;
pub mod json;

/// Inferred type of a column
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Every value is null
    Null,
    /// `true` / `false`
    Boolean,
    /// 64-bit signed integers
    Integer,
    /// 64-bit floats (integers widen to this)
    Float,
    /// Text, also the fallback for heterogeneous columns
    String,
}

impl ColumnType {
    /// Smallest type able to hold values of both `self` and `other`
    pub fn widen(self, other: ColumnType) -> ColumnType {
        use ColumnType::*;
        match (self, other) {
            (Null, t) | (t, Null) => t,
            (a, b) if a == b => a,
            (Integer, Float) | (Float, Integer) => Float,
            _ => String,
        }
    }
}

/// A single cell
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Missing or explicit null
    Null,
    /// Boolean cell
    Bool(bool),
    /// Integer cell
    Int(i64),
    /// Float cell
    Float(f64),
    /// Text cell
    String(String),
}

impl Value {
    /// The narrowest column type that holds this value
    pub fn column_type(&self) -> ColumnType {
        match self {
            Value::Null => ColumnType::Null,
            Value::Bool(_) => ColumnType::Boolean,
            Value::Int(_) => ColumnType::Integer,
            Value::Float(_) => ColumnType::Float,
            Value::String(_) => ColumnType::String,
        }
    }

    /// Convert this value to fit a column of type `target`
    ///
    /// Integers become floats in float columns; everything non-null becomes its
    /// text form in string columns.
    pub fn coerce(self, target: ColumnType) -> Value {
        match (self, target) {
            (Value::Null, _) => Value::Null,
            (Value::Int(i), ColumnType::Float) => Value::Float(i as f64),
            (Value::Bool(b), ColumnType::String) => Value::String(b.to_string()),
            (Value::Int(i), ColumnType::String) => Value::String(i.to_string()),
            (Value::Float(f), ColumnType::String) => Value::String(f.to_string()),
            (value, _) => value,
        }
    }
}

/// A named, typed column
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Column {
    /// Header text
    pub name: String,
    /// Inferred type
    pub column_type: ColumnType,
}

/// Ordered column list produced by inference
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TableSchema {
    columns: Vec<Column>,
}

impl TableSchema {
    /// Build a schema from columns in display order
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Columns in display order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the schema has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in display order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

/// Ordered columns plus ordered rows
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    schema: TableSchema,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Build a table, checking that every row matches the schema width
    pub fn new(schema: TableSchema, rows: Vec<Vec<Value>>) -> Result<Self> {
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != schema.len())
        {
            return Err(Error::Other(format!(
                "row {} has {} cells, schema has {} columns",
                index,
                row.len(),
                schema.len()
            )));
        }
        Ok(Self { schema, rows })
    }

    /// The inferred schema
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Data rows in input order
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of data rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.schema.len()
    }
}

/// Infer column types from raw cells and coerce every cell to its column's type
///
/// `names` and each row of `cells` must have the same length.
pub(crate) fn infer_table(names: Vec<String>, cells: Vec<Vec<Value>>) -> Result<Table> {
    let mut types = vec![ColumnType::Null; names.len()];
    for row in &cells {
        for (ty, value) in types.iter_mut().zip(row) {
            *ty = ty.widen(value.column_type());
        }
    }

    let rows = cells
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&types)
                .map(|(value, ty)| value.coerce(*ty))
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

/// Parse `content` as `format` into a non-empty table
///
/// Fails with [`Error::Parse`] on malformed input and [`Error::EmptyTable`] when
/// the content holds no data rows or no columns.
pub fn load(content: &[u8], format: FileFormat) -> Result<Table> {
    tracing::info!(format = %format, bytes = content.len(), "loading table");

    let table = match format {
        FileFormat::Json => json::parse(content)?,
        FileFormat::Csv => csv::parse(content)?,
    };

    if table.row_count() == 0 || table.column_count() == 0 {
        return Err(Error::EmptyTable { format });
    }

    tracing::info!(
        rows = table.row_count(),
        columns = table.column_count(),
        "data loaded"
    );
    Ok(table)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widen() {
        use ColumnType::*;
        assert_eq!(Null.widen(Integer), Integer);
        assert_eq!(Boolean.widen(Null), Boolean);
        assert_eq!(Integer.widen(Integer), Integer);
        assert_eq!(Integer.widen(Float), Float);
        assert_eq!(Float.widen(Integer), Float);
        assert_eq!(Boolean.widen(Integer), String);
        assert_eq!(String.widen(Float), String);
    }

    #[test]
    fn test_coerce() {
        assert_eq!(Value::Int(3).coerce(ColumnType::Float), Value::Float(3.0));
        assert_eq!(
            Value::Bool(true).coerce(ColumnType::String),
            Value::String("true".into())
        );
        assert_eq!(
            Value::Float(1.5).coerce(ColumnType::String),
            Value::String("1.5".into())
        );
        assert_eq!(Value::Null.coerce(ColumnType::String), Value::Null);
    }

    #[test]
    fn test_infer_table_widens_columns() {
        let table = infer_table(
            vec!["a".into(), "b".into(), "c".into()],
            vec![
                vec![Value::Int(1), Value::Bool(true), Value::Null],
                vec![Value::Float(2.5), Value::Int(7), Value::Null],
            ],
        )
        .unwrap();

        let types: Vec<ColumnType> = table
            .schema()
            .columns()
            .iter()
            .map(|c| c.column_type)
            .collect();
        assert_eq!(
            types,
            vec![ColumnType::Float, ColumnType::String, ColumnType::Null]
        );
        assert_eq!(table.rows()[0][0], Value::Float(1.0));
        assert_eq!(table.rows()[1][1], Value::String("7".into()));
    }

    #[test]
    fn test_table_rejects_ragged_rows() {
        let schema = TableSchema::new(vec![Column {
            name: "a".into(),
            column_type: ColumnType::Integer,
        }]);
        let result = Table::new(schema, vec![vec![Value::Int(1), Value::Int(2)]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_empty_tables() {
        let err = load(b"[]", FileFormat::Json).unwrap_err();
        assert!(matches!(err, Error::EmptyTable { format: FileFormat::Json }));

        let err = load(b"id,name\n", FileFormat::Csv).unwrap_err();
        assert!(matches!(err, Error::EmptyTable { format: FileFormat::Csv }));
    }

    #[test]
    fn test_load_rejects_tables_without_columns() {
        let cases: [&[u8]; 3] = [b"{}", b"[{}]", b"[{}, {}]"];
        for content in cases {
            let err = load(content, FileFormat::Json).unwrap_err();
            assert!(matches!(err, Error::EmptyTable { format: FileFormat::Json }));
        }
    }

    #[test]
    fn test_load_dispatches_by_format() {
        let table = load(b"[{\"x\": 1}, {\"x\": 2}]", FileFormat::Json).unwrap();
        assert_eq!(table.row_count(), 2);

        let table = load(b"x\n1\n2\n3\n", FileFormat::Csv).unwrap();
        assert_eq!(table.row_count(), 3);
    }
}
