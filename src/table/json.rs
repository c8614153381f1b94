//! JSON ingestion
//!
//! Accepts an array of objects, a single object (one row) or newline-delimited
//! JSON objects. Columns are the union of object keys in first-seen order.

use super::{Table, Value, infer_table};
use crate::error::{Error, Result};
use crate::types::FileFormat;
use serde_json::{Map, Value as JsonValue};

/// Parse JSON content into a table
pub fn parse(content: &[u8]) -> Result<Table> {
    let content = content.strip_prefix(b"\xef\xbb\xbf").unwrap_or(content);
    let records = records(content)?;

    let mut names: Vec<String> = Vec::new();
    for record in &records {
        for key in record.keys() {
            if !names.iter().any(|n| n == key) {
                names.push(key.clone());
            }
        }
    }

    let cells = records
        .into_iter()
        .map(|mut record| {
            names
                .iter()
                .map(|name| record.remove(name).map(cell).unwrap_or(Value::Null))
                .collect()
        })
        .collect();

    infer_table(names, cells)
}

/// Split the document into row objects
fn records(content: &[u8]) -> Result<Vec<Map<String, JsonValue>>> {
    match serde_json::from_slice::<JsonValue>(content) {
        Ok(JsonValue::Array(items)) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                JsonValue::Object(map) => Ok(map),
                other => Err(parse_error(format!(
                    "element {} is {}, expected an object",
                    index,
                    kind(&other)
                ))),
            })
            .collect(),
        Ok(JsonValue::Object(map)) => Ok(vec![map]),
        Ok(other) => Err(parse_error(format!(
            "top-level value is {}, expected an array of objects",
            kind(&other)
        ))),
        Err(whole) => json_lines(content).ok_or_else(|| parse_error(whole.to_string())),
    }
}

/// Newline-delimited objects; `None` if any non-blank line is not an object
fn json_lines(content: &[u8]) -> Option<Vec<Map<String, JsonValue>>> {
    let mut rows = Vec::new();
    for line in content.split(|b| *b == b'\n') {
        let line = line.trim_ascii();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_slice::<JsonValue>(line) {
            Ok(JsonValue::Object(map)) => rows.push(map),
            _ => return None,
        }
    }
    // A single line would already have parsed as a whole document
    (rows.len() > 1).then_some(rows)
}

fn cell(value: JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
        },
        JsonValue::String(s) => Value::String(s),
        // Nested structures are kept as compact JSON text
        nested @ (JsonValue::Array(_) | JsonValue::Object(_)) => Value::String(nested.to_string()),
    }
}

fn kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

fn parse_error(message: String) -> Error {
    Error::Parse {
        format: FileFormat::Json,
        message,
    }
}
