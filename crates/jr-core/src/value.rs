//! Spreadsheet cell values, rows and datasets.

use crate::error::{CoreError, Result};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;

/// Displayed when a judgement cell is missing.
pub const NO_JUDGEMENT: &str = "无";

/// A single cell of an uploaded table.
///
/// Spreadsheet parsers hand back strings, numbers, booleans and the odd
/// array. Nested objects have no variant of their own: they are kept as
/// their compact JSON text so a `history` or `dialog` cell survives a
/// round through the loader untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<CellValue>),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Text used for display and for building dialog turns.
    ///
    /// Returns `None` for null cells and empty strings.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::String(s) if s.is_empty() => None,
            CellValue::String(s) => Some(s.clone()),
            CellValue::Bool(b) => Some(b.to_string()),
            CellValue::Number(n) => Some(n.to_string()),
            CellValue::Array(_) => Some(self.to_json().to_string()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Null => Value::Null,
            CellValue::Bool(b) => Value::Bool(*b),
            CellValue::Number(n) => Value::Number(n.clone()),
            CellValue::String(s) => Value::String(s.clone()),
            CellValue::Array(items) => Value::Array(items.iter().map(CellValue::to_json).collect()),
        }
    }
}

impl From<Value> for CellValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => CellValue::Null,
            Value::Bool(b) => CellValue::Bool(b),
            Value::Number(n) => CellValue::Number(n),
            Value::String(s) => CellValue::String(s),
            Value::Array(items) if items.iter().any(Value::is_object) => {
                CellValue::String(Value::Array(items).to_string())
            }
            Value::Array(items) => CellValue::Array(items.into_iter().map(CellValue::from).collect()),
            obj @ Value::Object(_) => CellValue::String(obj.to_string()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n.into())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_text().unwrap_or_default())
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            CellValue::Null => serializer.serialize_unit(),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::Number(n) => n.serialize(serializer),
            CellValue::String(s) => serializer.serialize_str(s),
            CellValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Value::deserialize(deserializer).map(CellValue::from)
    }
}

/// Machine judgement as shown to the annotator.
///
/// Booleans map to `是`/`否`, missing or null cells to `无`.
pub fn display_judgement(value: Option<&CellValue>) -> String {
    match value {
        None | Some(CellValue::Null) => NO_JUDGEMENT.to_string(),
        Some(CellValue::Bool(true)) => "是".to_string(),
        Some(CellValue::Bool(false)) => "否".to_string(),
        Some(CellValue::String(s)) => s.clone(),
        Some(other) => other.as_text().unwrap_or_else(|| NO_JUDGEMENT.to_string()),
    }
}

/// One data row: column name to cell, in header order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    entries: Vec<(String, CellValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a cell, replacing an existing column of the same exact name.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<CellValue>) {
        let column = column.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column, value)),
        }
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.insert(column, value);
        self
    }

    /// Exact-name lookup.
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.entries.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(c, _)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.entries.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(c, v)| (c.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<CellValue>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (column, value) in &self.entries {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

struct RowVisitor;

impl<'de> Visitor<'de> for RowVisitor {
    type Value = Row;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object of column name to cell value")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Row, A::Error> {
        let mut row = Row::new();
        while let Some((column, value)) = access.next_entry::<String, CellValue>()? {
            row.insert(column, value);
        }
        Ok(row)
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(RowVisitor)
    }
}

/// A loaded table. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct Dataset {
    filename: String,
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Dataset {
    /// Column names are taken from the first row.
    pub fn new(filename: impl Into<String>, rows: Vec<Row>) -> Result<Self> {
        let filename = filename.into();
        let first = rows
            .first()
            .ok_or_else(|| CoreError::EmptyDataset { filename: filename.clone() })?;
        let columns = first.columns().map(str::to_string).collect();
        Ok(Self { filename, columns, rows })
    }

    /// Load from a JSON array of records, e.g. the backend's `previewData`.
    pub fn from_json_records(filename: impl Into<String>, json: &str) -> Result<Self> {
        let rows: Vec<Row> = serde_json::from_str(json)?;
        Self::new(filename, rows)
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
