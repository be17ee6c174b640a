//! Row formatting.

use indexmap::IndexMap;

use crate::column::Column;
use crate::error::{Error, Result};
use crate::opts::CursorType;
use crate::protocol::backend::DataRow;
use crate::value::Value;

/// A fetched row.
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    /// Values in column order
    Array(Vec<Value>),
    /// Column name to value, in column order
    Dict(IndexMap<String, Value>),
}

impl Row {
    /// Get the number of values.
    pub fn len(&self) -> usize {
        match self {
            Row::Array(values) => values.len(),
            Row::Dict(map) => map.len(),
        }
    }

    /// Check if the row has no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get a value by column position.
    pub fn get(&self, index: usize) -> Option<&Value> {
        match self {
            Row::Array(values) => values.get(index),
            Row::Dict(map) => map.get_index(index).map(|(_, v)| v),
        }
    }

    /// Get a value by column name. Only name-keyed rows carry names.
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        match self {
            Row::Array(_) => None,
            Row::Dict(map) => map.get(name),
        }
    }

    /// Take the values in column order, dropping names.
    pub fn into_values(self) -> Vec<Value> {
        match self {
            Row::Array(values) => values,
            Row::Dict(map) => map.into_values().collect(),
        }
    }
}

/// Render a row in the shape selected by `cursor_type`.
pub fn format_row(cursor_type: CursorType, columns: &[Column], row: &DataRow) -> Result<Row> {
    match cursor_type {
        CursorType::Array => format_row_as_array(columns, row).map(Row::Array),
        CursorType::Dict => format_row_as_dict(columns, row).map(Row::Dict),
    }
}

/// Convert every field through its column, keeping positions.
pub fn format_row_as_array(columns: &[Column], row: &DataRow) -> Result<Vec<Value>> {
    check_width(columns, row)?;
    columns
        .iter()
        .zip(row.iter())
        .map(|(column, raw)| column.convert(raw))
        .collect()
}

/// Convert every field through its column, keyed by column name.
pub fn format_row_as_dict(columns: &[Column], row: &DataRow) -> Result<IndexMap<String, Value>> {
    check_width(columns, row)?;
    let mut map = IndexMap::with_capacity(columns.len());
    for (column, raw) in columns.iter().zip(row.iter()) {
        map.insert(column.name().to_string(), column.convert(raw)?);
    }
    Ok(map)
}

fn check_width(columns: &[Column], row: &DataRow) -> Result<()> {
    if columns.len() != row.len() {
        return Err(Error::Protocol(format!(
            "DataRow has {} values but the result has {} columns",
            row.len(),
            columns.len()
        )));
    }
    Ok(())
}
