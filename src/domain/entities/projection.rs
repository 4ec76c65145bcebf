use std::fmt;

use crate::domain::entities::field::Field;

/// One record attribute. Projection only ever stringifies it.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Int(i64),
    Real(f64),
    Text(String),
    Bool(bool),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Int(value) => write!(f, "{value}"),
            Cell::Real(value) => write!(f, "{value}"),
            Cell::Text(value) => f.write_str(value),
            Cell::Bool(value) => write!(f, "{value}"),
        }
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Int(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Real(value)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Cell::Null, Into::into)
    }
}

/// A fetched record whose attributes line up with its catalog order.
pub trait Record {
    fn cells(&self) -> Vec<Cell>;
}

/// Untyped row as returned by a row store.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row(pub Vec<Cell>);

impl Record for Row {
    fn cells(&self) -> Vec<Cell> {
        self.0.clone()
    }
}

/// Zips each record against `fields` and keeps the visible attributes.
pub fn project<R: Record>(fields: &[Field], records: &[R]) -> Vec<Vec<String>> {
    records
        .iter()
        .map(|record| {
            fields
                .iter()
                .zip(record.cells())
                .filter(|(field, _)| field.visible)
                .map(|(_, cell)| cell.to_string())
                .collect()
        })
        .collect()
}
