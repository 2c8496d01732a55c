use serde::{Deserialize, Serialize};

use crate::database::StorageType;

/// A single stored value, already coerced into its column's physical type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Integer(i64),
    Boolean(bool),
    Text(String),
}

impl Cell {
    /// Coerce caller text into `storage_type`. `None` becomes null.
    pub fn coerce(storage_type: StorageType, value: Option<&str>) -> Result<Cell, String> {
        let Some(value) = value else {
            return Ok(Cell::Null);
        };

        match storage_type {
            StorageType::Text => Ok(Cell::Text(value.to_string())),
            StorageType::Integer => value.trim().parse::<i64>()
                .map(Cell::Integer)
                .map_err(|_| format!("'{value}' is not a valid integer")),
            StorageType::Boolean => match value.trim() {
                "t" | "T" | "true" | "True" | "TRUE" | "1" => Ok(Cell::Boolean(true)),
                "f" | "F" | "false" | "False" | "FALSE" | "0" => Ok(Cell::Boolean(false)),
                _ => Err(format!("'{value}' is not a valid boolean")),
            },
        }
    }

    /// Render the cell back to the text form rows are exchanged in.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Integer(n) => Some(n.to_string()),
            Cell::Boolean(b) => Some(b.to_string()),
            Cell::Text(s) => Some(s.clone()),
        }
    }

    pub fn matches(&self, storage_type: StorageType) -> bool {
        matches!(
            (self, storage_type),
            (Cell::Null, _)
                | (Cell::Text(_), StorageType::Text)
                | (Cell::Integer(_), StorageType::Integer)
                | (Cell::Boolean(_), StorageType::Boolean)
        )
    }
}
