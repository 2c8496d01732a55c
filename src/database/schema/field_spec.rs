use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::database::{StorageType, TableError};

pub const UNSUPPORTED_FIELD_TYPE: &str =
    "Unsupported field type. Supported types are 'string', 'number' and 'boolean'.";

/// Caller-supplied description of one column: a name and a logical type.
///
/// `field_type` stays as the caller's text; it is checked when the field is
/// mapped to a column, not when it is parsed off the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

impl FieldSpec {
    pub fn new(name: &str, field_type: &str) -> Self {
        Self { name: name.to_string(), field_type: field_type.to_string() }
    }

    pub fn string(name: &str) -> Self {
        Self::new(name, "string")
    }

    pub fn number(name: &str) -> Self {
        Self::new(name, "number")
    }

    pub fn boolean(name: &str) -> Self {
        Self::new(name, "boolean")
    }
}

/// The closed set of logical field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Boolean,
}

impl FieldType {
    pub fn storage_type(&self) -> StorageType {
        match self {
            FieldType::String => StorageType::Text,
            FieldType::Number => StorageType::Integer,
            FieldType::Boolean => StorageType::Boolean,
        }
    }
}

impl FromStr for FieldType {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(FieldType::String),
            "number" => Ok(FieldType::Number),
            "boolean" => Ok(FieldType::Boolean),
            _ => Err(TableError::validation(UNSUPPORTED_FIELD_TYPE)),
        }
    }
}
