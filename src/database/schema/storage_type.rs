use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Physical column kind a table column is stored as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageType {
    /// Variable length character data
    Text,
    /// 64-bit signed integer
    Integer,
    /// true / false
    Boolean,
}

impl StorageType {
    /// SQL-style type name used in table definitions handed to storage.
    pub fn sql_name(&self) -> &'static str {
        match self {
            StorageType::Text => "TEXT",
            StorageType::Integer => "INTEGER",
            StorageType::Boolean => "BOOLEAN",
        }
    }

    /// Inverse of [`StorageType::sql_name`], case-insensitive.
    pub fn from_sql_name(name: &str) -> Option<StorageType> {
        match name.to_ascii_uppercase().as_str() {
            "TEXT" => Some(StorageType::Text),
            "INTEGER" => Some(StorageType::Integer),
            "BOOLEAN" => Some(StorageType::Boolean),
            _ => None,
        }
    }
}

impl Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.sql_name())
    }
}
