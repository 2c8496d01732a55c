use serde::{Deserialize, Serialize};

use crate::database::{FieldType, StorageType};

/// Physical definition of one column, derived from a [`crate::FieldSpec`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub storage_type: StorageType,
    pub nullable: bool,
}

impl ColumnDescriptor {
    /// Columns produced from field specs always accept null so partial rows
    /// can be stored.
    pub fn from_field(name: &str, field_type: FieldType) -> ColumnDescriptor {
        ColumnDescriptor {
            name: name.to_string(),
            storage_type: field_type.storage_type(),
            nullable: true,
        }
    }
}
