pub mod cell;
pub use cell::*;

pub mod memory_storage;
pub use memory_storage::*;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::TableError;

/// Column entry of a [`TableDefinition`], in the storage engine's own terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    /// SQL-style type name, e.g. `TEXT`, `INTEGER`, `BOOLEAN`
    pub sql_type: String,
    pub nullable: bool,
}

/// What the storage engine is asked to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    /// Logical, case-sensitive table name
    pub table_name: String,
    /// Name of the storage-assigned identity column
    pub id_column: String,
    pub columns: Vec<ColumnDefinition>,
}

impl TableDefinition {
    /// Name the table is stored under. Storage folds case, so two logical
    /// names that differ only in case collide physically.
    pub fn physical_name(&self) -> String {
        physical_name_of(&self.table_name)
    }
}

pub fn physical_name_of(table_name: &str) -> String {
    format!("table_{}", table_name.to_ascii_lowercase())
}

/// Opaque reference to one physical incarnation of a table. Rebuilding a
/// table hands out a new token; handles carrying the old one are stale.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageHandle {
    pub table_name: String,
    pub physical_name: String,
    pub token: Uuid,
}

impl StorageHandle {
    pub fn new(definition: &TableDefinition) -> Self {
        Self {
            table_name: definition.table_name.clone(),
            physical_name: definition.physical_name(),
            token: Uuid::new_v4(),
        }
    }
}

/// One row as the storage engine returns it: identity plus column values
/// rendered back to text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: u64,
    pub values: IndexMap<String, Option<String>>,
}

/// Primitive data-definition and data-manipulation operations the table
/// core delegates to.
pub trait StorageEngine: Send + Sync {
    /// Create a physical table. Fails if the physical name is taken.
    fn create_table(&self, definition: &TableDefinition) -> Result<StorageHandle, TableError>;

    /// Drop the physical table named by `definition` if it exists, then
    /// create it empty.
    fn drop_and_create_table(&self, definition: &TableDefinition) -> Result<StorageHandle, TableError>;

    /// Store one row and return the identity assigned to it. `values` maps
    /// column names to text; `None` stores null.
    fn insert_row(&self, handle: &StorageHandle, values: &IndexMap<String, Option<String>>) -> Result<u64, TableError>;

    /// Read every stored row in natural order.
    fn scan_table(&self, handle: &StorageHandle) -> Result<Vec<StoredRecord>, TableError>;

    /// Look a table up by its logical name.
    fn resolve_table_by_name(&self, table_name: &str) -> Result<StorageHandle, TableError>;

    /// Return the definition the table behind `handle` was created with.
    fn describe_table(&self, handle: &StorageHandle) -> Result<TableDefinition, TableError>;

    /// Logical names of every stored table, in creation order.
    fn list_tables(&self) -> Result<Vec<String>, TableError>;
}
