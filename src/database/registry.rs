use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::database::{SchemaProvider, StorageHandle, TableError, TableSchema};

/// Registry entry for one table: its current schema and the physical
/// table backing it.
///
/// `storage_handle` is `None` between registration and a successful
/// physical create; an entry left like that is an orphan.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRegistration {
    pub table_name: String,
    pub schema: Arc<TableSchema>,
    pub storage_handle: Option<StorageHandle>,
    pub registered_at: DateTime<Utc>,
    pub altered_at: Option<DateTime<Utc>>,
}

impl TableRegistration {
    pub fn is_materialized(&self) -> bool {
        self.storage_handle.is_some()
    }

    /// The storage handle, or a storage error when the table was never
    /// materialized.
    pub fn handle(&self) -> Result<&StorageHandle, TableError> {
        self.storage_handle.as_ref().ok_or_else(|| TableError::storage(format!(
            "table '{}' is registered but has no physical storage",
            self.table_name
        )))
    }
}

/// Table name → current registration. Names match exactly and
/// case-sensitively.
#[derive(Debug, Default)]
pub struct TableRegistry {
    tables: IndexMap<String, TableRegistration>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, schema: TableSchema) -> Result<&TableRegistration, TableError> {
        if self.tables.contains_key(&schema.table_name) {
            return Err(TableError::Conflict(schema.table_name));
        }

        let table_name = schema.table_name.clone();
        let registration = TableRegistration {
            table_name: table_name.clone(),
            schema: Arc::new(schema),
            storage_handle: None,
            registered_at: Utc::now(),
            altered_at: None,
        };
        let entry = self.tables.entry(table_name).or_insert(registration);
        Ok(&*entry)
    }

    pub fn resolve(&self, table_name: &str) -> Result<&TableRegistration, TableError> {
        self.tables.get(table_name)
            .ok_or_else(|| TableError::NotFound(table_name.to_string()))
    }

    /// Swap in a new schema and handle for an existing table.
    pub fn replace(&mut self, table_name: &str, new_schema: TableSchema, new_handle: StorageHandle) -> Result<&TableRegistration, TableError> {
        let registration = self.tables.get_mut(table_name)
            .ok_or_else(|| TableError::NotFound(table_name.to_string()))?;

        registration.schema = Arc::new(new_schema);
        registration.storage_handle = Some(new_handle);
        registration.altered_at = Some(Utc::now());
        Ok(&*registration)
    }

    /// Record the handle of a freshly created physical table.
    pub fn attach_handle(&mut self, table_name: &str, handle: StorageHandle) -> Result<&TableRegistration, TableError> {
        let registration = self.tables.get_mut(table_name)
            .ok_or_else(|| TableError::NotFound(table_name.to_string()))?;

        registration.storage_handle = Some(handle);
        Ok(&*registration)
    }

    /// Insert an already materialized table, used when rebuilding the
    /// registry from the storage catalog.
    pub fn restore(&mut self, schema: TableSchema, handle: StorageHandle) -> Result<&TableRegistration, TableError> {
        let table_name = schema.table_name.clone();
        self.register(schema)?;
        self.attach_handle(&table_name, handle)
    }

    pub fn contains(&self, table_name: &str) -> bool {
        self.tables.contains_key(table_name)
    }

    /// Registered names in registration order. After [`crate::InternalDb::open`]
    /// this is the storage catalog's creation order.
    pub fn table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl SchemaProvider for TableRegistry {
    fn schema_of(&self, table_name: &str) -> Option<Arc<TableSchema>> {
        self.tables.get(table_name).map(|r| Arc::clone(&r.schema))
    }
}
