use std::{ffi::OsString, sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard}};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::database::{
    schema_from_definition, DbConfig, FieldMapper, FieldSpec, MemoryStorage, Row, RowAccess,
    RowScan, RowValues, SchemaBuilder, SchemaMaterializer, SchemaProvider, StorageEngine,
    TableError, TableRegistration, TableRegistry, TableSchema,
};

pub type Db<S = MemoryStorage> = Arc<RwLock<InternalDb<S>>>;

/// Echo of a successful table definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinedTable {
    pub table_name: String,
    pub fields: Vec<FieldSpec>,
}

/// Owns the table registry and the storage engine, and runs the define,
/// redefine and row flows over them.
pub struct InternalDb<S: StorageEngine = MemoryStorage> {
    config: DbConfig,
    registry: TableRegistry,
    storage: S,
}

impl InternalDb<MemoryStorage> {
    pub fn new_db() -> Self {
        Self::new_db_with_config(DbConfig::default())
    }

    pub fn new_db_with_config(config: DbConfig) -> Self {
        Self::with_storage(config, MemoryStorage::new())
    }

    /// Load a storage file written by [`InternalDb::save_to_file`] and
    /// rebuild the registry from it.
    pub fn load_from_file(config: DbConfig, file_path: &OsString) -> Result<Self, TableError> {
        let storage = MemoryStorage::load_from_file(file_path)?;
        Self::open(config, storage)
    }

    pub fn save_to_file(&self, file_path: &OsString) -> Result<(), TableError> {
        self.storage.save_to_file(file_path)
    }
}

impl<S: StorageEngine> InternalDb<S> {
    /// Start with an empty registry over `storage`. Tables already present
    /// in `storage` stay invisible; use [`InternalDb::open`] to adopt them.
    pub fn with_storage(config: DbConfig, storage: S) -> Self {
        Self { config, registry: TableRegistry::new(), storage }
    }

    /// Rebuild the registry from the storage engine's catalog.
    pub fn open(config: DbConfig, storage: S) -> Result<Self, TableError> {
        let mut registry = TableRegistry::new();
        for table_name in storage.list_tables()? {
            let handle = storage.resolve_table_by_name(&table_name)?;
            let definition = storage.describe_table(&handle)?;
            if definition.id_column != config.id_key {
                return Err(TableError::storage(format!(
                    "table '{}' uses identity column '{}', configured '{}'",
                    table_name, definition.id_column, config.id_key
                )));
            }
            registry.restore(schema_from_definition(&definition)?, handle)?;
        }

        info!(tables = registry.len(), "rebuilt table registry from storage catalog");
        Ok(Self { config, registry, storage })
    }

    pub fn into_protected(self) -> Db<S> {
        Arc::new(RwLock::new(self))
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    pub fn registry(&self) -> &TableRegistry {
        &self.registry
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Define a brand-new table: map → build → register → create.
    ///
    /// If the physical create fails the table stays registered without
    /// storage; a later [`InternalDb::redefine_table`] recreates it.
    pub fn define_table(&mut self, table_name: &str, fields: &[FieldSpec]) -> Result<DefinedTable, TableError> {
        let columns = FieldMapper::new(&self.config).map(fields)?;
        let schema = SchemaBuilder::new(&self.registry).build_new(table_name, columns)?;
        let schema = Arc::clone(&self.registry.register(schema)?.schema);

        let handle = SchemaMaterializer::new(&self.storage, &self.config).create_physical(&schema)?;
        self.registry.attach_handle(table_name, handle)?;

        info!(table = %table_name, columns = schema.columns.len(), "defined table");
        Ok(DefinedTable { table_name: table_name.to_string(), fields: fields.to_vec() })
    }

    /// Add `fields` to an existing table by rebuilding it. Every row stored
    /// so far is discarded.
    pub fn redefine_table(&mut self, table_name: &str, fields: &[FieldSpec]) -> Result<TableRegistration, TableError> {
        let registration = self.registry.resolve(table_name)?;
        let existing = Arc::clone(&registration.schema);
        let old_handle = registration.storage_handle.clone();

        let columns = FieldMapper::new(&self.config).map(fields)?;
        let schema = SchemaBuilder::new(&self.registry).extend(existing, columns)?;
        let handle = SchemaMaterializer::new(&self.storage, &self.config)
            .rebuild_physical(old_handle.as_ref(), &schema)?;

        let registration = self.registry.replace(table_name, schema, handle)?;
        debug!(table = %table_name, generation = registration.schema.generation(), "replaced table schema");
        Ok(registration.clone())
    }

    pub fn add_row(&self, table_name: &str, row: &RowValues) -> Result<Row, TableError> {
        RowAccess::new(&self.registry, &self.storage).insert(table_name, row)
    }

    pub fn list_rows(&self, table_name: &str) -> Result<RowScan, TableError> {
        RowAccess::new(&self.registry, &self.storage).scan(table_name)
    }

    pub fn describe(&self, table_name: &str) -> Result<Arc<TableSchema>, TableError> {
        self.registry.resolve(table_name).map(|r| Arc::clone(&r.schema))
    }

    pub fn list_tables(&self) -> Vec<String> {
        self.registry.table_names()
    }
}

/// Lock-taking entry points on the shared [`Db`] handle. Schema changes
/// hold the write lock for the whole flow; row operations share the read
/// lock.
pub trait DbCommon {
    fn define_table(&self, table_name: &str, fields: &[FieldSpec]) -> Result<DefinedTable, TableError>;
    fn redefine_table(&self, table_name: &str, fields: &[FieldSpec]) -> Result<TableRegistration, TableError>;
    fn add_row(&self, table_name: &str, row: &RowValues) -> Result<Row, TableError>;
    fn list_rows(&self, table_name: &str) -> Result<RowScan, TableError>;
    fn describe(&self, table_name: &str) -> Result<Arc<TableSchema>, TableError>;
    fn list_tables(&self) -> Result<Vec<String>, TableError>;
}

fn read_db<S: StorageEngine>(db: &Db<S>) -> Result<RwLockReadGuard<'_, InternalDb<S>>, TableError> {
    db.read().map_err(|_| TableError::storage("database lock poisoned"))
}

fn write_db<S: StorageEngine>(db: &Db<S>) -> Result<RwLockWriteGuard<'_, InternalDb<S>>, TableError> {
    db.write().map_err(|_| TableError::storage("database lock poisoned"))
}

impl<S: StorageEngine> DbCommon for Db<S> {
    fn define_table(&self, table_name: &str, fields: &[FieldSpec]) -> Result<DefinedTable, TableError> {
        write_db(self)?.define_table(table_name, fields)
    }

    fn redefine_table(&self, table_name: &str, fields: &[FieldSpec]) -> Result<TableRegistration, TableError> {
        write_db(self)?.redefine_table(table_name, fields)
    }

    fn add_row(&self, table_name: &str, row: &RowValues) -> Result<Row, TableError> {
        read_db(self)?.add_row(table_name, row)
    }

    fn list_rows(&self, table_name: &str) -> Result<RowScan, TableError> {
        read_db(self)?.list_rows(table_name)
    }

    fn describe(&self, table_name: &str) -> Result<Arc<TableSchema>, TableError> {
        read_db(self)?.describe(table_name)
    }

    fn list_tables(&self) -> Result<Vec<String>, TableError> {
        Ok(read_db(self)?.list_tables())
    }
}

impl<S: StorageEngine> SchemaProvider for Db<S> {
    fn schema_of(&self, table_name: &str) -> Option<Arc<TableSchema>> {
        let guard = self.read().ok()?;
        guard.registry.schema_of(table_name)
    }
}
