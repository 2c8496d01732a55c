use std::{ffi::OsString, fs, io::{BufWriter, Write}, sync::{RwLock, RwLockReadGuard, RwLockWriteGuard}};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::database::{
    physical_name_of, Cell, IdManager, StorageEngine, StorageHandle, StorageType, StoredRecord,
    TableDefinition, TableError,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StoredRow {
    id: u64,
    cells: Vec<Cell>,
}

/// One physical table held in memory.
///
/// Rows are kept in insertion order; cells are positional and line up with
/// `definition.columns`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct InternalMemoryTable {
    definition: TableDefinition,
    handle: StorageHandle,
    id_manager: IdManager,
    rows: Vec<StoredRow>,
    #[serde(skip)]
    column_types: Vec<StorageType>,
}

impl InternalMemoryTable {
    fn new(definition: &TableDefinition) -> Result<Self, TableError> {
        let mut table = Self {
            definition: definition.clone(),
            handle: StorageHandle::new(definition),
            id_manager: IdManager::new(),
            rows: Vec::new(),
            column_types: Vec::new(),
        };
        table.resolve_column_types()?;
        Ok(table)
    }

    fn resolve_column_types(&mut self) -> Result<(), TableError> {
        let mut types = Vec::with_capacity(self.definition.columns.len());
        for column in &self.definition.columns {
            let ty = StorageType::from_sql_name(&column.sql_type).ok_or_else(|| TableError::storage(format!(
                "unknown column type '{}' for column '{}'",
                column.sql_type, column.name
            )))?;
            if column.name == self.definition.id_column {
                return Err(TableError::storage(format!(
                    "column '{}' clashes with the identity column",
                    column.name
                )));
            }
            types.push(ty);
        }
        self.column_types = types;
        Ok(())
    }

    fn check_handle(&self, handle: &StorageHandle) -> Result<(), TableError> {
        if self.handle.token != handle.token {
            return Err(TableError::storage(format!(
                "stale handle for table '{}': the table has been rebuilt",
                handle.table_name
            )));
        }
        Ok(())
    }

    fn count(&self) -> usize {
        self.rows.len()
    }

    fn insert(&mut self, values: &IndexMap<String, Option<String>>) -> Result<u64, TableError> {
        if let Some(unknown) = values.keys().find(|k| !self.definition.columns.iter().any(|c| &c.name == *k)) {
            return Err(TableError::storage(format!(
                "table '{}' has no column '{}'",
                self.definition.table_name, unknown
            )));
        }

        let mut cells = Vec::with_capacity(self.definition.columns.len());
        for (column, ty) in self.definition.columns.iter().zip(&self.column_types) {
            let value = values.get(&column.name).and_then(|v| v.as_deref());
            if value.is_none() && !column.nullable {
                return Err(TableError::storage(format!("column '{}' does not accept null", column.name)));
            }
            let cell = Cell::coerce(*ty, value)
                .map_err(|e| TableError::storage(format!("column '{}': {}", column.name, e)))?;
            cells.push(cell);
        }

        let id = self.id_manager.next().ok_or_else(|| TableError::storage(format!(
            "identity sequence of table '{}' is exhausted",
            self.definition.table_name
        )))?;
        self.rows.push(StoredRow { id, cells });

        Ok(id)
    }

    fn scan(&self) -> Vec<StoredRecord> {
        self.rows.iter().map(|row| {
            let values = self.definition.columns.iter()
                .zip(&row.cells)
                .map(|(column, cell)| (column.name.clone(), cell.to_text()))
                .collect();
            StoredRecord { id: row.id, values }
        })
        .collect()
    }

    /// Re-derive lookup state and check persisted rows after deserializing.
    fn validate_loaded(&mut self) -> Result<(), TableError> {
        self.resolve_column_types()?;

        if self.handle.table_name != self.definition.table_name
            || self.handle.physical_name != self.definition.physical_name()
        {
            return Err(TableError::storage(format!(
                "handle '{}' does not match table '{}'",
                self.handle.physical_name, self.definition.table_name
            )));
        }

        let mut max_id: Option<u64> = None;
        for row in &self.rows {
            if max_id.is_some_and(|previous| row.id <= previous) {
                return Err(TableError::storage(format!(
                    "row ids of table '{}' are not strictly increasing at {}",
                    self.definition.table_name, row.id
                )));
            }
            if row.cells.len() != self.column_types.len()
                || !row.cells.iter().zip(&self.column_types).all(|(cell, ty)| cell.matches(*ty))
            {
                return Err(TableError::storage(format!(
                    "row {} of table '{}' does not match its column definitions",
                    row.id, self.definition.table_name
                )));
            }
            max_id = Some(row.id);
        }

        if let Some(value) = max_id {
            if self.id_manager.current.is_none_or(|current| current < value) {
                self.id_manager.set_current(value).map_err(TableError::storage)?;
            }
        }

        Ok(())
    }
}

/// In-memory [`StorageEngine`] keyed by physical table name.
///
/// Every primitive takes the internal lock for its own duration only.
/// Tables keep creation order, which survives a save and reload.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    tables: RwLock<IndexMap<String, InternalMemoryTable>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, IndexMap<String, InternalMemoryTable>>, TableError> {
        self.tables.read().map_err(|_| TableError::storage("storage lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, IndexMap<String, InternalMemoryTable>>, TableError> {
        self.tables.write().map_err(|_| TableError::storage("storage lock poisoned"))
    }

    /// Number of rows stored under the physical table for `table_name`.
    pub fn count(&self, table_name: &str) -> Result<usize, TableError> {
        let tables = self.read()?;
        tables.get(&physical_name_of(table_name))
            .map(InternalMemoryTable::count)
            .ok_or_else(|| TableError::NotFound(table_name.to_string()))
    }

    /// Save every table (definition, identity sequence and rows) as JSON,
    /// in creation order.
    pub fn save_to_file(&self, file_path: &OsString) -> Result<(), TableError> {
        let tables = self.read()?;
        let snapshot: Vec<&InternalMemoryTable> = tables.values().collect();

        let file = fs::File::create(file_path)?;
        let mut w = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut w, &snapshot)?;
        w.flush()?;

        debug!(tables = snapshot.len(), path = %file_path.to_string_lossy(), "saved storage catalog");
        Ok(())
    }

    /// Load a storage previously written by [`MemoryStorage::save_to_file`].
    pub fn load_from_file(file_path: &OsString) -> Result<MemoryStorage, TableError> {
        let file_content = fs::read_to_string(file_path)?;
        let loaded: Vec<InternalMemoryTable> = serde_json::from_str(&file_content)?;

        let mut tables = IndexMap::with_capacity(loaded.len());
        for mut table in loaded {
            table.validate_loaded()?;
            let physical = table.definition.physical_name();
            if tables.insert(physical.clone(), table).is_some() {
                return Err(TableError::storage(format!("duplicate physical table '{physical}' in catalog")));
            }
        }

        info!(tables = tables.len(), path = %file_path.to_string_lossy(), "loaded storage catalog");
        Ok(MemoryStorage { tables: RwLock::new(tables) })
    }
}

impl StorageEngine for MemoryStorage {
    fn create_table(&self, definition: &TableDefinition) -> Result<StorageHandle, TableError> {
        let physical = definition.physical_name();
        let mut tables = self.write()?;
        if let Some(existing) = tables.get(&physical) {
            return Err(TableError::storage(format!(
                "physical table '{}' already exists (defined as '{}')",
                physical, existing.definition.table_name
            )));
        }

        let table = InternalMemoryTable::new(definition)?;
        let handle = table.handle.clone();
        tables.insert(physical, table);
        Ok(handle)
    }

    fn drop_and_create_table(&self, definition: &TableDefinition) -> Result<StorageHandle, TableError> {
        let physical = definition.physical_name();
        let table = InternalMemoryTable::new(definition)?;
        let handle = table.handle.clone();

        let mut tables = self.write()?;
        if let Some(existing) = tables.get(&physical) {
            if existing.definition.table_name != definition.table_name {
                return Err(TableError::storage(format!(
                    "physical table '{}' belongs to '{}'",
                    physical, existing.definition.table_name
                )));
            }
        }
        if let Some(dropped) = tables.insert(physical, table) {
            if dropped.count() > 0 {
                warn!(table = %definition.table_name, rows = dropped.count(), "rebuild dropped stored rows");
            }
        }
        Ok(handle)
    }

    fn insert_row(&self, handle: &StorageHandle, values: &IndexMap<String, Option<String>>) -> Result<u64, TableError> {
        let mut tables = self.write()?;
        let table = tables.get_mut(&handle.physical_name)
            .ok_or_else(|| TableError::storage(format!("no physical table '{}'", handle.physical_name)))?;
        table.check_handle(handle)?;
        table.insert(values)
    }

    fn scan_table(&self, handle: &StorageHandle) -> Result<Vec<StoredRecord>, TableError> {
        let tables = self.read()?;
        let table = tables.get(&handle.physical_name)
            .ok_or_else(|| TableError::storage(format!("no physical table '{}'", handle.physical_name)))?;
        table.check_handle(handle)?;
        Ok(table.scan())
    }

    fn resolve_table_by_name(&self, table_name: &str) -> Result<StorageHandle, TableError> {
        let tables = self.read()?;
        tables.get(&physical_name_of(table_name))
            .filter(|t| t.definition.table_name == table_name)
            .map(|t| t.handle.clone())
            .ok_or_else(|| TableError::NotFound(table_name.to_string()))
    }

    fn describe_table(&self, handle: &StorageHandle) -> Result<TableDefinition, TableError> {
        let tables = self.read()?;
        let table = tables.get(&handle.physical_name)
            .ok_or_else(|| TableError::storage(format!("no physical table '{}'", handle.physical_name)))?;
        table.check_handle(handle)?;
        Ok(table.definition.clone())
    }

    fn list_tables(&self) -> Result<Vec<String>, TableError> {
        let tables = self.read()?;
        Ok(tables.values().map(|t| t.definition.table_name.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::ColumnDefinition;

    fn definition(name: &str) -> TableDefinition {
        TableDefinition {
            table_name: name.to_string(),
            id_column: "id".to_string(),
            columns: vec![
                ColumnDefinition { name: "name".into(), sql_type: "TEXT".into(), nullable: true },
                ColumnDefinition { name: "price".into(), sql_type: "INTEGER".into(), nullable: true },
                ColumnDefinition { name: "is_valid".into(), sql_type: "BOOLEAN".into(), nullable: true },
            ],
        }
    }

    fn values(pairs: &[(&str, Option<&str>)]) -> IndexMap<String, Option<String>> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.map(str::to_string))).collect()
    }

    #[test]
    fn test_create_and_resolve() {
        let storage = MemoryStorage::new();
        let handle = storage.create_table(&definition("Items")).unwrap();
        assert_eq!(handle.physical_name, "table_items");
        assert_eq!(storage.resolve_table_by_name("Items").unwrap(), handle);
        assert!(matches!(storage.resolve_table_by_name("items"), Err(TableError::NotFound(_))));
        assert_eq!(storage.list_tables().unwrap(), vec!["Items"]);
    }

    #[test]
    fn test_physical_name_collision() {
        let storage = MemoryStorage::new();
        storage.create_table(&definition("Items")).unwrap();
        let err = storage.create_table(&definition("items")).unwrap_err();
        assert!(matches!(err, TableError::Storage(_)));
    }

    #[test]
    fn test_unknown_sql_type_is_rejected() {
        let storage = MemoryStorage::new();
        let mut def = definition("t");
        def.columns[0].sql_type = "MONEY".into();
        assert!(matches!(storage.create_table(&def), Err(TableError::Storage(_))));
        assert!(storage.list_tables().unwrap().is_empty());
    }

    #[test]
    fn test_insert_assigns_increasing_ids_and_coerces() {
        let storage = MemoryStorage::new();
        let handle = storage.create_table(&definition("t")).unwrap();

        let first = storage.insert_row(&handle, &values(&[("name", Some("test")), ("price", Some("500")), ("is_valid", Some("True"))])).unwrap();
        let second = storage.insert_row(&handle, &values(&[("name", Some("text"))])).unwrap();
        assert_eq!((first, second), (1, 2));

        let rows = storage.scan_table(&handle).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].values["price"].as_deref(), Some("500"));
        assert_eq!(rows[0].values["is_valid"].as_deref(), Some("true"));
        assert_eq!(rows[1].values["price"], None);
    }

    #[test]
    fn test_insert_rejects_uncoercible_value() {
        let storage = MemoryStorage::new();
        let handle = storage.create_table(&definition("t")).unwrap();
        let err = storage.insert_row(&handle, &values(&[("price", Some("cheap"))])).unwrap_err();
        assert!(matches!(err, TableError::Storage(msg) if msg.contains("price")));
        assert_eq!(storage.count("t").unwrap(), 0);
    }

    #[test]
    fn test_rebuild_drops_rows_and_invalidates_handle() {
        let storage = MemoryStorage::new();
        let old = storage.create_table(&definition("t")).unwrap();
        storage.insert_row(&old, &values(&[("name", Some("a"))])).unwrap();

        let new = storage.drop_and_create_table(&definition("t")).unwrap();
        assert_ne!(old.token, new.token);
        assert!(storage.scan_table(&new).unwrap().is_empty());
        assert!(matches!(storage.scan_table(&old), Err(TableError::Storage(_))));
        assert_eq!(storage.insert_row(&new, &values(&[("name", Some("b"))])).unwrap(), 1);
    }

    #[test]
    fn test_drop_and_create_never_replaces_another_table() {
        let storage = MemoryStorage::new();
        let handle = storage.create_table(&definition("Items")).unwrap();
        storage.insert_row(&handle, &values(&[("name", Some("a"))])).unwrap();

        assert!(matches!(storage.drop_and_create_table(&definition("items")), Err(TableError::Storage(_))));
        assert_eq!(storage.count("Items").unwrap(), 1);
    }

    #[test]
    fn test_drop_and_create_without_existing_table() {
        let storage = MemoryStorage::new();
        let handle = storage.drop_and_create_table(&definition("fresh")).unwrap();
        assert_eq!(storage.resolve_table_by_name("fresh").unwrap(), handle);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path: OsString = dir.path().join("catalog.json").into();

        let storage = MemoryStorage::new();
        let handle = storage.create_table(&definition("t")).unwrap();
        storage.insert_row(&handle, &values(&[("name", Some("a")), ("price", Some("3"))])).unwrap();
        storage.insert_row(&handle, &values(&[("is_valid", Some("f"))])).unwrap();
        storage.save_to_file(&path).unwrap();

        let loaded = MemoryStorage::load_from_file(&path).unwrap();
        let reloaded = loaded.resolve_table_by_name("t").unwrap();
        assert_eq!(reloaded, handle);
        assert_eq!(loaded.scan_table(&reloaded).unwrap(), storage.scan_table(&handle).unwrap());
        assert_eq!(loaded.insert_row(&reloaded, &values(&[])).unwrap(), 3);
    }

    #[test]
    fn test_load_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path: OsString = dir.path().join("catalog.json").into();
        fs::write(&path, "not json").unwrap();
        assert!(matches!(MemoryStorage::load_from_file(&path), Err(TableError::Storage(_))));

        let missing: OsString = dir.path().join("missing.json").into();
        assert!(matches!(MemoryStorage::load_from_file(&missing), Err(TableError::Storage(_))));
    }

    #[test]
    fn test_load_rejects_duplicate_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path: OsString = dir.path().join("catalog.json").into();

        let storage = MemoryStorage::new();
        let handle = storage.create_table(&definition("t")).unwrap();
        storage.insert_row(&handle, &values(&[("name", Some("a"))])).unwrap();
        storage.insert_row(&handle, &values(&[("name", Some("b"))])).unwrap();
        storage.save_to_file(&path).unwrap();

        let mut saved: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        saved[0]["rows"][1]["id"] = serde_json::json!(1);
        fs::write(&path, saved.to_string()).unwrap();

        let err = MemoryStorage::load_from_file(&path).unwrap_err();
        assert!(matches!(err, TableError::Storage(msg) if msg.contains("strictly increasing")));
    }

    #[test]
    fn test_load_rejects_mismatched_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path: OsString = dir.path().join("catalog.json").into();

        let storage = MemoryStorage::new();
        storage.create_table(&definition("t")).unwrap();
        storage.save_to_file(&path).unwrap();

        let mut saved: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        saved[0]["handle"]["physical_name"] = serde_json::json!("table_other");
        fs::write(&path, saved.to_string()).unwrap();

        assert!(matches!(MemoryStorage::load_from_file(&path), Err(TableError::Storage(_))));
    }

    #[test]
    fn test_save_keeps_creation_order() {
        let dir = tempfile::tempdir().unwrap();
        let path: OsString = dir.path().join("catalog.json").into();

        let storage = MemoryStorage::new();
        for name in ["zeta", "alpha", "mid"] {
            storage.create_table(&definition(name)).unwrap();
        }
        storage.drop_and_create_table(&definition("zeta")).unwrap();
        storage.save_to_file(&path).unwrap();

        let loaded = MemoryStorage::load_from_file(&path).unwrap();
        assert_eq!(loaded.list_tables().unwrap(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_poisoned_lock_is_storage_error() {
        let storage = MemoryStorage::new();
        std::thread::scope(|s| {
            let result = s.spawn(|| {
                let _guard = storage.tables.write().unwrap();
                panic!("writer died holding the lock");
            })
            .join();
            assert!(result.is_err());
        });

        assert!(matches!(storage.list_tables(), Err(TableError::Storage(_))));
        let reopened = crate::database::InternalDb::open(crate::database::DbConfig::default(), storage);
        assert!(matches!(reopened, Err(TableError::Storage(_))));
    }
}
