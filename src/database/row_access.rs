use std::sync::Arc;

use indexmap::IndexMap;

use crate::database::{
    Row, RowValues, StorageEngine, StoredRecord, TableError, TableRegistry, TableSchema,
};

/// Generic insert and scan against whatever schema the registry holds for
/// a table. Borrows registry and storage for the duration of one call.
pub struct RowAccess<'a, S: StorageEngine> {
    registry: &'a TableRegistry,
    storage: &'a S,
}

impl<'a, S: StorageEngine> RowAccess<'a, S> {
    pub fn new(registry: &'a TableRegistry, storage: &'a S) -> Self {
        Self { registry, storage }
    }

    /// Store `row` in `table_name`. Declared columns missing from `row` are
    /// stored as null; names the schema does not declare are rejected.
    /// Values are handed to storage as text without type checks here.
    pub fn insert(&self, table_name: &str, row: &RowValues) -> Result<Row, TableError> {
        let registration = self.registry.resolve(table_name)?;
        let schema = &registration.schema;

        let unknown: Vec<&str> = row.names()
            .filter(|name| !schema.contains_column(name))
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            return Err(TableError::validation(format!(
                "table '{}' has no column(s): {}",
                table_name,
                unknown.join(", ")
            )));
        }

        let handle = registration.handle()?;
        let values: IndexMap<String, Option<String>> = schema.columns.iter()
            .map(|c| (c.name.clone(), row.get(&c.name).map(str::to_string)))
            .collect();
        let id = self.storage.insert_row(handle, &values)?;

        Ok(Row { id, values })
    }

    /// Read every row of `table_name` from storage, projected onto the
    /// registered schema.
    pub fn scan(&self, table_name: &str) -> Result<RowScan, TableError> {
        let registration = self.registry.resolve(table_name)?;
        let records = self.storage.scan_table(registration.handle()?)?;

        Ok(RowScan {
            schema: Arc::clone(&registration.schema),
            records: records.into_iter(),
        })
    }
}

/// Rows of one scan, projected lazily. Owns the records it was given, so
/// it stays valid after registry and storage locks are released.
pub struct RowScan {
    schema: Arc<TableSchema>,
    records: std::vec::IntoIter<StoredRecord>,
}

impl RowScan {
    fn project(&self, mut record: StoredRecord) -> Row {
        let values = self.schema.columns.iter()
            .map(|c| (c.name.clone(), record.values.swap_remove(&c.name).flatten()))
            .collect();
        Row { id: record.id, values }
    }
}

impl Iterator for RowScan {
    type Item = Row;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        Some(self.project(record))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.records.size_hint()
    }
}

impl ExactSizeIterator for RowScan {}
