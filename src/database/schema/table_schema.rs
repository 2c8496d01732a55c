use std::sync::Arc;

use crate::database::{
    validate_identifier, ColumnDescriptor, TableError, TableRegistry, MAX_TABLE_NAME_LEN,
};

/// Ordered column list and identity of one logical table.
///
/// A schema produced by [`SchemaBuilder::extend`] keeps a link to the schema
/// it grew from in `base_schema`; `columns` always holds the full, flattened
/// list (inherited columns first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub table_name: String,
    pub columns: Vec<ColumnDescriptor>,
    pub base_schema: Option<Arc<TableSchema>>,
}

impl TableSchema {
    /// Return the column named `name` if the schema declares it.
    pub fn get(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn contains_column(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Columns added by this definition step, excluding inherited ones.
    pub fn own_columns(&self) -> &[ColumnDescriptor] {
        let inherited = self.base_schema.as_ref().map_or(0, |base| base.columns.len());
        self.columns.get(inherited..).unwrap_or(&[])
    }

    /// Number of extend steps between this schema and its original definition.
    pub fn generation(&self) -> usize {
        let mut depth = 0;
        let mut base = self.base_schema.as_ref();
        while let Some(schema) = base {
            depth += 1;
            base = schema.base_schema.as_ref();
        }
        depth
    }
}

/// Assembles schemas from mapped columns. Never touches storage.
pub struct SchemaBuilder<'a> {
    registry: &'a TableRegistry,
}

impl<'a> SchemaBuilder<'a> {
    pub fn new(registry: &'a TableRegistry) -> Self {
        Self { registry }
    }

    /// Build the first schema of a table that is not registered yet.
    pub fn build_new(&self, table_name: &str, columns: Vec<ColumnDescriptor>) -> Result<TableSchema, TableError> {
        validate_identifier("Table", table_name, MAX_TABLE_NAME_LEN)?;
        if self.registry.contains(table_name) {
            return Err(TableError::Conflict(table_name.to_string()));
        }
        if columns.is_empty() {
            return Err(TableError::validation("empty field list"));
        }

        Ok(TableSchema {
            table_name: table_name.to_string(),
            columns,
            base_schema: None,
        })
    }

    /// Append `new_columns` to `existing`. Names already present in the
    /// resolved schema are rejected rather than overwritten.
    pub fn extend(&self, existing: Arc<TableSchema>, new_columns: Vec<ColumnDescriptor>) -> Result<TableSchema, TableError> {
        if new_columns.is_empty() {
            return Err(TableError::validation("empty field list"));
        }

        let duplicates: Vec<_> = new_columns.iter()
            .filter(|c| existing.contains_column(&c.name))
            .map(|c| c.name.clone())
            .collect();
        if !duplicates.is_empty() {
            return Err(TableError::validation(format!(
                "table '{}' already has column(s): {}",
                existing.table_name,
                duplicates.join(", ")
            )));
        }

        let mut columns = existing.columns.clone();
        columns.extend(new_columns);

        Ok(TableSchema {
            table_name: existing.table_name.clone(),
            columns,
            base_schema: Some(existing),
        })
    }
}
