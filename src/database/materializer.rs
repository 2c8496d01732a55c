use tracing::{debug, info};

use crate::database::{
    ColumnDefinition, ColumnDescriptor, DbConfig, StorageEngine, StorageHandle, StorageType,
    TableDefinition, TableError, TableSchema,
};

/// Turns schemas into physical tables through a [`StorageEngine`].
///
/// Holds no state between calls. Whether a table is created or rebuilt is
/// decided by the caller.
pub struct SchemaMaterializer<'a, S: StorageEngine> {
    storage: &'a S,
    id_key: &'a str,
}

impl<'a, S: StorageEngine> SchemaMaterializer<'a, S> {
    pub fn new(storage: &'a S, config: &'a DbConfig) -> Self {
        Self { storage, id_key: &config.id_key }
    }

    /// Storage-side definition for `schema`, one column per descriptor.
    pub fn definition_for(&self, schema: &TableSchema) -> TableDefinition {
        TableDefinition {
            table_name: schema.table_name.clone(),
            id_column: self.id_key.to_string(),
            columns: schema.columns.iter().map(|c| ColumnDefinition {
                name: c.name.clone(),
                sql_type: c.storage_type.sql_name().to_string(),
                nullable: c.nullable,
            })
            .collect(),
        }
    }

    /// Create the physical table for a schema that has none yet.
    pub fn create_physical(&self, schema: &TableSchema) -> Result<StorageHandle, TableError> {
        let definition = self.definition_for(schema);
        let handle = self.storage.create_table(&definition)?;
        debug!(table = %schema.table_name, physical = %handle.physical_name, columns = schema.columns.len(), "created physical table");
        Ok(handle)
    }

    /// Drop the table behind `old_handle` and create it again with every
    /// column of `new_schema`. All stored rows are lost.
    pub fn rebuild_physical(&self, old_handle: Option<&StorageHandle>, new_schema: &TableSchema) -> Result<StorageHandle, TableError> {
        let definition = self.definition_for(new_schema);
        if let Some(old) = old_handle {
            if old.table_name != new_schema.table_name || old.physical_name != definition.physical_name() {
                return Err(TableError::storage(format!(
                    "handle for '{}' cannot rebuild table '{}'",
                    old.table_name, new_schema.table_name
                )));
            }
        }

        let handle = self.storage.drop_and_create_table(&definition)?;
        info!(table = %new_schema.table_name, columns = new_schema.columns.len(), "rebuilt physical table");
        Ok(handle)
    }
}

/// Recover a flat schema from a stored definition. Extension history is not
/// stored, so the result has no base schema.
pub fn schema_from_definition(definition: &TableDefinition) -> Result<TableSchema, TableError> {
    let columns = definition.columns.iter().map(|c| -> Result<ColumnDescriptor, TableError> {
        let storage_type = StorageType::from_sql_name(&c.sql_type).ok_or_else(|| TableError::storage(format!(
            "table '{}' column '{}' has unknown type '{}'",
            definition.table_name, c.name, c.sql_type
        )))?;
        Ok(ColumnDescriptor { name: c.name.clone(), storage_type, nullable: c.nullable })
    })
    .collect::<Result<Vec<_>, _>>()?;

    Ok(TableSchema {
        table_name: definition.table_name.clone(),
        columns,
        base_schema: None,
    })
}
