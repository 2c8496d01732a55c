pub mod database;
pub use database::{
    Db, DbCommon, DbConfig, DefinedTable, FieldSpec, InternalDb, MemoryStorage, Row, RowValues,
    SchemaProvider, StorageEngine, TableError, TableRegistration, TableSchema,
};
