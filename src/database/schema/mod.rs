pub mod storage_type;
pub use storage_type::*;

pub mod field_spec;
pub use field_spec::*;

pub mod identifier;
pub use identifier::*;

pub mod column_descriptor;
pub use column_descriptor::*;

pub mod field_mapper;
pub use field_mapper::*;

pub mod table_schema;
pub use table_schema::*;

pub trait SchemaProvider {
    /// Return the schema currently registered under `table_name`, if any.
    fn schema_of(&self, table_name: &str) -> Option<std::sync::Arc<TableSchema>>;
}
