pub mod error;
pub use error::*;

pub mod db_config;
pub use db_config::*;

pub mod id_manager;
pub use id_manager::*;

pub mod schema;
pub use schema::*;

pub mod registry;
pub use registry::*;

pub mod storage;
pub use storage::*;

pub mod materializer;
pub use materializer::*;

pub mod row;
pub use row::*;

pub mod row_values;
pub use row_values::*;

pub mod row_access;
pub use row_access::*;

pub mod db;
pub use db::*;
