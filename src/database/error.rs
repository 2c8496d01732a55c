use std::fmt;

/// Errors raised by the table definition and row access flows.
///
/// The variants follow who caused the failure: `Validation` and `Conflict`
/// come from caller input, `NotFound` names an unknown table, and `Storage`
/// means the storage engine rejected a physical operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// Malformed or unsupported field spec, empty field list, or a row that
    /// references columns the schema does not declare.
    Validation(String),
    /// No table is registered (or stored) under this name.
    NotFound(String),
    /// A table with this name is already registered.
    Conflict(String),
    /// The storage engine rejected a physical operation.
    Storage(String),
}

pub type Result<T> = std::result::Result<T, TableError>;

impl TableError {
    pub fn validation(message: impl Into<String>) -> Self {
        TableError::Validation(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        TableError::Storage(message.into())
    }

    /// True when the failure was caused by the caller's input rather than
    /// by the storage engine.
    pub fn is_client_error(&self) -> bool {
        matches!(self, TableError::Validation(_) | TableError::Conflict(_))
    }
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::Validation(message) => write!(f, "{}", message),
            TableError::NotFound(table) => write!(f, "Table not found: {}", table),
            TableError::Conflict(table) => write!(f, "Table already exists: {}", table),
            TableError::Storage(message) => write!(f, "Storage error: {}", message),
        }
    }
}

impl std::error::Error for TableError {}

impl From<serde_json::Error> for TableError {
    fn from(err: serde_json::Error) -> Self {
        TableError::Storage(format!("invalid catalog data: {}", err))
    }
}

impl From<std::io::Error> for TableError {
    fn from(err: std::io::Error) -> Self {
        TableError::Storage(format!("catalog i/o failed: {}", err))
    }
}
