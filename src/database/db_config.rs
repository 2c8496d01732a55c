/// Largest number of fields accepted in a single define or redefine call.
pub const DEFAULT_MAX_FIELDS: usize = 10;

/// Database configuration shared by the mapper, the materializer and the
/// storage engine.
///
/// - `id_key` is the name of the identity column every table carries.
/// - `max_fields` caps how many fields one definition step may add.
#[derive(Debug, Clone, PartialEq)]
pub struct DbConfig {
    /// Name of the storage-assigned identity column
    pub id_key: String,
    /// Upper bound on fields per define/redefine call
    pub max_fields: usize,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self { id_key: "id".to_string(), max_fields: DEFAULT_MAX_FIELDS }
    }
}

impl DbConfig {
    /// Create default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration with explicit `id_key` and `max_fields`.
    pub fn from(id_key: &str, max_fields: usize) -> Self {
        Self {
            id_key: id_key.to_string(),
            max_fields,
        }
    }

    /// Convenience: default configuration with a different identity column.
    pub fn with_id_key(id_key: &str) -> Self {
        Self {
            id_key: id_key.to_string(),
            ..Self::default()
        }
    }

    /// Convenience: default configuration with a different field cap.
    pub fn with_max_fields(max_fields: usize) -> Self {
        Self {
            max_fields,
            ..Self::default()
        }
    }
}
