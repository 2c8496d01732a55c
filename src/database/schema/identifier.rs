use once_cell::sync::Lazy;
use regex::Regex;

use crate::database::TableError;

pub const MAX_TABLE_NAME_LEN: usize = 200;
pub const MAX_FIELD_NAME_LEN: usize = 100;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Checks a table or column name. `kind` only feeds the error message.
pub fn validate_identifier(kind: &str, name: &str, max_len: usize) -> Result<(), TableError> {
    if name.is_empty() {
        return Err(TableError::validation(format!("{kind} name must not be empty")));
    }
    if name.len() > max_len {
        return Err(TableError::validation(format!(
            "{kind} name '{name}' is longer than {max_len} characters"
        )));
    }
    if !is_identifier(name) {
        return Err(TableError::validation(format!(
            "{kind} name '{name}' must start with a letter or underscore and contain only letters, digits and underscores"
        )));
    }
    Ok(())
}
