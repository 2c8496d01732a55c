use std::collections::HashSet;

use crate::database::{
    validate_identifier, ColumnDescriptor, DbConfig, FieldSpec, FieldType, TableError,
    MAX_FIELD_NAME_LEN,
};

/// Translates caller field specs into column descriptors.
///
/// Holds only the limits taken from [`DbConfig`]; mapping itself has no side
/// effects.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMapper {
    max_fields: usize,
    id_key: String,
}

impl FieldMapper {
    pub fn new(config: &DbConfig) -> Self {
        Self { max_fields: config.max_fields, id_key: config.id_key.clone() }
    }

    /// Map `fields` to one nullable column each, in input order.
    pub fn map(&self, fields: &[FieldSpec]) -> Result<Vec<ColumnDescriptor>, TableError> {
        if fields.is_empty() {
            return Err(TableError::validation("empty field list"));
        }
        if fields.len() > self.max_fields {
            return Err(TableError::validation(format!(
                "too many fields: {} given, at most {} allowed per definition",
                fields.len(),
                self.max_fields
            )));
        }

        let mut seen = HashSet::with_capacity(fields.len());
        let mut columns = Vec::with_capacity(fields.len());
        for field in fields {
            validate_identifier("Field", &field.name, MAX_FIELD_NAME_LEN)?;
            let field_type: FieldType = field.field_type.parse()?;

            if field.name == self.id_key {
                return Err(TableError::validation(format!(
                    "field name '{}' is reserved for the row identity",
                    field.name
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(TableError::validation(format!(
                    "field '{}' is declared more than once",
                    field.name
                )));
            }

            columns.push(ColumnDescriptor::from_field(&field.name, field_type));
        }

        Ok(columns)
    }
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self::new(&DbConfig::default())
    }
}
