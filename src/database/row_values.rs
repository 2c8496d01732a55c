use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::database::TableError;

/// One `{name, value}` entry as rows arrive from a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnValue {
    pub name: String,
    pub value: Value,
}

impl ColumnValue {
    pub fn new(name: String, value: Value) -> Self {
        Self { name, value }
    }
}

/// Caller-supplied row contents: column name → text value, in the order
/// given. Setting a name twice keeps the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowValues(pub IndexMap<String, String>);

impl RowValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: &str) -> &mut Self {
        self.0.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Accept either a JSON object (`{"title": "pen"}`) or a list of
    /// `{"name": .., "value": ..}` entries. Scalars are turned into text;
    /// `null` leaves the column unset.
    pub fn from_json(json: &Value) -> Result<RowValues, TableError> {
        let entries: Vec<ColumnValue> = match json {
            Value::Object(map) => map.iter()
                .map(|(k, v)| ColumnValue::new(k.clone(), v.clone()))
                .collect(),
            Value::Array(_) => serde_json::from_value(json.clone())
                .map_err(|e| TableError::validation(format!("invalid row entries: {e}")))?,
            _ => return Err(TableError::validation("row must be an object or a list of {name, value} entries")),
        };

        let mut row = RowValues::new();
        for ColumnValue { name, value } in entries {
            let text = match value {
                Value::Null => continue,
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(TableError::validation(format!("value for '{name}' must be a scalar")));
                }
            };
            row.0.insert(name, text);
        }

        Ok(row)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RowValues {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        RowValues(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
