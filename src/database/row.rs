use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

/// A stored row: the identity storage assigned plus one text value (or
/// null) per declared column, in schema order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    pub id: u64,
    pub values: IndexMap<String, Option<String>>,
}

impl Row {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(|v| v.as_deref())
    }

    /// JSON object with the identity under `id_key` first, then the columns.
    pub fn into_value(self, id_key: &str) -> Value {
        let mut map = Map::with_capacity(self.values.len() + 1);
        map.insert(id_key.to_string(), Value::from(self.id));
        for (name, value) in self.values {
            map.insert(name, value.map_or(Value::Null, Value::String));
        }
        Value::Object(map)
    }
}
