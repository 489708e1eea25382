//! Resource snapshots
//!
//! The server decides which attributes a resource carries, so a resource is
//! a plain key/value map with accessors for the few fields the commands read.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Read-only snapshot of a server-side resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resource {
    fields: Map<String, Value>,
}

impl Resource {
    /// Wrap a JSON object; anything else is not a resource
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.as_str())
    }

    pub fn uuid(&self) -> Option<&str> {
        self.get_str("uuid")
    }

    /// Server identifier: `uuid`, or `id` for kinds that expose only that
    pub fn id(&self) -> Option<&str> {
        self.uuid().or_else(|| self.get_str("id"))
    }

    pub fn name(&self) -> Option<&str> {
        self.get_str("name")
    }

    pub fn uri(&self) -> Option<&str> {
        self.get_str("uri")
    }

    /// Look a value up by dot-notation path (`source.repository`, `artifacts.0`)
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.fields.get(parts.next()?)?;

        for part in parts {
            current = match part.parse::<usize>() {
                Ok(idx) if current.is_array() => current.get(idx)?,
                _ => current.get(part)?,
            };
        }

        Some(current)
    }

    /// Text form of a scalar attribute, used for exact-match filtering
    pub fn scalar_text(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Render a field for display; missing fields render empty
    pub fn display(&self, path: &str) -> String {
        match self.lookup(path) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            Some(other) => other.to_string(),
        }
    }
}
