//! Builder for the JSON schema advertised with each operation.

use serde_json::{Map, Value, json};

/// Builds an object schema of the form
/// `{ "type": "object", "properties": { ... }, "required": [ ... ] }`.
#[derive(Debug, Clone, Default)]
pub struct InputSchema {
    properties: Map<String, Value>,
    required: Vec<String>,
}

impl InputSchema {
    /// Schema with no properties.
    #[must_use]
    pub fn object() -> Self {
        Self::default()
    }

    /// Adds an optional property.
    #[must_use]
    pub fn property(mut self, name: &str, kind: &str, description: &str) -> Self {
        self.properties.insert(
            name.to_owned(),
            json!({"type": kind, "description": description}),
        );
        self
    }

    /// Adds a property the caller must supply.
    #[must_use]
    pub fn required(self, name: &str, kind: &str, description: &str) -> Self {
        let mut schema = self.property(name, kind, description);
        schema.required.push(name.to_owned());
        schema
    }

    /// Produces the schema value.
    #[must_use]
    pub fn build(self) -> Value {
        let mut schema = Map::new();
        schema.insert("type".to_owned(), Value::from("object"));
        schema.insert("properties".to_owned(), Value::Object(self.properties));
        if !self.required.is_empty() {
            schema.insert("required".to_owned(), Value::from(self.required));
        }
        Value::Object(schema)
    }
}
