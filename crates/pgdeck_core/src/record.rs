use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Minimal handle the caller passes to `open`: just enough to fetch the
/// full record. Mirrors the row object the instance list hands over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    pub db_id: String,
}

impl RecordRef {
    pub fn new(db_id: impl Into<String>) -> Self {
        Self {
            db_id: db_id.into(),
        }
    }
}

/// Full database-instance record as returned by the fetch service.
///
/// The payload is an opaque JSON object; the dialog only interprets a few
/// well-known fields (`db_id`, `host`, `port`) for its title and identity.
/// Each fetch replaces the record wholesale, fields are never merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DbRecord {
    fields: Map<String, Value>,
}

impl DbRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// Unique identifier of the instance. `db_id` arrives as either a JSON
    /// string or a number depending on the service endpoint.
    pub fn db_id(&self) -> Option<String> {
        match self.fields.get("db_id") {
            Some(Value::String(id)) => Some(id.clone()),
            Some(Value::Number(id)) => Some(id.to_string()),
            _ => None,
        }
    }

    pub fn host(&self) -> Option<&str> {
        self.str_field("host")
    }

    pub fn port(&self) -> Option<u16> {
        match self.fields.get("port") {
            Some(Value::Number(port)) => port.as_u64().and_then(|p| u16::try_from(p).ok()),
            Some(Value::String(port)) => port.parse().ok(),
            _ => None,
        }
    }

    pub fn instance_name(&self) -> Option<&str> {
        self.str_field("instance_name")
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> DbRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn typed_accessors() {
        let rec = record(json!({
            "db_id": 7,
            "host": "10.0.0.5",
            "port": 5432,
            "instance_name": "pg-main",
        }));
        assert_eq!(rec.db_id().as_deref(), Some("7"));
        assert_eq!(rec.host(), Some("10.0.0.5"));
        assert_eq!(rec.port(), Some(5432));
        assert_eq!(rec.instance_name(), Some("pg-main"));
    }

    #[test]
    fn string_encoded_id_and_port() {
        let rec = record(json!({"db_id": "db-7", "port": "5433"}));
        assert_eq!(rec.db_id().as_deref(), Some("db-7"));
        assert_eq!(rec.port(), Some(5433));
    }

    #[test]
    fn missing_fields_are_none() {
        let rec = DbRecord::default();
        assert!(rec.is_empty());
        assert!(rec.db_id().is_none());
        assert!(rec.host().is_none());
        assert!(rec.port().is_none());
    }
}
