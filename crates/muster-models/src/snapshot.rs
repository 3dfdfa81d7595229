use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key of the audit-specific metadata bag the write path embeds in snapshots.
pub const AUDIT_METADATA_KEY: &str = "_auditMetadata";

pub const FIRST_NAME_KEYS: &[&str] = &["firstName", "first_name", "contactFirstName"];
pub const LAST_NAME_KEYS: &[&str] = &["lastName", "last_name", "contactLastName"];
pub const ORGANIZATION_KEYS: &[&str] = &["organizationName", "organization_name", "organization"];

/// Snapshot keys naming who a record is about, each list in priority order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityKeys {
    pub first_name: Vec<String>,
    pub last_name: Vec<String>,
    pub organization: Vec<String>,
}

impl Default for IdentityKeys {
    fn default() -> Self {
        let owned = |keys: &[&str]| keys.iter().map(|key| key.to_string()).collect();
        Self {
            first_name: owned(FIRST_NAME_KEYS),
            last_name: owned(LAST_NAME_KEYS),
            organization: owned(ORGANIZATION_KEYS),
        }
    }
}

/// Decoded state of a domain record at one point in time.
///
/// Snapshot shapes follow an evolving record schema, so fields are only ever
/// read by explicit key. Unrecognized fields are kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParsedSnapshot {
    fields: Map<String, Value>,
}

impl ParsedSnapshot {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Build from an arbitrary JSON value. Only objects are snapshots.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).filter(|v| !v.is_null())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The embedded metadata object stored under `key`, if it is an object.
    pub fn metadata(&self, key: &str) -> Option<&Map<String, Value>> {
        self.get(key).and_then(Value::as_object)
    }

    /// First non-blank string among `keys`, in order.
    pub fn first_str<K: AsRef<str>>(&self, keys: &[K]) -> Option<&str> {
        keys.iter()
            .filter_map(|key| self.get(key.as_ref()).and_then(Value::as_str))
            .map(str::trim)
            .find(|value| !value.is_empty())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

impl From<Map<String, Value>> for ParsedSnapshot {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn only_objects_become_snapshots() {
        assert!(ParsedSnapshot::from_value(json!([1, 2])).is_none());
        assert!(ParsedSnapshot::from_value(json!("text")).is_none());
        assert!(ParsedSnapshot::from_value(json!({})).is_some());
    }

    #[test]
    fn null_fields_read_as_missing() {
        let snap = ParsedSnapshot::from_value(json!({ "status": null, "firstName": "Mary" }))
            .expect("object");
        assert!(snap.get("status").is_none());
        assert!(!snap.contains("status"));
        assert_eq!(snap.first_str(FIRST_NAME_KEYS), Some("Mary"));
    }

    #[test]
    fn identity_fields_accept_legacy_keys() {
        let snap = ParsedSnapshot::from_value(json!({
            "firstName": "  ",
            "first_name": "Mary",
            "organization": "Food Bank",
        }))
        .expect("object");
        let keys = IdentityKeys::default();
        assert_eq!(snap.first_str(&keys.first_name), Some("Mary"));
        assert_eq!(snap.first_str(&keys.last_name), None);
        assert_eq!(snap.first_str(&keys.organization), Some("Food Bank"));
    }

    #[test]
    fn serializes_as_the_original_object() {
        let original = json!({ "b": 1, "a": { "nested": true } });
        let snap = ParsedSnapshot::from_value(original.clone()).expect("object");
        assert_eq!(serde_json::to_value(&snap).expect("serialize"), original);
    }
}
