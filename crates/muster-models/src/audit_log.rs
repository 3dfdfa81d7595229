use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const ACTION_EVENT_REQUEST_CREATED: &str = "EVENT_REQUEST_CREATED";
pub const ACTION_EVENT_REQUEST_UPDATED: &str = "EVENT_REQUEST_UPDATED";
pub const ACTION_EVENT_REQUEST_STATUS_CHANGED: &str = "EVENT_REQUEST_STATUS_CHANGED";
pub const ACTION_EVENT_REQUEST_DELETED: &str = "EVENT_REQUEST_DELETED";

/// Identifier of a record or principal owned by another part of the platform.
///
/// Older rows carry numeric ids, newer ones opaque strings; both render to the
/// same canonical string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExternalId {
    Int(i64),
    Text(String),
}

impl ExternalId {
    pub fn to_canonical(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExternalId::Int(id) => write!(f, "{id}"),
            ExternalId::Text(id) => f.write_str(id.trim()),
        }
    }
}

impl From<i64> for ExternalId {
    fn from(id: i64) -> Self {
        ExternalId::Int(id)
    }
}

impl From<String> for ExternalId {
    fn from(id: String) -> Self {
        ExternalId::Text(id)
    }
}

impl From<&str> for ExternalId {
    fn from(id: &str) -> Self {
        ExternalId::Text(id.to_string())
    }
}

/// One persisted audit row. Snapshots are kept in their stored, serialized
/// form; decoding happens at report time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: i64,
    pub action: String,
    pub record_id: ExternalId,
    pub actor_id: ExternalId,
    pub before_snapshot: Option<String>,
    pub after_snapshot: Option<String>,
    pub created_at: DateTime<Utc>,
}
