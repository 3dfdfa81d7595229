use crate::snapshot::ParsedSnapshot;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTransition {
    pub from: String,
    pub to: String,
}

/// Canonical reconstruction of a single audit entry, as served to the
/// dashboard. Every field is always serialized; consumers index by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeReport {
    pub entry_id: String,
    pub actor_id: String,
    pub record_id: String,
    pub action: String,
    pub created_at: String,
    pub subject_label: Option<String>,
    pub fields_changed: Vec<String>,
    pub status_transition: Option<StatusTransition>,
    pub action_description: Option<String>,
    pub change_description: Option<String>,
    pub follow_up_method: Option<String>,
    pub follow_up_action: Option<String>,
    pub notes: Option<String>,
    pub before_snapshot: Option<ParsedSnapshot>,
    pub after_snapshot: Option<ParsedSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fields_still_serialize() {
        let report = ChangeReport {
            entry_id: "1".into(),
            actor_id: "2".into(),
            record_id: "3".into(),
            action: "EVENT_REQUEST_DELETED".into(),
            created_at: "2025-01-01T00:00:00+00:00".into(),
            subject_label: None,
            fields_changed: Vec::new(),
            status_transition: None,
            action_description: None,
            change_description: None,
            follow_up_method: None,
            follow_up_action: None,
            notes: None,
            before_snapshot: None,
            after_snapshot: None,
        };
        let value = serde_json::to_value(&report).expect("serialize");
        let object = value.as_object().expect("object");
        for key in [
            "entryId",
            "actorId",
            "recordId",
            "subjectLabel",
            "fieldsChanged",
            "statusTransition",
            "actionDescription",
            "changeDescription",
            "followUpMethod",
            "followUpAction",
            "notes",
            "beforeSnapshot",
            "afterSnapshot",
        ] {
            assert!(object.contains_key(key), "missing {key}");
        }
        assert_eq!(object["fieldsChanged"], serde_json::json!([]));
    }
}
