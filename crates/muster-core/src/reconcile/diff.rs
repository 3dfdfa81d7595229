use super::{scalar_text, ReconcilePolicy, SnapshotPair};
use muster_models::change_report::StatusTransition;
use muster_models::snapshot::ParsedSnapshot;
use serde_json::Value;

/// Metadata keys the write path uses for its list of changed fields.
const CHANGED_FIELDS_KEYS: &[&str] = &["changedFields", "fieldsChanged"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffOutcome {
    pub fields_changed: Vec<String>,
    pub status_transition: Option<StatusTransition>,
}

pub fn reconcile(pair: &SnapshotPair<'_>, policy: &ReconcilePolicy) -> DiffOutcome {
    DiffOutcome {
        fields_changed: fields_changed(pair.after, &policy.metadata_key),
        status_transition: status_transition(pair.before, pair.after, &policy.status_field),
    }
}

/// The changed-field list recorded by the write path, verbatim.
///
/// No structural comparison is attempted; without a recorded list the result
/// is empty.
pub fn fields_changed(after: Option<&ParsedSnapshot>, metadata_key: &str) -> Vec<String> {
    let Some(metadata) = after.and_then(|snap| snap.metadata(metadata_key)) else {
        return Vec::new();
    };
    CHANGED_FIELDS_KEYS
        .iter()
        .find_map(|key| metadata.get(*key).and_then(Value::as_array))
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Status change between the two snapshots.
///
/// Only reported when both snapshots carry a renderable status value and the
/// values differ by JSON equality. Strings are compared trimmed.
pub fn status_transition(
    before: Option<&ParsedSnapshot>,
    after: Option<&ParsedSnapshot>,
    status_field: &str,
) -> Option<StatusTransition> {
    let from_value = before?.get(status_field)?;
    let to_value = after?.get(status_field)?;
    let from = scalar_text(from_value)?;
    let to = scalar_text(to_value)?;
    let unchanged = match (from_value, to_value) {
        (Value::String(_), Value::String(_)) => from == to,
        _ => from_value == to_value,
    };
    (!unchanged).then_some(StatusTransition { from, to })
}
