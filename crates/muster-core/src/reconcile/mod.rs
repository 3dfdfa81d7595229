//! Audit change reconciliation.
//!
//! Turns a stored audit row into a [`ChangeReport`]: snapshots are decoded,
//! contextual fields resolved through their fallback chains, and the status
//! change and changed-field list derived. Every step is total, so a report is
//! produced for any row, however damaged.

pub mod diff;
pub mod metadata;
pub mod snapshot;

use muster_models::audit_log::AuditLogEntry;
use muster_models::change_report::ChangeReport;
use muster_models::snapshot::{IdentityKeys, ParsedSnapshot, AUDIT_METADATA_KEY};
use serde_json::Value;

/// Knobs for how snapshots are interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilePolicy {
    /// Key of the embedded audit metadata object.
    pub metadata_key: String,
    /// Field compared across snapshots to detect a status transition.
    pub status_field: String,
    /// Keys read to build the subject label.
    pub identity: IdentityKeys,
}

impl Default for ReconcilePolicy {
    fn default() -> Self {
        Self {
            metadata_key: AUDIT_METADATA_KEY.to_string(),
            status_field: "status".to_string(),
            identity: IdentityKeys::default(),
        }
    }
}

/// The decoded snapshots of one entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotPair<'a> {
    pub before: Option<&'a ParsedSnapshot>,
    pub after: Option<&'a ParsedSnapshot>,
}

impl<'a> SnapshotPair<'a> {
    pub fn new(before: Option<&'a ParsedSnapshot>, after: Option<&'a ParsedSnapshot>) -> Self {
        Self { before, after }
    }

    /// After-state when present, otherwise the before-state.
    pub fn primary(&self) -> Option<&'a ParsedSnapshot> {
        self.after.or(self.before)
    }

    /// The snapshot consulted when the primary one lacks a field.
    pub fn secondary(&self) -> Option<&'a ParsedSnapshot> {
        self.after.and(self.before)
    }

    /// First value `read` yields from the primary, then the secondary snapshot.
    pub fn find<T>(&self, read: impl Fn(&'a ParsedSnapshot) -> Option<T>) -> Option<T> {
        self.primary()
            .and_then(&read)
            .or_else(|| self.secondary().and_then(&read))
    }
}

/// Display text for a scalar snapshot value. Blank strings, nulls, arrays
/// and objects have none.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn build_change_report(entry: &AuditLogEntry, policy: &ReconcilePolicy) -> ChangeReport {
    let before = snapshot::parse_snapshot(entry.before_snapshot.as_deref());
    let after = snapshot::parse_snapshot(entry.after_snapshot.as_deref());
    if before.is_none() && after.is_none() {
        tracing::debug!(entry_id = entry.id, "audit entry has no readable snapshot");
    }

    let pair = SnapshotPair::new(before.as_ref(), after.as_ref());
    let context = metadata::extract(&pair, &entry.action, policy);
    let subject_label = metadata::subject_label(&pair, &policy.identity);
    let diff = diff::reconcile(&pair, policy);

    ChangeReport {
        entry_id: entry.id.to_string(),
        actor_id: entry.actor_id.to_canonical(),
        record_id: entry.record_id.to_canonical(),
        action: entry.action.clone(),
        created_at: entry.created_at.to_rfc3339(),
        subject_label,
        fields_changed: diff.fields_changed,
        status_transition: diff.status_transition,
        action_description: context.action_description,
        change_description: context.change_description,
        follow_up_method: context.follow_up_method,
        follow_up_action: context.follow_up_action,
        notes: context.notes,
        before_snapshot: before,
        after_snapshot: after,
    }
}

pub fn build_change_reports(entries: &[AuditLogEntry], policy: &ReconcilePolicy) -> Vec<ChangeReport> {
    entries
        .iter()
        .map(|entry| build_change_report(entry, policy))
        .collect()
}
