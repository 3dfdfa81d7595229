use crate::error::CoreError;
use crate::reconcile::{build_change_report, build_change_reports, ReconcilePolicy};
use chrono::{DateTime, Utc};
use muster_db::DbPool;
use muster_models::audit_log::AuditLogEntry;
use muster_models::change_report::ChangeReport;
use serde_json::Value;

/// A mutation to record, as seen by the handler that performed it.
#[derive(Debug, Clone)]
pub struct NewAuditEntry<'a> {
    pub action: &'a str,
    pub record_id: i64,
    pub actor_id: &'a str,
    pub before: Option<&'a Value>,
    pub after: Option<&'a Value>,
}

/// Append an audit row. At least one snapshot is required.
pub async fn log_change(pool: &DbPool, entry: NewAuditEntry<'_>) -> Result<AuditLogEntry, CoreError> {
    if entry.action.trim().is_empty() {
        return Err(CoreError::BadRequest("audit action is required".into()));
    }
    if entry.before.is_none() && entry.after.is_none() {
        return Err(CoreError::BadRequest(
            "audit entry needs a before or after snapshot".into(),
        ));
    }

    let id = muster_util::snowflake::generate(1);
    let before = entry.before.map(Value::to_string);
    let after = entry.after.map(Value::to_string);
    let row = muster_db::audit_log::create_entry(
        pool,
        id,
        entry.action,
        entry.record_id,
        entry.actor_id,
        before.as_deref(),
        after.as_deref(),
        Utc::now(),
    )
    .await
    .inspect_err(|err| tracing::warn!("failed to write audit entry: {}", err))?;
    Ok(row.into())
}

pub async fn get_report(
    pool: &DbPool,
    policy: &ReconcilePolicy,
    entry_id: i64,
) -> Result<ChangeReport, CoreError> {
    let row = muster_db::audit_log::get_entry(pool, entry_id)
        .await?
        .ok_or(CoreError::NotFound)?;
    Ok(build_change_report(&row.into(), policy))
}

/// Change history of one record, newest first.
pub async fn list_record_history(
    pool: &DbPool,
    policy: &ReconcilePolicy,
    record_id: i64,
    before: Option<i64>,
    limit: i64,
) -> Result<Vec<ChangeReport>, CoreError> {
    let rows = muster_db::audit_log::get_record_entries(pool, record_id, before, limit).await?;
    let entries: Vec<AuditLogEntry> = rows.into_iter().map(Into::into).collect();
    Ok(build_change_reports(&entries, policy))
}

/// Reports for entries created in `[since, until)`, newest first.
pub async fn list_reports_in_range(
    pool: &DbPool,
    policy: &ReconcilePolicy,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
    limit: i64,
) -> Result<Vec<ChangeReport>, CoreError> {
    if let (Some(s), Some(u)) = (since, until) {
        if s >= u {
            return Err(CoreError::BadRequest("since must be earlier than until".into()));
        }
    }
    let rows = muster_db::audit_log::get_entries_in_range(pool, since, until, limit).await?;
    let entries: Vec<AuditLogEntry> = rows.into_iter().map(Into::into).collect();
    Ok(build_change_reports(&entries, policy))
}
