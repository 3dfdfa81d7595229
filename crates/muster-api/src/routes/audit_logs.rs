use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use muster_core::AppState;
use muster_models::change_report::ChangeReport;
use muster_models::snapshot::ParsedSnapshot;
use muster_util::pagination::{clamp_limit, PaginationParams};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::AdminUser;

#[derive(Deserialize)]
pub struct AuditLogQuery {
    pub since: Option<String>,
    pub until: Option<String>,
    pub limit: Option<i64>,
}

/// Wire form of a report. `oldData`/`newData` repeat the snapshots under the
/// names older dashboard builds read.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeReportResponse<'a> {
    #[serde(flatten)]
    pub report: &'a ChangeReport,
    pub old_data: Option<&'a ParsedSnapshot>,
    pub new_data: Option<&'a ParsedSnapshot>,
}

impl<'a> From<&'a ChangeReport> for ChangeReportResponse<'a> {
    fn from(report: &'a ChangeReport) -> Self {
        Self {
            report,
            old_data: report.before_snapshot.as_ref(),
            new_data: report.after_snapshot.as_ref(),
        }
    }
}

fn report_json(report: &ChangeReport) -> Result<Value, ApiError> {
    serde_json::to_value(ChangeReportResponse::from(report))
        .map_err(|e| ApiError::Internal(anyhow::anyhow!(e)))
}

fn reports_json(reports: &[ChangeReport]) -> Result<Value, ApiError> {
    let audit_log_entries = reports
        .iter()
        .map(report_json)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(json!({ "audit_log_entries": audit_log_entries }))
}

fn parse_timestamp(name: &str, raw: Option<&str>) -> Result<Option<DateTime<Utc>>, ApiError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| Some(dt.with_timezone(&Utc)))
        .map_err(|_| ApiError::BadRequest(format!("{name} must be an RFC 3339 timestamp")))
}

pub async fn list_audit_logs(
    State(state): State<AppState>,
    admin: AdminUser,
    Query(params): Query<AuditLogQuery>,
) -> Result<Json<Value>, ApiError> {
    let since = parse_timestamp("since", params.since.as_deref())?;
    let until = parse_timestamp("until", params.until.as_deref())?;
    let limit = clamp_limit(params.limit);

    let reports = muster_core::audit::list_reports_in_range(
        &state.db,
        &state.config.reconcile,
        since,
        until,
        limit,
    )
    .await?;
    tracing::debug!(actor = %admin.actor_id, count = reports.len(), "served audit log range");

    Ok(Json(reports_json(&reports)?))
}

pub async fn get_audit_log(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(entry_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let report =
        muster_core::audit::get_report(&state.db, &state.config.reconcile, entry_id).await?;
    Ok(Json(report_json(&report)?))
}

pub async fn get_record_audit_logs(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(record_id): Path<i64>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Value>, ApiError> {
    let reports = muster_core::audit::list_record_history(
        &state.db,
        &state.config.reconcile,
        record_id,
        params.before,
        params.limit(),
    )
    .await?;
    tracing::debug!(actor = %admin.actor_id, record_id, count = reports.len(), "served record history");

    Ok(Json(reports_json(&reports)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_form_aliases_snapshots() {
        let before = ParsedSnapshot::from_value(json!({ "status": "Requested" }));
        let report = ChangeReport {
            entry_id: "1".into(),
            actor_id: "admin_7".into(),
            record_id: "577".into(),
            action: "EVENT_REQUEST_DELETED".into(),
            created_at: "2025-01-01T00:00:00+00:00".into(),
            subject_label: None,
            fields_changed: Vec::new(),
            status_transition: None,
            action_description: Some("EVENT_REQUEST_DELETED".into()),
            change_description: None,
            follow_up_method: None,
            follow_up_action: None,
            notes: None,
            before_snapshot: before,
            after_snapshot: None,
        };
        let value = report_json(&report).expect("json");
        assert_eq!(value["oldData"], json!({ "status": "Requested" }));
        assert_eq!(value["beforeSnapshot"], value["oldData"]);
        assert_eq!(value["newData"], Value::Null);
        assert_eq!(value["recordId"], json!("577"));
        assert!(value.as_object().expect("object").contains_key("afterSnapshot"));
    }

    #[test]
    fn timestamps_must_be_rfc3339() {
        assert!(parse_timestamp("since", None).expect("none").is_none());
        assert!(parse_timestamp("since", Some(" ")).expect("blank").is_none());
        assert!(parse_timestamp("since", Some("2025-05-01T00:00:00Z"))
            .expect("valid")
            .is_some());
        assert!(matches!(
            parse_timestamp("since", Some("last tuesday")),
            Err(ApiError::BadRequest(_))
        ));
    }
}
