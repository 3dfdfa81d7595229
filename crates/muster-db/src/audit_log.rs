use crate::{datetime_from_db_text, datetime_to_db_text, DbError, DbPool};
use chrono::{DateTime, Utc};
use muster_models::audit_log::{AuditLogEntry, ExternalId};
use sqlx::any::AnyRow;
use sqlx::Row;

const ENTRY_COLUMNS: &str =
    "id, action, record_id, actor_id, before_snapshot, after_snapshot, created_at";

#[derive(Debug, Clone)]
pub struct AuditLogEntryRow {
    pub id: i64,
    pub action: String,
    pub record_id: i64,
    pub actor_id: String,
    pub before_snapshot: Option<String>,
    pub after_snapshot: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditLogEntryRow {
    fn from_any_row(row: &AnyRow) -> Result<Self, sqlx::Error> {
        let created_at: String = row.try_get("created_at")?;
        Ok(Self {
            id: row.try_get("id")?,
            action: row.try_get("action")?,
            record_id: row.try_get("record_id")?,
            actor_id: row.try_get("actor_id")?,
            before_snapshot: row.try_get("before_snapshot")?,
            after_snapshot: row.try_get("after_snapshot")?,
            created_at: datetime_from_db_text(&created_at)?,
        })
    }
}

impl From<AuditLogEntryRow> for AuditLogEntry {
    fn from(row: AuditLogEntryRow) -> Self {
        Self {
            id: row.id,
            action: row.action,
            record_id: ExternalId::Int(row.record_id),
            actor_id: ExternalId::Text(row.actor_id),
            before_snapshot: row.before_snapshot,
            after_snapshot: row.after_snapshot,
            created_at: row.created_at,
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub async fn create_entry(
    pool: &DbPool,
    id: i64,
    action: &str,
    record_id: i64,
    actor_id: &str,
    before_snapshot: Option<&str>,
    after_snapshot: Option<&str>,
    created_at: DateTime<Utc>,
) -> Result<AuditLogEntryRow, DbError> {
    let sql = format!(
        "INSERT INTO audit_log_entries ({ENTRY_COLUMNS})
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING {ENTRY_COLUMNS}"
    );
    let row = sqlx::query(&sql)
        .bind(id)
        .bind(action)
        .bind(record_id)
        .bind(actor_id)
        .bind(before_snapshot)
        .bind(after_snapshot)
        .bind(datetime_to_db_text(created_at))
        .fetch_one(pool)
        .await?;
    Ok(AuditLogEntryRow::from_any_row(&row)?)
}

pub async fn get_entry(pool: &DbPool, id: i64) -> Result<Option<AuditLogEntryRow>, DbError> {
    let sql = format!("SELECT {ENTRY_COLUMNS} FROM audit_log_entries WHERE id = $1");
    let row = sqlx::query(&sql).bind(id).fetch_optional(pool).await?;
    row.as_ref()
        .map(AuditLogEntryRow::from_any_row)
        .transpose()
        .map_err(DbError::from)
}

/// Entries for one record, newest first, optionally paging below `before`.
pub async fn get_record_entries(
    pool: &DbPool,
    record_id: i64,
    before: Option<i64>,
    limit: i64,
) -> Result<Vec<AuditLogEntryRow>, DbError> {
    let rows = match before {
        None => {
            let sql = format!(
                "SELECT {ENTRY_COLUMNS} FROM audit_log_entries WHERE record_id = $1
                 ORDER BY id DESC LIMIT $2"
            );
            sqlx::query(&sql)
                .bind(record_id)
                .bind(limit)
                .fetch_all(pool)
                .await?
        }
        Some(b) => {
            let sql = format!(
                "SELECT {ENTRY_COLUMNS} FROM audit_log_entries WHERE record_id = $1 AND id < $2
                 ORDER BY id DESC LIMIT $3"
            );
            sqlx::query(&sql)
                .bind(record_id)
                .bind(b)
                .bind(limit)
                .fetch_all(pool)
                .await?
        }
    };
    collect_rows(&rows)
}

/// Entries whose `created_at` lies in `[since, until)`, newest first.
pub async fn get_entries_in_range(
    pool: &DbPool,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
    limit: i64,
) -> Result<Vec<AuditLogEntryRow>, DbError> {
    let rows = match (since, until) {
        (None, None) => {
            let sql = format!(
                "SELECT {ENTRY_COLUMNS} FROM audit_log_entries ORDER BY id DESC LIMIT $1"
            );
            sqlx::query(&sql).bind(limit).fetch_all(pool).await?
        }
        (Some(s), None) => {
            let sql = format!(
                "SELECT {ENTRY_COLUMNS} FROM audit_log_entries WHERE created_at >= $1
                 ORDER BY id DESC LIMIT $2"
            );
            sqlx::query(&sql)
                .bind(datetime_to_db_text(s))
                .bind(limit)
                .fetch_all(pool)
                .await?
        }
        (None, Some(u)) => {
            let sql = format!(
                "SELECT {ENTRY_COLUMNS} FROM audit_log_entries WHERE created_at < $1
                 ORDER BY id DESC LIMIT $2"
            );
            sqlx::query(&sql)
                .bind(datetime_to_db_text(u))
                .bind(limit)
                .fetch_all(pool)
                .await?
        }
        (Some(s), Some(u)) => {
            let sql = format!(
                "SELECT {ENTRY_COLUMNS} FROM audit_log_entries WHERE created_at >= $1 AND created_at < $2
                 ORDER BY id DESC LIMIT $3"
            );
            sqlx::query(&sql)
                .bind(datetime_to_db_text(s))
                .bind(datetime_to_db_text(u))
                .bind(limit)
                .fetch_all(pool)
                .await?
        }
    };
    collect_rows(&rows)
}

fn collect_rows(rows: &[AnyRow]) -> Result<Vec<AuditLogEntryRow>, DbError> {
    rows.iter()
        .map(AuditLogEntryRow::from_any_row)
        .collect::<Result<Vec<_>, _>>()
        .map_err(DbError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};
    use chrono::{Duration, TimeZone};

    async fn test_pool() -> DbPool {
        let pool = create_pool("sqlite::memory:", 1).await.expect("pool");
        run_migrations(&pool).await.expect("migrations");
        pool
    }

    #[tokio::test]
    async fn create_and_fetch_entry() {
        let pool = test_pool().await;
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let created = create_entry(
            &pool,
            10,
            "EVENT_REQUEST_UPDATED",
            577,
            "admin_1",
            Some(r#"{"status":"Requested"}"#),
            None,
            at,
        )
        .await
        .expect("create");
        assert_eq!(created.record_id, 577);
        assert_eq!(created.created_at, at);

        let fetched = get_entry(&pool, 10).await.expect("get").expect("exists");
        assert_eq!(fetched.action, "EVENT_REQUEST_UPDATED");
        assert_eq!(fetched.before_snapshot.as_deref(), Some(r#"{"status":"Requested"}"#));
        assert!(fetched.after_snapshot.is_none());
        assert!(get_entry(&pool, 11).await.expect("get").is_none());
    }

    #[tokio::test]
    async fn record_history_is_newest_first_and_pages() {
        let pool = test_pool().await;
        let at = Utc::now();
        for id in 1..=4 {
            let record = if id == 3 { 9 } else { 577 };
            create_entry(&pool, id, "EVENT_REQUEST_UPDATED", record, "u", Some("{}"), None, at)
                .await
                .expect("create");
        }

        let rows = get_record_entries(&pool, 577, None, 10).await.expect("history");
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![4, 2, 1]);

        let page = get_record_entries(&pool, 577, Some(4), 1).await.expect("page");
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, 2);
    }

    #[tokio::test]
    async fn range_query_is_half_open() {
        let pool = test_pool().await;
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        for (id, offset) in [(1, 0), (2, 1), (3, 2)] {
            create_entry(
                &pool,
                id,
                "EVENT_REQUEST_CREATED",
                1,
                "u",
                None,
                Some("{}"),
                base + Duration::days(offset),
            )
            .await
            .expect("create");
        }

        let rows = get_entries_in_range(
            &pool,
            Some(base + Duration::days(1)),
            Some(base + Duration::days(2)),
            10,
        )
        .await
        .expect("range");
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2]);

        let all = get_entries_in_range(&pool, None, None, 2).await.expect("all");
        assert_eq!(all.iter().map(|r| r.id).collect::<Vec<_>>(), vec![3, 2]);
    }

    #[tokio::test]
    async fn range_bounds_respect_fractional_seconds() {
        let pool = test_pool().await;
        let noon = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let at = noon + Duration::milliseconds(300);
        create_entry(&pool, 1, "EVENT_REQUEST_UPDATED", 1, "u", None, Some("{}"), at)
            .await
            .expect("create");

        let after_row = get_entries_in_range(&pool, Some(noon + Duration::milliseconds(500)), None, 10)
            .await
            .expect("range");
        assert!(after_row.is_empty());

        let before_row = get_entries_in_range(&pool, None, Some(noon + Duration::milliseconds(200)), 10)
            .await
            .expect("range");
        assert!(before_row.is_empty());

        let around = get_entries_in_range(
            &pool,
            Some(noon + Duration::milliseconds(100)),
            Some(noon + Duration::milliseconds(301)),
            10,
        )
        .await
        .expect("range");
        assert_eq!(around.len(), 1);
        assert_eq!(around[0].created_at, at);
    }
}
