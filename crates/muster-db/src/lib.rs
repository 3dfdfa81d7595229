pub mod audit_log;

use sqlx::any::AnyPoolOptions;
use std::sync::OnceLock;
use thiserror::Error;

pub type DbPool = sqlx::AnyPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseEngine {
    Sqlite,
    Postgres,
}

impl DatabaseEngine {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
        }
    }
}

static ACTIVE_DB_ENGINE: OnceLock<DatabaseEngine> = OnceLock::new();

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Optional tuning knobs applied after each PostgreSQL connection is established.
#[derive(Debug, Clone, Default)]
pub struct PgConnectOptions {
    /// `statement_timeout` in seconds (0 = disabled).
    pub statement_timeout_secs: u64,
}

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    create_pool_full(database_url, max_connections, None, None).await
}

pub async fn create_pool_full(
    database_url: &str,
    max_connections: u32,
    engine: Option<DatabaseEngine>,
    pg_options: Option<PgConnectOptions>,
) -> Result<DbPool, sqlx::Error> {
    let detected_engine = detect_database_engine(database_url)?;
    let engine = engine.unwrap_or(detected_engine);
    if engine != detected_engine {
        return Err(sqlx::Error::Configuration(
            format!(
                "database engine/url mismatch: engine='{}' url='{}'",
                engine.as_str(),
                database_url
            )
            .into(),
        ));
    }

    let _ = ACTIVE_DB_ENGINE.set(engine);

    // Required once before using sqlx::Any.
    sqlx::any::install_default_drivers();

    let pg_opts = pg_options.unwrap_or_default();
    AnyPoolOptions::new()
        .max_connections(max_connections)
        .after_connect(move |conn, _meta| {
            let sqlite_db = matches!(engine, DatabaseEngine::Sqlite);
            let pg_opts = pg_opts.clone();
            Box::pin(async move {
                if sqlite_db {
                    sqlx::query("PRAGMA journal_mode = WAL;")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("PRAGMA busy_timeout = 5000;")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("PRAGMA synchronous = NORMAL;")
                        .execute(&mut *conn)
                        .await?;
                } else {
                    if pg_opts.statement_timeout_secs > 0 {
                        let sql = format!(
                            "SET statement_timeout = '{}s'",
                            pg_opts.statement_timeout_secs
                        );
                        sqlx::query(&sql).execute(&mut *conn).await?;
                    }
                    sqlx::query("SET timezone = 'UTC'")
                        .execute(&mut *conn)
                        .await?;
                }
                Ok(())
            })
        })
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    run_migrations_for_engine(pool, active_database_engine()).await
}

pub async fn run_migrations_for_engine(
    pool: &DbPool,
    engine: DatabaseEngine,
) -> Result<(), sqlx::Error> {
    match engine {
        DatabaseEngine::Sqlite => sqlx::migrate!("./migrations").run(pool).await?,
        DatabaseEngine::Postgres => sqlx::migrate!("./migrations_pg").run(pool).await?,
    }
    tracing::info!("migrations: applied successfully");
    Ok(())
}

pub fn detect_database_engine(database_url: &str) -> Result<DatabaseEngine, sqlx::Error> {
    let normalized = database_url.trim().to_ascii_lowercase();
    if normalized.starts_with("sqlite:") {
        Ok(DatabaseEngine::Sqlite)
    } else if normalized.starts_with("postgres://") || normalized.starts_with("postgresql://") {
        Ok(DatabaseEngine::Postgres)
    } else {
        Err(sqlx::Error::Configuration(
            format!("unsupported database URL scheme in '{}'", database_url).into(),
        ))
    }
}

pub fn active_database_engine() -> DatabaseEngine {
    *ACTIVE_DB_ENGINE.get().unwrap_or(&DatabaseEngine::Sqlite)
}

/// Fixed-width UTC text, so lexical order in the database matches time order.
pub(crate) fn datetime_to_db_text(value: chrono::DateTime<chrono::Utc>) -> String {
    value.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

pub(crate) fn datetime_from_db_text(
    value: &str,
) -> Result<chrono::DateTime<chrono::Utc>, sqlx::Error> {
    use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive));
    }

    Err(sqlx::Error::Protocol(format!(
        "invalid datetime text '{}'",
        value
    )))
}

#[cfg(test)]
mod tests {
    use super::{
        create_pool, datetime_from_db_text, datetime_to_db_text, detect_database_engine,
        run_migrations, DatabaseEngine,
    };
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn create_pool_supports_default_sqlite_mode() {
        let pool = create_pool("sqlite::memory:", 1).await.expect("pool");
        let value: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&pool)
            .await
            .expect("query");
        assert_eq!(value, 1);
    }

    #[tokio::test]
    async fn migrations_create_audit_table() {
        let pool = create_pool("sqlite::memory:", 1).await.expect("pool");
        run_migrations(&pool).await.expect("migrations");
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_log_entries")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(count, 0);
    }

    #[test]
    fn engine_detection_follows_url_scheme() {
        assert_eq!(
            detect_database_engine("sqlite://./data/muster.db").expect("sqlite"),
            DatabaseEngine::Sqlite
        );
        assert_eq!(
            detect_database_engine("postgresql://localhost/muster").expect("pg"),
            DatabaseEngine::Postgres
        );
        assert!(detect_database_engine("mysql://localhost/muster").is_err());
    }

    #[test]
    fn datetime_text_round_trips_and_accepts_rfc3339() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();
        assert_eq!(datetime_from_db_text(&datetime_to_db_text(ts)).unwrap(), ts);
        assert_eq!(
            datetime_from_db_text("2025-03-14T09:26:53Z").unwrap(),
            ts
        );
        assert!(datetime_from_db_text("yesterday").is_err());
    }

    #[test]
    fn datetime_text_keeps_fractional_seconds() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap()
            + chrono::Duration::microseconds(300_250);
        let text = datetime_to_db_text(ts);
        assert_eq!(text, "2025-03-14T09:26:53.300250Z");
        assert_eq!(datetime_from_db_text(&text).unwrap(), ts);
        // Whole seconds keep the same width, so text order follows time order.
        let whole = datetime_to_db_text(Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 54).unwrap());
        assert_eq!(whole.len(), text.len());
        assert!(text < whole);
    }
}
