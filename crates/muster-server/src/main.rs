use anyhow::Result;
use clap::Parser;
use muster_core::{AppConfig, AppState};
use tracing_subscriber::EnvFilter;

mod cli;
mod config;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("muster=info,tower_http=debug"));
    if args.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = config::Config::load(&args.config)?;
    ensure_data_dir(&config.database.url);

    let db = muster_db::create_pool_full(
        &config.database.url,
        config.database.max_connections,
        Some(config.database.engine.into()),
        Some(muster_db::PgConnectOptions {
            statement_timeout_secs: config.database.statement_timeout_secs,
        }),
    )
    .await?;
    muster_db::run_migrations(&db).await?;

    let state = AppState {
        db,
        config: AppConfig {
            jwt_secret: config.auth.jwt_secret.clone(),
            reconcile: config.audit.policy(),
        },
    };

    let app = muster_api::build_router().with_state(state);
    let listener = tokio::net::TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(
        "Muster server listening on {} (audit metadata key '{}', status field '{}')",
        config.server.bind_address,
        config.audit.metadata_key,
        config.audit.status_field,
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Muster server stopped");
    Ok(())
}

/// Create the parent directory of a file-backed SQLite database.
fn ensure_data_dir(database_url: &str) {
    let Some(rest) = database_url.strip_prefix("sqlite://") else {
        return;
    };
    let file = rest.split('?').next().unwrap_or(rest);
    if let Some(parent) = std::path::Path::new(file).parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("Could not create data directory {:?}: {}", parent, e);
            }
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
