use axum::{
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use muster_core::AppState;
use serde_json::json;

pub mod error;
pub mod middleware;
pub mod routes;

pub fn build_router() -> Router<AppState> {
    let cors = build_cors_layer();
    Router::new()
        // Health
        .route("/health", get(health))
        .route("/api/v1/health", get(health))
        // Audit reports
        .route(
            "/api/v1/audit-logs",
            get(routes::audit_logs::list_audit_logs),
        )
        .route(
            "/api/v1/audit-logs/{entry_id}",
            get(routes::audit_logs::get_audit_log),
        )
        .route(
            "/api/v1/records/{record_id}/audit-logs",
            get(routes::audit_logs::get_record_audit_logs),
        )
        // Middleware layers
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

fn build_cors_layer() -> tower_http::cors::CorsLayer {
    // The dashboard is served from a separate origin; the API is read-only.
    tower_http::cors::CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET])
        .allow_headers(tower_http::cors::Any)
}

async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "service": "muster" })),
    )
}
