use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;

use crate::AppState;

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let db_ok = state.db.ping().await.is_ok();
    let status = if db_ok { "ok" } else { "degraded" };
    Json(json!({
        "status": status,
        "database": db_ok,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
