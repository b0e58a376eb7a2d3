use axum::{extract::State, http::StatusCode, response::Json};
use chrono::Utc;
use serde_json::json;

use crate::state::AppState;

pub const SERVICE_NAME: &str = "ticket-consent-logger";

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": SERVICE_NAME,
            "timestamp": Utc::now().to_rfc3339(),
            "document_version": state.config.document_version,
        })),
    )
}
