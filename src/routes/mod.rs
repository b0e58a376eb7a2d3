use axum::http::{header::CONTENT_TYPE, HeaderValue, Method};
use axum::{extract::DefaultBodyLimit, routing::get, routing::post, Router};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::{auth::X_API_KEY, state::AppState};

pub mod consent;
pub mod health;
pub mod snapshots;

const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

pub fn create_router(state: AppState) -> Router<()> {
    let cors = cors_layer(&state.config.allowed_origins);

    let consent_routes = Router::new()
        .route("/", post(consent::log_consent))
        .route("/verify/:session_id", get(consent::verify_consents))
        .route("/stats", get(consent::consent_stats));

    let snapshot_routes = Router::new()
        .route("/", post(snapshots::save_document_snapshot))
        .route(
            "/:document_type/:language",
            get(snapshots::get_active_snapshot),
        )
        .route(
            "/:document_type/:language/versions",
            get(snapshots::list_snapshot_versions),
        );

    Router::new()
        .nest("/api/consent", consent_routes)
        .nest("/api/document-snapshot", snapshot_routes)
        .route("/health", get(health::health_check))
        .route("/api/health", get(health::health_check))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, X_API_KEY.clone()]);

    if allowed_origins.is_empty() || allowed_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(origin = %origin, error = %err, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}
