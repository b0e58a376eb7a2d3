use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::auth::AdminAccess;
use crate::error::AppResult;
use crate::snapshots::{
    active_snapshot, create_snapshot, snapshot_history, SnapshotSubmission, SnapshotSummary,
    SnapshotView,
};
use crate::state::AppState;

#[derive(Serialize)]
pub struct SnapshotCreated {
    pub success: bool,
    pub snapshot_id: Uuid,
    pub content_hash: String,
}

pub async fn save_document_snapshot(
    State(state): State<AppState>,
    _admin: AdminAccess,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<(StatusCode, Json<SnapshotCreated>)> {
    let Json(body) = payload?;
    let submission = SnapshotSubmission::from_json(body)?;
    let row = create_snapshot(state.snapshots.as_ref(), submission).await?;
    Ok((
        StatusCode::CREATED,
        Json(SnapshotCreated {
            success: true,
            snapshot_id: row.snapshot_id,
            content_hash: row.content_hash,
        }),
    ))
}

pub async fn get_active_snapshot(
    State(state): State<AppState>,
    Path((document_type, language)): Path<(String, String)>,
) -> AppResult<Json<SnapshotView>> {
    let snapshot = active_snapshot(state.snapshots.as_ref(), &document_type, &language).await?;
    Ok(Json(snapshot.into()))
}

pub async fn list_snapshot_versions(
    State(state): State<AppState>,
    _admin: AdminAccess,
    Path((document_type, language)): Path<(String, String)>,
) -> AppResult<Json<Vec<SnapshotSummary>>> {
    let versions = snapshot_history(state.snapshots.as_ref(), &document_type, &language).await?;
    Ok(Json(versions.into_iter().map(SnapshotSummary::from).collect()))
}
