use std::net::SocketAddr;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        ConnectInfo, Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    Json,
};
use axum_extra::{headers::UserAgent, TypedHeader};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::auth::AdminAccess;
use crate::consent::{record_consent, ClientMetadata, ConsentSubmission, FORWARDED_FOR_HEADER};
use crate::error::{AppError, AppResult};
use crate::store::ConsentStats;
use crate::state::AppState;
use crate::verification::{verify_session, ConsentVerification};

#[derive(Serialize)]
pub struct ConsentLogged {
    pub success: bool,
    pub consent_log_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct StatsQuery {
    pub since: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: ConsentStats,
    pub since: Option<DateTime<Utc>>,
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    let hops: Vec<&str> = headers
        .get_all(FORWARDED_FOR_HEADER)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect();
    (!hops.is_empty()).then(|| hops.join(", "))
}

pub async fn log_consent(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    user_agent: Option<TypedHeader<UserAgent>>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ConsentLogged>)> {
    let Json(body) = payload?;
    let submission = ConsentSubmission::from_json(body)?;
    let client = ClientMetadata::new(
        forwarded_for(&headers),
        connect_info.map(|ConnectInfo(addr)| addr),
        user_agent.map(|TypedHeader(agent)| agent.as_str().to_string()),
    );

    let row = record_consent(
        state.consents.as_ref(),
        state.geo.as_ref(),
        submission,
        client,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ConsentLogged {
            success: true,
            consent_log_id: row.consent_log_id,
            timestamp: row.created_at,
        }),
    ))
}

pub async fn verify_consents(
    State(state): State<AppState>,
    session_id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<ConsentVerification>> {
    let Path(session_id) =
        session_id.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let verification = verify_session(state.consents.as_ref(), session_id).await?;
    Ok(Json(verification))
}

pub async fn consent_stats(
    State(state): State<AppState>,
    _admin: AdminAccess,
    query: Result<Query<StatsQuery>, QueryRejection>,
) -> AppResult<Json<StatsResponse>> {
    let Query(StatsQuery { since }) =
        query.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let stats = state.consents.stats(since).await?;
    Ok(Json(StatsResponse { stats, since }))
}
