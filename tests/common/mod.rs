use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::extract::connect_info::MockConnectInfo;
use axum::http::{Method, Request};
use axum::Router;
use chrono::{DateTime, Utc};
use consent_logger::config::AppConfig;
use consent_logger::documents::{DocumentType, Language};
use consent_logger::geo::GeoLocator;
use consent_logger::models::{ConsentLog, DocumentSnapshot, NewConsentLog, NewDocumentSnapshot};
use consent_logger::routes;
use consent_logger::state::AppState;
use consent_logger::store::{
    ConsentLogStore, ConsentStats, SnapshotStore, StoreError, StoreResult,
};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tower::util::ServiceExt;
use uuid::Uuid;

pub const ADMIN_KEY: &str = "test-admin-key";
pub const PEER_ADDR: &str = "198.51.100.20:40000";

#[derive(Default)]
struct MemoryState {
    consent_logs: Vec<ConsentLog>,
    snapshots: Vec<DocumentSnapshot>,
    next_sequence: i64,
}

/// In-memory stand-in for `PgStore`, honoring the same ordering and
/// uniqueness rules.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryState>,
}

impl MemoryStore {
    #[allow(dead_code)]
    pub async fn consent_logs(&self) -> Vec<ConsentLog> {
        self.inner.lock().await.consent_logs.clone()
    }

    #[allow(dead_code)]
    pub async fn snapshots(&self) -> Vec<DocumentSnapshot> {
        self.inner.lock().await.snapshots.clone()
    }
}

#[async_trait]
impl ConsentLogStore for MemoryStore {
    async fn append(&self, entry: NewConsentLog) -> StoreResult<ConsentLog> {
        let mut guard = self.inner.lock().await;
        if guard
            .consent_logs
            .iter()
            .any(|row| row.consent_log_id == entry.consent_log_id)
        {
            return Err(StoreError::Conflict("consent_logs_pkey".to_string()));
        }
        guard.next_sequence += 1;
        let row = ConsentLog {
            consent_log_id: entry.consent_log_id,
            purchase_id: entry.purchase_id,
            session_id: entry.session_id,
            document_type: entry.document_type,
            document_version: entry.document_version,
            document_hash: entry.document_hash,
            consent_given: entry.consent_given,
            consent_text: entry.consent_text,
            consent_timestamp: entry.consent_timestamp,
            client_ip: entry.client_ip,
            client_ip_forwarded: entry.client_ip_forwarded,
            user_agent: entry.user_agent,
            ip_country: entry.ip_country,
            referrer_url: entry.referrer_url,
            page_url: entry.page_url,
            created_at: Utc::now(),
            sequence_number: guard.next_sequence,
        };
        guard.consent_logs.push(row.clone());
        Ok(row)
    }

    async fn list_for_session(&self, session_id: Uuid) -> StoreResult<Vec<ConsentLog>> {
        let guard = self.inner.lock().await;
        let mut rows: Vec<ConsentLog> = guard
            .consent_logs
            .iter()
            .filter(|row| row.session_id == session_id)
            .cloned()
            .collect();
        rows.sort_by_key(|row| (row.consent_timestamp, row.sequence_number));
        Ok(rows)
    }

    async fn stats(&self, since: Option<DateTime<Utc>>) -> StoreResult<ConsentStats> {
        let guard = self.inner.lock().await;
        let rows: Vec<&ConsentLog> = guard
            .consent_logs
            .iter()
            .filter(|row| since.map_or(true, |since| row.consent_timestamp >= since))
            .collect();

        let mut sessions: Vec<Uuid> = rows.iter().map(|row| row.session_id).collect();
        sessions.sort();
        sessions.dedup();

        let mut stats = ConsentStats {
            total_consents: rows.len() as i64,
            unique_sessions: sessions.len() as i64,
            ..ConsentStats::default()
        };
        for row in rows {
            if let Ok(ty) = row.document_type.parse::<DocumentType>() {
                *stats.by_document_type.get_mut(ty) += 1;
            }
        }
        Ok(stats)
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn replace_active(&self, snapshot: NewDocumentSnapshot) -> StoreResult<DocumentSnapshot> {
        let mut guard = self.inner.lock().await;
        // Checked up front so a rejected insert leaves the active row untouched.
        if guard.snapshots.iter().any(|row| {
            row.document_type == snapshot.document_type
                && row.language == snapshot.language
                && row.version == snapshot.version
        }) {
            return Err(StoreError::Conflict(
                "document_snapshots_document_type_language_version_key".to_string(),
            ));
        }

        for row in guard.snapshots.iter_mut().filter(|row| {
            row.document_type == snapshot.document_type && row.language == snapshot.language
        }) {
            row.is_active = false;
        }

        let row = DocumentSnapshot {
            snapshot_id: snapshot.snapshot_id,
            document_type: snapshot.document_type,
            version: snapshot.version,
            content_hash: snapshot.content_hash,
            full_text: snapshot.full_text,
            language: snapshot.language,
            is_active: snapshot.is_active,
            created_at: Utc::now(),
            created_by: snapshot.created_by,
        };
        guard.snapshots.push(row.clone());
        Ok(row)
    }

    async fn find_active(
        &self,
        document_type: DocumentType,
        language: Language,
    ) -> StoreResult<Option<DocumentSnapshot>> {
        let guard = self.inner.lock().await;
        Ok(guard
            .snapshots
            .iter()
            .rev()
            .find(|row| {
                row.is_active
                    && row.document_type == document_type.as_str()
                    && row.language == language.as_str()
            })
            .cloned())
    }

    async fn history(
        &self,
        document_type: DocumentType,
        language: Language,
    ) -> StoreResult<Vec<DocumentSnapshot>> {
        let guard = self.inner.lock().await;
        Ok(guard
            .snapshots
            .iter()
            .rev()
            .filter(|row| {
                row.document_type == document_type.as_str() && row.language == language.as_str()
            })
            .cloned()
            .collect())
    }
}

/// Resolves every address to the same country.
pub struct FixedGeoLocator(pub &'static str);

#[async_trait]
impl GeoLocator for FixedGeoLocator {
    async fn country_for(&self, _ip: &str) -> Option<String> {
        Some(self.0.to_string())
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://unused@localhost/unused".to_string(),
        database_max_pool_size: 1,
        database_statement_timeout_ms: 1_000,
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        admin_key: Some(ADMIN_KEY.to_string()),
        allowed_origins: Vec::new(),
        document_version: "v-test".to_string(),
    }
}

pub struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_parts(test_config(), Arc::new(consent_logger::geo::NoopGeoLocator))
    }

    pub fn with_parts(config: AppConfig, geo: Arc<dyn GeoLocator>) -> Self {
        let store = Arc::new(MemoryStore::default());
        let state = AppState::new(config, store.clone(), store.clone(), geo);
        let peer: SocketAddr = PEER_ADDR.parse().expect("valid peer address");
        let router = routes::create_router(state).layer(MockConnectInfo(peer));
        Self { router, store }
    }

    #[allow(dead_code)]
    pub fn store(&self) -> Arc<MemoryStore> {
        self.store.clone()
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        headers: &[(&str, &str)],
    ) -> Result<hyper::Response<Body>> {
        let body = serde_json::to_vec(payload)?;
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header("content-type", "application/json");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(Body::from(body))?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    pub async fn get(&self, path: &str, headers: &[(&str, &str)]) -> Result<hyper::Response<Body>> {
        let mut builder = Request::builder().method(Method::GET).uri(path);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(Body::empty())?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }
}

pub async fn body_to_vec(body: Body) -> Result<Vec<u8>> {
    let collected = body
        .collect()
        .await
        .map_err(|err| anyhow!("failed to read response body: {err}"))?;
    Ok(collected.to_bytes().to_vec())
}

pub async fn body_json<T: DeserializeOwned>(response: hyper::Response<Body>) -> Result<T> {
    let body = body_to_vec(response.into_body()).await?;
    serde_json::from_slice(&body).map_err(|err| {
        anyhow!(
            "unexpected response body {}: {err}",
            String::from_utf8_lossy(&body)
        )
    })
}
