use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::documents::{DocumentType, Language, PerDocumentType};
use crate::models::{ConsentLog, DocumentSnapshot, NewConsentLog, NewDocumentSnapshot};

pub mod postgres;

pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(diesel::result::Error),
    #[error("database pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
    #[error("unique constraint violated: {0}")]
    Conflict(String),
    #[error("store task failed: {0}")]
    Task(String),
}

impl From<diesel::result::Error> for StoreError {
    fn from(value: diesel::result::Error) -> Self {
        match value {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                info,
            ) => StoreError::Conflict(info.message().to_string()),
            other => StoreError::Database(other),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsentStats {
    pub total_consents: i64,
    pub unique_sessions: i64,
    pub by_document_type: PerDocumentType<i64>,
}

/// Append-only log of consent events.
#[async_trait]
pub trait ConsentLogStore: Send + Sync + 'static {
    async fn append(&self, entry: NewConsentLog) -> StoreResult<ConsentLog>;

    /// Every row of the session ordered by `consent_timestamp`, then insertion order.
    async fn list_for_session(&self, session_id: Uuid) -> StoreResult<Vec<ConsentLog>>;

    /// Counts over rows persisted at or after `since`, or over every row.
    async fn stats(&self, since: Option<DateTime<Utc>>) -> StoreResult<ConsentStats>;
}

/// Versioned document bodies with one active row per (document_type, language).
#[async_trait]
pub trait SnapshotStore: Send + Sync + 'static {
    /// Deactivates the current active snapshot for the pair and inserts `snapshot`
    /// as active, atomically. On failure nothing changes.
    async fn replace_active(&self, snapshot: NewDocumentSnapshot) -> StoreResult<DocumentSnapshot>;

    async fn find_active(
        &self,
        document_type: DocumentType,
        language: Language,
    ) -> StoreResult<Option<DocumentSnapshot>>;

    /// All versions for the pair, newest first.
    async fn history(
        &self,
        document_type: DocumentType,
        language: Language,
    ) -> StoreResult<Vec<DocumentSnapshot>>;
}
