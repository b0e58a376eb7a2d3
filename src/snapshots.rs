//! Archive of legal document texts, content-addressed by SHA-256, with one
//! active version per (document_type, language).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::documents::{DocumentType, Language};
use crate::error::{parse_submission, AppError, AppResult, ValidationError};
use crate::models::{DocumentSnapshot, NewDocumentSnapshot};
use crate::store::SnapshotStore;

pub const DEFAULT_CREATED_BY: &str = "api";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnapshotSubmission {
    pub document_type: Option<String>,
    pub version: Option<String>,
    pub full_text: Option<String>,
    pub language: Option<String>,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSnapshot {
    pub document_type: DocumentType,
    pub version: String,
    pub full_text: String,
    pub language: Language,
    pub created_by: String,
}

impl SnapshotSubmission {
    pub const REQUIRED_FIELDS: [&'static str; 4] =
        ["document_type", "version", "full_text", "language"];

    pub fn from_json(body: Value) -> Result<Self, ValidationError> {
        parse_submission(body, &Self::REQUIRED_FIELDS)
    }

    pub fn validate(self) -> Result<ValidSnapshot, ValidationError> {
        let mut missing = Vec::new();
        if self.document_type.is_none() {
            missing.push("document_type");
        }
        if self.version.is_none() {
            missing.push("version");
        }
        if self.full_text.is_none() {
            missing.push("full_text");
        }
        if self.language.is_none() {
            missing.push("language");
        }

        let (Some(document_type), Some(version), Some(full_text), Some(language)) =
            (self.document_type, self.version, self.full_text, self.language)
        else {
            return Err(ValidationError::MissingFields(missing));
        };

        Ok(ValidSnapshot {
            document_type: parse_document_type(&document_type)?,
            version,
            full_text,
            language: parse_language(&language)?,
            created_by: self
                .created_by
                .unwrap_or_else(|| DEFAULT_CREATED_BY.to_string()),
        })
    }
}

pub fn parse_document_type(raw: &str) -> Result<DocumentType, ValidationError> {
    raw.parse().map_err(|_| ValidationError::InvalidDocumentType)
}

pub fn parse_language(raw: &str) -> Result<Language, ValidationError> {
    raw.parse().map_err(|_| ValidationError::InvalidLanguage)
}

/// Lowercase hex SHA-256 of the UTF-8 text.
pub fn content_hash(full_text: &str) -> String {
    hex::encode(Sha256::digest(full_text.as_bytes()))
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotView {
    pub snapshot_id: Uuid,
    pub document_type: String,
    pub version: String,
    pub content_hash: String,
    pub full_text: String,
    pub language: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
}

impl From<DocumentSnapshot> for SnapshotView {
    fn from(snapshot: DocumentSnapshot) -> Self {
        Self {
            snapshot_id: snapshot.snapshot_id,
            document_type: snapshot.document_type,
            version: snapshot.version,
            content_hash: snapshot.content_hash,
            full_text: snapshot.full_text,
            language: snapshot.language,
            is_active: snapshot.is_active,
            created_at: snapshot.created_at,
            created_by: snapshot.created_by,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotSummary {
    pub snapshot_id: Uuid,
    pub version: String,
    pub content_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
}

impl From<DocumentSnapshot> for SnapshotSummary {
    fn from(snapshot: DocumentSnapshot) -> Self {
        Self {
            snapshot_id: snapshot.snapshot_id,
            version: snapshot.version,
            content_hash: snapshot.content_hash,
            is_active: snapshot.is_active,
            created_at: snapshot.created_at,
            created_by: snapshot.created_by,
        }
    }
}

pub fn build_snapshot(snapshot: ValidSnapshot) -> NewDocumentSnapshot {
    NewDocumentSnapshot {
        snapshot_id: Uuid::new_v4(),
        document_type: snapshot.document_type.as_str().to_string(),
        version: snapshot.version,
        content_hash: content_hash(&snapshot.full_text),
        full_text: snapshot.full_text,
        language: snapshot.language.as_str().to_string(),
        is_active: true,
        created_by: Some(snapshot.created_by),
    }
}

/// Stores a new version and makes it the active one for its pair.
pub async fn create_snapshot(
    store: &dyn SnapshotStore,
    submission: SnapshotSubmission,
) -> AppResult<DocumentSnapshot> {
    let snapshot = build_snapshot(submission.validate()?);
    let row = store.replace_active(snapshot).await?;

    tracing::info!(
        snapshot_id = %row.snapshot_id,
        document_type = %row.document_type,
        language = %row.language,
        version = %row.version,
        content_hash = %row.content_hash,
        "document snapshot saved"
    );
    Ok(row)
}

pub async fn active_snapshot(
    store: &dyn SnapshotStore,
    document_type: &str,
    language: &str,
) -> AppResult<DocumentSnapshot> {
    let document_type = parse_document_type(document_type)?;
    let language = parse_language(language)?;
    store
        .find_active(document_type, language)
        .await?
        .ok_or_else(|| {
            AppError::not_found(format!("no active snapshot for {document_type}/{language}"))
        })
}

pub async fn snapshot_history(
    store: &dyn SnapshotStore,
    document_type: &str,
    language: &str,
) -> AppResult<Vec<DocumentSnapshot>> {
    let document_type = parse_document_type(document_type)?;
    let language = parse_language(language)?;
    Ok(store.history(document_type, language).await?)
}
