//! Consent ingestion: required-field checks, client metadata capture and
//! persistence of one append-only log row per submission.

use std::net::SocketAddr;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::documents::DocumentType;
use crate::error::{parse_submission, AppResult, ValidationError};
use crate::geo::GeoLocator;
use crate::models::{ConsentLog, NewConsentLog};
use crate::store::ConsentLogStore;

pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Consent event as submitted by the purchase page. Every field is optional
/// here so that missing ones can be reported together.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsentSubmission {
    pub session_id: Option<Uuid>,
    pub document_type: Option<String>,
    pub document_version: Option<String>,
    pub document_hash: Option<String>,
    pub consent_given: Option<bool>,
    pub consent_timestamp: Option<DateTime<Utc>>,
    pub consent_text: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub page_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidConsent {
    pub session_id: Uuid,
    pub document_type: DocumentType,
    pub document_version: String,
    pub document_hash: String,
    pub consent_given: bool,
    pub consent_timestamp: DateTime<Utc>,
    pub consent_text: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub page_url: Option<String>,
}

impl ConsentSubmission {
    pub const REQUIRED_FIELDS: [&'static str; 6] = [
        "session_id",
        "document_type",
        "document_version",
        "document_hash",
        "consent_given",
        "consent_timestamp",
    ];

    /// Parses a raw JSON body, listing missing fields before typed values are checked.
    pub fn from_json(body: Value) -> Result<Self, ValidationError> {
        parse_submission(body, &Self::REQUIRED_FIELDS)
    }

    pub fn validate(self) -> Result<ValidConsent, ValidationError> {
        let mut missing = Vec::new();
        if self.session_id.is_none() {
            missing.push("session_id");
        }
        if self.document_type.is_none() {
            missing.push("document_type");
        }
        if self.document_version.is_none() {
            missing.push("document_version");
        }
        if self.document_hash.is_none() {
            missing.push("document_hash");
        }
        if self.consent_given.is_none() {
            missing.push("consent_given");
        }
        if self.consent_timestamp.is_none() {
            missing.push("consent_timestamp");
        }

        match (
            self.session_id,
            self.document_type,
            self.document_version,
            self.document_hash,
            self.consent_given,
            self.consent_timestamp,
        ) {
            (
                Some(session_id),
                Some(document_type),
                Some(document_version),
                Some(document_hash),
                Some(consent_given),
                Some(consent_timestamp),
            ) => {
                let document_type = document_type
                    .parse::<DocumentType>()
                    .map_err(|_| ValidationError::InvalidDocumentType)?;
                Ok(ValidConsent {
                    session_id,
                    document_type,
                    document_version,
                    document_hash,
                    consent_given,
                    consent_timestamp,
                    consent_text: self.consent_text,
                    user_agent: self.user_agent,
                    referrer: self.referrer,
                    page_url: self.page_url,
                })
            }
            _ => Err(ValidationError::MissingFields(missing)),
        }
    }
}

/// Request-level facts about the caller, captured by the HTTP layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientMetadata {
    pub client_ip: Option<String>,
    pub forwarded_for: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientMetadata {
    pub fn new(
        forwarded_for: Option<String>,
        remote_addr: Option<SocketAddr>,
        user_agent: Option<String>,
    ) -> Self {
        let client_ip = client_ip(forwarded_for.as_deref(), remote_addr);
        Self {
            client_ip,
            forwarded_for,
            user_agent,
        }
    }
}

/// First hop of an `X-Forwarded-For` chain, or the socket peer when the
/// header is absent or blank.
pub fn client_ip(forwarded_for: Option<&str>, remote_addr: Option<SocketAddr>) -> Option<String> {
    forwarded_for
        .and_then(|chain| chain.split(',').next())
        .map(str::trim)
        .filter(|first| !first.is_empty())
        .map(str::to_string)
        .or_else(|| remote_addr.map(|addr| addr.ip().to_string()))
}

pub fn default_consent_text(document_type: DocumentType) -> String {
    format!("I agree with {}", document_type.as_str())
}

pub fn build_consent_log(
    consent: ValidConsent,
    client: ClientMetadata,
    ip_country: Option<String>,
) -> NewConsentLog {
    let consent_text = consent
        .consent_text
        .unwrap_or_else(|| default_consent_text(consent.document_type));
    NewConsentLog {
        consent_log_id: Uuid::new_v4(),
        purchase_id: None,
        session_id: consent.session_id,
        document_type: consent.document_type.as_str().to_string(),
        document_version: consent.document_version,
        document_hash: consent.document_hash,
        consent_given: consent.consent_given,
        consent_text: Some(consent_text),
        consent_timestamp: consent.consent_timestamp,
        client_ip: client.client_ip,
        client_ip_forwarded: client.forwarded_for,
        user_agent: consent.user_agent.or(client.user_agent),
        ip_country,
        referrer_url: consent.referrer,
        page_url: consent.page_url,
    }
}

/// Validates and persists one consent event.
pub async fn record_consent(
    store: &dyn ConsentLogStore,
    geo: &dyn GeoLocator,
    submission: ConsentSubmission,
    client: ClientMetadata,
) -> AppResult<ConsentLog> {
    let consent = submission.validate()?;
    let ip_country = match client.client_ip.as_deref() {
        Some(ip) => geo.country_for(ip).await,
        None => None,
    };
    let entry = build_consent_log(consent, client, ip_country);
    let row = store.append(entry).await?;

    tracing::info!(
        consent_log_id = %row.consent_log_id,
        document_type = %row.document_type,
        session_id = %row.session_id,
        consent_given = row.consent_given,
        "consent logged"
    );
    Ok(row)
}
