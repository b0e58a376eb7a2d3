use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::*;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = consent_logs)]
#[diesel(primary_key(consent_log_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ConsentLog {
    pub consent_log_id: Uuid,
    pub purchase_id: Option<Uuid>,
    pub session_id: Uuid,
    pub document_type: String,
    pub document_version: String,
    pub document_hash: String,
    pub consent_given: bool,
    pub consent_text: Option<String>,
    pub consent_timestamp: DateTime<Utc>,
    pub client_ip: Option<String>,
    pub client_ip_forwarded: Option<String>,
    pub user_agent: Option<String>,
    pub ip_country: Option<String>,
    pub referrer_url: Option<String>,
    pub page_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub sequence_number: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = consent_logs)]
pub struct NewConsentLog {
    pub consent_log_id: Uuid,
    pub purchase_id: Option<Uuid>,
    pub session_id: Uuid,
    pub document_type: String,
    pub document_version: String,
    pub document_hash: String,
    pub consent_given: bool,
    pub consent_text: Option<String>,
    pub consent_timestamp: DateTime<Utc>,
    pub client_ip: Option<String>,
    pub client_ip_forwarded: Option<String>,
    pub user_agent: Option<String>,
    pub ip_country: Option<String>,
    pub referrer_url: Option<String>,
    pub page_url: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = document_snapshots)]
#[diesel(primary_key(snapshot_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DocumentSnapshot {
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

#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = document_snapshots)]
pub struct NewDocumentSnapshot {
    pub snapshot_id: Uuid,
    pub document_type: String,
    pub version: String,
    pub content_hash: String,
    pub full_text: String,
    pub language: String,
    pub is_active: bool,
    pub created_by: Option<String>,
}
