use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Nullable, Text, Timestamptz};
use uuid::Uuid;

use super::{ConsentLogStore, ConsentStats, SnapshotStore, StoreError, StoreResult};
use crate::db::PgPool;
use crate::documents::{DocumentType, Language};
use crate::models::{ConsentLog, DocumentSnapshot, NewConsentLog, NewDocumentSnapshot};
use crate::schema::{consent_logs, document_snapshots};

/// Diesel-backed implementation of both store traits.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn with_conn<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            f(&mut conn)
        })
        .await
        .map_err(|err| StoreError::Task(err.to_string()))?
    }
}

#[async_trait]
impl ConsentLogStore for PgStore {
    async fn append(&self, entry: NewConsentLog) -> StoreResult<ConsentLog> {
        self.with_conn(move |conn| {
            let row = diesel::insert_into(consent_logs::table)
                .values(&entry)
                .returning(ConsentLog::as_returning())
                .get_result(conn)?;
            Ok(row)
        })
        .await
    }

    async fn list_for_session(&self, session_id: Uuid) -> StoreResult<Vec<ConsentLog>> {
        self.with_conn(move |conn| {
            let rows = consent_logs::table
                .filter(consent_logs::session_id.eq(session_id))
                .order((
                    consent_logs::consent_timestamp.asc(),
                    consent_logs::sequence_number.asc(),
                ))
                .select(ConsentLog::as_select())
                .load(conn)?;
            Ok(rows)
        })
        .await
    }

    async fn stats(&self, since: Option<DateTime<Utc>>) -> StoreResult<ConsentStats> {
        self.with_conn(move |conn| {
            let counts: StatsRow = diesel::sql_query(STATS_QUERY)
                .bind::<Nullable<Timestamptz>, _>(since)
                .get_result(conn)?;
            let mut stats = ConsentStats {
                total_consents: counts.total_consents,
                unique_sessions: counts.unique_sessions,
                ..ConsentStats::default()
            };
            *stats.by_document_type.get_mut(DocumentType::TicketTerms) = counts.ticket_terms;
            *stats.by_document_type.get_mut(DocumentType::RefundPolicy) = counts.refund_policy;
            *stats.by_document_type.get_mut(DocumentType::PrivacyPolicy) = counts.privacy_policy;
            Ok(stats)
        })
        .await
    }
}

/// One snapshot of every counter, windowed on the client-asserted consent time.
const STATS_QUERY: &str = "SELECT \
    COUNT(*) AS total_consents, \
    COUNT(DISTINCT session_id) AS unique_sessions, \
    COUNT(*) FILTER (WHERE document_type = 'ticket_terms') AS ticket_terms, \
    COUNT(*) FILTER (WHERE document_type = 'refund_policy') AS refund_policy, \
    COUNT(*) FILTER (WHERE document_type = 'privacy_policy') AS privacy_policy \
    FROM consent_logs \
    WHERE $1::timestamptz IS NULL OR consent_timestamp >= $1";

#[derive(QueryableByName)]
struct StatsRow {
    #[diesel(sql_type = BigInt)]
    total_consents: i64,
    #[diesel(sql_type = BigInt)]
    unique_sessions: i64,
    #[diesel(sql_type = BigInt)]
    ticket_terms: i64,
    #[diesel(sql_type = BigInt)]
    refund_policy: i64,
    #[diesel(sql_type = BigInt)]
    privacy_policy: i64,
}

#[async_trait]
impl SnapshotStore for PgStore {
    async fn replace_active(&self, snapshot: NewDocumentSnapshot) -> StoreResult<DocumentSnapshot> {
        self.with_conn(move |conn| {
            conn.transaction::<DocumentSnapshot, StoreError, _>(|conn| {
                // Serializes concurrent replacements of the same pair until commit.
                let lock_key = format!("{}:{}", snapshot.document_type, snapshot.language);
                diesel::sql_query("SELECT pg_advisory_xact_lock(hashtext($1))")
                    .bind::<Text, _>(lock_key)
                    .execute(conn)?;

                let deactivated = diesel::update(
                    document_snapshots::table
                        .filter(document_snapshots::document_type.eq(&snapshot.document_type))
                        .filter(document_snapshots::language.eq(&snapshot.language))
                        .filter(document_snapshots::is_active.eq(true)),
                )
                .set(document_snapshots::is_active.eq(false))
                .execute(conn)?;

                let row = diesel::insert_into(document_snapshots::table)
                    .values(&snapshot)
                    .returning(DocumentSnapshot::as_returning())
                    .get_result(conn)?;

                tracing::debug!(
                    snapshot_id = %row.snapshot_id,
                    deactivated,
                    "replaced active document snapshot"
                );
                Ok(row)
            })
        })
        .await
    }

    async fn find_active(
        &self,
        document_type: DocumentType,
        language: Language,
    ) -> StoreResult<Option<DocumentSnapshot>> {
        self.with_conn(move |conn| {
            let row = document_snapshots::table
                .filter(document_snapshots::document_type.eq(document_type.as_str()))
                .filter(document_snapshots::language.eq(language.as_str()))
                .filter(document_snapshots::is_active.eq(true))
                .order(document_snapshots::created_at.desc())
                .select(DocumentSnapshot::as_select())
                .first(conn)
                .optional()?;
            Ok(row)
        })
        .await
    }

    async fn history(
        &self,
        document_type: DocumentType,
        language: Language,
    ) -> StoreResult<Vec<DocumentSnapshot>> {
        self.with_conn(move |conn| {
            let rows = document_snapshots::table
                .filter(document_snapshots::document_type.eq(document_type.as_str()))
                .filter(document_snapshots::language.eq(language.as_str()))
                .order(document_snapshots::created_at.desc())
                .select(DocumentSnapshot::as_select())
                .load(conn)?;
            Ok(rows)
        })
        .await
    }
}
