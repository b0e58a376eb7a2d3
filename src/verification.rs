use serde::Serialize;
use uuid::Uuid;

use crate::documents::{DocumentType, PerDocumentType};
use crate::error::AppResult;
use crate::models::ConsentLog;
use crate::store::ConsentLogStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsentVerification {
    pub session_id: Uuid,
    pub all_consents_given: bool,
    pub consents: PerDocumentType<bool>,
    pub total_logged: usize,
}

/// Folds a session's log into per-type status. A given consent is sticky:
/// a later `consent_given = false` row does not revoke it.
pub fn fold_consents(session_id: Uuid, logs: &[ConsentLog]) -> ConsentVerification {
    let mut consents = PerDocumentType::<bool>::default();
    for log in logs.iter().filter(|log| log.consent_given) {
        match log.document_type.parse::<DocumentType>() {
            Ok(document_type) => *consents.get_mut(document_type) = true,
            Err(err) => tracing::warn!(
                consent_log_id = %log.consent_log_id,
                error = %err,
                "ignoring consent row with unknown document type"
            ),
        }
    }

    let all_consents_given = consents.values().into_iter().all(|given| *given);
    ConsentVerification {
        session_id,
        all_consents_given,
        consents,
        total_logged: logs.len(),
    }
}

pub async fn verify_session(
    store: &dyn ConsentLogStore,
    session_id: Uuid,
) -> AppResult<ConsentVerification> {
    let logs = store.list_for_session(session_id).await?;
    Ok(fold_consents(session_id, &logs))
}
