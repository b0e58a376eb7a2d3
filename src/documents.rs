//! Closed vocabularies shared by consent logs and document snapshots.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    TicketTerms,
    RefundPolicy,
    PrivacyPolicy,
}

impl DocumentType {
    pub const ALL: [DocumentType; 3] = [
        DocumentType::TicketTerms,
        DocumentType::RefundPolicy,
        DocumentType::PrivacyPolicy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentType::TicketTerms => "ticket_terms",
            DocumentType::RefundPolicy => "refund_policy",
            DocumentType::PrivacyPolicy => "privacy_policy",
        }
    }

    pub fn allowed() -> Vec<&'static str> {
        Self::ALL.iter().map(|ty| ty.as_str()).collect()
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = UnknownValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.as_str() == value)
            .ok_or_else(|| UnknownValue(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ru,
    En,
    He,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Ru, Language::En, Language::He];

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Ru => "ru",
            Language::En => "en",
            Language::He => "he",
        }
    }

    pub fn allowed() -> Vec<&'static str> {
        Self::ALL.iter().map(|lang| lang.as_str()).collect()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = UnknownValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|lang| lang.as_str() == value)
            .ok_or_else(|| UnknownValue(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value `{0}`")]
pub struct UnknownValue(pub String);

/// One value per document type. Serializes as
/// `{"ticket_terms": .., "refund_policy": .., "privacy_policy": ..}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerDocumentType<T> {
    pub ticket_terms: T,
    pub refund_policy: T,
    pub privacy_policy: T,
}

impl<T> PerDocumentType<T> {
    pub fn get(&self, document_type: DocumentType) -> &T {
        match document_type {
            DocumentType::TicketTerms => &self.ticket_terms,
            DocumentType::RefundPolicy => &self.refund_policy,
            DocumentType::PrivacyPolicy => &self.privacy_policy,
        }
    }

    pub fn get_mut(&mut self, document_type: DocumentType) -> &mut T {
        match document_type {
            DocumentType::TicketTerms => &mut self.ticket_terms,
            DocumentType::RefundPolicy => &mut self.refund_policy,
            DocumentType::PrivacyPolicy => &mut self.privacy_policy,
        }
    }

    pub fn values(&self) -> [&T; 3] {
        [&self.ticket_terms, &self.refund_policy, &self.privacy_policy]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_types_round_trip_through_strings() {
        for ty in DocumentType::ALL {
            assert_eq!(ty.as_str().parse::<DocumentType>().unwrap(), ty);
        }
        assert!("terms".parse::<DocumentType>().is_err());
        assert!("TICKET_TERMS".parse::<DocumentType>().is_err());
    }

    #[test]
    fn languages_are_closed() {
        assert_eq!(Language::allowed(), vec!["ru", "en", "he"]);
        assert_eq!("he".parse::<Language>().unwrap(), Language::He);
        assert!("de".parse::<Language>().is_err());
    }

    #[test]
    fn per_document_type_serializes_with_type_keys() {
        let mut counts = PerDocumentType::<i64>::default();
        *counts.get_mut(DocumentType::RefundPolicy) += 2;
        let value = serde_json::to_value(counts).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"ticket_terms": 0, "refund_policy": 2, "privacy_policy": 0})
        );
    }
}
