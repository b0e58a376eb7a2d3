use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::fmt::Display;
use thiserror::Error;

use crate::documents::{DocumentType, Language};
use crate::store::StoreError;

pub type AppResult<T> = Result<T, AppError>;

/// Request problems the caller can fix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required fields")]
    MissingFields(Vec<&'static str>),
    #[error("Invalid document_type")]
    InvalidDocumentType,
    #[error("Invalid language")]
    InvalidLanguage,
    #[error("invalid request body: {0}")]
    MalformedBody(String),
}

/// Reports absent or null `required` keys before any value is interpreted,
/// then deserializes the body.
pub fn parse_submission<T: DeserializeOwned>(
    body: Value,
    required: &[&'static str],
) -> Result<T, ValidationError> {
    let Some(object) = body.as_object() else {
        return Err(ValidationError::MalformedBody(
            "expected a JSON object".to_string(),
        ));
    };
    let missing: Vec<&'static str> = required
        .iter()
        .copied()
        .filter(|field| object.get(*field).map_or(true, Value::is_null))
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingFields(missing));
    }
    serde_json::from_value(body).map_err(|err| ValidationError::MalformedBody(err.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ErrorDetail {
    Missing(Vec<String>),
    Allowed(Vec<String>),
}

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    detail: Option<ErrorDetail>,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            detail: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// Logs the underlying error and hides it from the response body.
    pub fn internal<E: Display>(error: E) -> Self {
        tracing::error!(error = %error, "internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status;
        let (missing, allowed) = match self.detail {
            Some(ErrorDetail::Missing(fields)) => (Some(fields), None),
            Some(ErrorDetail::Allowed(values)) => (None, Some(values)),
            None => (None, None),
        };
        let body = Json(ErrorResponse {
            error: self.message,
            missing,
            allowed,
        });
        (status, body).into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    missing: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    allowed: Option<Vec<String>>,
}

fn owned(values: Vec<&'static str>) -> Vec<String> {
    values.into_iter().map(str::to_string).collect()
}

impl From<ValidationError> for AppError {
    fn from(value: ValidationError) -> Self {
        let message = value.to_string();
        let detail = match value {
            ValidationError::MissingFields(fields) => Some(ErrorDetail::Missing(owned(fields))),
            ValidationError::InvalidDocumentType => {
                Some(ErrorDetail::Allowed(owned(DocumentType::allowed())))
            }
            ValidationError::InvalidLanguage => {
                Some(ErrorDetail::Allowed(owned(Language::allowed())))
            }
            ValidationError::MalformedBody(_) => None,
        };
        Self {
            status: StatusCode::BAD_REQUEST,
            message,
            detail,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(value: JsonRejection) -> Self {
        ValidationError::MalformedBody(value.body_text()).into()
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict(detail) => {
                tracing::warn!(detail = %detail, "store rejected duplicate row");
                AppError::conflict(
                    "a snapshot with this document_type, language and version already exists",
                )
            }
            other => AppError::internal(other),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        AppError::internal(value)
    }
}
