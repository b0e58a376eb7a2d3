use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderName, HeaderValue},
};
use axum_extra::headers::{self, Header};
use axum_extra::TypedHeader;

use crate::{error::AppError, state::AppState};

pub static X_API_KEY: HeaderName = HeaderName::from_static("x-api-key");

/// Value of the `X-API-Key` request header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKey(pub String);

impl Header for ApiKey {
    fn name() -> &'static HeaderName {
        &X_API_KEY
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, headers::Error>
    where
        I: Iterator<Item = &'i HeaderValue>,
    {
        let value = values.next().ok_or_else(headers::Error::invalid)?;
        let key = value.to_str().map_err(|_| headers::Error::invalid())?;
        Ok(ApiKey(key.to_string()))
    }

    fn encode<E: Extend<HeaderValue>>(&self, values: &mut E) {
        if let Ok(value) = HeaderValue::from_str(&self.0) {
            values.extend(std::iter::once(value));
        }
    }
}

/// Guard for administrative routes. Rejects every request when no admin key is configured.
#[derive(Debug, Clone, Copy)]
pub struct AdminAccess;

#[async_trait]
impl FromRequestParts<AppState> for AdminAccess {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(ApiKey(supplied)) =
            TypedHeader::<ApiKey>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::unauthorized())?;

        let expected = state
            .config
            .admin_key
            .as_deref()
            .ok_or_else(AppError::unauthorized)?;

        if !keys_match(supplied.as_bytes(), expected.as_bytes()) {
            tracing::warn!("rejected request with invalid admin key");
            return Err(AppError::unauthorized());
        }

        Ok(AdminAccess)
    }
}

fn keys_match(supplied: &[u8], expected: &[u8]) -> bool {
    if supplied.len() != expected.len() {
        return false;
    }
    supplied
        .iter()
        .zip(expected)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
