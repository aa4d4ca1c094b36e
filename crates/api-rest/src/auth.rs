//! Request identity.
//!
//! Every case endpoint acts on behalf of the physician named by the `x-user-id` header. When the
//! server is configured with `API_KEY`, requests must also present it in `x-api-key`.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use medico_core::UserId;

use crate::dto::parse_user_id;
use crate::error::ApiError;
use crate::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const API_KEY_HEADER: &str = "x-api-key";

/// Validates the provided API key against the configured one.
///
/// No configured key means the API is open.
pub fn validate_api_key(expected: Option<&str>, provided: Option<&str>) -> Result<(), ApiError> {
    match (expected, provided) {
        (None, _) => Ok(()),
        (Some(expected), Some(provided)) if provided == expected => Ok(()),
        (Some(_), Some(_)) => Err(ApiError::Unauthorized("Invalid API key")),
        (Some(_), None) => Err(ApiError::Unauthorized("Missing API key")),
    }
}

fn check_api_key(parts: &Parts, state: &AppState) -> Result<(), ApiError> {
    let provided_key = parts
        .headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());
    validate_api_key(state.api_key.as_deref(), provided_key)
}

/// Passes when the request carries the configured API key. Used by endpoints that do not act
/// on behalf of a particular physician.
#[derive(Clone, Copy, Debug)]
pub struct ApiKeyGuard;

#[async_trait]
impl FromRequestParts<AppState> for ApiKeyGuard {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        check_api_key(parts, state).map(|_| ApiKeyGuard)
    }
}

/// The physician making the request.
#[derive(Clone, Copy, Debug)]
pub struct RequestUser(pub UserId);

#[async_trait]
impl FromRequestParts<AppState> for RequestUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        check_api_key(parts, state)?;

        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::bad_request(USER_ID_HEADER, "header is required"))?
            .to_str()
            .map_err(|_| ApiError::bad_request(USER_ID_HEADER, "header is not valid text"))?;

        parse_user_id(USER_ID_HEADER, raw).map(RequestUser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_api_accepts_anything() {
        assert!(validate_api_key(None, None).is_ok());
        assert!(validate_api_key(None, Some("whatever")).is_ok());
    }

    #[test]
    fn configured_key_must_match() {
        assert!(validate_api_key(Some("secret"), Some("secret")).is_ok());
        assert!(matches!(
            validate_api_key(Some("secret"), Some("guess")),
            Err(ApiError::Unauthorized("Invalid API key"))
        ));
        assert!(matches!(
            validate_api_key(Some("secret"), None),
            Err(ApiError::Unauthorized("Missing API key"))
        ));
    }
}
