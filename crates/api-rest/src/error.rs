//! Mapping of core errors onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use medico_core::{CaseError, ErrorKind};

use crate::dto::ErrorRes;

#[derive(Debug)]
pub enum ApiError {
    Case(CaseError),
    /// Malformed request data caught before it reaches the core (ids, headers).
    BadRequest { field: String, reason: String },
    Unauthorized(&'static str),
}

impl From<CaseError> for ApiError {
    fn from(err: CaseError) -> Self {
        ApiError::Case(err)
    }
}

impl ApiError {
    pub fn bad_request(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ApiError::BadRequest {
            field: field.into(),
            reason: reason.into(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Case(err) => status_for(err.kind()),
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

pub(crate) fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation | ErrorKind::InvalidStatus => StatusCode::BAD_REQUEST,
        ErrorKind::InvalidTransition | ErrorKind::NotDeletable => StatusCode::CONFLICT,
        ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Case(err) if err.kind() == ErrorKind::Storage => {
                tracing::error!("storage failure: {}", err);
                ErrorRes {
                    error: "internal storage error".into(),
                    kind: ErrorKind::Storage.as_str().into(),
                    field: None,
                }
            }
            ApiError::Case(err) => ErrorRes {
                error: err.to_string(),
                kind: err.kind().as_str().into(),
                field: err.field().map(str::to_string),
            },
            ApiError::BadRequest { field, reason } => ErrorRes {
                error: format!("invalid {field}: {reason}"),
                kind: ErrorKind::Validation.as_str().into(),
                field: Some(field),
            },
            ApiError::Unauthorized(reason) => ErrorRes {
                error: reason.into(),
                kind: "unauthorized".into(),
                field: None,
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_a_distinct_class_of_status() {
        assert_eq!(status_for(ErrorKind::Validation), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::InvalidStatus), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::InvalidTransition), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorKind::NotDeletable), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorKind::PermissionDenied), StatusCode::FORBIDDEN);
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(ErrorKind::Storage),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validation_errors_carry_their_field() {
        let response = ApiError::Case(CaseError::validation("patient_name", "must not be empty"))
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
