//! # ApiError
//!
//! The single error type returned by handlers and extractors. Each variant
//! maps to exactly one HTTP status; `Internal` details are logged and never
//! sent to the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domains::DomainError;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

use crate::context::request_id;
use crate::envelope::{camel_case, Envelope, FieldError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("validation failed")]
    Fields(Vec<FieldError>),

    #[error("{0}")]
    BadRequest(String),

    #[error("route not found")]
    RouteNotFound,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Domain(e) => match e {
                DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
                DomainError::Validation(_) => StatusCode::BAD_REQUEST,
                DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
                DomainError::Conflict(_) => StatusCode::CONFLICT,
                DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Fields(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::RouteNotFound => StatusCode::NOT_FOUND,
        }
    }

    /// Client-facing message, without the variant prefixes `DomainError`
    /// uses in its `Display`.
    fn public_message(&self) -> String {
        match self {
            ApiError::Domain(e) => match e {
                DomainError::NotFound { .. } => e.to_string(),
                DomainError::Validation(m)
                | DomainError::Unauthorized(m)
                | DomainError::Forbidden(m)
                | DomainError::Conflict(m) => m.clone(),
                DomainError::Internal(_) => "internal server error".into(),
            },
            other => other.to_string(),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                let field = camel_case(&field);
                errs.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{field} is invalid ({})", e.code));
                    FieldError::new(field.clone(), message)
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.message.cmp(&b.message)));
        ApiError::Fields(fields)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let ApiError::Domain(DomainError::Internal(detail)) = &self {
            error!(%detail, request_id = ?request_id(), "request failed");
        }
        let errors = match &self {
            ApiError::Fields(f) => f.clone(),
            _ => Vec::new(),
        };
        let body = Envelope::error(status.as_u16(), self.public_message(), errors)
            .with_request_id(request_id());
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Signup {
        #[validate(length(min = 3, message = "too short"))]
        display_name: String,
        #[validate(email(message = "not an email"))]
        email: String,
    }

    #[test]
    fn domain_errors_map_to_one_status_each() {
        let cases = [
            (DomainError::not_found("movie", "x"), StatusCode::NOT_FOUND),
            (DomainError::validation("bad"), StatusCode::BAD_REQUEST),
            (DomainError::Unauthorized("no".into()), StatusCode::UNAUTHORIZED),
            (DomainError::forbidden("no"), StatusCode::FORBIDDEN),
            (DomainError::conflict("dup"), StatusCode::CONFLICT),
            (DomainError::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn internal_details_are_redacted() {
        let err = ApiError::from(DomainError::internal("connection refused on 10.0.0.3"));
        assert_eq!(err.public_message(), "internal server error");
    }

    #[test]
    fn conflict_message_has_no_prefix() {
        let err = ApiError::from(DomainError::conflict("already in your favorites"));
        assert_eq!(err.public_message(), "already in your favorites");
    }

    #[test]
    fn validation_errors_become_camel_cased_fields() {
        let signup = Signup {
            display_name: "ab".into(),
            email: "nope".into(),
        };
        let ApiError::Fields(fields) = ApiError::from(signup.validate().unwrap_err()) else {
            panic!("expected field errors");
        };
        assert_eq!(
            fields,
            vec![
                FieldError::new("displayName", "too short"),
                FieldError::new("email", "not an email"),
            ]
        );
    }
}
