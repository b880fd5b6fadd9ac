//! Caller-facing error taxonomy shared across crates.

use thiserror::Error;

use crate::protocol::ErrorResponse;

/// Generic message used for every internal failure.
///
/// Cipher, storage and blob-store faults all collapse into this one string so
/// that callers cannot distinguish a forged token from a dead database.
pub const INTERNAL_MESSAGE: &str = "internal error";

/// Top-level service error type.
///
/// Variants map to HTTP status codes returned to callers:
/// - [`ServiceError::InvalidArgument`] → 400
/// - [`ServiceError::Unauthenticated`] → 401
/// - [`ServiceError::PermissionDenied`] → 403
/// - [`ServiceError::AlreadyExists`] → 409
/// - [`ServiceError::Internal`] → 500
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or missing input, or a record outside the caller's scope.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Missing, malformed, forged or expired token.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Valid identity whose role is not allowed to call the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The resource being created already exists (duplicate login).
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Cipher, backend, blob store or unexpected runtime fault.
    ///
    /// The detail is never sent to callers; see [`ServiceError::to_response`].
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Returns the HTTP status code that should be sent for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::InvalidArgument(_) => 400,
            ServiceError::Unauthenticated(_) => 401,
            ServiceError::PermissionDenied(_) => 403,
            ServiceError::AlreadyExists(_) => 409,
            ServiceError::Internal(_) => 500,
        }
    }

    /// Short machine-readable code placed in [`ErrorResponse::code`].
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::InvalidArgument(_) => "invalid_argument",
            ServiceError::Unauthenticated(_) => "unauthenticated",
            ServiceError::PermissionDenied(_) => "permission_denied",
            ServiceError::AlreadyExists(_) => "already_exists",
            ServiceError::Internal(_) => "internal",
        }
    }

    /// Build the response body sent to the caller.
    ///
    /// Internal errors always carry [`INTERNAL_MESSAGE`] instead of their detail.
    pub fn to_response(&self) -> ErrorResponse {
        let message = match self {
            ServiceError::InvalidArgument(m)
            | ServiceError::Unauthenticated(m)
            | ServiceError::PermissionDenied(m)
            | ServiceError::AlreadyExists(m) => m.clone(),
            ServiceError::Internal(_) => INTERNAL_MESSAGE.to_owned(),
        };
        ErrorResponse::new(self.code(), message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_codes() {
        assert_eq!(ServiceError::InvalidArgument("x".into()).http_status(), 400);
        assert_eq!(ServiceError::Unauthenticated("x".into()).http_status(), 401);
        assert_eq!(ServiceError::PermissionDenied("x".into()).http_status(), 403);
        assert_eq!(ServiceError::AlreadyExists("x".into()).http_status(), 409);
        assert_eq!(ServiceError::Internal("x".into()).http_status(), 500);
    }

    #[test]
    fn display_includes_message() {
        let e = ServiceError::InvalidArgument("limit can't be 0".into());
        assert!(e.to_string().contains("limit can't be 0"));
    }

    #[test]
    fn internal_detail_is_not_exposed() {
        let e = ServiceError::Internal("aead tag mismatch for card cvc".into());
        let body = e.to_response();
        assert_eq!(body.code, "internal");
        assert_eq!(body.message, INTERNAL_MESSAGE);
        assert!(!body.message.contains("cvc"));
    }

    #[test]
    fn client_errors_keep_their_message() {
        let body = ServiceError::PermissionDenied("no permission to access this operation".into())
            .to_response();
        assert_eq!(body.code, "permission_denied");
        assert!(body.message.contains("no permission"));
    }
}
