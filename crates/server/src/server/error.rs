//! Translation of layer errors into HTTP responses.
//!
//! Every failure leaves the server as `(status, Json(ErrorResponse))`. Cipher,
//! storage and blob-store detail is logged here and replaced by a generic
//! message before it reaches the caller.

use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::ServiceError;
use tracing::error;

use crate::auth::AuthError;
use crate::secrets::SecretError;
use crate::sync::SyncError;

/// Handler error: a [`ServiceError`] that renders as a JSON error body.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl ApiError {
    fn internal(context: &str, detail: impl std::fmt::Display) -> Self {
        let detail = detail.to_string();
        error!(error = %detail, "{context}");
        ApiError(ServiceError::Internal(detail))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0.to_response())).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError(err)
    }
}

impl From<SecretError> for ApiError {
    fn from(err: SecretError) -> Self {
        match err {
            SecretError::Validation(msg) => ApiError(ServiceError::InvalidArgument(msg)),
            SecretError::NotFound => {
                ApiError(ServiceError::InvalidArgument(SecretError::NotFound.to_string()))
            }
            SecretError::Cipher(e) => Self::internal("stored secret failed to decrypt", e),
            SecretError::Storage(e) => Self::internal("secret storage failure", e),
            SecretError::BlobStore(e) => Self::internal("blob store failure", e),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(msg) => ApiError(ServiceError::InvalidArgument(msg)),
            AuthError::InvalidCredentials => {
                ApiError(ServiceError::InvalidArgument(err.to_string()))
            }
            AuthError::AlreadyExists => ApiError(ServiceError::AlreadyExists(err.to_string())),
            AuthError::Hash(_) | AuthError::Storage(_) => Self::internal("auth failure", err),
        }
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::NotFound => ApiError(ServiceError::InvalidArgument(err.to_string())),
            SyncError::Storage(e) => Self::internal("sync storage failure", e),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(ServiceError::InvalidArgument(rejection.body_text()))
    }
}

/// `Json` extractor whose rejections use the standard error body.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::CipherError;
    use crate::storage::StorageError;
    use common::error::INTERNAL_MESSAGE;

    fn parts(err: ApiError) -> (u16, String, String) {
        let body = err.0.to_response();
        (err.0.http_status(), body.code, body.message)
    }

    #[test]
    fn cipher_failure_is_opaque() {
        let (status, code, message) = parts(SecretError::Cipher(CipherError::Invalid).into());
        assert_eq!(status, 500);
        assert_eq!(code, "internal");
        assert_eq!(message, INTERNAL_MESSAGE);
    }

    #[test]
    fn backend_failure_is_opaque() {
        let (status, _, message) =
            parts(SecretError::Storage(StorageError::Backend("pg: conn refused".into())).into());
        assert_eq!(status, 500);
        assert!(!message.contains("pg"));
    }

    #[test]
    fn not_found_is_invalid_argument() {
        let (status, code, _) = parts(SecretError::NotFound.into());
        assert_eq!(status, 400);
        assert_eq!(code, "invalid_argument");
    }

    #[test]
    fn auth_errors_map_to_expected_statuses() {
        assert_eq!(parts(AuthError::InvalidCredentials.into()).0, 400);
        assert_eq!(parts(AuthError::AlreadyExists.into()).0, 409);
        assert_eq!(parts(AuthError::Hash("oom".into()).into()).0, 500);
    }
}
