//! Router-wide middleware: request tracing, deadlines and panic containment.

use std::{any::Any, time::Duration};

use axum::{
    error_handling::HandleErrorLayer,
    response::{IntoResponse, Response},
    BoxError, Router,
};
use common::ServiceError;
use tower::{timeout::error::Elapsed, timeout::TimeoutLayer, ServiceBuilder};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{error, warn};

use super::error::ApiError;

/// Default per-request timeout applied to all routes.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default cap on a request body. Covers a 4 MiB file once base64-encoded
/// inside its JSON envelope.
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Wrap `router` in tracing (outermost), the request deadline, and panic
/// containment (innermost).
///
/// A dropped request future cancels whatever storage, blob store or hashing
/// call it was awaiting. Both a missed deadline and a panic answer with the
/// generic internal error body.
pub fn with_middleware<S>(router: Router<S>, timeout: Duration) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout))
                .layer(TimeoutLayer::new(timeout)),
        )
        .layer(TraceLayer::new_for_http())
}

/// Turn a handler panic into a generic 500 so the process keeps serving.
fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_owned()
    } else {
        "unknown panic payload".to_owned()
    };
    error!(panic = %detail, "request handler panicked");
    ApiError(ServiceError::Internal(detail)).into_response()
}

async fn handle_timeout(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        warn!("request deadline exceeded");
        ApiError(ServiceError::Internal("request deadline exceeded".into()))
    } else {
        error!(error = %err, "middleware failure");
        ApiError(ServiceError::Internal(err.to_string()))
    }
}
