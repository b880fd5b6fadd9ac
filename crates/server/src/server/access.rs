//! Authentication and role authorization for every routed call.
//!
//! The operation table maps a route path to the roles allowed to call it.
//! Routes missing from the table are public (register, login, health). For a
//! listed route the caller must present a token that verifies and carries an
//! allowed role; its subject then becomes the [`AuthenticatedOwner`] of the
//! request.

use std::collections::HashMap;

use axum::{
    async_trait,
    extract::{FromRequestParts, MatchedPath, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use common::ServiceError;
use tracing::debug;
use uuid::Uuid;

use super::{error::ApiError, state::AppState};

/// Operation path → roles allowed to call it.
#[derive(Debug, Clone, Default)]
pub struct AccessTable {
    rules: HashMap<&'static str, Vec<&'static str>>,
}

impl AccessTable {
    pub fn new(rules: impl IntoIterator<Item = (&'static str, Vec<&'static str>)>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
        }
    }

    /// Allowed roles for `operation`, or `None` if it is public.
    pub fn allowed_roles(&self, operation: &str) -> Option<&[&'static str]> {
        self.rules.get(operation).map(Vec::as_slice)
    }
}

/// Owner id injected by [`authorize`] for protected routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedOwner(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedOwner
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthenticatedOwner>().copied().ok_or_else(|| {
            ApiError(ServiceError::InvalidArgument(
                "failed to extract owner id".into(),
            ))
        })
    }
}

/// Route-layer middleware enforcing the [`AccessTable`].
pub async fn authorize(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let operation = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());

    let Some(roles) = state.access.allowed_roles(&operation) else {
        return Ok(next.run(req).await);
    };

    let token = bearer_token(req.headers()).ok_or_else(|| {
        ApiError(ServiceError::Unauthenticated(
            "missing authorization token".into(),
        ))
    })?;

    let claims = state.tokens.verify(token).map_err(|e| {
        debug!(op = %operation, error = %e, "token rejected");
        ApiError(ServiceError::Unauthenticated(
            "invalid or expired token".into(),
        ))
    })?;

    if !roles.contains(&claims.role.as_str()) {
        debug!(op = %operation, role = %claims.role, "role not allowed");
        return Err(ApiError(ServiceError::PermissionDenied(format!(
            "role {} may not call {operation}",
            claims.role
        ))));
    }

    let owner = Uuid::parse_str(&claims.sub).map_err(|_| {
        ApiError(ServiceError::Unauthenticated(
            "invalid or expired token".into(),
        ))
    })?;

    req.extensions_mut().insert(AuthenticatedOwner(owner));
    Ok(next.run(req).await)
}

/// Token from the `authorization` header, raw or as `Bearer <token>`.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        None if value.eq_ignore_ascii_case("bearer") => "",
        _ => value,
    };
    (!token.is_empty()).then_some(token)
}
