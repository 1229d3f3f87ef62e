//! Extractor that authorizes an instance callback.
//!
//! - route identity: the `{key}` path segment
//! - credential: the `Authorization` header
//!
//! Handlers that take `AuthorizedInstance` only run for the instance the
//! credential proves; every other outcome is rendered from its `DenyReason`.

use axum::{
    extract::{FromRequestParts, Path},
    http::{header, request::Parts},
    response::{IntoResponse, Response},
};

use crate::error::AppError;
use crate::services::auth::AuthorizationResult;
use crate::services::registry::InstanceHandle;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct AuthorizedInstance(pub InstanceHandle);

impl FromRequestParts<AppState> for AuthorizedInstance {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Path(key) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        // Non visible-ASCII bytes are kept (lossily) so they fail credential
        // parsing instead of looking like a missing header.
        let authorization = parts
            .headers
            .get(header::AUTHORIZATION)
            .map(|v| String::from_utf8_lossy(v.as_bytes()));

        let result: AuthorizationResult =
            state.gate.authorize(authorization.as_deref(), &key).await;

        result
            .map(Self)
            .map_err(|reason| AppError::from(reason).into_response())
    }
}
