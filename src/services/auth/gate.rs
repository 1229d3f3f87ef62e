//! Authorization of instance callbacks into the control plane.
//!
//! Decision order (first failure wins):
//! 1. header present
//! 2. header parses as a Basic credential
//! 3. credential identity equals the route key
//! 4. route key resolves to a registered instance
//! 5. instance has a secret configured
//! 6. presented secret equals the configured one (constant-time)

use std::{fmt, sync::Arc};

use axum::http::StatusCode;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{debug, warn};

use crate::services::auth::credential::{CredentialError, parse_basic};
use crate::services::registry::{InstanceHandle, InstanceRegistry};

/// Why an authorization attempt was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DenyReason {
    #[error("authorization header is missing")]
    MissingHeader,
    #[error("unsupported authorization scheme")]
    UnsupportedScheme,
    #[error("malformed credential")]
    MalformedCredential,
    #[error("credential does not match the requested instance")]
    IdentityMismatch,
    #[error("unknown instance")]
    UnknownInstance,
    #[error("instance has no secret configured")]
    SecretNotConfigured,
    #[error("secret mismatch")]
    SecretMismatch,
}

impl DenyReason {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MalformedCredential => StatusCode::BAD_REQUEST,
            Self::IdentityMismatch => StatusCode::FORBIDDEN,
            Self::UnknownInstance => StatusCode::NOT_FOUND,
            Self::MissingHeader
            | Self::UnsupportedScheme
            | Self::SecretNotConfigured
            | Self::SecretMismatch => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingHeader => "MISSING_AUTHORIZATION",
            Self::UnsupportedScheme => "UNSUPPORTED_SCHEME",
            Self::MalformedCredential => "MALFORMED_CREDENTIAL",
            Self::IdentityMismatch => "IDENTITY_MISMATCH",
            Self::UnknownInstance => "UNKNOWN_INSTANCE",
            Self::SecretNotConfigured => "SECRET_NOT_CONFIGURED",
            Self::SecretMismatch => "SECRET_MISMATCH",
        }
    }
}

impl From<CredentialError> for DenyReason {
    fn from(e: CredentialError) -> Self {
        match e {
            CredentialError::SchemeMismatch => Self::UnsupportedScheme,
            CredentialError::InvalidBase64
            | CredentialError::InvalidUtf8
            | CredentialError::MissingSeparator => Self::MalformedCredential,
        }
    }
}

/// `Ok` carries the resolved instance, valid for the current request.
pub type AuthorizationResult = Result<InstanceHandle, DenyReason>;

/// Stateless gate: holds only the registry capability.
#[derive(Clone)]
pub struct AuthorizationGate {
    registry: Arc<dyn InstanceRegistry>,
}

impl fmt::Debug for AuthorizationGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationGate").finish_non_exhaustive()
    }
}

impl AuthorizationGate {
    pub fn new(registry: Arc<dyn InstanceRegistry>) -> Self {
        Self { registry }
    }

    /// Decide whether `authorization` proves the caller is instance `key`.
    ///
    /// `key` comes from the request route and is untrusted; it is compared
    /// exactly against the credential identity before any lookup happens.
    pub async fn authorize(
        &self,
        authorization: Option<&str>,
        key: &str,
    ) -> AuthorizationResult {
        let Some(authorization) = authorization.filter(|v| !v.is_empty()) else {
            warn!(key = %key, "authorization header is missing for server api request");
            return Err(DenyReason::MissingHeader);
        };

        let credential = parse_basic(authorization).map_err(|err| {
            warn!(
                key = %key,
                error = %err,
                "failed to parse basic credential for server api request"
            );
            DenyReason::from(err)
        })?;

        if credential.identity != key {
            warn!(
                expected = %key,
                actual = %credential.identity,
                "authorization key mismatch"
            );
            return Err(DenyReason::IdentityMismatch);
        }

        let Some(instance) = self.registry.lookup(key).await else {
            warn!(key = %key, "server instance not found");
            return Err(DenyReason::UnknownInstance);
        };

        let Some(expected) = instance.configured_secret() else {
            warn!(key = %key, "server instance has no secret configured");
            return Err(DenyReason::SecretNotConfigured);
        };

        if !secrets_match(&credential.secret, expected) {
            warn!(key = %key, "secret mismatch for server instance");
            return Err(DenyReason::SecretMismatch);
        }

        debug!(key = %key, "authorized server api request");
        Ok(instance)
    }
}

/// Constant-time secret comparison.
///
/// Length is not treated as confidential; equal-length inputs are compared
/// over their full length regardless of where they first differ.
pub fn secrets_match(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}
