//! `Authorization: Basic <base64(identity:secret)>` parsing.
//!
//! The header is only used as a carrier for the (identity, secret) pair an
//! instance presents when it calls back into the control plane.

use std::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use thiserror::Error;

/// Case-sensitive scheme prefix, including the separating space.
pub const SCHEME_PREFIX: &str = "Basic ";

#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub identity: String,
    pub secret: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print the presented secret
        f.debug_struct("Credential")
            .field("identity", &self.identity)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("authorization scheme is not Basic")]
    SchemeMismatch,
    #[error("credential is not valid base64")]
    InvalidBase64,
    #[error("decoded credential is not valid utf-8")]
    InvalidUtf8,
    #[error("decoded credential has no ':' separator")]
    MissingSeparator,
}

/// Parse a raw `Authorization` header value into a [`Credential`].
///
/// Only the first `:` splits identity from secret; the secret keeps any
/// further colons. Empty identity or secret is not an error here.
pub fn parse_basic(header: &str) -> Result<Credential, CredentialError> {
    let encoded = header
        .strip_prefix(SCHEME_PREFIX)
        .ok_or(CredentialError::SchemeMismatch)?;

    let bytes = STANDARD
        .decode(encoded)
        .map_err(|_| CredentialError::InvalidBase64)?;
    let decoded = String::from_utf8(bytes).map_err(|_| CredentialError::InvalidUtf8)?;

    let (identity, secret) = decoded
        .split_once(':')
        .ok_or(CredentialError::MissingSeparator)?;

    Ok(Credential {
        identity: identity.to_string(),
        secret: secret.to_string(),
    })
}

/// Build the header value an instance would send.
#[cfg(test)]
pub fn encode_basic(identity: &str, secret: &str) -> String {
    format!("{}{}", SCHEME_PREFIX, STANDARD.encode(format!("{identity}:{secret}")))
}
