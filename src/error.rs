//! Error types for the credential core.
//!
//! Every flow returns a single [`AuthError`] to its caller. The plain-text
//! responses the callback listener sends to the browser are a separate
//! channel and never replace the returned error.

use std::time::Duration;

use thiserror::Error;

use crate::utils::format_duration;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("client credentials are not configured (client_id and client_secret are required)")]
    CredentialsMissing,

    #[error("failed to generate state token: {0}")]
    Entropy(String),

    #[error("invalid redirect uri '{uri}': {reason}")]
    InvalidRedirectUri { uri: String, reason: String },

    #[error("cannot bind callback listener on {addr}: {source}")]
    ListenerBind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid state parameter")]
    InvalidState,

    #[error("authorization error: {0}")]
    Provider(String),

    #[error("no authorization code received")]
    MissingCode,

    #[error("authorization timeout after {}", format_duration(.0))]
    Timeout(Duration),

    #[error("authorization cancelled")]
    Cancelled,

    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    #[error("not authenticated, run `spotctl auth login` first")]
    NotAuthenticated,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        AuthError::TokenExchange(err.to_string())
    }
}

/// Failures of the persistence backend behind the credential store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("credential store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("credential store is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
}

/// A persisted `expires_at` value that is not an RFC 3339 instant.
///
/// Never surfaced as a hard failure: the status evaluator treats the token as
/// expired instead.
#[derive(Debug, Error)]
#[error("malformed expiry timestamp '{value}': {source}")]
pub struct MalformedExpiry {
    pub value: String,
    #[source]
    pub source: chrono::ParseError,
}
