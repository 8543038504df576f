use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;
use url::Url;

use crate::error::{AuthError, MalformedExpiry};

/// Application credentials registered with the provider.
///
/// The flows only read these. Re-configuration replaces the whole value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl Credentials {
    /// Creates credentials from their three parts.
    ///
    /// # Arguments
    ///
    /// * `client_id` - Application client id
    /// * `client_secret` - Application client secret
    /// * `redirect_uri` - Exact redirect URI registered with the provider
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Credentials {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
        }
    }

    /// Both client id and secret are non-empty.
    pub fn is_configured(&self) -> bool {
        !self.client_id.trim().is_empty() && !self.client_secret.trim().is_empty()
    }

    /// Fails fast with [`AuthError::CredentialsMissing`] before any network or
    /// listener activity.
    pub fn ensure_configured(&self) -> Result<(), AuthError> {
        if self.is_configured() {
            Ok(())
        } else {
            Err(AuthError::CredentialsMissing)
        }
    }

    pub fn redirect_url(&self) -> Result<Url, AuthError> {
        Url::parse(&self.redirect_uri).map_err(|e| AuthError::InvalidRedirectUri {
            uri: self.redirect_uri.clone(),
            reason: e.to_string(),
        })
    }
}

/// An access token together with what is needed to reuse or refresh it.
///
/// `expires_at` is kept as the raw persisted string so a malformed value can
/// be detected (and treated as expired) instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    #[serde(default)]
    pub access_token: String,
    #[serde(default, with = "empty_as_none")]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: String,
    #[serde(default, with = "empty_as_none")]
    pub expires_at: Option<String>,
}

impl TokenRecord {
    /// Creates a record; the expiry is stored as RFC 3339 UTC with second
    /// precision.
    ///
    /// # Arguments
    ///
    /// * `access_token` - Bearer credential for API calls
    /// * `token_type` - Usually `Bearer`
    /// * `refresh_token` - `None` (or empty) for application-only tokens
    /// * `expires_at` - Absolute expiry instant, if the provider reported one
    pub fn new(
        access_token: impl Into<String>,
        token_type: impl Into<String>,
        refresh_token: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        TokenRecord {
            access_token: access_token.into(),
            refresh_token: refresh_token.filter(|t| !t.is_empty()),
            token_type: token_type.into(),
            expires_at: expires_at.map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true)),
        }
    }

    /// Parses the absolute expiry instant, if one is recorded.
    pub fn expiry(&self) -> Result<Option<DateTime<Utc>>, MalformedExpiry> {
        match self.expires_at.as_deref() {
            None | Some("") => Ok(None),
            Some(raw) => DateTime::parse_from_rfc3339(raw)
                .map(|at| Some(at.with_timezone(&Utc)))
                .map_err(|source| MalformedExpiry {
                    value: raw.to_string(),
                    source,
                }),
        }
    }

    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_empty()
            && !self.has_refresh_token()
            && self.token_type.is_empty()
            && self.expires_at.is_none()
    }

    /// Blanks every field. Clearing an empty record is a no-op.
    pub fn clear(&mut self) {
        *self = TokenRecord::default();
    }
}

/// How a single authorization attempt ended.
///
/// Exactly one outcome is observed per flow invocation. `Code`, `Error`,
/// `StateMismatch` and `MissingCode` come from the callback listener,
/// `Timeout` and `Cancelled` from the flow's own wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Code(String),
    Error(String),
    StateMismatch,
    MissingCode,
    Timeout,
    Cancelled,
}

/// Successful token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Error body returned by the token endpoint on 4xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

#[derive(Tabled)]
pub struct StatusTableRow {
    pub field: String,
    pub value: String,
}

mod empty_as_none {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<String>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.filter(|v| !v.is_empty()))
    }
}
