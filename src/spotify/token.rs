use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use tracing::debug;

use crate::{
    error::AuthError,
    types::{Credentials, TokenErrorResponse, TokenRecord, TokenResponse},
};

/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_LIFETIME_SECS: i64 = 3600;

/// Client for the provider's token endpoint.
///
/// All grants are sent as form-encoded POSTs with the client id and secret
/// in the body.
#[derive(Debug, Clone)]
pub struct TokenClient {
    http: Client,
    token_url: String,
}

impl TokenClient {
    pub fn new(token_url: impl Into<String>) -> Self {
        TokenClient {
            http: Client::new(),
            token_url: token_url.into(),
        }
    }

    /// Exchanges an authorization code for an access/refresh token pair.
    ///
    /// `redirect_uri` must be the exact string sent in the authorization URL;
    /// the provider rejects the exchange otherwise.
    pub async fn exchange_code(
        &self,
        credentials: &Credentials,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenRecord, AuthError> {
        let response = self
            .request(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("client_id", &credentials.client_id),
                ("client_secret", &credentials.client_secret),
            ])
            .await?;

        record_from_response(response, Utc::now(), None)
    }

    /// Application-only token. This grant never carries a refresh token.
    pub async fn client_credentials(
        &self,
        credentials: &Credentials,
    ) -> Result<TokenRecord, AuthError> {
        let response = self
            .request(&[
                ("grant_type", "client_credentials"),
                ("client_id", &credentials.client_id),
                ("client_secret", &credentials.client_secret),
            ])
            .await?;

        let mut record = record_from_response(response, Utc::now(), None)?;
        record.refresh_token = None;
        Ok(record)
    }

    /// Trades a refresh token for a new access token.
    ///
    /// Providers may or may not rotate the refresh token; when the response
    /// carries none the one passed in is kept.
    pub async fn refresh(
        &self,
        credentials: &Credentials,
        refresh_token: &str,
    ) -> Result<TokenRecord, AuthError> {
        let response = self
            .request(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", &credentials.client_id),
                ("client_secret", &credentials.client_secret),
            ])
            .await?;

        record_from_response(response, Utc::now(), Some(refresh_token.to_string()))
    }

    async fn request(&self, form: &[(&str, &str)]) -> Result<TokenResponse, AuthError> {
        let grant = form
            .iter()
            .find(|(k, _)| *k == "grant_type")
            .map(|(_, v)| *v)
            .unwrap_or_default();
        debug!(grant, url = %self.token_url, "requesting token");

        let res = self.http.post(&self.token_url).form(form).send().await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(AuthError::TokenExchange(describe_failure(status, &body)));
        }

        let token: TokenResponse = res.json().await?;
        if token.access_token.is_empty() {
            return Err(AuthError::TokenExchange(
                "response did not contain an access token".to_string(),
            ));
        }
        debug!(grant, status = %status, "token received");
        Ok(token)
    }
}

/// Builds a record with an absolute expiry from the provider's relative
/// lifetime.
///
/// # Errors
///
/// A lifetime that does not fit a timestamp is rejected with
/// [`AuthError::TokenExchange`]; the record always carries an expiry.
pub fn record_from_response(
    response: TokenResponse,
    now: DateTime<Utc>,
    fallback_refresh: Option<String>,
) -> Result<TokenRecord, AuthError> {
    let seconds = response.expires_in.unwrap_or(DEFAULT_LIFETIME_SECS);
    let expires_at = Duration::try_seconds(seconds)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or_else(|| {
            AuthError::TokenExchange(format!("token lifetime out of range: {seconds}s"))
        })?;
    let refresh = response
        .refresh_token
        .filter(|t| !t.is_empty())
        .or(fallback_refresh);

    Ok(TokenRecord::new(
        response.access_token,
        response
            .token_type
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Bearer".to_string()),
        refresh,
        Some(expires_at),
    ))
}

fn describe_failure(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<TokenErrorResponse>(body) {
        Ok(TokenErrorResponse {
            error,
            error_description: Some(description),
        }) => format!("{status}: {error} ({description})"),
        Ok(TokenErrorResponse { error, .. }) => format!("{status}: {error}"),
        Err(_) if body.trim().is_empty() => status.to_string(),
        Err(_) => format!("{status}: {}", body.trim()),
    }
}
