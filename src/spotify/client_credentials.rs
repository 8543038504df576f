use tracing::debug;

use crate::{
    config::Endpoints,
    error::AuthError,
    spotify::token::TokenClient,
    types::{Credentials, TokenRecord},
};

/// Non-interactive, application-only token acquisition.
///
/// No listener and no browser are involved. Tokens obtained this way carry
/// no user context and no refresh token; they are re-acquired when they
/// expire.
#[derive(Debug, Clone)]
pub struct ClientCredentialsFlow {
    tokens: TokenClient,
}

impl ClientCredentialsFlow {
    pub fn new(endpoints: &Endpoints) -> Self {
        ClientCredentialsFlow {
            tokens: TokenClient::new(endpoints.token_url.clone()),
        }
    }

    pub async fn acquire(&self, credentials: &Credentials) -> Result<TokenRecord, AuthError> {
        credentials.ensure_configured()?;
        let record = self.tokens.client_credentials(credentials).await?;
        debug!(expires_at = ?record.expires_at, "client credentials token acquired");
        Ok(record)
    }
}
