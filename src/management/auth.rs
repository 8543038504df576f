use chrono::Utc;
use tracing::{debug, info};

use crate::{
    config::Endpoints,
    error::AuthError,
    management::store::{CredentialStore, FileBackend, StoreBackend},
    spotify::{ClientCredentialsFlow, TokenClient},
    types::{Credentials, TokenRecord},
};

/// What to do with the stored token before an API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenAction {
    /// Valid and not close to expiry.
    Reuse,
    /// Expired or expiring soon, but a refresh token is available.
    Refresh,
    /// Nothing usable; fetch an application token.
    Acquire,
}

/// Keeps the stored access token usable.
///
/// Refreshes user tokens ahead of expiry and re-acquires application tokens
/// (which never carry a refresh token) through the Client Credentials flow.
/// Every new token is committed to the store and persisted.
pub struct TokenManager<B: StoreBackend = FileBackend> {
    store: CredentialStore<B>,
    credentials: Credentials,
    tokens: TokenClient,
    client_credentials: ClientCredentialsFlow,
}

impl<B: StoreBackend> TokenManager<B> {
    /// `credentials` are the effective ones, i.e. the stored values with any
    /// environment overrides applied.
    pub fn new(store: CredentialStore<B>, credentials: Credentials, endpoints: &Endpoints) -> Self {
        TokenManager {
            store,
            credentials,
            tokens: TokenClient::new(endpoints.token_url.clone()),
            client_credentials: ClientCredentialsFlow::new(endpoints),
        }
    }

    pub fn next_action(&self) -> TokenAction {
        let status = self.store.status(Utc::now());
        if status.authenticated && !status.expiring_soon {
            TokenAction::Reuse
        } else if status.refreshable {
            TokenAction::Refresh
        } else {
            TokenAction::Acquire
        }
    }

    /// Access token ready for use, refreshing or re-acquiring as needed.
    pub async fn get_valid_token(&mut self) -> Result<String, AuthError> {
        match self.next_action() {
            TokenAction::Reuse => {}
            TokenAction::Refresh => self.refresh().await?,
            TokenAction::Acquire => {
                debug!("no usable token, acquiring application token");
                let record = self.client_credentials.acquire(&self.credentials).await?;
                self.commit(record).await?;
            }
        }

        Ok(self.store.token().access_token.clone())
    }

    /// Forces a refresh_token grant.
    pub async fn refresh(&mut self) -> Result<(), AuthError> {
        let Some(refresh_token) = self.store.token().refresh_token.clone() else {
            return Err(AuthError::NotAuthenticated);
        };
        self.credentials.ensure_configured()?;

        let record = self.tokens.refresh(&self.credentials, &refresh_token).await?;
        info!(expires_at = ?record.expires_at, "access token refreshed");
        self.commit(record).await
    }

    pub fn store(&self) -> &CredentialStore<B> {
        &self.store
    }

    pub fn into_store(self) -> CredentialStore<B> {
        self.store
    }

    async fn commit(&mut self, record: TokenRecord) -> Result<(), AuthError> {
        self.store.set_token(record);
        self.store.persist().await?;
        Ok(())
    }
}
