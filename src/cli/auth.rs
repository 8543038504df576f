use std::{future::Future, io, time::Duration};

use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use tabled::Table;

use crate::{
    config, error, info,
    management::{CredentialStore, FileBackend, TokenManager},
    spotify::{AuthorizationCodeFlow, ClientCredentialsFlow},
    success,
    types::{Credentials, StatusTableRow},
    utils::mask_string,
    warning,
};

/// Logs in and persists the new token.
///
/// With `client_credentials` an application-only token is fetched, otherwise
/// the interactive browser flow runs. A failed attempt leaves the stored
/// token as it was.
pub async fn login(client_credentials: bool) {
    let mut store = open_store().await;
    let credentials = effective_credentials(&store);
    let endpoints = config::endpoints();

    let result = if client_credentials {
        ClientCredentialsFlow::new(&endpoints)
            .acquire(&credentials)
            .await
    } else {
        info!(
            "Waiting for authorization callback on {}",
            credentials.redirect_uri
        );
        let pb = ProgressBar::new_spinner();
        pb.set_message("Waiting for browser authorization (Ctrl-C to abort)...");
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_style(
            ProgressStyle::with_template("{spinner:.blue} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );

        let result = AuthorizationCodeFlow::new(endpoints)
            .run_until(&credentials, interrupted(tokio::signal::ctrl_c()))
            .await;
        pb.finish_and_clear();
        result
    };

    match result {
        Ok(token) => {
            store.set_token(token);
            if let Err(e) = store.persist().await {
                error!("Failed to save token: {}", e);
            }
            success!("Authentication successful!");
        }
        Err(e) => error!("Authentication failed: {}", e),
    }
}

/// Shows whether a usable token is stored.
///
/// Prints a table with the masked client id and access token, the expiry
/// and the evaluated status flags.
pub async fn status() {
    let store = open_store().await;
    let credentials = effective_credentials(&store);
    let token = store.token();
    let status = store.status(Utc::now());

    let expires_at = match (&status.expires_at, &token.expires_at) {
        (Some(at), _) => at.to_rfc3339(),
        (None, Some(raw)) => format!("{raw} (invalid)"),
        (None, None) => "-".to_string(),
    };

    let rows = vec![
        row("Client ID", mask_string(&credentials.client_id)),
        row("Redirect URI", credentials.redirect_uri.clone()),
        row("Access token", mask_string(&token.access_token)),
        row("Token type", token.token_type.clone()),
        row("Expires at", expires_at),
        row("Authenticated", yes_no(status.authenticated)),
        row("Expired", yes_no(status.expired)),
        row("Expiring soon", yes_no(status.expiring_soon)),
        row("Refreshable", yes_no(status.refreshable)),
    ];
    println!("{}", Table::new(rows));

    if !status.authenticated {
        warning!("Not authenticated. Run `spotctl auth login`.");
    }
}

/// Blanks the stored token. Client credentials stay in place.
pub async fn logout() {
    let mut store = open_store().await;
    store.clear_token();
    if let Err(e) = store.persist().await {
        error!("Failed to clear token: {}", e);
    }
    success!("Logged out. Client credentials were kept.");
}

/// Forces a refresh_token grant and persists the new token.
///
/// Exits with an error when the stored token has no refresh token, which is
/// the case for application-only tokens.
pub async fn refresh() {
    let store = open_store().await;
    let credentials = effective_credentials(&store);
    let mut manager = TokenManager::new(store, credentials, &config::endpoints());

    match manager.refresh().await {
        Ok(()) => success!("Access token refreshed."),
        Err(e) => error!("Cannot refresh token: {}", e),
    }
}

/// Prints an access token usable for API calls.
pub async fn token() {
    let store = open_store().await;
    let credentials = effective_credentials(&store);
    let mut manager = TokenManager::new(store, credentials, &config::endpoints());

    match manager.get_valid_token().await {
        Ok(token) => println!("{token}"),
        Err(e) => error!("Cannot obtain access token: {}", e),
    }
}

/// Resolves once `signal` fires. If the handler cannot be installed the
/// future never resolves, so the login keeps waiting for the browser.
async fn interrupted<F>(signal: F)
where
    F: Future<Output = io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::warn!("cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

pub(crate) async fn open_store() -> CredentialStore<FileBackend> {
    match CredentialStore::open_default().await {
        Ok(store) => store,
        Err(e) => error!("Cannot read credential store: {}", e),
    }
}

pub(crate) fn effective_credentials(store: &CredentialStore<FileBackend>) -> Credentials {
    let credentials = config::overlay_credentials(store.credentials());
    if !credentials.is_configured() {
        error!("Client credentials are missing. Run `spotctl config setup` first.");
    }
    credentials
}

fn row(field: &str, value: String) -> StatusTableRow {
    StatusTableRow {
        field: field.to_string(),
        value,
    }
}

fn yes_no(value: bool) -> String {
    let text = if value { "yes" } else { "no" };
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn signal_resolves_cancel() {
        let cancel = interrupted(async { Ok(()) });
        assert!(tokio::time::timeout(Duration::from_millis(50), cancel).await.is_ok());
    }

    #[tokio::test]
    async fn failed_handler_never_cancels() {
        let cancel = interrupted(async { Err(io::Error::other("no signal handler")) });
        assert!(tokio::time::timeout(Duration::from_millis(50), cancel).await.is_err());
    }
}
