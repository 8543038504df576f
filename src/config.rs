//! Configuration management for spotctl.
//!
//! Values are read from environment variables, which may be seeded from a
//! `.env` file in the local data directory. Only the three credential keys
//! feed the credential core; the endpoint keys exist so the flows can be
//! pointed at a different authorization server.
//!
//! Priority:
//! 1. Environment variables
//! 2. `.env` file in the local data directory
//! 3. Built-in defaults

use std::{env, path::PathBuf};

use crate::{Res, types::Credentials};

pub const CLIENT_ID_KEY: &str = "SPOTCTL_CLIENT_ID";
pub const CLIENT_SECRET_KEY: &str = "SPOTCTL_CLIENT_SECRET";
pub const REDIRECT_URI_KEY: &str = "SPOTCTL_REDIRECT_URI";
pub const AUTH_URL_KEY: &str = "SPOTCTL_AUTH_URL";
pub const TOKEN_URL_KEY: &str = "SPOTCTL_TOKEN_URL";
pub const LOG_KEY: &str = "SPOTCTL_LOG";

pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Authorization server endpoints used by the OAuth flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub authorize_url: String,
    pub token_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            authorize_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
        }
    }
}

/// Loads environment variables from `<data_local_dir>/spotctl/.env`.
///
/// Creates the directory if needed. A missing `.env` file is fine; a file
/// that exists but cannot be parsed is an error.
///
/// # Directory Structure
///
/// - Linux: `~/.local/share/spotctl/.env`
/// - macOS: `~/Library/Application Support/spotctl/.env`
/// - Windows: `%LOCALAPPDATA%/spotctl/.env`
pub async fn load_env() -> Res<()> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| format!("{}: {}", path.display(), e))?;
    }
    Ok(())
}

/// Platform data directory for spotctl, falling back to `./spotctl`.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("spotctl");
    path
}

pub fn client_id() -> Option<String> {
    non_empty_var(CLIENT_ID_KEY)
}

pub fn client_secret() -> Option<String> {
    non_empty_var(CLIENT_SECRET_KEY)
}

pub fn redirect_uri() -> Option<String> {
    non_empty_var(REDIRECT_URI_KEY)
}

/// Applies credential values from the environment on top of `base`.
///
/// Unset keys keep the base value. An empty redirect URI falls back to
/// [`DEFAULT_REDIRECT_URI`].
pub fn overlay_credentials(base: &Credentials) -> Credentials {
    let mut credentials = base.clone();
    if let Some(id) = client_id() {
        credentials.client_id = id;
    }
    if let Some(secret) = client_secret() {
        credentials.client_secret = secret;
    }
    if let Some(uri) = redirect_uri() {
        credentials.redirect_uri = uri;
    }
    if credentials.redirect_uri.is_empty() {
        credentials.redirect_uri = DEFAULT_REDIRECT_URI.to_string();
    }
    credentials
}

/// Credential keys set in the environment, in declaration order.
pub fn credential_overrides() -> Vec<&'static str> {
    overrides_with(non_empty_var)
}

fn overrides_with(lookup: impl Fn(&str) -> Option<String>) -> Vec<&'static str> {
    [CLIENT_ID_KEY, CLIENT_SECRET_KEY, REDIRECT_URI_KEY]
        .into_iter()
        .filter(|key| lookup(*key).is_some())
        .collect()
}

pub fn endpoints() -> Endpoints {
    let defaults = Endpoints::default();
    Endpoints {
        authorize_url: non_empty_var(AUTH_URL_KEY).unwrap_or(defaults.authorize_url),
        token_url: non_empty_var(TOKEN_URL_KEY).unwrap_or(defaults.token_url),
    }
}

/// Tracing filter directive, `warn` unless `SPOTCTL_LOG` is set.
pub fn log_filter() -> String {
    non_empty_var(LOG_KEY).unwrap_or_else(|| "warn".to_string())
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_list_only_set_keys() {
        assert!(overrides_with(|_| None).is_empty());

        let only_secret =
            overrides_with(|key| (key == CLIENT_SECRET_KEY).then(|| "s".to_string()));
        assert_eq!(only_secret, vec![CLIENT_SECRET_KEY]);

        let all = overrides_with(|_| Some("x".to_string()));
        assert_eq!(all, vec![CLIENT_ID_KEY, CLIENT_SECRET_KEY, REDIRECT_URI_KEY]);
    }
}
