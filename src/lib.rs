//! spotctl library
//!
//! Command-line client for the Spotify Web API. The interesting part of this
//! crate is credential acquisition: the interactive Authorization Code flow
//! with its short-lived local callback listener, the non-interactive Client
//! Credentials flow, token refresh, and the status predicates that decide
//! whether a stored token can be reused.
//!
//! # Modules
//!
//! - `api` - HTTP handler for the local OAuth callback
//! - `cli` - Command-line interface implementations
//! - `config` - Environment and `.env` configuration
//! - `error` - Error types for the credential core
//! - `management` - Credential store, persistence and token lifecycle
//! - `server` - Local HTTP listener for OAuth callbacks
//! - `spotify` - OAuth flows and token endpoint client
//! - `types` - Credentials, token records and flow outcomes
//! - `utils` - State tokens, masking and small helpers
//!
//! # Example
//!
//! ```ignore
//! use spotctl::{config, management::CredentialStore, spotify::AuthorizationCodeFlow};
//!
//! #[tokio::main]
//! async fn main() -> spotctl::Res<()> {
//!     config::load_env().await?;
//!     let mut store = CredentialStore::open_default().await?;
//!     let flow = AuthorizationCodeFlow::new(config::endpoints());
//!     let token = flow.run(store.credentials()).await?;
//!     store.set_token(token);
//!     store.persist().await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod management;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

/// A convenient Result type alias for operations that may fail.
///
/// Used at the CLI boundary where errors from different layers meet. The
/// credential core itself returns [`error::AuthError`].
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```ignore
/// info!("Waiting for authorization on {}", addr);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only the CLI layer uses this. Nothing in the credential core terminates
/// the process; failures there are returned as [`error::AuthError`].
///
/// # Example
///
/// ```ignore
/// error!("Login failed: {}", e);
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Used for recoverable issues, e.g. when the browser cannot be opened and
/// the user has to navigate to the authorization URL manually.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
