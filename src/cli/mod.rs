//! # CLI Module
//!
//! User-facing commands. Each command opens the credential store, calls into
//! the credential core and reports through the console macros. Failures
//! terminate with `error!`; the core itself never exits the process.
//!
//! ## Commands
//!
//! - [`login`] - interactive browser login, or `--client-credentials`
//! - [`status`] - token predicates as a table, secrets masked
//! - [`logout`] - blank the stored token, keep client credentials
//! - [`refresh`] - force a refresh_token grant
//! - [`token`] - print a usable access token, refreshing if needed
//! - [`setup`] / [`show`] - manage client credentials
//!
//! ## Usage
//!
//! ```bash
//! spotctl config setup             # store client id/secret
//! spotctl auth login               # browser login
//! spotctl auth status
//! spotctl token                    # for scripts: curl -H "Authorization: Bearer $(spotctl token)"
//! ```

mod auth;
mod config;

pub use auth::{login, logout, refresh, status, token};
pub use config::{setup, show};
