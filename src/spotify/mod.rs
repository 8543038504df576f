//! # Spotify Authorization Module
//!
//! OAuth2 token acquisition against the Spotify accounts service.
//!
//! ## Flows
//!
//! - [`AuthorizationCodeFlow`] - interactive login. Binds a local listener on
//!   the redirect URI, opens the browser, correlates the callback through a
//!   state token and exchanges the code for an access/refresh token pair.
//! - [`ClientCredentialsFlow`] - application-only token, no user context,
//!   no refresh token.
//! - [`TokenClient::refresh`] - refresh_token grant used by
//!   [`crate::management::TokenManager`].
//!
//! ## Authorization Code lifecycle
//!
//! ```text
//!   run()
//!     |  state token, authorization URL
//!     v
//!   bind listener --(port busy)--> ListenerBind error
//!     |
//!     v
//!   open browser --(fails)--> print URL, keep waiting
//!     |
//!     v
//!   select { callback | 5 min deadline | cancel }
//!     |
//!     v
//!   close listener (always)
//!     |
//!     v
//!   code? --> token exchange --> TokenRecord
//! ```
//!
//! The flows never write to the credential store. Callers commit the
//! returned [`crate::types::TokenRecord`] themselves, so a failed attempt
//! leaves previously stored tokens untouched.

pub mod auth;
pub mod browser;
pub mod client_credentials;
pub mod scopes;
pub mod token;

pub use auth::{AuthorizationCodeFlow, AuthorizationRequest, DEFAULT_WAIT, FlowState};
pub use browser::{BrowserLauncher, SystemBrowser};
pub use client_credentials::ClientCredentialsFlow;
pub use scopes::Scope;
pub use token::TokenClient;
