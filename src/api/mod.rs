//! # API Module
//!
//! HTTP handler for the local OAuth callback listener.
//!
//! The listener only exists while an Authorization Code attempt is waiting
//! for the browser redirect (see [`crate::server::CallbackServer`]). The
//! single route validates the `state` query parameter against the token
//! issued for the attempt and delivers exactly one [`CallbackOutcome`] to the
//! waiting flow.
//!
//! ## Browser responses
//!
//! | Outcome | Status | Body |
//! |---------|--------|------|
//! | code received | 200 | HTML success page |
//! | state mismatch | 400 | `invalid state parameter` |
//! | provider error | 400 | `authorization error: <msg>` |
//! | no code | 400 | `no authorization code received` |
//! | repeated callback | 409 | `authorization already handled` |
//! | any other path | 404 | empty |
//!
//! These responses are a side channel for the user. The error returned to
//! the CLI caller is produced by the flow, not by this module.
//!
//! [`CallbackOutcome`]: crate::types::CallbackOutcome

mod callback;

pub use callback::{CallbackContext, callback, classify};
