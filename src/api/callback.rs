use std::{collections::HashMap, sync::Arc};

use axum::{
    Extension,
    extract::Query,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tokio::sync::{Mutex, oneshot};
use tracing::{debug, warn};

use crate::{error::AuthError, types::CallbackOutcome};

const SUCCESS_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>spotctl</title></head>
<body style="font-family: system-ui; text-align: center; padding-top: 80px;">
<h2>Authentication successful.</h2>
<p>You can close this window and return to the terminal.</p>
</body>
</html>"#;

/// Per-attempt data shared with the callback handler.
///
/// The sender is taken by the first request that reaches the handler, so at
/// most one outcome is ever delivered. Later requests are answered with 409.
pub struct CallbackContext {
    expected_state: String,
    sender: Mutex<Option<oneshot::Sender<CallbackOutcome>>>,
}

impl CallbackContext {
    /// Context for one attempt, plus the receiver its single outcome arrives on.
    pub fn new(expected_state: String) -> (Arc<Self>, oneshot::Receiver<CallbackOutcome>) {
        let (tx, rx) = oneshot::channel();
        let ctx = CallbackContext {
            expected_state,
            sender: Mutex::new(Some(tx)),
        };
        (Arc::new(ctx), rx)
    }
}

/// Handles the browser redirect.
///
/// Classifies the query, hands the outcome to the waiting flow and answers
/// the browser. Only the first request is delivered.
///
/// # Arguments
///
/// * `params` - Query parameters of the redirect (`state`, `code`, `error`)
/// * `ctx` - The attempt's [`CallbackContext`]
pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(ctx): Extension<Arc<CallbackContext>>,
) -> Response {
    let Some(sender) = ctx.sender.lock().await.take() else {
        debug!("callback received after the attempt was resolved");
        return (StatusCode::CONFLICT, "authorization already handled").into_response();
    };

    let outcome = classify(&ctx.expected_state, &params);
    let response = browser_response(&outcome);

    if sender.send(outcome).is_err() {
        warn!("authorization attempt ended before the callback was delivered");
    }
    response
}

/// Maps the callback query onto an outcome.
///
/// The state is checked first: an `error` or `code` that arrives with a
/// foreign state token is not trusted.
pub fn classify(expected_state: &str, params: &HashMap<String, String>) -> CallbackOutcome {
    if params.get("state").map(String::as_str) != Some(expected_state) {
        return CallbackOutcome::StateMismatch;
    }

    if let Some(error) = params.get("error") {
        let message = match params.get("error_description") {
            Some(description) if !description.is_empty() => format!("{error} ({description})"),
            _ => error.clone(),
        };
        return CallbackOutcome::Error(message);
    }

    match params.get("code") {
        Some(code) if !code.is_empty() => CallbackOutcome::Code(code.clone()),
        _ => CallbackOutcome::MissingCode,
    }
}

fn browser_response(outcome: &CallbackOutcome) -> Response {
    let message = match outcome {
        CallbackOutcome::Code(_) => return Html(SUCCESS_PAGE).into_response(),
        CallbackOutcome::StateMismatch => AuthError::InvalidState.to_string(),
        CallbackOutcome::Error(msg) => AuthError::Provider(msg.clone()).to_string(),
        CallbackOutcome::MissingCode => AuthError::MissingCode.to_string(),
        CallbackOutcome::Timeout | CallbackOutcome::Cancelled => {
            return (StatusCode::GONE, "authorization attempt expired").into_response();
        }
    };
    (StatusCode::BAD_REQUEST, message).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn matching_state_with_code() {
        let outcome = classify("abc", &params(&[("state", "abc"), ("code", "xyz")]));
        assert_eq!(outcome, CallbackOutcome::Code("xyz".into()));
    }

    #[test]
    fn foreign_state_wins_over_error_and_code() {
        let outcome = classify(
            "abc",
            &params(&[("state", "evil"), ("code", "xyz"), ("error", "access_denied")]),
        );
        assert_eq!(outcome, CallbackOutcome::StateMismatch);
        assert_eq!(classify("abc", &params(&[("code", "xyz")])), CallbackOutcome::StateMismatch);
    }

    #[test]
    fn provider_error_carries_description() {
        let outcome = classify("abc", &params(&[("state", "abc"), ("error", "access_denied")]));
        assert_eq!(outcome, CallbackOutcome::Error("access_denied".into()));

        let outcome = classify(
            "abc",
            &params(&[
                ("state", "abc"),
                ("error", "invalid_scope"),
                ("error_description", "bad scope"),
            ]),
        );
        assert_eq!(outcome, CallbackOutcome::Error("invalid_scope (bad scope)".into()));
    }

    #[test]
    fn empty_code_is_missing() {
        let outcome = classify("abc", &params(&[("state", "abc"), ("code", "")]));
        assert_eq!(outcome, CallbackOutcome::MissingCode);
        assert_eq!(classify("abc", &params(&[("state", "abc")])), CallbackOutcome::MissingCode);
    }
}
