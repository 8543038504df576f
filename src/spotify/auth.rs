use std::{future::Future, sync::Arc, time::Duration};

use tokio::{sync::oneshot, time::Instant};
use tracing::{debug, info};
use url::Url;

use crate::{
    api::CallbackContext,
    config::Endpoints,
    error::AuthError,
    server::CallbackServer,
    spotify::{
        browser::{BrowserLauncher, SystemBrowser},
        scopes::{self, Scope},
        token::TokenClient,
    },
    types::{CallbackOutcome, Credentials, TokenRecord},
    utils::{STATE_TOKEN_LENGTH, generate_state},
    warning,
};

/// How long an attempt waits for the browser redirect.
pub const DEFAULT_WAIT: Duration = Duration::from_secs(5 * 60);

/// Phases of a single Authorization Code attempt.
///
/// ```text
/// Idle -> Listening -> { CodeReceived | ErrorReceived | StateMismatch
///                      | MissingCode | TimedOut | Cancelled } -> Closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    Listening,
    CodeReceived,
    ErrorReceived,
    StateMismatch,
    MissingCode,
    TimedOut,
    Cancelled,
    Closed,
}

impl FlowState {
    /// Terminal phase reached for an outcome.
    pub fn after(outcome: &CallbackOutcome) -> FlowState {
        match outcome {
            CallbackOutcome::Code(_) => FlowState::CodeReceived,
            CallbackOutcome::Error(_) => FlowState::ErrorReceived,
            CallbackOutcome::StateMismatch => FlowState::StateMismatch,
            CallbackOutcome::MissingCode => FlowState::MissingCode,
            CallbackOutcome::Timeout => FlowState::TimedOut,
            CallbackOutcome::Cancelled => FlowState::Cancelled,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, FlowState::Idle | FlowState::Listening | FlowState::Closed)
    }

    pub fn can_advance_to(self, next: FlowState) -> bool {
        match (self, next) {
            (FlowState::Idle, FlowState::Listening) => true,
            (FlowState::Listening, n) => n.is_terminal(),
            (s, FlowState::Closed) => s.is_terminal(),
            _ => false,
        }
    }

    fn advance(&mut self, next: FlowState) {
        debug_assert!(
            self.can_advance_to(next),
            "invalid transition {self:?} -> {next:?}"
        );
        debug!(from = ?*self, to = ?next, "authorization flow transition");
        *self = next;
    }
}

/// Outbound half of an attempt: what the user is sent to authorize.
///
/// Lives only for one invocation and is never persisted.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub state: String,
    pub scopes: Vec<Scope>,
    pub redirect_uri: String,
}

impl AuthorizationRequest {
    /// New request for the full scope set with a fresh state token.
    pub fn new(redirect_uri: impl Into<String>) -> Result<Self, AuthError> {
        Ok(AuthorizationRequest {
            state: generate_state(STATE_TOKEN_LENGTH)?,
            scopes: Scope::ALL.to_vec(),
            redirect_uri: redirect_uri.into(),
        })
    }

    /// Authorization endpoint URL carrying the response type, client id,
    /// scopes, redirect URI and state.
    pub fn authorize_url(
        &self,
        authorize_endpoint: &str,
        client_id: &str,
    ) -> Result<Url, AuthError> {
        let mut url = Url::parse(authorize_endpoint).map_err(|e| {
            AuthError::Provider(format!("invalid authorization endpoint: {e}"))
        })?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", client_id)
            .append_pair("scope", &scopes::join(&self.scopes))
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("state", &self.state);
        Ok(url)
    }
}

impl CallbackOutcome {
    /// The authorization code, or the error describing why there is none.
    pub fn into_code(self, wait: Duration) -> Result<String, AuthError> {
        match self {
            CallbackOutcome::Code(code) => Ok(code),
            CallbackOutcome::Error(message) => Err(AuthError::Provider(message)),
            CallbackOutcome::StateMismatch => Err(AuthError::InvalidState),
            CallbackOutcome::MissingCode => Err(AuthError::MissingCode),
            CallbackOutcome::Timeout => Err(AuthError::Timeout(wait)),
            CallbackOutcome::Cancelled => Err(AuthError::Cancelled),
        }
    }
}

/// Interactive Authorization Code login.
///
/// Each [`run`](Self::run) binds the redirect URI's port, opens the browser,
/// waits for exactly one outcome (callback, deadline or cancellation) and
/// closes the listener before returning. Only on a valid code is the token
/// endpoint contacted. Concurrent runs against the same port are rejected at
/// bind time with [`AuthError::ListenerBind`].
pub struct AuthorizationCodeFlow {
    endpoints: Endpoints,
    wait: Duration,
    browser: Arc<dyn BrowserLauncher>,
    tokens: TokenClient,
}

impl AuthorizationCodeFlow {
    pub fn new(endpoints: Endpoints) -> Self {
        AuthorizationCodeFlow {
            tokens: TokenClient::new(endpoints.token_url.clone()),
            endpoints,
            wait: DEFAULT_WAIT,
            browser: Arc::new(SystemBrowser),
        }
    }

    /// Overrides the wait budget, [`DEFAULT_WAIT`] unless set.
    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    /// Replaces the system browser, e.g. with a launcher that only prints.
    pub fn with_browser(mut self, browser: impl BrowserLauncher + 'static) -> Self {
        self.browser = Arc::new(browser);
        self
    }

    /// Runs one attempt with no cancellation besides the wait budget.
    pub async fn run(&self, credentials: &Credentials) -> Result<TokenRecord, AuthError> {
        self.run_until(credentials, std::future::pending()).await
    }

    /// Like [`run`](Self::run), with `cancel` as an extra way to end the wait.
    ///
    /// Cancellation resolves the attempt as [`AuthError::Cancelled`] and goes
    /// through the same listener shutdown as every other outcome.
    pub async fn run_until<F>(
        &self,
        credentials: &Credentials,
        cancel: F,
    ) -> Result<TokenRecord, AuthError>
    where
        F: Future<Output = ()>,
    {
        credentials.ensure_configured()?;
        let redirect = credentials.redirect_url()?;

        let mut phase = FlowState::Idle;
        let request = AuthorizationRequest::new(credentials.redirect_uri.clone())?;
        let auth_url =
            request.authorize_url(&self.endpoints.authorize_url, &credentials.client_id)?;

        let (ctx, outcome_rx) = CallbackContext::new(request.state.clone());
        let server = CallbackServer::bind(&redirect, ctx).await?;
        phase.advance(FlowState::Listening);
        let deadline = Instant::now() + self.wait;
        info!(addr = %server.local_addr(), "waiting for authorization callback");

        self.launch_browser(&auth_url).await;

        let outcome = Self::await_outcome(outcome_rx, deadline, cancel).await;
        phase.advance(FlowState::after(&outcome));

        server.close().await;
        phase.advance(FlowState::Closed);

        let code = outcome.into_code(self.wait)?;
        self.tokens
            .exchange_code(credentials, &code, &request.redirect_uri)
            .await
    }

    /// Launchers may block, so they run off the async workers while the
    /// listener keeps serving.
    async fn launch_browser(&self, auth_url: &Url) {
        let browser = Arc::clone(&self.browser);
        let url = auth_url.to_string();
        let launched = tokio::task::spawn_blocking(move || browser.open(&url))
            .await
            .unwrap_or_else(|e| Err(e.to_string()));

        if let Err(e) = launched {
            debug!("browser launch failed: {}", e);
            warning!(
                "Failed to open browser. Please navigate to the following URL manually:\n{}",
                auth_url
            );
        }
    }

    /// Three-way wait. Whichever branch resolves first is the outcome; a
    /// callback arriving later finds the receiver gone and is discarded.
    async fn await_outcome<F>(
        outcome_rx: oneshot::Receiver<CallbackOutcome>,
        deadline: Instant,
        cancel: F,
    ) -> CallbackOutcome
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            received = outcome_rx => received.unwrap_or_else(|_| {
                CallbackOutcome::Error("callback listener stopped unexpectedly".to_string())
            }),
            _ = tokio::time::sleep_until(deadline) => CallbackOutcome::Timeout,
            _ = cancel => CallbackOutcome::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn authorize_url_carries_all_parameters() {
        let request = AuthorizationRequest::new("http://127.0.0.1:8888/callback").unwrap();
        let url = request
            .authorize_url("https://accounts.example.com/authorize", "client-1")
            .unwrap();
        let query: HashMap<String, String> = url.query_pairs().into_owned().collect();

        assert_eq!(query["response_type"], "code");
        assert_eq!(query["client_id"], "client-1");
        assert_eq!(query["redirect_uri"], "http://127.0.0.1:8888/callback");
        assert_eq!(query["state"], request.state);
        assert_eq!(query["state"].len(), STATE_TOKEN_LENGTH);
        assert!(query["scope"].starts_with("ugc-image-upload user-read-playback-state"));
        assert!(query["scope"].ends_with("user-read-email user-read-private"));
        assert_eq!(query["scope"].split(' ').count(), Scope::ALL.len());
    }

    #[test]
    fn transitions() {
        assert!(FlowState::Idle.can_advance_to(FlowState::Listening));
        assert!(FlowState::Listening.can_advance_to(FlowState::TimedOut));
        assert!(FlowState::StateMismatch.can_advance_to(FlowState::Closed));
        assert!(!FlowState::Idle.can_advance_to(FlowState::Closed));
        assert!(!FlowState::Listening.can_advance_to(FlowState::Closed));
        assert!(!FlowState::Closed.can_advance_to(FlowState::Listening));
    }

    #[test]
    fn outcome_errors() {
        let wait = DEFAULT_WAIT;
        assert_eq!(
            CallbackOutcome::Code("c".into()).into_code(wait).unwrap(),
            "c"
        );
        assert_eq!(
            CallbackOutcome::StateMismatch.into_code(wait).unwrap_err().to_string(),
            "invalid state parameter"
        );
        assert_eq!(
            CallbackOutcome::Error("access_denied".into())
                .into_code(wait)
                .unwrap_err()
                .to_string(),
            "authorization error: access_denied"
        );
        assert_eq!(
            CallbackOutcome::MissingCode.into_code(wait).unwrap_err().to_string(),
            "no authorization code received"
        );
        assert_eq!(
            CallbackOutcome::Timeout.into_code(wait).unwrap_err().to_string(),
            "authorization timeout after 5 minutes"
        );
    }
}
