//! Short-lived local HTTP listener for OAuth redirects.
//!
//! One [`CallbackServer`] serves one authorization attempt. The listener is
//! bound before the browser is opened and is shut down with [`CallbackServer::close`]
//! before the flow returns, whatever the outcome. Dropping the server without
//! closing it still signals shutdown and aborts the serve task.

use std::{collections::HashMap, net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    Extension, Router,
    extract::Query,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{MethodRouter, get},
};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
use tracing::{debug, warn};
use url::Url;

use crate::{
    api::{self, CallbackContext},
    error::AuthError,
};

/// How long in-flight connections get to finish after shutdown is signalled.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

pub struct CallbackServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl CallbackServer {
    /// Binds the host and port of `redirect` and starts serving its path.
    ///
    /// The port is exclusive to this attempt: a second attempt on the same
    /// redirect URI fails with [`AuthError::ListenerBind`] while this one is
    /// open.
    pub async fn bind(redirect: &Url, ctx: Arc<CallbackContext>) -> Result<Self, AuthError> {
        let bind_addr = listen_addr(redirect)?;
        let listener =
            TcpListener::bind(&bind_addr)
                .await
                .map_err(|source| AuthError::ListenerBind {
                    addr: bind_addr.clone(),
                    source,
                })?;
        let addr = listener
            .local_addr()
            .map_err(|source| AuthError::ListenerBind {
                addr: bind_addr.clone(),
                source,
            })?;

        let path = match redirect.path() {
            "" => "/",
            p => p,
        };
        // Matched by hand: axum's route syntax would treat `:x`, `*x` or
        // `{x}` segments of a redirect path as captures.
        let callback_route: MethodRouter = get(route_callback);
        let app = Router::new()
            .fallback_service(callback_route)
            .layer(Extension(ctx))
            .layer(Extension(CallbackPath(Arc::from(path))));

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });
            if let Err(e) = server.await {
                warn!("callback listener stopped with error: {}", e);
            }
        });

        debug!(%addr, path, "callback listener bound");
        Ok(CallbackServer {
            addr,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }

    /// Address actually bound, with the real port when the redirect used `0`.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stops the listener and waits until the port is released.
    ///
    /// Shutdown is graceful first: in-flight requests get
    /// [`SHUTDOWN_GRACE`] to finish before the serve task is aborted. Either
    /// way the listening socket is gone when this returns.
    pub async fn close(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }

        if let Some(mut task) = self.task.take() {
            if tokio::time::timeout(SHUTDOWN_GRACE, &mut task).await.is_err() {
                warn!("callback listener did not stop in time, aborting");
                task.abort();
                let _ = task.await;
            }
        }
        debug!(addr = %self.addr, "callback listener closed");
    }
}

impl Drop for CallbackServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Percent-encoded path the listener answers on.
#[derive(Clone)]
struct CallbackPath(Arc<str>);

async fn route_callback(
    uri: Uri,
    Extension(CallbackPath(expected)): Extension<CallbackPath>,
    query: Query<HashMap<String, String>>,
    ctx: Extension<Arc<CallbackContext>>,
) -> Response {
    if uri.path() != &*expected {
        debug!(path = uri.path(), "request outside the callback path");
        return StatusCode::NOT_FOUND.into_response();
    }
    api::callback(query, ctx).await
}

/// `host:port` to bind for a redirect URI.
///
/// Only plain `http` redirects can be served locally. `localhost` is bound
/// on the IPv4 loopback address.
pub fn listen_addr(redirect: &Url) -> Result<String, AuthError> {
    let invalid = |reason: &str| AuthError::InvalidRedirectUri {
        uri: redirect.to_string(),
        reason: reason.to_string(),
    };

    if redirect.scheme() != "http" {
        return Err(invalid("only http redirect URIs can be served locally"));
    }

    let host = match redirect.host_str() {
        Some("localhost") => "127.0.0.1",
        Some(host) => host,
        None => return Err(invalid("missing host")),
    };
    let port = redirect
        .port_or_known_default()
        .ok_or_else(|| invalid("missing port"))?;

    // IPv6 literals keep their brackets in host_str
    Ok(format!("{host}:{port}"))
}
