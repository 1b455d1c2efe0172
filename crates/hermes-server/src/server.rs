//! HTTP/1 transport.
//!
//! A thin hyper adapter: each connection is served on its own task, each
//! request body is collected (up to the configured limit) and the request is
//! handed to the [`Dispatcher`].
//!
//! # Example
//!
//! ```rust,ignore
//! use hermes_server::{Dispatcher, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = Dispatcher::builder()
//!         // .service(...)
//!         .build()?;
//!     Server::new(dispatcher).run().await?;
//!     Ok(())
//! }
//! ```

use crate::dispatcher::Dispatcher;
use crate::response::{error_response, HttpResponse};
use crate::shutdown::{ConnectionTracker, ShutdownSignal};
use hermes_core::HermesError;
use http::Request;
use http_body_util::{BodyExt, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured address does not parse.
    #[error("invalid address {addr:?}: {source}")]
    InvalidAddress {
        /// The configured address.
        addr: String,
        /// Parse failure.
        #[source]
        source: std::net::AddrParseError,
    },

    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address.
        addr: SocketAddr,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },
}

/// Serves a [`Dispatcher`] over HTTP/1.
#[derive(Debug, Clone)]
pub struct Server {
    dispatcher: Arc<Dispatcher>,
}

impl Server {
    /// Wraps a dispatcher. The bind address and timeouts come from its
    /// configuration.
    #[must_use]
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Returns the dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Binds the configured address and serves until SIGTERM or SIGINT.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Binds the configured address and serves until `shutdown` fires.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let config = self.dispatcher.config();
        let addr = config.socket_addr().map_err(|source| ServerError::InvalidAddress {
            addr: config.http_addr().to_string(),
            source,
        })?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        serve_with_shutdown(listener, self.dispatcher, shutdown).await;
        Ok(())
    }
}

/// Serves connections from `listener` until SIGTERM or SIGINT.
pub async fn serve(listener: TcpListener, dispatcher: Arc<Dispatcher>) {
    serve_with_shutdown(listener, dispatcher, ShutdownSignal::with_os_signals()).await;
}

/// Serves connections from `listener` until `shutdown` fires, then waits up
/// to the configured shutdown timeout for open connections.
pub async fn serve_with_shutdown(listener: TcpListener, dispatcher: Arc<Dispatcher>, shutdown: ShutdownSignal) {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, endpoints = dispatcher.len(), "server listening");
    }
    let tracker = ConnectionTracker::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, remote_addr)) => {
                    let dispatcher = Arc::clone(&dispatcher);
                    let token = tracker.acquire();
                    let shutdown = shutdown.clone();
                    tokio::spawn(async move {
                        if let Err(e) = serve_connection(stream, dispatcher, shutdown).await {
                            tracing::debug!(%remote_addr, error = %e, "connection error");
                        }
                        drop(token);
                    });
                }
                Err(e) => tracing::error!(error = %e, "failed to accept connection"),
            },
            () = shutdown.recv() => {
                tracing::info!("shutdown signal received, no longer accepting connections");
                break;
            }
        }
    }

    let timeout = dispatcher.config().shutdown_timeout();
    tracing::info!(
        active = tracker.active_connections(),
        timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        "waiting for open connections"
    );
    tokio::select! {
        () = tracker.wait_idle() => tracing::info!("all connections closed"),
        () = tokio::time::sleep(timeout) => tracing::warn!(
            active = tracker.active_connections(),
            "shutdown timeout reached with connections still open"
        ),
    }
    tracing::info!("server stopped");
}

async fn serve_connection(
    stream: TcpStream,
    dispatcher: Arc<Dispatcher>,
    shutdown: ShutdownSignal,
) -> Result<(), hyper::Error> {
    let service = service_fn(move |request: Request<Incoming>| {
        let dispatcher = Arc::clone(&dispatcher);
        async move { Ok::<_, Infallible>(handle(&dispatcher, request).await) }
    });
    let connection = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
    tokio::pin!(connection);

    tokio::select! {
        result = connection.as_mut() => result,
        () = shutdown.recv() => {
            connection.as_mut().graceful_shutdown();
            connection.await
        }
    }
}

async fn handle(dispatcher: &Dispatcher, request: Request<Incoming>) -> HttpResponse {
    let (parts, body) = request.into_parts();
    let limit = dispatcher.config().max_body_bytes();
    match Limited::new(body, limit).collect().await {
        Ok(collected) => {
            let request = Request::from_parts(parts, collected.to_bytes());
            dispatcher.dispatch(request).await
        }
        Err(e) => {
            tracing::debug!(error = %e, path = %parts.uri.path(), "failed to read request body");
            error_response(&HermesError::bad_request(format!("failed to read request body: {e}")), None)
        }
    }
}
