//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Accept connections from a bound `Listener`
//! - Serve HTTP/1.1 and HTTP/2 per connection via hyper-util's auto builder
//! - Enforce the header read timeout (the only server-side deadline)
//! - Stop accepting on shutdown and drain open connections gracefully

use std::net::SocketAddr;
use std::time::Duration;

use axum::{extract::ConnectInfo, Router};
use hyper::{body::Incoming, service::service_fn, Request};
use hyper_util::{
    rt::{TokioExecutor, TokioIo, TokioTimer},
    server::conn::auto,
};
use tokio::net::TcpStream;
use tower::ServiceExt;

use crate::lifecycle::ShutdownSignal;
use crate::net::connection::ConnectionTracker;
use crate::net::listener::{ConnectionPermit, Listener};

/// Pause after a failed accept (e.g. out of file descriptors).
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// Serves one axum router on one listener.
pub struct HttpServer {
    name: &'static str,
    router: Router,
    header_read_timeout: Duration,
}

impl HttpServer {
    pub fn new(name: &'static str, router: Router, header_read_timeout: Duration) -> Self {
        Self {
            name,
            router,
            header_read_timeout,
        }
    }

    /// Run the accept loop until `shutdown` fires, then wait for open
    /// connections to finish their in-flight requests.
    pub async fn run(self, listener: Listener, mut shutdown: ShutdownSignal) {
        let tracker = ConnectionTracker::new();

        tracing::info!(
            server = self.name,
            address = %listener.local_addr(),
            "HTTP server starting"
        );

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer, permit) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            tracing::warn!(server = self.name, error = %e, "Accept failed");
                            tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                            continue;
                        }
                    };

                    let connection = Connection {
                        router: self.router.clone(),
                        header_read_timeout: self.header_read_timeout,
                        shutdown: shutdown.clone(),
                        permit,
                    };
                    let guard = tracker.track();
                    tokio::spawn(async move {
                        tracing::trace!(
                            connection_id = %guard.id(),
                            peer = %peer,
                            "Connection opened"
                        );
                        connection.serve(stream, peer).await;
                        drop(guard);
                    });
                }
                _ = shutdown.recv() => break,
            }
        }

        drop(listener);
        tracing::info!(
            server = self.name,
            open_connections = tracker.active_count(),
            "Stopped accepting, draining connections"
        );
        tracker.wait_for_drain().await;

        tracing::info!(server = self.name, "HTTP server stopped");
    }
}

/// State moved into each connection task.
struct Connection {
    router: Router,
    header_read_timeout: Duration,
    shutdown: ShutdownSignal,
    permit: ConnectionPermit,
}

impl Connection {
    async fn serve(self, stream: TcpStream, peer: SocketAddr) {
        let Connection {
            router,
            header_read_timeout,
            mut shutdown,
            permit: _permit,
        } = self;

        let service = service_fn(move |mut request: Request<Incoming>| {
            request.extensions_mut().insert(ConnectInfo(peer));
            router.clone().oneshot(request)
        });

        let mut builder = auto::Builder::new(TokioExecutor::new());
        builder
            .http1()
            .timer(TokioTimer::new())
            .header_read_timeout(header_read_timeout);

        let conn = builder.serve_connection_with_upgrades(TokioIo::new(stream), service);
        let mut conn = std::pin::pin!(conn);

        let result = tokio::select! {
            result = conn.as_mut() => result,
            _ = shutdown.recv() => {
                conn.as_mut().graceful_shutdown();
                conn.as_mut().await
            }
        };

        if let Err(e) = result {
            tracing::debug!(peer = %peer, error = %e, "Connection ended with error");
        }
    }
}
