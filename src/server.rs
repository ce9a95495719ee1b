//! The accept loop and connection draining.
//!
//! Every accepted connection runs in its own task and speaks HTTP/1.1 or
//! HTTP/2, whichever the viewer negotiates. Stopping takes two steps. Once
//! the shutdown future resolves the listener is closed, so new connects are
//! refused. A `watch` flag then asks each connection task to shut down
//! gracefully: responses already in flight complete and idle keep-alive
//! connections close at once. [`Server::serve_with_shutdown`] returns when
//! the last task has exited.
//!
//! [`Server::serve`] uses SIGTERM or SIGINT as the shutdown future, which
//! fits inside a pod's termination grace period.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::edge::Edge;
use crate::error::Error;
use crate::middleware::trace;
use crate::response::EdgeBody;

enum Bind {
    Addr(SocketAddr),
    Listener(TcpListener),
}

/// The edge HTTP server.
pub struct Server {
    bind: Bind,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// ```rust,no_run
    /// use spa_edge::Server;
    /// let server = Server::bind(([0, 0, 0, 0], 8080).into());
    /// ```
    pub fn bind(addr: SocketAddr) -> Self {
        Self { bind: Bind::Addr(addr) }
    }

    /// Serves on an already bound listener (e.g. port `0` in tests).
    pub fn from_listener(listener: TcpListener) -> Self {
        Self { bind: Bind::Listener(listener) }
    }

    /// Serves until SIGTERM or Ctrl-C, then drains.
    pub async fn serve(self, edge: Edge) -> Result<(), Error> {
        self.serve_with_shutdown(edge, shutdown_signal()).await
    }

    /// Serves until `signal` resolves, then drains.
    pub async fn serve_with_shutdown(
        self,
        edge: Edge,
        signal: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        let listener = match self.bind {
            Bind::Addr(addr) => TcpListener::bind(addr).await?,
            Bind::Listener(listener) => listener,
        };
        let addr = listener.local_addr()?;

        let edge = Arc::new(edge);

        info!(
            %addr,
            api_prefix = edge.rules().api_prefix(),
            entry_document = edge.rules().entry_document(),
            "spa-edge listening"
        );

        // Flipped to `true` once shutdown starts; every connection task
        // watches it.
        let (drain_tx, drain_rx) = watch::channel(false);

        let mut tasks = tokio::task::JoinSet::new();

        tokio::pin!(signal);

        loop {
            tokio::select! {
                // Shutdown first so a SIGTERM stops accepting immediately,
                // even if more connections are queued.
                biased;

                () = &mut signal => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, peer) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let edge = Arc::clone(&edge);
                    let mut drain = drain_rx.clone();
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on the connection.
                        let svc = service_fn(move |req| {
                            let edge = Arc::clone(&edge);
                            async move { dispatch(edge, req, peer).await }
                        });

                        // HTTP/1.1 or HTTP/2, whichever the client negotiates.
                        let builder = ConnBuilder::new(TokioExecutor::new());
                        let conn = builder.serve_connection(io, svc);
                        tokio::pin!(conn);

                        let res = tokio::select! {
                            res = conn.as_mut() => res,
                            _ = drain.changed() => {
                                debug!(%peer, "closing connection for shutdown");
                                conn.as_mut().graceful_shutdown();
                                conn.await
                            }
                        };
                        if let Err(e) = res {
                            error!(%peer, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        drop(listener);

        // No receiver left is fine: it means no connection is open.
        let _ = drain_tx.send(true);
        while tasks.join_next().await.is_some() {}

        info!("spa-edge stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Routes one request and produces one response.
///
/// Every failure is already a response (404, 502, …), so hyper never sees
/// an error.
async fn dispatch(
    edge: Arc<Edge>,
    req: hyper::Request<Incoming>,
    peer: SocketAddr,
) -> Result<http::Response<EdgeBody>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    Ok(trace::traced(&method, &path, peer, edge.handle(req, peer)).await)
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Waits until the process is asked to stop: SIGINT anywhere, SIGTERM on
/// Unix as well. A source whose handler cannot be installed is logged and
/// never fires.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("cannot listen for SIGINT: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("cannot listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => info!(signal = "SIGINT", "stop requested"),
        () = terminate => info!(signal = "SIGTERM", "stop requested"),
    }
}
