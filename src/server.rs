//! HTTP front door and server loop.
//!
//! Every connection funnels through [`respond`]: cross-origin headers on
//! all responses, immediate `204` for preflight, route dispatch, body
//! decoding for mutating methods, and normalization of every failure into
//! the JSON error envelope. Handlers never talk to hyper directly.
//!
//! Shutdown is graceful: on SIGTERM or Ctrl-C the listener stops accepting
//! and every in-flight connection drains before [`Server::serve`] returns.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    HeaderValue,
};
use http::{Method, StatusCode};
use http_body_util::Full;
use hyper::body::Body;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::body;
use crate::error::Error;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

const ALLOW_ORIGIN: &str = "*";
const ALLOW_METHODS: &str = "GET,POST,OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type,Authorization";

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    pub fn bind(addr: SocketAddr) -> Self {
        Self { addr }
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// The route table is frozen here: it is moved in by value, wrapped in
    /// an `Arc`, and shared read-only across connection tasks. Returns only
    /// after a full graceful shutdown.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let router = Arc::new(router);

        info!(addr = %self.addr, "souk listening");

        // JoinSet tracks every connection task so shutdown can drain them.
        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // `biased` checks shutdown first so a signal stops the
                // accept loop even with connections queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        let svc = service_fn(move |req| {
                            let router = Arc::clone(&router);
                            async move {
                                Ok::<_, std::convert::Infallible>(respond(router.as_ref(), req).await)
                            }
                        });

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished tasks so the JoinSet stays bounded.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("souk stopped");
        Ok(())
    }
}

// ── Front door ────────────────────────────────────────────────────────────────

/// Handles one request end to end and always produces a response.
///
/// Public so integration tests can drive the full pipeline with an in-memory
/// body instead of a live socket; the server loop calls it with
/// `hyper::body::Incoming`.
pub async fn respond<B>(router: &Router, req: http::Request<B>) -> http::Response<Full<Bytes>>
where
    B: Body + Unpin,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let response = if method == Method::OPTIONS {
        // Preflight: no routing, empty 204.
        Response::status(StatusCode::NO_CONTENT)
    } else {
        handle(router, req).await
    };

    let mut response = response.into_http();
    apply_cors(response.headers_mut());
    debug!(%method, %path, status = response.status().as_u16(), "request handled");
    response
}

/// Routes, decodes, and invokes — the non-preflight half of the front door.
async fn handle<B>(router: &Router, req: http::Request<B>) -> Response
where
    B: Body + Unpin,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let query = Request::parse_query(req.uri().query());

    let Some((handler, params)) = router.lookup(&method, &path) else {
        return Response::error(StatusCode::NOT_FOUND, "Not Found");
    };

    // Only mutating methods carry a payload; everything else skips the
    // stream entirely.
    let decoded = if method == Method::POST || method == Method::PUT || method == Method::PATCH {
        body::decode(req.into_body()).await
    } else {
        Ok(None)
    };

    let payload = match decoded {
        Ok(payload) => payload,
        Err(e) => {
            error!(%method, %path, "body decode failed: {e}");
            return Response::error(e.status(), &e.to_string());
        }
    };

    let request = Request::new(method.clone(), path.clone(), params, query, payload);
    match handler.call(request).await {
        Ok(response) => response,
        Err(e) => {
            error!(%method, %path, "handler failed: {e}");
            Response::error(e.status(), &e.to_string())
        }
    }
}

/// The permissive cross-origin policy, applied to every response
/// unconditionally — success, failure, and preflight alike.
fn apply_cors(headers: &mut http::HeaderMap) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static(ALLOW_ORIGIN));
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS));
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS));
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal: SIGTERM (orchestrators) or
/// Ctrl-C (local dev). On non-Unix platforms only Ctrl-C is available.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
