//! Request routing dispatch module
//!
//! Entry point for actuator requests: method filter, prefix strip, exact
//! route lookup and JSON serialization of provider results.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::USER_AGENT;
use hyper::{Method, Request, Response};
use serde::Serialize;

use crate::actuator::Providers;
use crate::config::LoggingConfig;
use crate::error::DispatchError;
use crate::http;
use crate::logger::{self, AccessLogEntry};

/// Every endpoint lives under this prefix
pub const ACTUATOR_PREFIX: &str = "/actuator";

/// Handler bound to one literal path suffix
type RouteHandler = fn(&Providers) -> Result<Vec<u8>, DispatchError>;

/// Immutable route table plus the providers it serves
///
/// Built once and shared across connection tasks through `Arc`.
pub struct Dispatcher {
    routes: HashMap<&'static str, RouteHandler>,
    providers: Providers,
}

impl Dispatcher {
    pub fn new(providers: Providers) -> Self {
        let mut routes: HashMap<&'static str, RouteHandler> = HashMap::with_capacity(3);
        routes.insert("/health", check_healths);
        routes.insert("/metrics", list_metrics);
        routes.insert("/env", environment);
        Self { routes, providers }
    }

    /// Resolve one request to a response
    ///
    /// Routing misses and non-GET methods yield a 404. Provider failures are
    /// returned as errors and never turned into a response.
    pub fn dispatch(
        &self,
        method: &Method,
        path: &str,
    ) -> Result<Response<Full<Bytes>>, DispatchError> {
        if !method.as_str().eq_ignore_ascii_case("GET") {
            return Ok(http::build_404_response());
        }

        let Some(suffix) = path.strip_prefix(ACTUATOR_PREFIX) else {
            return Ok(http::build_404_response());
        };
        tracing::debug!(path, suffix, "resolved path");

        match self.routes.get(suffix) {
            Some(handler) => handler(&self.providers).map(http::build_json_response),
            None => Ok(http::build_404_response()),
        }
    }

    /// Path suffixes served below [`ACTUATOR_PREFIX`]
    pub fn endpoints(&self) -> Vec<&'static str> {
        let mut endpoints: Vec<_> = self.routes.keys().copied().collect();
        endpoints.sort_unstable();
        endpoints
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("endpoints", &self.endpoints())
            .field("providers", &self.providers)
            .finish()
    }
}

fn check_healths(providers: &Providers) -> Result<Vec<u8>, DispatchError> {
    let healths = providers
        .health
        .iter()
        .map(|slot| slot.as_ref().map(|indicator| indicator.health()).transpose())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| DispatchError::Provider {
            endpoint: "/health",
            source,
        })?;
    to_json("/health", &healths)
}

fn list_metrics(providers: &Providers) -> Result<Vec<u8>, DispatchError> {
    let names = providers
        .metrics
        .metric_names()
        .map_err(|source| DispatchError::Provider {
            endpoint: "/metrics",
            source,
        })?;
    to_json("/metrics", &names)
}

fn environment(providers: &Providers) -> Result<Vec<u8>, DispatchError> {
    let snapshot = providers
        .environment
        .snapshot()
        .map_err(|source| DispatchError::Provider {
            endpoint: "/env",
            source,
        })?;
    to_json("/env", &snapshot)
}

fn to_json<T: Serialize + ?Sized>(
    endpoint: &'static str,
    value: &T,
) -> Result<Vec<u8>, DispatchError> {
    serde_json::to_vec(value).map_err(|source| DispatchError::Serialize { endpoint, source })
}

/// Main entry point for HTTP request handling
///
/// Providers are synchronous and may block, so dispatch runs on the blocking
/// pool instead of a runtime worker. The request body is never read. An `Err`
/// makes hyper abort the connection.
pub async fn handle_request<B: Body>(
    req: Request<B>,
    dispatcher: Arc<Dispatcher>,
    logging: Arc<LoggingConfig>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, DispatchError> {
    let started = Instant::now();
    tracing::debug!(uri = %req.uri(), "requestURI");

    let path = req.uri().path();
    let result = {
        let method = req.method().clone();
        let owned_path = path.to_string();
        tokio::task::spawn_blocking(move || dispatcher.dispatch(&method, &owned_path))
            .await
            .unwrap_or_else(|source| {
                Err(DispatchError::Aborted {
                    path: path.to_string(),
                    source,
                })
            })
    };

    match &result {
        Ok(resp) if logging.access_log => {
            let mut entry = AccessLogEntry::new(
                peer_addr.to_string(),
                req.method().to_string(),
                path.to_string(),
            );
            entry.http_version = version_label(req.version()).to_string();
            entry.status = resp.status().as_u16();
            entry.body_bytes = usize::try_from(resp.body().size_hint().exact().unwrap_or(0))
                .unwrap_or(usize::MAX);
            entry.user_agent = req
                .headers()
                .get(USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string);
            entry.request_time_us =
                u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
            logger::log_access(&entry, &logging.access_log_format);
        }
        Ok(_) => {}
        Err(e) => logger::log_dispatch_error(path, e),
    }

    result
}

const fn version_label(version: hyper::Version) -> &'static str {
    match version {
        hyper::Version::HTTP_09 => "0.9",
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        hyper::Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
