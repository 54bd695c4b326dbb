// Connection handling module
// Serves one accepted TCP connection and tracks how many are in flight

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::sync::{watch, Notify};

use crate::config::{Config, LoggingConfig};
use crate::handler::{self, Dispatcher};
use crate::logger;

/// Everything a connection task needs, shared read-only
#[derive(Debug)]
pub struct ServeContext {
    pub dispatcher: Arc<Dispatcher>,
    pub logging: Arc<LoggingConfig>,
    pub read_timeout: Duration,
    /// `None` serves one request per connection
    pub keep_alive_timeout: Option<Duration>,
}

impl ServeContext {
    pub fn new(config: &Config, dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            logging: Arc::new(config.logging.clone()),
            read_timeout: config.read_timeout(),
            keep_alive_timeout: config.keep_alive_timeout(),
        }
    }
}

/// Counts connections still being served
#[derive(Debug, Default)]
pub struct ConnectionTracker {
    active: AtomicUsize,
    idle: Notify,
}

impl ConnectionTracker {
    pub fn track(self: &Arc<Self>) -> ConnectionGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        ConnectionGuard(Arc::clone(self))
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Resolves once no connection is in flight
    pub async fn wait_idle(&self) {
        loop {
            // Register before checking so a release in between is not missed
            let notified = self.idle.notified();
            if self.active() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Decrements the tracker when the connection task ends or is dropped
#[derive(Debug)]
pub struct ConnectionGuard(Arc<ConnectionTracker>);

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if self.0.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

/// Request activity on a single connection
#[derive(Debug)]
pub struct RequestActivity {
    in_flight: AtomicUsize,
    last_done: Mutex<Instant>,
}

impl RequestActivity {
    pub fn new() -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            last_done: Mutex::new(Instant::now()),
        }
    }

    pub fn begin(self: &Arc<Self>) -> RequestGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        RequestGuard(Arc::clone(self))
    }

    /// When the connection went idle, `None` while a request is running
    pub fn idle_since(&self) -> Option<Instant> {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            return None;
        }
        Some(*self.last_done.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Default for RequestActivity {
    fn default() -> Self {
        Self::new()
    }
}

/// Marks the connection idle again once the handler finishes
#[derive(Debug)]
pub struct RequestGuard(Arc<RequestActivity>);

impl Drop for RequestGuard {
    fn drop(&mut self) {
        *self.0.last_done.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Resolves once the connection has been idle for `limit`; never without a limit
pub async fn keep_alive_expired(activity: &RequestActivity, limit: Option<Duration>) {
    let Some(limit) = limit else {
        return std::future::pending().await;
    };

    loop {
        let idle_since = activity.idle_since().unwrap_or_else(Instant::now);
        let Some(deadline) = idle_since.checked_add(limit) else {
            return std::future::pending().await;
        };
        tokio::time::sleep_until(deadline.into()).await;

        if activity
            .idle_since()
            .is_some_and(|since| since.elapsed() >= limit)
        {
            return;
        }
    }
}

/// Resolves once `stop()` has been requested or the sender is gone
pub async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        let stop = *shutdown.borrow_and_update();
        if stop || shutdown.changed().await.is_err() {
            return;
        }
    }
}

/// Spawn a task serving one accepted connection.
///
/// The connection is asked to shut down gracefully when `stop()` is requested
/// or once it sat idle for the keep-alive timeout: an in-flight request still
/// gets its response, idle connections close right away. Slow request heads
/// are cut off by hyper after the read timeout.
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    ctx: &Arc<ServeContext>,
    tracker: &Arc<ConnectionTracker>,
    mut shutdown: watch::Receiver<bool>,
) {
    logger::log_connection_accepted(&peer_addr);

    let guard = tracker.track();
    let ctx = Arc::clone(ctx);

    tokio::spawn(async move {
        let _guard = guard;
        let io = TokioIo::new(stream);
        let activity = Arc::new(RequestActivity::new());

        let mut builder = http1::Builder::new();
        builder
            .timer(TokioTimer::new())
            .header_read_timeout(ctx.read_timeout)
            .keep_alive(ctx.keep_alive_timeout.is_some());

        let service_ctx = Arc::clone(&ctx);
        let service_activity = Arc::clone(&activity);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let busy = service_activity.begin();
                let response = handler::handle_request(
                    req,
                    Arc::clone(&service_ctx.dispatcher),
                    Arc::clone(&service_ctx.logging),
                    peer_addr,
                );
                async move {
                    let _busy = busy;
                    response.await
                }
            }),
        );
        tokio::pin!(conn);

        let result = tokio::select! {
            result = conn.as_mut() => result,
            () = shutdown_requested(&mut shutdown) => {
                conn.as_mut().graceful_shutdown();
                conn.as_mut().await
            }
            () = keep_alive_expired(&activity, ctx.keep_alive_timeout) => {
                logger::log_keep_alive_expired(&peer_addr);
                conn.as_mut().graceful_shutdown();
                conn.as_mut().await
            }
        };

        if let Err(err) = result {
            logger::log_connection_error(&err);
        }
    });
}
