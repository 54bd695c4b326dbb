// Server lifecycle module
// Owns the listening socket, the server thread and the idempotent stop flag

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;

use super::connection::ServeContext;
use super::listener::bind_listener;
use super::server_loop::start_server_loop;
use crate::actuator::Providers;
use crate::config::Config;
use crate::error::ServerError;
use crate::handler::Dispatcher;
use crate::logger;

/// How long `stop()` waits for runtime threads once the grace period is over
const FORCE_CLOSE_TIMEOUT: Duration = Duration::from_millis(500);

/// Embedded actuator HTTP server
///
/// Serves `/actuator/health`, `/actuator/metrics` and `/actuator/env` from one
/// background thread. The server never registers process hooks itself; the
/// host decides when to call [`ActuatorServer::stop`]. Dropping the server
/// stops it as well.
#[derive(Debug)]
pub struct ActuatorServer {
    local_addr: SocketAddr,
    grace_period: Duration,
    stopping: AtomicBool,
    shutdown: watch::Sender<bool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ActuatorServer {
    /// Start the server only when `actuator.enabled` is set
    pub fn start_if_enabled(
        config: &Config,
        providers: Providers,
    ) -> Result<Option<Self>, ServerError> {
        if !config.actuator.enabled {
            logger::log_server_disabled();
            return Ok(None);
        }
        Self::start(config, providers).map(Some)
    }

    /// Bind `server.host:server.port` and start serving on a new thread.
    ///
    /// Any failure here is fatal and returned as is; nothing is retried.
    pub fn start(config: &Config, providers: Providers) -> Result<Self, ServerError> {
        let addr = config.get_socket_addr()?;
        let std_listener = bind_listener(addr)?;
        let local_addr = std_listener.local_addr().map_err(ServerError::Listener)?;

        let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
        runtime_builder.enable_all().thread_name("actuator-worker");
        if let Some(workers) = config.worker_threads()? {
            runtime_builder.worker_threads(workers.get());
        }
        let runtime = runtime_builder.build().map_err(ServerError::Runtime)?;

        let listener = {
            let _enter = runtime.enter();
            TcpListener::from_std(std_listener).map_err(ServerError::Listener)?
        };

        let ctx = Arc::new(ServeContext::new(config, Dispatcher::new(providers)));
        let grace_period = config.grace_period();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        logger::log_server_start(&local_addr, config);

        let worker = std::thread::Builder::new()
            .name("actuator-http".to_string())
            .spawn(move || {
                runtime.block_on(start_server_loop(listener, ctx, shutdown_rx, grace_period));
                // Connections that outlived the grace period are cancelled here.
                // A provider still blocking keeps its pool thread but can no
                // longer reach a socket.
                runtime.shutdown_timeout(FORCE_CLOSE_TIMEOUT);
            })
            .map_err(ServerError::Spawn)?;

        Ok(Self {
            local_addr,
            grace_period,
            stopping: AtomicBool::new(false),
            shutdown: shutdown_tx,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Address the listener is bound to
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::Acquire)
    }

    /// Stop accepting, drain in-flight connections and join the server thread.
    ///
    /// Only the first call does anything; later or concurrent calls return at
    /// once. The first call returns within the grace period plus a short
    /// force-close window, even when a provider never returns. By then the
    /// port is closed and no further response will be written. Must not be
    /// called from inside a provider.
    pub fn stop(&self) {
        if self
            .stopping
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        logger::log_server_stopping(self.grace_period);
        self.shutdown.send_replace(true);

        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            if worker.join().is_err() {
                tracing::error!("Actuator server thread panicked");
            }
        }

        logger::log_server_stopped();
    }
}

impl Drop for ActuatorServer {
    fn drop(&mut self) {
        self.stop();
    }
}
