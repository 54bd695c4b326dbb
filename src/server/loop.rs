// Server loop module
// Accepts connections until stop() is requested, then drains within the grace period

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;

use super::connection::{accept_connection, shutdown_requested, ConnectionTracker, ServeContext};
use crate::logger;

/// Accept loop run on the server thread's runtime.
///
/// Returns after the listener is closed and in-flight connections finished or
/// the grace period elapsed. Connections still running at that point are
/// dropped together with the runtime.
pub async fn start_server_loop(
    listener: TcpListener,
    ctx: Arc<ServeContext>,
    mut shutdown: watch::Receiver<bool>,
    grace_period: Duration,
) {
    let tracker = Arc::new(ConnectionTracker::default());

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &ctx, &tracker, shutdown.clone());
                    }
                    Err(e) => logger::log_accept_error(&e),
                }
            }

            () = shutdown_requested(&mut shutdown) => break,
        }
    }

    // Refuse new connections before waiting on the old ones
    drop(listener);

    if tokio::time::timeout(grace_period, tracker.wait_idle())
        .await
        .is_err()
    {
        logger::log_drain_timeout(tracker.active());
    }
}
