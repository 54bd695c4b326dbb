// Signal handling module
//
// The server does not install process hooks itself. The hosting binary waits
// here and then calls `ActuatorServer::stop`.
//
// - SIGTERM: graceful shutdown
// - SIGINT:  graceful shutdown (Ctrl+C)

use std::io;

/// Resolves on the first SIGTERM or SIGINT
#[cfg(unix)]
pub async fn wait_for_shutdown() -> io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => tracing::info!("SIGTERM received, initiating graceful shutdown"),
        _ = sigint.recv() => tracing::info!("SIGINT received, initiating graceful shutdown"),
    }
    Ok(())
}

/// Windows fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub async fn wait_for_shutdown() -> io::Result<()> {
    tokio::signal::ctrl_c().await?;
    tracing::info!("Ctrl+C received, initiating shutdown");
    Ok(())
}

/// Block the calling thread until a shutdown signal arrives
pub fn block_until_shutdown() -> io::Result<()> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(wait_for_shutdown())
}
