//! Signal handling for graceful shutdown.

use anyhow::{Context, Result};
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;
use tracing::info;

/// Set up signal handlers for graceful shutdown.
///
/// Returns a receiver that will receive a message when a shutdown
/// signal (SIGTERM, SIGINT) is received.
pub fn setup_signal_handlers() -> Result<mpsc::Receiver<()>> {
    let (tx, rx) = mpsc::channel(1);

    let mut terminate =
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
    let mut interrupt =
        signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?;

    let tx_term = tx.clone();
    tokio::spawn(async move {
        terminate.recv().await;
        info!("Received SIGTERM");
        let _ = tx_term.send(()).await;
    });

    let tx_int = tx;
    tokio::spawn(async move {
        interrupt.recv().await;
        info!("Received SIGINT");
        let _ = tx_int.send(()).await;
    });

    Ok(rx)
}
