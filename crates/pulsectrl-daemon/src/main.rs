//! pulsectrl - volume control daemon for the default sink and source.
//!
//! Reads commands such as `sink change 0.05` on stdin, applies them to the
//! audio server's current default devices, and reports default-device and
//! volume changes on stdout. Diagnostics go to stderr.

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod input;
mod output;
mod signals;

use pulsectrl_core::SessionState;
use pulsectrl_pulse::{PulseRuntime, SessionEvent};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first so it can set the log level
    let config_path = config::config_path()?;
    let config = config::load_from(&config_path)?;

    // Initialize logging; stdout is reserved for notifications
    let level = &config.daemon.log_level;
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("pulsectrl={level}").parse()?)
                .add_directive(format!("pulsectrl_pulse={level}").parse()?),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting pulsectrl");
    if config_path.exists() {
        info!(?config_path, "Configuration loaded");
    } else {
        info!(?config_path, "Config file not found, using defaults");
    }

    // Spawn the audio server session
    let (runtime, mut session_rx) = PulseRuntime::spawn(config.session.to_session_config());

    // Read commands on a dedicated thread
    let _input = input::spawn_stdin_reader(runtime.commands());

    // Set up signal handling
    let mut shutdown_rx = signals::setup_signal_handlers()?;

    let mut stdout = tokio::io::stdout();

    loop {
        tokio::select! {
            event = session_rx.recv() => {
                match event {
                    Some(SessionEvent::Notification(notification)) => {
                        if let Err(e) = output::write_notification(&mut stdout, &notification).await {
                            error!(error = %e, "Failed to write notification");
                            break;
                        }
                    }
                    Some(SessionEvent::StateChanged(state)) => match state {
                        SessionState::Ready => info!("Audio server session ready"),
                        SessionState::Failed => warn!("Audio server unavailable, will retry"),
                        SessionState::Connecting | SessionState::Disconnected => {
                            debug!(%state, "Session state changed");
                        }
                    },
                    None => {
                        error!("Session thread stopped unexpectedly");
                        break;
                    }
                }
            }

            // Handle shutdown signal
            _ = shutdown_rx.recv() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    // Cleanup
    info!("Shutting down...");
    runtime.shutdown();
    drop(session_rx);
    tokio::task::spawn_blocking(move || runtime.join())
        .await
        .context("Failed to join session thread")?;

    info!("pulsectrl stopped");
    Ok(())
}
