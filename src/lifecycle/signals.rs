//! OS signal handling.
//!
//! # Responsibilities
//! - Translate process signals into worker events
//! - SIGINT/SIGTERM → shutdown broadcast
//! - SIGHUP → reload event (the worker rejects it with a warning; restart
//!   is the supported way to pick up changes)

use tokio::sync::mpsc::UnboundedSender;

use crate::lifecycle::shutdown::Shutdown;

/// A graceful-reload notification from the process runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadEvent;

/// Install signal handlers on the current-thread runtime.
///
/// Runs until a termination signal arrives, then triggers the shutdown
/// broadcast and exits. Reload signals are forwarded for as long as the
/// worker listens.
pub fn spawn_handlers(shutdown: Shutdown, reload: UnboundedSender<ReloadEvent>) {
    tokio::task::spawn_local(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let mut terminate = match signal(SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGTERM handler");
                    return;
                }
            };
            let mut hangup = match signal(SignalKind::hangup()) {
                Ok(s) => s,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGHUP handler");
                    return;
                }
            };

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Interrupt received");
                        shutdown.trigger();
                        break;
                    }
                    _ = terminate.recv() => {
                        tracing::info!("Termination signal received");
                        shutdown.trigger();
                        break;
                    }
                    _ = hangup.recv() => {
                        if reload.send(ReloadEvent).is_err() {
                            break;
                        }
                    }
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = reload;
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received");
                shutdown.trigger();
            }
        }
    });
}
