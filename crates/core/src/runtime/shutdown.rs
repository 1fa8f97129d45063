use tokio::signal;
use tokio::task::JoinHandle;

use crate::io::input::{self, PerceptionSender};

/// Requests a runtime shutdown by injecting the sentinel perception into its queue.
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    tx: PerceptionSender,
}

impl ShutdownTrigger {
    pub fn new(tx: PerceptionSender) -> Self {
        Self { tx }
    }

    /// Returns false if the runtime is already gone.
    pub async fn trigger(&self) -> bool {
        input::submit_shutdown(&self.tx).await.is_ok()
    }

    /// Spawn a background task that listens for OS signals and triggers shutdown.
    pub fn spawn_signal_listener(&self) -> JoinHandle<()> {
        let trigger = self.clone();
        tokio::spawn(async move {
            #[cfg(unix)]
            {
                let mut sigterm =
                    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                        Ok(sigterm) => sigterm,
                        Err(e) => {
                            tracing::warn!(error = %e, "failed to register SIGTERM handler");
                            return;
                        }
                    };
                tokio::select! {
                    _ = sigterm.recv() => tracing::info!("received SIGTERM, initiating shutdown"),
                    _ = signal::ctrl_c() => tracing::info!("received SIGINT, initiating shutdown"),
                }
            }
            #[cfg(not(unix))]
            {
                let _ = signal::ctrl_c().await;
                tracing::info!("received Ctrl+C, initiating shutdown");
            }
            if !trigger.trigger().await {
                tracing::debug!("runtime already stopped");
            }
        })
    }
}
