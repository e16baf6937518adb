use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

/// A flag set by SIGINT/SIGTERM and polled at cycle boundaries. Services
/// never abort mid-cycle on a signal — they finish the current cycle,
/// write `status=stopped`, and exit cleanly, matching the spec's
/// "cancellation only at cycle boundaries" model.
#[derive(Clone)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        ShutdownFlag(Arc::new(AtomicBool::new(false)))
    }

    pub fn requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Spawns a task that sets the flag on the first SIGINT or SIGTERM.
    pub fn install_signal_handlers(&self) -> std::io::Result<()> {
        let flag = self.clone();
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::spawn(async move {
            tokio::select! {
                _ = sigint.recv() => info!("received SIGINT, shutting down after current cycle"),
                _ = sigterm.recv() => info!("received SIGTERM, shutting down after current cycle"),
            }
            flag.request();
        });
        Ok(())
    }
}

impl Default for ShutdownFlag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unrequested_and_latches_true() {
        let flag = ShutdownFlag::new();
        assert!(!flag.requested());
        flag.request();
        assert!(flag.requested());
    }
}
