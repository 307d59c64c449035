//! Shutdown coordination.
//!
//! One [`Shutdown`] handle is created at startup. The signal listener
//! triggers it and the HTTP server waits on a [`ShutdownSignal`]. The
//! triggered state is latched: a signal taken after the trigger resolves
//! immediately.

use std::sync::Arc;

use tokio::sync::watch;

/// Latched, cloneable shutdown trigger.
#[derive(Clone)]
pub struct Shutdown {
    state: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self {
            state: Arc::new(state),
        }
    }

    /// A future-producing handle that resolves once shutdown is triggered.
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            state: self.state.subscribe(),
        }
    }

    /// Latch the shutdown state. Returns `false` if it was already set.
    pub fn trigger(&self) -> bool {
        let first = !self.state.send_replace(true);
        if first {
            tracing::info!(waiting = self.state.receiver_count(), "Shutdown triggered");
        }
        first
    }

    pub fn is_triggered(&self) -> bool {
        *self.state.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Waiting side of [`Shutdown`].
pub struct ShutdownSignal {
    state: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Resolve once shutdown has been triggered.
    pub async fn wait(mut self) {
        // A dropped trigger can never fire, so that also ends the wait.
        let _ = self.state.wait_for(|triggered| *triggered).await;
    }
}
