//! Hold/release gates for pausing fake gateway operations mid-flight.

use std::sync::Arc;

use tokio::sync::Semaphore;

/// Handle to a gate holding one fake operation open.
///
/// While the handle is unreleased, calls to the gated operation suspend at
/// the gateway boundary, which lets tests observe the window between
/// "request issued" and "response applied".
#[derive(Debug, Clone)]
pub struct HoldHandle {
    semaphore: Arc<Semaphore>,
}

impl HoldHandle {
    pub(crate) fn new() -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(0)),
        }
    }

    pub(crate) fn semaphore(&self) -> Arc<Semaphore> {
        Arc::clone(&self.semaphore)
    }

    /// Lets every held and future call through.
    pub fn release(&self) {
        self.semaphore.add_permits(Semaphore::MAX_PERMITS / 2);
    }
}

/// Suspends until the gate is released, if a gate is present.
pub(crate) async fn wait(gate: Option<Arc<Semaphore>>) {
    if let Some(semaphore) = gate {
        // The permit is returned on drop so later held calls pass too.
        let _permit = semaphore.acquire().await;
    }
}
