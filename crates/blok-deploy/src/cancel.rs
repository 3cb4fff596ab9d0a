//! Cooperative cancellation for local waits.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

/// Handle for requesting cancellation.
#[derive(Debug, Clone)]
pub struct CancellationHandle {
    cancelled: Arc<AtomicBool>,
    sender: broadcast::Sender<()>,
}

impl CancellationHandle {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            sender,
        }
    }

    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            let _ = self.sender.send(());
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn signal(&self) -> CancellationSignal {
        CancellationSignal {
            cancelled: self.cancelled.clone(),
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for CancellationHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side, handed to whatever waits.
#[derive(Debug)]
pub struct CancellationSignal {
    cancelled: Arc<AtomicBool>,
    receiver: broadcast::Receiver<()>,
}

impl CancellationSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        CancellationHandle::new().signal()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once cancelled; immediately if already cancelled.
    pub async fn cancelled(&mut self) {
        if self.is_cancelled() {
            return;
        }
        // A closed channel means the handle is gone and cancel can no longer
        // be requested.
        if self.receiver.recv().await.is_err() && !self.is_cancelled() {
            std::future::pending::<()>().await;
        }
    }
}

impl Clone for CancellationSignal {
    fn clone(&self) -> Self {
        Self {
            cancelled: self.cancelled.clone(),
            receiver: self.receiver.resubscribe(),
        }
    }
}
