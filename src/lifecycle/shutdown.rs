//! Shutdown and cancellation coordination.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that long-running tasks (the HTTP server, an
/// in-flight transfer run) subscribe to. The trigger is latched, so a signal
/// taken after shutdown started is already triggered.
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
    triggered: AtomicBool,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            triggered: AtomicBool::new(false),
        }
    }

    /// A cancellation handle for one transfer run.
    pub fn signal(&self) -> ShutdownSignal {
        // Subscribe before reading the latch so a concurrent trigger is seen
        // through one or the other.
        let rx = self.tx.subscribe();
        ShutdownSignal {
            rx,
            triggered: self.is_triggered(),
        }
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::SeqCst);
        let _ = self.tx.send(());
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving end of a shutdown broadcast, checked between batches.
///
/// Once triggered it stays triggered. A dropped coordinator never counts as
/// a trigger.
pub struct ShutdownSignal {
    rx: broadcast::Receiver<()>,
    triggered: bool,
}

impl ShutdownSignal {
    /// Non-blocking check.
    pub fn is_triggered(&mut self) -> bool {
        if !self.triggered {
            self.triggered = matches!(self.rx.try_recv(), Ok(()) | Err(TryRecvError::Lagged(_)));
        }
        self.triggered
    }

    /// Resolve once shutdown is triggered; pend forever if it never can be.
    pub async fn triggered(&mut self) {
        if self.triggered {
            return;
        }
        match self.rx.recv().await {
            Ok(()) | Err(RecvError::Lagged(_)) => self.triggered = true,
            Err(RecvError::Closed) => std::future::pending::<()>().await,
        }
    }
}
