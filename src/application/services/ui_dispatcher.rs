//! The UI-owning sequential execution context.
//!
//! Background work never touches surfaces directly; it queues jobs through a
//! [`UiDispatcher`] and the single [`UiExecutor`] runs them in order.

use tokio::sync::mpsc;
use tracing::debug;

/// A unit of work to run on the UI context.
pub type UiJob = Box<dyn FnOnce() + Send + 'static>;

/// Creates a connected dispatcher/executor pair.
#[must_use]
pub fn ui_context() -> (UiDispatcher, UiExecutor) {
    let (tx, rx) = mpsc::unbounded_channel();
    (UiDispatcher { tx }, UiExecutor { rx })
}

/// Cloneable handle for queueing work onto the UI context.
#[derive(Debug, Clone)]
pub struct UiDispatcher {
    tx: mpsc::UnboundedSender<UiJob>,
}

impl UiDispatcher {
    /// Queues `job` to run on the UI context.
    /// Returns false if the executor is gone and the job was dropped.
    pub fn dispatch(&self, job: impl FnOnce() + Send + 'static) -> bool {
        if self.tx.send(Box::new(job)).is_err() {
            debug!("UI context closed, dropping job");
            return false;
        }
        true
    }
}

/// Runs queued jobs one at a time.
pub struct UiExecutor {
    rx: mpsc::UnboundedReceiver<UiJob>,
}

impl std::fmt::Debug for UiExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiExecutor")
            .field("queued", &self.rx.len())
            .finish()
    }
}

impl UiExecutor {
    /// Runs every job already queued without waiting.
    /// Returns the number of jobs run.
    pub fn run_pending(&mut self) -> usize {
        let mut count = 0;
        while let Ok(job) = self.rx.try_recv() {
            job();
            count += 1;
        }
        count
    }

    /// Waits for the next job and runs it.
    /// Returns false once every dispatcher has been dropped.
    pub async fn tick(&mut self) -> bool {
        match self.rx.recv().await {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }
}
