//! Handles for engine work running on the async runtime

use tokio::sync::oneshot;
use tokio::task::AbortHandle;

use crate::domain::errors::{EngineLoadError, TranscodeError};

/// Error types that can describe a task that vanished without reporting
pub trait TaskError {
    fn lost() -> Self;
}

impl TaskError for EngineLoadError {
    fn lost() -> Self {
        EngineLoadError::Interrupted
    }
}

impl TaskError for TranscodeError {
    fn lost() -> Self {
        TranscodeError::Abandoned
    }
}

/// Pending result of a spawned engine task.
///
/// Dropping or abandoning the handle discards the result; the work itself
/// runs to completion because the codec runtime cannot be preempted.
#[derive(Debug)]
#[must_use = "an engine task does nothing useful unless awaited or explicitly abandoned"]
pub struct EngineTask<T, E> {
    result: oneshot::Receiver<Result<T, E>>,
    worker: Option<AbortHandle>,
}

impl<T, E: TaskError> EngineTask<T, E> {
    pub(crate) fn new(result: oneshot::Receiver<Result<T, E>>, worker: AbortHandle) -> Self {
        Self {
            result,
            worker: Some(worker),
        }
    }

    /// Task that is already resolved
    pub(crate) fn ready(value: Result<T, E>) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(value);
        Self { result: rx, worker: None }
    }

    /// Whether the underlying work has stopped running
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().map_or(true, |w| w.is_finished())
    }

    /// Wait for the task to report
    pub async fn wait(self) -> Result<T, E> {
        self.result.await.unwrap_or_else(|_| Err(E::lost()))
    }

    /// Take the result if the task has already reported
    pub fn try_take(&mut self) -> Option<Result<T, E>> {
        match self.result.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(E::lost())),
        }
    }

    /// Stop listening; the result is discarded when it arrives
    pub fn abandon(self) {
        tracing::debug!("engine task abandoned by caller");
    }
}
