//! Transcode engine: lifecycle of the codec runtime and single-range trim jobs.
//!
//! The engine moves `Unloaded → Loading → Ready`, then `Ready → Processing → Ready`
//! for each job. Only one job may be processing; a second request is rejected
//! with [`TranscodeError::Busy`] instead of queueing.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::{oneshot, watch};
use tokio::task::AbortHandle;
use tracing::{debug, info, trace, warn};

use crate::domain::errors::{EngineLoadError, RuntimeError, TranscodeError};
use crate::domain::model::{EncodeSettings, SourceMedia};
use crate::ports::TranscodeRuntime;

pub mod command;
pub mod task;

pub use task::{EngineTask, TaskError};

/// Default number of retained runtime log lines
pub const DEFAULT_LOG_CAPACITY: usize = 500;

/// Lifecycle state of the engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineState {
    Unloaded,
    Loading,
    Ready,
    Processing,
    /// Load failed; trimming is unavailable for the rest of the session
    Failed(EngineLoadError),
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineState::Unloaded => write!(f, "unloaded"),
            EngineState::Loading => write!(f, "loading"),
            EngineState::Ready => write!(f, "ready"),
            EngineState::Processing => write!(f, "processing"),
            EngineState::Failed(_) => write!(f, "failed"),
        }
    }
}

/// How the most recent trim job ended
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Done { bytes: usize },
    Failed(TranscodeError),
}

/// Handle to the session's codec runtime
#[derive(Clone)]
pub struct TranscodeEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    runtime: Arc<dyn TranscodeRuntime>,
    settings: EncodeSettings,
    state: watch::Sender<EngineState>,
    last_job: Mutex<Option<JobOutcome>>,
    diagnostics: Mutex<VecDeque<String>>,
    log_capacity: usize,
    in_flight: Mutex<Vec<AbortHandle>>,
}

impl TranscodeEngine {
    pub fn new(runtime: Arc<dyn TranscodeRuntime>, settings: EncodeSettings, log_capacity: usize) -> Self {
        let (state, _) = watch::channel(EngineState::Unloaded);
        Self {
            inner: Arc::new(EngineInner {
                runtime,
                settings,
                state,
                last_job: Mutex::new(None),
                diagnostics: Mutex::new(VecDeque::with_capacity(log_capacity.min(1024))),
                log_capacity,
                in_flight: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn state(&self) -> EngineState {
        self.inner.state.borrow().clone()
    }

    /// Observe state transitions
    pub fn watch_state(&self) -> watch::Receiver<EngineState> {
        self.inner.state.subscribe()
    }

    pub fn is_ready(&self) -> bool {
        *self.inner.state.borrow() == EngineState::Ready
    }

    pub fn settings(&self) -> &EncodeSettings {
        &self.inner.settings
    }

    pub fn last_job(&self) -> Option<JobOutcome> {
        self.inner.last_job.lock().clone()
    }

    /// Retained runtime output, oldest first. For diagnostics only.
    pub fn diagnostics(&self) -> Vec<String> {
        self.inner.diagnostics.lock().iter().cloned().collect()
    }

    /// Load the runtime once for this session.
    ///
    /// Ready engines resolve immediately, failed engines repeat their load error
    /// and concurrent callers share the in-progress load. Must be called from
    /// within a Tokio runtime.
    pub fn load(&self) -> EngineTask<(), EngineLoadError> {
        match self.state() {
            EngineState::Ready | EngineState::Processing => return EngineTask::ready(Ok(())),
            EngineState::Failed(err) => return EngineTask::ready(Err(err)),
            EngineState::Unloaded | EngineState::Loading => {}
        }

        let mut starts_load = false;
        self.inner.state.send_if_modified(|state| {
            if *state == EngineState::Unloaded {
                *state = EngineState::Loading;
                starts_load = true;
                true
            } else {
                false
            }
        });

        let (tx, rx) = oneshot::channel();
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            let result = if starts_load {
                inner.run_load().await
            } else {
                inner.await_load().await
            };
            let _ = tx.send(result);
        });
        self.inner.track(handle.abort_handle());
        let worker = handle.abort_handle();

        EngineTask::new(rx, worker)
    }

    /// Start trimming `[start, end)` out of `source`.
    ///
    /// Rejections are returned immediately and leave the engine untouched.
    pub fn trim(
        &self,
        source: &SourceMedia,
        start: f64,
        end: f64,
    ) -> Result<EngineTask<Vec<u8>, TranscodeError>, TranscodeError> {
        if !start.is_finite() || !end.is_finite() || start < 0.0 || end <= start {
            debug!(start, end, "rejecting trim with invalid range");
            return Err(TranscodeError::InvalidRange { start, end });
        }

        let mut rejection = None;
        self.inner.state.send_if_modified(|state| match state {
            EngineState::Ready => {
                *state = EngineState::Processing;
                true
            }
            EngineState::Processing => {
                rejection = Some(TranscodeError::Busy);
                false
            }
            EngineState::Failed(err) => {
                rejection = Some(TranscodeError::Unavailable(err.clone()));
                false
            }
            other => {
                rejection = Some(TranscodeError::NotReady(other.clone()));
                false
            }
        });
        if let Some(err) = rejection {
            warn!(error = %err, "trim rejected");
            return Err(err);
        }

        info!(start, end, input_bytes = source.len(), "trim job started");

        let (tx, rx) = oneshot::channel();
        let inner = Arc::clone(&self.inner);
        let input = source.shared_bytes();
        let extension = source.extension().to_string();
        let handle = tokio::spawn(async move {
            let result = inner.run_trim(&input, &extension, start, end).await;
            inner.finish_job(&result);
            let _ = tx.send(result);
        });
        self.inner.track(handle.abort_handle());
        let worker = handle.abort_handle();

        Ok(EngineTask::new(rx, worker))
    }

    /// Release the runtime and wait for it to unload
    pub async fn shutdown(&self) {
        if self.inner.begin_shutdown() {
            self.inner.runtime.release().await;
            info!("codec runtime released");
        }
    }

    /// Release the runtime without waiting; used from synchronous teardown
    pub(crate) fn shutdown_detached(&self) {
        if !self.inner.begin_shutdown() {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let runtime = Arc::clone(&self.inner.runtime);
                handle.spawn(async move {
                    runtime.release().await;
                    debug!("codec runtime released in background");
                });
            }
            Err(_) => warn!("no async runtime available; codec runtime left for drop"),
        }
    }
}

impl EngineInner {
    fn track(&self, handle: AbortHandle) {
        let mut in_flight = self.in_flight.lock();
        in_flight.retain(|h| !h.is_finished());
        in_flight.push(handle);
    }

    /// Move `from → to` only if nothing else changed the state in between
    fn transition(&self, from: &EngineState, to: EngineState) -> bool {
        self.state.send_if_modified(|state| {
            if state == from {
                *state = to;
                true
            } else {
                false
            }
        })
    }

    async fn run_load(&self) -> Result<(), EngineLoadError> {
        let started = Instant::now();
        info!("loading codec runtime");

        let result = self.runtime.load().await;
        match &result {
            Ok(()) => {
                if self.transition(&EngineState::Loading, EngineState::Ready) {
                    info!(elapsed_ms = started.elapsed().as_millis() as u64, "codec runtime ready");
                } else {
                    // Released while loading; do not leave the runtime resident.
                    self.runtime.release().await;
                    return Err(EngineLoadError::Interrupted);
                }
            }
            Err(err) => {
                warn!(error = %err, "codec runtime failed to load");
                self.transition(&EngineState::Loading, EngineState::Failed(err.clone()));
            }
        }
        result
    }

    async fn await_load(&self) -> Result<(), EngineLoadError> {
        let mut rx = self.state.subscribe();
        let settled = rx
            .wait_for(|state| *state != EngineState::Loading)
            .await
            .map(|state| (*state).clone())
            .map_err(|_| EngineLoadError::Interrupted)?;

        match settled {
            EngineState::Ready | EngineState::Processing => Ok(()),
            EngineState::Failed(err) => Err(err),
            EngineState::Unloaded | EngineState::Loading => Err(EngineLoadError::Interrupted),
        }
    }

    async fn run_trim(&self, input: &[u8], extension: &str, start: f64, end: f64) -> Result<Vec<u8>, TranscodeError> {
        let started = Instant::now();
        let input_name = format!("input.{}", extension);
        let output_name = format!("output.{}", self.settings.container);
        let args = command::trim_arguments(&self.settings, &input_name, &output_name, start, end);
        debug!(?args, "trim command");

        let result = self.execute(input, &input_name, &output_name, &args).await;

        for name in [&input_name, &output_name] {
            if let Err(err) = self.runtime.delete_file(name).await {
                debug!(file = %name, error = %err, "failed to clean sandbox file");
            }
        }

        match &result {
            Ok(output) => info!(
                output_bytes = output.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "trim job finished"
            ),
            Err(err) => warn!(error = %err, "trim job failed"),
        }
        result
    }

    async fn execute(
        &self,
        input: &[u8],
        input_name: &str,
        output_name: &str,
        args: &[String],
    ) -> Result<Vec<u8>, TranscodeError> {
        self.runtime
            .write_file(input_name, input)
            .await
            .map_err(|err| self.encode_failure("could not stage the source video", err))?;

        let outcome = self
            .runtime
            .exec(args)
            .await
            .map_err(|err| self.encode_failure("the codec runtime could not run", err))?;
        self.capture_log(&outcome.log);

        if !outcome.success() {
            return Err(TranscodeError::EncodeFailure {
                reason: format!("encoder exited with status {}", outcome.exit_code),
            });
        }

        let output = self
            .runtime
            .read_file(output_name)
            .await
            .map_err(|err| self.encode_failure("the encoder produced no output file", err))?;
        if output.is_empty() {
            return Err(TranscodeError::EncodeFailure {
                reason: "the encoder produced an empty file".to_string(),
            });
        }
        Ok(output)
    }

    fn encode_failure(&self, reason: &str, err: RuntimeError) -> TranscodeError {
        self.capture_log(&[format!("{}: {}", reason, err)]);
        TranscodeError::EncodeFailure {
            reason: reason.to_string(),
        }
    }

    fn capture_log(&self, lines: &[String]) {
        if self.log_capacity == 0 {
            return;
        }
        let mut diagnostics = self.diagnostics.lock();
        for line in lines {
            trace!(target: "segedit::engine::runtime", "{}", line);
            if diagnostics.len() == self.log_capacity {
                diagnostics.pop_front();
            }
            diagnostics.push_back(line.clone());
        }
    }

    fn finish_job(&self, result: &Result<Vec<u8>, TranscodeError>) {
        let outcome = match result {
            Ok(output) => JobOutcome::Done { bytes: output.len() },
            Err(err) => JobOutcome::Failed(err.clone()),
        };
        *self.last_job.lock() = Some(outcome);

        if !self.transition(&EngineState::Processing, EngineState::Ready) {
            debug!("engine released while job was running; result discarded");
        }
    }

    /// Abort tracked tasks and reset to `Unloaded`. Returns whether a runtime
    /// may be resident.
    fn begin_shutdown(&self) -> bool {
        for handle in self.in_flight.lock().drain(..) {
            handle.abort();
        }
        let previous = self.state.send_replace(EngineState::Unloaded);
        !matches!(previous, EngineState::Unloaded | EngineState::Failed(_))
    }
}
