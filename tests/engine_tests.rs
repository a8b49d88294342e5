//! Transcode engine lifecycle and job tests against a scripted runtime

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use segedit::domain::errors::{EngineLoadError, RuntimeError, TranscodeError};
use segedit::domain::model::{EncodeSettings, SourceMedia};
use segedit::engine::{EngineState, JobOutcome, TranscodeEngine};
use segedit::ports::{ExecOutcome, TranscodeRuntime};
use tokio::sync::Notify;

// Test utilities

/// Runtime whose behaviour is scripted per test
struct ScriptedRuntime {
    load_result: Result<(), EngineLoadError>,
    exit_code: i32,
    output: Vec<u8>,
    log: Vec<String>,
    gate: Option<Arc<Notify>>,
    files: Mutex<HashMap<String, Vec<u8>>>,
    commands: Mutex<Vec<Vec<String>>>,
    loads: AtomicUsize,
    releases: AtomicUsize,
}

impl ScriptedRuntime {
    fn new() -> Self {
        Self {
            load_result: Ok(()),
            exit_code: 0,
            output: b"trimmed-video".to_vec(),
            log: vec!["frame=  240 fps=120".to_string(), "video:512kB audio:32kB".to_string()],
            gate: None,
            files: Mutex::new(HashMap::new()),
            commands: Mutex::new(Vec::new()),
            loads: AtomicUsize::new(0),
            releases: AtomicUsize::new(0),
        }
    }

    fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new()
        }
    }
}

#[async_trait]
impl TranscodeRuntime for ScriptedRuntime {
    async fn load(&self) -> Result<(), EngineLoadError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.load_result.clone()
    }

    async fn write_file(&self, name: &str, data: &[u8]) -> Result<(), RuntimeError> {
        self.files.lock().insert(name.to_string(), data.to_vec());
        Ok(())
    }

    async fn exec(&self, args: &[String]) -> Result<ExecOutcome, RuntimeError> {
        self.commands.lock().push(args.to_vec());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.exit_code == 0 {
            if let Some(output_name) = args.last() {
                self.files.lock().insert(output_name.clone(), self.output.clone());
            }
        }
        Ok(ExecOutcome {
            exit_code: self.exit_code,
            log: self.log.clone(),
        })
    }

    async fn read_file(&self, name: &str) -> Result<Vec<u8>, RuntimeError> {
        self.files
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::FileNotFound(name.to_string()))
    }

    async fn delete_file(&self, name: &str) -> Result<(), RuntimeError> {
        self.files.lock().remove(name);
        Ok(())
    }

    async fn release(&self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

fn source() -> SourceMedia {
    SourceMedia::new(vec![7u8; 1024], "video/mp4", "lesson.mp4")
}

fn engine_with(runtime: &Arc<ScriptedRuntime>) -> TranscodeEngine {
    let settings = EncodeSettings {
        threads: Some(2),
        ..EncodeSettings::default()
    };
    TranscodeEngine::new(runtime.clone(), settings, 16)
}

async fn ready_engine(runtime: &Arc<ScriptedRuntime>) -> TranscodeEngine {
    let engine = engine_with(runtime);
    engine.load().wait().await.expect("load should succeed");
    engine
}

async fn wait_until_ready(engine: &TranscodeEngine) {
    let mut states = engine.watch_state();
    states
        .wait_for(|state| *state == EngineState::Ready)
        .await
        .expect("engine state channel closed");
}

// Lifecycle

#[tokio::test]
async fn test_load_transitions_to_ready_once() {
    let runtime = Arc::new(ScriptedRuntime::new());
    let engine = engine_with(&runtime);
    assert_eq!(engine.state(), EngineState::Unloaded);

    let first = engine.load();
    assert_eq!(engine.state(), EngineState::Loading);
    let second = engine.load();

    assert_eq!(first.wait().await, Ok(()));
    assert_eq!(second.wait().await, Ok(()));
    assert_eq!(engine.state(), EngineState::Ready);

    assert_eq!(engine.load().wait().await, Ok(()));
    assert_eq!(runtime.loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_load_failure_is_sticky_for_the_session() {
    let runtime = Arc::new(ScriptedRuntime {
        load_result: Err(EngineLoadError::UnsupportedEnvironment("no shared memory".to_string())),
        ..ScriptedRuntime::new()
    });
    let engine = engine_with(&runtime);

    let err = engine.load().wait().await.unwrap_err();
    assert!(matches!(err, EngineLoadError::UnsupportedEnvironment(_)));
    assert_eq!(engine.state(), EngineState::Failed(err.clone()));

    assert_eq!(engine.load().wait().await, Err(err.clone()));
    assert_eq!(runtime.loads.load(Ordering::SeqCst), 1);

    let rejected = engine.trim(&source(), 5.0, 15.0).unwrap_err();
    assert_eq!(rejected, TranscodeError::Unavailable(err));
}

#[tokio::test]
async fn test_unsupported_environment_has_distinct_user_message() {
    let unsupported = EngineLoadError::UnsupportedEnvironment("x".to_string());
    let network = EngineLoadError::NetworkFailure("x".to_string());
    assert_ne!(unsupported.user_message(), network.user_message());
}

// Trim preconditions

#[tokio::test]
async fn test_trim_before_load_is_not_ready() {
    let runtime = Arc::new(ScriptedRuntime::new());
    let engine = engine_with(&runtime);

    let err = engine.trim(&source(), 5.0, 15.0).unwrap_err();
    assert_eq!(err, TranscodeError::NotReady(EngineState::Unloaded));
    assert_eq!(engine.state(), EngineState::Unloaded);
    assert!(runtime.files.lock().is_empty());
    assert!(runtime.commands.lock().is_empty());
}

#[tokio::test]
async fn test_invalid_range_leaves_state_untouched() {
    let runtime = Arc::new(ScriptedRuntime::new());
    let engine = ready_engine(&runtime).await;

    for (start, end) in [(5.0, 5.0), (15.0, 5.0), (-1.0, 4.0), (0.0, f64::NAN)] {
        let err = engine.trim(&source(), start, end).unwrap_err();
        assert!(matches!(err, TranscodeError::InvalidRange { .. }));
        assert_eq!(engine.state(), EngineState::Ready);
    }
    assert!(runtime.commands.lock().is_empty());
}

#[tokio::test]
async fn test_invalid_range_is_checked_before_readiness() {
    let runtime = Arc::new(ScriptedRuntime::new());
    let engine = engine_with(&runtime);

    let err = engine.trim(&source(), 5.0, 5.0).unwrap_err();
    assert_eq!(err, TranscodeError::InvalidRange { start: 5.0, end: 5.0 });
}

// Jobs

#[tokio::test]
async fn test_trim_returns_output_and_returns_to_ready() {
    let runtime = Arc::new(ScriptedRuntime::new());
    let engine = ready_engine(&runtime).await;

    let task = engine.trim(&source(), 5.0, 15.0).unwrap();
    assert_eq!(engine.state(), EngineState::Processing);

    let output = task.wait().await.unwrap();
    assert_eq!(output, b"trimmed-video".to_vec());
    assert_eq!(engine.state(), EngineState::Ready);
    assert_eq!(engine.last_job(), Some(JobOutcome::Done { bytes: output.len() }));
}

#[tokio::test]
async fn test_trim_reencodes_the_requested_window() {
    let runtime = Arc::new(ScriptedRuntime::new());
    let engine = ready_engine(&runtime).await;
    engine.trim(&source(), 5.0, 15.0).unwrap().wait().await.unwrap();

    let commands = runtime.commands.lock();
    let args = &commands[0];
    let after = |flag: &str| {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .cloned()
    };
    assert_eq!(after("-i").as_deref(), Some("input.mp4"));
    assert_eq!(after("-ss").as_deref(), Some("5"));
    assert_eq!(after("-t").as_deref(), Some("10"));
    assert_eq!(after("-c:v").as_deref(), Some("libx264"));
    assert_eq!(after("-preset").as_deref(), Some("ultrafast"));
    assert_eq!(after("-c:a").as_deref(), Some("aac"));
    assert!(!args.iter().any(|a| a == "copy"));
}

#[tokio::test]
async fn test_sandbox_files_removed_after_job() {
    let runtime = Arc::new(ScriptedRuntime::new());
    let engine = ready_engine(&runtime).await;
    engine.trim(&source(), 1.0, 2.0).unwrap().wait().await.unwrap();

    assert!(runtime.files.lock().is_empty());
}

#[tokio::test]
async fn test_second_trim_while_processing_is_busy() {
    let gate = Arc::new(Notify::new());
    let runtime = Arc::new(ScriptedRuntime::gated(gate.clone()));
    let engine = ready_engine(&runtime).await;

    let first = engine.trim(&source(), 5.0, 15.0).unwrap();
    let second = engine.trim(&source(), 20.0, 30.0);
    assert_eq!(second.unwrap_err(), TranscodeError::Busy);
    assert_eq!(engine.state(), EngineState::Processing);

    gate.notify_one();
    assert_eq!(first.wait().await.unwrap(), b"trimmed-video".to_vec());
    assert_eq!(runtime.commands.lock().len(), 1);
    assert_eq!(engine.state(), EngineState::Ready);
}

#[tokio::test]
async fn test_encode_failure_keeps_engine_ready() {
    let runtime = Arc::new(ScriptedRuntime {
        exit_code: 1,
        log: vec!["Error while opening encoder".to_string()],
        ..ScriptedRuntime::new()
    });
    let engine = ready_engine(&runtime).await;

    let err = engine.trim(&source(), 5.0, 15.0).unwrap().wait().await.unwrap_err();
    let TranscodeError::EncodeFailure { reason } = &err else {
        panic!("expected encode failure, got {:?}", err);
    };
    assert!(!reason.contains("Error while opening encoder"));
    assert_eq!(engine.state(), EngineState::Ready);
    assert_eq!(engine.last_job(), Some(JobOutcome::Failed(err.clone())));
    assert!(runtime.files.lock().is_empty());

    // Retry is allowed
    assert!(engine.trim(&source(), 5.0, 15.0).is_ok());
}

#[tokio::test]
async fn test_empty_output_is_encode_failure() {
    let runtime = Arc::new(ScriptedRuntime {
        output: Vec::new(),
        ..ScriptedRuntime::new()
    });
    let engine = ready_engine(&runtime).await;

    let err = engine.trim(&source(), 0.0, 1.0).unwrap().wait().await.unwrap_err();
    assert!(matches!(err, TranscodeError::EncodeFailure { .. }));
}

#[tokio::test]
async fn test_runtime_log_is_retained_and_bounded() {
    let runtime = Arc::new(ScriptedRuntime {
        log: (0..40).map(|i| format!("line {}", i)).collect(),
        ..ScriptedRuntime::new()
    });
    let engine = ready_engine(&runtime).await;
    engine.trim(&source(), 0.0, 1.0).unwrap().wait().await.unwrap();

    let diagnostics = engine.diagnostics();
    assert_eq!(diagnostics.len(), 16);
    assert_eq!(diagnostics.first().map(String::as_str), Some("line 24"));
    assert_eq!(diagnostics.last().map(String::as_str), Some("line 39"));
}

// Cancellation

#[tokio::test]
async fn test_abandoned_trim_still_returns_engine_to_ready() {
    let gate = Arc::new(Notify::new());
    let runtime = Arc::new(ScriptedRuntime::gated(gate.clone()));
    let engine = ready_engine(&runtime).await;

    let task = engine.trim(&source(), 5.0, 15.0).unwrap();
    assert!(!task.is_finished());
    task.abandon();

    gate.notify_one();
    wait_until_ready(&engine).await;
    assert!(matches!(engine.last_job(), Some(JobOutcome::Done { .. })));
}

#[tokio::test]
async fn test_shutdown_releases_runtime_and_drops_inflight_job() {
    let gate = Arc::new(Notify::new());
    let runtime = Arc::new(ScriptedRuntime::gated(gate.clone()));
    let engine = ready_engine(&runtime).await;

    let task = engine.trim(&source(), 5.0, 15.0).unwrap();
    tokio::task::yield_now().await;

    engine.shutdown().await;
    assert_eq!(engine.state(), EngineState::Unloaded);
    assert_eq!(runtime.releases.load(Ordering::SeqCst), 1);
    assert_eq!(task.wait().await, Err(TranscodeError::Abandoned));

    // A second shutdown has nothing left to release
    engine.shutdown().await;
    assert_eq!(runtime.releases.load(Ordering::SeqCst), 1);
}
