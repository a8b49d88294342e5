//! FFmpeg process runtime
//!
//! Runs the `ffmpeg` binary as the codec runtime. Loading checks that the
//! binary starts and offers the required encoders, then creates a private
//! scratch directory that serves as the runtime's sandboxed filesystem.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use parking_lot::Mutex;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::domain::errors::{EngineLoadError, RuntimeError};
use crate::ports::{ExecOutcome, TranscodeRuntime};

/// Codec runtime backed by an external `ffmpeg` process per command
pub struct FfmpegProcessRuntime {
    binary: PathBuf,
    required_encoders: Vec<String>,
    sandbox: Mutex<Option<TempDir>>,
}

impl FfmpegProcessRuntime {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            required_encoders: vec!["libx264".to_string(), "aac".to_string()],
            sandbox: Mutex::new(None),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(&config.binary).with_required_encoders(config.required_encoders.clone())
    }

    pub fn with_required_encoders(mut self, encoders: Vec<String>) -> Self {
        self.required_encoders = encoders;
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn is_loaded(&self) -> bool {
        self.sandbox.lock().is_some()
    }

    fn sandbox_dir(&self) -> Result<PathBuf, RuntimeError> {
        self.sandbox
            .lock()
            .as_ref()
            .map(|dir| dir.path().to_path_buf())
            .ok_or(RuntimeError::NotLoaded)
    }

    fn sandbox_path(&self, name: &str) -> Result<PathBuf, RuntimeError> {
        validate_file_name(name)?;
        Ok(self.sandbox_dir()?.join(name))
    }

    async fn list_encoders(&self) -> Result<String, EngineLoadError> {
        let output = Command::new(&self.binary)
            .args(["-hide_banner", "-encoders"])
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => EngineLoadError::NetworkFailure(format!(
                    "codec runtime not found at {}",
                    self.binary.display()
                )),
                _ => EngineLoadError::NetworkFailure(format!("codec runtime could not be started: {}", e)),
            })?;

        if !output.status.success() {
            return Err(EngineLoadError::NetworkFailure(format!(
                "codec runtime exited with {} while starting",
                output.status
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Sandbox names are flat: no separators, no parent references
fn validate_file_name(name: &str) -> Result<(), RuntimeError> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains('\0');
    if valid {
        Ok(())
    } else {
        Err(RuntimeError::InvalidFileName(name.to_string()))
    }
}

/// Whether an `ffmpeg -encoders` listing offers `encoder`
fn lists_encoder(listing: &str, encoder: &str) -> bool {
    listing
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let flags = fields.next()?;
            // Capability columns are six characters like "V....D".
            (flags.len() == 6).then(|| fields.next()).flatten()
        })
        .any(|name| name == encoder)
}

#[async_trait]
impl TranscodeRuntime for FfmpegProcessRuntime {
    async fn load(&self) -> Result<(), EngineLoadError> {
        if self.is_loaded() {
            return Ok(());
        }

        let listing = self.list_encoders().await?;
        let missing: Vec<&str> = self
            .required_encoders
            .iter()
            .map(String::as_str)
            .filter(|encoder| !lists_encoder(&listing, encoder))
            .collect();
        if !missing.is_empty() {
            return Err(EngineLoadError::UnsupportedEnvironment(format!(
                "codec runtime lacks required encoders: {}",
                missing.join(", ")
            )));
        }

        let dir = tempfile::Builder::new()
            .prefix("segedit-engine-")
            .tempdir()
            .map_err(|e| EngineLoadError::UnsupportedEnvironment(format!("no writable scratch space: {}", e)))?;
        info!(binary = %self.binary.display(), sandbox = %dir.path().display(), "codec runtime loaded");
        *self.sandbox.lock() = Some(dir);
        Ok(())
    }

    async fn write_file(&self, name: &str, data: &[u8]) -> Result<(), RuntimeError> {
        let path = self.sandbox_path(name)?;
        tokio::fs::write(&path, data).await?;
        debug!(file = name, bytes = data.len(), "sandbox file written");
        Ok(())
    }

    async fn exec(&self, args: &[String]) -> Result<ExecOutcome, RuntimeError> {
        let dir = self.sandbox_dir()?;
        let output = Command::new(&self.binary)
            .current_dir(&dir)
            .args(["-hide_banner", "-nostdin", "-y"])
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        let log = String::from_utf8_lossy(&output.stderr)
            .lines()
            .map(str::to_string)
            .collect();
        Ok(ExecOutcome {
            exit_code: output.status.code().unwrap_or(-1),
            log,
        })
    }

    async fn read_file(&self, name: &str) -> Result<Vec<u8>, RuntimeError> {
        let path = self.sandbox_path(name)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(RuntimeError::FileNotFound(name.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_file(&self, name: &str) -> Result<(), RuntimeError> {
        let path = self.sandbox_path(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn release(&self) {
        let dir = self.sandbox.lock().take();
        if let Some(dir) = dir {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                warn!(sandbox = %path.display(), error = %e, "failed to remove codec sandbox");
            } else {
                debug!(sandbox = %path.display(), "codec sandbox removed");
            }
        }
    }
}
