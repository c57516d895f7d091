use std::path::PathBuf;
use std::process::Stdio;

use serde::{Deserialize, Serialize};
use webpub_core::PublishSettings;

/// Parameters handed to the static asset deployer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishRequest {
    /// Canonical environment name (`test` or `production`)
    pub env: String,
    /// Directory whose contents are uploaded
    pub cwd: PathBuf,
    pub imagemin: bool,
    /// Remote path prefix the assets are served under
    pub path: String,
}

/// What the deployer reported. `code == 0` means success; any extra fields
/// are kept for the success report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishResult {
    pub code: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PublishResult {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

/// Abstraction over the deployer for testability.
///
/// Production code uses [`CommandPublisher`], tests use mockall-generated mocks.
#[allow(async_fn_in_trait)]
pub trait Publisher: Send + Sync {
    /// Upload `request.cwd`. `Err` means the deployer could not be reached
    /// or produced no result; a rejected upload is an `Ok` with a non-zero code.
    async fn publish(&self, request: &PublishRequest) -> Result<PublishResult, PublisherError>;
}

/// Runs the deployer as a subprocess: the request is written to its stdin
/// as JSON and the result is read from its stdout as JSON.
pub struct CommandPublisher {
    program: String,
    args: Vec<String>,
    working_dir: PathBuf,
}

impl CommandPublisher {
    pub fn new(settings: &PublishSettings, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: settings.program.clone(),
            args: settings.args.clone(),
            working_dir: working_dir.into(),
        }
    }
}

impl Publisher for CommandPublisher {
    async fn publish(&self, request: &PublishRequest) -> Result<PublishResult, PublisherError> {
        use tokio::io::AsyncWriteExt;

        let payload =
            serde_json::to_vec(request).map_err(|e| PublisherError::Encode { source: e })?;
        tracing::debug!(program = %self.program, path = %request.path, "launching deployer");

        let mut child = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| PublisherError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&payload)
                .await
                .map_err(|e| PublisherError::StdinWrite { source: e })?;
            stdin
                .shutdown()
                .await
                .map_err(|e| PublisherError::StdinWrite { source: e })?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| PublisherError::Wait { source: e })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        serde_json::from_str(stdout.trim()).map_err(|e| PublisherError::InvalidResult {
            status: output.status.to_string(),
            source: e,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PublisherError {
    #[error("failed to encode publish request")]
    Encode { source: serde_json::Error },

    #[error("failed to launch deployer '{program}'")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("failed to write to deployer stdin")]
    StdinWrite { source: std::io::Error },

    #[error("failed waiting for deployer")]
    Wait { source: std::io::Error },

    #[error("deployer exited with {status} without a readable result")]
    InvalidResult {
        status: String,
        source: serde_json::Error,
    },
}
