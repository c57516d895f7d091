use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;

use webpub_core::{BundleConfig, BundlerSettings};

use crate::stats::BuildStats;

/// Abstraction over the bundling engine for testability.
///
/// `Err` is reserved for transport failures (the engine could not run or
/// produced no report). Compilation errors come back as `Ok` stats whose
/// [`has_errors`](BuildStats::has_errors) is true.
#[allow(async_fn_in_trait)]
pub trait Bundler: Send + Sync {
    async fn compile(&self, config: &BundleConfig) -> Result<BuildStats, BundlerError>;
}

/// Runs webpack (or a compatible CLI) as a subprocess.
///
/// The command line is `<program> <args..> --config <file> --json`, run in
/// the project root. The environment is inherited unchanged, so the bundler
/// sees the operator's raw `NODE_ENV` (`staging` stays `staging`). Stats are
/// read from stdout; stderr is passed through to the terminal.
pub struct CommandBundler {
    program: String,
    args: Vec<String>,
    working_dir: PathBuf,
}

impl CommandBundler {
    pub fn new(settings: &BundlerSettings, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: settings.program.clone(),
            args: settings.args.clone(),
            working_dir: working_dir.into(),
        }
    }
}

impl Bundler for CommandBundler {
    async fn compile(&self, config: &BundleConfig) -> Result<BuildStats, BundlerError> {
        tracing::debug!(
            program = %self.program,
            args = ?self.args,
            config = %config.path.display(),
            "launching bundler"
        );

        let started = Instant::now();
        let output = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg("--config")
            .arg(&config.path)
            .arg("--json")
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .await
            .map_err(|e| BundlerError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;
        let measured = started.elapsed();

        let stdout = String::from_utf8_lossy(&output.stdout);
        match BuildStats::from_json(&stdout, measured) {
            Ok(stats) if output.status.success() || stats.has_errors() => Ok(stats),
            Ok(_) => Err(BundlerError::Exited {
                status: output.status.to_string(),
                detail: "stats report no errors".to_owned(),
            }),
            Err(e) if output.status.success() => Err(BundlerError::InvalidStats { source: e }),
            Err(e) => Err(BundlerError::Exited {
                status: output.status.to_string(),
                detail: e.to_string(),
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BundlerError {
    #[error("failed to launch bundler '{program}'")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("bundler exited with {status} without reporting stats ({detail})")]
    Exited { status: String, detail: String },

    #[error("bundler stats output is not valid JSON")]
    InvalidStats { source: serde_json::Error },
}
