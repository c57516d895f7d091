use std::time::Duration;

use webpub_core::BundleConfig;

use crate::bundler::{Bundler, BundlerError};
use crate::stats::ReportOptions;

/// Drives a [`Bundler`] to completion and turns its report into a stage outcome.
pub struct BuildInvoker<B: Bundler> {
    bundler: B,
}

/// Outcome of a successful build.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildSummary {
    pub elapsed: Duration,
    pub hash: Option<String>,
    pub warnings: usize,
}

impl BuildSummary {
    /// Elapsed build time in seconds with two decimals, e.g. `"1.83"`.
    pub fn elapsed_secs(&self) -> String {
        format_seconds(self.elapsed)
    }
}

impl<B: Bundler> BuildInvoker<B> {
    pub fn new(bundler: B) -> Self {
        Self { bundler }
    }

    /// Run the bundler once.
    ///
    /// # Errors
    ///
    /// - [`BuildError::Engine`] when the bundler could not run
    /// - [`BuildError::Failed`] when it ran but reported errors; the error
    ///   carries the diagnostic report rendered with [`ReportOptions::failure`]
    pub async fn run(&self, config: &BundleConfig) -> Result<BuildSummary, BuildError> {
        let stats = self
            .bundler
            .compile(config)
            .await
            .map_err(|e| BuildError::Engine { source: e })?;

        if stats.has_errors() {
            return Err(BuildError::Failed {
                error_count: stats.errors.len(),
                report: stats.render(&ReportOptions::failure()),
            });
        }

        let summary = BuildSummary {
            elapsed: stats.elapsed(),
            hash: stats.hash,
            warnings: stats.warnings.len(),
        };
        tracing::debug!(
            elapsed_ms = summary.elapsed.as_millis() as u64,
            warnings = summary.warnings,
            "bundler finished"
        );
        Ok(summary)
    }
}

/// Seconds with two-decimal precision.
pub fn format_seconds(duration: Duration) -> String {
    format!("{:.2}", duration.as_secs_f64())
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("bundler could not complete")]
    Engine { source: BundlerError },

    #[error("bundler reported {error_count} error(s)")]
    Failed { error_count: usize, report: String },
}

impl BuildError {
    /// Diagnostic report to show the operator, if the bundler produced one.
    pub fn report(&self) -> Option<&str> {
        match self {
            Self::Engine { .. } => None,
            Self::Failed { report, .. } => Some(report),
        }
    }
}
