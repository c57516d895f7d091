//! Bundler completion stats and the human-readable diagnostic report.

use std::time::Duration;

use serde::Deserialize;
use serde::de::IgnoredAny;

/// Completion report of one bundler run.
///
/// Times are milliseconds on an arbitrary but shared epoch; only their
/// difference is meaningful.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildStats {
    pub hash: Option<String>,
    pub version: Option<String>,
    pub start_time: u64,
    pub end_time: u64,
    pub errors: Vec<StatsMessage>,
    pub warnings: Vec<StatsMessage>,
    pub assets: Vec<AssetInfo>,
    pub chunk_count: usize,
    pub module_count: usize,
}

/// A bundler error or warning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsMessage {
    pub message: String,
    pub module_name: Option<String>,
    pub details: Option<String>,
}

impl StatsMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetInfo {
    pub name: String,
    pub size: u64,
}

/// Which sections [`BuildStats::render`] includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    pub timings: bool,
    pub hash: bool,
    pub version: bool,
    pub error_details: bool,
    pub assets: bool,
    pub chunks: bool,
    pub modules: bool,
}

impl ReportOptions {
    /// Verbosity used when a build fails: errors with details and build
    /// metadata, without the asset/chunk/module listings.
    pub fn failure() -> Self {
        Self {
            timings: true,
            hash: true,
            version: true,
            error_details: true,
            assets: false,
            chunks: false,
            modules: false,
        }
    }
}

impl BuildStats {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.end_time.saturating_sub(self.start_time))
    }

    /// Parse webpack's `--json` stats output.
    ///
    /// `measured` is the wall-clock duration of the bundler process, used
    /// when the output carries no timing of its own. Lines printed before or
    /// after the stats document (banners, progress, `Done in 2.1s`) are
    /// ignored.
    pub fn from_json(output: &str, measured: Duration) -> Result<Self, serde_json::Error> {
        let raw = stats_document(output)?;

        let measured_ms = measured.as_millis().min(u128::from(u64::MAX)) as u64;
        let (start_time, end_time) = match (raw.built_at, raw.time) {
            (Some(end), Some(time)) => (end.saturating_sub(time), end),
            (None, Some(time)) => (0, time),
            _ => (0, measured_ms),
        };

        Ok(Self {
            hash: raw.hash,
            version: raw.version,
            start_time,
            end_time,
            errors: raw.errors.into_iter().map(StatsMessage::from).collect(),
            warnings: raw.warnings.into_iter().map(StatsMessage::from).collect(),
            assets: raw
                .assets
                .into_iter()
                .map(|a| AssetInfo {
                    name: a.name,
                    size: a.size,
                })
                .collect(),
            chunk_count: raw.chunks.len(),
            module_count: raw.modules.len(),
        })
    }

    /// Format the report for an operator reading the console.
    pub fn render(&self, options: &ReportOptions) -> String {
        let mut lines: Vec<String> = Vec::new();

        if options.hash
            && let Some(hash) = &self.hash
        {
            lines.push(format!("Hash: {hash}"));
        }
        if options.version
            && let Some(version) = &self.version
        {
            lines.push(format!("Version: webpack {version}"));
        }
        if options.timings {
            lines.push(format!("Time: {}ms", self.elapsed().as_millis()));
        }
        if options.assets && !self.assets.is_empty() {
            let width = self
                .assets
                .iter()
                .map(|a| a.name.len())
                .max()
                .unwrap_or(0)
                .max("Asset".len());
            lines.push(format!("{:>width$}  {:>10}", "Asset", "Size"));
            for asset in &self.assets {
                lines.push(format!("{:>width$}  {:>10}", asset.name, asset.size));
            }
        }
        if options.chunks {
            lines.push(format!("Chunks: {}", self.chunk_count));
        }
        if options.modules {
            lines.push(format!("Modules: {}", self.module_count));
        }

        for warning in &self.warnings {
            lines.push(String::new());
            lines.extend(warning.render("WARNING", options.error_details));
        }
        for error in &self.errors {
            lines.push(String::new());
            lines.extend(error.render("ERROR", options.error_details));
        }

        lines.join("\n")
    }
}

impl StatsMessage {
    fn render(&self, label: &str, details: bool) -> Vec<String> {
        let mut lines = vec![match &self.module_name {
            Some(module) => format!("{label} in {module}"),
            None => label.to_owned(),
        }];
        lines.push(self.message.clone());
        if details && let Some(d) = &self.details {
            lines.push(d.clone());
        }
        lines
    }
}

// ── webpack JSON shape ──

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStats {
    hash: Option<String>,
    version: Option<String>,
    time: Option<u64>,
    built_at: Option<u64>,
    #[serde(default)]
    errors: Vec<RawMessage>,
    #[serde(default)]
    warnings: Vec<RawMessage>,
    #[serde(default)]
    assets: Vec<RawAsset>,
    #[serde(default)]
    chunks: Vec<IgnoredAny>,
    #[serde(default)]
    modules: Vec<IgnoredAny>,
}

/// First stats document in `output`.
///
/// webpack prints its stats as a top-level value starting in column 0, so
/// braces at the start of a line are tried first, in order; the first one
/// that parses wins and whatever follows it is ignored. Without such a
/// brace, the first `{` anywhere is used.
fn stats_document(output: &str) -> Result<RawStats, serde_json::Error> {
    let mut candidates: Vec<usize> = output
        .match_indices('{')
        .map(|(i, _)| i)
        .filter(|&i| i == 0 || output[..i].ends_with('\n'))
        .collect();
    if candidates.is_empty() {
        candidates.extend(output.find('{'));
    }

    let mut first_error = None;
    for start in candidates {
        let mut values = serde_json::Deserializer::from_str(&output[start..]).into_iter::<RawStats>();
        if let Some(parsed) = values.next() {
            match parsed {
                Ok(raw) => return Ok(raw),
                Err(e) => {
                    tracing::debug!(offset = start, error = %e, "not a stats document");
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => serde_json::from_str(output.trim()),
    }
}

/// webpack 4 reports messages as strings, webpack 5 as objects.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawMessage {
    Text(String),
    Object {
        message: String,
        #[serde(rename = "moduleName")]
        module_name: Option<String>,
        details: Option<String>,
    },
}

#[derive(Deserialize)]
struct RawAsset {
    name: String,
    #[serde(default)]
    size: u64,
}

impl From<RawMessage> for StatsMessage {
    fn from(raw: RawMessage) -> Self {
        match raw {
            RawMessage::Text(message) => Self::new(message),
            RawMessage::Object {
                message,
                module_name,
                details,
            } => Self {
                message,
                module_name,
                details,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEBPACK5_FAILURE: &str = r#"{
        "hash": "4f2a9c",
        "version": "5.90.3",
        "time": 1830,
        "builtAt": 1700000001830,
        "errors": [
            {
                "message": "Module not found: Error: Can't resolve './missing'",
                "moduleName": "./client/index.js",
                "details": "resolve './missing' in '/app/client'"
            }
        ],
        "warnings": ["asset size limit: The following asset(s) exceed 244 KiB"],
        "assets": [{"name": "main.js", "size": 301200}, {"name": "index.html", "size": 512}],
        "chunks": [{"id": 0}, {"id": 1}],
        "modules": [{"id": 0}, {"id": 1}, {"id": 2}]
    }"#;

    #[test]
    fn parses_webpack5_stats() {
        let stats = BuildStats::from_json(WEBPACK5_FAILURE, Duration::from_secs(9)).unwrap();

        assert!(stats.has_errors());
        assert_eq!(stats.hash.as_deref(), Some("4f2a9c"));
        assert_eq!(stats.version.as_deref(), Some("5.90.3"));
        assert_eq!(stats.elapsed(), Duration::from_millis(1830));
        assert_eq!(stats.errors[0].module_name.as_deref(), Some("./client/index.js"));
        assert_eq!(stats.warnings.len(), 1);
        assert_eq!(stats.assets.len(), 2);
        assert_eq!(stats.chunk_count, 2);
        assert_eq!(stats.module_count, 3);
    }

    #[test]
    fn measured_time_used_without_stats_timing() {
        let stats = BuildStats::from_json(r#"{"errors": []}"#, Duration::from_millis(2500)).unwrap();

        assert!(!stats.has_errors());
        assert_eq!(stats.elapsed(), Duration::from_millis(2500));
    }

    #[test]
    fn skips_leading_noise() {
        let output = "webpack-cli: compiling...\n{\"time\": 42, \"errors\": [\"boom\"]}\n";
        let stats = BuildStats::from_json(output, Duration::ZERO).unwrap();

        assert_eq!(stats.elapsed(), Duration::from_millis(42));
        assert_eq!(stats.errors, vec![StatsMessage::new("boom")]);
    }

    #[test]
    fn ignores_trailing_output() {
        let output = "{\"errors\":[]}\nDone in 2.10s.\n";
        let stats = BuildStats::from_json(output, Duration::from_millis(700)).unwrap();

        assert!(!stats.has_errors());
        assert_eq!(stats.elapsed(), Duration::from_millis(700));
    }

    #[test]
    fn skips_banner_containing_braces() {
        let output = "[webpack-cli] {x}\n{\"errors\":[\"e\"]}";
        let stats = BuildStats::from_json(output, Duration::ZERO).unwrap();

        assert_eq!(stats.errors, vec![StatsMessage::new("e")]);
    }

    #[test]
    fn skips_banner_with_empty_object() {
        // `{}` inline in a banner would parse as empty stats
        let output = "[webpack-cli] config {}\n{\"hash\":\"abc\",\"errors\":[]}\nDone\n";
        let stats = BuildStats::from_json(output, Duration::ZERO).unwrap();

        assert_eq!(stats.hash.as_deref(), Some("abc"));
    }

    #[test]
    fn pretty_printed_stats_with_trailing_output() {
        let output = format!("yarn run v1.22.19\n{WEBPACK5_FAILURE}\nDone in 3.02s.\n");
        let stats = BuildStats::from_json(&output, Duration::ZERO).unwrap();

        assert_eq!(stats.hash.as_deref(), Some("4f2a9c"));
        assert_eq!(stats.module_count, 3);
    }

    #[test]
    fn truncated_stats_are_an_error() {
        let output = "{\n  \"errors\": [\n    {\"message\": \"x\"}";
        assert!(BuildStats::from_json(output, Duration::ZERO).is_err());
    }

    #[test]
    fn rejects_non_json_output() {
        assert!(BuildStats::from_json("Segmentation fault", Duration::ZERO).is_err());
    }

    #[test]
    fn failure_report_hides_listings_but_keeps_errors() {
        let stats = BuildStats::from_json(WEBPACK5_FAILURE, Duration::ZERO).unwrap();
        let report = stats.render(&ReportOptions::failure());

        assert!(report.contains("Hash: 4f2a9c"), "{report}");
        assert!(report.contains("Version: webpack 5.90.3"), "{report}");
        assert!(report.contains("Time: 1830ms"), "{report}");
        assert!(report.contains("ERROR in ./client/index.js"), "{report}");
        assert!(report.contains("Can't resolve './missing'"), "{report}");
        assert!(report.contains("resolve './missing' in '/app/client'"), "{report}");
        assert!(report.contains("WARNING"), "{report}");
        assert!(!report.contains("main.js"), "{report}");
        assert!(!report.contains("Chunks:"), "{report}");
        assert!(!report.contains("Modules:"), "{report}");
    }

    #[test]
    fn report_lists_assets_when_enabled() {
        let stats = BuildStats::from_json(WEBPACK5_FAILURE, Duration::ZERO).unwrap();
        let options = ReportOptions {
            assets: true,
            chunks: true,
            modules: true,
            ..ReportOptions::failure()
        };
        let report = stats.render(&options);

        assert!(report.contains("main.js"), "{report}");
        assert!(report.contains("301200"), "{report}");
        assert!(report.contains("Chunks: 2"), "{report}");
        assert!(report.contains("Modules: 3"), "{report}");
    }
}
