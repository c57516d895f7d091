use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Environment;

/// Settings file looked up in the project root.
pub const SETTINGS_FILE: &str = "webpub.toml";

/// webpub.toml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub paths: PathSettings,
    #[serde(default)]
    pub bundler: BundlerSettings,
    #[serde(default)]
    pub templates: TemplateSettings,
    #[serde(default)]
    pub publish: PublishSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Directory the server renders views from
    #[serde(default = "default_views")]
    pub views: PathBuf,
    /// Process manager descriptor rewritten on every run
    #[serde(default = "default_process")]
    pub process: PathBuf,
    /// Directory holding `webpack.config.<env>.json` files
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundlerSettings {
    /// Executable used to launch the bundler
    #[serde(default = "default_bundler_program")]
    pub program: String,
    /// Leading arguments; `--config <file> --json` is appended
    #[serde(default = "default_bundler_args")]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateSettings {
    /// File extension (without the dot) identifying view templates
    #[serde(default = "default_template_extension")]
    pub extension: String,
    /// Upper bound on template moves in flight at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishSettings {
    /// Executable of the static asset deployer
    #[serde(default = "default_publish_program")]
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Ask the deployer to optimise images on upload
    #[serde(default = "default_imagemin")]
    pub imagemin: bool,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            views: default_views(),
            process: default_process(),
            config_dir: default_config_dir(),
        }
    }
}

impl Default for BundlerSettings {
    fn default() -> Self {
        Self {
            program: default_bundler_program(),
            args: default_bundler_args(),
        }
    }
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            extension: default_template_extension(),
            concurrency: default_concurrency(),
        }
    }
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            program: default_publish_program(),
            args: Vec::new(),
            imagemin: default_imagemin(),
        }
    }
}

impl Settings {
    /// Load from webpub.toml in the given directory, or return defaults if not found.
    pub fn load(project_dir: &Path) -> crate::Result<Self> {
        let settings_path = project_dir.join(SETTINGS_FILE);
        if !settings_path.exists() {
            tracing::debug!(path = %settings_path.display(), "no settings file; using defaults");
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(&settings_path).map_err(|e| crate::Error::SettingsLoad {
                path: settings_path.clone(),
                source: e,
            })?;
        let settings: Self = toml::from_str(&content).map_err(|e| crate::Error::SettingsParse {
            path: settings_path,
            source: e,
        })?;

        if settings.templates.concurrency == 0 {
            return Err(crate::Error::ZeroConcurrency);
        }
        Ok(settings)
    }

    pub fn views_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.paths.views)
    }

    pub fn process_path(&self, root: &Path) -> PathBuf {
        root.join(&self.paths.process)
    }

    /// Path of the bundler configuration for `environment`.
    pub fn bundle_config_path(&self, root: &Path, environment: &Environment) -> PathBuf {
        root.join(&self.paths.config_dir)
            .join(format!("webpack.config.{environment}.json"))
    }
}

/// Environment-specific bundler configuration.
///
/// Only the `output` section is interpreted; the file itself is handed to
/// the bundler untouched.
#[derive(Debug, Clone)]
pub struct BundleConfig {
    /// File the configuration was loaded from
    pub path: PathBuf,
    /// Environment the configuration was selected for
    pub environment: Environment,
    /// Absolute build output directory (`output.path`)
    pub output_path: PathBuf,
    /// Public base URL of published assets (`output.publicPath`)
    pub public_path: Option<String>,
}

#[derive(Deserialize)]
struct RawBundleConfig {
    output: RawOutput,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOutput {
    path: PathBuf,
    public_path: Option<String>,
}

impl BundleConfig {
    /// Load the configuration selected by `environment`.
    ///
    /// # Errors
    ///
    /// - [`Error::ConfigNotFound`](crate::Error::ConfigNotFound) if no file exists for the environment
    /// - [`Error::ConfigParse`](crate::Error::ConfigParse) if the file is not JSON or lacks `output.path`
    pub fn load(root: &Path, settings: &Settings, environment: &Environment) -> crate::Result<Self> {
        let path = settings.bundle_config_path(root, environment);
        if !path.is_file() {
            return Err(crate::Error::ConfigNotFound {
                environment: environment.to_string(),
                path,
            });
        }

        let content = std::fs::read_to_string(&path).map_err(|e| crate::Error::ConfigLoad {
            path: path.clone(),
            source: e,
        })?;
        let raw: RawBundleConfig =
            serde_json::from_str(&content).map_err(|e| crate::Error::ConfigParse {
                path: path.clone(),
                source: e,
            })?;

        let output_path = root.join(raw.output.path);
        tracing::debug!(
            config = %path.display(),
            output = %output_path.display(),
            public_path = ?raw.output.public_path,
            "bundler configuration loaded"
        );

        Ok(Self {
            path,
            environment: environment.clone(),
            output_path,
            public_path: raw.output.public_path,
        })
    }
}

fn default_views() -> PathBuf {
    PathBuf::from("server/views")
}

fn default_process() -> PathBuf {
    PathBuf::from("process.json")
}

fn default_config_dir() -> PathBuf {
    PathBuf::from("config")
}

fn default_bundler_program() -> String {
    "npx".to_owned()
}

fn default_bundler_args() -> Vec<String> {
    vec!["webpack".to_owned()]
}

fn default_template_extension() -> String {
    "html".to_owned()
}

fn default_concurrency() -> usize {
    16
}

fn default_publish_program() -> String {
    "static-deploy".to_owned()
}

fn default_imagemin() -> bool {
    true
}
