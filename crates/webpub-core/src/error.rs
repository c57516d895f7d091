use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // ── webpub.toml ──
    #[error("failed to load settings from {path}")]
    SettingsLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse settings at {path}")]
    SettingsParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("templates.concurrency must be at least 1")]
    ZeroConcurrency,

    // ── Bundler configuration ──
    #[error("no bundler configuration for environment '{environment}' (looked for {path})")]
    ConfigNotFound { environment: String, path: PathBuf },

    #[error("failed to load bundler configuration from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse bundler configuration at {path}")]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    // ── Process descriptor ──
    #[error("failed to read process descriptor {path}")]
    ManifestRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse process descriptor {path}")]
    ManifestParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to serialize process descriptor {path}")]
    ManifestSerialize {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write process descriptor {path}")]
    ManifestWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Package name ──
    #[error("failed to read package metadata {path}")]
    PackageRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse package metadata {path}")]
    PackageParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(
        "package name unknown: set npm_package_name or add a \"name\" field to {}",
        package_json.display()
    )]
    MissingPackageName { package_json: PathBuf },
}

impl Error {
    /// Whether this error is a filesystem failure (as opposed to a missing
    /// or malformed configuration).
    pub fn is_filesystem(&self) -> bool {
        matches!(
            self,
            Self::SettingsLoad { .. }
                | Self::ConfigLoad { .. }
                | Self::ManifestRead { .. }
                | Self::ManifestWrite { .. }
                | Self::PackageRead { .. }
        )
    }
}
