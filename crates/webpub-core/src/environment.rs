//! Deployment environment resolution.

use std::fmt;

/// Environment variable holding the raw environment identifier.
pub const ENVIRONMENT_VAR: &str = "NODE_ENV";

/// The deployment environment a pipeline run targets.
///
/// Only `test` and `production` publish assets. Any other identifier is
/// carried verbatim in [`Environment::Other`] so that a matching bundler
/// configuration can still be looked up for it.
///
/// # Examples
///
/// ```
/// use webpub_core::Environment;
///
/// assert_eq!(Environment::resolve(None), Environment::Development);
/// assert_eq!(Environment::resolve(Some("staging")), Environment::Test);
/// assert_eq!(Environment::resolve(Some("qa")).as_str(), "qa");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Environment {
    Development,
    Test,
    Production,
    Other(String),
}

impl Environment {
    /// Resolve a raw identifier into a canonical environment.
    ///
    /// Unset defaults to `development`; `staging` is an alias of `test`.
    pub fn resolve(raw: Option<&str>) -> Self {
        match raw {
            None => Self::Development,
            Some("staging") => Self::Test,
            Some("development") => Self::Development,
            Some("test") => Self::Test,
            Some("production") => Self::Production,
            Some(other) => Self::Other(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Production => "production",
            Self::Other(name) => name,
        }
    }

    /// Whether static assets are published for this environment.
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Test | Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
