use std::path::Path;

use url::Url;
use webpub_core::Environment;

use crate::executor::{PublishRequest, PublishResult, Publisher, PublisherError};

/// Publishes the build output for environments that serve assets remotely.
pub struct AssetPublisher<P: Publisher> {
    publisher: P,
    imagemin: bool,
}

impl<P: Publisher> AssetPublisher<P> {
    pub fn new(publisher: P, imagemin: bool) -> Self {
        Self {
            publisher,
            imagemin,
        }
    }

    /// Upload `build_dir` under the path component of `public_path`.
    ///
    /// Returns `Ok(None)` without contacting the deployer unless
    /// `environment` is `test` or `production`.
    ///
    /// # Errors
    ///
    /// - [`PublishError::MissingPublicPath`] / [`PublishError::InvalidPublicPath`]
    ///   if the configured public path cannot supply a remote path
    /// - [`PublishError::Transport`] if the deployer could not be run
    /// - [`PublishError::Rejected`] if the deployer returned a non-zero code
    pub async fn publish(
        &self,
        environment: &Environment,
        build_dir: &Path,
        public_path: Option<&str>,
    ) -> Result<Option<PublishResult>, PublishError> {
        if !environment.is_published() {
            tracing::debug!(%environment, "environment does not publish assets");
            return Ok(None);
        }

        let public_path = public_path.ok_or(PublishError::MissingPublicPath)?;
        let request = PublishRequest {
            env: environment.to_string(),
            cwd: build_dir.to_path_buf(),
            imagemin: self.imagemin,
            path: remote_path(public_path)?,
        };

        let result = self
            .publisher
            .publish(&request)
            .await
            .map_err(|e| PublishError::Transport { source: e })?;

        if !result.is_success() {
            return Err(PublishError::Rejected {
                code: result.code,
                error: result.error.unwrap_or(serde_json::Value::Null),
            });
        }
        Ok(Some(result))
    }
}

/// Remote path the assets are published under, taken from `output.publicPath`.
///
/// For absolute (`https://cdn.example.com/assets`) and protocol-relative
/// (`//cdn.example.com/assets`) URLs this is the path component. Any other
/// value is a path already and is kept as written, minus query and fragment.
/// webpack's `auto` is rejected: it is resolved in the browser and names no
/// remote location.
///
/// # Examples
///
/// ```
/// use webpub_deploy::remote_path;
///
/// assert_eq!(remote_path("https://cdn.example.com/assets").unwrap(), "/assets");
/// assert_eq!(remote_path("//cdn.example.com/bbs/").unwrap(), "/bbs/");
/// assert_eq!(remote_path("/static/").unwrap(), "/static/");
/// assert_eq!(remote_path("assets/").unwrap(), "assets/");
/// assert!(remote_path("auto").is_err());
/// ```
pub fn remote_path(public_path: &str) -> Result<String, PublishError> {
    if public_path == "auto" {
        return Err(PublishError::AutoPublicPath);
    }
    let invalid = |e| PublishError::InvalidPublicPath {
        value: public_path.to_owned(),
        source: e,
    };

    match Url::parse(public_path) {
        Ok(url) => Ok(url.path().to_owned()),
        Err(url::ParseError::RelativeUrlWithoutBase) if public_path.starts_with("//") => {
            let base = Url::parse("http://localhost/").map_err(invalid)?;
            let url = Url::options()
                .base_url(Some(&base))
                .parse(public_path)
                .map_err(invalid)?;
            Ok(url.path().to_owned())
        }
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let end = public_path.find(['?', '#']).unwrap_or(public_path.len());
            Ok(public_path[..end].to_owned())
        }
        Err(e) => Err(invalid(e)),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("output.publicPath is not set; required to publish assets")]
    MissingPublicPath,

    #[error("output.publicPath 'auto' has no remote path; set an explicit URL or path to publish")]
    AutoPublicPath,

    #[error("output.publicPath '{value}' is not a valid URL")]
    InvalidPublicPath {
        value: String,
        source: url::ParseError,
    },

    #[error("static asset deployer failed")]
    Transport { source: PublisherError },

    #[error("static asset publish rejected with code {code}: {error}")]
    Rejected { code: i64, error: serde_json::Value },
}
