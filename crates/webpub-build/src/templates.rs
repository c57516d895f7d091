//! Moves generated view templates from the build output into the view directory.

use std::path::{Path, PathBuf, StripPrefixError};

use tokio::task::JoinSet;
use webpub_core::TemplateSettings;

/// Relocates every `**/*.<extension>` file under the build output tree to
/// the same relative path under the view directory.
pub struct TemplateRelocator {
    build_dir: PathBuf,
    views_dir: PathBuf,
    extension: String,
    concurrency: usize,
}

impl TemplateRelocator {
    /// `build_dir` should be absolute: glob drops a leading `./` from its
    /// matches, which then no longer strip against the build root.
    pub fn new(
        build_dir: impl Into<PathBuf>,
        views_dir: impl Into<PathBuf>,
        settings: &TemplateSettings,
    ) -> Self {
        Self {
            build_dir: build_dir.into(),
            views_dir: views_dir.into(),
            extension: settings.extension.clone(),
            concurrency: settings.concurrency.max(1),
        }
    }

    /// Template paths relative to the build output root, sorted.
    ///
    /// A build output tree that does not exist yields no templates. Dotfiles
    /// are not matched.
    pub fn discover(&self) -> Result<Vec<PathBuf>, RelocateError> {
        let root = self
            .build_dir
            .to_str()
            .ok_or_else(|| RelocateError::InvalidPath(self.build_dir.clone()))?;
        let pattern = format!(
            "{}/**/*.{}",
            glob::Pattern::escape(root),
            glob::Pattern::escape(&self.extension)
        );
        let options = glob::MatchOptions {
            require_literal_leading_dot: true,
            ..glob::MatchOptions::new()
        };

        let entries = glob::glob_with(&pattern, options).map_err(|e| RelocateError::Pattern {
            pattern: pattern.clone(),
            source: e,
        })?;

        let mut templates = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| RelocateError::Walk { source: e })?;
            if !path.is_file() {
                continue;
            }
            let relative = path
                .strip_prefix(&self.build_dir)
                .map_err(|e| RelocateError::OutsideBuild {
                    path: path.clone(),
                    source: e,
                })?
                .to_path_buf();
            templates.push(relative);
        }
        templates.sort();
        Ok(templates)
    }

    /// Move all templates. Returns the number of files moved.
    ///
    /// At most `concurrency` moves are in flight. The first failed move ends
    /// the stage: nothing further is dispatched, moves already in flight are
    /// left to finish on their own, and completed moves are not undone.
    pub async fn relocate(&self) -> Result<usize, RelocateError> {
        let templates = self.discover()?;
        tracing::debug!(
            count = templates.len(),
            from = %self.build_dir.display(),
            to = %self.views_dir.display(),
            "relocating templates"
        );

        let mut pending = templates.into_iter();
        let mut in_flight = JoinSet::new();
        let mut moved = 0;

        loop {
            while in_flight.len() < self.concurrency {
                let Some(relative) = pending.next() else {
                    break;
                };
                let from = self.build_dir.join(&relative);
                let to = self.views_dir.join(&relative);
                in_flight.spawn(move_file(from, to));
            }

            let Some(joined) = in_flight.join_next().await else {
                break;
            };
            match joined {
                Ok(Ok(())) => moved += 1,
                Ok(Err(e)) => {
                    in_flight.detach_all();
                    return Err(e);
                }
                Err(e) => {
                    in_flight.detach_all();
                    return Err(RelocateError::Task { source: e });
                }
            }
        }

        Ok(moved)
    }
}

/// Move `from` to `to`, replacing any file already at `to`.
async fn move_file(from: PathBuf, to: PathBuf) -> Result<(), RelocateError> {
    if let Some(parent) = to.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| RelocateError::CreateDir {
                path: parent.to_path_buf(),
                source: e,
            })?;
    }

    let exists = tokio::fs::try_exists(&to)
        .await
        .map_err(|e| move_error(&from, &to, e))?;
    if exists {
        tracing::debug!(path = %to.display(), "replacing existing template");
        tokio::fs::remove_file(&to)
            .await
            .map_err(|e| move_error(&from, &to, e))?;
    }

    if let Err(rename_err) = tokio::fs::rename(&from, &to).await {
        // rename cannot cross filesystems
        tracing::debug!(
            from = %from.display(),
            error = %rename_err,
            "rename failed; falling back to copy"
        );
        tokio::fs::copy(&from, &to)
            .await
            .map_err(|e| move_error(&from, &to, e))?;
        tokio::fs::remove_file(&from)
            .await
            .map_err(|e| move_error(&from, &to, e))?;
    }
    Ok(())
}

fn move_error(from: &Path, to: &Path, source: std::io::Error) -> RelocateError {
    RelocateError::Move {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RelocateError {
    #[error("build output path is not valid UTF-8: {0}")]
    InvalidPath(PathBuf),

    #[error("invalid template pattern {pattern}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("failed to scan build output")]
    Walk { source: glob::GlobError },

    #[error("template {path} is outside the build output")]
    OutsideBuild {
        path: PathBuf,
        source: StripPrefixError,
    },

    #[error("failed to create directory {path}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to move {from} to {to}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    #[error("template move task failed")]
    Task { source: tokio::task::JoinError },
}
