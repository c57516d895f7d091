use std::path::{Path, PathBuf};

/// Remove the view directory and the build output tree.
///
/// Paths that do not exist are skipped. The two removals run concurrently.
pub async fn clean_workspace(views_dir: &Path, build_dir: &Path) -> Result<(), CleanError> {
    tokio::try_join!(remove_path(views_dir), remove_path(build_dir))?;
    Ok(())
}

async fn remove_path(path: &Path) -> Result<(), CleanError> {
    let metadata = match tokio::fs::symlink_metadata(path).await {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "nothing to clean");
            return Ok(());
        }
        Err(e) => {
            return Err(CleanError {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    let removed = if metadata.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    };

    match removed {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "removed");
            Ok(())
        }
        // Raced with another process removing it first
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "already removed");
            Ok(())
        }
        Err(e) => Err(CleanError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

#[derive(Debug, thiserror::Error)]
#[error("failed to remove {path}")]
pub struct CleanError {
    pub path: PathBuf,
    pub source: std::io::Error,
}
