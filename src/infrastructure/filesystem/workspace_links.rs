use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs as async_fs;
use tracing::debug;

/// Workspace link errors
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("failed to remove existing entry at {}: {source}", .path.display())]
    RemoveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot replace non-empty directory {} with a link", .path.display())]
    OccupiedByDirectory { path: PathBuf },

    #[error("failed to create symlink {} -> {}: {source}", .link.display(), .target.display())]
    CreateFailed {
        link: PathBuf,
        target: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Make `link` a symbolic link pointing at `target`.
///
/// Whatever currently sits at `link` is removed first: a file, a symlink
/// (dangling or not) or an empty directory. A non-empty directory is left
/// untouched and reported.
pub async fn replace_with_symlink(target: &Path, link: &Path) -> Result<(), LinkError> {
    if let Ok(metadata) = async_fs::symlink_metadata(link).await {
        let file_type = metadata.file_type();
        let removal = if file_type.is_dir() {
            if !is_empty_dir(link).await {
                return Err(LinkError::OccupiedByDirectory {
                    path: link.to_path_buf(),
                });
            }
            async_fs::remove_dir(link).await
        } else {
            remove_link_entry(link).await
        };

        removal.map_err(|source| LinkError::RemoveFailed {
            path: link.to_path_buf(),
            source,
        })?;
        debug!("Removed existing entry at {}", link.display());
    }

    create_symlink(target, link)
        .await
        .map_err(|source| LinkError::CreateFailed {
            link: link.to_path_buf(),
            target: target.to_path_buf(),
            source,
        })?;

    debug!("Linked {} -> {}", link.display(), target.display());
    Ok(())
}

async fn is_empty_dir(path: &Path) -> bool {
    match async_fs::read_dir(path).await {
        Ok(mut entries) => matches!(entries.next_entry().await, Ok(None)),
        Err(_) => false,
    }
}

#[cfg(unix)]
async fn remove_link_entry(link: &Path) -> std::io::Result<()> {
    async_fs::remove_file(link).await
}

#[cfg(windows)]
async fn remove_link_entry(link: &Path) -> std::io::Result<()> {
    // directory symlinks on windows are removed with remove_dir
    match async_fs::remove_file(link).await {
        Ok(()) => Ok(()),
        Err(_) => async_fs::remove_dir(link).await,
    }
}

#[cfg(unix)]
async fn create_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    async_fs::symlink(target, link).await
}

#[cfg(windows)]
async fn create_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    async_fs::symlink_dir(target, link).await
}
