use crate::domain::entities::RepositoryDefinition;
use async_trait::async_trait;
use std::path::PathBuf;

/// Errors that can occur while cloning a repository
#[derive(Debug, thiserror::Error)]
pub enum CloneError {
    #[error("repository directory already exists: {}", .path.display())]
    AlreadyExists { path: PathBuf },

    #[error("failed to create repositories directory {}: {source}", .path.display())]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to run {executable} for {name}: {source}")]
    SpawnFailed {
        name: String,
        executable: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git clone of {url} into {} failed with exit code {exit_code}", .path.display())]
    GitFailed {
        url: String,
        path: PathBuf,
        exit_code: i32,
    },
}

impl CloneError {
    /// Create an already-exists error
    pub fn already_exists(path: impl Into<PathBuf>) -> Self {
        Self::AlreadyExists { path: path.into() }
    }

    /// Create a git-failed error
    pub fn git_failed(url: impl Into<String>, path: impl Into<PathBuf>, exit_code: i32) -> Self {
        Self::GitFailed {
            url: url.into(),
            path: path.into(),
            exit_code,
        }
    }
}

/// Source of repository working copies.
///
/// The materializer only needs to know whether a repository is present and
/// how to obtain it, so tests can swap in a fake without touching git.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RepositoryProvider: Send + Sync {
    /// Path where the repository's working copy lives (whether or not it exists)
    fn repository_path(&self, name: &str) -> PathBuf;

    /// Whether a usable working copy is present
    fn is_cloned(&self, name: &str) -> bool;

    /// Clone the repository into [`RepositoryProvider::repository_path`].
    ///
    /// Never overwrites an existing target. A failed clone leaves nothing behind.
    async fn clone_repository(&self, repo: &RepositoryDefinition) -> Result<PathBuf, CloneError>;
}
