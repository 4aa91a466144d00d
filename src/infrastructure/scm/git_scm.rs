use super::repository_provider::{CloneError, RepositoryProvider};
use crate::domain::entities::RepositoryDefinition;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::fs as async_fs;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Errors from running arbitrary git subcommands in a cloned repository
#[derive(Debug, thiserror::Error)]
pub enum GitCommandError {
    #[error("repository {name} is not cloned at {}. Run 'mess repo {name} get' first", .path.display())]
    NotCloned { name: String, path: PathBuf },

    #[error("failed to run {executable}: {source}")]
    SpawnFailed {
        executable: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git {command} in {name} failed with exit code {exit_code}")]
    Failed {
        name: String,
        command: String,
        exit_code: i32,
    },
}

impl GitCommandError {
    /// Exit code reported by git, when it ran
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Failed { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }
}

/// Git-backed repository provider rooted at the workspace's `repos/` directory
pub struct GitRepositoryProvider {
    git_executable: String,
    repos_root: PathBuf,
}

impl GitRepositoryProvider {
    /// Create a provider that clones into `repos_root` with `git` from PATH
    pub fn new(repos_root: impl Into<PathBuf>) -> Self {
        Self {
            git_executable: "git".to_string(),
            repos_root: repos_root.into(),
        }
    }

    /// Use a custom git executable
    pub fn with_executable(mut self, executable: impl Into<String>) -> Self {
        self.git_executable = executable.into();
        self
    }

    /// Run `git <args…>` inside a cloned repository with inherited stdio
    pub async fn run_git(&self, name: &str, args: &[String]) -> Result<(), GitCommandError> {
        let path = self.repository_path(name);
        if !self.is_cloned(name) {
            return Err(GitCommandError::NotCloned {
                name: name.to_string(),
                path,
            });
        }

        debug!("Running {} {:?} in {}", self.git_executable, args, path.display());

        let status = Command::new(&self.git_executable)
            .args(args)
            .current_dir(&path)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|source| GitCommandError::SpawnFailed {
                executable: self.git_executable.clone(),
                source,
            })?;

        if !status.success() {
            return Err(GitCommandError::Failed {
                name: name.to_string(),
                command: args.join(" "),
                exit_code: status.code().unwrap_or(-1),
            });
        }

        Ok(())
    }

    async fn remove_partial_clone(&self, target: &Path) {
        if async_fs::symlink_metadata(target).await.is_err() {
            return;
        }
        if let Err(e) = async_fs::remove_dir_all(target).await {
            warn!(
                "Failed to clean up partial clone at {}: {}",
                target.display(),
                e
            );
        }
    }
}

#[async_trait]
impl RepositoryProvider for GitRepositoryProvider {
    fn repository_path(&self, name: &str) -> PathBuf {
        self.repos_root.join(name)
    }

    fn is_cloned(&self, name: &str) -> bool {
        let path = self.repository_path(name);
        path.is_dir() && path.join(".git").exists()
    }

    async fn clone_repository(&self, repo: &RepositoryDefinition) -> Result<PathBuf, CloneError> {
        async_fs::create_dir_all(&self.repos_root)
            .await
            .map_err(|source| CloneError::CreateDirFailed {
                path: self.repos_root.clone(),
                source,
            })?;

        let target = self.repository_path(&repo.name);
        if async_fs::symlink_metadata(&target).await.is_ok() {
            return Err(CloneError::already_exists(target));
        }

        info!("Cloning {} from {}", repo.name, repo.url);

        let mut cmd = Command::new(&self.git_executable);
        cmd.arg("clone")
            .args(&repo.clone_params)
            .arg(&repo.url)
            .arg(&target)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        debug!("Running {:?}", cmd);

        let status = match cmd.status().await {
            Ok(status) => status,
            Err(source) => {
                self.remove_partial_clone(&target).await;
                return Err(CloneError::SpawnFailed {
                    name: repo.name.clone(),
                    executable: self.git_executable.clone(),
                    source,
                });
            }
        };

        if !status.success() {
            self.remove_partial_clone(&target).await;
            return Err(CloneError::git_failed(
                &repo.url,
                &target,
                status.code().unwrap_or(-1),
            ));
        }

        Ok(target)
    }
}
