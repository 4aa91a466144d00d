use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs as async_fs;
use tracing::debug;

use crate::domain::entities::{Manifest, ManifestValidationError};

/// Default manifest file name, looked up in the current directory
pub const DEFAULT_MANIFEST_FILE: &str = "mess.json";

/// Manifest store related errors
#[derive(Debug, Error)]
pub enum ManifestStoreError {
    #[error("manifest file not found: {}. Run 'mess init' first", .0.display())]
    NotFound(PathBuf),

    #[error("manifest file already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("failed to read manifest {}: {source}", .path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest {}: {source}", .path.display())]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid manifest {}: {source}", .path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: ManifestValidationError,
    },

    #[error("failed to serialize manifest: {0}")]
    SerializeFailed(#[from] serde_json::Error),

    #[error("failed to write manifest {}: {source}", .path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reads and writes `mess.json`
#[derive(Debug, Default, Clone)]
pub struct ManifestStore;

impl ManifestStore {
    /// Create a new manifest store
    pub fn new() -> Self {
        Self
    }

    /// Read, parse and validate a manifest
    pub async fn read_manifest<P: AsRef<Path>>(
        &self,
        manifest_path: P,
    ) -> Result<Manifest, ManifestStoreError> {
        let manifest_path = manifest_path.as_ref();

        let content = match async_fs::read_to_string(manifest_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ManifestStoreError::NotFound(manifest_path.to_path_buf()));
            }
            Err(source) => {
                return Err(ManifestStoreError::ReadFailed {
                    path: manifest_path.to_path_buf(),
                    source,
                });
            }
        };

        let manifest: Manifest =
            serde_json::from_str(&content).map_err(|source| ManifestStoreError::ParseFailed {
                path: manifest_path.to_path_buf(),
                source,
            })?;

        manifest
            .validate_manifest()
            .map_err(|source| ManifestStoreError::Invalid {
                path: manifest_path.to_path_buf(),
                source,
            })?;

        debug!(
            "Loaded manifest {} ({} repos, {} applications)",
            manifest_path.display(),
            manifest.repos.len(),
            manifest.applications.len()
        );

        Ok(manifest)
    }

    /// Validate and write a manifest, replacing any existing file
    pub async fn write_manifest<P: AsRef<Path>>(
        &self,
        manifest_path: P,
        manifest: &Manifest,
    ) -> Result<(), ManifestStoreError> {
        let manifest_path = manifest_path.as_ref();

        manifest
            .validate_manifest()
            .map_err(|source| ManifestStoreError::Invalid {
                path: manifest_path.to_path_buf(),
                source,
            })?;

        // Ensure parent directory exists
        if let Some(parent) = manifest_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                async_fs::create_dir_all(parent)
                    .await
                    .map_err(|source| ManifestStoreError::WriteFailed {
                        path: manifest_path.to_path_buf(),
                        source,
                    })?;
            }
        }

        let mut content = serde_json::to_string_pretty(manifest)?;
        content.push('\n');

        async_fs::write(manifest_path, content)
            .await
            .map_err(|source| ManifestStoreError::WriteFailed {
                path: manifest_path.to_path_buf(),
                source,
            })?;

        debug!("Wrote manifest {}", manifest_path.display());
        Ok(())
    }

    /// Write a new manifest, failing if the file already exists
    pub async fn create_manifest<P: AsRef<Path>>(
        &self,
        manifest_path: P,
        manifest: &Manifest,
    ) -> Result<(), ManifestStoreError> {
        let manifest_path = manifest_path.as_ref();

        if async_fs::symlink_metadata(manifest_path).await.is_ok() {
            return Err(ManifestStoreError::AlreadyExists(
                manifest_path.to_path_buf(),
            ));
        }

        self.write_manifest(manifest_path, manifest).await
    }
}
