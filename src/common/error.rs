use std::path::PathBuf;
use thiserror::Error;

use crate::application::services::manifest_service::ManifestServiceError;
use crate::application::use_cases::materialize_application::MaterializeError;
use crate::application::use_cases::run_script::ScriptError;
use crate::infrastructure::filesystem::ManifestStoreError;
use crate::infrastructure::scm::{CloneError, GitCommandError};

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum MessError {
    #[error("Manifest error: {message}")]
    ManifestError {
        message: String,
        file_path: Option<PathBuf>,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("File system operation failed: {message}")]
    FileSystemError {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("Application error: {message}")]
    ApplicationError {
        message: String,
        application: Option<String>,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("Repository operation failed: {message}")]
    RepositoryError {
        message: String,
        repository_name: Option<String>,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("Command execution failed: {message}")]
    CommandError {
        message: String,
        exit_code: Option<i32>,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("Validation error: {field} - {message}")]
    ValidationError {
        field: String,
        message: String,
        value: Option<String>,
    },

    #[error("Internal error: {message}")]
    InternalError {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },
}

impl MessError {
    pub fn manifest_error_with_source(
        message: impl Into<String>,
        file_path: Option<PathBuf>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ManifestError {
            message: message.into(),
            file_path,
            source: Some(Box::new(source)),
        }
    }

    pub fn filesystem_error_with_source(
        message: impl Into<String>,
        path: Option<PathBuf>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::FileSystemError {
            message: message.into(),
            path,
            source: Some(Box::new(source)),
        }
    }

    pub fn application_error_with_source(
        message: impl Into<String>,
        application: Option<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ApplicationError {
            message: message.into(),
            application,
            source: Some(Box::new(source)),
        }
    }

    pub fn repository_error_with_source(
        message: impl Into<String>,
        repository_name: Option<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::RepositoryError {
            message: message.into(),
            repository_name,
            source: Some(Box::new(source)),
        }
    }

    pub fn command_error_with_source(
        message: impl Into<String>,
        exit_code: Option<i32>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::CommandError {
            message: message.into(),
            exit_code,
            source: Some(Box::new(source)),
        }
    }

    pub fn validation_error(
        field: impl Into<String>,
        message: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
            value,
        }
    }

    pub fn internal_error_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::InternalError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Process exit status for this error.
    ///
    /// A command that ran and exited with a code propagates that code; every
    /// other failure maps to 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::CommandError {
                exit_code: Some(code),
                ..
            } if (1..=255).contains(code) => *code,
            _ => 1,
        }
    }
}

impl From<std::io::Error> for MessError {
    fn from(error: std::io::Error) -> Self {
        Self::filesystem_error_with_source(error.to_string(), None, error)
    }
}

impl From<serde_json::Error> for MessError {
    fn from(error: serde_json::Error) -> Self {
        Self::internal_error_with_source(format!("JSON serialization failed: {}", error), error)
    }
}

impl From<ManifestStoreError> for MessError {
    fn from(error: ManifestStoreError) -> Self {
        let file_path = match &error {
            ManifestStoreError::NotFound(path) | ManifestStoreError::AlreadyExists(path) => {
                Some(path.clone())
            }
            ManifestStoreError::ReadFailed { path, .. }
            | ManifestStoreError::ParseFailed { path, .. }
            | ManifestStoreError::Invalid { path, .. }
            | ManifestStoreError::WriteFailed { path, .. } => Some(path.clone()),
            ManifestStoreError::SerializeFailed(_) => None,
        };
        Self::manifest_error_with_source(error.to_string(), file_path, error)
    }
}

impl From<ManifestServiceError> for MessError {
    fn from(error: ManifestServiceError) -> Self {
        Self::manifest_error_with_source(error.to_string(), None, error)
    }
}

impl From<CloneError> for MessError {
    fn from(error: CloneError) -> Self {
        Self::repository_error_with_source(error.to_string(), None, error)
    }
}

impl From<GitCommandError> for MessError {
    fn from(error: GitCommandError) -> Self {
        match error {
            GitCommandError::NotCloned { ref name, .. } => {
                let name = name.clone();
                Self::repository_error_with_source(error.to_string(), Some(name), error)
            }
            _ => {
                let exit_code = error.exit_code();
                Self::command_error_with_source(error.to_string(), exit_code, error)
            }
        }
    }
}

impl From<MaterializeError> for MessError {
    fn from(error: MaterializeError) -> Self {
        match &error {
            MaterializeError::PathCreation { path, .. } => {
                let path = Some(path.clone());
                Self::filesystem_error_with_source(error.to_string(), path, error)
            }
            MaterializeError::Link { .. } => {
                Self::filesystem_error_with_source(error.to_string(), None, error)
            }
            MaterializeError::Clone { repository, .. } => {
                let repository = Some(repository.clone());
                Self::repository_error_with_source(error.to_string(), repository, error)
            }
            MaterializeError::PreSetup { .. } | MaterializeError::PostSetup { .. } => {
                let exit_code = error.exit_code();
                Self::command_error_with_source(error.to_string(), exit_code, error)
            }
        }
    }
}

impl From<ScriptError> for MessError {
    fn from(error: ScriptError) -> Self {
        match &error {
            ScriptError::ApplicationNotMaterialized { application, .. }
            | ScriptError::ScriptNotFound { application, .. } => {
                let application = Some(application.clone());
                Self::application_error_with_source(error.to_string(), application, error)
            }
            ScriptError::Exec(_) | ScriptError::Batch(_) => {
                let exit_code = error.exit_code();
                Self::command_error_with_source(error.to_string(), exit_code, error)
            }
        }
    }
}
