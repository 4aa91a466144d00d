pub mod manifest_service;

pub use manifest_service::{LinkOutcome, ManifestService, ManifestServiceError, RemovedRepository};
