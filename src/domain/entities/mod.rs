pub mod manifest;
pub mod script;

pub use manifest::{ApplicationDefinition, Manifest, ManifestValidationError, RepositoryDefinition};
pub use script::ScriptSpec;
