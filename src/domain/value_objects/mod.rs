pub mod workspace_paths;

pub use workspace_paths::{WorkspacePaths, APPLICATION_ROOT_ENV};
