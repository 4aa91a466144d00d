/// Infrastructure layer modules
///
/// This layer provides concrete implementations for external system interactions:
/// - Repository acquisition (git clone, git pass-through)
/// - File system operations (manifest file, workspace symlinks)
/// - Process execution (single and concurrent shell commands)
pub mod filesystem;
pub mod process;
pub mod scm;

// Re-export commonly used types
pub use filesystem::{LinkError, ManifestStore, ManifestStoreError};
pub use process::{BatchExecError, CommandExecutor, ExecError, ExecutionConfig};
pub use scm::{CloneError, GitCommandError, GitRepositoryProvider, RepositoryProvider};
