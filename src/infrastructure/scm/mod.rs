/// Repository acquisition
///
/// The materializer talks to [`RepositoryProvider`]; the git implementation
/// shells out to the `git` client with live output.
pub mod git_scm;
pub mod repository_provider;

pub use git_scm::{GitCommandError, GitRepositoryProvider};
pub use repository_provider::{CloneError, RepositoryProvider};
