//! # mess - Multi-repository project orchestration
//!
//! `mess` reads a declarative manifest (`mess.json`) listing source repositories
//! and the applications built from them. It clones the repositories, assembles
//! one workspace directory per application out of symbolic links, and runs the
//! application's lifecycle commands and named scripts inside that workspace.
//!
//! ## Quick Start
//!
//! ```bash
//! mess init
//! mess repo backend add https://github.com/example/backend.git
//! mess app web init
//! mess app web link backend
//! mess app web setup
//! mess app web run start
//! ```
//!
//! ## Workspace layout
//!
//! ```text
//! <manifest dir>/mess.json
//! <manifest dir>/repos/<repo>/                 cloned repositories
//! <manifest dir>/applications/<app>/<repo>     symlinks into repos/
//! ```
//!
//! `MESS_APPLICATION_ROOT` moves the `applications` directory elsewhere.
//!
//! ## Architecture
//!
//! - [`domain`]: manifest model, script shapes and path derivation
//! - [`application`]: materialization, script dispatch and manifest editing
//! - [`infrastructure`]: git, shell processes, symlinks and the manifest file
//! - [`presentation`]: CLI interface and user interaction
//! - [`common`]: shared error handling and templates
//!
//! ## Using the Library
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use mess::application::use_cases::materialize_application::{
//!     MaterializeApplicationUseCase, MaterializeConfig,
//! };
//! use mess::common::result::OptionExt;
//! use mess::domain::value_objects::WorkspacePaths;
//! use mess::infrastructure::filesystem::ManifestStore;
//! use mess::infrastructure::scm::GitRepositoryProvider;
//!
//! # async fn example() -> mess::Result<()> {
//! let manifest_path = Path::new("mess.json");
//! let manifest = ManifestStore::new().read_manifest(manifest_path).await?;
//! let paths = WorkspacePaths::from_manifest_path(manifest_path)?;
//!
//! let app = manifest
//!     .find_application("web")
//!     .ok_or_validation_error("application", "no application named web")?;
//!
//! let provider = Arc::new(GitRepositoryProvider::new(paths.repos_root()));
//! let use_case =
//!     MaterializeApplicationUseCase::new(provider, paths, MaterializeConfig::default());
//! let report = use_case.execute(app, &manifest).await?;
//!
//! println!("{} repositories cloned", report.cloned_count());
//! # Ok(())
//! # }
//! ```

// Documentation attributes
#![deny(rustdoc::broken_intra_doc_links)]

pub mod application;
pub mod common;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

// Re-export commonly used types for convenience
pub use crate::common::error::MessError;
pub use crate::common::result::MessResult as Result;
