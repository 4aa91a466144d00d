use std::path::{Path, PathBuf};

/// Environment variable that relocates the applications root.
pub const APPLICATION_ROOT_ENV: &str = "MESS_APPLICATION_ROOT";

/// Directory (next to the manifest) holding cloned repositories.
pub const REPOS_DIR_NAME: &str = "repos";

/// Directory (next to the manifest, unless overridden) holding application workspaces.
pub const APPLICATIONS_DIR_NAME: &str = "applications";

/// Filesystem layout derived from the manifest location.
///
/// Every path is a pure function of the manifest directory and, for
/// applications, the optional root override. Nothing is checked for existence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspacePaths {
    manifest_dir: PathBuf,
    repos_root: PathBuf,
    applications_root: PathBuf,
}

impl WorkspacePaths {
    /// Build the layout from an absolute manifest directory and an optional
    /// applications root override. An empty override is ignored.
    pub fn new(manifest_dir: impl Into<PathBuf>, applications_override: Option<PathBuf>) -> Self {
        let manifest_dir = manifest_dir.into();
        let repos_root = manifest_dir.join(REPOS_DIR_NAME);
        let applications_root = applications_override
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| manifest_dir.join(APPLICATIONS_DIR_NAME));

        Self {
            manifest_dir,
            repos_root,
            applications_root,
        }
    }

    /// Resolve the layout for a manifest file, honoring `MESS_APPLICATION_ROOT`.
    ///
    /// A relative manifest path is resolved against the current directory so
    /// that symlink targets are always absolute.
    pub fn from_manifest_path(manifest_path: &Path) -> std::io::Result<Self> {
        let override_root = std::env::var_os(APPLICATION_ROOT_ENV).map(PathBuf::from);
        Self::from_manifest_path_with_override(manifest_path, override_root)
    }

    /// Same as [`WorkspacePaths::from_manifest_path`] with an explicit override.
    pub fn from_manifest_path_with_override(
        manifest_path: &Path,
        applications_override: Option<PathBuf>,
    ) -> std::io::Result<Self> {
        let manifest_dir = match manifest_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::new(),
        };

        let current_dir = std::env::current_dir()?;
        let manifest_dir = absolutize(&current_dir, &manifest_dir);
        let applications_override = applications_override
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| absolutize(&current_dir, &p));

        Ok(Self::new(manifest_dir, applications_override))
    }

    /// Directory containing the manifest file.
    pub fn manifest_dir(&self) -> &Path {
        &self.manifest_dir
    }

    /// `<manifestDir>/repos`
    pub fn repos_root(&self) -> &Path {
        &self.repos_root
    }

    /// `<manifestDir>/applications` or the override.
    pub fn applications_root(&self) -> &Path {
        &self.applications_root
    }

    /// `reposRoot/<name>`
    pub fn repo_path(&self, name: &str) -> PathBuf {
        self.repos_root.join(name)
    }

    /// `applicationsRoot/<name>`
    pub fn app_dir(&self, name: &str) -> PathBuf {
        self.applications_root.join(name)
    }

    /// `appDir(app)/<dependency>`
    pub fn link_path(&self, app: &str, dependency: &str) -> PathBuf {
        self.app_dir(app).join(dependency)
    }
}

fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else if path.as_os_str().is_empty() {
        base.to_path_buf()
    } else {
        base.join(path)
    }
}
