use std::path::PathBuf;

use crate::application::services::manifest_service::ManifestService;
use crate::common::error::MessError;
use crate::common::result::MessResult;
use crate::domain::value_objects::WorkspacePaths;
use crate::infrastructure::filesystem::ManifestStore;
use crate::infrastructure::scm::{GitRepositoryProvider, RepositoryProvider};
use crate::presentation::cli::RepoAction;
use crate::presentation::ui::display::DisplayHelper;

/// `mess repo <name> ...`
pub struct RepoCommand {
    pub manifest_path: PathBuf,
    pub name: String,
    display: DisplayHelper,
    store: ManifestStore,
    service: ManifestService,
}

impl RepoCommand {
    pub fn new(manifest_path: PathBuf, name: String, display: DisplayHelper) -> Self {
        Self {
            manifest_path,
            name,
            display,
            store: ManifestStore::new(),
            service: ManifestService::new(),
        }
    }

    pub async fn execute(&self, action: &RepoAction) -> MessResult<()> {
        match action {
            RepoAction::Add { url } => self.add(url).await,
            RepoAction::Remove { yes } => self.remove(*yes).await,
            RepoAction::Get => self.get().await,
            RepoAction::Git(args) => self.git(args).await,
        }
    }

    async fn add(&self, url: &str) -> MessResult<()> {
        let mut manifest = self.store.read_manifest(&self.manifest_path).await?;
        self.service.add_repository(&mut manifest, &self.name, url)?;
        self.store.write_manifest(&self.manifest_path, &manifest).await?;

        self.display.success(&format!(
            "Added repository {} ({})",
            self.display.format_name(&self.name),
            self.display.format_url(url)
        ));
        Ok(())
    }

    async fn remove(&self, assume_yes: bool) -> MessResult<()> {
        let mut manifest = self.store.read_manifest(&self.manifest_path).await?;
        self.service.repository(&manifest, &self.name)?;

        if !assume_yes {
            let users = self.service.applications_using(&manifest, &self.name);
            let question = if users.is_empty() {
                format!("Are you sure you want to remove repository '{}'?", self.name)
            } else {
                self.display.warning(&format!(
                    "Repository {} is used in the following applications:",
                    self.display.format_name(&self.name)
                ));
                let names: Vec<&str> = users.iter().map(String::as_str).collect();
                self.display.print_list(&names);
                "Do you want to remove it from all applications as well?".to_string()
            };

            if !self.display.confirm(&question)? {
                self.display.info("Repository removal cancelled.");
                return Ok(());
            }
        }

        let removed = self.service.remove_repository(&mut manifest, &self.name)?;
        self.store.write_manifest(&self.manifest_path, &manifest).await?;

        self.display
            .success(&format!("Removed repository {}", self.display.format_name(&self.name)));
        for app in &removed.affected_applications {
            self.display.debug(&format!("Unlinked from application {}", app));
        }

        let paths = WorkspacePaths::from_manifest_path(&self.manifest_path)?;
        let clone_path = paths.repo_path(&self.name);
        if clone_path.exists() {
            self.display.info(&format!(
                "The cloned files at {} were left in place",
                self.display.format_path(&clone_path)
            ));
        }
        Ok(())
    }

    async fn get(&self) -> MessResult<()> {
        let manifest = self.store.read_manifest(&self.manifest_path).await?;
        let repo = self.service.repository(&manifest, &self.name)?;
        let provider = self.provider()?;

        self.display.info(&format!(
            "Cloning {} from {}",
            self.display.format_name(&repo.name),
            self.display.format_url(&repo.url)
        ));
        let path = provider.clone_repository(repo).await?;

        self.display.success(&format!(
            "Cloned {} into {}",
            self.display.format_name(&repo.name),
            self.display.format_path(&path)
        ));
        Ok(())
    }

    async fn git(&self, args: &[String]) -> MessResult<()> {
        let manifest = self.store.read_manifest(&self.manifest_path).await?;
        self.service.repository(&manifest, &self.name)?;
        let provider = self.provider()?;

        if args.is_empty() {
            return Err(MessError::validation_error(
                "command",
                "missing git subcommand",
                None,
            ));
        }

        self.display.debug(&format!(
            "Executing: git {} in {}",
            args.join(" "),
            provider.repository_path(&self.name).display()
        ));
        provider.run_git(&self.name, args).await?;
        Ok(())
    }

    fn provider(&self) -> MessResult<GitRepositoryProvider> {
        let paths = WorkspacePaths::from_manifest_path(&self.manifest_path)?;
        Ok(GitRepositoryProvider::new(paths.repos_root()))
    }
}
