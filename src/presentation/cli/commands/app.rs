use std::path::PathBuf;
use std::sync::Arc;

use crate::application::services::manifest_service::ManifestService;
use crate::application::use_cases::materialize_application::{
    MaterializeApplicationUseCase, MaterializeConfig, MaterializeEvent, MaterializeMode,
};
use crate::application::use_cases::run_script::RunScriptUseCase;
use crate::common::result::MessResult;
use crate::domain::entities::ScriptSpec;
use crate::domain::value_objects::WorkspacePaths;
use crate::infrastructure::filesystem::ManifestStore;
use crate::infrastructure::scm::GitRepositoryProvider;
use crate::presentation::cli::AppAction;
use crate::presentation::ui::display::DisplayHelper;

/// `mess app <name> ...`
pub struct AppCommand {
    pub manifest_path: PathBuf,
    pub name: String,
    display: DisplayHelper,
    store: ManifestStore,
    service: ManifestService,
}

impl AppCommand {
    pub fn new(manifest_path: PathBuf, name: String, display: DisplayHelper) -> Self {
        Self {
            manifest_path,
            name,
            display,
            store: ManifestStore::new(),
            service: ManifestService::new(),
        }
    }

    pub async fn execute(&self, action: &AppAction) -> MessResult<()> {
        match action {
            AppAction::Init => self.init().await,
            AppAction::Link { repos } => self.link(repos).await,
            AppAction::Setup => self.materialize(MaterializeMode::Setup).await,
            AppAction::Clone => self.materialize(MaterializeMode::Clone).await,
            AppAction::Run { script } => self.run(script).await,
        }
    }

    async fn init(&self) -> MessResult<()> {
        let mut manifest = self.store.read_manifest(&self.manifest_path).await?;
        self.service.add_application(&mut manifest, &self.name)?;
        self.store.write_manifest(&self.manifest_path, &manifest).await?;

        self.display.success(&format!(
            "Created application {}",
            self.display.format_name(&self.name)
        ));
        Ok(())
    }

    async fn link(&self, repos: &[String]) -> MessResult<()> {
        let mut manifest = self.store.read_manifest(&self.manifest_path).await?;
        let outcome = self
            .service
            .link_repositories(&mut manifest, &self.name, repos)?;

        for repo in &outcome.already_linked {
            self.display.warning(&format!(
                "Repository {} is already linked to application {}, skipping",
                self.display.format_name(repo),
                self.display.format_name(&self.name)
            ));
        }

        if outcome.linked.is_empty() {
            self.display.info("No new repositories to link");
            return Ok(());
        }

        self.store.write_manifest(&self.manifest_path, &manifest).await?;
        self.display.success(&format!(
            "Linked {} to application {}",
            outcome.linked.join(", "),
            self.display.format_name(&self.name)
        ));
        Ok(())
    }

    async fn materialize(&self, mode: MaterializeMode) -> MessResult<()> {
        let manifest = self.store.read_manifest(&self.manifest_path).await?;
        let app = self.service.application(&manifest, &self.name)?;
        let paths = WorkspacePaths::from_manifest_path(&self.manifest_path)?;

        self.display.debug(&format!(
            "repos: {}, applications: {}",
            paths.repos_root().display(),
            paths.applications_root().display()
        ));

        let provider = Arc::new(GitRepositoryProvider::new(paths.repos_root()));
        let display = self.display.clone();
        let use_case = MaterializeApplicationUseCase::new(
            provider,
            paths,
            MaterializeConfig::default().with_mode(mode),
        )
        .with_event_handler(Arc::new(move |event: &MaterializeEvent| {
            display.print_materialize_event(event)
        }));

        let report = use_case.execute(app, &manifest).await?;

        let verb = match mode {
            MaterializeMode::Setup => "Set up",
            MaterializeMode::Clone => "Cloned",
        };
        self.display.success(&format!(
            "{} application {} at {} ({} cloned, {} linked)",
            verb,
            self.display.format_name(&self.name),
            self.display.format_path(&report.app_dir),
            report.cloned_count(),
            report.links.len()
        ));
        if !report.skipped_dependencies.is_empty() {
            self.display.warning(&format!(
                "Skipped undefined repositories: {}",
                report.skipped_dependencies.join(", ")
            ));
        }
        Ok(())
    }

    async fn run(&self, script_name: &str) -> MessResult<()> {
        let manifest = self.store.read_manifest(&self.manifest_path).await?;
        let app = self.service.application(&manifest, &self.name)?;
        let paths = WorkspacePaths::from_manifest_path(&self.manifest_path)?;
        let display = self.display.clone();
        let use_case = RunScriptUseCase::new(paths).with_start_handler(Arc::new(
            move |script: &ScriptSpec| match script {
                ScriptSpec::Single(command) => {
                    display.info(&format!("Executing: {}", display.format_command(command)));
                }
                ScriptSpec::Batch(commands) => {
                    display.info(&format!("Executing {} commands in parallel", commands.len()));
                    for (i, command) in commands.iter().enumerate() {
                        println!("  [{}] {}", i + 1, display.format_command(command));
                    }
                }
            },
        ));

        use_case.execute(app, script_name).await?;

        self.display.success(&format!(
            "Script {} finished for application {}",
            self.display.format_name(script_name),
            self.display.format_name(&self.name)
        ));
        Ok(())
    }
}
