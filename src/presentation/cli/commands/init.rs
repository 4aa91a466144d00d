use std::path::PathBuf;

use crate::common::result::{MessResult, OptionExt};
use crate::common::templates::TemplateProcessor;
use crate::domain::entities::Manifest;
use crate::domain::value_objects::WorkspacePaths;
use crate::infrastructure::filesystem::ManifestStore;
use crate::presentation::ui::display::DisplayHelper;

/// Create a new mess.json
pub struct InitCommand {
    /// Manifest file to create
    pub manifest_path: PathBuf,
    /// Project name; the manifest directory name when absent
    pub name: Option<String>,
    /// Write the sample manifest instead of an empty one
    pub sample: bool,
    /// Force overwrite existing file
    pub force: bool,
    display: DisplayHelper,
}

impl InitCommand {
    pub fn new(
        manifest_path: PathBuf,
        name: Option<String>,
        sample: bool,
        force: bool,
        display: DisplayHelper,
    ) -> Self {
        Self {
            manifest_path,
            name,
            sample,
            force,
            display,
        }
    }

    /// Execute the init command
    pub async fn execute(&self) -> MessResult<()> {
        let paths = WorkspacePaths::from_manifest_path_with_override(&self.manifest_path, None)?;

        let name = match &self.name {
            Some(name) => name.clone(),
            None => paths
                .manifest_dir()
                .file_name()
                .and_then(|n| n.to_str())
                .map(String::from)
                .ok_or_validation_error(
                    "name",
                    "cannot derive a project name from the directory, pass --name",
                )?,
        };

        let manifest: Manifest = if self.sample {
            serde_json::from_str(&TemplateProcessor::new().sample_manifest(&name))?
        } else {
            Manifest::new(&name)
        };

        let store = ManifestStore::new();
        if self.force {
            store.write_manifest(&self.manifest_path, &manifest).await?;
        } else {
            store.create_manifest(&self.manifest_path, &manifest).await?;
        }

        self.display.success(&format!(
            "Created {} for project {}",
            self.display.format_path(&paths.manifest_dir().join(
                self.manifest_path
                    .file_name()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| self.manifest_path.clone())
            )),
            self.display.format_name(&name)
        ));

        println!();
        println!("Next steps:");
        if self.sample {
            println!("   1. Edit the manifest to point at your repositories");
            println!("   2. Run 'mess app web-app setup' to assemble the sample application");
        } else {
            println!("   1. Add repositories with 'mess repo <name> add <url>'");
            println!("   2. Create an application with 'mess app <name> init'");
            println!("   3. Link repositories with 'mess app <name> link <repo>...'");
        }

        Ok(())
    }
}
