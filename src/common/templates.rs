/// Templates module for embedded manifest templates
use std::collections::HashMap;

/// Placeholder substituted with the project name
pub const PROJECT_NAME_PLACEHOLDER: &str = "project_name";

/// Get the sample mess.json template content
/// The template is embedded at compile time using include_str! macro
pub fn get_sample_manifest_template() -> &'static str {
    include_str!("../../templates/mess.json")
}

/// Template replacement functionality
pub struct TemplateProcessor;

impl TemplateProcessor {
    /// Create a new template processor
    pub fn new() -> Self {
        Self
    }

    /// Replace every `{{key}}` in `template` with its value
    pub fn process(&self, template: &str, replacements: &HashMap<String, String>) -> String {
        replacements
            .iter()
            .fold(template.to_string(), |content, (key, value)| {
                content.replace(&format!("{{{{{}}}}}", key), value)
            })
    }

    /// Sample manifest for `project_name`
    ///
    /// The name is JSON-escaped so any directory name yields a valid document.
    pub fn sample_manifest(&self, project_name: &str) -> String {
        let escaped = serde_json::to_string(project_name)
            .map(|quoted| quoted[1..quoted.len() - 1].to_string())
            .unwrap_or_else(|_| project_name.to_string());

        let mut replacements = HashMap::new();
        replacements.insert(PROJECT_NAME_PLACEHOLDER.to_string(), escaped);
        self.process(get_sample_manifest_template(), &replacements)
    }
}

impl Default for TemplateProcessor {
    fn default() -> Self {
        Self::new()
    }
}
