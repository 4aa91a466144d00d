use super::script::ScriptSpec;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;
use validator::Validate;

/// マニフェスト検証エラー
#[derive(Debug, Error)]
pub enum ManifestValidationError {
    #[error("invalid manifest field: {0}")]
    InvalidField(#[from] validator::ValidationErrors),

    #[error("{kind} name '{name}' cannot be used as a directory name")]
    InvalidName { kind: &'static str, name: String },

    #[error("duplicate repo name: {0}")]
    DuplicateRepository(String),

    #[error("duplicate application name: {0}")]
    DuplicateApplication(String),

    #[error("application {application} references non-existent repo: {repository}")]
    UnknownDependency {
        application: String,
        repository: String,
    },
}

/// `null` を既定値として読み込む（古いマニフェストは空リストを null で書き出している）
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// マニフェストのリポジトリ定義
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct RepositoryDefinition {
    /// リポジトリ名（`repos/` 以下のディレクトリ名）
    #[validate(length(min = 1, message = "repo name cannot be empty"))]
    pub name: String,

    /// クローン元のURL
    #[validate(length(min = 1, message = "repo URL cannot be empty"))]
    pub url: String,

    /// `git clone` に追加で渡す引数
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub clone_params: Vec<String>,
}

impl RepositoryDefinition {
    /// 新しいRepositoryDefinitionインスタンスを作成
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            clone_params: Vec::new(),
        }
    }

    /// クローン引数を設定
    pub fn with_clone_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.clone_params = params.into_iter().map(Into::into).collect();
        self
    }
}

/// アプリケーション定義
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ApplicationDefinition {
    /// アプリケーション名（`applications/` 以下のディレクトリ名）
    #[validate(length(min = 1, message = "application name cannot be empty"))]
    pub name: String,

    /// 依存するリポジトリ名（リンク順）
    #[serde(default, deserialize_with = "null_as_default")]
    pub repos: Vec<String>,

    /// 名前付きスクリプト
    #[serde(default, deserialize_with = "null_as_default")]
    pub scripts: BTreeMap<String, ScriptSpec>,

    /// スクリプト実行時に追加・上書きされる環境変数
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub env: BTreeMap<String, String>,

    /// セットアップ前に実行するコマンド
    #[serde(
        rename = "pre-setup",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub pre_setup: Option<String>,

    /// セットアップ後に実行するコマンド
    #[serde(
        rename = "post-setup",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub post_setup: Option<String>,
}

impl ApplicationDefinition {
    /// 依存関係もスクリプトも持たないアプリケーションを作成
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            repos: Vec::new(),
            scripts: BTreeMap::new(),
            env: BTreeMap::new(),
            pre_setup: None,
            post_setup: None,
        }
    }

    /// 依存リポジトリを設定
    pub fn with_repos<I, S>(mut self, repos: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.repos = repos.into_iter().map(Into::into).collect();
        self
    }

    /// スクリプトを追加
    pub fn with_script(mut self, name: impl Into<String>, script: ScriptSpec) -> Self {
        self.scripts.insert(name.into(), script);
        self
    }

    /// 環境変数を追加
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// pre-setupコマンドを設定
    pub fn with_pre_setup(mut self, command: impl Into<String>) -> Self {
        self.pre_setup = Some(command.into());
        self
    }

    /// post-setupコマンドを設定
    pub fn with_post_setup(mut self, command: impl Into<String>) -> Self {
        self.post_setup = Some(command.into());
        self
    }

    /// 実行すべきpre-setupコマンド（空文字列は未設定扱い）
    pub fn pre_setup_command(&self) -> Option<&str> {
        self.pre_setup.as_deref().filter(|c| !c.trim().is_empty())
    }

    /// 実行すべきpost-setupコマンド（空文字列は未設定扱い）
    pub fn post_setup_command(&self) -> Option<&str> {
        self.post_setup.as_deref().filter(|c| !c.trim().is_empty())
    }

    /// 名前でスクリプトを取得
    pub fn script(&self, name: &str) -> Option<&ScriptSpec> {
        self.scripts.get(name)
    }

    /// スクリプト名の一覧（ソート済み）
    pub fn script_names(&self) -> Vec<&str> {
        self.scripts.keys().map(String::as_str).collect()
    }

    /// 指定したリポジトリに依存しているか
    pub fn depends_on(&self, repo_name: &str) -> bool {
        self.repos.iter().any(|r| r == repo_name)
    }
}

/// プロジェクトのマニフェスト（mess.json）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Manifest {
    /// プロジェクト名
    #[validate(length(min = 1, message = "project name cannot be empty"))]
    pub name: String,

    /// リポジトリ定義のリスト
    #[serde(default, deserialize_with = "null_as_default")]
    #[validate(nested)]
    pub repos: Vec<RepositoryDefinition>,

    /// アプリケーション定義のリスト
    #[serde(default, deserialize_with = "null_as_default")]
    #[validate(nested)]
    pub applications: Vec<ApplicationDefinition>,
}

impl Manifest {
    /// 空のマニフェストを作成
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            repos: Vec::new(),
            applications: Vec::new(),
        }
    }

    /// リポジトリを追加
    pub fn with_repo(mut self, repo: RepositoryDefinition) -> Self {
        self.repos.push(repo);
        self
    }

    /// アプリケーションを追加
    pub fn with_application(mut self, application: ApplicationDefinition) -> Self {
        self.applications.push(application);
        self
    }

    /// 名前でリポジトリを検索
    pub fn find_repo(&self, name: &str) -> Option<&RepositoryDefinition> {
        self.repos.iter().find(|r| r.name == name)
    }

    /// 名前でアプリケーションを検索
    pub fn find_application(&self, name: &str) -> Option<&ApplicationDefinition> {
        self.applications.iter().find(|a| a.name == name)
    }

    /// 名前でアプリケーションを検索（変更可能）
    pub fn find_application_mut(&mut self, name: &str) -> Option<&mut ApplicationDefinition> {
        self.applications.iter_mut().find(|a| a.name == name)
    }

    /// リポジトリ名の一覧（定義順）
    pub fn repo_names(&self) -> Vec<&str> {
        self.repos.iter().map(|r| r.name.as_str()).collect()
    }

    /// アプリケーション名の一覧（定義順）
    pub fn application_names(&self) -> Vec<&str> {
        self.applications.iter().map(|a| a.name.as_str()).collect()
    }

    /// 指定したリポジトリに依存しているアプリケーション名
    pub fn applications_using(&self, repo_name: &str) -> Vec<&str> {
        self.applications
            .iter()
            .filter(|a| a.depends_on(repo_name))
            .map(|a| a.name.as_str())
            .collect()
    }

    /// マニフェスト全体を検証
    pub fn validate_manifest(&self) -> Result<(), ManifestValidationError> {
        self.validate()?;

        let mut repo_names = HashSet::new();
        for repo in &self.repos {
            check_path_component("repo", &repo.name)?;
            if !repo_names.insert(repo.name.as_str()) {
                return Err(ManifestValidationError::DuplicateRepository(
                    repo.name.clone(),
                ));
            }
        }

        let mut app_names = HashSet::new();
        for app in &self.applications {
            check_path_component("application", &app.name)?;
            if !app_names.insert(app.name.as_str()) {
                return Err(ManifestValidationError::DuplicateApplication(
                    app.name.clone(),
                ));
            }

            if let Some(missing) = app.repos.iter().find(|r| !repo_names.contains(r.as_str())) {
                return Err(ManifestValidationError::UnknownDependency {
                    application: app.name.clone(),
                    repository: missing.clone(),
                });
            }
        }

        Ok(())
    }
}

fn check_path_component(kind: &'static str, name: &str) -> Result<(), ManifestValidationError> {
    if name == "." || name == ".." || name.contains('/') || name.contains('\\') {
        return Err(ManifestValidationError::InvalidName {
            kind,
            name: name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_manifest() -> Manifest {
        Manifest::new("sample-project")
            .with_repo(RepositoryDefinition::new(
                "frontend",
                "https://github.com/example/frontend.git",
            ))
            .with_repo(
                RepositoryDefinition::new("backend", "https://github.com/example/backend.git")
                    .with_clone_params(["--depth", "1"]),
            )
            .with_application(
                ApplicationDefinition::new("web-app")
                    .with_repos(["frontend", "backend"])
                    .with_script("start", ScriptSpec::single("npm start"))
                    .with_script("build", ScriptSpec::batch(["build:a", "build:b"]))
                    .with_env("NODE_ENV", "development"),
            )
    }

    #[test]
    fn test_sample_manifest_is_valid() {
        assert!(sample_manifest().validate_manifest().is_ok());
    }

    #[test]
    fn test_parse_manifest_json() {
        let json = r#"{
            "name": "proj",
            "repos": [
                {"name": "backend", "url": "git@example.com:backend.git", "clone_params": ["--depth", "1"]}
            ],
            "applications": [
                {
                    "name": "web",
                    "repos": ["backend"],
                    "scripts": {"start": "run-server", "build": ["build-a", "build-b"]},
                    "env": {"PORT": "8080"},
                    "pre-setup": "echo pre",
                    "post-setup": ""
                }
            ]
        }"#;

        let manifest: Manifest = serde_json::from_str(json).unwrap();
        let app = manifest.find_application("web").unwrap();

        assert_eq!(manifest.find_repo("backend").unwrap().clone_params, vec!["--depth", "1"]);
        assert_eq!(app.script("start"), Some(&ScriptSpec::single("run-server")));
        assert_eq!(app.script("build"), Some(&ScriptSpec::batch(["build-a", "build-b"])));
        assert_eq!(app.env.get("PORT").map(String::as_str), Some("8080"));
        assert_eq!(app.pre_setup_command(), Some("echo pre"));
        assert_eq!(app.post_setup_command(), None);
    }

    #[test]
    fn test_null_collections_are_read_as_empty() {
        let json = r#"{
            "name": "proj",
            "repos": null,
            "applications": [{"name": "web", "repos": null, "scripts": null}]
        }"#;

        let manifest: Manifest = serde_json::from_str(json).unwrap();
        assert!(manifest.repos.is_empty());
        let app = manifest.find_application("web").unwrap();
        assert!(app.repos.is_empty());
        assert!(app.scripts.is_empty());
    }

    #[test]
    fn test_null_clone_params_are_read_as_empty() {
        let json = r#"{
            "name": "proj",
            "repos": [
                {"name": "backend", "url": "https://example.com/backend.git", "clone_params": null},
                {"name": "frontend", "url": "https://example.com/frontend.git"}
            ],
            "applications": []
        }"#;

        let manifest: Manifest = serde_json::from_str(json).unwrap();
        assert!(manifest.find_repo("backend").unwrap().clone_params.is_empty());
        assert!(manifest.find_repo("frontend").unwrap().clone_params.is_empty());
        assert!(manifest.validate_manifest().is_ok());
    }

    #[test]
    fn test_optional_fields_are_omitted_when_empty() {
        let manifest = Manifest::new("proj")
            .with_repo(RepositoryDefinition::new("r", "u"))
            .with_application(ApplicationDefinition::new("a"));

        let value = serde_json::to_value(&manifest).unwrap();
        let repo = &value["repos"][0];
        let app = &value["applications"][0];

        assert!(repo.get("clone_params").is_none());
        assert!(app.get("env").is_none());
        assert!(app.get("pre-setup").is_none());
        assert!(app.get("post-setup").is_none());
        assert!(app.get("scripts").is_some());
        assert!(app.get("repos").is_some());
    }

    #[test]
    fn test_validation_rejects_empty_names() {
        let manifest = Manifest::new("");
        assert!(matches!(
            manifest.validate_manifest(),
            Err(ManifestValidationError::InvalidField(_))
        ));

        let manifest = Manifest::new("proj").with_repo(RepositoryDefinition::new("r", ""));
        assert!(matches!(
            manifest.validate_manifest(),
            Err(ManifestValidationError::InvalidField(_))
        ));
    }

    #[test]
    fn test_validation_rejects_duplicates() {
        let manifest = Manifest::new("proj")
            .with_repo(RepositoryDefinition::new("r", "u1"))
            .with_repo(RepositoryDefinition::new("r", "u2"));
        assert!(matches!(
            manifest.validate_manifest(),
            Err(ManifestValidationError::DuplicateRepository(name)) if name == "r"
        ));

        let manifest = Manifest::new("proj")
            .with_application(ApplicationDefinition::new("a"))
            .with_application(ApplicationDefinition::new("a"));
        assert!(matches!(
            manifest.validate_manifest(),
            Err(ManifestValidationError::DuplicateApplication(name)) if name == "a"
        ));
    }

    #[test]
    fn test_validation_rejects_unknown_dependency() {
        let manifest = Manifest::new("proj")
            .with_repo(RepositoryDefinition::new("r", "u"))
            .with_application(ApplicationDefinition::new("a").with_repos(["r", "ghost"]));

        let err = manifest.validate_manifest().unwrap_err();
        assert_eq!(
            err.to_string(),
            "application a references non-existent repo: ghost"
        );
    }

    #[test]
    fn test_validation_rejects_path_like_names() {
        for bad in ["..", ".", "a/b", "a\\b"] {
            let manifest = Manifest::new("proj").with_repo(RepositoryDefinition::new(bad, "u"));
            assert!(matches!(
                manifest.validate_manifest(),
                Err(ManifestValidationError::InvalidName { kind: "repo", .. })
            ));
        }
    }

    #[test]
    fn test_applications_using() {
        let manifest = sample_manifest()
            .with_application(ApplicationDefinition::new("api").with_repos(["backend"]));

        assert_eq!(manifest.applications_using("backend"), vec!["web-app", "api"]);
        assert_eq!(manifest.applications_using("frontend"), vec!["web-app"]);
        assert!(manifest.applications_using("nothing").is_empty());
    }
}
