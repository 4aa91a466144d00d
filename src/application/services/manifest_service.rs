use crate::domain::entities::{
    ApplicationDefinition, Manifest, ManifestValidationError, RepositoryDefinition,
};
use thiserror::Error;
use tracing::debug;

/// ManifestService関連のエラー
#[derive(Debug, Error)]
pub enum ManifestServiceError {
    #[error("repo {0} already exists")]
    RepositoryExists(String),

    #[error("repo with URL {url} already exists (name: {existing})")]
    DuplicateUrl { url: String, existing: String },

    #[error("repo {name} not found. Available repos: {available}")]
    RepositoryNotFound { name: String, available: String },

    #[error("application {0} already exists")]
    ApplicationExists(String),

    #[error("application {name} not found. Available applications: {available}")]
    ApplicationNotFound { name: String, available: String },

    #[error(transparent)]
    Validation(#[from] ManifestValidationError),
}

/// リポジトリ削除の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedRepository {
    /// 削除したリポジトリ定義
    pub repository: RepositoryDefinition,
    /// 依存関係から外したアプリケーション名
    pub affected_applications: Vec<String>,
}

/// 依存関係追加の結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkOutcome {
    /// 新たに追加したリポジトリ名（追加順）
    pub linked: Vec<String>,
    /// 既に依存していたためスキップしたリポジトリ名
    pub already_linked: Vec<String>,
}

/// マニフェストのメモリ上の編集
///
/// 変更は検証に通った場合のみ反映される。保存は呼び出し側の責務。
#[derive(Debug, Default, Clone)]
pub struct ManifestService;

impl ManifestService {
    /// 新しいManifestServiceインスタンスを作成
    pub fn new() -> Self {
        Self
    }

    /// 名前でリポジトリを取得（見つからない場合は利用可能な名前を含むエラー）
    pub fn repository<'a>(
        &self,
        manifest: &'a Manifest,
        name: &str,
    ) -> Result<&'a RepositoryDefinition, ManifestServiceError> {
        manifest
            .find_repo(name)
            .ok_or_else(|| ManifestServiceError::RepositoryNotFound {
                name: name.to_string(),
                available: list_or_none(&manifest.repo_names()),
            })
    }

    /// 名前でアプリケーションを取得（見つからない場合は利用可能な名前を含むエラー）
    pub fn application<'a>(
        &self,
        manifest: &'a Manifest,
        name: &str,
    ) -> Result<&'a ApplicationDefinition, ManifestServiceError> {
        manifest
            .find_application(name)
            .ok_or_else(|| ManifestServiceError::ApplicationNotFound {
                name: name.to_string(),
                available: list_or_none(&manifest.application_names()),
            })
    }

    /// リポジトリを追加（名前・URLの重複は拒否）
    pub fn add_repository(
        &self,
        manifest: &mut Manifest,
        name: &str,
        url: &str,
    ) -> Result<(), ManifestServiceError> {
        if manifest.find_repo(name).is_some() {
            return Err(ManifestServiceError::RepositoryExists(name.to_string()));
        }
        if let Some(existing) = manifest.repos.iter().find(|r| r.url == url) {
            return Err(ManifestServiceError::DuplicateUrl {
                url: url.to_string(),
                existing: existing.name.clone(),
            });
        }

        let mut candidate = manifest.clone();
        candidate.repos.push(RepositoryDefinition::new(name, url));
        candidate.validate_manifest()?;

        debug!("Added repository {} ({})", name, url);
        *manifest = candidate;
        Ok(())
    }

    /// リポジトリを削除し、全アプリケーションの依存関係からも外す
    ///
    /// ディスク上のクローンは削除しない。
    pub fn remove_repository(
        &self,
        manifest: &mut Manifest,
        name: &str,
    ) -> Result<RemovedRepository, ManifestServiceError> {
        let index = manifest
            .repos
            .iter()
            .position(|r| r.name == name)
            .ok_or_else(|| ManifestServiceError::RepositoryNotFound {
                name: name.to_string(),
                available: list_or_none(&manifest.repo_names()),
            })?;

        let affected_applications: Vec<String> = manifest
            .applications_using(name)
            .into_iter()
            .map(String::from)
            .collect();

        let repository = manifest.repos.remove(index);
        for app in &mut manifest.applications {
            app.repos.retain(|r| r != name);
        }

        debug!(
            "Removed repository {} (used by {:?})",
            name, affected_applications
        );

        Ok(RemovedRepository {
            repository,
            affected_applications,
        })
    }

    /// アプリケーションを追加（依存・スクリプト・環境変数なし）
    pub fn add_application(
        &self,
        manifest: &mut Manifest,
        name: &str,
    ) -> Result<(), ManifestServiceError> {
        if manifest.find_application(name).is_some() {
            return Err(ManifestServiceError::ApplicationExists(name.to_string()));
        }

        let mut candidate = manifest.clone();
        candidate.applications.push(ApplicationDefinition::new(name));
        candidate.validate_manifest()?;

        debug!("Added application {}", name);
        *manifest = candidate;
        Ok(())
    }

    /// アプリケーションに依存リポジトリを追加
    ///
    /// 既に依存しているものはスキップし、新しいものは引数の順に追加する。
    pub fn link_repositories<S: AsRef<str>>(
        &self,
        manifest: &mut Manifest,
        app_name: &str,
        repo_names: &[S],
    ) -> Result<LinkOutcome, ManifestServiceError> {
        self.application(manifest, app_name)?;
        for repo_name in repo_names {
            self.repository(manifest, repo_name.as_ref())?;
        }

        let available = list_or_none(&manifest.application_names());
        let app = manifest.find_application_mut(app_name).ok_or_else(|| {
            ManifestServiceError::ApplicationNotFound {
                name: app_name.to_string(),
                available,
            }
        })?;

        let mut outcome = LinkOutcome::default();
        for repo_name in repo_names {
            let repo_name = repo_name.as_ref();
            if app.depends_on(repo_name) {
                if !outcome.linked.iter().any(|r| r == repo_name)
                    && !outcome.already_linked.iter().any(|r| r == repo_name)
                {
                    outcome.already_linked.push(repo_name.to_string());
                }
                continue;
            }
            app.repos.push(repo_name.to_string());
            outcome.linked.push(repo_name.to_string());
        }

        debug!(
            "Linked {:?} into {} (already linked: {:?})",
            outcome.linked, app_name, outcome.already_linked
        );
        Ok(outcome)
    }

    /// 指定したリポジトリに依存しているアプリケーション名
    pub fn applications_using(&self, manifest: &Manifest, repo_name: &str) -> Vec<String> {
        manifest
            .applications_using(repo_name)
            .into_iter()
            .map(String::from)
            .collect()
    }
}

fn list_or_none(names: &[&str]) -> String {
    if names.is_empty() {
        "(none)".to_string()
    } else {
        names.join(", ")
    }
}
