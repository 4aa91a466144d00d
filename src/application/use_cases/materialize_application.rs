use crate::domain::entities::{ApplicationDefinition, Manifest};
use crate::domain::value_objects::WorkspacePaths;
use crate::infrastructure::filesystem::{replace_with_symlink, LinkError};
use crate::infrastructure::process::{CommandExecutor, ExecError, ExecutionConfig};
use crate::infrastructure::scm::{CloneError, RepositoryProvider};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs as async_fs;
use tracing::{debug, info, warn};

/// アプリケーション構築時のエラー
#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error("failed to create directory {}: {source}", .path.display())]
    PathCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("pre-setup command for {application} failed: {source}")]
    PreSetup {
        application: String,
        #[source]
        source: ExecError,
    },

    #[error("failed to clone {repository}: {source}")]
    Clone {
        repository: String,
        #[source]
        source: CloneError,
    },

    #[error("failed to link {repository} into {application}: {source}")]
    Link {
        application: String,
        repository: String,
        #[source]
        source: LinkError,
    },

    #[error("post-setup command for {application} failed: {source}")]
    PostSetup {
        application: String,
        #[source]
        source: ExecError,
    },
}

impl MaterializeError {
    /// ライフサイクルコマンドの終了コード（プロセスが終了まで実行された場合）
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::PreSetup { source, .. } | Self::PostSetup { source, .. } => source.exit_code(),
            _ => None,
        }
    }
}

/// 構築モード
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterializeMode {
    /// pre-setup / post-setup を含む完全なセットアップ
    Setup,
    /// クローンとリンクのみ（ライフサイクルコマンドは実行しない）
    Clone,
}

impl MaterializeMode {
    /// ライフサイクルコマンドを実行するか
    pub fn runs_lifecycle(&self) -> bool {
        matches!(self, Self::Setup)
    }
}

/// アプリケーション構築の設定
#[derive(Debug, Clone)]
pub struct MaterializeConfig {
    /// 構築モード
    pub mode: MaterializeMode,
}

impl Default for MaterializeConfig {
    fn default() -> Self {
        Self {
            mode: MaterializeMode::Setup,
        }
    }
}

impl MaterializeConfig {
    pub fn with_mode(mut self, mode: MaterializeMode) -> Self {
        self.mode = mode;
        self
    }
}

/// 構築の進捗イベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterializeEvent {
    /// pre-setupコマンドの実行開始
    PreSetupStarted { command: String },
    /// リポジトリは既にクローン済み
    RepositoryPresent { name: String },
    /// クローン開始
    CloningRepository { name: String, url: String },
    /// クローン完了
    RepositoryCloned { name: String, path: PathBuf },
    /// マニフェストに存在しない依存をスキップ
    DependencySkipped { name: String },
    /// シンボリックリンク作成
    Linked { name: String, link: PathBuf, target: PathBuf },
    /// post-setupコマンドの実行開始
    PostSetupStarted { command: String },
}

/// 進捗イベントの受け取り口
pub type MaterializeEventHandler = Arc<dyn Fn(&MaterializeEvent) + Send + Sync>;

/// リポジトリごとの結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryStatus {
    /// 既に存在していた
    AlreadyCloned,
    /// 今回クローンした
    Cloned,
}

/// 依存リポジトリ1件分の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryOutcome {
    pub name: String,
    pub status: RepositoryStatus,
}

/// 構築結果
#[derive(Debug, Clone, Default)]
pub struct MaterializeReport {
    /// アプリケーションディレクトリ
    pub app_dir: PathBuf,

    /// 依存リポジトリの結果（依存順）
    pub repositories: Vec<RepositoryOutcome>,

    /// 作成したリンク（依存順）
    pub links: Vec<PathBuf>,

    /// マニフェストに定義がなくスキップした依存
    pub skipped_dependencies: Vec<String>,

    /// pre-setupを実行したか
    pub ran_pre_setup: bool,

    /// post-setupを実行したか
    pub ran_post_setup: bool,
}

impl MaterializeReport {
    /// 今回クローンしたリポジトリ数
    pub fn cloned_count(&self) -> usize {
        self.repositories
            .iter()
            .filter(|r| r.status == RepositoryStatus::Cloned)
            .count()
    }
}

/// アプリケーション構築ユースケース
///
/// 依存リポジトリのクローン、ワークスペースへのリンク作成、
/// ライフサイクルコマンドの実行を固定順で行う。最初の致命的エラーで停止する。
pub struct MaterializeApplicationUseCase {
    provider: Arc<dyn RepositoryProvider>,
    paths: WorkspacePaths,
    config: MaterializeConfig,
    on_event: Option<MaterializeEventHandler>,
}

impl MaterializeApplicationUseCase {
    /// 新しいMaterializeApplicationUseCaseインスタンスを作成
    pub fn new(
        provider: Arc<dyn RepositoryProvider>,
        paths: WorkspacePaths,
        config: MaterializeConfig,
    ) -> Self {
        Self {
            provider,
            paths,
            config,
            on_event: None,
        }
    }

    /// 進捗イベントのハンドラを設定
    pub fn with_event_handler(mut self, handler: MaterializeEventHandler) -> Self {
        self.on_event = Some(handler);
        self
    }

    /// アプリケーションを構築
    pub async fn execute(
        &self,
        app: &ApplicationDefinition,
        manifest: &Manifest,
    ) -> Result<MaterializeReport, MaterializeError> {
        let applications_root = self.paths.applications_root();
        let app_dir = self.paths.app_dir(&app.name);

        // 1. ディレクトリ作成
        debug!(
            "Preparing {} (applications root {})",
            app_dir.display(),
            applications_root.display()
        );
        create_dir(applications_root).await?;
        create_dir(&app_dir).await?;

        let mut report = MaterializeReport {
            app_dir: app_dir.clone(),
            ..Default::default()
        };

        let lifecycle_config =
            ExecutionConfig::new(applications_root).with_environment_variables(&app.env);

        // 2. pre-setup
        if self.config.mode.runs_lifecycle() {
            if let Some(command) = app.pre_setup_command() {
                self.emit(MaterializeEvent::PreSetupStarted {
                    command: command.to_string(),
                });
                CommandExecutor::run_one(command, &lifecycle_config)
                    .await
                    .map_err(|source| MaterializeError::PreSetup {
                        application: app.name.clone(),
                        source,
                    })?;
                report.ran_pre_setup = true;
            }
        }

        // 3. 依存リポジトリの取得
        let mut resolved = Vec::with_capacity(app.repos.len());
        for dependency in &app.repos {
            let Some(repo) = manifest.find_repo(dependency) else {
                warn!(
                    "Application {} depends on unknown repository {}, skipping",
                    app.name, dependency
                );
                self.emit(MaterializeEvent::DependencySkipped {
                    name: dependency.clone(),
                });
                report.skipped_dependencies.push(dependency.clone());
                continue;
            };

            let status = if self.provider.is_cloned(&repo.name) {
                self.emit(MaterializeEvent::RepositoryPresent {
                    name: repo.name.clone(),
                });
                RepositoryStatus::AlreadyCloned
            } else {
                self.emit(MaterializeEvent::CloningRepository {
                    name: repo.name.clone(),
                    url: repo.url.clone(),
                });
                let path = self.provider.clone_repository(repo).await.map_err(|source| {
                    MaterializeError::Clone {
                        repository: repo.name.clone(),
                        source,
                    }
                })?;
                info!("Cloned {} into {}", repo.name, path.display());
                self.emit(MaterializeEvent::RepositoryCloned {
                    name: repo.name.clone(),
                    path,
                });
                RepositoryStatus::Cloned
            };

            report.repositories.push(RepositoryOutcome {
                name: repo.name.clone(),
                status,
            });
            resolved.push(repo.name.as_str());
        }

        // 4. リンク作成
        for dependency in resolved {
            let target = self.provider.repository_path(dependency);
            let link = self.paths.link_path(&app.name, dependency);

            replace_with_symlink(&target, &link)
                .await
                .map_err(|source| MaterializeError::Link {
                    application: app.name.clone(),
                    repository: dependency.to_string(),
                    source,
                })?;

            info!("Linked {} -> {}", link.display(), target.display());
            self.emit(MaterializeEvent::Linked {
                name: dependency.to_string(),
                link: link.clone(),
                target,
            });
            report.links.push(link);
        }

        // 5. post-setup
        if self.config.mode.runs_lifecycle() {
            if let Some(command) = app.post_setup_command() {
                self.emit(MaterializeEvent::PostSetupStarted {
                    command: command.to_string(),
                });
                CommandExecutor::run_one(command, &lifecycle_config)
                    .await
                    .map_err(|source| MaterializeError::PostSetup {
                        application: app.name.clone(),
                        source,
                    })?;
                report.ran_post_setup = true;
            }
        }

        Ok(report)
    }

    fn emit(&self, event: MaterializeEvent) {
        if let Some(handler) = &self.on_event {
            handler(&event);
        }
    }
}

async fn create_dir(path: &Path) -> Result<(), MaterializeError> {
    async_fs::create_dir_all(path)
        .await
        .map_err(|source| MaterializeError::PathCreation {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::domain::entities::RepositoryDefinition;
    use crate::infrastructure::scm::repository_provider::MockRepositoryProvider;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn manifest() -> Manifest {
        Manifest::new("proj")
            .with_repo(RepositoryDefinition::new("backend", "https://example.com/backend.git"))
            .with_repo(RepositoryDefinition::new("frontend", "https://example.com/frontend.git"))
    }

    fn paths(temp_dir: &TempDir) -> WorkspacePaths {
        WorkspacePaths::new(temp_dir.path(), None)
    }

    /// Mock whose repositories live under `repos/` and report `cloned`
    fn mock_provider(repos_root: PathBuf, cloned: bool) -> MockRepositoryProvider {
        let mut provider = MockRepositoryProvider::new();
        let root = repos_root.clone();
        provider
            .expect_repository_path()
            .returning(move |name| root.join(name));
        provider.expect_is_cloned().returning(move |_| cloned);
        provider
    }

    #[tokio::test]
    async fn test_clones_missing_repositories_and_links_them() {
        let temp_dir = TempDir::new().unwrap();
        let paths = paths(&temp_dir);
        let repos_root = paths.repos_root().to_path_buf();

        let mut provider = mock_provider(repos_root.clone(), false);
        let clone_root = repos_root.clone();
        provider
            .expect_clone_repository()
            .times(2)
            .returning(move |repo| {
                let path = clone_root.join(&repo.name);
                std::fs::create_dir_all(path.join(".git")).unwrap();
                Ok(path)
            });

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let use_case = MaterializeApplicationUseCase::new(
            Arc::new(provider),
            paths.clone(),
            MaterializeConfig::default().with_mode(MaterializeMode::Clone),
        )
        .with_event_handler(Arc::new(move |event: &MaterializeEvent| {
            sink.lock().unwrap().push(event.clone());
        }));

        let app = ApplicationDefinition::new("web").with_repos(["frontend", "backend"]);
        let report = use_case.execute(&app, &manifest()).await.unwrap();

        assert_eq!(report.cloned_count(), 2);
        assert_eq!(
            report.links,
            vec![paths.link_path("web", "frontend"), paths.link_path("web", "backend")]
        );
        assert_eq!(
            std::fs::read_link(paths.link_path("web", "backend")).unwrap(),
            repos_root.join("backend")
        );

        let events = events.lock().unwrap();
        assert_eq!(
            events[0],
            MaterializeEvent::CloningRepository {
                name: "frontend".to_string(),
                url: "https://example.com/frontend.git".to_string(),
            }
        );
        assert!(matches!(events.last(), Some(MaterializeEvent::Linked { name, .. }) if name == "backend"));
    }

    #[tokio::test]
    async fn test_present_repositories_are_not_cloned() {
        let temp_dir = TempDir::new().unwrap();
        let paths = paths(&temp_dir);

        let mut provider = mock_provider(paths.repos_root().to_path_buf(), true);
        provider.expect_clone_repository().never();

        let use_case = MaterializeApplicationUseCase::new(
            Arc::new(provider),
            paths.clone(),
            MaterializeConfig::default(),
        );

        let app = ApplicationDefinition::new("web").with_repos(["backend"]);
        let report = use_case.execute(&app, &manifest()).await.unwrap();

        assert_eq!(
            report.repositories,
            vec![RepositoryOutcome {
                name: "backend".to_string(),
                status: RepositoryStatus::AlreadyCloned,
            }]
        );
        assert!(paths.app_dir("web").is_dir());
    }

    #[tokio::test]
    async fn test_clone_failure_aborts_before_linking() {
        let temp_dir = TempDir::new().unwrap();
        let paths = paths(&temp_dir);

        let mut provider = mock_provider(paths.repos_root().to_path_buf(), false);
        provider
            .expect_clone_repository()
            .times(1)
            .returning(|repo| Err(CloneError::git_failed(&repo.url, "/nowhere", 128)));

        let use_case = MaterializeApplicationUseCase::new(
            Arc::new(provider),
            paths.clone(),
            MaterializeConfig::default(),
        );

        let app = ApplicationDefinition::new("web")
            .with_repos(["backend", "frontend"])
            .with_post_setup("touch post-ran");
        let err = use_case.execute(&app, &manifest()).await.unwrap_err();

        assert!(matches!(err, MaterializeError::Clone { ref repository, .. } if repository == "backend"));
        assert!(std::fs::symlink_metadata(paths.link_path("web", "backend")).is_err());
        assert!(!paths.applications_root().join("post-ran").exists());
    }

    #[tokio::test]
    async fn test_pre_setup_failure_prevents_cloning() {
        let temp_dir = TempDir::new().unwrap();
        let paths = paths(&temp_dir);

        let mut provider = mock_provider(paths.repos_root().to_path_buf(), false);
        provider.expect_clone_repository().never();

        let use_case = MaterializeApplicationUseCase::new(
            Arc::new(provider),
            paths,
            MaterializeConfig::default(),
        );

        let app = ApplicationDefinition::new("web")
            .with_repos(["backend"])
            .with_pre_setup("exit 7");
        let err = use_case.execute(&app, &manifest()).await.unwrap_err();

        assert!(matches!(err, MaterializeError::PreSetup { .. }));
        assert_eq!(err.exit_code(), Some(7));
    }

    #[tokio::test]
    async fn test_lifecycle_commands_run_in_applications_root_with_env() {
        let temp_dir = TempDir::new().unwrap();
        let paths = paths(&temp_dir);
        let provider = mock_provider(paths.repos_root().to_path_buf(), true);

        let use_case = MaterializeApplicationUseCase::new(
            Arc::new(provider),
            paths.clone(),
            MaterializeConfig::default(),
        );

        let app = ApplicationDefinition::new("web")
            .with_env("STAGE", "dev")
            .with_pre_setup("echo \"$STAGE\" > pre.txt")
            .with_post_setup("ls web > post.txt");
        let report = use_case.execute(&app, &manifest()).await.unwrap();

        assert!(report.ran_pre_setup);
        assert!(report.ran_post_setup);
        let pre = std::fs::read_to_string(paths.applications_root().join("pre.txt")).unwrap();
        assert_eq!(pre.trim(), "dev");
        assert!(paths.applications_root().join("post.txt").exists());
    }

    #[tokio::test]
    async fn test_clone_mode_skips_lifecycle_commands() {
        let temp_dir = TempDir::new().unwrap();
        let paths = paths(&temp_dir);
        let provider = mock_provider(paths.repos_root().to_path_buf(), true);

        let use_case = MaterializeApplicationUseCase::new(
            Arc::new(provider),
            paths.clone(),
            MaterializeConfig::default().with_mode(MaterializeMode::Clone),
        );

        let app = ApplicationDefinition::new("web")
            .with_pre_setup("touch pre.txt")
            .with_post_setup("touch post.txt");
        let report = use_case.execute(&app, &manifest()).await.unwrap();

        assert!(!report.ran_pre_setup);
        assert!(!report.ran_post_setup);
        assert!(!paths.applications_root().join("pre.txt").exists());
        assert!(!paths.applications_root().join("post.txt").exists());
    }

    #[tokio::test]
    async fn test_post_setup_failure_keeps_links() {
        let temp_dir = TempDir::new().unwrap();
        let paths = paths(&temp_dir);
        let provider = mock_provider(paths.repos_root().to_path_buf(), true);

        let use_case = MaterializeApplicationUseCase::new(
            Arc::new(provider),
            paths.clone(),
            MaterializeConfig::default(),
        );

        let app = ApplicationDefinition::new("web")
            .with_repos(["backend"])
            .with_post_setup("exit 4");
        let err = use_case.execute(&app, &manifest()).await.unwrap_err();

        assert!(matches!(err, MaterializeError::PostSetup { .. }));
        assert_eq!(err.exit_code(), Some(4));
        assert!(std::fs::symlink_metadata(paths.link_path("web", "backend")).is_ok());
    }

    #[tokio::test]
    async fn test_unknown_dependency_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let paths = paths(&temp_dir);

        let mut provider = mock_provider(paths.repos_root().to_path_buf(), true);
        provider.expect_clone_repository().never();

        let use_case = MaterializeApplicationUseCase::new(
            Arc::new(provider),
            paths.clone(),
            MaterializeConfig::default(),
        );

        let app = ApplicationDefinition::new("web").with_repos(["ghost", "backend"]);
        let report = use_case.execute(&app, &manifest()).await.unwrap();

        assert_eq!(report.skipped_dependencies, vec!["ghost".to_string()]);
        assert_eq!(report.links, vec![paths.link_path("web", "backend")]);
        assert!(std::fs::symlink_metadata(paths.link_path("web", "ghost")).is_err());
    }

    #[tokio::test]
    async fn test_unwritable_applications_root_is_a_path_error() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, "file").unwrap();
        let paths = WorkspacePaths::new(temp_dir.path(), Some(blocker.join("apps")));

        let mut provider = mock_provider(paths.repos_root().to_path_buf(), false);
        provider.expect_clone_repository().never();

        let use_case = MaterializeApplicationUseCase::new(
            Arc::new(provider),
            paths,
            MaterializeConfig::default(),
        );

        let app = ApplicationDefinition::new("web").with_repos(["backend"]);
        let err = use_case.execute(&app, &manifest()).await.unwrap_err();

        assert!(matches!(err, MaterializeError::PathCreation { .. }));
    }
}
