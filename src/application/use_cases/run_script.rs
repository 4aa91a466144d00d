use crate::domain::entities::{ApplicationDefinition, ScriptSpec};
use crate::domain::value_objects::WorkspacePaths;
use crate::infrastructure::process::{BatchExecError, CommandExecutor, ExecError, ExecutionConfig};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::fs as async_fs;
use tracing::info;

/// スクリプト実行時のエラー
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("application directory not found: {}. Run 'mess app {application} setup' first", .path.display())]
    ApplicationNotMaterialized { application: String, path: PathBuf },

    #[error("script '{script}' not found in application {application}. Available scripts: {available}")]
    ScriptNotFound {
        application: String,
        script: String,
        available: String,
    },

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error(transparent)]
    Batch(#[from] BatchExecError),
}

impl ScriptError {
    /// 単一コマンドが終了コード付きで失敗した場合のコード
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Exec(e) => e.exit_code(),
            _ => None,
        }
    }
}

/// 解決したスクリプトを実行する直前に呼ばれるハンドラ
pub type ScriptStartHandler = Arc<dyn Fn(&ScriptSpec) + Send + Sync>;

/// スクリプト実行ユースケース
///
/// 構築済みのアプリケーションディレクトリで、スクリプトの形に応じて
/// 単一実行または並列実行を行う。
pub struct RunScriptUseCase {
    paths: WorkspacePaths,
    on_start: Option<ScriptStartHandler>,
}

impl RunScriptUseCase {
    /// 新しいRunScriptUseCaseインスタンスを作成
    pub fn new(paths: WorkspacePaths) -> Self {
        Self {
            paths,
            on_start: None,
        }
    }

    /// 実行開始時のハンドラを設定
    pub fn with_start_handler(mut self, handler: ScriptStartHandler) -> Self {
        self.on_start = Some(handler);
        self
    }

    /// 前提条件をチェックしてスクリプトを解決する
    async fn resolve<'a>(
        &self,
        app: &'a ApplicationDefinition,
        script_name: &str,
    ) -> Result<&'a ScriptSpec, ScriptError> {
        let app_dir = self.paths.app_dir(&app.name);
        let materialized = async_fs::metadata(&app_dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);

        if !materialized {
            return Err(ScriptError::ApplicationNotMaterialized {
                application: app.name.clone(),
                path: app_dir,
            });
        }

        app.script(script_name)
            .ok_or_else(|| ScriptError::ScriptNotFound {
                application: app.name.clone(),
                script: script_name.to_string(),
                available: available_scripts(app),
            })
    }

    /// スクリプトを実行
    pub async fn execute(
        &self,
        app: &ApplicationDefinition,
        script_name: &str,
    ) -> Result<(), ScriptError> {
        let script = self.resolve(app, script_name).await?;
        let config = ExecutionConfig::new(self.paths.app_dir(&app.name))
            .with_environment_variables(&app.env);

        info!("Running script {} of {}", script_name, app.name);
        if let Some(handler) = &self.on_start {
            handler(script);
        }

        match script {
            ScriptSpec::Single(command) => CommandExecutor::run_one(command, &config).await?,
            ScriptSpec::Batch(commands) => CommandExecutor::run_batch(commands, &config).await?,
        }

        Ok(())
    }
}

fn available_scripts(app: &ApplicationDefinition) -> String {
    let names = app.script_names();
    if names.is_empty() {
        "(none)".to_string()
    } else {
        names.join(", ")
    }
}
