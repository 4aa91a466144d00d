use futures::future::join_all;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use thiserror::Error;
use tokio::process::Command as TokioCommand;
use tracing::{debug, info};

/// Failure of a single command line
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to spawn `{command}`: {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for `{command}`: {source}")]
    WaitFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command `{command}` exited with code {exit_code}")]
    Failed { command: String, exit_code: i32 },

    #[error("command `{command}` was terminated by a signal")]
    Terminated { command: String },

    #[error("task running `{command}` aborted: {message}")]
    TaskAborted { command: String, message: String },
}

impl ExecError {
    /// Command line that failed
    pub fn command(&self) -> &str {
        match self {
            Self::SpawnFailed { command, .. }
            | Self::WaitFailed { command, .. }
            | Self::Failed { command, .. }
            | Self::Terminated { command }
            | Self::TaskAborted { command, .. } => command,
        }
    }

    /// Exit code of the process, when it ran to completion
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Failed { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }
}

/// One failed member of a batch
#[derive(Debug)]
pub struct BatchFailure {
    /// Position of the command in the batch (0-based)
    pub index: usize,

    /// The command line
    pub command: String,

    /// Why it failed
    pub error: ExecError,
}

/// Aggregate failure of a concurrent batch
#[derive(Debug, Error)]
#[error(
    "{} out of {} commands failed: {}",
    .failures.len(),
    .total,
    describe_failures(.failures)
)]
pub struct BatchExecError {
    /// Number of commands in the batch
    pub total: usize,

    /// Every failed command, in batch order
    pub failures: Vec<BatchFailure>,
}

impl BatchExecError {
    /// Number of failed commands
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Failed command lines in batch order
    pub fn failed_commands(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.command.as_str()).collect()
    }
}

fn describe_failures(failures: &[BatchFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("[{}] {}", f.index + 1, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Configuration for command execution
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    /// Working directory for command execution
    pub working_directory: PathBuf,

    /// Variables added to (or overriding) the inherited environment
    pub environment_variables: BTreeMap<String, String>,
}

impl ExecutionConfig {
    /// Create a new execution config rooted at `working_directory`
    pub fn new<P: AsRef<Path>>(working_directory: P) -> Self {
        Self {
            working_directory: working_directory.as_ref().to_path_buf(),
            environment_variables: BTreeMap::new(),
        }
    }

    /// Add environment variable
    pub fn with_environment_variable(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.environment_variables.insert(key.into(), value.into());
        self
    }

    /// Add multiple environment variables
    pub fn with_environment_variables(mut self, vars: &BTreeMap<String, String>) -> Self {
        self.environment_variables
            .extend(vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }
}

/// Runs shell command lines with live, inherited output
pub struct CommandExecutor;

impl CommandExecutor {
    /// Run one command line and wait for it.
    ///
    /// Standard input, output and error are connected to this process so
    /// interactive scripts work.
    pub async fn run_one(command: &str, config: &ExecutionConfig) -> Result<(), ExecError> {
        info!("Executing `{}` in {}", command, config.working_directory.display());
        Self::execute(command, config, true).await
    }

    /// Run every command line concurrently and wait for all of them.
    ///
    /// A failing command never cancels its siblings. Output of the commands
    /// is interleaved in no particular order.
    pub async fn run_batch(commands: &[String], config: &ExecutionConfig) -> Result<(), BatchExecError> {
        if commands.is_empty() {
            return Ok(());
        }

        info!(
            "Executing {} commands in parallel in {}",
            commands.len(),
            config.working_directory.display()
        );

        let handles: Vec<_> = commands
            .iter()
            .map(|command| {
                let command = command.clone();
                let config = config.clone();
                tokio::spawn(async move { Self::execute(&command, &config, false).await })
            })
            .collect();

        let results = join_all(handles).await;

        let failures: Vec<BatchFailure> = commands
            .iter()
            .zip(results)
            .enumerate()
            .filter_map(|(index, (command, joined))| {
                let outcome = joined.unwrap_or_else(|e| {
                    Err(ExecError::TaskAborted {
                        command: command.clone(),
                        message: e.to_string(),
                    })
                });
                outcome.err().map(|error| BatchFailure {
                    index,
                    command: command.clone(),
                    error,
                })
            })
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(BatchExecError {
                total: commands.len(),
                failures,
            })
        }
    }

    async fn execute(command: &str, config: &ExecutionConfig, interactive: bool) -> Result<(), ExecError> {
        let (program, args) = Self::shell_invocation(command);

        let mut cmd = TokioCommand::new(&program);
        cmd.args(&args)
            .current_dir(&config.working_directory)
            .envs(&config.environment_variables)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .stdin(if interactive { Stdio::inherit() } else { Stdio::null() });

        debug!("Spawning {} {:?}", program, args);

        let mut child = cmd.spawn().map_err(|source| ExecError::SpawnFailed {
            command: command.to_string(),
            source,
        })?;

        let status = child.wait().await.map_err(|source| ExecError::WaitFailed {
            command: command.to_string(),
            source,
        })?;

        Self::check_status(command, status)
    }

    fn check_status(command: &str, status: ExitStatus) -> Result<(), ExecError> {
        if status.success() {
            return Ok(());
        }

        match status.code() {
            Some(exit_code) => Err(ExecError::Failed {
                command: command.to_string(),
                exit_code,
            }),
            None => Err(ExecError::Terminated {
                command: command.to_string(),
            }),
        }
    }

    /// Program and arguments that hand `command` to the platform shell untouched
    fn shell_invocation(command: &str) -> (String, Vec<String>) {
        let shell = if cfg!(target_os = "windows") {
            "cmd"
        } else {
            "sh"
        };

        let shell_flag = if cfg!(target_os = "windows") {
            "/C"
        } else {
            "-c"
        };

        (shell.to_string(), vec![shell_flag.to_string(), command.to_string()])
    }
}
