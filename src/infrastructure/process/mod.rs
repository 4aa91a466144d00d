pub mod command_executor;

pub use command_executor::{
    BatchExecError,
    BatchFailure,
    CommandExecutor,
    ExecError,
    ExecutionConfig,
};
