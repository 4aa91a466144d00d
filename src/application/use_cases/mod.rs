pub mod materialize_application;
pub mod run_script;

pub use materialize_application::{
    MaterializeApplicationUseCase, MaterializeConfig, MaterializeError, MaterializeEvent,
    MaterializeMode, MaterializeReport,
};
pub use run_script::{RunScriptUseCase, ScriptError, ScriptStartHandler};
