pub mod error;
pub mod load;
pub mod model;

pub use error::ConfigError;
pub use load::{load_process_config, parse_process_config};
pub use model::{
    ProcessConfig, ResourceConfig, ResourceKind, StepConfig, TriggerConfig, TriggerKind,
    WorkflowConfig, WorkflowKind,
};
