use crate::config::ConfigError;
use crate::store::{RunStatus, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("process configuration rejected: {0}")]
    Config(#[from] ConfigError),
    #[error("unsupported workflow type `{0}`")]
    UnsupportedWorkflowKind(String),
    #[error("step execution failed for step `{step_id}`: {reason}")]
    StepExecution { step_id: String, reason: String },
    #[error("run status transition `{from}` -> `{to}` is invalid")]
    InvalidTransition { from: RunStatus, to: RunStatus },
    #[error(transparent)]
    Store(#[from] StoreError),
}
