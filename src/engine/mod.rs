pub mod blackboard;
pub mod dispatch;
pub mod error;
pub mod lifecycle;
pub mod run_locks;
pub mod trace;

pub use blackboard::{resolve_template, Blackboard};
pub use dispatch::{
    dispatch_step, Capability, CapabilityError, CapabilityRegistry, DispatchOutcome,
};
pub use error::EngineError;
pub use lifecycle::{spawn_execution, RunEngine, SYSTEM_ERROR_STEP_ID};
pub use run_locks::{RunLockGuard, RunLocks};
pub use trace::record_trace;
