pub mod error;
pub mod file_store;
pub mod records;

pub use error::StoreError;
pub use file_store::FileStore;
pub use records::{
    ProjectRecord, RunRecord, RunStatus, TraceEvent, TraceMetrics, TraceStatus,
};
