use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
pub struct RunLocks {
    active: Arc<Mutex<BTreeSet<String>>>,
}

#[derive(Debug)]
pub struct RunLockGuard {
    run_id: String,
    active: Arc<Mutex<BTreeSet<String>>>,
}

impl RunLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self, run_id: &str) -> Option<RunLockGuard> {
        let mut active = self.active.lock().ok()?;
        if !active.insert(run_id.to_string()) {
            return None;
        }
        Some(RunLockGuard {
            run_id: run_id.to_string(),
            active: Arc::clone(&self.active),
        })
    }

    pub fn is_held(&self, run_id: &str) -> bool {
        self.active
            .lock()
            .map(|active| active.contains(run_id))
            .unwrap_or(true)
    }
}

impl Drop for RunLockGuard {
    fn drop(&mut self) {
        if let Ok(mut active) = self.active.lock() {
            active.remove(&self.run_id);
        }
    }
}
