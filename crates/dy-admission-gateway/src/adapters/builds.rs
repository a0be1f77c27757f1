//! In-memory build-state tracker for one namespace.

use crate::ports::ServiceManager;
use parking_lot::Mutex;
use tracing::debug;

/// Tracks which applications are building, in start order
#[derive(Debug, Default)]
pub struct BuildTracker {
    running: Mutex<Vec<String>>,
}

impl BuildTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a build as started. Starting an already-running app is a no-op.
    pub fn start_build(&self, app_name: &str) {
        let mut running = self.running.lock();
        if !running.iter().any(|app| app == app_name) {
            debug!(app = app_name, "Build started");
            running.push(app_name.to_string());
        }
    }

    /// Mark a build as finished (success or failure)
    pub fn finish_build(&self, app_name: &str) {
        let mut running = self.running.lock();
        let before = running.len();
        running.retain(|app| app != app_name);
        if running.len() != before {
            debug!(app = app_name, "Build finished");
        }
    }

    pub fn running_count(&self) -> usize {
        self.running.lock().len()
    }
}

impl ServiceManager for BuildTracker {
    fn active_build(&self) -> Option<String> {
        self.running.lock().first().cloned()
    }
}
