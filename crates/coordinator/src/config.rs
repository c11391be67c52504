//! Coordinator configuration

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Delay between a shutdown request and the processes exiting
    pub shutdown_grace: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            shutdown_grace: Duration::from_millis(500),
        }
    }
}

impl CoordinatorConfig {
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }
}
