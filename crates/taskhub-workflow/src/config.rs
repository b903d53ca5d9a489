//! Workflow configuration.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Upper bound for every best-effort side effect (activity log,
    /// notification persistence, email).
    pub side_effect_timeout: Duration,
    /// Per-session real-time buffer; events beyond it are dropped.
    pub realtime_buffer: usize,
    /// Maximum comment length in characters, after trimming.
    pub max_comment_length: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            side_effect_timeout: Duration::from_secs(5),
            realtime_buffer: 64,
            max_comment_length: 2000,
        }
    }
}
