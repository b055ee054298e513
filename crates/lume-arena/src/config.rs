//! Reclaimer configuration parameters.

use lume_core::ConfigError;

/// Configuration for the [`ArenaReclaimer`](crate::ArenaReclaimer).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReclaimerConfig {
    /// Name given to the watcher thread. Must not be empty.
    ///
    /// Default: `"lume-reclaimer"`.
    pub thread_name: String,

    /// Emit a `debug` event with address and length for every arena
    /// allocation, resize and free.
    pub log_malloc: bool,
}

impl ReclaimerConfig {
    /// Default watcher thread name.
    pub const DEFAULT_THREAD_NAME: &'static str = "lume-reclaimer";

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thread_name.is_empty() {
            return Err(ConfigError::EmptyThreadName);
        }
        Ok(())
    }
}

impl Default for ReclaimerConfig {
    fn default() -> Self {
        Self {
            thread_name: Self::DEFAULT_THREAD_NAME.to_owned(),
            log_malloc: false,
        }
    }
}
