//! Arena-specific error types.

use std::error::Error;
use std::fmt;

use lume_core::{ArenaId, ConfigError};

/// Errors that can occur during arena operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The allocator could not provide the requested region. The arena
    /// (if any) is left as it was.
    OutOfMemory {
        /// Number of bytes requested.
        requested: usize,
    },
    /// The arena's memory has already been released, either through the
    /// handle or by the reclaimer after its owner went away.
    Freed {
        /// The arena that was accessed.
        arena: ArenaId,
    },
    /// The reclaimer configuration was rejected.
    Config(ConfigError),
    /// The watcher thread could not be spawned.
    Spawn {
        /// The operating system's reason.
        reason: String,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory { requested } => {
                write!(f, "out of memory: requested {requested} bytes")
            }
            Self::Freed { arena } => write!(f, "{arena} has already been freed"),
            Self::Config(e) => write!(f, "invalid reclaimer config: {e}"),
            Self::Spawn { reason } => write!(f, "failed to spawn reclaimer thread: {reason}"),
        }
    }
}

impl Error for ArenaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for ArenaError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
