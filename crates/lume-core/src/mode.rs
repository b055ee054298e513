//! Runtime switches for diagnostics and buffer reuse.
//!
//! Both switches parse from the lowercase strings used in environment
//! variables and configuration files, so a deployment can flip them
//! without a rebuild.

use std::error::Error;
use std::fmt;
use std::str::FromStr;

/// Whether statistics counters are collected.
///
/// Recognized textual values: `"enabled"` and `"disabled"`. When
/// disabled, no counter storage is allocated and the hot paths skip all
/// counting work.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StatsMode {
    /// Collect allocation, hit/miss and high-water counters.
    Enabled,
    /// Collect nothing.
    #[default]
    Disabled,
}

impl StatsMode {
    /// Read the mode from an environment variable.
    ///
    /// An unset variable yields the default ([`StatsMode::Disabled`]); a
    /// set but unrecognized value is reported as an error.
    pub fn from_env(var: &str) -> Result<Self, ParseModeError> {
        match std::env::var(var) {
            Ok(value) => value.parse(),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Returns `true` for [`StatsMode::Enabled`].
    pub fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled)
    }
}

impl FromStr for StatsMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enabled" => Ok(Self::Enabled),
            "disabled" => Ok(Self::Disabled),
            _ => Err(ParseModeError {
                kind: "stats mode",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for StatsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enabled => write!(f, "enabled"),
            Self::Disabled => write!(f, "disabled"),
        }
    }
}

/// Whether buffers are zero-filled when they return to a pool.
///
/// Recognized textual values: `"clean"` and `"dirty"`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ReuseMode {
    /// Returned buffers are cleared over their used range, so every
    /// buffer handed out is entirely zero.
    #[default]
    Clean,
    /// Returned buffers keep their contents; callers overwrite before reading.
    Dirty,
}

impl ReuseMode {
    /// Returns `true` for [`ReuseMode::Clean`].
    pub fn is_clean(self) -> bool {
        matches!(self, Self::Clean)
    }

    /// Prefix used in log lines, matching the pool flavour.
    pub fn label(self) -> &'static str {
        match self {
            Self::Clean => "Clean",
            Self::Dirty => "Dirty",
        }
    }
}

impl FromStr for ReuseMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clean" => Ok(Self::Clean),
            "dirty" => Ok(Self::Dirty),
            _ => Err(ParseModeError {
                kind: "reuse mode",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ReuseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clean => write!(f, "clean"),
            Self::Dirty => write!(f, "dirty"),
        }
    }
}

/// An unrecognized textual mode value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseModeError {
    kind: &'static str,
    value: String,
}

impl fmt::Display for ParseModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized {}: '{}'", self.kind, self.value)
    }
}

impl Error for ParseModeError {}
