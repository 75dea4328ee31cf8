//! Platform version selection from the environment.
//!
//! The `CDH_MAJOR_VERSION` environment variable selects which major platform
//! version's nightly artifacts to fetch. Only two versions exist; anything
//! else is rejected before any network or filesystem work happens.

use std::fmt;

/// Environment variable holding the version selector.
pub const VERSION_ENV_VAR: &str = "CDH_MAJOR_VERSION";

/// Error raised when the version selector is missing or unsupported.
#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    #[error("CDH_MAJOR_VERSION not set")]
    Unset,
    #[error("unrecognised CDH_MAJOR_VERSION: {0}")]
    Unrecognised(String),
}

/// Major platform version whose nightly artifacts are fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CdhVersion {
    V4,
    V5,
}

impl CdhVersion {
    /// Parse one of the accepted selector literals (`"4"` or `"5"`).
    pub fn parse(value: &str) -> Result<Self, VersionError> {
        match value {
            "4" => Ok(CdhVersion::V4),
            "5" => Ok(CdhVersion::V5),
            other => Err(VersionError::Unrecognised(other.to_string())),
        }
    }

    /// Read and validate the selector from the process environment.
    pub fn from_env() -> Result<Self, VersionError> {
        match std::env::var(VERSION_ENV_VAR) {
            Ok(value) => Self::parse(&value),
            Err(std::env::VarError::NotPresent) => Err(VersionError::Unset),
            Err(std::env::VarError::NotUnicode(raw)) => {
                Err(VersionError::Unrecognised(raw.to_string_lossy().into_owned()))
            }
        }
    }
}

impl fmt::Display for CdhVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CdhVersion::V4 => write!(f, "4"),
            CdhVersion::V5 => write!(f, "5"),
        }
    }
}
