//! # CLI Error Type
//!
//! Everything that can stop a scenario run.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  read file ──► io::Error ─────────────┐                                 │
//! │  parse TOML ──► toml::de::Error ──────┤                                 │
//! │  build cart ──► CoreError ────────────┼──► CliError ──► stderr, exit 1  │
//! │  totals ──► CoreError ────────────────┤                                 │
//! │  print ──► serde_json::Error ─────────┘                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use tally_core::CoreError;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    /// Bad command line.
    #[error("{0}")]
    Usage(String),

    /// Config file or environment produced an unusable configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Cart building or totals failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Failed to write report: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Usage(_) => 2,
            _ => 1,
        }
    }
}
