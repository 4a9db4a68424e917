//! # Host Configuration
//!
//! Layered configuration for the scenario runner.
//!
//! ## Load Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. HostConfig::default()                                               │
//! │  2. TOML file (--config <path>, else $TALLY_CONFIG)                     │
//! │  3. TALLY_* environment overrides                                       │
//! │  4. validate()                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## File Format
//! ```toml
//! [cart]
//! removal_floor = "inclusive"
//! rounding_decimals = 2
//! max_convergence_restarts = 1000
//!
//! [output]
//! pretty = true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tally_core::CartConfig;
use tracing::{debug, info, warn};

use crate::error::{CliError, CliResult};

/// Environment variable naming a config file.
pub const CONFIG_PATH_ENV: &str = "TALLY_CONFIG";

// =============================================================================
// Config Types
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Engine settings handed to `CartState::with_config`.
    #[serde(default)]
    pub cart: CartConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Pretty-print the JSON report.
    #[serde(default = "default_true")]
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig { pretty: true }
    }
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Loading
// =============================================================================

impl HostConfig {
    /// Loads configuration from defaults, an optional file and the
    /// environment, then validates it.
    pub fn load(config_path: Option<PathBuf>) -> CliResult<Self> {
        let path = config_path.or_else(|| std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from));

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => {
                debug!("No config file given, using defaults");
                Self::default()
            }
        };

        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;

        Ok(config)
    }

    pub fn from_file(path: &Path) -> CliResult<Self> {
        info!(?path, "Loading config from file");
        let contents = std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| CliError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> CliResult<()> {
        self.cart
            .validate()
            .map_err(|e| CliError::InvalidConfig(e.to_string()))
    }

    /// Applies `TALLY_*` overrides read through `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(floor) = lookup("TALLY_REMOVAL_FLOOR") {
            match floor.parse() {
                Ok(parsed) => {
                    debug!(removal_floor = %floor, "Overriding removal floor from environment");
                    self.cart.removal_floor = parsed;
                }
                Err(e) => warn!(removal_floor = %floor, error = %e, "Ignoring removal floor"),
            }
        }

        if let Some(decimals) = lookup("TALLY_ROUNDING_DECIMALS") {
            match decimals.parse::<i32>() {
                Ok(d) => self.cart.rounding_decimals = d,
                Err(_) => warn!(value = %decimals, "Ignoring TALLY_ROUNDING_DECIMALS"),
            }
        }

        if let Some(limit) = lookup("TALLY_MAX_CONVERGENCE_RESTARTS") {
            match limit.parse::<usize>() {
                Ok(l) => {
                    debug!(limit = l, "Overriding convergence limit from environment");
                    self.cart.max_convergence_restarts = l;
                }
                Err(_) => warn!(value = %limit, "Ignoring TALLY_MAX_CONVERGENCE_RESTARTS"),
            }
        }

        if let Some(pretty) = lookup("TALLY_PRETTY") {
            match pretty.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.output.pretty = true,
                "0" | "false" | "no" => self.output.pretty = false,
                _ => warn!(value = %pretty, "Ignoring TALLY_PRETTY"),
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
