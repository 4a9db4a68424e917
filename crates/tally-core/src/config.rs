//! # Cart Configuration
//!
//! Tunables for the item store and the totals engine.
//!
//! ## Configuration File Format
//! ```toml
//! # cart.toml
//! removal_floor = "inclusive"      # inclusive | legacy
//! rounding_decimals = 2
//! subtotal_scale = 4
//! redistribution_scale = 10
//! total_scale = 10
//! max_convergence_restarts = 1000  # 0 = unbounded
//! ```
//!
//! This crate only parses and validates. Reading the file and applying
//! environment overrides is the host application's job.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Removal Floor
// =============================================================================

/// When subtracting quantity, the threshold at which a counter is deleted.
///
/// ```text
/// remaining:      -1        0        1
/// Inclusive     delete   delete    keep
/// Legacy        delete    keep     keep
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalFloor {
    /// Delete when the remaining quantity is `<= 0`.
    #[default]
    Inclusive,

    /// Delete only when the remaining quantity is `< 0`.
    /// A zero counter survives in the store but never reaches the engine.
    Legacy,
}

impl RemovalFloor {
    /// Whether a counter with `remaining` units is deleted.
    pub fn deletes(&self, remaining: i64) -> bool {
        match self {
            RemovalFloor::Inclusive => remaining <= 0,
            RemovalFloor::Legacy => remaining < 0,
        }
    }
}

impl std::fmt::Display for RemovalFloor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemovalFloor::Inclusive => write!(f, "inclusive"),
            RemovalFloor::Legacy => write!(f, "legacy"),
        }
    }
}

impl std::str::FromStr for RemovalFloor {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inclusive" | "cart" => Ok(RemovalFloor::Inclusive),
            "legacy" => Ok(RemovalFloor::Legacy),
            other => Err(CoreError::InvalidConfig(format!(
                "Unknown removal floor: '{}'. Valid options: inclusive, legacy",
                other
            ))),
        }
    }
}

// =============================================================================
// Cart Configuration
// =============================================================================

/// Engine and store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartConfig {
    /// Deletion threshold for `remove` with a quantity.
    #[serde(default)]
    pub removal_floor: RemovalFloor,

    /// Decimal places of `CartTotals::rounded_total()`.
    /// Signed so a bad file can be reported instead of failing to parse.
    #[serde(default = "default_rounding_decimals")]
    pub rounding_decimals: i32,

    /// Scale of per-item subtotal arithmetic.
    #[serde(default = "default_subtotal_scale")]
    pub subtotal_scale: u32,

    /// Scale of cross-item redistribution arithmetic.
    #[serde(default = "default_redistribution_scale")]
    pub redistribution_scale: u32,

    /// Intermediate scale of the grand total.
    #[serde(default = "default_total_scale")]
    pub total_scale: u32,

    /// Restarts allowed per convergence stage. `0` means unbounded.
    #[serde(default = "default_max_convergence_restarts")]
    pub max_convergence_restarts: usize,
}

fn default_rounding_decimals() -> i32 {
    2
}

fn default_subtotal_scale() -> u32 {
    4
}

fn default_redistribution_scale() -> u32 {
    10
}

fn default_total_scale() -> u32 {
    10
}

fn default_max_convergence_restarts() -> usize {
    1000
}

/// Largest scale `rust_decimal` can represent.
const MAX_SCALE: u32 = 28;

impl Default for CartConfig {
    fn default() -> Self {
        CartConfig {
            removal_floor: RemovalFloor::default(),
            rounding_decimals: default_rounding_decimals(),
            subtotal_scale: default_subtotal_scale(),
            redistribution_scale: default_redistribution_scale(),
            total_scale: default_total_scale(),
            max_convergence_restarts: default_max_convergence_restarts(),
        }
    }
}

impl CartConfig {
    /// Parses a TOML document; missing fields take their defaults.
    pub fn from_toml_str(input: &str) -> CoreResult<Self> {
        let config: CartConfig =
            toml::from_str(input).map_err(|e| CoreError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> CoreResult<()> {
        self.rounding_scale()?;

        for (field, scale) in [
            ("subtotal_scale", self.subtotal_scale),
            ("redistribution_scale", self.redistribution_scale),
            ("total_scale", self.total_scale),
        ] {
            if scale > MAX_SCALE {
                return Err(CoreError::InvalidConfig(format!(
                    "{} must be at most {}, got {}",
                    field, MAX_SCALE, scale
                )));
            }
        }

        Ok(())
    }

    /// `rounding_decimals` as an unsigned scale.
    ///
    /// ## Errors
    /// `CoreError::InvalidRoundingScale` when negative.
    pub fn rounding_scale(&self) -> CoreResult<u32> {
        u32::try_from(self.rounding_decimals).map_err(|_| CoreError::InvalidRoundingScale {
            scale: self.rounding_decimals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CartConfig::default();
        assert_eq!(config.removal_floor, RemovalFloor::Inclusive);
        assert_eq!(config.rounding_decimals, 2);
        assert_eq!(config.subtotal_scale, 4);
        assert_eq!(config.max_convergence_restarts, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_fills_defaults() {
        let config = CartConfig::from_toml_str("removal_floor = \"legacy\"\n").unwrap();
        assert_eq!(config.removal_floor, RemovalFloor::Legacy);
        assert_eq!(config.total_scale, 10);
    }

    #[test]
    fn test_negative_rounding_rejected() {
        let result = CartConfig::from_toml_str("rounding_decimals = -1\n");
        assert!(matches!(
            result,
            Err(CoreError::InvalidRoundingScale { scale: -1 })
        ));
    }

    #[test]
    fn test_oversized_scale_rejected() {
        let config = CartConfig {
            redistribution_scale: 40,
            ..CartConfig::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::InvalidConfig(_))));
    }

    #[test]
    fn test_removal_floor_parsing() {
        assert_eq!("Inclusive".parse::<RemovalFloor>().unwrap(), RemovalFloor::Inclusive);
        assert_eq!("legacy".parse::<RemovalFloor>().unwrap(), RemovalFloor::Legacy);
        assert!("sometimes".parse::<RemovalFloor>().is_err());
    }

    #[test]
    fn test_removal_floor_threshold() {
        assert!(RemovalFloor::Inclusive.deletes(0));
        assert!(!RemovalFloor::Legacy.deletes(0));
        assert!(RemovalFloor::Legacy.deletes(-1));
        assert!(!RemovalFloor::Inclusive.deletes(1));
    }
}
