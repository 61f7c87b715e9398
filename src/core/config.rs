//! Configuration - Type-safe, validated curve parameters
//!
//! Loads from `config.toml`. Every field is optional and falls back to the
//! launch defaults, so a file only needs the values it overrides. Write
//! decimals as strings (`fee_rate = "0.01"`) to keep them exact.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::{Error, Result};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    #[serde(default)]
    pub app: AppConfig,

    /// Curve launch parameters
    #[serde(default)]
    pub curve: CurveParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Log level used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Parameters a curve is launched with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveParams {
    #[serde(default = "default_initial_supply")]
    pub initial_supply: Decimal,

    /// Curve exponent, in (0, 1]
    #[serde(default = "default_reserve_ratio")]
    pub reserve_ratio: Decimal,

    #[serde(default = "default_initial_price")]
    pub initial_price: Decimal,

    /// Fraction withheld from every trade, in [0, 1)
    #[serde(default = "default_fee_rate")]
    pub fee_rate: Decimal,

    /// Resume a curve whose supply already moved (defaults to `initial_supply`)
    #[serde(default)]
    pub current_supply: Option<Decimal>,

    #[serde(default)]
    pub milestones: MilestoneConfig,
}

/// Market-cap levels and burn sizes for the liquidity milestones
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneConfig {
    #[serde(default = "default_listing_threshold")]
    pub listing_threshold: Decimal,

    #[serde(default = "default_first_burn_threshold")]
    pub first_burn_threshold: Decimal,

    #[serde(default = "default_second_burn_threshold")]
    pub second_burn_threshold: Decimal,

    /// Share of the pool burned at the first milestone
    #[serde(default = "default_first_burn_fraction")]
    pub first_burn_fraction: Decimal,

    /// Share of the (already reduced) pool burned at the second milestone
    #[serde(default = "default_second_burn_fraction")]
    pub second_burn_fraction: Decimal,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_initial_supply() -> Decimal {
    Decimal::from(800_000_000u64)
}
fn default_reserve_ratio() -> Decimal {
    Decimal::new(2, 1)
}
fn default_initial_price() -> Decimal {
    Decimal::new(1, 7)
}
fn default_fee_rate() -> Decimal {
    Decimal::new(1, 2)
}
fn default_listing_threshold() -> Decimal {
    Decimal::from(69_000)
}
fn default_first_burn_threshold() -> Decimal {
    Decimal::from(100_000)
}
fn default_second_burn_threshold() -> Decimal {
    Decimal::from(200_000)
}
fn default_first_burn_fraction() -> Decimal {
    Decimal::new(5, 2)
}
fn default_second_burn_fraction() -> Decimal {
    Decimal::new(10, 2)
}

impl Default for CurveParams {
    fn default() -> Self {
        Self {
            initial_supply: default_initial_supply(),
            reserve_ratio: default_reserve_ratio(),
            initial_price: default_initial_price(),
            fee_rate: default_fee_rate(),
            current_supply: None,
            milestones: MilestoneConfig::default(),
        }
    }
}

impl Default for MilestoneConfig {
    fn default() -> Self {
        Self {
            listing_threshold: default_listing_threshold(),
            first_burn_threshold: default_first_burn_threshold(),
            second_burn_threshold: default_second_burn_threshold(),
            first_burn_fraction: default_first_burn_fraction(),
            second_burn_fraction: default_second_burn_fraction(),
        }
    }
}

impl CurveParams {
    /// Reject parameter sets the curve formula cannot price.
    pub fn validate(&self) -> Result<()> {
        if self.reserve_ratio <= Decimal::ZERO || self.reserve_ratio > Decimal::ONE {
            return Err(Error::Config(format!(
                "reserve_ratio must be in (0, 1], got {}",
                self.reserve_ratio
            )));
        }
        if self.fee_rate < Decimal::ZERO || self.fee_rate >= Decimal::ONE {
            return Err(Error::Config(format!(
                "fee_rate must be in [0, 1), got {}",
                self.fee_rate
            )));
        }
        if self.initial_supply <= Decimal::ZERO {
            return Err(Error::Config(format!(
                "initial_supply must be positive, got {}",
                self.initial_supply
            )));
        }
        if self.initial_price <= Decimal::ZERO {
            return Err(Error::Config(format!(
                "initial_price must be positive, got {}",
                self.initial_price
            )));
        }
        if let Some(supply) = self.current_supply
            && supply < Decimal::ZERO
        {
            return Err(Error::Config(format!(
                "current_supply cannot be negative, got {}",
                supply
            )));
        }
        self.milestones.validate()
    }
}

impl MilestoneConfig {
    pub fn validate(&self) -> Result<()> {
        if self.listing_threshold <= Decimal::ZERO {
            return Err(Error::Config("listing_threshold must be positive".into()));
        }
        if self.first_burn_threshold < self.listing_threshold
            || self.second_burn_threshold < self.first_burn_threshold
        {
            return Err(Error::Config(format!(
                "milestone thresholds must be ordered: listing {} <= first burn {} <= second burn {}",
                self.listing_threshold, self.first_burn_threshold, self.second_burn_threshold
            )));
        }
        for (name, fraction) in [
            ("first_burn_fraction", self.first_burn_fraction),
            ("second_burn_fraction", self.second_burn_fraction),
        ] {
            if fraction < Decimal::ZERO || fraction >= Decimal::ONE {
                return Err(Error::Config(format!("{} must be in [0, 1), got {}", name, fraction)));
            }
        }
        Ok(())
    }
}

impl Config {
    /// Load from TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parse and validate TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.curve.validate()?;
        Ok(config)
    }

    /// Load from the default location (working directory or crate root).
    pub fn load_default() -> Self {
        let candidates = [
            "config.toml",
            concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml"),
        ];

        for path in &candidates {
            match Self::load(Path::new(path)) {
                Ok(cfg) => {
                    tracing::info!("📋 Loaded config from {}", path);
                    return cfg;
                }
                Err(e) => tracing::debug!("Skipping {}: {}", path, e),
            }
        }

        tracing::warn!("⚠️ No usable config.toml found, using defaults");
        Self::default()
    }
}
