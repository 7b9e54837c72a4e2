//! Launchpad Configuration
//!
//! One configuration set per deployed market. Loaded from TOML; every section
//! falls back to defaults when omitted. Validation runs once, before any
//! component is constructed.
//!
//! ```toml
//! [market]
//! graduation_threshold = 10_000_000_000
//! cooldown_seconds = 30
//!
//! [fees]
//! fee_bps = 100
//! treasury = "0101010101010101010101010101010101010101010101010101010101010101"
//!
//! [migration.lock_policy]
//! kind = "time_locked"
//! lock_seconds = 31536000
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::curve::BondingCurve;
use crate::errors::LaunchpadError;
use crate::pool::LockPolicy;
use crate::types::Address;
use crate::{BPS_DENOMINATOR, MAX_FEE_BPS, NATIVE_UNIT, TOKEN_UNIT};

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("Configuration parsing error: {0}")]
    Parsing(#[from] toml::de::Error),

    #[error("Configuration rejected: {0}")]
    Invalid(#[from] LaunchpadError),
}

/// Bonding curve market parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Real native reserve at which a token graduates
    pub graduation_threshold: u64,
    /// Minimum seconds between two trades by the same caller on the same token
    pub cooldown_seconds: u64,
    /// Largest pre-fee native input accepted by a single buy
    pub max_buy_per_tx: u64,
    /// Seconds between creation and the first accepted trade
    pub launch_delay_seconds: u64,
    /// Virtual native reserve used to shape new curves
    pub initial_virtual_native: u64,
    /// Virtual token reserve used to shape new curves
    pub initial_virtual_token: u64,
    /// Total supply minted when a launch does not specify one
    pub default_total_supply: u64,
    /// Share of total supply held back from the curve for pool seeding
    pub migration_reserve_bps: u16,
    /// Reject configurations where one buy could exceed the graduation threshold
    pub require_max_buy_within_threshold: bool,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            graduation_threshold: 10 * NATIVE_UNIT,
            cooldown_seconds: 30,
            max_buy_per_tx: 10_000_000 * NATIVE_UNIT,
            launch_delay_seconds: 0,
            initial_virtual_native: 30 * NATIVE_UNIT,
            initial_virtual_token: 1_073_000_000 * TOKEN_UNIT,
            default_total_supply: 1_000_000_000 * TOKEN_UNIT,
            migration_reserve_bps: 2_069,
            require_max_buy_within_threshold: false,
        }
    }
}

/// Protocol fee parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeConfig {
    /// Fee on every curve trade, in basis points
    pub fee_bps: u16,
    /// Fee skimmed from the real reserve on migration, in basis points
    pub migration_fee_bps: u16,
    /// Principal allowed to withdraw accrued fees
    #[serde(with = "address_hex")]
    pub treasury: Address,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            fee_bps: 100,
            migration_fee_bps: 0,
            treasury: Address::zero(),
        }
    }
}

/// How much of the unsold supply is paired with the reserve on migration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TokenAllocation {
    /// Everything not sold on the curve
    #[default]
    AllUnsold,
    /// Only the migration reserve; the unsold remainder is burned
    ReservedOnly,
}

/// Migration parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MigrationConfig {
    pub token_allocation: TokenAllocation,
    pub lock_policy: LockPolicy,
}

/// Background migration retry service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationServiceConfig {
    /// Whether the service runs at all
    pub enabled: bool,
    /// How often graduated tokens are retried (seconds)
    pub check_interval_seconds: u64,
}

impl Default for MigrationServiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval_seconds: 30,
        }
    }
}

/// Complete configuration for one market deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LaunchpadConfig {
    pub market: MarketConfig,
    pub fees: FeeConfig,
    pub migration: MigrationConfig,
    pub service: MigrationServiceConfig,
}

impl LaunchpadConfig {
    /// Defaults with the given treasury principal
    pub fn with_treasury(treasury: Address) -> Self {
        let mut config = Self::default();
        config.fees.treasury = treasury;
        config
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: LaunchpadConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!(
            "Loaded launchpad configuration from {} (threshold={}, fee_bps={})",
            path.as_ref().display(),
            config.market.graduation_threshold,
            config.fees.fee_bps
        );
        Ok(config)
    }

    /// Check every cross-field constraint
    pub fn validate(&self) -> Result<(), LaunchpadError> {
        let market = &self.market;
        let invalid = |msg: &str| Err(LaunchpadError::InvalidConfiguration(msg.to_string()));

        if market.initial_virtual_native == 0 || market.initial_virtual_token == 0 {
            return invalid("virtual reserves must be non-zero");
        }
        if market.graduation_threshold == 0 {
            return invalid("graduation threshold must be non-zero");
        }
        let curve = BondingCurve::new(market.initial_virtual_native, market.initial_virtual_token)?;
        if !curve.supports_threshold(market.graduation_threshold) {
            return invalid("virtual reserves too shallow for graduation threshold");
        }
        if market.max_buy_per_tx == 0 {
            return invalid("max buy per transaction must be non-zero");
        }
        if market.default_total_supply == 0 {
            return invalid("default total supply must be non-zero");
        }
        if u64::from(market.migration_reserve_bps) >= BPS_DENOMINATOR {
            return invalid("migration reserve must be below 100%");
        }
        if market.require_max_buy_within_threshold
            && market.max_buy_per_tx > market.graduation_threshold
        {
            return Err(LaunchpadError::InvalidConfiguration(format!(
                "max buy per transaction {} exceeds graduation threshold {}",
                market.max_buy_per_tx, market.graduation_threshold
            )));
        }
        if self.fees.fee_bps > MAX_FEE_BPS || self.fees.migration_fee_bps > MAX_FEE_BPS {
            return Err(LaunchpadError::InvalidConfiguration(format!(
                "fee exceeds maximum of {} bps",
                MAX_FEE_BPS
            )));
        }
        if self.fees.treasury.is_zero() {
            return invalid("treasury principal must be set");
        }
        if self.service.check_interval_seconds == 0 {
            return invalid("service check interval must be non-zero");
        }
        if let LockPolicy::TimeLocked { lock_seconds } = self.migration.lock_policy {
            if lock_seconds == 0 {
                return invalid("time lock must be non-zero");
            }
        }
        Ok(())
    }
}

/// Serialises an [`Address`] as a 64-character hex string
mod address_hex {
    use super::Address;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(addr: &Address, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&addr.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Address, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
