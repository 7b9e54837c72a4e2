//! Launchpad Errors
//!
//! Every rejected operation returns one of these synchronously and leaves the
//! ledger untouched. Nothing here is retried by the core.

use thiserror::Error;

use crate::types::{Address, TokenId};

/// Error returned by registry, market, migration, router and vault operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LaunchpadError {
    // =========================================================================
    // Configuration / lookup
    // =========================================================================

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Token not found: {0}")]
    NotFound(TokenId),

    // =========================================================================
    // Curve trading
    // =========================================================================

    #[error("Trading not open: {reason}")]
    TradingNotOpen { reason: String },

    #[error("Cooldown active: {remaining_seconds}s remaining")]
    CooldownActive { remaining_seconds: u64 },

    #[error("Max buy exceeded: {amount} > {max}")]
    MaxBuyExceeded { amount: u64, max: u64 },

    #[error("Slippage exceeded: expected at least {min_out}, got {actual_out}")]
    SlippageExceeded { min_out: u64, actual_out: u64 },

    #[error("Insufficient reserve: requested {requested}, available {available}")]
    InsufficientReserve { requested: u64, available: u64 },

    #[error("Curve supply exhausted: requested {requested}, available {available}")]
    CurveSupplyExhausted { requested: u64, available: u64 },

    #[error("Insufficient token balance: have {have}, need {need}")]
    InsufficientTokenBalance { have: u64, need: u64 },

    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Arithmetic overflow")]
    Overflow,

    // =========================================================================
    // Migration
    // =========================================================================

    #[error("Token has not graduated")]
    NotGraduated,

    #[error("Token has already migrated")]
    AlreadyMigrated,

    #[error("Migration unavailable: {0}")]
    MigrationUnavailable(String),

    // =========================================================================
    // Fee vault
    // =========================================================================

    #[error("Insufficient fee balance: requested {requested}, accrued {available}")]
    InsufficientFeeBalance { requested: u64, available: u64 },

    #[error("Unauthorized caller: {0}")]
    Unauthorized(Address),
}

impl LaunchpadError {
    /// Stable machine-readable kind, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            LaunchpadError::InvalidConfiguration(_) => "invalid_configuration",
            LaunchpadError::NotFound(_) => "not_found",
            LaunchpadError::TradingNotOpen { .. } => "trading_not_open",
            LaunchpadError::CooldownActive { .. } => "cooldown_active",
            LaunchpadError::MaxBuyExceeded { .. } => "max_buy_exceeded",
            LaunchpadError::SlippageExceeded { .. } => "slippage_exceeded",
            LaunchpadError::InsufficientReserve { .. } => "insufficient_reserve",
            LaunchpadError::CurveSupplyExhausted { .. } => "curve_supply_exhausted",
            LaunchpadError::InsufficientTokenBalance { .. } => "insufficient_token_balance",
            LaunchpadError::ZeroAmount => "zero_amount",
            LaunchpadError::Overflow => "overflow",
            LaunchpadError::NotGraduated => "not_graduated",
            LaunchpadError::AlreadyMigrated => "already_migrated",
            LaunchpadError::MigrationUnavailable(_) => "migration_unavailable",
            LaunchpadError::InsufficientFeeBalance { .. } => "insufficient_fee_balance",
            LaunchpadError::Unauthorized(_) => "unauthorized",
        }
    }

    /// Shorthand for a closed-market rejection
    pub(crate) fn not_open(reason: impl Into<String>) -> Self {
        LaunchpadError::TradingNotOpen {
            reason: reason.into(),
        }
    }
}

pub type LaunchpadResult<T> = Result<T, LaunchpadError>;
