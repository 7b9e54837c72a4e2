//! Launchpad: Bonding Curve Token Launch Market
//!
//! Creators launch fixed-supply tokens that trade against a virtual-reserve
//! bonding curve. Once a token's real native reserve crosses the graduation
//! threshold the curve closes, and the reserve plus remaining supply migrate
//! into an external constant product pool whose share is locked.
//!
//! # Lifecycle
//!
//! ```text
//!   create_token ──► Trading ──(crossing buy)──► Graduated ──(migrate)──► Migrated
//!                    curve buy/sell              curve closed             pool swaps via router
//! ```
//!
//! # Design Principles
//!
//! 1. **Forward-only status** - `TokenStatus` only moves through its transition functions
//! 2. **No floats** - All arithmetic uses u64/u128 integers, checked
//! 3. **All or nothing** - Every rejected call leaves the ledger untouched
//! 4. **Injected collaborators** - Components receive their handles at construction
//!
//! # Usage
//!
//! ```ignore
//! use lib_launchpad::{Launchpad, LaunchpadConfig, TradeDirection};
//!
//! let config = LaunchpadConfig::load("launchpad.toml")?;
//! let launchpad = Launchpad::in_memory(config, Some(pools))?;
//! let token = launchpad.launch_token(creator, "Sovereign Cat", "SCAT", now)?;
//! launchpad.router().swap(&token.address, TradeDirection::Buy, amount, 0, buyer, now)?;
//! ```

pub mod config;
pub mod curve;
pub mod errors;
pub mod event_indexer;
pub mod events;
pub mod fee_vault;
pub mod identity;
pub mod launchpad;
pub mod market;
pub mod migration;
pub mod pool;
pub mod registry;
pub mod router;
pub mod service;
pub mod types;

// Re-export main types
pub use config::{
    ConfigError, FeeConfig, LaunchpadConfig, MarketConfig, MigrationConfig,
    MigrationServiceConfig, TokenAllocation,
};
pub use curve::{BondingCurve, CurveSell, PRICE_PRECISION};
pub use errors::{LaunchpadError, LaunchpadResult};
pub use event_indexer::SledEventIndexer;
pub use events::{
    EventIndexer, EventLog, EventRecord, InMemoryEventIndexer, LaunchpadEvent, TradeVenue,
};
pub use fee_vault::{FeeAccount, FeeVault};
pub use identity::{IdentityProfile, IdentityResolver, StaticIdentityDirectory};
pub use launchpad::Launchpad;
pub use market::{BondingCurveMarket, Quote, TokenView, TradeReceipt};
pub use migration::{MigrationEngine, MigrationReceipt};
pub use pool::{
    ConstantProductPools, LiquidityPoolBackend, LockPolicy, PoolError, PoolState,
    PoolSwapResult, ShareLock,
};
pub use registry::{NewToken, RegistryStats, TokenEntry, TokenRecord, TokenRegistry};
pub use router::{CompatibilityRouter, SwapOutcome};
pub use service::{MigrationService, MigrationSweep};
pub use types::{
    Address, PoolHandle, PoolSeed, StatusKind, TokenId, TokenStatus, TradeDirection,
};

/// Atomic units per native coin (9 decimals)
pub const NATIVE_UNIT: u64 = 1_000_000_000;

/// Atomic units per launched token (6 decimals)
pub const TOKEN_UNIT: u64 = 1_000_000;

/// Basis point denominator
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Ceiling for trade and migration fees (10%)
pub const MAX_FEE_BPS: u16 = 1_000;
