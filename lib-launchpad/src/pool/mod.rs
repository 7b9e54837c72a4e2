//! # External Liquidity Pool Backend
//!
//! Graduated tokens are migrated into a constant product pool owned by an
//! external backend. The market consumes the backend only through
//! [`LiquidityPoolBackend`]:
//!
//! - `create_pool` seeds a pool with the graduated reserve and token allocation
//! - `lock_share` escrows the resulting pool share under a [`LockPolicy`]
//! - `abort_pool` undoes a `create_pool` whose share could not be locked
//! - `swap` serves routed trades once a token is migrated
//!
//! ## Security Invariants
//!
//! ### Invariant P1: One pool per token
//! `create_pool` rejects a token pair that already has a pool.
//!
//! ### Invariant P2: Locked shares never move
//! The backend exposes no unlock or withdraw path for a locked share.

pub mod constant_product;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{PoolHandle, TokenId, TradeDirection};

pub use constant_product::{ConstantProductPools, PoolState};

/// Domain separator for pool handle derivation
pub const POOL_ID_DOMAIN: &[u8] = b"LAUNCHPAD_POOL_V1";

/// Minimum liquidity on either side of a new pool
pub const MINIMUM_LIQUIDITY: u64 = 1_000;

/// Default pool swap fee in basis points (0.25%)
pub const DEFAULT_POOL_FEE_BPS: u16 = 25;

/// How a migrated pool share is escrowed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LockPolicy {
    /// Escrowed forever
    #[default]
    Permanent,
    /// Escrowed until `locked_at + lock_seconds`
    TimeLocked { lock_seconds: u64 },
}

/// Receipt for a locked pool share
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareLock {
    pub pool: PoolHandle,
    /// Pool share units escrowed
    pub shares: u64,
    pub policy: LockPolicy,
    pub locked_at: u64,
    /// `None` for permanent locks
    pub unlocks_at: Option<u64>,
}

/// Result of a swap executed by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSwapResult {
    pub amount_in: u64,
    pub amount_out: u64,
    /// Fee deducted from the input
    pub fee_amount: u64,
    pub new_native_reserve: u64,
    pub new_token_reserve: u64,
}

/// Errors raised by a pool backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Pool backend unavailable")]
    BackendUnavailable,

    #[error("Pool not found: {0}")]
    PoolNotFound(PoolHandle),

    #[error("Pool already exists for token {0}")]
    PoolAlreadyExists(TokenId),

    #[error("Initial liquidity below minimum")]
    InsufficientInitialLiquidity,

    #[error("Pool share already locked")]
    ShareAlreadyLocked,

    #[error("Input amount cannot be zero")]
    ZeroInputAmount,

    #[error("Output amount would be zero")]
    ZeroOutputAmount,

    #[error("Insufficient liquidity in pool")]
    InsufficientLiquidity,

    #[error("Slippage tolerance exceeded: expected {min_out}, got {actual_out}")]
    SlippageExceeded { min_out: u64, actual_out: u64 },

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("K invariant violation detected")]
    KInvariantViolation,
}

/// External liquidity-pool backend consumed by migration and routing
pub trait LiquidityPoolBackend: Send + Sync {
    /// Whether the backend can currently accept pool creation
    fn is_available(&self) -> bool;

    /// Create a pool pairing `amount_a` of `token_a` with `amount_b` of `token_b`
    fn create_pool(
        &self,
        token_a: TokenId,
        token_b: TokenId,
        amount_a: u64,
        amount_b: u64,
    ) -> Result<PoolHandle, PoolError>;

    /// Escrow the full share of a freshly created pool
    fn lock_share(
        &self,
        pool: &PoolHandle,
        policy: LockPolicy,
        now: u64,
    ) -> Result<ShareLock, PoolError>;

    /// Dissolve a pool whose share was never locked, returning its liquidity
    fn abort_pool(&self, pool: &PoolHandle) -> Result<(), PoolError>;

    /// Swap against a pool; `Buy` is native in, `Sell` is token in
    fn swap(
        &self,
        pool: &PoolHandle,
        direction: TradeDirection,
        amount_in: u64,
        min_out: u64,
    ) -> Result<PoolSwapResult, PoolError>;

    /// Current reserves of a pool
    fn pool_state(&self, pool: &PoolHandle) -> Result<PoolState, PoolError>;
}
