//! In-memory constant product pool backend
//!
//! Minimal x·y=k AMM used as the migration target. Pools pair the native
//! currency ("A" side) with a graduated token ("B" side).

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{
    LiquidityPoolBackend, LockPolicy, PoolError, PoolSwapResult, ShareLock, DEFAULT_POOL_FEE_BPS,
    MINIMUM_LIQUIDITY, POOL_ID_DOMAIN,
};
use crate::types::{PoolHandle, TokenId, TradeDirection};
use crate::BPS_DENOMINATOR;

/// Snapshot of a pool's reserves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    pub token_a: TokenId,
    pub token_b: TokenId,
    pub reserve_a: u64,
    pub reserve_b: u64,
    /// Current k value (reserve_a * reserve_b)
    pub k: u128,
    pub fee_bps: u16,
    pub total_shares: u64,
    pub lock: Option<ShareLock>,
    /// Fees retained by the pool (in A, in B)
    pub accrued_fees: (u64, u64),
}

/// A single liquidity pool
///
/// # Invariants
///
/// ## Invariant S1: Reserve Conservation
/// After any swap: `reserve_a * reserve_b >= k`.
///
/// ## Invariant S2: Initialization Atomicity
/// A pool exists fully seeded or not at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct LiquidityPool {
    token_a: TokenId,
    token_b: TokenId,
    reserve_a: u64,
    reserve_b: u64,
    k: u128,
    fee_bps: u16,
    total_shares: u64,
    lock: Option<ShareLock>,
    pending_fees_a: u64,
    pending_fees_b: u64,
}

impl LiquidityPool {
    fn seed(
        token_a: TokenId,
        token_b: TokenId,
        amount_a: u64,
        amount_b: u64,
        fee_bps: u16,
    ) -> Result<Self, PoolError> {
        if amount_a < MINIMUM_LIQUIDITY || amount_b < MINIMUM_LIQUIDITY {
            return Err(PoolError::InsufficientInitialLiquidity);
        }

        let k = (amount_a as u128)
            .checked_mul(amount_b as u128)
            .ok_or(PoolError::Overflow)?;
        let total_shares = u64::try_from(isqrt(k)).map_err(|_| PoolError::Overflow)?;

        Ok(Self {
            token_a,
            token_b,
            reserve_a: amount_a,
            reserve_b: amount_b,
            k,
            fee_bps,
            total_shares,
            lock: None,
            pending_fees_a: 0,
            pending_fees_b: 0,
        })
    }

    fn swap(
        &mut self,
        direction: TradeDirection,
        amount_in: u64,
        min_out: u64,
    ) -> Result<PoolSwapResult, PoolError> {
        if amount_in == 0 {
            return Err(PoolError::ZeroInputAmount);
        }

        let fee_amount = u64::try_from(
            (amount_in as u128)
                .checked_mul(self.fee_bps as u128)
                .ok_or(PoolError::Overflow)?
                / BPS_DENOMINATOR as u128,
        )
        .map_err(|_| PoolError::Overflow)?;
        let amount_after_fee = amount_in.checked_sub(fee_amount).ok_or(PoolError::Overflow)?;

        let (reserve_in, reserve_out) = match direction {
            TradeDirection::Buy => (self.reserve_a, self.reserve_b),
            TradeDirection::Sell => (self.reserve_b, self.reserve_a),
        };

        // amount_out = (reserve_out * amount_in) / (reserve_in + amount_in)
        let numerator = (reserve_out as u128)
            .checked_mul(amount_after_fee as u128)
            .ok_or(PoolError::Overflow)?;
        let denominator = (reserve_in as u128)
            .checked_add(amount_after_fee as u128)
            .ok_or(PoolError::Overflow)?;
        let amount_out = (numerator / denominator) as u64;

        if amount_out == 0 {
            return Err(PoolError::ZeroOutputAmount);
        }
        if amount_out < min_out {
            return Err(PoolError::SlippageExceeded {
                min_out,
                actual_out: amount_out,
            });
        }
        if amount_out >= reserve_out {
            return Err(PoolError::InsufficientLiquidity);
        }

        let new_reserve_in = reserve_in
            .checked_add(amount_after_fee)
            .ok_or(PoolError::Overflow)?;
        let new_reserve_out = reserve_out.checked_sub(amount_out).ok_or(PoolError::Overflow)?;

        let new_k = (new_reserve_in as u128)
            .checked_mul(new_reserve_out as u128)
            .ok_or(PoolError::Overflow)?;
        if new_k < self.k {
            return Err(PoolError::KInvariantViolation);
        }

        // Commit
        match direction {
            TradeDirection::Buy => {
                self.reserve_a = new_reserve_in;
                self.reserve_b = new_reserve_out;
                self.pending_fees_a = self.pending_fees_a.saturating_add(fee_amount);
            }
            TradeDirection::Sell => {
                self.reserve_b = new_reserve_in;
                self.reserve_a = new_reserve_out;
                self.pending_fees_b = self.pending_fees_b.saturating_add(fee_amount);
            }
        }
        self.k = new_k;

        Ok(PoolSwapResult {
            amount_in,
            amount_out,
            fee_amount,
            new_native_reserve: self.reserve_a,
            new_token_reserve: self.reserve_b,
        })
    }

    fn state(&self) -> PoolState {
        PoolState {
            token_a: self.token_a,
            token_b: self.token_b,
            reserve_a: self.reserve_a,
            reserve_b: self.reserve_b,
            k: self.k,
            fee_bps: self.fee_bps,
            total_shares: self.total_shares,
            lock: self.lock,
            accrued_fees: (self.pending_fees_a, self.pending_fees_b),
        }
    }
}

/// Thread-safe collection of constant product pools
#[derive(Debug)]
pub struct ConstantProductPools {
    pools: RwLock<HashMap<PoolHandle, LiquidityPool>>,
    fee_bps: u16,
    available: AtomicBool,
    locking_available: AtomicBool,
}

impl ConstantProductPools {
    pub fn new() -> Self {
        Self::with_fee_bps(DEFAULT_POOL_FEE_BPS)
    }

    pub fn with_fee_bps(fee_bps: u16) -> Self {
        Self {
            pools: RwLock::new(HashMap::new()),
            fee_bps,
            available: AtomicBool::new(true),
            locking_available: AtomicBool::new(true),
        }
    }

    /// Toggle whether the backend accepts pool creation and swaps
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Toggle whether share locks can be taken (lock escrow outage)
    pub fn set_locking_available(&self, available: bool) {
        self.locking_available.store(available, Ordering::SeqCst);
    }

    pub fn pool_count(&self) -> usize {
        self.pools.read().len()
    }

    fn require_available(&self) -> Result<(), PoolError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(PoolError::BackendUnavailable)
        }
    }
}

impl Default for ConstantProductPools {
    fn default() -> Self {
        Self::new()
    }
}

impl LiquidityPoolBackend for ConstantProductPools {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn create_pool(
        &self,
        token_a: TokenId,
        token_b: TokenId,
        amount_a: u64,
        amount_b: u64,
    ) -> Result<PoolHandle, PoolError> {
        self.require_available()?;

        let handle = derive_pool_handle(&token_a, &token_b);
        let mut pools = self.pools.write();
        if pools.contains_key(&handle) {
            return Err(PoolError::PoolAlreadyExists(token_b));
        }

        let pool = LiquidityPool::seed(token_a, token_b, amount_a, amount_b, self.fee_bps)?;
        pools.insert(handle, pool);
        Ok(handle)
    }

    fn lock_share(
        &self,
        pool: &PoolHandle,
        policy: LockPolicy,
        now: u64,
    ) -> Result<ShareLock, PoolError> {
        self.require_available()?;
        if !self.locking_available.load(Ordering::SeqCst) {
            return Err(PoolError::BackendUnavailable);
        }

        let mut pools = self.pools.write();
        let entry = pools.get_mut(pool).ok_or(PoolError::PoolNotFound(*pool))?;
        if entry.lock.is_some() {
            return Err(PoolError::ShareAlreadyLocked);
        }

        let unlocks_at = match policy {
            LockPolicy::Permanent => None,
            LockPolicy::TimeLocked { lock_seconds } => {
                Some(now.checked_add(lock_seconds).ok_or(PoolError::Overflow)?)
            }
        };
        let lock = ShareLock {
            pool: *pool,
            shares: entry.total_shares,
            policy,
            locked_at: now,
            unlocks_at,
        };
        entry.lock = Some(lock);
        Ok(lock)
    }

    fn abort_pool(&self, pool: &PoolHandle) -> Result<(), PoolError> {
        let mut pools = self.pools.write();
        match pools.get(pool) {
            None => Err(PoolError::PoolNotFound(*pool)),
            Some(entry) if entry.lock.is_some() => Err(PoolError::ShareAlreadyLocked),
            Some(_) => {
                pools.remove(pool);
                Ok(())
            }
        }
    }

    fn swap(
        &self,
        pool: &PoolHandle,
        direction: TradeDirection,
        amount_in: u64,
        min_out: u64,
    ) -> Result<PoolSwapResult, PoolError> {
        self.require_available()?;
        let mut pools = self.pools.write();
        let entry = pools.get_mut(pool).ok_or(PoolError::PoolNotFound(*pool))?;
        entry.swap(direction, amount_in, min_out)
    }

    fn pool_state(&self, pool: &PoolHandle) -> Result<PoolState, PoolError> {
        self.pools
            .read()
            .get(pool)
            .map(LiquidityPool::state)
            .ok_or(PoolError::PoolNotFound(*pool))
    }
}

/// Derive a deterministic pool handle from the token pair
///
/// PoolHandle = Blake3(POOL_ID_DOMAIN || token_a || token_b)
pub fn derive_pool_handle(token_a: &TokenId, token_b: &TokenId) -> PoolHandle {
    let mut hasher = blake3::Hasher::new();
    hasher.update(POOL_ID_DOMAIN);
    hasher.update(token_a.as_bytes());
    hasher.update(token_b.as_bytes());
    PoolHandle(*hasher.finalize().as_bytes())
}

/// Integer square root (floor)
fn isqrt(n: u128) -> u128 {
    if n < 2 {
        return n;
    }
    let mut x = n;
    let mut y = (x + 1) / 2;
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}
