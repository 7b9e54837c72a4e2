//! Compatibility Router
//!
//! One swap entry point for bots and aggregators across a token's whole
//! lifecycle. The router holds the token lock from the moment it reads the
//! status until the dispatched trade commits, so the status it routes on is
//! always the authoritative one:
//!
//! | Status      | Venue                                              |
//! |-------------|----------------------------------------------------|
//! | `Trading`   | bonding curve                                      |
//! | `Graduated` | bonding curve (rejects with `TradingNotOpen`)      |
//! | `Migrated`  | external pool                                      |
//!
//! The router does no pricing of its own.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::errors::{LaunchpadError, LaunchpadResult};
use crate::events::{EventLog, LaunchpadEvent, TradeVenue};
use crate::market::BondingCurveMarket;
use crate::pool::{LiquidityPoolBackend, PoolError};
use crate::registry::{TokenEntry, TokenRegistry};
use crate::types::{Address, PoolHandle, TokenId, TokenStatus, TradeDirection};

/// Outcome of a routed swap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapOutcome {
    pub token: TokenId,
    pub venue: TradeVenue,
    pub direction: TradeDirection,
    pub amount_in: u64,
    pub amount_out: u64,
    pub fee: u64,
    /// Whether this swap graduated the token
    pub graduated: bool,
}

/// Compatibility Router
pub struct CompatibilityRouter {
    registry: Arc<TokenRegistry>,
    market: Arc<BondingCurveMarket>,
    backend: Option<Arc<dyn LiquidityPoolBackend>>,
    events: Arc<EventLog>,
}

impl CompatibilityRouter {
    pub fn new(
        registry: Arc<TokenRegistry>,
        market: Arc<BondingCurveMarket>,
        backend: Option<Arc<dyn LiquidityPoolBackend>>,
        events: Arc<EventLog>,
    ) -> Self {
        Self {
            registry,
            market,
            backend,
            events,
        }
    }

    /// Swap on whichever venue the token currently trades on
    ///
    /// `Buy` spends native `amount_in`; `Sell` spends tokens.
    pub fn swap(
        &self,
        token: &TokenId,
        direction: TradeDirection,
        amount_in: u64,
        min_out: u64,
        caller: Address,
        now: u64,
    ) -> LaunchpadResult<SwapOutcome> {
        let handle = self.registry.entry(token)?;
        let mut entry = handle.lock();

        match entry.record.status {
            TokenStatus::Trading | TokenStatus::Graduated { .. } => {
                let receipt = match direction {
                    TradeDirection::Buy => {
                        self.market
                            .buy_locked(&mut entry, amount_in, min_out, caller, now)?
                    }
                    TradeDirection::Sell => {
                        self.market
                            .sell_locked(&mut entry, amount_in, min_out, caller, now)?
                    }
                };
                Ok(SwapOutcome {
                    token: *token,
                    venue: TradeVenue::BondingCurve,
                    direction,
                    amount_in: receipt.amount_in,
                    amount_out: receipt.amount_out,
                    fee: receipt.fee,
                    graduated: receipt.graduated,
                })
            }
            TokenStatus::Migrated { pool, .. } => {
                self.swap_on_pool(&mut entry, pool, direction, amount_in, min_out, caller, now)
            }
        }
    }

    /// Venue a swap on `token` would use right now
    pub fn venue(&self, token: &TokenId) -> LaunchpadResult<TradeVenue> {
        let record = self.registry.get_token(token)?;
        Ok(if record.status.is_migrated() {
            TradeVenue::ExternalPool
        } else {
            TradeVenue::BondingCurve
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn swap_on_pool(
        &self,
        entry: &mut TokenEntry,
        pool: PoolHandle,
        direction: TradeDirection,
        amount_in: u64,
        min_out: u64,
        caller: Address,
        now: u64,
    ) -> LaunchpadResult<SwapOutcome> {
        let token = entry.record.address;
        let backend = self.backend.as_ref().ok_or_else(|| {
            LaunchpadError::MigrationUnavailable("no liquidity pool backend configured".to_string())
        })?;

        if amount_in == 0 {
            return Err(LaunchpadError::ZeroAmount);
        }
        match direction {
            TradeDirection::Sell => entry.require_balance(&caller, amount_in)?,
            TradeDirection::Buy => {
                // The pool cannot pay out more than its token reserve
                let state = backend
                    .pool_state(&pool)
                    .map_err(|e| self.pool_error(backend.as_ref(), &pool, direction, amount_in, e))?;
                entry.require_headroom(&caller, state.reserve_b)?;
            }
        }

        let result = backend
            .swap(&pool, direction, amount_in, min_out)
            .map_err(|e| self.pool_error(backend.as_ref(), &pool, direction, amount_in, e))?;

        match direction {
            TradeDirection::Buy => entry.credit_holder(caller, result.amount_out)?,
            TradeDirection::Sell => entry.debit_holder(&caller, amount_in)?,
        }

        self.events.emit(LaunchpadEvent::PoolSwap {
            token,
            trader: caller,
            pool,
            direction,
            amount_in,
            amount_out: result.amount_out,
            fee: result.fee_amount,
            timestamp: now,
        });
        tracing::debug!(
            "Routed {} on {} to pool {}: {} -> {}",
            direction,
            token,
            pool,
            amount_in,
            result.amount_out
        );

        Ok(SwapOutcome {
            token,
            venue: TradeVenue::ExternalPool,
            direction,
            amount_in,
            amount_out: result.amount_out,
            fee: result.fee_amount,
            graduated: false,
        })
    }

    fn pool_error(
        &self,
        backend: &dyn LiquidityPoolBackend,
        pool: &PoolHandle,
        direction: TradeDirection,
        amount_in: u64,
        err: PoolError,
    ) -> LaunchpadError {
        match err {
            PoolError::SlippageExceeded { min_out, actual_out } => {
                LaunchpadError::SlippageExceeded { min_out, actual_out }
            }
            PoolError::ZeroInputAmount | PoolError::ZeroOutputAmount => LaunchpadError::ZeroAmount,
            PoolError::InsufficientLiquidity => {
                let available = backend
                    .pool_state(pool)
                    .map(|state| match direction {
                        TradeDirection::Buy => state.reserve_b,
                        TradeDirection::Sell => state.reserve_a,
                    })
                    .unwrap_or(0);
                LaunchpadError::InsufficientReserve {
                    requested: amount_in,
                    available,
                }
            }
            PoolError::Overflow | PoolError::KInvariantViolation => LaunchpadError::Overflow,
            other => LaunchpadError::MigrationUnavailable(other.to_string()),
        }
    }
}

impl std::fmt::Debug for CompatibilityRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompatibilityRouter")
            .field("backend", &self.backend.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FeeConfig, MarketConfig, MigrationConfig};
    use crate::fee_vault::FeeVault;
    use crate::migration::MigrationEngine;
    use crate::pool::ConstantProductPools;
    use crate::registry::NewToken;

    const TREASURY: Address = Address::new([7u8; 32]);
    const ALICE: Address = Address::new([2u8; 32]);

    struct Fixture {
        registry: Arc<TokenRegistry>,
        router: CompatibilityRouter,
        migration: MigrationEngine,
        pools: Arc<ConstantProductPools>,
        token: TokenId,
    }

    fn fixture() -> Fixture {
        let config = MarketConfig {
            graduation_threshold: 10_000,
            cooldown_seconds: 0,
            max_buy_per_tx: 1_000_000,
            launch_delay_seconds: 0,
            initial_virtual_native: 30_000,
            initial_virtual_token: 1_073_000_000,
            default_total_supply: 1_000_000_000,
            migration_reserve_bps: 2_000,
            require_max_buy_within_threshold: false,
        };
        let fees = FeeConfig {
            fee_bps: 100,
            migration_fee_bps: 0,
            treasury: TREASURY,
        };
        let events = Arc::new(EventLog::in_memory());
        let registry = Arc::new(TokenRegistry::new(2_000, 10_000, events.clone()).unwrap());
        let vault = Arc::new(FeeVault::new(TREASURY, events.clone()).unwrap());
        let pools = Arc::new(ConstantProductPools::new());
        let backend: Arc<dyn LiquidityPoolBackend> = pools.clone();

        let token = registry
            .create_token(
                NewToken {
                    creator: Address::new([1u8; 32]),
                    name: "Test".to_string(),
                    symbol: "TST".to_string(),
                    total_supply: 1_000_000_000,
                    virtual_native: 30_000,
                    virtual_token: 1_073_000_000,
                    launch_delay: 0,
                },
                0,
            )
            .unwrap()
            .address;

        let market = Arc::new(
            BondingCurveMarket::new(config, &fees, registry.clone(), vault.clone(), events.clone())
                .unwrap(),
        );
        let migration = MigrationEngine::new(
            MigrationConfig::default(),
            &fees,
            registry.clone(),
            vault,
            events.clone(),
            Some(backend.clone()),
        );
        let router = CompatibilityRouter::new(registry.clone(), market, Some(backend), events);

        Fixture {
            registry,
            router,
            migration,
            pools,
            token,
        }
    }

    #[test]
    fn test_routes_to_curve_while_trading() {
        let f = fixture();
        let outcome = f
            .router
            .swap(&f.token, TradeDirection::Buy, 1_000, 0, ALICE, 1)
            .unwrap();
        assert_eq!(outcome.venue, TradeVenue::BondingCurve);
        assert_eq!(outcome.fee, 10);
        assert_eq!(f.router.venue(&f.token).unwrap(), TradeVenue::BondingCurve);
    }

    #[test]
    fn test_graduated_token_rejected_until_migrated() {
        let f = fixture();
        let outcome = f
            .router
            .swap(&f.token, TradeDirection::Buy, 20_000, 0, ALICE, 1)
            .unwrap();
        assert!(outcome.graduated);

        let result = f.router.swap(&f.token, TradeDirection::Buy, 1_000, 0, ALICE, 2);
        assert!(matches!(result, Err(LaunchpadError::TradingNotOpen { .. })));
    }

    #[test]
    fn test_routes_to_pool_after_migration() {
        let f = fixture();
        let bought = f
            .router
            .swap(&f.token, TradeDirection::Buy, 20_000, 0, ALICE, 1)
            .unwrap();
        let receipt = f.migration.migrate(&f.token, 2).unwrap();
        assert_eq!(f.router.venue(&f.token).unwrap(), TradeVenue::ExternalPool);

        let outcome = f
            .router
            .swap(&f.token, TradeDirection::Buy, 1_000, 0, ALICE, 3)
            .unwrap();
        assert_eq!(outcome.venue, TradeVenue::ExternalPool);
        assert!(outcome.amount_out > 0);
        assert_eq!(
            f.registry.holder_balance(&f.token, &ALICE).unwrap(),
            bought.amount_out + outcome.amount_out
        );

        let sell = f
            .router
            .swap(&f.token, TradeDirection::Sell, outcome.amount_out, 0, ALICE, 4)
            .unwrap();
        assert_eq!(sell.venue, TradeVenue::ExternalPool);

        let state = f.pools.pool_state(&receipt.pool).unwrap();
        assert!(state.k >= (receipt.native_seeded as u128) * (receipt.tokens_seeded as u128));
    }

    #[test]
    fn test_pool_sell_requires_balance() {
        let f = fixture();
        f.router
            .swap(&f.token, TradeDirection::Buy, 20_000, 0, ALICE, 1)
            .unwrap();
        f.migration.migrate(&f.token, 2).unwrap();

        let bob = Address::new([3u8; 32]);
        let result = f.router.swap(&f.token, TradeDirection::Sell, 10, 0, bob, 3);
        assert_eq!(
            result.unwrap_err(),
            LaunchpadError::InsufficientTokenBalance { have: 0, need: 10 }
        );
    }

    #[test]
    fn test_pool_slippage_maps_to_market_error() {
        let f = fixture();
        f.router
            .swap(&f.token, TradeDirection::Buy, 20_000, 0, ALICE, 1)
            .unwrap();
        f.migration.migrate(&f.token, 2).unwrap();
        let before = f.registry.state_hash(&f.token).unwrap();

        let result = f
            .router
            .swap(&f.token, TradeDirection::Buy, 1_000, u64::MAX, ALICE, 3);
        assert!(matches!(result, Err(LaunchpadError::SlippageExceeded { .. })));
        assert_eq!(f.registry.state_hash(&f.token).unwrap(), before);
    }

    #[test]
    fn test_pool_buy_without_headroom_leaves_pool_untouched() {
        let f = fixture();
        f.router
            .swap(&f.token, TradeDirection::Buy, 20_000, 0, ALICE, 1)
            .unwrap();
        let receipt = f.migration.migrate(&f.token, 2).unwrap();
        let pool_before = f.pools.pool_state(&receipt.pool).unwrap();

        let whale = Address::new([4u8; 32]);
        f.registry
            .entry(&f.token)
            .unwrap()
            .lock()
            .credit_holder(whale, u64::MAX - 1)
            .unwrap();
        let before = f.registry.state_hash(&f.token).unwrap();

        let result = f.router.swap(&f.token, TradeDirection::Buy, 1_000, 0, whale, 3);
        assert_eq!(result.unwrap_err(), LaunchpadError::Overflow);
        assert_eq!(f.pools.pool_state(&receipt.pool).unwrap(), pool_before);
        assert_eq!(f.registry.state_hash(&f.token).unwrap(), before);
    }
}
