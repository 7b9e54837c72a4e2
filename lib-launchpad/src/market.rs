//! Bonding Curve Market
//!
//! Sole trading venue while a token is in `Trading`. Every buy and sell:
//!
//! 1. locks the token entry (the unit of mutual exclusion),
//! 2. runs every check against the entry as it is at that moment,
//! 3. prices the trade on a copy of the curve,
//! 4. commits curve, holder ledger, cooldown and fee together.
//!
//! A rejected trade returns before step 4 and leaves the entry untouched.
//!
//! # Graduation
//!
//! The buy that lifts the real native reserve to or above the graduation
//! threshold executes in full at its quoted price and flips the status to
//! `Graduated` in the same commit. There is no partial fill; from the next
//! call onward the curve rejects trades with `TradingNotOpen`.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{FeeConfig, MarketConfig};
use crate::curve::{fee_for, price_impact_bps, BondingCurve};
use crate::errors::{LaunchpadError, LaunchpadResult};
use crate::events::{EventLog, LaunchpadEvent};
use crate::fee_vault::FeeVault;
use crate::identity::{IdentityProfile, IdentityResolver};
use crate::registry::{TokenEntry, TokenRecord, TokenRegistry};
use crate::types::{Address, TokenId, TradeDirection};
use crate::BPS_DENOMINATOR;

/// Side-effect-free preview of a trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Pre-fee input (native for buys, tokens for sells)
    pub amount_in: u64,
    /// Net output the trader would receive
    pub amount_out: u64,
    /// Protocol fee in native units
    pub fee: u64,
    pub price_impact_bps: u64,
}

/// Outcome of a committed curve trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeReceipt {
    pub token: TokenId,
    pub trader: Address,
    pub direction: TradeDirection,
    pub amount_in: u64,
    pub amount_out: u64,
    pub fee: u64,
    /// Reserve right after the trade
    pub real_native_reserve: u64,
    pub real_token_sold: u64,
    /// Whether this trade graduated the token
    pub graduated: bool,
}

/// Token snapshot enriched for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenView {
    pub record: TokenRecord,
    /// Creator profile from the identity registry, when known
    pub creator_profile: Option<IdentityProfile>,
    /// Native per token, scaled by 1e18
    pub spot_price: u128,
    /// Progress toward graduation, capped at 10_000
    pub graduation_progress_bps: u64,
    pub fees_accrued: u64,
}

/// Priced buy, not yet committed
struct BuyPlan {
    fee: u64,
    net_in: u64,
    tokens_out: u64,
    curve: BondingCurve,
    impact_bps: u64,
}

/// Priced sell, not yet committed
struct SellPlan {
    /// Tokens settled, at most the amount offered
    tokens_in: u64,
    fee: u64,
    gross_out: u64,
    net_out: u64,
    curve: BondingCurve,
    impact_bps: u64,
}

/// Bonding Curve Market
pub struct BondingCurveMarket {
    config: MarketConfig,
    fee_bps: u16,
    registry: Arc<TokenRegistry>,
    vault: Arc<FeeVault>,
    events: Arc<EventLog>,
    identity: Option<Arc<dyn IdentityResolver>>,
}

impl BondingCurveMarket {
    pub fn new(
        config: MarketConfig,
        fees: &FeeConfig,
        registry: Arc<TokenRegistry>,
        vault: Arc<FeeVault>,
        events: Arc<EventLog>,
    ) -> LaunchpadResult<Self> {
        if config.graduation_threshold == 0 || config.max_buy_per_tx == 0 {
            return Err(LaunchpadError::InvalidConfiguration(
                "graduation threshold and max buy must be non-zero".to_string(),
            ));
        }
        if u64::from(fees.fee_bps) >= BPS_DENOMINATOR {
            return Err(LaunchpadError::InvalidConfiguration(
                "trade fee must be below 100%".to_string(),
            ));
        }
        Ok(Self {
            config,
            fee_bps: fees.fee_bps,
            registry,
            vault,
            events,
            identity: None,
        })
    }

    /// Attach an identity registry used by [`Self::token_view`]
    pub fn with_identity(mut self, resolver: Arc<dyn IdentityResolver>) -> Self {
        self.identity = Some(resolver);
        self
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    pub fn fee_bps(&self) -> u16 {
        self.fee_bps
    }

    // ========================================================================
    // Trading
    // ========================================================================

    /// Buy tokens with `native_in` (pre-fee)
    pub fn buy(
        &self,
        token: &TokenId,
        native_in: u64,
        min_tokens_out: u64,
        buyer: Address,
        now: u64,
    ) -> LaunchpadResult<TradeReceipt> {
        let handle = self.registry.entry(token)?;
        let mut entry = handle.lock();
        self.buy_locked(&mut entry, native_in, min_tokens_out, buyer, now)
    }

    /// Sell up to `tokens_in` back to the curve
    ///
    /// The receipt's `amount_in` is the settled amount; rounding dust below
    /// one native step stays with the seller.
    pub fn sell(
        &self,
        token: &TokenId,
        tokens_in: u64,
        min_native_out: u64,
        seller: Address,
        now: u64,
    ) -> LaunchpadResult<TradeReceipt> {
        let handle = self.registry.entry(token)?;
        let mut entry = handle.lock();
        self.sell_locked(&mut entry, tokens_in, min_native_out, seller, now)
    }

    /// Buy against an entry whose lock the caller already holds
    pub(crate) fn buy_locked(
        &self,
        entry: &mut TokenEntry,
        native_in: u64,
        min_tokens_out: u64,
        buyer: Address,
        now: u64,
    ) -> LaunchpadResult<TradeReceipt> {
        let token = entry.record.address;
        let result = self
            .check_trade(entry, &buyer, now)
            .and_then(|_| self.check_max_buy(native_in))
            .and_then(|_| self.plan_buy(&entry.record, native_in))
            .and_then(|plan| {
                if plan.tokens_out < min_tokens_out {
                    return Err(LaunchpadError::SlippageExceeded {
                        min_out: min_tokens_out,
                        actual_out: plan.tokens_out,
                    });
                }
                let balance = entry
                    .balance_of(&buyer)
                    .checked_add(plan.tokens_out)
                    .ok_or(LaunchpadError::Overflow)?;
                Ok((plan, balance))
            });

        let (plan, new_balance) = match result {
            Ok(ok) => ok,
            Err(e) => {
                tracing::debug!("Buy on {} by {} rejected: {}", token, buyer, e);
                return Err(e);
            }
        };

        let graduating = plan.curve.real_native >= self.config.graduation_threshold;
        let new_status = if graduating {
            entry.record.status.graduate(plan.curve.real_native, now)?
        } else {
            entry.record.status
        };

        // Commit: the vault credit is the only fallible step and runs first
        self.vault.credit(&token, plan.fee)?;
        entry.record.curve = plan.curve;
        entry.record.status = new_status;
        entry.holdings.insert(buyer, new_balance);
        entry.record_trade(buyer, now);

        self.events.emit(LaunchpadEvent::Trade {
            token,
            trader: buyer,
            direction: TradeDirection::Buy,
            amount_in: native_in,
            amount_out: plan.tokens_out,
            fee: plan.fee,
            timestamp: now,
        });
        tracing::debug!(
            "Buy on {}: {} native ({} net) -> {} tokens (fee {}, impact {} bps)",
            token,
            native_in,
            plan.net_in,
            plan.tokens_out,
            plan.fee,
            plan.impact_bps
        );

        if graduating {
            self.events.emit(LaunchpadEvent::Graduated {
                token,
                real_native_reserve: plan.curve.real_native,
                real_token_sold: plan.curve.real_token_sold,
                timestamp: now,
            });
            tracing::info!(
                "Token {} graduated: reserve {} >= threshold {}",
                token,
                plan.curve.real_native,
                self.config.graduation_threshold
            );
        }

        Ok(TradeReceipt {
            token,
            trader: buyer,
            direction: TradeDirection::Buy,
            amount_in: native_in,
            amount_out: plan.tokens_out,
            fee: plan.fee,
            real_native_reserve: plan.curve.real_native,
            real_token_sold: plan.curve.real_token_sold,
            graduated: graduating,
        })
    }

    /// Sell against an entry whose lock the caller already holds
    pub(crate) fn sell_locked(
        &self,
        entry: &mut TokenEntry,
        tokens_in: u64,
        min_native_out: u64,
        seller: Address,
        now: u64,
    ) -> LaunchpadResult<TradeReceipt> {
        let token = entry.record.address;
        let result = self
            .check_trade(entry, &seller, now)
            .and_then(|_| {
                if tokens_in == 0 {
                    return Err(LaunchpadError::ZeroAmount);
                }
                entry.require_balance(&seller, tokens_in)
            })
            .and_then(|_| self.plan_sell(&entry.record, tokens_in))
            .and_then(|plan| {
                if plan.net_out < min_native_out {
                    return Err(LaunchpadError::SlippageExceeded {
                        min_out: min_native_out,
                        actual_out: plan.net_out,
                    });
                }
                Ok(plan)
            });

        let plan = match result {
            Ok(plan) => plan,
            Err(e) => {
                tracing::debug!("Sell on {} by {} rejected: {}", token, seller, e);
                return Err(e);
            }
        };

        self.vault.credit(&token, plan.fee)?;
        entry.record.curve = plan.curve;
        entry.debit_holder(&seller, plan.tokens_in)?;
        entry.record_trade(seller, now);

        self.events.emit(LaunchpadEvent::Trade {
            token,
            trader: seller,
            direction: TradeDirection::Sell,
            amount_in: plan.tokens_in,
            amount_out: plan.net_out,
            fee: plan.fee,
            timestamp: now,
        });
        tracing::debug!(
            "Sell on {}: {} of {} tokens -> {} native (gross {}, fee {}, impact {} bps)",
            token,
            plan.tokens_in,
            tokens_in,
            plan.net_out,
            plan.gross_out,
            plan.fee,
            plan.impact_bps
        );

        Ok(TradeReceipt {
            token,
            trader: seller,
            direction: TradeDirection::Sell,
            amount_in: plan.tokens_in,
            amount_out: plan.net_out,
            fee: plan.fee,
            real_native_reserve: plan.curve.real_native,
            real_token_sold: plan.curve.real_token_sold,
            graduated: false,
        })
    }

    // ========================================================================
    // Quotes and views
    // ========================================================================

    /// Preview a buy without touching state (cooldown is not evaluated)
    pub fn quote_buy(&self, token: &TokenId, native_in: u64) -> LaunchpadResult<Quote> {
        let record = self.registry.get_token(token)?;
        require_trading(&record)?;
        self.check_max_buy(native_in)?;
        let plan = self.plan_buy(&record, native_in)?;
        Ok(Quote {
            amount_in: native_in,
            amount_out: plan.tokens_out,
            fee: plan.fee,
            price_impact_bps: plan.impact_bps,
        })
    }

    /// Preview a sell without touching state (balance and cooldown are not evaluated)
    pub fn quote_sell(&self, token: &TokenId, tokens_in: u64) -> LaunchpadResult<Quote> {
        let record = self.registry.get_token(token)?;
        require_trading(&record)?;
        let plan = self.plan_sell(&record, tokens_in)?;
        Ok(Quote {
            amount_in: plan.tokens_in,
            amount_out: plan.net_out,
            fee: plan.fee,
            price_impact_bps: plan.impact_bps,
        })
    }

    /// Token snapshot with creator attribution
    pub fn token_view(&self, token: &TokenId) -> LaunchpadResult<TokenView> {
        let record = self.registry.get_token(token)?;
        let creator_profile = self
            .identity
            .as_ref()
            .and_then(|resolver| resolver.resolve_identity(&record.creator));
        let spot_price = record.curve.spot_price()?;
        let progress = u128::from(record.real_native_reserve()) * u128::from(BPS_DENOMINATOR)
            / u128::from(self.config.graduation_threshold);
        let graduation_progress_bps = if record.status.is_graduated() {
            BPS_DENOMINATOR
        } else {
            u64::try_from(progress).unwrap_or(u64::MAX).min(BPS_DENOMINATOR)
        };

        Ok(TokenView {
            fees_accrued: self.vault.balance(token),
            record,
            creator_profile,
            spot_price,
            graduation_progress_bps,
        })
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Launch time, status and per-caller cooldown
    fn check_trade(&self, entry: &TokenEntry, caller: &Address, now: u64) -> LaunchpadResult<()> {
        let record = &entry.record;
        if now < record.launch_timestamp {
            return Err(LaunchpadError::not_open(format!(
                "trading opens at {}",
                record.launch_timestamp
            )));
        }
        require_trading(record)?;
        if let Some(remaining_seconds) =
            entry.cooldown_remaining(caller, now, self.config.cooldown_seconds)
        {
            return Err(LaunchpadError::CooldownActive { remaining_seconds });
        }
        Ok(())
    }

    fn check_max_buy(&self, native_in: u64) -> LaunchpadResult<()> {
        if native_in > self.config.max_buy_per_tx {
            return Err(LaunchpadError::MaxBuyExceeded {
                amount: native_in,
                max: self.config.max_buy_per_tx,
            });
        }
        Ok(())
    }

    fn plan_buy(&self, record: &TokenRecord, native_in: u64) -> LaunchpadResult<BuyPlan> {
        if native_in == 0 {
            return Err(LaunchpadError::ZeroAmount);
        }
        let fee = fee_for(native_in, self.fee_bps)?;
        let net_in = native_in - fee;
        let tokens_out = record.curve.quote_buy(net_in)?;
        if tokens_out == 0 {
            return Err(LaunchpadError::ZeroAmount);
        }

        let available = record
            .curve_supply_cap()
            .saturating_sub(record.curve.real_token_sold);
        if tokens_out > available {
            return Err(LaunchpadError::CurveSupplyExhausted {
                requested: tokens_out,
                available,
            });
        }

        let curve = record.curve.after_buy(net_in, tokens_out)?;
        let impact_bps = impact(&record.curve, &curve);
        Ok(BuyPlan {
            fee,
            net_in,
            tokens_out,
            curve,
            impact_bps,
        })
    }

    fn plan_sell(&self, record: &TokenRecord, tokens_in: u64) -> LaunchpadResult<SellPlan> {
        let settled = record.curve.quote_sell(tokens_in)?;
        let gross_out = settled.native_out;
        let fee = fee_for(gross_out, self.fee_bps)?;
        let net_out = gross_out - fee;
        if net_out == 0 {
            return Err(LaunchpadError::ZeroAmount);
        }
        let curve = record.curve.after_sell(settled)?;
        let impact_bps = impact(&record.curve, &curve);
        Ok(SellPlan {
            tokens_in: settled.tokens_in,
            fee,
            gross_out,
            net_out,
            curve,
            impact_bps,
        })
    }
}

impl std::fmt::Debug for BondingCurveMarket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BondingCurveMarket")
            .field("config", &self.config)
            .field("fee_bps", &self.fee_bps)
            .field("identity", &self.identity.is_some())
            .finish()
    }
}

fn require_trading(record: &TokenRecord) -> LaunchpadResult<()> {
    if !record.status.is_trading() {
        return Err(LaunchpadError::not_open(format!(
            "token is {}",
            record.status
        )));
    }
    Ok(())
}

fn impact(before: &BondingCurve, after: &BondingCurve) -> u64 {
    match (before.spot_price(), after.spot_price()) {
        (Ok(b), Ok(a)) => price_impact_bps(b, a),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::StaticIdentityDirectory;
    use crate::registry::NewToken;
    use crate::types::TokenStatus;

    const TREASURY: Address = Address::new([7u8; 32]);
    const CREATOR: Address = Address::new([1u8; 32]);
    const ALICE: Address = Address::new([2u8; 32]);
    const BOB: Address = Address::new([3u8; 32]);

    struct Fixture {
        market: BondingCurveMarket,
        registry: Arc<TokenRegistry>,
        vault: Arc<FeeVault>,
        events: Arc<EventLog>,
        token: TokenId,
    }

    fn market_config() -> MarketConfig {
        MarketConfig {
            graduation_threshold: 100_000,
            cooldown_seconds: 10,
            max_buy_per_tx: 1_000_000,
            launch_delay_seconds: 0,
            initial_virtual_native: 300_000,
            initial_virtual_token: 1_073_000_000,
            default_total_supply: 1_000_000_000,
            migration_reserve_bps: 2_000,
            require_max_buy_within_threshold: false,
        }
    }

    fn fixture_with(config: MarketConfig, fee_bps: u16) -> Fixture {
        let events = Arc::new(EventLog::in_memory());
        let registry = Arc::new(
            TokenRegistry::new(
                config.migration_reserve_bps,
                config.graduation_threshold,
                events.clone(),
            )
            .unwrap(),
        );
        let vault = Arc::new(FeeVault::new(TREASURY, events.clone()).unwrap());
        let fees = FeeConfig {
            fee_bps,
            migration_fee_bps: 0,
            treasury: TREASURY,
        };
        let token = registry
            .create_token(
                NewToken {
                    creator: CREATOR,
                    name: "Test".to_string(),
                    symbol: "TST".to_string(),
                    total_supply: config.default_total_supply,
                    virtual_native: config.initial_virtual_native,
                    virtual_token: config.initial_virtual_token,
                    launch_delay: 100,
                },
                0,
            )
            .unwrap()
            .address;
        let market = BondingCurveMarket::new(
            config,
            &fees,
            registry.clone(),
            vault.clone(),
            events.clone(),
        )
        .unwrap();
        Fixture {
            market,
            registry,
            vault,
            events,
            token,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(market_config(), 100)
    }

    // ========================================================================
    // Buy Tests
    // ========================================================================

    #[test]
    fn test_buy_before_launch_rejected() {
        let f = fixture();
        let result = f.market.buy(&f.token, 1_000, 0, ALICE, 99);
        assert!(matches!(result, Err(LaunchpadError::TradingNotOpen { .. })));
    }

    #[test]
    fn test_buy_skims_fee_into_vault() {
        let f = fixture();
        let receipt = f.market.buy(&f.token, 10_000, 0, ALICE, 100).unwrap();

        assert_eq!(receipt.fee, 100);
        assert_eq!(receipt.real_native_reserve, 9_900);
        assert!(receipt.amount_out > 0);
        assert!(!receipt.graduated);

        assert_eq!(f.vault.balance(&f.token), 100);
        assert_eq!(
            f.registry.holder_balance(&f.token, &ALICE).unwrap(),
            receipt.amount_out
        );
        let record = f.registry.get_token(&f.token).unwrap();
        assert_eq!(record.last_trade_timestamp, Some(100));
        assert_eq!(f.events.events_by_type("trade").len(), 1);
    }

    #[test]
    fn test_quote_matches_execution() {
        let f = fixture();
        let quote = f.market.quote_buy(&f.token, 25_000).unwrap();
        let receipt = f.market.buy(&f.token, 25_000, quote.amount_out, ALICE, 100).unwrap();
        assert_eq!(quote.amount_out, receipt.amount_out);
        assert_eq!(quote.fee, receipt.fee);
        assert!(quote.price_impact_bps > 0);
    }

    #[test]
    fn test_slippage_leaves_state_unchanged() {
        let f = fixture();
        let before = f.registry.state_hash(&f.token).unwrap();
        let quote = f.market.quote_buy(&f.token, 5_000).unwrap();

        let result = f.market.buy(&f.token, 5_000, quote.amount_out + 1, ALICE, 100);
        assert!(matches!(result, Err(LaunchpadError::SlippageExceeded { .. })));
        assert_eq!(f.registry.state_hash(&f.token).unwrap(), before);
        assert_eq!(f.vault.balance(&f.token), 0);
    }

    #[test]
    fn test_zero_buy_rejected() {
        let f = fixture();
        assert_eq!(
            f.market.buy(&f.token, 0, 0, ALICE, 100).unwrap_err(),
            LaunchpadError::ZeroAmount
        );
    }

    #[test]
    fn test_cooldown_is_per_caller() {
        let f = fixture();
        f.market.buy(&f.token, 1_000, 0, ALICE, 100).unwrap();

        assert_eq!(
            f.market.buy(&f.token, 1_000, 0, ALICE, 105).unwrap_err(),
            LaunchpadError::CooldownActive { remaining_seconds: 5 }
        );
        // Another caller is unaffected
        f.market.buy(&f.token, 1_000, 0, BOB, 105).unwrap();
        f.market.buy(&f.token, 1_000, 0, ALICE, 110).unwrap();
    }

    #[test]
    fn test_supply_cap_enforced() {
        let mut config = market_config();
        config.migration_reserve_bps = 9_900;
        config.max_buy_per_tx = u64::MAX;
        let f = fixture_with(config, 0);

        // Cap is 1% of supply: 10_000_000 tokens
        let result = f.market.buy(&f.token, 5_000, 0, ALICE, 100);
        assert!(matches!(
            result,
            Err(LaunchpadError::CurveSupplyExhausted { available: 10_000_000, .. })
        ));
    }

    // ========================================================================
    // Graduation Tests
    // ========================================================================

    #[test]
    fn test_crossing_buy_executes_and_graduates() {
        let f = fixture();
        f.market.buy(&f.token, 60_000, 0, ALICE, 100).unwrap();

        // Overshoots the threshold; executes in full
        let receipt = f.market.buy(&f.token, 80_000, 0, BOB, 100).unwrap();
        assert!(receipt.graduated);
        assert!(receipt.real_native_reserve > 100_000);

        let record = f.registry.get_token(&f.token).unwrap();
        assert!(matches!(
            record.status,
            TokenStatus::Graduated { reserve_at_graduation, graduated_at: 100 }
                if reserve_at_graduation == receipt.real_native_reserve
        ));

        let graduated = f.events.events_by_type("graduated");
        assert_eq!(graduated.len(), 1);
        let last_trade = f.events.events_by_type("trade").pop().unwrap();
        assert!(last_trade.sequence < graduated[0].sequence);

        // Curve is frozen
        assert!(matches!(
            f.market.buy(&f.token, 1_000, 0, CREATOR, 200),
            Err(LaunchpadError::TradingNotOpen { .. })
        ));
        assert!(matches!(
            f.market.sell(&f.token, 1, 0, ALICE, 200),
            Err(LaunchpadError::TradingNotOpen { .. })
        ));
    }

    // ========================================================================
    // Sell Tests
    // ========================================================================

    #[test]
    fn test_round_trip_never_profits() {
        let f = fixture();
        let bought = f.market.buy(&f.token, 50_000, 0, ALICE, 100).unwrap();
        let sold = f
            .market
            .sell(&f.token, bought.amount_out, 0, ALICE, 110)
            .unwrap();

        assert!(sold.amount_out <= 50_000);
        assert_eq!(sold.real_token_sold, 0);
        assert_eq!(f.registry.holder_balance(&f.token, &ALICE).unwrap(), 0);
        assert_eq!(f.vault.balance(&f.token), bought.fee + sold.fee);
    }

    #[test]
    fn test_partial_sell_settles_on_curve() {
        let f = fixture();
        let bought = f.market.buy(&f.token, 1_000, 0, ALICE, 100).unwrap();

        let offered = bought.amount_out / 2;
        let quote = f.market.quote_sell(&f.token, offered).unwrap();
        let sold = f.market.sell(&f.token, offered, 0, ALICE, 200).unwrap();
        assert_eq!(sold.amount_in, quote.amount_in);
        assert!(sold.amount_in <= offered);

        let record = f.registry.get_token(&f.token).unwrap();
        assert!(record.curve.is_on_curve());
        assert_eq!(
            f.registry.holder_balance(&f.token, &ALICE).unwrap(),
            bought.amount_out - sold.amount_in
        );
        assert_eq!(record.real_token_sold(), bought.amount_out - sold.amount_in);
    }

    #[test]
    fn test_sell_requires_balance() {
        let f = fixture();
        let bought = f.market.buy(&f.token, 10_000, 0, ALICE, 100).unwrap();

        let result = f.market.sell(&f.token, bought.amount_out, 0, BOB, 100);
        assert_eq!(
            result.unwrap_err(),
            LaunchpadError::InsufficientTokenBalance { have: 0, need: bought.amount_out }
        );
    }

    #[test]
    fn test_sell_slippage() {
        let f = fixture();
        let bought = f.market.buy(&f.token, 10_000, 0, ALICE, 100).unwrap();
        let quote = f.market.quote_sell(&f.token, bought.amount_out).unwrap();

        let result = f
            .market
            .sell(&f.token, bought.amount_out, quote.amount_out + 1, ALICE, 200);
        assert!(matches!(result, Err(LaunchpadError::SlippageExceeded { .. })));

        let sold = f
            .market
            .sell(&f.token, bought.amount_out, quote.amount_out, ALICE, 200)
            .unwrap();
        assert_eq!(sold.amount_out, quote.amount_out);
    }

    // ========================================================================
    // View Tests
    // ========================================================================

    #[test]
    fn test_token_view_attaches_creator_profile() {
        let f = fixture();
        let directory = Arc::new(StaticIdentityDirectory::new());
        directory.add_identity(IdentityProfile {
            address: CREATOR,
            display_name: "creator".to_string(),
            verified: true,
        });
        let market = f.market.with_identity(directory);

        market.buy(&f.token, 50_000, 0, ALICE, 100).unwrap();
        let view = market.token_view(&f.token).unwrap();
        assert_eq!(view.creator_profile.unwrap().display_name, "creator");
        assert_eq!(view.graduation_progress_bps, 4_950);
        assert_eq!(view.fees_accrued, 500);
        assert!(view.spot_price > 0);
    }
}
