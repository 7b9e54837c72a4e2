//! Property tests for curve pricing through the public market API

use proptest::prelude::*;

use lib_launchpad::{
    Address, BondingCurve, Launchpad, LaunchpadConfig, TokenId, NATIVE_UNIT,
};

const TREASURY: Address = Address::new([7u8; 32]);
const CREATOR: Address = Address::new([1u8; 32]);
const ALICE: Address = Address::new([2u8; 32]);
const BOB: Address = Address::new([3u8; 32]);

/// Production-shaped market with cooldown disabled
fn market() -> (Launchpad, TokenId) {
    let mut config = LaunchpadConfig::with_treasury(TREASURY);
    config.market.cooldown_seconds = 0;
    let launchpad = Launchpad::in_memory(config, None).unwrap();
    let token = launchpad
        .launch_token(CREATOR, "Property", "PROP", 0)
        .unwrap()
        .address;
    (launchpad, token)
}

proptest! {
    /// Equal successive buys receive strictly fewer tokens
    #[test]
    fn prop_price_monotone(amount in NATIVE_UNIT / 1_000..3 * NATIVE_UNIT) {
        let (launchpad, token) = market();
        let market = launchpad.market();

        let mut previous = u64::MAX;
        for _ in 0..3 {
            let receipt = market.buy(&token, amount, 0, ALICE, 0).unwrap();
            prop_assert!(receipt.amount_out < previous);
            previous = receipt.amount_out;
        }
    }

    /// Buying then selling everything never returns more than was paid
    #[test]
    fn prop_round_trip_never_profits(
        prior in 0u64..4 * NATIVE_UNIT,
        amount in 1_000u64..5 * NATIVE_UNIT,
    ) {
        let (launchpad, token) = market();
        let market = launchpad.market();

        if prior > 0 {
            market.buy(&token, prior, 0, BOB, 0).unwrap();
        }
        let bought = market.buy(&token, amount, 0, ALICE, 0).unwrap();
        let sold = market.sell(&token, bought.amount_out, 0, ALICE, 0).unwrap();

        prop_assert!(sold.amount_out <= amount);
        prop_assert_eq!(
            launchpad.registry().holder_balance(&token, &ALICE).unwrap(),
            0
        );
    }

    /// Quotes match execution exactly
    #[test]
    fn prop_quote_matches_execution(amount in 1u64..5 * NATIVE_UNIT) {
        let (launchpad, token) = market();
        let market = launchpad.market();

        let quote = market.quote_buy(&token, amount);
        let receipt = market.buy(&token, amount, 0, ALICE, 0);
        match (quote, receipt) {
            (Ok(q), Ok(r)) => {
                prop_assert_eq!(q.amount_out, r.amount_out);
                prop_assert_eq!(q.fee, r.fee);
            }
            (Err(qe), Err(re)) => prop_assert_eq!(qe, re),
            (q, r) => prop_assert!(false, "quote {:?} disagrees with buy {:?}", q, r),
        }
    }

    /// The product of effective reserves never falls below k
    #[test]
    fn prop_k_preserved(
        trades in proptest::collection::vec((any::<bool>(), 1u64..NATIVE_UNIT), 1..20),
    ) {
        let (launchpad, token) = market();
        let market = launchpad.market();
        let k = launchpad.registry().get_token(&token).unwrap().curve.k();

        let mut fees = 0u64;
        for (is_buy, amount) in trades {
            let result = if is_buy {
                market.buy(&token, amount, 0, ALICE, 0)
            } else {
                let held = launchpad.registry().holder_balance(&token, &ALICE).unwrap();
                market.sell(&token, amount.min(held).max(1), 0, ALICE, 0)
            };
            if let Ok(receipt) = result {
                fees += receipt.fee;
            }

            let curve = launchpad.registry().get_token(&token).unwrap().curve;
            prop_assert_eq!(curve.k(), k);
            prop_assert!(curve.effective_native() * curve.effective_token().unwrap() >= k);
        }
        prop_assert_eq!(launchpad.vault().balance(&token), fees);
    }

    /// Interleaved trades by several holders keep the token count implied by
    /// the native reserve, and the holder ledger matches the curve
    #[test]
    fn prop_trades_stay_on_curve(
        trades in proptest::collection::vec(
            (0usize..3, any::<bool>(), 1u64..2 * NATIVE_UNIT, 1u64..=100),
            1..40,
        ),
    ) {
        let (launchpad, token) = market();
        let market = launchpad.market();
        let traders = [ALICE, BOB, CREATOR];

        for (who, is_buy, amount, percent) in trades {
            let trader = traders[who];
            let result = if is_buy {
                market.buy(&token, amount, 0, trader, 0)
            } else {
                let held = launchpad.registry().holder_balance(&token, &trader).unwrap();
                market.sell(&token, (held * percent / 100).max(1), 0, trader, 0)
            };
            if result.is_err() {
                continue;
            }

            let curve = launchpad.registry().get_token(&token).unwrap().curve;
            let effective_native = curve.virtual_native as u128 + curve.real_native as u128;
            let canonical = curve.virtual_token as u128 - ceil_div(curve.k(), effective_native);
            prop_assert_eq!(curve.real_token_sold as u128, canonical);

            let held: u64 = traders
                .iter()
                .map(|t| launchpad.registry().holder_balance(&token, t).unwrap())
                .sum();
            prop_assert_eq!(held, curve.real_token_sold);
        }
    }

    /// Bare curve: a buy lands exactly on ceil(k / n)
    #[test]
    fn prop_buy_lands_on_curve(
        virtual_native in 1_000u64..1_000_000,
        virtual_token in 1_000_000u64..1_000_000_000_000,
        net_in in 1u64..1_000_000,
    ) {
        let curve = BondingCurve::new(virtual_native, virtual_token).unwrap();
        if let Ok(tokens_out) = curve.quote_buy(net_in) {
            let after = curve.after_buy(net_in, tokens_out).unwrap();
            let n = after.effective_native();
            let t = after.effective_token().unwrap();
            prop_assert!(n * t >= curve.k());
            prop_assert!(n * (t - 1) < curve.k());
        }
    }
}

fn ceil_div(numerator: u128, denominator: u128) -> u128 {
    (numerator + denominator - 1) / denominator
}
