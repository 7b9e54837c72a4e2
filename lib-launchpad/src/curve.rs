//! Virtual-Reserve Constant Product Curve
//!
//! Pricing for the bonding curve phase. The curve keeps
//! `k = virtual_native × virtual_token` fixed, where effective reserves are
//!
//! ```text
//!   effective_native = virtual_native + real_native
//!   effective_token  = virtual_token  − real_token_sold
//! ```
//!
//! `real_native` is the single source of truth: every committed state satisfies
//!
//! ```text
//!   effective_token = ceil(k / effective_native)
//! ```
//!
//! A buy of net `Δn` lands on `ceil(k / (effective_native + Δn))` effective
//! tokens. A sell offering `t` tokens moves effective native to
//! `n' = ceil(k / (effective_token + t))`, the lowest reserve the offered
//! tokens can reach, and settles only `ceil(k / n') − effective_token` of
//! them. Both divisions round up, so `effective_native × effective_token ≥ k`
//! after every step and rounding never pays a trader extra.
//!
//! All values are value types; callers quote, check, then commit the returned
//! state.

use serde::{Deserialize, Serialize};

use crate::errors::LaunchpadError;
use crate::BPS_DENOMINATOR;

/// Fixed-point precision for spot prices (1e18)
pub const PRICE_PRECISION: u128 = 1_000_000_000_000_000_000;

/// Settled part of a sell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurveSell {
    /// Tokens the curve takes back, at most the amount offered
    pub tokens_in: u64,
    /// Gross native paid before fees
    pub native_out: u64,
}

/// Curve reserves for a single token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondingCurve {
    /// Virtual native offset (immutable)
    pub virtual_native: u64,
    /// Virtual token offset (immutable)
    pub virtual_token: u64,
    /// Native actually collected from buyers minus paid to sellers
    pub real_native: u64,
    /// Tokens actually distributed to buyers minus returned by sellers
    pub real_token_sold: u64,
}

impl BondingCurve {
    /// Fresh curve with no real reserves
    pub fn new(virtual_native: u64, virtual_token: u64) -> Result<Self, LaunchpadError> {
        if virtual_native == 0 || virtual_token == 0 {
            return Err(LaunchpadError::InvalidConfiguration(
                "virtual reserves must be non-zero".to_string(),
            ));
        }
        Ok(Self {
            virtual_native,
            virtual_token,
            real_native: 0,
            real_token_sold: 0,
        })
    }

    /// Constant product of the virtual reserves
    pub fn k(&self) -> u128 {
        (self.virtual_native as u128) * (self.virtual_token as u128)
    }

    /// `virtual_native + real_native`
    pub fn effective_native(&self) -> u128 {
        self.virtual_native as u128 + self.real_native as u128
    }

    /// `virtual_token − real_token_sold`
    pub fn effective_token(&self) -> Result<u128, LaunchpadError> {
        (self.virtual_token as u128)
            .checked_sub(self.real_token_sold as u128)
            .ok_or(LaunchpadError::Overflow)
    }

    /// Tokens sold at the current native reserve, `virtual_token − ceil(k / effective_native)`
    pub fn canonical_token_sold(&self) -> Result<u64, LaunchpadError> {
        let effective_token = ceil_div(self.k(), self.effective_native())?;
        (self.virtual_token as u128)
            .checked_sub(effective_token)
            .and_then(|sold| u64::try_from(sold).ok())
            .ok_or(LaunchpadError::Overflow)
    }

    /// Whether `real_token_sold` is the one implied by `real_native`
    pub fn is_on_curve(&self) -> bool {
        matches!(self.canonical_token_sold(), Ok(sold) if sold == self.real_token_sold)
    }

    /// Tokens received for a net (post-fee) native input
    pub fn quote_buy(&self, net_native_in: u64) -> Result<u64, LaunchpadError> {
        if net_native_in == 0 {
            return Err(LaunchpadError::ZeroAmount);
        }

        let effective_token = self.effective_token()?;
        let new_effective_native = self
            .effective_native()
            .checked_add(net_native_in as u128)
            .ok_or(LaunchpadError::Overflow)?;
        let new_effective_token = ceil_div(self.k(), new_effective_native)?;

        let tokens_out = effective_token
            .checked_sub(new_effective_token)
            .ok_or(LaunchpadError::Overflow)?;
        u64::try_from(tokens_out).map_err(|_| LaunchpadError::Overflow)
    }

    /// Settlement for offering `tokens_offered` back to the curve
    ///
    /// The settled amount may fall short of the offer by rounding dust when
    /// the offer does not land exactly on the curve; the seller keeps it.
    pub fn quote_sell(&self, tokens_offered: u64) -> Result<CurveSell, LaunchpadError> {
        if tokens_offered == 0 {
            return Err(LaunchpadError::ZeroAmount);
        }
        if tokens_offered > self.real_token_sold {
            // More tokens than the curve ever issued
            return Err(LaunchpadError::InsufficientReserve {
                requested: tokens_offered,
                available: self.real_token_sold,
            });
        }

        let effective_token = self.effective_token()?;
        let reachable_token = effective_token
            .checked_add(tokens_offered as u128)
            .ok_or(LaunchpadError::Overflow)?;
        let new_effective_native = ceil_div(self.k(), reachable_token)?;
        let new_effective_token = ceil_div(self.k(), new_effective_native)?;

        let tokens_in = new_effective_token
            .checked_sub(effective_token)
            .ok_or(LaunchpadError::Overflow)?;
        let tokens_in = u64::try_from(tokens_in).map_err(|_| LaunchpadError::Overflow)?;

        let native_out = self
            .effective_native()
            .checked_sub(new_effective_native)
            .ok_or(LaunchpadError::Overflow)?;
        let native_out = u64::try_from(native_out).map_err(|_| LaunchpadError::Overflow)?;

        if native_out > self.real_native {
            return Err(LaunchpadError::InsufficientReserve {
                requested: native_out,
                available: self.real_native,
            });
        }
        if tokens_in == 0 || native_out == 0 {
            return Err(LaunchpadError::ZeroAmount);
        }
        Ok(CurveSell {
            tokens_in,
            native_out,
        })
    }

    /// State after a buy of `net_native_in` yielding `tokens_out`
    pub fn after_buy(&self, net_native_in: u64, tokens_out: u64) -> Result<Self, LaunchpadError> {
        Ok(Self {
            real_native: self
                .real_native
                .checked_add(net_native_in)
                .ok_or(LaunchpadError::Overflow)?,
            real_token_sold: self
                .real_token_sold
                .checked_add(tokens_out)
                .ok_or(LaunchpadError::Overflow)?,
            ..*self
        })
    }

    /// State after settling `sell`, as returned by [`quote_sell`](Self::quote_sell)
    pub fn after_sell(&self, sell: CurveSell) -> Result<Self, LaunchpadError> {
        let CurveSell {
            tokens_in,
            native_out: gross_native_out,
        } = sell;
        Ok(Self {
            real_native: self
                .real_native
                .checked_sub(gross_native_out)
                .ok_or(LaunchpadError::InsufficientReserve {
                    requested: gross_native_out,
                    available: self.real_native,
                })?,
            real_token_sold: self
                .real_token_sold
                .checked_sub(tokens_in)
                .ok_or(LaunchpadError::Overflow)?,
            ..*self
        })
    }

    /// Whether a buy below `graduation_threshold` can always be sold back exactly
    ///
    /// While `(virtual_native + threshold)² <= k`, `ceil(k / ceil(k / n)) == n`
    /// for every reachable effective native `n`, so selling the tokens of a
    /// buy returns the curve to the native reserve it started from.
    pub fn supports_threshold(&self, graduation_threshold: u64) -> bool {
        let n = self.virtual_native as u128 + graduation_threshold as u128;
        match n.checked_mul(n) {
            Some(square) => square <= self.k(),
            None => false,
        }
    }

    /// Spot price in native atomic units per token atomic unit, scaled by 1e18
    pub fn spot_price(&self) -> Result<u128, LaunchpadError> {
        let effective_token = self.effective_token()?;
        if effective_token == 0 {
            return Err(LaunchpadError::Overflow);
        }
        self.effective_native()
            .checked_mul(PRICE_PRECISION)
            .ok_or(LaunchpadError::Overflow)
            .map(|scaled| scaled / effective_token)
    }
}

/// Fee on `amount` at `fee_bps`, rounded down
pub fn fee_for(amount: u64, fee_bps: u16) -> Result<u64, LaunchpadError> {
    let fee = (amount as u128)
        .checked_mul(fee_bps as u128)
        .ok_or(LaunchpadError::Overflow)?
        / BPS_DENOMINATOR as u128;
    u64::try_from(fee).map_err(|_| LaunchpadError::Overflow)
}

/// Relative price move between two spot prices, in basis points
pub fn price_impact_bps(before: u128, after: u128) -> u64 {
    if before == 0 {
        return 0;
    }
    let diff = before.abs_diff(after);
    let bps = diff.saturating_mul(BPS_DENOMINATOR as u128) / before;
    u64::try_from(bps).unwrap_or(u64::MAX)
}

fn ceil_div(numerator: u128, denominator: u128) -> Result<u128, LaunchpadError> {
    if denominator == 0 {
        return Err(LaunchpadError::Overflow);
    }
    let quotient = numerator / denominator;
    if numerator % denominator == 0 {
        Ok(quotient)
    } else {
        quotient.checked_add(1).ok_or(LaunchpadError::Overflow)
    }
}
