//! Fee Vault
//!
//! Accumulates protocol fees per token.
//!
//! # Invariants
//!
//! ## V1: Balance accounting
//! For every token: `accrued == total_credited - total_withdrawn`.
//!
//! ## V2: Sole debit path
//! Balances are credited only by the market and migration engine
//! (`pub(crate)`), and debited only by [`FeeVault::withdraw`] called by the
//! configured treasury principal.
//!
//! Pricing never reads the vault.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::{LaunchpadError, LaunchpadResult};
use crate::events::{EventLog, LaunchpadEvent};
use crate::types::{Address, TokenId};

/// Fee balance for one token
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeAccount {
    /// Currently withdrawable
    pub accrued: u64,
    pub total_credited: u64,
    pub total_withdrawn: u64,
}

/// Fee Vault
#[derive(Debug)]
pub struct FeeVault {
    treasury: Address,
    accounts: Mutex<HashMap<TokenId, FeeAccount>>,
    events: Arc<EventLog>,
}

impl FeeVault {
    pub fn new(treasury: Address, events: Arc<EventLog>) -> LaunchpadResult<Self> {
        if treasury.is_zero() {
            return Err(LaunchpadError::InvalidConfiguration(
                "treasury principal must be set".to_string(),
            ));
        }
        Ok(Self {
            treasury,
            accounts: Mutex::new(HashMap::new()),
            events,
        })
    }

    pub fn treasury(&self) -> Address {
        self.treasury
    }

    /// Fail if crediting `amount` would overflow the token's account
    pub(crate) fn check_credit(&self, token: &TokenId, amount: u64) -> LaunchpadResult<()> {
        let account = self.account(token);
        account.accrued.checked_add(amount).ok_or(LaunchpadError::Overflow)?;
        account
            .total_credited
            .checked_add(amount)
            .ok_or(LaunchpadError::Overflow)?;
        Ok(())
    }

    /// Credit fees for a completed trade or migration
    pub(crate) fn credit(&self, token: &TokenId, amount: u64) -> LaunchpadResult<()> {
        if amount == 0 {
            return Ok(());
        }
        let mut accounts = self.accounts.lock();
        let account = accounts.entry(*token).or_default();
        let accrued = account.accrued.checked_add(amount).ok_or(LaunchpadError::Overflow)?;
        let total_credited = account
            .total_credited
            .checked_add(amount)
            .ok_or(LaunchpadError::Overflow)?;
        account.accrued = accrued;
        account.total_credited = total_credited;
        Ok(())
    }

    /// Withdraw accrued fees to `to`; treasury only
    pub fn withdraw(
        &self,
        caller: &Address,
        token: &TokenId,
        amount: u64,
        to: Address,
        now: u64,
    ) -> LaunchpadResult<FeeAccount> {
        if *caller != self.treasury {
            tracing::warn!("Rejected fee withdrawal by non-treasury caller {}", caller);
            return Err(LaunchpadError::Unauthorized(*caller));
        }
        if amount == 0 {
            return Err(LaunchpadError::ZeroAmount);
        }

        let mut accounts = self.accounts.lock();
        let available = accounts.get(token).map_or(0, |a| a.accrued);
        if amount > available {
            return Err(LaunchpadError::InsufficientFeeBalance {
                requested: amount,
                available,
            });
        }

        let account = accounts.entry(*token).or_default();
        account.accrued -= amount;
        account.total_withdrawn = account.total_withdrawn.saturating_add(amount);
        let snapshot = *account;

        self.events.emit(LaunchpadEvent::FeesWithdrawn {
            token: *token,
            to,
            amount,
            timestamp: now,
        });
        tracing::info!("Withdrew {} fees for {} to {}", amount, token, to);

        Ok(snapshot)
    }

    /// Withdrawable balance for a token
    pub fn balance(&self, token: &TokenId) -> u64 {
        self.accounts.lock().get(token).map_or(0, |a| a.accrued)
    }

    pub fn account(&self, token: &TokenId) -> FeeAccount {
        self.accounts.lock().get(token).copied().unwrap_or_default()
    }

    /// Sum of withdrawable balances across tokens
    pub fn total_accrued(&self) -> u128 {
        self.accounts
            .lock()
            .values()
            .map(|a| u128::from(a.accrued))
            .sum()
    }
}
