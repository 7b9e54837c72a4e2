//! Token Registry
//!
//! Mints token records and indexes them for querying. Each token lives in its
//! own `Arc<Mutex<TokenEntry>>`, which is the unit of mutual exclusion for
//! every mutating operation on that token. The registry itself performs no
//! pricing; only the market and migration engine mutate an entry after
//! creation.

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::curve::BondingCurve;
use crate::errors::{LaunchpadError, LaunchpadResult};
use crate::events::{EventLog, LaunchpadEvent};
use crate::types::{Address, StatusKind, TokenId, TokenStatus};
use crate::BPS_DENOMINATOR;

/// Longest accepted ticker symbol
pub const MAX_SYMBOL_LEN: usize = 10;

/// Longest accepted token name
pub const MAX_NAME_LEN: usize = 64;

/// Parameters for a new launch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewToken {
    pub creator: Address,
    pub name: String,
    pub symbol: String,
    pub total_supply: u64,
    pub virtual_native: u64,
    pub virtual_token: u64,
    /// Seconds after creation before trading opens
    pub launch_delay: u64,
}

/// Token record
///
/// Identity fields are immutable; `curve`, `status` and
/// `last_trade_timestamp` are written by the market and migration engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub address: TokenId,
    pub creator: Address,
    pub name: String,
    pub symbol: String,
    pub total_supply: u64,
    /// Supply held back from the curve for pool seeding
    pub migration_reserve: u64,
    pub curve: BondingCurve,
    pub status: TokenStatus,
    /// Last buy or sell on the curve, by anyone
    pub last_trade_timestamp: Option<u64>,
    /// Trading is rejected before this instant
    pub launch_timestamp: u64,
    pub created_at: u64,
}

impl TokenRecord {
    /// Native held by the curve; frozen history once migrated, see
    /// [`TokenStatus::pool_seed`] for what the pool received
    pub fn real_native_reserve(&self) -> u64 {
        self.curve.real_native
    }

    pub fn real_token_sold(&self) -> u64 {
        self.curve.real_token_sold
    }

    /// Most tokens the curve may ever have outstanding
    pub fn curve_supply_cap(&self) -> u64 {
        self.total_supply.saturating_sub(self.migration_reserve)
    }

    /// Tokens not currently held by buyers
    pub fn unsold_supply(&self) -> u64 {
        self.total_supply.saturating_sub(self.curve.real_token_sold)
    }
}

/// A token record together with its holder ledger
///
/// `last_trade_by` keeps one cooldown stamp per distinct trader for the life
/// of the token and is never pruned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEntry {
    pub(crate) record: TokenRecord,
    pub(crate) holdings: BTreeMap<Address, u64>,
    pub(crate) last_trade_by: BTreeMap<Address, u64>,
}

impl TokenEntry {
    fn new(record: TokenRecord) -> Self {
        Self {
            record,
            holdings: BTreeMap::new(),
            last_trade_by: BTreeMap::new(),
        }
    }

    pub fn record(&self) -> &TokenRecord {
        &self.record
    }

    pub fn balance_of(&self, holder: &Address) -> u64 {
        self.holdings.get(holder).copied().unwrap_or(0)
    }

    /// Seconds left before `caller` may trade again, if any
    pub(crate) fn cooldown_remaining(&self, caller: &Address, now: u64, cooldown: u64) -> Option<u64> {
        let last = *self.last_trade_by.get(caller)?;
        let elapsed = now.saturating_sub(last);
        if elapsed < cooldown {
            Some(cooldown - elapsed)
        } else {
            None
        }
    }

    /// Fail unless `holder` owns at least `amount`
    pub(crate) fn require_balance(&self, holder: &Address, amount: u64) -> LaunchpadResult<()> {
        let have = self.balance_of(holder);
        if have < amount {
            return Err(LaunchpadError::InsufficientTokenBalance { have, need: amount });
        }
        Ok(())
    }

    /// Fail unless `holder` can be credited `amount` more without overflow
    pub(crate) fn require_headroom(&self, holder: &Address, amount: u64) -> LaunchpadResult<()> {
        self.balance_of(holder)
            .checked_add(amount)
            .map(|_| ())
            .ok_or(LaunchpadError::Overflow)
    }

    pub(crate) fn credit_holder(&mut self, holder: Address, amount: u64) -> LaunchpadResult<()> {
        let balance = self.holdings.entry(holder).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(LaunchpadError::Overflow)?;
        Ok(())
    }

    pub(crate) fn debit_holder(&mut self, holder: &Address, amount: u64) -> LaunchpadResult<()> {
        self.require_balance(holder, amount)?;
        let remaining = self.balance_of(holder) - amount;
        if remaining == 0 {
            self.holdings.remove(holder);
        } else {
            self.holdings.insert(*holder, remaining);
        }
        Ok(())
    }

    pub(crate) fn record_trade(&mut self, caller: Address, now: u64) {
        self.last_trade_by.insert(caller, now);
        self.record.last_trade_timestamp = Some(now);
    }

    /// Blake3 over the canonical encoding of the whole entry
    pub fn state_hash(&self) -> LaunchpadResult<[u8; 32]> {
        let encoded = bincode::serialize(self).map_err(|_| LaunchpadError::Overflow)?;
        Ok(*blake3::hash(&encoded).as_bytes())
    }
}

/// Shared handle to one token's entry
pub type TokenHandle = Arc<Mutex<TokenEntry>>;

#[derive(Debug, Default)]
struct RegistryInner {
    tokens: HashMap<TokenId, TokenHandle>,
    /// Creation order
    order: Vec<TokenId>,
    /// Launches per creator, used for address derivation
    nonces: HashMap<Address, u64>,
}

/// Token Registry
#[derive(Debug)]
pub struct TokenRegistry {
    inner: RwLock<RegistryInner>,
    migration_reserve_bps: u16,
    /// New curves must stay exact up to this reserve
    graduation_threshold: u64,
    events: Arc<EventLog>,
}

impl TokenRegistry {
    pub fn new(
        migration_reserve_bps: u16,
        graduation_threshold: u64,
        events: Arc<EventLog>,
    ) -> LaunchpadResult<Self> {
        if u64::from(migration_reserve_bps) >= BPS_DENOMINATOR {
            return Err(LaunchpadError::InvalidConfiguration(
                "migration reserve must be below 100%".to_string(),
            ));
        }
        if graduation_threshold == 0 {
            return Err(LaunchpadError::InvalidConfiguration(
                "graduation threshold must be non-zero".to_string(),
            ));
        }
        Ok(Self {
            inner: RwLock::new(RegistryInner::default()),
            migration_reserve_bps,
            graduation_threshold,
            events,
        })
    }

    /// Mint a new token record in `Trading`
    pub fn create_token(&self, params: NewToken, now: u64) -> LaunchpadResult<TokenRecord> {
        validate_metadata(&params)?;
        if params.total_supply == 0 {
            return Err(LaunchpadError::InvalidConfiguration(
                "total supply must be non-zero".to_string(),
            ));
        }
        let curve = BondingCurve::new(params.virtual_native, params.virtual_token)?;
        if !curve.supports_threshold(self.graduation_threshold) {
            return Err(LaunchpadError::InvalidConfiguration(
                "virtual reserves too shallow for graduation threshold".to_string(),
            ));
        }

        let migration_reserve = u64::try_from(
            u128::from(params.total_supply) * u128::from(self.migration_reserve_bps)
                / u128::from(BPS_DENOMINATOR),
        )
        .map_err(|_| LaunchpadError::Overflow)?;
        let launch_timestamp = now
            .checked_add(params.launch_delay)
            .ok_or(LaunchpadError::Overflow)?;

        let mut inner = self.inner.write();
        let nonce = inner.nonces.get(&params.creator).copied().unwrap_or(0);
        let address = TokenId::derive(&params.creator, nonce);
        if inner.tokens.contains_key(&address) {
            return Err(LaunchpadError::InvalidConfiguration(
                "token address already registered".to_string(),
            ));
        }

        let record = TokenRecord {
            address,
            creator: params.creator,
            name: params.name,
            symbol: params.symbol,
            total_supply: params.total_supply,
            migration_reserve,
            curve,
            status: TokenStatus::Trading,
            last_trade_timestamp: None,
            launch_timestamp,
            created_at: now,
        };

        inner.nonces.insert(params.creator, nonce + 1);
        inner.order.push(address);
        inner
            .tokens
            .insert(address, Arc::new(Mutex::new(TokenEntry::new(record.clone()))));

        self.events.emit(LaunchpadEvent::TokenCreated {
            token: address,
            creator: record.creator,
            name: record.name.clone(),
            symbol: record.symbol.clone(),
            total_supply: record.total_supply,
            launch_timestamp,
            timestamp: now,
        });

        tracing::info!(
            "Token {} ({}) created by {}: supply={}, launch at {}",
            record.symbol,
            address,
            record.creator,
            record.total_supply,
            launch_timestamp
        );

        Ok(record)
    }

    /// Read-only snapshot of a token record
    pub fn get_token(&self, token: &TokenId) -> LaunchpadResult<TokenRecord> {
        Ok(self.entry(token)?.lock().record.clone())
    }

    /// Shared handle to a token's entry
    pub(crate) fn entry(&self, token: &TokenId) -> LaunchpadResult<TokenHandle> {
        self.inner
            .read()
            .tokens
            .get(token)
            .cloned()
            .ok_or(LaunchpadError::NotFound(*token))
    }

    pub fn contains(&self, token: &TokenId) -> bool {
        self.inner.read().tokens.contains_key(token)
    }

    pub fn total_count(&self) -> usize {
        self.inner.read().order.len()
    }

    /// Snapshots of every token, in creation order
    pub fn all_tokens(&self) -> Vec<TokenRecord> {
        self.handles()
            .into_iter()
            .map(|handle| handle.lock().record.clone())
            .collect()
    }

    /// Snapshots of every token currently in `kind`
    pub fn tokens_by_status(&self, kind: StatusKind) -> Vec<TokenRecord> {
        self.handles()
            .into_iter()
            .filter_map(|handle| {
                let entry = handle.lock();
                (entry.record.status.kind() == kind).then(|| entry.record.clone())
            })
            .collect()
    }

    /// Graduated tokens awaiting migration
    pub fn ready_to_migrate(&self) -> Vec<TokenId> {
        self.tokens_by_status(StatusKind::Graduated)
            .into_iter()
            .map(|record| record.address)
            .collect()
    }

    pub fn holder_balance(&self, token: &TokenId, holder: &Address) -> LaunchpadResult<u64> {
        Ok(self.entry(token)?.lock().balance_of(holder))
    }

    /// Hash of the full token entry; unchanged by any rejected operation
    pub fn state_hash(&self, token: &TokenId) -> LaunchpadResult<[u8; 32]> {
        self.entry(token)?.lock().state_hash()
    }

    /// Get registry statistics
    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats::default();
        for handle in self.handles() {
            stats.total_deployed += 1;
            match handle.lock().record.status.kind() {
                StatusKind::Trading => stats.trading += 1,
                StatusKind::Graduated => stats.graduated_pending_migration += 1,
                StatusKind::Migrated => stats.migrated += 1,
            }
        }
        stats
    }

    // Clone handles out so no entry lock is taken under the registry lock
    fn handles(&self) -> Vec<TokenHandle> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|id| inner.tokens.get(id).cloned())
            .collect()
    }
}

fn validate_metadata(params: &NewToken) -> LaunchpadResult<()> {
    let name = params.name.trim();
    let symbol = params.symbol.trim();
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(LaunchpadError::InvalidConfiguration(format!(
            "token name must be 1-{} characters",
            MAX_NAME_LEN
        )));
    }
    if symbol.is_empty() || symbol.len() > MAX_SYMBOL_LEN {
        return Err(LaunchpadError::InvalidConfiguration(format!(
            "token symbol must be 1-{} characters",
            MAX_SYMBOL_LEN
        )));
    }
    Ok(())
}

/// Registry statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub total_deployed: u64,
    pub trading: u64,
    pub graduated_pending_migration: u64,
    pub migrated: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> TokenRegistry {
        TokenRegistry::new(2_000, 10_000, Arc::new(EventLog::in_memory())).unwrap()
    }

    fn params(creator: u8) -> NewToken {
        NewToken {
            creator: Address::new([creator; 32]),
            name: "Test Token".to_string(),
            symbol: "TEST".to_string(),
            total_supply: 1_000_000,
            virtual_native: 30_000,
            virtual_token: 1_073_000,
            launch_delay: 60,
        }
    }

    #[test]
    fn test_create_token() {
        let registry = registry();
        let record = registry.create_token(params(1), 1_000).unwrap();

        assert_eq!(record.status, TokenStatus::Trading);
        assert_eq!(record.real_native_reserve(), 0);
        assert_eq!(record.real_token_sold(), 0);
        assert_eq!(record.launch_timestamp, 1_060);
        assert_eq!(record.migration_reserve, 200_000);
        assert_eq!(record.curve_supply_cap(), 800_000);

        assert_eq!(registry.get_token(&record.address).unwrap(), record);
        assert_eq!(registry.total_count(), 1);
    }

    #[test]
    fn test_create_rejects_invalid_configuration() {
        let registry = registry();

        let mut bad = params(1);
        bad.virtual_native = 0;
        assert!(matches!(
            registry.create_token(bad, 0),
            Err(LaunchpadError::InvalidConfiguration(_))
        ));

        let mut bad = params(1);
        bad.virtual_token = 0;
        assert!(registry.create_token(bad, 0).is_err());

        let mut bad = params(1);
        bad.total_supply = 0;
        assert!(registry.create_token(bad, 0).is_err());

        let mut bad = params(1);
        bad.virtual_token = 1_000;
        assert!(registry.create_token(bad, 0).is_err());

        let mut bad = params(1);
        bad.symbol = "WAYTOOLONGSYMBOL".to_string();
        assert!(registry.create_token(bad, 0).is_err());

        assert_eq!(registry.total_count(), 0);
    }

    #[test]
    fn test_same_creator_gets_distinct_addresses() {
        let registry = registry();
        let a = registry.create_token(params(1), 0).unwrap();
        let b = registry.create_token(params(1), 0).unwrap();
        assert_ne!(a.address, b.address);
    }

    #[test]
    fn test_unknown_token_not_found() {
        let registry = registry();
        let missing = TokenId::new([9u8; 32]);
        assert_eq!(
            registry.get_token(&missing).unwrap_err(),
            LaunchpadError::NotFound(missing)
        );
    }

    #[test]
    fn test_stats_and_status_queries() {
        let registry = registry();
        let a = registry.create_token(params(1), 0).unwrap();
        registry.create_token(params(2), 0).unwrap();

        {
            let handle = registry.entry(&a.address).unwrap();
            let mut entry = handle.lock();
            entry.record.status = entry.record.status.graduate(100, 5).unwrap();
        }

        let stats = registry.stats();
        assert_eq!(stats.total_deployed, 2);
        assert_eq!(stats.trading, 1);
        assert_eq!(stats.graduated_pending_migration, 1);
        assert_eq!(registry.ready_to_migrate(), vec![a.address]);
        assert_eq!(registry.tokens_by_status(StatusKind::Trading).len(), 1);
    }

    #[test]
    fn test_holder_ledger() {
        let registry = registry();
        let record = registry.create_token(params(1), 0).unwrap();
        let holder = Address::new([5u8; 32]);

        let handle = registry.entry(&record.address).unwrap();
        let before = handle.lock().state_hash().unwrap();
        {
            let mut entry = handle.lock();
            entry.credit_holder(holder, 100).unwrap();
            assert_eq!(
                entry.debit_holder(&holder, 101).unwrap_err(),
                LaunchpadError::InsufficientTokenBalance { have: 100, need: 101 }
            );
            entry.debit_holder(&holder, 100).unwrap();
        }
        // Empty balances are pruned, so the hash returns to its original value
        assert_eq!(handle.lock().state_hash().unwrap(), before);
        assert_eq!(registry.holder_balance(&record.address, &holder).unwrap(), 0);
    }

    #[test]
    fn test_cooldown_remaining() {
        let registry = registry();
        let record = registry.create_token(params(1), 0).unwrap();
        let caller = Address::new([5u8; 32]);
        let handle = registry.entry(&record.address).unwrap();
        let mut entry = handle.lock();

        assert_eq!(entry.cooldown_remaining(&caller, 100, 10), None);
        entry.record_trade(caller, 100);
        assert_eq!(entry.cooldown_remaining(&caller, 105, 10), Some(5));
        assert_eq!(entry.cooldown_remaining(&caller, 110, 10), None);
        assert_eq!(entry.record.last_trade_timestamp, Some(100));
    }
}
