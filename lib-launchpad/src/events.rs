//! Launchpad Events
//!
//! Every committed state change emits an event for external indexers and bots.
//! Events are appended to the [`EventLog`] while the token's lock is still
//! held, so the global sequence number also gives per-token causal order:
//! a `Graduated` never follows `Migrated`, and no curve `Trade` follows
//! `Migrated` for the same token.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::types::{Address, PoolHandle, TokenId, TradeDirection};

/// Where a trade was executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeVenue {
    /// Bonding curve owned by the market
    BondingCurve,
    /// External pool after migration
    ExternalPool,
}

/// Launchpad events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum LaunchpadEvent {
    /// Token record minted by the registry
    TokenCreated {
        token: TokenId,
        creator: Address,
        name: String,
        symbol: String,
        total_supply: u64,
        /// First instant at which trading is accepted
        launch_timestamp: u64,
        timestamp: u64,
    },

    /// Buy or sell executed on the bonding curve
    Trade {
        token: TokenId,
        trader: Address,
        direction: TradeDirection,
        /// Pre-fee input (native for buys, tokens for sells)
        amount_in: u64,
        /// Net output delivered to the trader
        amount_out: u64,
        /// Protocol fee in native units
        fee: u64,
        timestamp: u64,
    },

    /// Routed swap executed on the external pool after migration
    PoolSwap {
        token: TokenId,
        trader: Address,
        pool: PoolHandle,
        direction: TradeDirection,
        amount_in: u64,
        amount_out: u64,
        /// Pool fee, taken from the input
        fee: u64,
        timestamp: u64,
    },

    /// Reserve crossed the graduation threshold
    Graduated {
        token: TokenId,
        real_native_reserve: u64,
        real_token_sold: u64,
        timestamp: u64,
    },

    /// Liquidity moved to an external pool and its share locked
    Migrated {
        token: TokenId,
        pool: PoolHandle,
        native_seeded: u64,
        tokens_seeded: u64,
        timestamp: u64,
    },

    /// Treasury withdrew accrued fees
    FeesWithdrawn {
        token: TokenId,
        to: Address,
        amount: u64,
        timestamp: u64,
    },
}

impl LaunchpadEvent {
    /// Get the token associated with this event
    pub fn token(&self) -> &TokenId {
        match self {
            LaunchpadEvent::TokenCreated { token, .. } => token,
            LaunchpadEvent::Trade { token, .. } => token,
            LaunchpadEvent::PoolSwap { token, .. } => token,
            LaunchpadEvent::Graduated { token, .. } => token,
            LaunchpadEvent::Migrated { token, .. } => token,
            LaunchpadEvent::FeesWithdrawn { token, .. } => token,
        }
    }

    /// Get the timestamp for this event
    pub fn timestamp(&self) -> u64 {
        match self {
            LaunchpadEvent::TokenCreated { timestamp, .. } => *timestamp,
            LaunchpadEvent::Trade { timestamp, .. } => *timestamp,
            LaunchpadEvent::PoolSwap { timestamp, .. } => *timestamp,
            LaunchpadEvent::Graduated { timestamp, .. } => *timestamp,
            LaunchpadEvent::Migrated { timestamp, .. } => *timestamp,
            LaunchpadEvent::FeesWithdrawn { timestamp, .. } => *timestamp,
        }
    }

    /// Get event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            LaunchpadEvent::TokenCreated { .. } => "token_created",
            LaunchpadEvent::Trade { .. } => "trade",
            LaunchpadEvent::PoolSwap { .. } => "pool_swap",
            LaunchpadEvent::Graduated { .. } => "graduated",
            LaunchpadEvent::Migrated { .. } => "migrated",
            LaunchpadEvent::FeesWithdrawn { .. } => "fees_withdrawn",
        }
    }
}

/// An event with its position in the global log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventRecord {
    pub sequence: u64,
    pub event: LaunchpadEvent,
}

impl EventRecord {
    /// JSON form handed to external consumers
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Event indexer interface
///
/// Implement this to index launchpad events for API queries.
pub trait EventIndexer: Send {
    /// Index a new event
    fn index_event(&mut self, record: EventRecord);

    /// Get all events for a token, in sequence order
    fn token_events(&self, token: &TokenId) -> Vec<EventRecord>;

    /// Get all events of one type, in sequence order
    fn events_by_type(&self, event_type: &str) -> Vec<EventRecord>;

    /// Get events with `sequence >= from`
    fn events_since(&self, from: u64) -> Vec<EventRecord>;

    /// Get latest event for a token
    fn latest_event(&self, token: &TokenId) -> Option<EventRecord>;

    /// Highest sequence indexed so far
    fn last_sequence(&self) -> Option<u64>;
}

/// In-memory event indexer
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventIndexer {
    records: Vec<EventRecord>,
}

impl InMemoryEventIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl EventIndexer for InMemoryEventIndexer {
    fn index_event(&mut self, record: EventRecord) {
        self.records.push(record);
    }

    fn token_events(&self, token: &TokenId) -> Vec<EventRecord> {
        self.records
            .iter()
            .filter(|r| r.event.token() == token)
            .cloned()
            .collect()
    }

    fn events_by_type(&self, event_type: &str) -> Vec<EventRecord> {
        self.records
            .iter()
            .filter(|r| r.event.event_type() == event_type)
            .cloned()
            .collect()
    }

    fn events_since(&self, from: u64) -> Vec<EventRecord> {
        self.records
            .iter()
            .filter(|r| r.sequence >= from)
            .cloned()
            .collect()
    }

    fn latest_event(&self, token: &TokenId) -> Option<EventRecord> {
        self.records
            .iter()
            .rev()
            .find(|r| r.event.token() == token)
            .cloned()
    }

    fn last_sequence(&self) -> Option<u64> {
        self.records.last().map(|r| r.sequence)
    }
}

struct EventLogInner {
    next_sequence: u64,
    indexer: Box<dyn EventIndexer>,
}

/// Append-only log shared by every launchpad component
pub struct EventLog {
    inner: Mutex<EventLogInner>,
}

impl EventLog {
    /// Log backed by the given indexer, continuing its sequence
    pub fn new(indexer: Box<dyn EventIndexer>) -> Self {
        let next_sequence = indexer.last_sequence().map_or(0, |s| s + 1);
        Self {
            inner: Mutex::new(EventLogInner {
                next_sequence,
                indexer,
            }),
        }
    }

    /// Log backed by an [`InMemoryEventIndexer`]
    pub fn in_memory() -> Self {
        Self::new(Box::new(InMemoryEventIndexer::new()))
    }

    /// Append an event and return its record
    pub fn emit(&self, event: LaunchpadEvent) -> EventRecord {
        let mut inner = self.inner.lock();
        let record = EventRecord {
            sequence: inner.next_sequence,
            event,
        };
        inner.next_sequence += 1;
        tracing::trace!(
            "event #{} {} for {}",
            record.sequence,
            record.event.event_type(),
            record.event.token()
        );
        inner.indexer.index_event(record.clone());
        record
    }

    /// Sequence the next event will receive
    pub fn next_sequence(&self) -> u64 {
        self.inner.lock().next_sequence
    }

    pub fn token_events(&self, token: &TokenId) -> Vec<EventRecord> {
        self.inner.lock().indexer.token_events(token)
    }

    pub fn events_by_type(&self, event_type: &str) -> Vec<EventRecord> {
        self.inner.lock().indexer.events_by_type(event_type)
    }

    pub fn events_since(&self, from: u64) -> Vec<EventRecord> {
        self.inner.lock().indexer.events_since(from)
    }

    pub fn latest_event(&self, token: &TokenId) -> Option<EventRecord> {
        self.inner.lock().indexer.latest_event(token)
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("next_sequence", &self.next_sequence())
            .finish()
    }
}
