//! Sled-backed Persistent Event Indexer
//!
//! Records are stored under big-endian sequence keys so sled's ordered
//! iteration returns them in log order. Secondary trees map
//! `token || sequence` and `event_type/sequence` back to the primary key.

use crate::events::{EventIndexer, EventRecord};
use crate::types::TokenId;

/// Sled-backed persistent event indexer
#[derive(Debug)]
pub struct SledEventIndexer {
    db: sled::Db,
    events: sled::Tree,
    token_index: sled::Tree,
    type_index: sled::Tree,
}

const TREE_EVENTS: &str = "launchpad_events";
const TREE_TOKEN_INDEX: &str = "lp_events_token_idx";
const TREE_TYPE_INDEX: &str = "lp_events_type_idx";

impl SledEventIndexer {
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self, sled::Error> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    pub fn from_db(db: sled::Db) -> Result<Self, sled::Error> {
        let events = db.open_tree(TREE_EVENTS)?;
        let token_index = db.open_tree(TREE_TOKEN_INDEX)?;
        let type_index = db.open_tree(TREE_TYPE_INDEX)?;

        Ok(Self {
            db,
            events,
            token_index,
            type_index,
        })
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn flush(&self) -> Result<(), sled::Error> {
        self.events.flush()?;
        self.token_index.flush()?;
        self.type_index.flush()?;
        self.db.flush()?;
        Ok(())
    }

    fn store(&self, record: &EventRecord) -> Result<(), String> {
        let key = record.sequence.to_be_bytes();
        let serialized =
            bincode::serialize(record).map_err(|e| format!("Failed to serialize event: {}", e))?;

        self.events
            .insert(key, serialized)
            .map_err(|e| format!("Failed to store event: {}", e))?;

        let mut token_key = Vec::with_capacity(40);
        token_key.extend_from_slice(record.event.token().as_bytes());
        token_key.extend_from_slice(&key);
        self.token_index
            .insert(token_key, &key[..])
            .map_err(|e| format!("Failed to update token index: {}", e))?;

        let mut type_key = format!("{}/", record.event.event_type()).into_bytes();
        type_key.extend_from_slice(&key);
        self.type_index
            .insert(type_key, &key[..])
            .map_err(|e| format!("Failed to update type index: {}", e))?;

        Ok(())
    }

    fn load(&self, key: &[u8]) -> Option<EventRecord> {
        match self.events.get(key) {
            Ok(Some(data)) => match bincode::deserialize::<EventRecord>(&data) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::error!("Failed to decode event: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::error!("Error reading event: {}", e);
                None
            }
        }
    }

    fn collect_index(&self, iter: sled::Iter, index_name: &str) -> Vec<EventRecord> {
        let mut records = Vec::new();
        for result in iter {
            match result {
                Ok((_, event_key)) => {
                    if let Some(record) = self.load(&event_key) {
                        records.push(record);
                    }
                }
                Err(e) => {
                    tracing::error!("Error reading {} index: {}", index_name, e);
                }
            }
        }
        records
    }
}

impl EventIndexer for SledEventIndexer {
    fn index_event(&mut self, record: EventRecord) {
        if let Err(e) = self.store(&record) {
            tracing::error!("{} (sequence {})", e, record.sequence);
        }
    }

    fn token_events(&self, token: &TokenId) -> Vec<EventRecord> {
        self.collect_index(self.token_index.scan_prefix(token.as_bytes()), "token")
    }

    fn events_by_type(&self, event_type: &str) -> Vec<EventRecord> {
        let prefix = format!("{}/", event_type);
        self.collect_index(self.type_index.scan_prefix(prefix.as_bytes()), "type")
    }

    fn events_since(&self, from: u64) -> Vec<EventRecord> {
        let mut records = Vec::new();
        for result in self.events.range(from.to_be_bytes()..) {
            match result {
                Ok((_, data)) => match bincode::deserialize::<EventRecord>(&data) {
                    Ok(record) => records.push(record),
                    Err(e) => tracing::error!("Failed to decode event: {}", e),
                },
                Err(e) => {
                    tracing::error!("Error reading events: {}", e);
                }
            }
        }
        records
    }

    fn latest_event(&self, token: &TokenId) -> Option<EventRecord> {
        match self.token_index.scan_prefix(token.as_bytes()).next_back() {
            Some(Ok((_, event_key))) => self.load(&event_key),
            Some(Err(e)) => {
                tracing::error!("Error reading token index: {}", e);
                None
            }
            None => None,
        }
    }

    fn last_sequence(&self) -> Option<u64> {
        match self.events.last() {
            Ok(Some((key, _))) => {
                let bytes: [u8; 8] = key.as_ref().try_into().ok()?;
                Some(u64::from_be_bytes(bytes))
            }
            Ok(None) => None,
            Err(e) => {
                tracing::error!("Error reading last event: {}", e);
                None
            }
        }
    }
}
