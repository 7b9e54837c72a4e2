//! Launchpad Primitive Types
//!
//! Fixed-size identifiers and the token lifecycle state machine.
//!
//! # State Machine
//! ```text
//!   ┌─────────┐   Threshold Crossed   ┌───────────┐   Pool Seeded + Locked   ┌──────────┐
//!   │ Trading │ ────────────────────▶ │ Graduated │ ───────────────────────▶ │ Migrated │
//!   └─────────┘    (irreversible)     └───────────┘      (irreversible)      └──────────┘
//! ```
//!
//! Transitions are only reachable through [`TokenStatus::graduate`] and
//! [`TokenStatus::migrate`], which consume the current state.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::LaunchpadError;

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// 32-byte principal address (wallets, creators, treasury)
#[derive(Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, Default, PartialOrd, Ord)]
pub struct Address(pub [u8; 32]);

impl Address {
    /// Create a new Address from raw bytes
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create a zeroed Address
    pub const fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Get the underlying bytes
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check if this is the zero address
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Parse a 64-character hex string
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s.trim_start_matches("0x"), &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl From<[u8; 32]> for Address {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// ============================================================================
// TOKEN TYPES
// ============================================================================

/// Domain separator for token id derivation
pub const TOKEN_ID_DOMAIN: &[u8] = b"LAUNCHPAD_TOKEN_V1";

/// 32-byte token address
#[derive(Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, Default, PartialOrd, Ord)]
pub struct TokenId(pub [u8; 32]);

impl TokenId {
    /// Native currency (all zeros), used as the "A" side of migrated pools
    pub const NATIVE: Self = Self([0u8; 32]);

    /// Create a new TokenId from raw bytes
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the underlying bytes
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check if this is the native currency
    pub fn is_native(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Derive a launch token address
    ///
    /// TokenId = Blake3(TOKEN_ID_DOMAIN || creator || nonce_le)
    pub fn derive(creator: &Address, nonce: u64) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(TOKEN_ID_DOMAIN);
        hasher.update(creator.as_bytes());
        hasher.update(&nonce.to_le_bytes());
        Self(*hasher.finalize().as_bytes())
    }
}

impl fmt::Debug for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_native() {
            write!(f, "TokenId(NATIVE)")
        } else {
            write!(f, "TokenId({})", hex::encode(&self.0[..8]))
        }
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_native() {
            write!(f, "NATIVE")
        } else {
            write!(f, "{}", hex::encode(self.0))
        }
    }
}

impl From<[u8; 32]> for TokenId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for TokenId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Handle to a pool created by the external liquidity backend
#[derive(Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, Default)]
pub struct PoolHandle(pub [u8; 32]);

impl PoolHandle {
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for PoolHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PoolHandle({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for PoolHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

// ============================================================================
// TRADING TYPES
// ============================================================================

/// Trade direction, from the caller's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeDirection {
    /// Native currency in, tokens out
    Buy,
    /// Tokens in, native currency out
    Sell,
}

impl fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeDirection::Buy => write!(f, "buy"),
            TradeDirection::Sell => write!(f, "sell"),
        }
    }
}

// ============================================================================
// LIFECYCLE
// ============================================================================

/// Liquidity moved from the curve into the external pool at migration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSeed {
    /// Native seeded after the migration fee
    pub native: u64,
    pub tokens: u64,
}

/// Token lifecycle status
///
/// Forward-only: `Trading → Graduated → Migrated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
    /// Bonding curve is the sole venue
    Trading,
    /// Threshold crossed, curve frozen, awaiting pool seeding
    Graduated {
        /// Timestamp of the crossing trade
        graduated_at: u64,
        /// Real native reserve right after the crossing trade
        reserve_at_graduation: u64,
    },
    /// Pool seeded and share locked; only the external pool trades
    Migrated {
        /// External pool holding the liquidity
        pool: PoolHandle,
        /// What the pool received; the curve figures on the record are frozen history
        seed: PoolSeed,
        /// Migration timestamp
        migrated_at: u64,
    },
}

impl TokenStatus {
    /// `Trading → Graduated`, rejecting any other source state
    pub fn graduate(self, reserve: u64, now: u64) -> Result<TokenStatus, LaunchpadError> {
        match self {
            TokenStatus::Trading => Ok(TokenStatus::Graduated {
                graduated_at: now,
                reserve_at_graduation: reserve,
            }),
            _ => Err(LaunchpadError::TradingNotOpen {
                reason: format!("cannot graduate from {}", self),
            }),
        }
    }

    /// `Graduated → Migrated`, rejecting any other source state
    pub fn migrate(
        self,
        pool: PoolHandle,
        seed: PoolSeed,
        now: u64,
    ) -> Result<TokenStatus, LaunchpadError> {
        match self {
            TokenStatus::Graduated { .. } => Ok(TokenStatus::Migrated {
                pool,
                seed,
                migrated_at: now,
            }),
            TokenStatus::Migrated { .. } => Err(LaunchpadError::AlreadyMigrated),
            TokenStatus::Trading => Err(LaunchpadError::NotGraduated),
        }
    }

    /// Check if the bonding curve accepts trades
    pub fn is_trading(&self) -> bool {
        matches!(self, TokenStatus::Trading)
    }

    /// Check if the token has graduated (including migrated)
    pub fn is_graduated(&self) -> bool {
        matches!(self, TokenStatus::Graduated { .. } | TokenStatus::Migrated { .. })
    }

    /// Check if the token trades on the external pool
    pub fn is_migrated(&self) -> bool {
        matches!(self, TokenStatus::Migrated { .. })
    }

    /// Pool handle once migrated
    pub fn pool(&self) -> Option<PoolHandle> {
        match self {
            TokenStatus::Migrated { pool, .. } => Some(*pool),
            _ => None,
        }
    }

    /// Liquidity seeded into the pool once migrated
    pub fn pool_seed(&self) -> Option<PoolSeed> {
        match self {
            TokenStatus::Migrated { seed, .. } => Some(*seed),
            _ => None,
        }
    }

    /// Status without payload
    pub fn kind(&self) -> StatusKind {
        match self {
            TokenStatus::Trading => StatusKind::Trading,
            TokenStatus::Graduated { .. } => StatusKind::Graduated,
            TokenStatus::Migrated { .. } => StatusKind::Migrated,
        }
    }

    /// Status name without payload
    pub fn name(&self) -> &'static str {
        match self.kind() {
            StatusKind::Trading => "trading",
            StatusKind::Graduated => "graduated",
            StatusKind::Migrated => "migrated",
        }
    }
}

/// Payload-free status, used for registry queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusKind {
    Trading,
    Graduated,
    Migrated,
}

impl fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_basics() {
        let addr = Address::new([7u8; 32]);
        assert!(!addr.is_zero());
        assert!(Address::zero().is_zero());
        assert_eq!(addr.to_string().len(), 64);
        assert_eq!(Address::from_hex(&addr.to_string()).unwrap(), addr);
    }

    #[test]
    fn test_token_id_derivation_is_deterministic() {
        let creator = Address::new([1u8; 32]);
        assert_eq!(TokenId::derive(&creator, 0), TokenId::derive(&creator, 0));
        assert_ne!(TokenId::derive(&creator, 0), TokenId::derive(&creator, 1));
        assert!(!TokenId::derive(&creator, 0).is_native());
        assert_eq!(format!("{}", TokenId::NATIVE), "NATIVE");
    }

    #[test]
    fn test_status_forward_transitions() {
        let status = TokenStatus::Trading;
        assert!(status.is_trading());

        let graduated = status.graduate(100, 10).unwrap();
        assert!(graduated.is_graduated());
        assert!(!graduated.is_trading());
        assert_eq!(graduated.kind(), StatusKind::Graduated);

        let pool = PoolHandle([9u8; 32]);
        let seed = PoolSeed { native: 99, tokens: 500 };
        let migrated = graduated.migrate(pool, seed, 11).unwrap();
        assert!(migrated.is_migrated());
        assert_eq!(migrated.pool(), Some(pool));
        assert_eq!(migrated.pool_seed(), Some(seed));
        assert_eq!(graduated.pool_seed(), None);
    }

    #[test]
    fn test_status_rejects_skips_and_reversals() {
        let pool = PoolHandle([9u8; 32]);
        let seed = PoolSeed { native: 1, tokens: 1 };

        assert_eq!(
            TokenStatus::Trading.migrate(pool, seed, 1).unwrap_err(),
            LaunchpadError::NotGraduated
        );

        let migrated = TokenStatus::Trading
            .graduate(1, 1)
            .and_then(|s| s.migrate(pool, seed, 2))
            .unwrap();
        assert_eq!(migrated.migrate(pool, seed, 3).unwrap_err(), LaunchpadError::AlreadyMigrated);
        assert!(migrated.graduate(1, 3).is_err());
    }
}
