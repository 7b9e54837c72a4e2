//! Identity Registry Collaborator
//!
//! Creator attribution is resolved against an external identity registry.
//! Lookups are read-only and never sit on a trade path.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::Address;

/// Platform profile attached to a wallet identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityProfile {
    pub address: Address,
    pub display_name: String,
    /// Whether the registry has verified this identity
    pub verified: bool,
}

/// Read-only lookup into an identity registry
pub trait IdentityResolver: Send + Sync {
    fn resolve_identity(&self, address: &Address) -> Option<IdentityProfile>;
}

/// In-memory identity directory
#[derive(Debug, Default)]
pub struct StaticIdentityDirectory {
    profiles: RwLock<HashMap<Address, IdentityProfile>>,
}

impl StaticIdentityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a profile
    pub fn add_identity(&self, profile: IdentityProfile) {
        self.profiles.write().insert(profile.address, profile);
    }

    pub fn remove_identity(&self, address: &Address) -> Option<IdentityProfile> {
        self.profiles.write().remove(address)
    }

    pub fn len(&self) -> usize {
        self.profiles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.read().is_empty()
    }
}

impl IdentityResolver for StaticIdentityDirectory {
    fn resolve_identity(&self, address: &Address) -> Option<IdentityProfile> {
        self.profiles.read().get(address).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_and_unknown() {
        let directory = StaticIdentityDirectory::new();
        let alice = Address::new([1u8; 32]);
        directory.add_identity(IdentityProfile {
            address: alice,
            display_name: "alice".to_string(),
            verified: true,
        });

        let profile = directory.resolve_identity(&alice).unwrap();
        assert_eq!(profile.display_name, "alice");
        assert!(directory.resolve_identity(&Address::new([2u8; 32])).is_none());

        directory.remove_identity(&alice);
        assert!(directory.is_empty());
    }
}
