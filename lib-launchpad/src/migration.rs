//! Migration Engine
//!
//! Moves a graduated token's real reserve and remaining supply into an
//! external constant product pool and locks the resulting pool share.
//!
//! # Invariants
//!
//! ## M1: Exactly once
//! `migrate` only accepts `Graduated`. A second call sees `Migrated` and
//! returns `AlreadyMigrated` without touching the backend.
//!
//! ## M2: All or nothing
//! The status flips to `Migrated` only after both `create_pool` and
//! `lock_share` succeed. If locking fails the new pool is aborted, so a
//! failed call leaves the token `Graduated` with no pool behind it and the
//! caller may simply retry.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{FeeConfig, MigrationConfig, TokenAllocation};
use crate::curve::fee_for;
use crate::errors::{LaunchpadError, LaunchpadResult};
use crate::events::{EventLog, LaunchpadEvent};
use crate::fee_vault::FeeVault;
use crate::pool::{LiquidityPoolBackend, PoolError, ShareLock};
use crate::registry::{TokenEntry, TokenRegistry};
use crate::types::{PoolHandle, PoolSeed, TokenId, TokenStatus};

/// Result of a successful migration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReceipt {
    pub token: TokenId,
    pub pool: PoolHandle,
    /// Native paired into the pool (reserve minus migration fee)
    pub native_seeded: u64,
    pub tokens_seeded: u64,
    /// Unsold supply left out of the pool under `ReservedOnly`
    pub tokens_burned: u64,
    pub migration_fee: u64,
    pub lock: ShareLock,
}

/// Amounts computed before any external call
struct MigrationPlan {
    native_seeded: u64,
    tokens_seeded: u64,
    tokens_burned: u64,
    migration_fee: u64,
}

/// Migration Engine
pub struct MigrationEngine {
    config: MigrationConfig,
    migration_fee_bps: u16,
    registry: Arc<TokenRegistry>,
    vault: Arc<FeeVault>,
    events: Arc<EventLog>,
    backend: Option<Arc<dyn LiquidityPoolBackend>>,
}

impl MigrationEngine {
    /// `backend` is `None` on deployments without a liquidity pool backend;
    /// every migration then fails with `MigrationUnavailable`.
    pub fn new(
        config: MigrationConfig,
        fees: &FeeConfig,
        registry: Arc<TokenRegistry>,
        vault: Arc<FeeVault>,
        events: Arc<EventLog>,
        backend: Option<Arc<dyn LiquidityPoolBackend>>,
    ) -> Self {
        Self {
            config,
            migration_fee_bps: fees.migration_fee_bps,
            registry,
            vault,
            events,
            backend,
        }
    }

    pub fn backend(&self) -> Option<&Arc<dyn LiquidityPoolBackend>> {
        self.backend.as_ref()
    }

    /// Migrate a graduated token into an external pool
    pub fn migrate(&self, token: &TokenId, now: u64) -> LaunchpadResult<MigrationReceipt> {
        let handle = self.registry.entry(token)?;
        let mut entry = handle.lock();

        let result = self.migrate_locked(&mut entry, now);
        if let Err(e) = &result {
            tracing::warn!("Migration of {} rejected: {}", token, e);
        }
        result
    }

    /// Attempt every token currently awaiting migration
    pub fn migrate_ready(&self, now: u64) -> Vec<(TokenId, LaunchpadResult<MigrationReceipt>)> {
        self.registry
            .ready_to_migrate()
            .into_iter()
            .map(|token| {
                let result = self.migrate(&token, now);
                (token, result)
            })
            .collect()
    }

    fn migrate_locked(&self, entry: &mut TokenEntry, now: u64) -> LaunchpadResult<MigrationReceipt> {
        let token = entry.record.address;
        match entry.record.status {
            TokenStatus::Trading => return Err(LaunchpadError::NotGraduated),
            TokenStatus::Migrated { .. } => return Err(LaunchpadError::AlreadyMigrated),
            TokenStatus::Graduated { .. } => {}
        }

        let backend = match &self.backend {
            None => {
                return Err(LaunchpadError::MigrationUnavailable(
                    "no liquidity pool backend configured".to_string(),
                ))
            }
            Some(backend) if !backend.is_available() => {
                return Err(LaunchpadError::MigrationUnavailable(
                    PoolError::BackendUnavailable.to_string(),
                ))
            }
            Some(backend) => backend,
        };

        let plan = self.plan(entry)?;
        self.vault.check_credit(&token, plan.migration_fee)?;

        let pool = backend
            .create_pool(TokenId::NATIVE, token, plan.native_seeded, plan.tokens_seeded)
            .map_err(unavailable)?;

        let lock = match backend.lock_share(&pool, self.config.lock_policy, now) {
            Ok(lock) => lock,
            Err(e) => {
                if let Err(abort_err) = backend.abort_pool(&pool) {
                    tracing::error!(
                        "Failed to abort pool {} after lock failure on {}: {}",
                        pool,
                        token,
                        abort_err
                    );
                }
                return Err(unavailable(e));
            }
        };

        // Commit
        let seed = PoolSeed {
            native: plan.native_seeded,
            tokens: plan.tokens_seeded,
        };
        entry.record.status = entry.record.status.migrate(pool, seed, now)?;
        self.vault.credit(&token, plan.migration_fee)?;

        self.events.emit(LaunchpadEvent::Migrated {
            token,
            pool,
            native_seeded: plan.native_seeded,
            tokens_seeded: plan.tokens_seeded,
            timestamp: now,
        });
        tracing::info!(
            "Token {} migrated to pool {}: {} native + {} tokens seeded, {} burned, fee {}",
            token,
            pool,
            plan.native_seeded,
            plan.tokens_seeded,
            plan.tokens_burned,
            plan.migration_fee
        );

        Ok(MigrationReceipt {
            token,
            pool,
            native_seeded: plan.native_seeded,
            tokens_seeded: plan.tokens_seeded,
            tokens_burned: plan.tokens_burned,
            migration_fee: plan.migration_fee,
            lock,
        })
    }

    fn plan(&self, entry: &TokenEntry) -> LaunchpadResult<MigrationPlan> {
        let record = &entry.record;
        let reserve = record.real_native_reserve();
        let migration_fee = fee_for(reserve, self.migration_fee_bps)?;
        let native_seeded = reserve - migration_fee;

        let unsold = record.unsold_supply();
        let tokens_seeded = match self.config.token_allocation {
            TokenAllocation::AllUnsold => unsold,
            TokenAllocation::ReservedOnly => record.migration_reserve.min(unsold),
        };

        Ok(MigrationPlan {
            native_seeded,
            tokens_seeded,
            tokens_burned: unsold - tokens_seeded,
            migration_fee,
        })
    }
}

impl std::fmt::Debug for MigrationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationEngine")
            .field("config", &self.config)
            .field("migration_fee_bps", &self.migration_fee_bps)
            .field("backend", &self.backend.is_some())
            .finish()
    }
}

fn unavailable(e: PoolError) -> LaunchpadError {
    LaunchpadError::MigrationUnavailable(e.to_string())
}
