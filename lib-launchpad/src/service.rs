//! Migration Service
//!
//! Background task that periodically retries migration for every graduated
//! token. Graduation itself happens inside the crossing buy; this service only
//! covers the hand-off to the pool backend, which may be unavailable when the
//! token graduates.
//!
//! ## Operation
//! - Runs every `check_interval_seconds` (default: 30)
//! - Calls `migrate` on each `Graduated` token
//! - Failures are logged and retried on the next tick
//!
//! ## Configuration
//! - `enabled`: Whether the service runs (default: true)
//! - `check_interval_seconds`: How often to check (default: 30)

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info, warn};

use crate::config::MigrationServiceConfig;
use crate::errors::LaunchpadError;
use crate::migration::{MigrationEngine, MigrationReceipt};
use crate::types::TokenId;

/// Source of the current unix time in seconds
pub type Clock = Arc<dyn Fn() -> u64 + Send + Sync>;

/// System wall clock
pub fn system_clock() -> Clock {
    Arc::new(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    })
}

/// Outcome of one pass over graduated tokens
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationSweep {
    pub migrated: Vec<MigrationReceipt>,
    pub failed: Vec<(TokenId, LaunchpadError)>,
}

/// Background migration retry service
pub struct MigrationService {
    engine: Arc<MigrationEngine>,
    config: MigrationServiceConfig,
    clock: Clock,
    service_handle: Arc<RwLock<Option<tokio::task::JoinHandle<()>>>>,
}

impl MigrationService {
    /// Create a new migration service
    pub fn new(engine: Arc<MigrationEngine>, config: MigrationServiceConfig) -> Self {
        Self::with_clock(engine, config, system_clock())
    }

    pub fn with_clock(
        engine: Arc<MigrationEngine>,
        config: MigrationServiceConfig,
        clock: Clock,
    ) -> Self {
        Self {
            engine,
            config,
            clock,
            service_handle: Arc::new(RwLock::new(None)),
        }
    }

    /// Start the migration service
    pub async fn start(&self) -> Result<()> {
        if !self.config.enabled {
            info!("Migration service disabled");
            return Ok(());
        }
        if self.config.check_interval_seconds == 0 {
            return Err(anyhow::anyhow!("check interval must be non-zero"));
        }

        let mut handle = self.service_handle.write().await;
        if handle.is_some() {
            warn!("Migration service already running");
            return Ok(());
        }

        let engine = self.engine.clone();
        let clock = self.clock.clone();
        let period = Duration::from_secs(self.config.check_interval_seconds);

        *handle = Some(tokio::spawn(async move {
            Self::migration_loop(engine, clock, period).await;
        }));
        info!(
            "Migration service started (check interval: {}s)",
            self.config.check_interval_seconds
        );
        Ok(())
    }

    /// Stop the migration service
    pub async fn stop(&self) -> Result<()> {
        if let Some(handle) = self.service_handle.write().await.take() {
            handle.abort();
            info!("Migration service stopped");
        }
        Ok(())
    }

    /// Check if service is running
    pub async fn is_running(&self) -> bool {
        self.service_handle.read().await.is_some()
    }

    /// Run a single pass immediately
    pub async fn run_once(&self) -> MigrationSweep {
        Self::sweep(&self.engine, (self.clock)())
    }

    async fn migration_loop(engine: Arc<MigrationEngine>, clock: Clock, period: Duration) {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        info!("Migration loop started");

        loop {
            ticker.tick().await;
            let sweep = Self::sweep(&engine, clock());
            if !sweep.failed.is_empty() {
                error!(
                    "{} migration(s) failed this tick; retrying in {}s",
                    sweep.failed.len(),
                    period.as_secs()
                );
            }
        }
    }

    fn sweep(engine: &MigrationEngine, now: u64) -> MigrationSweep {
        let mut sweep = MigrationSweep::default();
        let results = engine.migrate_ready(now);
        if results.is_empty() {
            debug!("No graduated tokens awaiting migration");
            return sweep;
        }

        for (token, result) in results {
            match result {
                Ok(receipt) => {
                    info!("Migrated token {} to pool {}", token, receipt.pool);
                    sweep.migrated.push(receipt);
                }
                // Lost a race with a direct migrate call
                Err(LaunchpadError::AlreadyMigrated) => {}
                Err(e) => {
                    warn!("Migration of {} failed, will retry: {}", token, e);
                    sweep.failed.push((token, e));
                }
            }
        }
        sweep
    }
}

impl std::fmt::Debug for MigrationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationService")
            .field("config", &self.config)
            .finish()
    }
}
