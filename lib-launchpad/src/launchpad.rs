//! Launchpad
//!
//! Composition root. Builds every component bottom-up from one validated
//! [`LaunchpadConfig`] and hands each one the shared handles it needs at
//! construction time. Nothing is wired after `new` returns.

use std::sync::Arc;

use crate::config::LaunchpadConfig;
use crate::errors::LaunchpadResult;
use crate::events::{EventIndexer, EventLog, InMemoryEventIndexer};
use crate::fee_vault::FeeVault;
use crate::identity::IdentityResolver;
use crate::market::BondingCurveMarket;
use crate::migration::MigrationEngine;
use crate::pool::LiquidityPoolBackend;
use crate::registry::{NewToken, TokenRecord, TokenRegistry};
use crate::router::CompatibilityRouter;
use crate::service::MigrationService;
use crate::types::Address;

/// One market deployment
pub struct Launchpad {
    config: LaunchpadConfig,
    events: Arc<EventLog>,
    registry: Arc<TokenRegistry>,
    vault: Arc<FeeVault>,
    market: Arc<BondingCurveMarket>,
    migration: Arc<MigrationEngine>,
    router: CompatibilityRouter,
    service: MigrationService,
}

impl Launchpad {
    pub fn new(
        config: LaunchpadConfig,
        backend: Option<Arc<dyn LiquidityPoolBackend>>,
        indexer: Box<dyn EventIndexer>,
        identity: Option<Arc<dyn IdentityResolver>>,
    ) -> LaunchpadResult<Self> {
        config.validate()?;

        let events = Arc::new(EventLog::new(indexer));
        let registry = Arc::new(TokenRegistry::new(
            config.market.migration_reserve_bps,
            config.market.graduation_threshold,
            events.clone(),
        )?);
        let vault = Arc::new(FeeVault::new(config.fees.treasury, events.clone())?);

        let mut market = BondingCurveMarket::new(
            config.market.clone(),
            &config.fees,
            registry.clone(),
            vault.clone(),
            events.clone(),
        )?;
        if let Some(resolver) = identity {
            market = market.with_identity(resolver);
        }
        let market = Arc::new(market);

        let migration = Arc::new(MigrationEngine::new(
            config.migration,
            &config.fees,
            registry.clone(),
            vault.clone(),
            events.clone(),
            backend.clone(),
        ));
        let router =
            CompatibilityRouter::new(registry.clone(), market.clone(), backend, events.clone());
        let service = MigrationService::new(migration.clone(), config.service.clone());

        tracing::info!(
            "Launchpad ready (threshold={}, fee_bps={}, pool backend: {})",
            config.market.graduation_threshold,
            config.fees.fee_bps,
            migration.backend().is_some()
        );

        Ok(Self {
            config,
            events,
            registry,
            vault,
            market,
            migration,
            router,
            service,
        })
    }

    /// In-memory deployment with the given pool backend
    pub fn in_memory(
        config: LaunchpadConfig,
        backend: Option<Arc<dyn LiquidityPoolBackend>>,
    ) -> LaunchpadResult<Self> {
        Self::new(config, backend, Box::new(InMemoryEventIndexer::new()), None)
    }

    /// Launch a token shaped by the configured market defaults
    pub fn launch_token(
        &self,
        creator: Address,
        name: impl Into<String>,
        symbol: impl Into<String>,
        now: u64,
    ) -> LaunchpadResult<TokenRecord> {
        let market = &self.config.market;
        self.registry.create_token(
            NewToken {
                creator,
                name: name.into(),
                symbol: symbol.into(),
                total_supply: market.default_total_supply,
                virtual_native: market.initial_virtual_native,
                virtual_token: market.initial_virtual_token,
                launch_delay: market.launch_delay_seconds,
            },
            now,
        )
    }

    pub fn config(&self) -> &LaunchpadConfig {
        &self.config
    }

    pub fn events(&self) -> &Arc<EventLog> {
        &self.events
    }

    pub fn registry(&self) -> &Arc<TokenRegistry> {
        &self.registry
    }

    pub fn vault(&self) -> &Arc<FeeVault> {
        &self.vault
    }

    pub fn market(&self) -> &Arc<BondingCurveMarket> {
        &self.market
    }

    pub fn migration(&self) -> &Arc<MigrationEngine> {
        &self.migration
    }

    pub fn router(&self) -> &CompatibilityRouter {
        &self.router
    }

    pub fn service(&self) -> &MigrationService {
        &self.service
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LaunchpadError;
    use crate::pool::ConstantProductPools;

    fn treasury() -> Address {
        Address::new([7u8; 32])
    }

    #[test]
    fn test_invalid_config_rejected_before_construction() {
        let result = Launchpad::in_memory(LaunchpadConfig::default(), None);
        assert!(matches!(result, Err(LaunchpadError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_launch_uses_market_defaults() {
        let mut config = LaunchpadConfig::with_treasury(treasury());
        config.market.launch_delay_seconds = 60;
        let launchpad = Launchpad::in_memory(config.clone(), None).unwrap();

        let record = launchpad
            .launch_token(Address::new([1u8; 32]), "Sovereign Cat", "SCAT", 1_000)
            .unwrap();
        assert_eq!(record.total_supply, config.market.default_total_supply);
        assert_eq!(record.launch_timestamp, 1_060);
        assert_eq!(record.curve.virtual_native, config.market.initial_virtual_native);
        assert!(record.status.is_trading());
        assert_eq!(launchpad.events().events_by_type("token_created").len(), 1);
    }

    #[test]
    fn test_components_share_one_backend() {
        let pools: Arc<dyn LiquidityPoolBackend> = Arc::new(ConstantProductPools::new());
        let launchpad =
            Launchpad::in_memory(LaunchpadConfig::with_treasury(treasury()), Some(pools)).unwrap();
        assert!(launchpad.migration().backend().is_some());
        assert_eq!(launchpad.vault().treasury(), treasury());
        assert_eq!(launchpad.market().fee_bps(), 100);
    }
}
