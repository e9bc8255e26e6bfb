//! The sizing engine: physics, both strategies, solar and assembly

use tracing::{debug, info, info_span};

use crate::assembler;
use crate::catalog::CatalogGateway;
use crate::config::EngineConfig;
use crate::error::SizingError;
use crate::models::{SizingRequest, SizingResult};
use crate::package;
use crate::physics;
use crate::snapper;
use crate::solar;

/// Stateless sizing engine over an injected catalog gateway.
///
/// Calls share nothing mutable, so one engine can serve concurrent callers
/// as long as the gateway can.
#[derive(Debug, Clone)]
pub struct SizingEngine<G> {
    gateway: G,
    config: EngineConfig,
}

impl<G: CatalogGateway> SizingEngine<G> {
    pub fn new(gateway: G, config: EngineConfig) -> Self {
        Self { gateway, config }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Size and price a system for `watts` of load over `hours` of backup.
    pub fn size_system(
        &self,
        watts: i64,
        hours: f64,
        no_solar: bool,
    ) -> Result<SizingResult, SizingError> {
        let request = SizingRequest::new(watts, hours, no_solar)?;
        self.size(&request)
    }

    /// Size a validated request.
    pub fn size(&self, request: &SizingRequest) -> Result<SizingResult, SizingError> {
        let _span = info_span!(
            "size_system",
            watts = request.watts(),
            hours = request.hours(),
            no_solar = request.no_solar()
        )
        .entered();

        let profile = physics::size(request);

        // Both strategies gather their data on every call so either is ready.
        let package = package::match_package(
            &self.gateway,
            &profile,
            request.no_solar(),
            &self.config.matching,
        )?;
        let plan = snapper::snap_components(&self.gateway, &profile, &self.config)?;
        let solar = solar::size_array(request, &profile, &self.config.solar, &plan.install)?;

        if package.is_some() {
            debug!("package found, custom build discarded");
        }

        let result = assembler::assemble(
            request,
            &profile,
            package,
            &plan,
            solar.as_ref(),
            &self.config.matching,
        )?;

        info!(
            market_set = result.is_market_set(),
            system_voltage = %result.specs().system_voltage,
            total = result.total_estimated(),
            "system sized"
        );
        Ok(result)
    }
}
