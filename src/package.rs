//! Bundled market package matching

use tracing::debug;

use crate::catalog::{CatalogError, CatalogGateway};
use crate::config::MatchingConfig;
use crate::models::{CatalogPackage, PhysicsProfile};

/// Find the cheapest bundle covering the profile.
///
/// The battery only needs to reach `package_battery_tolerance` of the
/// required energy. Solar-seeking customers get panel-inclusive bundles,
/// grid-only customers get panel-free ones. `None` means fall through to a
/// custom build.
pub fn match_package(
    gateway: &impl CatalogGateway,
    profile: &PhysicsProfile,
    no_solar: bool,
    matching: &MatchingConfig,
) -> Result<Option<CatalogPackage>, CatalogError> {
    let min_battery_kwh = profile.required_energy_kwh * matching.package_battery_tolerance;
    let package = gateway.find_cheapest_package(
        profile.raw_required_w,
        min_battery_kwh,
        profile.system_voltage,
        !no_solar,
    )?;

    match &package {
        Some(p) => debug!(package = %p.name, price = p.total_price, "package matched"),
        None => debug!(min_battery_kwh, "no package qualifies"),
    }
    Ok(package)
}
