//! Solar array sizing for an unreliable grid
//!
//! The array must refill the bank and carry four more hours of live load
//! from a four-hour sun window, with a derate for heat and soiling.

use tracing::debug;

use crate::config::SolarConfig;
use crate::error::SizingError;
use crate::models::{InstallCostReference, PhysicsProfile, SizingRequest, SolarPlan};

/// Peak sun hours available to recharge.
pub const SUN_WINDOW_HOURS: f64 = 4.0;
/// Hours of live load the array also carries.
pub const EXTRA_LOAD_HOURS: f64 = 4.0;
/// Oversize factor for heat and soiling losses.
pub const ARRAY_DERATE: f64 = 1.3;

const CEIL_EPSILON: f64 = 1e-9;

/// Size the array, or `None` when panels cannot be installed.
pub fn size_array(
    request: &SizingRequest,
    profile: &PhysicsProfile,
    panel: &SolarConfig,
    install: &InstallCostReference,
) -> Result<Option<SolarPlan>, SizingError> {
    if request.no_solar() {
        return Ok(None);
    }

    let total_daily_need_kwh =
        profile.required_energy_kwh + f64::from(request.watts()) * EXTRA_LOAD_HOURS / 1000.0;
    let required_solar_kw = total_daily_need_kwh / SUN_WINDOW_HOURS * ARRAY_DERATE;
    let panel_count = (required_solar_kw * 1000.0 / f64::from(panel.panel_watts) - CEIL_EPSILON)
        .ceil()
        .max(0.0) as u32;

    let mounting_cost = u64::from(panel_count)
        .checked_mul(install.mounting_cost_per_panel)
        .ok_or_else(|| SizingError::out_of_range("panel mounting cost"))?;

    debug!(total_daily_need_kwh, required_solar_kw, panel_count, "solar array sized");

    Ok(Some(SolarPlan {
        panel_count,
        panel_unit_watts: panel.panel_watts,
        panel_unit_price: panel.panel_price,
        mounting_cost,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics;

    fn install() -> InstallCostReference {
        InstallCostReference {
            base_labor: 300_000,
            accessory_kit_cost: 250_000,
            mounting_cost_per_panel: 40_000,
            cabinet_cost: 350_000,
        }
    }

    fn plan(watts: i64, hours: f64, no_solar: bool) -> Option<SolarPlan> {
        let request = SizingRequest::new(watts, hours, no_solar).unwrap();
        let profile = physics::size(&request);
        size_array(&request, &profile, &SolarConfig::default(), &install()).unwrap()
    }

    #[test]
    fn small_home_needs_three_panels() {
        // (2.0 + 2.0) / 4 * 1.3 = 1.3 kW -> 1300 / 620 = 2.1
        let plan = plan(500, 4.0, false).unwrap();
        assert_eq!(plan.panel_count, 3);
        assert_eq!(plan.panel_cost(), Some(930_000));
        assert_eq!(plan.mounting_cost, 120_000);
    }

    #[test]
    fn large_load_scales_array() {
        // (15 + 10) / 4 * 1.3 = 8.125 kW -> 13.1
        let plan = plan(2500, 6.0, false).unwrap();
        assert_eq!(plan.panel_count, 14);
    }

    #[test]
    fn largest_request_keeps_panel_count_exact() {
        // 1 MW x 1000 h is exactly the 1 GWh ceiling
        let plan = plan(1_000_000, 1000.0, false).unwrap();
        // (1_000_000 + 4_000) / 4 * 1.3 = 326_300 kW -> 526_290.3 panels
        assert_eq!(plan.panel_count, 526_291);
        assert_eq!(plan.mounting_cost, 526_291 * 40_000);
    }

    #[test]
    fn no_solar_skips_array() {
        assert!(plan(500, 4.0, true).is_none());
    }
}
