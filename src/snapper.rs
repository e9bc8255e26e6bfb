//! Component-by-component selection against the catalog
//!
//! Each component snaps to the cheapest catalog row that meets the
//! requirement. When nothing qualifies, a synthetic estimate priced from
//! [`FallbackConfig`] stands in, so a custom build can always be priced.

use tracing::{debug, warn};

use crate::catalog::{CatalogError, CatalogGateway};
use crate::config::{EngineConfig, FallbackConfig, MatchingConfig};
use crate::error::SizingError;
use crate::models::{BatteryTech, InstallCostReference, PhysicsProfile, VoltageTier};

/// Guards ceilings against float noise such as 10.240000000000002 / 5.12.
const CEIL_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct InverterChoice {
    pub label: String,
    pub watts: u32,
    pub price: u64,
    /// False for a virtual industrial inverter priced per kW.
    pub from_catalog: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatteryChoice {
    pub label: String,
    pub tech: Option<BatteryTech>,
    pub unit_kwh: f64,
    pub unit_price: u64,
    pub quantity: u32,
    pub from_catalog: bool,
    /// The preferred cell class was missing and a fallback class was used.
    pub relaxed: bool,
}

impl BatteryChoice {
    pub fn total_cost(&self) -> Option<u64> {
        u64::from(self.quantity).checked_mul(self.unit_price)
    }

    /// Nameplate capacity of the bank.
    pub fn total_kwh(&self) -> f64 {
        f64::from(self.quantity) * self.unit_kwh
    }
}

/// Everything a custom build needs, gathered in one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentPlan {
    pub inverter: InverterChoice,
    pub battery: BatteryChoice,
    pub install: InstallCostReference,
    /// False when the tier had no reference row and defaults were used.
    pub install_from_catalog: bool,
    pub cabinet_cost: u64,
}

impl ComponentPlan {
    /// Inverter, battery bank and cabinet, `None` on overflow.
    pub fn equipment_cost(&self) -> Option<u64> {
        self.battery
            .total_cost()?
            .checked_add(self.inverter.price)?
            .checked_add(self.cabinet_cost)
    }
}

/// Snap inverter and battery, and look up installation costs for the tier.
pub fn snap_components(
    gateway: &impl CatalogGateway,
    profile: &PhysicsProfile,
    config: &EngineConfig,
) -> Result<ComponentPlan, SizingError> {
    let inverter = snap_inverter(gateway, profile, &config.fallback)?;
    let battery = snap_battery(gateway, profile, &config.matching, &config.fallback)?;
    let (install, install_from_catalog) =
        install_costs(gateway, profile.system_voltage, &config.fallback)?;

    let cabinet_cost = if needs_cabinet(&battery, &config.matching) {
        install.cabinet_cost
    } else {
        0
    };

    Ok(ComponentPlan {
        inverter,
        battery,
        install,
        install_from_catalog,
        cabinet_cost,
    })
}

/// Cheapest inverter on the tier with enough power and AC-charge current.
pub fn snap_inverter(
    gateway: &impl CatalogGateway,
    profile: &PhysicsProfile,
    fallback: &FallbackConfig,
) -> Result<InverterChoice, SizingError> {
    let found = gateway.find_cheapest_inverter(
        profile.system_voltage,
        profile.raw_required_w,
        profile.min_charge_amps,
    )?;

    if let Some(inverter) = found {
        debug!(label = %inverter.label, watts = inverter.watts, price = inverter.price, "inverter snapped");
        return Ok(InverterChoice {
            label: inverter.label,
            watts: inverter.watts,
            price: inverter.price,
            from_catalog: true,
        });
    }

    // Requests are capped well below u32::MAX watts, margin included.
    let watts = profile.raw_required_w.ceil() as u32;
    let price = price_of(f64::from(watts) / 1000.0 * fallback.inverter_price_per_kw as f64)
        .ok_or_else(|| SizingError::out_of_range("virtual inverter price"))?;
    warn!(watts, price, "no catalog inverter qualifies, estimating industrial unit");
    Ok(InverterChoice {
        label: format!("Industrial inverter {:.1}kW (estimate)", f64::from(watts) / 1000.0),
        watts,
        price,
        from_catalog: false,
    })
}

/// Cheapest battery of the preferred class, as many units as the energy needs.
///
/// 48V banks above `dense_bank_min_kwh` prefer high-density cells; everything
/// else prefers LiFePO4 on the tier. A missing dense class relaxes to LiFePO4,
/// and a missing LiFePO4 class to any cell on the tier, before falling back
/// to a generic bank. Units are counted against usable capacity, so
/// lead-acid cells are derated by their depth of discharge.
pub fn snap_battery(
    gateway: &impl CatalogGateway,
    profile: &PhysicsProfile,
    matching: &MatchingConfig,
    fallback: &FallbackConfig,
) -> Result<BatteryChoice, SizingError> {
    let voltage = profile.system_voltage;
    let required_kwh = profile.required_energy_kwh;

    let prefer_dense = voltage == VoltageTier::V48 && required_kwh > matching.dense_bank_min_kwh;
    let classes = [
        (Some(matching.dense_cell_min_amp_hours), None),
        (None, Some(BatteryTech::LiFePo4)),
        (None, None),
    ];
    let classes = if prefer_dense { &classes[..] } else { &classes[1..] };

    let mut found = None;
    for (step, &(min_amp_hours, tech)) in classes.iter().enumerate() {
        let battery = gateway
            .find_cheapest_battery(voltage, min_amp_hours, tech)?
            .filter(|b| b.energy_kwh > 0.0);
        if let Some(battery) = battery {
            found = Some((battery, step > 0));
            break;
        }
    }

    if let Some((battery, relaxed)) = found {
        let usable_kwh = battery.energy_kwh * matching.depth_of_discharge(battery.tech);
        let quantity = units_needed(required_kwh, usable_kwh)
            .ok_or_else(|| SizingError::out_of_range("battery unit count"))?;
        debug!(
            label = %battery.label,
            quantity,
            usable_kwh,
            unit_price = battery.price,
            prefer_dense,
            relaxed,
            "battery snapped"
        );
        return Ok(BatteryChoice {
            label: battery.label,
            tech: Some(battery.tech),
            unit_kwh: battery.energy_kwh,
            unit_price: battery.price,
            quantity,
            from_catalog: true,
            relaxed,
        });
    }

    let price = price_of(required_kwh * fallback.battery_price_per_kwh as f64)
        .ok_or_else(|| SizingError::out_of_range("generic battery price"))?;
    warn!(required_kwh, price, "no catalog battery qualifies, estimating generic bank");
    Ok(BatteryChoice {
        label: format!("Generic {required_kwh:.2} kWh battery bank (estimate)"),
        tech: None,
        unit_kwh: required_kwh,
        unit_price: price,
        quantity: 1,
        from_catalog: false,
        relaxed: false,
    })
}

/// Installation reference for the tier, or the configured defaults.
pub fn install_costs(
    gateway: &impl CatalogGateway,
    voltage: VoltageTier,
    fallback: &FallbackConfig,
) -> Result<(InstallCostReference, bool), CatalogError> {
    match gateway.get_install_costs(voltage)? {
        Some(costs) => Ok((costs, true)),
        None => {
            warn!(%voltage, "no installation reference, using defaults");
            Ok((fallback.install, false))
        }
    }
}

/// Multi-unit or large banks need a physical enclosure.
pub fn needs_cabinet(battery: &BatteryChoice, matching: &MatchingConfig) -> bool {
    battery.quantity > 1 || battery.total_kwh() > matching.cabinet_threshold_kwh
}

fn units_needed(required_kwh: f64, unit_kwh: f64) -> Option<u32> {
    let units = (required_kwh / unit_kwh - CEIL_EPSILON).ceil().max(1.0);
    (units <= f64::from(u32::MAX)).then_some(units as u32)
}

/// Round a synthetic price, `None` when it does not fit in a `u64`.
fn price_of(amount: f64) -> Option<u64> {
    (amount.is_finite() && amount < u64::MAX as f64).then(|| amount.round() as u64)
}
