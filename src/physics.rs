//! Load and duration to inverter power, stored energy and voltage tier

use tracing::debug;

use crate::models::{PhysicsProfile, SizingRequest, VoltageTier};

/// Inverter headroom over the connected load.
pub const INVERTER_SAFETY_MARGIN: f64 = 1.25;
/// Loads above this always go to 48V.
pub const HIGH_LOAD_WATTS: u32 = 2000;
/// Grid-only banks above this energy go to 48V for faster charging.
pub const GRID_ONLY_FAST_CHARGE_KWH: f64 = 5.0;
/// Margined power below which 12V suffices.
pub const TIER_12V_MAX_W: f64 = 1500.0;
/// Margined power below which 24V suffices.
pub const TIER_24V_MAX_W: f64 = 3500.0;
/// Grid recharge window in hours.
pub const CHARGE_WINDOW_HOURS: f64 = 3.0;
/// Round-trip efficiency penalty applied to grid charging.
pub const CHARGE_EFFICIENCY_PENALTY: f64 = 1.15;
/// AC charge current above which the 48V tier is mandatory.
pub const MAX_CHARGE_AMPS: f64 = 60.0;
/// Inverter class floor once grid charging forces 48V.
pub const FAST_CHARGE_INVERTER_FLOOR_W: f64 = 5000.0;

/// Derive the physical requirements of a request. Pure arithmetic.
pub fn size(request: &SizingRequest) -> PhysicsProfile {
    let watts = f64::from(request.watts());
    let mut raw_required_w = watts * INVERTER_SAFETY_MARGIN;
    let required_energy_kwh = watts * request.hours() / 1000.0;

    let mut system_voltage = if request.watts() > HIGH_LOAD_WATTS
        || (request.no_solar() && required_energy_kwh > GRID_ONLY_FAST_CHARGE_KWH)
    {
        VoltageTier::V48
    } else if raw_required_w < TIER_12V_MAX_W {
        VoltageTier::V12
    } else if raw_required_w < TIER_24V_MAX_W {
        VoltageTier::V24
    } else {
        VoltageTier::V48
    };

    let mut min_charge_amps = 0.0;
    let mut voltage_forced = false;
    if request.no_solar() {
        min_charge_amps = charge_amps(required_energy_kwh, system_voltage);
        // A bank too large to refill at 12V never stays below 48V, otherwise a
        // heavier 24V load could land on a lower tier than a lighter 12V one.
        let exceeds_small_tier = system_voltage != VoltageTier::V48
            && charge_amps(required_energy_kwh, VoltageTier::V12) > MAX_CHARGE_AMPS;
        if min_charge_amps > MAX_CHARGE_AMPS || exceeds_small_tier {
            voltage_forced = system_voltage != VoltageTier::V48;
            system_voltage = VoltageTier::V48;
            raw_required_w = raw_required_w.max(FAST_CHARGE_INVERTER_FLOOR_W);
        }
    }

    debug!(
        raw_required_w,
        required_energy_kwh,
        %system_voltage,
        min_charge_amps,
        voltage_forced,
        "physics sized"
    );

    PhysicsProfile {
        raw_required_w,
        required_energy_kwh,
        system_voltage,
        min_charge_amps,
        voltage_forced,
    }
}

/// Amps needed to refill `energy_kwh` from the grid within the charge window.
fn charge_amps(energy_kwh: f64, tier: VoltageTier) -> f64 {
    energy_kwh * 1000.0 * CHARGE_EFFICIENCY_PENALTY / f64::from(tier.volts()) / CHARGE_WINDOW_HOURS
}
