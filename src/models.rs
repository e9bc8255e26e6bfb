//! Data models for sizing requests, catalog rows and quotes

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::SizingError;

/// DC architecture of the battery bank and inverter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VoltageTier {
    V12,
    V24,
    V48,
}

impl VoltageTier {
    pub const ALL: [VoltageTier; 3] = [VoltageTier::V12, VoltageTier::V24, VoltageTier::V48];

    pub fn volts(self) -> u32 {
        match self {
            VoltageTier::V12 => 12,
            VoltageTier::V24 => 24,
            VoltageTier::V48 => 48,
        }
    }

    pub fn from_volts(volts: u32) -> Option<Self> {
        match volts {
            12 => Some(VoltageTier::V12),
            24 => Some(VoltageTier::V24),
            48 => Some(VoltageTier::V48),
            _ => None,
        }
    }
}

impl fmt::Display for VoltageTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&format!("{}V", self.volts()))
    }
}

// Serialized as the bare number so downstream consumers see `"system_voltage": 48`.
impl Serialize for VoltageTier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.volts())
    }
}

/// Validated sizing input: connected load and backup duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingRequest {
    watts: u32,
    hours: f64,
    no_solar: bool,
}

/// Largest connected load accepted, in watts.
pub const MAX_WATTS: u32 = 1_000_000;
/// Largest backup energy accepted, in kWh.
pub const MAX_ENERGY_KWH: f64 = 1_000_000.0;

impl SizingRequest {
    /// Build a request, rejecting non-positive or non-finite figures and loads
    /// too large to quote.
    pub fn new(watts: i64, hours: f64, no_solar: bool) -> Result<Self, SizingError> {
        if watts <= 0 {
            return Err(SizingError::InvalidRequest {
                reason: format!("watts must be positive, got {watts}"),
            });
        }
        let watts = u32::try_from(watts).map_err(|_| SizingError::InvalidRequest {
            reason: format!("watts {watts} exceeds the supported range"),
        })?;
        if watts > MAX_WATTS {
            return Err(SizingError::InvalidRequest {
                reason: format!("watts {watts} exceeds the supported maximum of {MAX_WATTS}"),
            });
        }
        if !hours.is_finite() || hours <= 0.0 {
            return Err(SizingError::InvalidRequest {
                reason: format!("hours must be a positive number, got {hours}"),
            });
        }
        let energy_kwh = f64::from(watts) * hours / 1000.0;
        if energy_kwh > MAX_ENERGY_KWH {
            return Err(SizingError::InvalidRequest {
                reason: format!(
                    "{energy_kwh:.0} kWh of backup exceeds the supported maximum of {MAX_ENERGY_KWH} kWh"
                ),
            });
        }
        Ok(Self {
            watts,
            hours,
            no_solar,
        })
    }

    pub fn watts(&self) -> u32 {
        self.watts
    }

    pub fn hours(&self) -> f64 {
        self.hours
    }

    /// True when panels cannot be installed (e.g. apartments) and the bank
    /// must be recharged from the grid.
    pub fn no_solar(&self) -> bool {
        self.no_solar
    }
}

/// Physics-derived requirements for a request
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhysicsProfile {
    /// Load with the inverter safety margin applied, or the fast-charge floor.
    pub raw_required_w: f64,
    pub required_energy_kwh: f64,
    pub system_voltage: VoltageTier,
    /// AC charge current needed to refill the bank from the grid; 0 with solar.
    pub min_charge_amps: f64,
    /// Set when the grid-charging current forced the 48V tier.
    pub voltage_forced: bool,
}

/// Battery cell chemistry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BatteryTech {
    #[serde(rename = "LiFePO4")]
    LiFePo4,
    Tubular,
    LeadAcid,
}

impl BatteryTech {
    pub fn as_str(self) -> &'static str {
        match self {
            BatteryTech::LiFePo4 => "LiFePO4",
            BatteryTech::Tubular => "Tubular",
            BatteryTech::LeadAcid => "LeadAcid",
        }
    }

    /// Typical service life quoted to customers
    pub fn lifespan(self) -> &'static str {
        match self {
            BatteryTech::LiFePo4 => "8-10 years",
            BatteryTech::Tubular | BatteryTech::LeadAcid => "2-3 years",
        }
    }
}

impl FromStr for BatteryTech {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LiFePO4" => Ok(BatteryTech::LiFePo4),
            "Tubular" => Ok(BatteryTech::Tubular),
            "LeadAcid" => Ok(BatteryTech::LeadAcid),
            other => Err(format!("unknown battery technology: {other}")),
        }
    }
}

impl fmt::Display for BatteryTech {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Vendor-priced bundle sold as one SKU
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogPackage {
    pub name: String,
    pub total_price: u64,
    pub inverter_watts: u32,
    pub battery_kwh: f64,
    pub system_voltage: VoltageTier,
    pub includes_panels: bool,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogInverter {
    /// Brand and model
    pub label: String,
    pub watts: u32,
    pub price: u64,
    pub system_voltage: VoltageTier,
    pub max_ac_charge_amps: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogBattery {
    /// Brand and model
    pub label: String,
    pub price: u64,
    pub energy_kwh: f64,
    /// Nominal pack voltage, e.g. 51.2 for a 48V-tier LiFePO4 pack.
    pub voltage: f64,
    pub system_voltage: VoltageTier,
    pub amp_hours: u32,
    pub tech: BatteryTech,
}

/// Installation cost reference for one voltage tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstallCostReference {
    pub base_labor: u64,
    pub accessory_kit_cost: u64,
    pub mounting_cost_per_panel: u64,
    pub cabinet_cost: u64,
}

/// Solar array sized for an unreliable grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SolarPlan {
    pub panel_count: u32,
    pub panel_unit_watts: u32,
    pub panel_unit_price: u64,
    pub mounting_cost: u64,
}

impl SolarPlan {
    /// Panel hardware cost, `None` if it does not fit in a `u64`.
    pub fn panel_cost(&self) -> Option<u64> {
        u64::from(self.panel_count).checked_mul(self.panel_unit_price)
    }
}

/// Specs block shared by both result shapes
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SystemSpecs {
    pub inverter_size_kw: f64,
    pub system_voltage: VoltageTier,
    pub battery_storage_kwh: f64,
    pub recommended_solar_panels: u32,
}

/// One priced line of a custom build
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItem {
    pub label: String,
    pub quantity: u32,
    pub unit_price: u64,
    pub total: u64,
}

impl LineItem {
    pub fn new(label: impl Into<String>, quantity: u32, unit_price: u64) -> Self {
        Self {
            label: label.into(),
            quantity,
            unit_price,
            total: u64::from(quantity) * unit_price,
        }
    }
}

/// Advisory remarks attached to a custom build
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdvisoryNote {
    /// Selected inverter is materially larger than the load requires.
    Upsized { required_w: u32, selected_w: u32 },
    /// Inverter chosen to recharge the bank from the grid.
    FastCharge { min_charge_amps: f64 },
    /// Grid-charging current forced the 48V architecture.
    VoltageForced,
    /// No catalog inverter was large enough; priced per kW.
    VirtualInverter { watts: u32 },
    /// No catalog battery matched; priced per kWh.
    GenericBattery { energy_kwh: f64 },
    /// Preferred battery class was unavailable; a less preferred class was used.
    RelaxedBattery { label: String },
    /// No installation reference row for the tier.
    DefaultInstallCosts { system_voltage: VoltageTier },
}

impl fmt::Display for AdvisoryNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdvisoryNote::Upsized {
                required_w,
                selected_w,
            } => write!(
                f,
                "Inverter upsized to {selected_w}W (load needs {required_w}W) to match a stocked model"
            ),
            AdvisoryNote::FastCharge { min_charge_amps } => write!(
                f,
                "Optimized for grid charging: inverter supports at least {min_charge_amps:.0}A AC charge for a 3-hour refill"
            ),
            AdvisoryNote::VoltageForced => {
                write!(f, "48V architecture required by the grid-charging current")
            }
            AdvisoryNote::VirtualInverter { watts } => write!(
                f,
                "No stocked inverter fits; {watts}W industrial inverter estimated (not a catalog item)"
            ),
            AdvisoryNote::GenericBattery { energy_kwh } => write!(
                f,
                "No stocked battery fits; generic {energy_kwh:.2} kWh bank estimated (not a catalog item)"
            ),
            AdvisoryNote::RelaxedBattery { label } => {
                write!(f, "Preferred battery class unavailable; using {label}")
            }
            AdvisoryNote::DefaultInstallCosts { system_voltage } => write!(
                f,
                "No installation reference for {system_voltage}; conservative defaults applied"
            ),
        }
    }
}

/// Outcome of one sizing call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result_type", rename_all = "snake_case")]
pub enum SizingResult {
    /// A pre-bundled package satisfies the requirement.
    MarketSet {
        package_name: String,
        package_price: u64,
        solar_addon_cost: u64,
        total_estimated: u64,
        specs: SystemSpecs,
    },
    /// Components snapped individually from the catalog.
    CustomBuild {
        equipment_cost: u64,
        solar_panels_cost: u64,
        installation_and_accessories_cost: u64,
        total_estimated: u64,
        specs: SystemSpecs,
        notes: Vec<AdvisoryNote>,
        bill_of_materials: Vec<LineItem>,
    },
}

impl SizingResult {
    pub fn specs(&self) -> &SystemSpecs {
        match self {
            SizingResult::MarketSet { specs, .. } | SizingResult::CustomBuild { specs, .. } => {
                specs
            }
        }
    }

    pub fn total_estimated(&self) -> u64 {
        match self {
            SizingResult::MarketSet {
                total_estimated, ..
            }
            | SizingResult::CustomBuild {
                total_estimated, ..
            } => *total_estimated,
        }
    }

    pub fn is_market_set(&self) -> bool {
        matches!(self, SizingResult::MarketSet { .. })
    }
}
