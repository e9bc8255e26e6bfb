//! Read-only catalog contract consumed by the sizing engine

use std::collections::BTreeMap;

use thiserror::Error;

use crate::models::{
    BatteryTech, CatalogBattery, CatalogInverter, CatalogPackage, InstallCostReference,
    VoltageTier,
};

/// Failure to reach or query the backing store.
///
/// An empty result is never an error; queries return `Ok(None)` instead.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog store unreachable: {0}")]
    Unavailable(String),

    #[error("catalog query failed")]
    Query(#[from] rusqlite::Error),
}

/// Read-only queries against the market catalog.
///
/// Every `find_cheapest_*` query returns the lowest-priced qualifying row,
/// breaking price ties by catalog order.
pub trait CatalogGateway {
    /// Cheapest bundle with at least the given inverter power and battery
    /// energy, on exactly `voltage`, with or without panels.
    fn find_cheapest_package(
        &self,
        min_inverter_watts: f64,
        min_battery_kwh: f64,
        voltage: VoltageTier,
        includes_panels: bool,
    ) -> Result<Option<CatalogPackage>, CatalogError>;

    /// Cheapest inverter on `voltage` meeting power and AC-charge limits.
    fn find_cheapest_inverter(
        &self,
        voltage: VoltageTier,
        min_watts: f64,
        min_charge_amps: f64,
    ) -> Result<Option<CatalogInverter>, CatalogError>;

    /// Cheapest battery on `voltage`, optionally filtered by amp-hours and chemistry.
    fn find_cheapest_battery(
        &self,
        voltage: VoltageTier,
        min_amp_hours: Option<u32>,
        tech: Option<BatteryTech>,
    ) -> Result<Option<CatalogBattery>, CatalogError>;

    fn get_install_costs(
        &self,
        voltage: VoltageTier,
    ) -> Result<Option<InstallCostReference>, CatalogError>;
}

impl<G: CatalogGateway + ?Sized> CatalogGateway for &G {
    fn find_cheapest_package(
        &self,
        min_inverter_watts: f64,
        min_battery_kwh: f64,
        voltage: VoltageTier,
        includes_panels: bool,
    ) -> Result<Option<CatalogPackage>, CatalogError> {
        (**self).find_cheapest_package(min_inverter_watts, min_battery_kwh, voltage, includes_panels)
    }

    fn find_cheapest_inverter(
        &self,
        voltage: VoltageTier,
        min_watts: f64,
        min_charge_amps: f64,
    ) -> Result<Option<CatalogInverter>, CatalogError> {
        (**self).find_cheapest_inverter(voltage, min_watts, min_charge_amps)
    }

    fn find_cheapest_battery(
        &self,
        voltage: VoltageTier,
        min_amp_hours: Option<u32>,
        tech: Option<BatteryTech>,
    ) -> Result<Option<CatalogBattery>, CatalogError> {
        (**self).find_cheapest_battery(voltage, min_amp_hours, tech)
    }

    fn get_install_costs(
        &self,
        voltage: VoltageTier,
    ) -> Result<Option<InstallCostReference>, CatalogError> {
        (**self).get_install_costs(voltage)
    }
}

/// In-memory catalog, handy for tests and offline quoting.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    pub packages: Vec<CatalogPackage>,
    pub inverters: Vec<CatalogInverter>,
    pub batteries: Vec<CatalogBattery>,
    pub install_costs: BTreeMap<VoltageTier, InstallCostReference>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_package(mut self, package: CatalogPackage) -> Self {
        self.packages.push(package);
        self
    }

    pub fn with_inverter(mut self, inverter: CatalogInverter) -> Self {
        self.inverters.push(inverter);
        self
    }

    pub fn with_battery(mut self, battery: CatalogBattery) -> Self {
        self.batteries.push(battery);
        self
    }

    pub fn with_install_costs(mut self, voltage: VoltageTier, costs: InstallCostReference) -> Self {
        self.install_costs.insert(voltage, costs);
        self
    }
}

impl CatalogGateway for MemoryCatalog {
    fn find_cheapest_package(
        &self,
        min_inverter_watts: f64,
        min_battery_kwh: f64,
        voltage: VoltageTier,
        includes_panels: bool,
    ) -> Result<Option<CatalogPackage>, CatalogError> {
        Ok(self
            .packages
            .iter()
            .filter(|p| {
                f64::from(p.inverter_watts) >= min_inverter_watts
                    && p.battery_kwh >= min_battery_kwh
                    && p.system_voltage == voltage
                    && p.includes_panels == includes_panels
            })
            .min_by_key(|p| p.total_price)
            .cloned())
    }

    fn find_cheapest_inverter(
        &self,
        voltage: VoltageTier,
        min_watts: f64,
        min_charge_amps: f64,
    ) -> Result<Option<CatalogInverter>, CatalogError> {
        Ok(self
            .inverters
            .iter()
            .filter(|i| {
                i.system_voltage == voltage
                    && f64::from(i.watts) >= min_watts
                    && i.max_ac_charge_amps >= min_charge_amps
            })
            .min_by_key(|i| i.price)
            .cloned())
    }

    fn find_cheapest_battery(
        &self,
        voltage: VoltageTier,
        min_amp_hours: Option<u32>,
        tech: Option<BatteryTech>,
    ) -> Result<Option<CatalogBattery>, CatalogError> {
        Ok(self
            .batteries
            .iter()
            .filter(|b| {
                b.system_voltage == voltage
                    && min_amp_hours.is_none_or(|ah| b.amp_hours >= ah)
                    && tech.is_none_or(|t| b.tech == t)
            })
            .min_by_key(|b| b.price)
            .cloned())
    }

    fn get_install_costs(
        &self,
        voltage: VoltageTier,
    ) -> Result<Option<InstallCostReference>, CatalogError> {
        Ok(self.install_costs.get(&voltage).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn battery(label: &str, price: u64, amp_hours: u32, tech: BatteryTech) -> CatalogBattery {
        CatalogBattery {
            label: label.to_string(),
            price,
            energy_kwh: 51.2 * f64::from(amp_hours) / 1000.0,
            voltage: 51.2,
            system_voltage: VoltageTier::V48,
            amp_hours,
            tech,
        }
    }

    #[test]
    fn cheapest_battery_honours_filters() {
        let catalog = MemoryCatalog::new()
            .with_battery(battery("small", 3_000_000, 100, BatteryTech::LiFePo4))
            .with_battery(battery("dense", 6_800_000, 314, BatteryTech::LiFePo4))
            .with_battery(battery("lead", 1_000_000, 200, BatteryTech::Tubular));

        let any = catalog.find_cheapest_battery(VoltageTier::V48, None, None).unwrap();
        assert_eq!(any.unwrap().label, "lead");

        let lithium = catalog
            .find_cheapest_battery(VoltageTier::V48, None, Some(BatteryTech::LiFePo4))
            .unwrap();
        assert_eq!(lithium.unwrap().label, "small");

        let dense = catalog.find_cheapest_battery(VoltageTier::V48, Some(280), None).unwrap();
        assert_eq!(dense.unwrap().label, "dense");

        assert!(catalog.find_cheapest_battery(VoltageTier::V12, None, None).unwrap().is_none());
    }

    #[test]
    fn price_ties_keep_catalog_order() {
        let inverter = |label: &str| CatalogInverter {
            label: label.to_string(),
            watts: 3000,
            price: 900_000,
            system_voltage: VoltageTier::V24,
            max_ac_charge_amps: 60.0,
        };
        let catalog = MemoryCatalog::new()
            .with_inverter(inverter("first"))
            .with_inverter(inverter("second"));
        let found = catalog.find_cheapest_inverter(VoltageTier::V24, 2000.0, 0.0).unwrap();
        assert_eq!(found.unwrap().label, "first");
    }

    #[test]
    fn gateway_works_through_a_reference() {
        fn install_for(gateway: impl CatalogGateway) -> Option<InstallCostReference> {
            gateway.get_install_costs(VoltageTier::V12).unwrap()
        }
        let costs = InstallCostReference {
            base_labor: 1,
            accessory_kit_cost: 2,
            mounting_cost_per_panel: 3,
            cabinet_cost: 4,
        };
        let catalog = MemoryCatalog::new().with_install_costs(VoltageTier::V12, costs);
        let shared: &dyn CatalogGateway = &catalog;
        assert_eq!(install_for(&catalog), Some(costs));
        assert_eq!(install_for(shared), Some(costs));
    }
}
