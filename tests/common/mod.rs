//! Shared catalog fixtures for integration tests.

#![allow(dead_code)]

use rusqlite::Connection;
use solar_sizer::db;
use solar_sizer::models::{
    BatteryTech, CatalogBattery, CatalogInverter, CatalogPackage, InstallCostReference,
    VoltageTier,
};
use solar_sizer::{EngineConfig, MemoryCatalog, SizingEngine, SqliteCatalog};

pub fn inverters() -> Vec<CatalogInverter> {
    [
        ("Off-Grid 1kW", 1000, VoltageTier::V12, 30.0, 360_000),
        ("Off-Grid 3kW Budget", 3000, VoltageTier::V24, 40.0, 750_000),
        ("Hybrid 3kW", 3000, VoltageTier::V24, 80.0, 950_000),
        ("Hybrid 5kW", 5000, VoltageTier::V48, 100.0, 1_300_000),
        ("Off-Grid 6kW Premium", 6000, VoltageTier::V48, 80.0, 1_385_000),
        ("Hybrid 12kW High-End", 12000, VoltageTier::V48, 160.0, 3_300_000),
    ]
    .into_iter()
    .map(|(label, watts, system_voltage, max_ac_charge_amps, price)| CatalogInverter {
        label: label.to_string(),
        watts,
        price,
        system_voltage,
        max_ac_charge_amps,
    })
    .collect()
}

/// Batteries; energy is exact so unit counts are predictable.
pub fn batteries() -> Vec<CatalogBattery> {
    [
        ("LiFePO4 12.8V 100Ah", BatteryTech::LiFePo4, 12.8, VoltageTier::V12, 100, 1.28, 900_000),
        ("LiFePO4 25.6V 100Ah", BatteryTech::LiFePo4, 25.6, VoltageTier::V24, 100, 2.56, 1_700_000),
        ("LiFePO4 51.2V 100Ah", BatteryTech::LiFePo4, 51.2, VoltageTier::V48, 100, 5.12, 3_000_000),
        ("LiFePO4 51.2V 314Ah", BatteryTech::LiFePo4, 51.2, VoltageTier::V48, 314, 16.07, 6_800_000),
        ("Tubular 12V 200Ah", BatteryTech::Tubular, 12.0, VoltageTier::V12, 200, 2.4, 1_850_000),
        ("Tubular 12V 150Ah", BatteryTech::Tubular, 12.0, VoltageTier::V12, 150, 1.8, 1_400_000),
    ]
    .into_iter()
    .map(
        |(label, tech, voltage, system_voltage, amp_hours, energy_kwh, price)| CatalogBattery {
            label: label.to_string(),
            price,
            energy_kwh,
            voltage,
            system_voltage,
            amp_hours,
            tech,
        },
    )
    .collect()
}

pub fn packages() -> Vec<CatalogPackage> {
    vec![
        CatalogPackage {
            name: "Apartment Backup 1kW".to_string(),
            total_price: 3_200_000,
            inverter_watts: 1000,
            battery_kwh: 2.56,
            system_voltage: VoltageTier::V12,
            includes_panels: false,
            description: "no panels".to_string(),
        },
        CatalogPackage {
            name: "Home Solar 3kW".to_string(),
            total_price: 7_500_000,
            inverter_watts: 3000,
            battery_kwh: 5.12,
            system_voltage: VoltageTier::V24,
            includes_panels: true,
            description: "4x 620W panels".to_string(),
        },
    ]
}

pub fn install_costs() -> Vec<(VoltageTier, InstallCostReference)> {
    vec![
        (VoltageTier::V12, install(150_000, 150_000, 30_000, 250_000)),
        (VoltageTier::V24, install(250_000, 250_000, 35_000, 350_000)),
        (VoltageTier::V48, install(400_000, 400_000, 40_000, 500_000)),
    ]
}

fn install(labor: u64, kit: u64, mounting: u64, cabinet: u64) -> InstallCostReference {
    InstallCostReference {
        base_labor: labor,
        accessory_kit_cost: kit,
        mounting_cost_per_panel: mounting,
        cabinet_cost: cabinet,
    }
}

/// Components and install references, no bundled packages.
pub fn components_catalog() -> MemoryCatalog {
    let mut catalog = MemoryCatalog::new();
    catalog.inverters = inverters();
    catalog.batteries = batteries();
    catalog.install_costs = install_costs().into_iter().collect();
    catalog
}

/// Components plus bundled packages.
pub fn full_catalog() -> MemoryCatalog {
    let mut catalog = components_catalog();
    catalog.packages = packages();
    catalog
}

/// The full catalog seeded into an in-memory SQLite database.
pub fn sqlite_catalog() -> SqliteCatalog {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    for inverter in inverters() {
        db::insert_inverter(&conn, &inverter).unwrap();
    }
    for battery in batteries() {
        db::insert_battery(&conn, &battery).unwrap();
    }
    for package in packages() {
        db::insert_package(&conn, &package).unwrap();
    }
    for (tier, costs) in install_costs() {
        db::upsert_install_costs(&conn, tier, &costs).unwrap();
    }
    SqliteCatalog::new(conn)
}

pub fn engine(catalog: MemoryCatalog) -> SizingEngine<MemoryCatalog> {
    SizingEngine::new(catalog, EngineConfig::default())
}
