//! Solar Sizer
//!
//! Sizes and prices battery backup and solar systems against a market catalog.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use tracing_subscriber::EnvFilter;

use solar_sizer::db;
use solar_sizer::models::{
    BatteryTech, CatalogBattery, CatalogInverter, CatalogPackage, InstallCostReference,
    VoltageTier,
};
use solar_sizer::{EngineConfig, SizingEngine, SqliteCatalog};

#[derive(Parser)]
#[command(name = "solar-sizer")]
#[command(about = "Battery backup and solar system sizing against a market catalog")]
struct Cli {
    /// Path to the SQLite catalog
    #[arg(short, long, env = "SOLAR_CATALOG_DB", default_value = "solar_catalog.db")]
    database: PathBuf,

    /// Engine configuration (TOML); built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Size and price a system
    Size {
        /// Total connected load in watts
        #[arg(short, long, allow_negative_numbers = true)]
        watts: i64,

        /// Backup duration in hours
        #[arg(long, allow_negative_numbers = true)]
        hours: f64,

        /// Panels cannot be installed; recharge from the grid
        #[arg(long)]
        no_solar: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List catalog inverters
    ListInverters,

    /// List catalog batteries
    ListBatteries,

    /// List catalog packages
    ListPackages,

    /// Initialize empty catalog with schema
    Init,

    /// Load a sample market catalog for testing
    LoadSample,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Size {
            watts,
            hours,
            no_solar,
            json,
        } => {
            let config = match &cli.config {
                Some(path) => EngineConfig::from_toml_file(path)?,
                None => EngineConfig::default(),
            };
            let engine = SizingEngine::new(SqliteCatalog::open(&cli.database)?, config);
            let result = engine.size_system(watts, hours, no_solar)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", result);
            }
        }

        Commands::ListInverters => {
            let inverters = db::list_inverters(&db::open(&cli.database)?)?;
            if inverters.is_empty() {
                println!("No inverters in catalog. Run 'load-sample' first.");
            } else {
                println!(
                    "{:<30} {:>8} {:>8} {:>10} {:>12}",
                    "Inverter", "Watts", "Voltage", "AC charge", "Price"
                );
                println!("{}", "-".repeat(72));
                for i in inverters {
                    println!(
                        "{:<30} {:>8} {:>8} {:>9.0}A {:>12}",
                        i.label, i.watts, i.system_voltage, i.max_ac_charge_amps, i.price
                    );
                }
            }
        }

        Commands::ListBatteries => {
            let batteries = db::list_batteries(&db::open(&cli.database)?)?;
            if batteries.is_empty() {
                println!("No batteries in catalog. Run 'load-sample' first.");
            } else {
                println!(
                    "{:<30} {:>8} {:>8} {:>6} {:>8} {:>12}",
                    "Battery", "Tech", "Voltage", "Ah", "kWh", "Price"
                );
                println!("{}", "-".repeat(77));
                for b in batteries {
                    println!(
                        "{:<30} {:>8} {:>7.1}V {:>6} {:>8.2} {:>12}",
                        b.label, b.tech, b.voltage, b.amp_hours, b.energy_kwh, b.price
                    );
                }
            }
        }

        Commands::ListPackages => {
            let packages = db::list_packages(&db::open(&cli.database)?)?;
            if packages.is_empty() {
                println!("No packages in catalog. Run 'load-sample' first.");
            } else {
                for p in packages {
                    println!("{} ({}, {} MMK)", p.name, p.system_voltage, p.total_price);
                    println!(
                        "  {}W inverter, {:.2} kWh battery, panels: {}",
                        p.inverter_watts,
                        p.battery_kwh,
                        if p.includes_panels { "yes" } else { "no" }
                    );
                    if !p.description.is_empty() {
                        println!("  {}", p.description);
                    }
                }
            }
        }

        Commands::Init => {
            db::open(&cli.database)?;
            println!("Catalog initialized at: {}", cli.database.display());
        }

        Commands::LoadSample => {
            load_sample_data(&db::open(&cli.database)?)?;
            println!("Sample catalog loaded successfully!");
        }
    }

    Ok(())
}

/// Load a sample market catalog (prices in MMK)
fn load_sample_data(conn: &Connection) -> Result<()> {
    db::clear_catalog(conn)?;

    let inverters = [
        ("Off-Grid 1kW", 1000, VoltageTier::V12, 30.0, 360_000),
        ("Off-Grid 3kW Budget", 3000, VoltageTier::V24, 40.0, 750_000),
        ("Hybrid 3kW", 3000, VoltageTier::V24, 80.0, 950_000),
        ("Hybrid 5kW", 5000, VoltageTier::V48, 100.0, 1_300_000),
        ("Off-Grid 6kW Premium", 6000, VoltageTier::V48, 80.0, 1_385_000),
        ("Hybrid 12kW High-End", 12000, VoltageTier::V48, 160.0, 3_300_000),
    ];
    for (label, watts, system_voltage, max_ac_charge_amps, price) in inverters {
        db::insert_inverter(
            conn,
            &CatalogInverter {
                label: label.to_string(),
                watts,
                price,
                system_voltage,
                max_ac_charge_amps,
            },
        )?;
    }

    let batteries = [
        ("LiFePO4 12.8V 100Ah", BatteryTech::LiFePo4, 12.8, VoltageTier::V12, 100, 900_000),
        ("LiFePO4 25.6V 100Ah", BatteryTech::LiFePo4, 25.6, VoltageTier::V24, 100, 1_700_000),
        ("LiFePO4 51.2V 100Ah", BatteryTech::LiFePo4, 51.2, VoltageTier::V48, 100, 3_000_000),
        ("LiFePO4 51.2V 314Ah", BatteryTech::LiFePo4, 51.2, VoltageTier::V48, 314, 6_800_000),
        ("Tubular 12V 200Ah", BatteryTech::Tubular, 12.0, VoltageTier::V12, 200, 1_850_000),
        ("Tubular 12V 150Ah", BatteryTech::Tubular, 12.0, VoltageTier::V12, 150, 1_400_000),
    ];
    for (label, tech, voltage, system_voltage, amp_hours, price) in batteries {
        db::insert_battery(
            conn,
            &CatalogBattery {
                label: label.to_string(),
                price,
                energy_kwh: voltage * f64::from(amp_hours) / 1000.0,
                voltage,
                system_voltage,
                amp_hours,
                tech,
            },
        )?;
    }

    let packages = [
        ("Apartment Backup 1kW", 3_200_000, 1000, 2.56, VoltageTier::V12, false,
         "1kW inverter with 12.8V 200Ah lithium, no panels"),
        ("Home Solar 3kW", 7_500_000, 3000, 5.12, VoltageTier::V24, true,
         "3kW hybrid, 5kWh lithium, 4x 620W panels"),
        ("Home Solar 6kW", 14_500_000, 6000, 10.24, VoltageTier::V48, true,
         "6kW hybrid, 10kWh lithium, 8x 620W panels"),
    ];
    for (name, total_price, inverter_watts, battery_kwh, system_voltage, includes_panels, description) in
        packages
    {
        db::insert_package(
            conn,
            &CatalogPackage {
                name: name.to_string(),
                total_price,
                inverter_watts,
                battery_kwh,
                system_voltage,
                includes_panels,
                description: description.to_string(),
            },
        )?;
    }

    let install = [
        (VoltageTier::V12, 150_000, 150_000, 30_000, 250_000),
        (VoltageTier::V24, 250_000, 250_000, 35_000, 350_000),
        (VoltageTier::V48, 400_000, 400_000, 40_000, 500_000),
    ];
    for (tier, base_labor, accessory_kit_cost, mounting_cost_per_panel, cabinet_cost) in install {
        db::upsert_install_costs(
            conn,
            tier,
            &InstallCostReference {
                base_labor,
                accessory_kit_cost,
                mounting_cost_per_panel,
                cabinet_cost,
            },
        )?;
    }

    println!(
        "Loaded {} inverters, {} batteries, {} packages",
        inverters.len(),
        batteries.len(),
        packages.len()
    );
    Ok(())
}
