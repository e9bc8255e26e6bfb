//! Catalog database schema and operations

use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;

use crate::catalog::{CatalogError, CatalogGateway};
use crate::models::{
    BatteryTech, CatalogBattery, CatalogInverter, CatalogPackage, InstallCostReference,
    VoltageTier,
};

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Pre-bundled market packages
        CREATE TABLE IF NOT EXISTS market_packages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            total_price INTEGER NOT NULL,
            inverter_watts INTEGER NOT NULL,
            battery_kwh REAL NOT NULL,
            system_voltage INTEGER NOT NULL,
            includes_panels INTEGER NOT NULL,
            description TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS market_inverters (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            label TEXT NOT NULL,
            watts INTEGER NOT NULL,
            system_voltage INTEGER NOT NULL,
            max_ac_charge_amps REAL NOT NULL,
            price INTEGER NOT NULL
        );

        -- voltage is the nominal pack voltage, voltage_tier the system it fits
        CREATE TABLE IF NOT EXISTS market_batteries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            label TEXT NOT NULL,
            tech_type TEXT NOT NULL,
            voltage REAL NOT NULL,
            voltage_tier INTEGER NOT NULL,
            amp_hours INTEGER NOT NULL,
            energy_kwh REAL NOT NULL,
            price INTEGER NOT NULL
        );

        -- One installation reference row per voltage tier
        CREATE TABLE IF NOT EXISTS install_costs (
            voltage_tier INTEGER PRIMARY KEY,
            base_labor INTEGER NOT NULL,
            accessory_kit_cost INTEGER NOT NULL,
            mounting_cost_per_panel INTEGER NOT NULL,
            cabinet_cost INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_packages_voltage ON market_packages(system_voltage, includes_panels);
        CREATE INDEX IF NOT EXISTS idx_inverters_voltage ON market_inverters(system_voltage);
        CREATE INDEX IF NOT EXISTS idx_batteries_tier ON market_batteries(voltage_tier);
        "#,
    )?;
    Ok(())
}

impl ToSql for VoltageTier {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(i64::from(self.volts())))
    }
}

impl FromSql for VoltageTier {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let volts = u32::column_result(value)?;
        VoltageTier::from_volts(volts)
            .ok_or_else(|| FromSqlError::Other(format!("unsupported voltage tier: {volts}").into()))
    }
}

impl ToSql for BatteryTech {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for BatteryTech {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

/// Insert a market package
/// Open a catalog file, creating the schema if needed.
pub fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open catalog database: {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn insert_package(conn: &Connection, package: &CatalogPackage) -> Result<()> {
    conn.execute(
        "INSERT INTO market_packages (name, total_price, inverter_watts, battery_kwh, system_voltage, includes_panels, description)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            package.name,
            package.total_price,
            package.inverter_watts,
            package.battery_kwh,
            package.system_voltage,
            package.includes_panels,
            package.description,
        ],
    )?;
    Ok(())
}

/// Insert an inverter
pub fn insert_inverter(conn: &Connection, inverter: &CatalogInverter) -> Result<()> {
    conn.execute(
        "INSERT INTO market_inverters (label, watts, system_voltage, max_ac_charge_amps, price)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            inverter.label,
            inverter.watts,
            inverter.system_voltage,
            inverter.max_ac_charge_amps,
            inverter.price,
        ],
    )?;
    Ok(())
}

/// Insert a battery
pub fn insert_battery(conn: &Connection, battery: &CatalogBattery) -> Result<()> {
    conn.execute(
        "INSERT INTO market_batteries (label, tech_type, voltage, voltage_tier, amp_hours, energy_kwh, price)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            battery.label,
            battery.tech,
            battery.voltage,
            battery.system_voltage,
            battery.amp_hours,
            battery.energy_kwh,
            battery.price,
        ],
    )?;
    Ok(())
}

/// Insert or replace the installation reference for a tier
pub fn upsert_install_costs(
    conn: &Connection,
    voltage: VoltageTier,
    costs: &InstallCostReference,
) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO install_costs (voltage_tier, base_labor, accessory_kit_cost, mounting_cost_per_panel, cabinet_cost)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            voltage,
            costs.base_labor,
            costs.accessory_kit_cost,
            costs.mounting_cost_per_panel,
            costs.cabinet_cost,
        ],
    )?;
    Ok(())
}

/// Clear all catalog rows (for reseeding)
pub fn clear_catalog(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM market_packages;
        DELETE FROM market_inverters;
        DELETE FROM market_batteries;
        DELETE FROM install_costs;
        "#,
    )?;
    Ok(())
}

const PACKAGE_COLUMNS: &str =
    "name, total_price, inverter_watts, battery_kwh, system_voltage, includes_panels, description";
const INVERTER_COLUMNS: &str = "label, watts, price, system_voltage, max_ac_charge_amps";
const BATTERY_COLUMNS: &str =
    "label, price, energy_kwh, voltage, voltage_tier, amp_hours, tech_type";

fn package_from_row(row: &Row<'_>) -> rusqlite::Result<CatalogPackage> {
    Ok(CatalogPackage {
        name: row.get(0)?,
        total_price: row.get(1)?,
        inverter_watts: row.get(2)?,
        battery_kwh: row.get(3)?,
        system_voltage: row.get(4)?,
        includes_panels: row.get(5)?,
        description: row.get(6)?,
    })
}

fn inverter_from_row(row: &Row<'_>) -> rusqlite::Result<CatalogInverter> {
    Ok(CatalogInverter {
        label: row.get(0)?,
        watts: row.get(1)?,
        price: row.get(2)?,
        system_voltage: row.get(3)?,
        max_ac_charge_amps: row.get(4)?,
    })
}

fn battery_from_row(row: &Row<'_>) -> rusqlite::Result<CatalogBattery> {
    Ok(CatalogBattery {
        label: row.get(0)?,
        price: row.get(1)?,
        energy_kwh: row.get(2)?,
        voltage: row.get(3)?,
        system_voltage: row.get(4)?,
        amp_hours: row.get(5)?,
        tech: row.get(6)?,
    })
}

/// List all packages, cheapest first
pub fn list_packages(conn: &Connection) -> Result<Vec<CatalogPackage>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PACKAGE_COLUMNS} FROM market_packages ORDER BY system_voltage, total_price, id"
    ))?;
    let rows = stmt.query_map([], package_from_row)?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// List all inverters by tier and power
pub fn list_inverters(conn: &Connection) -> Result<Vec<CatalogInverter>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {INVERTER_COLUMNS} FROM market_inverters ORDER BY system_voltage, watts, price, id"
    ))?;
    let rows = stmt.query_map([], inverter_from_row)?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// List all batteries by tier and capacity
pub fn list_batteries(conn: &Connection) -> Result<Vec<CatalogBattery>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BATTERY_COLUMNS} FROM market_batteries ORDER BY voltage_tier, energy_kwh, price, id"
    ))?;
    let rows = stmt.query_map([], battery_from_row)?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// SQLite-backed catalog gateway.
///
/// Holds one connection behind a mutex; each query takes the lock for its
/// own duration only, so an error never leaves the connection held.
#[derive(Debug)]
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

impl SqliteCatalog {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Open a catalog file, creating the schema if needed.
    pub fn open(path: &Path) -> Result<Self> {
        open(path).map(Self::new)
    }

    fn with_conn<T>(
        &self,
        query: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, CatalogError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| CatalogError::Unavailable("catalog connection poisoned".to_string()))?;
        Ok(query(&*conn)?)
    }
}

impl CatalogGateway for SqliteCatalog {
    fn find_cheapest_package(
        &self,
        min_inverter_watts: f64,
        min_battery_kwh: f64,
        voltage: VoltageTier,
        includes_panels: bool,
    ) -> Result<Option<CatalogPackage>, CatalogError> {
        debug!(min_inverter_watts, min_battery_kwh, %voltage, includes_panels, "querying packages");
        self.with_conn(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {PACKAGE_COLUMNS} FROM market_packages
                     WHERE inverter_watts >= ?1 AND battery_kwh >= ?2
                       AND system_voltage = ?3 AND includes_panels = ?4
                     ORDER BY total_price ASC, id ASC LIMIT 1"
                ),
                params![min_inverter_watts, min_battery_kwh, voltage, includes_panels],
                package_from_row,
            )
            .optional()
        })
    }

    fn find_cheapest_inverter(
        &self,
        voltage: VoltageTier,
        min_watts: f64,
        min_charge_amps: f64,
    ) -> Result<Option<CatalogInverter>, CatalogError> {
        debug!(%voltage, min_watts, min_charge_amps, "querying inverters");
        self.with_conn(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {INVERTER_COLUMNS} FROM market_inverters
                     WHERE system_voltage = ?1 AND watts >= ?2 AND max_ac_charge_amps >= ?3
                     ORDER BY price ASC, id ASC LIMIT 1"
                ),
                params![voltage, min_watts, min_charge_amps],
                inverter_from_row,
            )
            .optional()
        })
    }

    fn find_cheapest_battery(
        &self,
        voltage: VoltageTier,
        min_amp_hours: Option<u32>,
        tech: Option<BatteryTech>,
    ) -> Result<Option<CatalogBattery>, CatalogError> {
        debug!(%voltage, ?min_amp_hours, ?tech, "querying batteries");
        self.with_conn(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {BATTERY_COLUMNS} FROM market_batteries
                     WHERE voltage_tier = ?1
                       AND (?2 IS NULL OR amp_hours >= ?2)
                       AND (?3 IS NULL OR tech_type = ?3)
                     ORDER BY price ASC, id ASC LIMIT 1"
                ),
                params![voltage, min_amp_hours, tech],
                battery_from_row,
            )
            .optional()
        })
    }

    fn get_install_costs(
        &self,
        voltage: VoltageTier,
    ) -> Result<Option<InstallCostReference>, CatalogError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT base_labor, accessory_kit_cost, mounting_cost_per_panel, cabinet_cost
                 FROM install_costs WHERE voltage_tier = ?1",
                [voltage],
                |row| {
                    Ok(InstallCostReference {
                        base_labor: row.get(0)?,
                        accessory_kit_cost: row.get(1)?,
                        mounting_cost_per_panel: row.get(2)?,
                        cabinet_cost: row.get(3)?,
                    })
                },
            )
            .optional()
        })
    }
}
