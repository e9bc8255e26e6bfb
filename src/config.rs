//! Engine configuration: fallback prices, matching tolerances and the
//! reference solar panel.
//!
//! Everything has a default, so an empty TOML document is a valid config.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::models::{BatteryTech, InstallCostReference};

/// Top-level engine configuration parsed from TOML.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub fallback: FallbackConfig,
    #[serde(default)]
    pub solar: SolarConfig,
}

/// Tolerances used when matching catalog rows against a requirement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatchingConfig {
    /// Fraction of the required energy a bundle's battery must reach (0..=1).
    pub package_battery_tolerance: f64,
    /// Minimum amp-hour rating of a high-density cell.
    pub dense_cell_min_amp_hours: u32,
    /// 48V banks above this size prefer high-density cells.
    pub dense_bank_min_kwh: f64,
    /// Installed capacity above which a cabinet is quoted.
    pub cabinet_threshold_kwh: f64,
    /// Inverter/requirement ratio above which an upsizing note is emitted.
    pub upsize_note_ratio: f64,
    /// Usable fraction of a LiFePO4 cell's nameplate energy.
    pub lifepo4_depth_of_discharge: f64,
    /// Usable fraction of a tubular or flooded lead-acid cell.
    pub lead_acid_depth_of_discharge: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            package_battery_tolerance: 0.9,
            dense_cell_min_amp_hours: 280,
            dense_bank_min_kwh: 10.0,
            cabinet_threshold_kwh: 10.0,
            upsize_note_ratio: 1.2,
            lifepo4_depth_of_discharge: 1.0,
            lead_acid_depth_of_discharge: 0.5,
        }
    }
}

impl MatchingConfig {
    pub fn depth_of_discharge(&self, tech: BatteryTech) -> f64 {
        match tech {
            BatteryTech::LiFePo4 => self.lifepo4_depth_of_discharge,
            BatteryTech::Tubular | BatteryTech::LeadAcid => self.lead_acid_depth_of_discharge,
        }
    }
}

/// Prices used when the catalog has nothing suitable.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FallbackConfig {
    /// Virtual industrial inverter price per kW.
    pub inverter_price_per_kw: u64,
    /// Generic battery bank price per kWh.
    pub battery_price_per_kwh: u64,
    /// Installation costs used when a tier has no reference row.
    pub install: InstallCostReference,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            inverter_price_per_kw: 300_000,
            battery_price_per_kwh: 450_000,
            install: InstallCostReference {
                base_labor: 300_000,
                accessory_kit_cost: 250_000,
                mounting_cost_per_panel: 40_000,
                cabinet_cost: 350_000,
            },
        }
    }
}

/// Reference panel used to count the array.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolarConfig {
    pub panel_watts: u32,
    pub panel_price: u64,
}

impl Default for SolarConfig {
    fn default() -> Self {
        Self {
            panel_watts: 620,
            panel_price: 310_000,
        }
    }
}

impl EngineConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let m = &self.matching;
        let tolerance = m.package_battery_tolerance;
        if tolerance.is_nan() || tolerance <= 0.0 || tolerance > 1.0 {
            bail!("matching.package_battery_tolerance must be in (0, 1], got {tolerance}");
        }
        if m.dense_bank_min_kwh.is_nan() || m.dense_bank_min_kwh < 0.0 {
            bail!("matching.dense_bank_min_kwh must be non-negative");
        }
        if m.cabinet_threshold_kwh.is_nan() || m.cabinet_threshold_kwh < 0.0 {
            bail!("matching.cabinet_threshold_kwh must be non-negative");
        }
        if m.upsize_note_ratio.is_nan() || m.upsize_note_ratio < 1.0 {
            bail!("matching.upsize_note_ratio must be at least 1.0");
        }
        for (name, dod) in [
            ("lifepo4_depth_of_discharge", m.lifepo4_depth_of_discharge),
            ("lead_acid_depth_of_discharge", m.lead_acid_depth_of_discharge),
        ] {
            if dod.is_nan() || dod <= 0.0 || dod > 1.0 {
                bail!("matching.{name} must be in (0, 1], got {dod}");
            }
        }
        if self.fallback.inverter_price_per_kw == 0 {
            bail!("fallback.inverter_price_per_kw must be positive");
        }
        if self.fallback.battery_price_per_kwh == 0 {
            bail!("fallback.battery_price_per_kwh must be positive");
        }
        if self.solar.panel_watts == 0 {
            bail!("solar.panel_watts must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.matching.package_battery_tolerance, 0.9);
        assert_eq!(config.solar.panel_watts, 620);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [matching]
            package_battery_tolerance = 0.8

            [fallback.install]
            base_labor = 1
            accessory_kit_cost = 2
            mounting_cost_per_panel = 3
            cabinet_cost = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.matching.package_battery_tolerance, 0.8);
        assert_eq!(config.matching.dense_cell_min_amp_hours, 280);
        assert_eq!(config.fallback.install.cabinet_cost, 4);
        assert_eq!(config.fallback.battery_price_per_kwh, 450_000);
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(EngineConfig::from_toml_str("[solar]\npanel_wats = 500\n").is_err());
    }

    #[test]
    fn rejects_out_of_range_tolerance() {
        assert!(
            EngineConfig::from_toml_str("[matching]\npackage_battery_tolerance = 1.5\n").is_err()
        );
        assert!(
            EngineConfig::from_toml_str("[matching]\npackage_battery_tolerance = 0.0\n").is_err()
        );
    }

    #[test]
    fn rejects_nan_and_out_of_range_fractions() {
        assert!(EngineConfig::from_toml_str("[matching]\npackage_battery_tolerance = nan\n").is_err());
        assert!(EngineConfig::from_toml_str("[matching]\ncabinet_threshold_kwh = nan\n").is_err());
        assert!(
            EngineConfig::from_toml_str("[matching]\nlead_acid_depth_of_discharge = 0.0\n").is_err()
        );
        assert!(
            EngineConfig::from_toml_str("[matching]\nlifepo4_depth_of_discharge = 1.2\n").is_err()
        );
        let config =
            EngineConfig::from_toml_str("[matching]\nlead_acid_depth_of_discharge = 0.6\n").unwrap();
        assert_eq!(config.matching.depth_of_discharge(BatteryTech::Tubular), 0.6);
        assert_eq!(config.matching.depth_of_discharge(BatteryTech::LiFePo4), 1.0);
    }

    #[test]
    fn rejects_zero_panel_watts() {
        assert!(EngineConfig::from_toml_str("[solar]\npanel_watts = 0\n").is_err());
    }
}
