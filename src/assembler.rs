//! Merge the winning strategy, solar and installation costs into a quote

use std::fmt;

use crate::config::MatchingConfig;
use crate::error::SizingError;
use crate::models::{
    AdvisoryNote, CatalogPackage, LineItem, PhysicsProfile, SizingRequest, SizingResult,
    SolarPlan, SystemSpecs,
};
use crate::snapper::ComponentPlan;

/// Build the result: a matched package always wins over the custom build.
///
/// Fails only when a total does not fit in a `u64`.
pub fn assemble(
    request: &SizingRequest,
    profile: &PhysicsProfile,
    package: Option<CatalogPackage>,
    plan: &ComponentPlan,
    solar: Option<&SolarPlan>,
    matching: &MatchingConfig,
) -> Result<SizingResult, SizingError> {
    match package {
        Some(package) => market_set(package, solar),
        None => custom_build(request, profile, plan, solar, matching),
    }
}

fn market_set(
    package: CatalogPackage,
    solar: Option<&SolarPlan>,
) -> Result<SizingResult, SizingError> {
    let solar_addon_cost = match solar {
        Some(solar) if !package.includes_panels => solar
            .panel_cost()
            .and_then(|cost| cost.checked_add(solar.mounting_cost))
            .ok_or_else(|| SizingError::out_of_range("solar add-on"))?,
        _ => 0,
    };
    let total_estimated = package
        .total_price
        .checked_add(solar_addon_cost)
        .ok_or_else(|| SizingError::out_of_range("package total"))?;

    Ok(SizingResult::MarketSet {
        total_estimated,
        package_price: package.total_price,
        solar_addon_cost,
        specs: SystemSpecs {
            inverter_size_kw: round_to(f64::from(package.inverter_watts) / 1000.0, 1),
            system_voltage: package.system_voltage,
            battery_storage_kwh: round_to(package.battery_kwh, 2),
            recommended_solar_panels: solar.map_or(0, |s| s.panel_count),
        },
        package_name: package.name,
    })
}

fn custom_build(
    request: &SizingRequest,
    profile: &PhysicsProfile,
    plan: &ComponentPlan,
    solar: Option<&SolarPlan>,
    matching: &MatchingConfig,
) -> Result<SizingResult, SizingError> {
    let equipment_cost = plan
        .equipment_cost()
        .ok_or_else(|| SizingError::out_of_range("equipment cost"))?;
    let solar_panels_cost = match solar {
        Some(solar) => solar
            .panel_cost()
            .ok_or_else(|| SizingError::out_of_range("solar panel cost"))?,
        None => 0,
    };
    let installation_and_accessories_cost = plan
        .install
        .base_labor
        .checked_add(plan.install.accessory_kit_cost)
        .and_then(|cost| cost.checked_add(solar.map_or(0, |s| s.mounting_cost)))
        .ok_or_else(|| SizingError::out_of_range("installation cost"))?;
    let total_estimated = equipment_cost
        .checked_add(solar_panels_cost)
        .and_then(|cost| cost.checked_add(installation_and_accessories_cost))
        .ok_or_else(|| SizingError::out_of_range("total estimate"))?;

    Ok(SizingResult::CustomBuild {
        equipment_cost,
        solar_panels_cost,
        installation_and_accessories_cost,
        total_estimated,
        specs: SystemSpecs {
            inverter_size_kw: round_to(f64::from(plan.inverter.watts) / 1000.0, 1),
            system_voltage: profile.system_voltage,
            battery_storage_kwh: round_to(plan.battery.total_kwh(), 2),
            recommended_solar_panels: solar.map_or(0, |s| s.panel_count),
        },
        notes: notes(request, profile, plan, matching),
        // every line total is a term of the checked sum above
        bill_of_materials: bill_of_materials(plan, solar),
    })
}

fn notes(
    request: &SizingRequest,
    profile: &PhysicsProfile,
    plan: &ComponentPlan,
    matching: &MatchingConfig,
) -> Vec<AdvisoryNote> {
    let mut notes = Vec::new();

    if profile.voltage_forced {
        notes.push(AdvisoryNote::VoltageForced);
    }
    if request.no_solar() && profile.min_charge_amps > 0.0 {
        notes.push(AdvisoryNote::FastCharge {
            min_charge_amps: round_to(profile.min_charge_amps, 1),
        });
    }

    if plan.inverter.from_catalog {
        if f64::from(plan.inverter.watts) > profile.raw_required_w * matching.upsize_note_ratio {
            notes.push(AdvisoryNote::Upsized {
                required_w: profile.raw_required_w.ceil() as u32,
                selected_w: plan.inverter.watts,
            });
        }
    } else {
        notes.push(AdvisoryNote::VirtualInverter {
            watts: plan.inverter.watts,
        });
    }

    if !plan.battery.from_catalog {
        notes.push(AdvisoryNote::GenericBattery {
            energy_kwh: round_to(plan.battery.unit_kwh, 2),
        });
    } else if plan.battery.relaxed {
        notes.push(AdvisoryNote::RelaxedBattery {
            label: plan.battery.label.clone(),
        });
    }

    if !plan.install_from_catalog {
        notes.push(AdvisoryNote::DefaultInstallCosts {
            system_voltage: profile.system_voltage,
        });
    }

    notes
}

fn bill_of_materials(plan: &ComponentPlan, solar: Option<&SolarPlan>) -> Vec<LineItem> {
    let mut items = vec![LineItem::new(plan.inverter.label.clone(), 1, plan.inverter.price)];

    let battery_label = match plan.battery.tech {
        Some(tech) => format!("{} ({tech}, {} lifespan)", plan.battery.label, tech.lifespan()),
        None => plan.battery.label.clone(),
    };
    items.push(LineItem::new(battery_label, plan.battery.quantity, plan.battery.unit_price));

    if plan.cabinet_cost > 0 {
        items.push(LineItem::new("Battery cabinet", 1, plan.cabinet_cost));
    }
    if let Some(solar) = solar.filter(|s| s.panel_count > 0) {
        items.push(LineItem::new(
            format!("Solar panel {}W", solar.panel_unit_watts),
            solar.panel_count,
            solar.panel_unit_price,
        ));
        items.push(LineItem::new(
            "Panel mounting",
            solar.panel_count,
            plan.install.mounting_cost_per_panel,
        ));
    }
    items.push(LineItem::new("Installation labor", 1, plan.install.base_labor));
    items.push(LineItem::new("Accessory kit (cables, breakers)", 1, plan.install.accessory_kit_cost));

    items
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Format an amount with thousands separators and its lakh equivalent.
pub fn format_amount(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{grouped} MMK ({:.2} Lakhs)", amount as f64 / 100_000.0)
}

impl fmt::Display for SizingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizingResult::MarketSet {
                package_name,
                package_price,
                solar_addon_cost,
                total_estimated,
                specs,
            } => {
                writeln!(f, "=== Market Package ===")?;
                writeln!(f, "Package: {package_name}")?;
                writeln!(f)?;
                write_specs(f, specs)?;
                writeln!(f)?;
                writeln!(f, "Costs:")?;
                writeln!(f, "  Package:      {}", format_amount(*package_price))?;
                writeln!(f, "  Solar add-on: {}", format_amount(*solar_addon_cost))?;
                writeln!(f, "  Total:        {}", format_amount(*total_estimated))?;
            }
            SizingResult::CustomBuild {
                equipment_cost,
                solar_panels_cost,
                installation_and_accessories_cost,
                total_estimated,
                specs,
                notes,
                bill_of_materials,
            } => {
                writeln!(f, "=== Custom Build ===")?;
                write_specs(f, specs)?;
                writeln!(f)?;

                writeln!(f, "Bill of materials:")?;
                for item in bill_of_materials {
                    writeln!(
                        f,
                        "  {:>3}x {:<50} {:>14}",
                        item.quantity,
                        item.label,
                        format_amount(item.total)
                    )?;
                }
                writeln!(f)?;

                writeln!(f, "Costs:")?;
                writeln!(f, "  Equipment:    {}", format_amount(*equipment_cost))?;
                writeln!(f, "  Solar panels: {}", format_amount(*solar_panels_cost))?;
                writeln!(
                    f,
                    "  Installation: {}",
                    format_amount(*installation_and_accessories_cost)
                )?;
                writeln!(f, "  Total:        {}", format_amount(*total_estimated))?;

                if !notes.is_empty() {
                    writeln!(f)?;
                    writeln!(f, "Notes:")?;
                    for note in notes {
                        writeln!(f, "  - {note}")?;
                    }
                }
            }
        }
        Ok(())
    }
}

fn write_specs(f: &mut fmt::Formatter<'_>, specs: &SystemSpecs) -> fmt::Result {
    writeln!(f, "Specs:")?;
    writeln!(f, "  Inverter:     {:.1} kW", specs.inverter_size_kw)?;
    writeln!(f, "  Voltage:      {}", specs.system_voltage)?;
    writeln!(f, "  Battery:      {:.2} kWh", specs.battery_storage_kwh)?;
    writeln!(f, "  Solar panels: {}", specs.recommended_solar_panels)
}
