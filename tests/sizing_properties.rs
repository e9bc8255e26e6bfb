//! Property tests over the whole engine.

mod common;

use proptest::prelude::*;
use solar_sizer::{CatalogGateway, MemoryCatalog, SizingEngine, SizingError, SizingResult, physics};

fn engine() -> SizingEngine<MemoryCatalog> {
    common::engine(common::full_catalog())
}

proptest! {
    #[test]
    fn custom_build_total_is_conserved(watts in 1i64..20_000, hours in 0.25f64..24.0, no_solar in any::<bool>()) {
        if let SizingResult::CustomBuild {
            equipment_cost,
            solar_panels_cost,
            installation_and_accessories_cost,
            total_estimated,
            bill_of_materials,
            ..
        } = engine().size_system(watts, hours, no_solar).unwrap()
        {
            prop_assert_eq!(
                total_estimated,
                equipment_cost + solar_panels_cost + installation_and_accessories_cost
            );
            prop_assert_eq!(bill_of_materials.iter().map(|i| i.total).sum::<u64>(), total_estimated);
        }
    }

    #[test]
    fn no_solar_suppresses_panels(watts in 1i64..20_000, hours in 0.25f64..24.0) {
        let result = engine().size_system(watts, hours, true).unwrap();
        prop_assert_eq!(result.specs().recommended_solar_panels, 0);
        match result {
            SizingResult::CustomBuild { solar_panels_cost, .. } => prop_assert_eq!(solar_panels_cost, 0),
            SizingResult::MarketSet { solar_addon_cost, .. } => prop_assert_eq!(solar_addon_cost, 0),
        }
    }

    #[test]
    fn qualifying_package_always_wins(watts in 1i64..6_000, hours in 0.25f64..8.0, no_solar in any::<bool>()) {
        let engine = engine();
        let request = solar_sizer::SizingRequest::new(watts, hours, no_solar).unwrap();
        let profile = physics::size(&request);
        let direct = engine
            .gateway()
            .find_cheapest_package(
                profile.raw_required_w,
                profile.required_energy_kwh * engine.config().matching.package_battery_tolerance,
                profile.system_voltage,
                !no_solar,
            )
            .unwrap();
        let result = engine.size(&request).unwrap();
        prop_assert_eq!(direct.is_some(), result.is_market_set());
    }

    #[test]
    fn larger_requests_never_lower_the_quoted_voltage(
        watts in 1i64..10_000,
        extra_watts in 0i64..10_000,
        hours in 0.25f64..24.0,
        extra_hours in 0.0f64..24.0,
        no_solar in any::<bool>(),
    ) {
        let engine = common::engine(common::components_catalog());
        let small = engine.size_system(watts, hours, no_solar).unwrap();
        let large = engine.size_system(watts + extra_watts, hours + extra_hours, no_solar).unwrap();
        prop_assert!(large.specs().system_voltage >= small.specs().system_voltage);
    }

    #[test]
    fn extreme_requests_are_quoted_exactly_or_rejected(
        watts in 1i64..4_000_000_000,
        hours in 0.001f64..1e12,
        no_solar in any::<bool>(),
    ) {
        let engine = common::engine(MemoryCatalog::new());
        match engine.size_system(watts, hours, no_solar) {
            Ok(SizingResult::CustomBuild {
                equipment_cost,
                solar_panels_cost,
                installation_and_accessories_cost,
                total_estimated,
                specs,
                ..
            }) => {
                prop_assert_eq!(
                    total_estimated,
                    equipment_cost + solar_panels_cost + installation_and_accessories_cost
                );
                prop_assert!(specs.inverter_size_kw * 1000.0 >= watts as f64 * 1.25 - 50.0);
            }
            Ok(SizingResult::MarketSet { .. }) => prop_assert!(false, "empty catalog has no packages"),
            Err(err) => prop_assert!(matches!(err, SizingError::InvalidRequest { .. }), "expected InvalidRequest error"),
        }
    }
}
