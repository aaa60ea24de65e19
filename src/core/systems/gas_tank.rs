//! Base case: a conventional gas storage water heater in every household, fed from the mains.
use crate::core::component::{run_step, ComponentKind, StepFailure};
use crate::core::storage::gas_tank::{GasTank, GasTankDrivers};
use crate::core::storage::TemperatureLimits;
use crate::core::systems::{
    household_results, push_weather_results, HourlySystem, SystemDrivers, SystemParameters,
};
use crate::errors::InvalidInputError;
use crate::input::SystemType;
use crate::results::{HourlyResults, ResultLabel, ResultSeries};
use crate::sizing::SystemSizes;

#[derive(Clone, Debug)]
pub struct GasTankSystem {
    tanks: Vec<GasTank>,
}

impl GasTankSystem {
    pub fn new(
        sizes: &SystemSizes,
        params: &SystemParameters,
        limits: TemperatureLimits,
    ) -> Result<Self, InvalidInputError> {
        let tank_params = params.get(ComponentKind::GasTank)?;
        let tanks = sizes
            .households
            .iter()
            .map(|household| GasTank::from_parameters(household.gas_tank_volume, tank_params, &limits))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { tanks })
    }
}

impl HourlySystem for GasTankSystem {
    type State = ();

    fn system_type(&self) -> SystemType {
        SystemType::GasTank
    }

    fn initial_state(&self, _temp_mains: f64) -> Self::State {}

    fn step(
        &self,
        _state: &(),
        drivers: &SystemDrivers,
    ) -> Result<((), HourlyResults), StepFailure> {
        let mut results = HourlyResults::default();
        push_weather_results(&mut results, &drivers.weather);

        let mut heat_delivered = 0.;
        let mut gas_use = 0.;
        for (index, tank) in self.tanks.iter().enumerate() {
            let (_, outputs) = run_step(
                ComponentKind::GasTank,
                tank,
                &(),
                &GasTankDrivers {
                    volume_draw: drivers.household_draw(index),
                    temp_feed: drivers.weather.temp_water_mains,
                },
            )?;
            heat_delivered += outputs.heat_delivered;
            gas_use += outputs.gas_use;
            results.households.push(household_results(
                outputs.heat_delivered,
                outputs.heat_delivered,
                0.,
                outputs.gas_use,
                0.,
            ));
        }

        results.push(ResultLabel::Demand, heat_delivered);
        results.push(ResultLabel::BackupHeatDelivered, heat_delivered);
        results.push(ResultLabel::BackupGasUse, gas_use);
        results.push(ResultLabel::GridElectricityUse, 0.);
        results.push(ResultLabel::SolarFraction, 0.);

        Ok(((), results))
    }

    fn solar_fraction(&self, _results: &ResultSeries) -> f64 {
        0.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::water_heat_demand::load_profile::{HouseholdLoad, LoadProfile};
    use crate::input::{CommunityLayout, Household};
    use crate::results::HouseholdLabel;
    use crate::sizing::{size_system, SizingRules};
    use crate::weather::HourlyWeather;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn loads() -> LoadProfile {
        LoadProfile::new(vec![
            HouseholdLoad {
                id: "flat-1".into(),
                occupancy: 2,
                hourly_draw: vec![0., 0.02],
            },
            HouseholdLoad {
                id: "flat-2".into(),
                occupancy: 4,
                hourly_draw: vec![0., 0.04],
            },
        ])
    }

    #[fixture]
    fn system(loads: LoadProfile) -> GasTankSystem {
        let households: Vec<Household> = loads
            .households()
            .iter()
            .map(|load| Household {
                id: load.id.clone(),
                occupancy: load.occupancy,
                at_home: false,
            })
            .collect();
        let peaks: Vec<f64> = loads.households().iter().map(|load| load.peak_draw()).collect();
        let sizes = size_system(
            &households,
            &peaks,
            1.,
            CommunityLayout::Attached,
            SystemType::GasTank,
            &SizingRules::default(),
        )
        .unwrap();
        let params = SystemParameters::from_iter([(
            ComponentKind::GasTank,
            ComponentKind::GasTank.default_parameters(),
        )]);
        GasTankSystem::new(&sizes, &params, TemperatureLimits::default()).unwrap()
    }

    fn weather() -> HourlyWeather {
        HourlyWeather {
            temp_dry_bulb: 288.,
            temp_wet_bulb: 283.,
            temp_water_mains: 290.,
            irradiance: 0.,
        }
    }

    #[rstest]
    fn should_meet_demand_entirely_with_gas(system: GasTankSystem, loads: LoadProfile) {
        let drivers = SystemDrivers {
            hour: 1,
            weather: weather(),
            loads: &loads,
        };
        let ((), results) = system.step(&(), &drivers).unwrap();

        let demand = results.get(ResultLabel::Demand).unwrap();
        assert!(demand > 0.);
        assert_eq!(results.get(ResultLabel::BackupHeatDelivered), Some(demand));
        assert!(results.get(ResultLabel::BackupGasUse).unwrap() > demand);
        assert_eq!(results.get(ResultLabel::SolarFraction), Some(0.));

        let household_heat: Vec<f64> = results
            .households
            .iter()
            .map(|household| {
                household
                    .iter()
                    .find(|(label, _)| *label == HouseholdLabel::Demand)
                    .map(|(_, value)| *value)
                    .unwrap()
            })
            .collect();
        assert_relative_eq!(household_heat[1], 2. * household_heat[0], max_relative = 1e-9);
    }

    #[rstest]
    fn should_burn_gas_for_standby_losses_without_draw(system: GasTankSystem, loads: LoadProfile) {
        let drivers = SystemDrivers {
            hour: 0,
            weather: weather(),
            loads: &loads,
        };
        let ((), results) = system.step(&(), &drivers).unwrap();
        assert_eq!(results.get(ResultLabel::Demand), Some(0.));
        assert!(results.get(ResultLabel::BackupGasUse).unwrap() > 0.);
    }
}
