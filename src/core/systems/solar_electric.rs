//! Photovoltaic panel supplying a heat pump that charges a shared storage tank, with an electric
//! resistance backup in every household. PV power goes to the heat pump first, then to the
//! backup heaters, then to the distribution pump; whatever is left is surplus.
use crate::core::component::{run_step, ComponentKind, StepFailure};
use crate::core::converters::heat_pump::{HeatPump, HeatPumpControlState, HeatPumpDrivers};
use crate::core::converters::heater::InstantaneousHeater;
use crate::core::converters::photovoltaic::{PanelRating, PhotovoltaicPanel};
use crate::core::distribution::piping::Piping;
use crate::core::distribution::pump::Pump;
use crate::core::storage::thermal_tank::{TankDrivers, TankState, ThermalTank};
use crate::core::storage::TemperatureLimits;
use crate::core::systems::backup::InstantaneousBackup;
use crate::core::systems::{
    annual_sum, household_results, occupancy_shares, push_tank_results, push_weather_results,
    HourlySystem, SystemDrivers, SystemParameters,
};
use crate::errors::InvalidInputError;
use crate::input::{Project, SystemType};
use crate::results::{HourlyResults, ResultLabel, ResultSeries};
use crate::sizing::SystemSizes;
use itertools::izip;
use tracing::warn;

#[derive(Clone, Debug)]
pub struct SolarElectricSystem {
    heat_pump: HeatPump,
    panel: PhotovoltaicPanel,
    tank: ThermalTank,
    backup: InstantaneousBackup,
    distribution_pump: Option<Pump>,
    occupancy_shares: Vec<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolarElectricState {
    pub tank: TankState,
    pub heat_pump: HeatPumpControlState,
}

/// How the hour's PV output is shared out, in W.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct PvAllocation {
    to_heat_pump: f64,
    after_heat_pump: f64,
    to_backup: f64,
    to_pump: f64,
    surplus: f64,
}

impl PvAllocation {
    fn new(pv_power: f64, heat_pump_use: f64, backup_use: f64, pump_use: f64) -> Self {
        let to_heat_pump = heat_pump_use.min(pv_power);
        let after_heat_pump = (pv_power - heat_pump_use).max(0.);
        let after_backup = (after_heat_pump - backup_use).max(0.);
        let to_pump = pump_use.min(after_backup);

        Self {
            to_heat_pump,
            after_heat_pump,
            to_backup: after_heat_pump - after_backup,
            to_pump,
            surplus: after_backup - to_pump,
        }
    }
}

/// Share of a heat flow credited to PV, given the share of the electricity behind it that PV
/// supplied.
fn pv_share(heat: f64, pv_supplied: f64, electricity_use: f64) -> f64 {
    if electricity_use > 0. {
        heat * pv_supplied / electricity_use
    } else {
        0.
    }
}

impl SolarElectricSystem {
    pub fn new(
        project: &Project,
        sizes: &SystemSizes,
        params: &SystemParameters,
        limits: TemperatureLimits,
    ) -> Result<Self, InvalidInputError> {
        let heat_pump =
            HeatPump::from_parameters(sizes.heat_pump_capacity, params.get(ComponentKind::HeatPump)?)?;
        let panel = PhotovoltaicPanel::from_parameters(
            PanelRating::Area(sizes.pv_area),
            params.get(ComponentKind::PhotovoltaicPanel)?,
        )?;
        let piping = Piping::from_parameters(sizes.piping_length, params.get(ComponentKind::Piping)?)?;
        let tank = ThermalTank::from_parameters(
            ComponentKind::HeatPumpTank,
            sizes.heat_pump_tank_volume,
            params.get(ComponentKind::HeatPumpTank)?,
            limits,
            piping,
        )?;
        let resistance_params = params.get(ComponentKind::ElectricResistance)?;
        let backup = InstantaneousBackup::new(
            sizes
                .households
                .iter()
                .map(|household| {
                    InstantaneousHeater::electric_resistance(
                        Some(household.electric_resistance_power),
                        resistance_params,
                    )
                })
                .collect::<Result<Vec<_>, _>>()?,
        );
        let distribution_pump = if project.is_community() {
            Some(Pump::from_parameters(
                ComponentKind::DistributionPump,
                sizes.distribution_pump_power,
                params.get(ComponentKind::DistributionPump)?,
            )?)
        } else {
            None
        };
        let occupancies: Vec<u32> = sizes.households.iter().map(|h| h.occupancy).collect();

        Ok(Self {
            heat_pump,
            panel,
            tank,
            backup,
            distribution_pump,
            occupancy_shares: occupancy_shares(&occupancies),
        })
    }
}

impl HourlySystem for SolarElectricSystem {
    type State = SolarElectricState;

    fn system_type(&self) -> SystemType {
        SystemType::SolarElectric
    }

    fn initial_state(&self, temp_mains: f64) -> SolarElectricState {
        SolarElectricState {
            tank: TankState::uniform(temp_mains, self.tank.limits()),
            heat_pump: HeatPumpControlState::default(),
        }
    }

    fn step(
        &self,
        state: &SolarElectricState,
        drivers: &SystemDrivers,
    ) -> Result<(SolarElectricState, HourlyResults), StepFailure> {
        let weather = &drivers.weather;

        let (heat_pump_state, heat_pump) = run_step(
            ComponentKind::HeatPump,
            &self.heat_pump,
            &state.heat_pump,
            &HeatPumpDrivers {
                temp_wet_bulb: weather.temp_wet_bulb,
                temp_tank: state.tank.temp_upper,
                temp_limit: self.tank.max_temp(),
            },
        )?;
        let (_, panel) = run_step(
            ComponentKind::PhotovoltaicPanel,
            &self.panel,
            &(),
            &weather.irradiance,
        )?;

        let (tank_state, tank) = run_step(
            self.tank.kind(),
            &self.tank,
            &state.tank,
            &TankDrivers {
                temp_ambient: weather.temp_dry_bulb,
                temp_feed: weather.temp_water_mains,
                volume_draw: drivers.total_draw(),
                max_volume_draw: drivers.loads.max_total_draw(),
                heat_in: heat_pump.heat_capacity,
            },
        )?;

        let load_ratios = drivers.load_ratios();
        let backup = self.backup.cover(tank.unmet, &load_ratios)?;
        let backup_use = backup.total_energy_use();

        let distribution_pump = match &self.distribution_pump {
            Some(pump) => run_step(pump.kind(), pump, &(), &tank.flow_on_fraction)?.1,
            None => Default::default(),
        };

        let pv = PvAllocation::new(
            panel.ac,
            heat_pump.electricity_use,
            backup_use,
            distribution_pump.electricity_use,
        );
        let heat_pump_grid = heat_pump.electricity_use - pv.to_heat_pump;
        let pump_grid = distribution_pump.electricity_use - pv.to_pump;
        // PV left after the heat pump is offered to each household's backup by load ratio
        let backup_grid: Vec<f64> = backup
            .energy_use
            .iter()
            .zip(&load_ratios)
            .map(|(gross, ratio)| (gross - pv.after_heat_pump * ratio).max(0.))
            .collect();
        let backup_grid_total: f64 = backup_grid.iter().sum();

        let backup_heat = backup.total_heat_delivered();
        let solar_fraction = if tank.demand > 0. {
            ((pv_share(heat_pump.heat_capacity, pv.to_heat_pump, heat_pump.electricity_use)
                + pv_share(backup_heat, pv.to_backup, backup_use))
                / tank.demand)
                .clamp(0., 1.)
        } else {
            0.
        };

        let mut results = HourlyResults::default();
        push_weather_results(&mut results, weather);
        results.push(ResultLabel::Irradiance, weather.irradiance);
        results.push(ResultLabel::HeatPumpHeat, heat_pump.heat_capacity);
        results.push(ResultLabel::HeatPumpElectricityUse, heat_pump.electricity_use);
        results.push(ResultLabel::PvPower, panel.ac);
        results.push(ResultLabel::PvToHeatPump, pv.to_heat_pump);
        results.push(ResultLabel::PvAfterHeatPump, pv.after_heat_pump);
        results.push(ResultLabel::PvToBackup, pv.to_backup);
        results.push(ResultLabel::PvSurplus, pv.surplus);
        push_tank_results(&mut results, &tank);
        results.push(ResultLabel::BackupHeatDelivered, backup_heat);
        results.push(ResultLabel::BackupElectricityUse, backup_use);
        results.push(ResultLabel::BackupGridElectricityUse, backup_grid_total);
        results.push(
            ResultLabel::DistributionPumpElectricityUse,
            distribution_pump.electricity_use,
        );
        results.push(
            ResultLabel::DistributionPumpOnFraction,
            distribution_pump.on_fraction,
        );
        results.push(
            ResultLabel::GridElectricityUse,
            heat_pump_grid + backup_grid_total + pump_grid,
        );
        results.push(ResultLabel::SolarFraction, solar_fraction);

        let shared_grid = heat_pump_grid + pump_grid;
        for (ratio, share, heat_delivered, heat_unmet, grid) in izip!(
            &load_ratios,
            &self.occupancy_shares,
            &backup.heat_delivered,
            &backup.heat_unmet,
            &backup_grid
        ) {
            results.households.push(household_results(
                ratio * tank.demand,
                *heat_delivered,
                *heat_unmet,
                0.,
                grid + share * shared_grid,
            ));
        }

        Ok((
            SolarElectricState {
                tank: tank_state,
                heat_pump: heat_pump_state,
            },
            results,
        ))
    }

    /// Heat pump and backup heat, each credited with the share of its electricity that PV
    /// supplied over the year, as a fraction of the annual demand.
    fn solar_fraction(&self, results: &ResultSeries) -> f64 {
        let demand = annual_sum(results, ResultLabel::Demand);
        if demand <= 0. {
            warn!("no hot water demand over the year, solar fraction is reported as 0");
            return 0.;
        }
        let heat_pump_use = annual_sum(results, ResultLabel::HeatPumpElectricityUse);
        let backup_use = annual_sum(results, ResultLabel::BackupElectricityUse);
        if heat_pump_use <= 0. {
            warn!("heat pump used no electricity over the year");
        }
        if backup_use <= 0. {
            warn!("backup heaters used no electricity over the year");
        }

        (pv_share(
            annual_sum(results, ResultLabel::HeatPumpHeat),
            annual_sum(results, ResultLabel::PvToHeatPump),
            heat_pump_use,
        ) + pv_share(
            annual_sum(results, ResultLabel::BackupHeatDelivered),
            annual_sum(results, ResultLabel::PvToBackup),
            backup_use,
        )) / demand
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::water_heat_demand::load_profile::{HouseholdLoad, LoadProfile};
    use crate::input::{CommunityLayout, Household};
    use crate::results::HouseholdLabel;
    use crate::sizing::{size_system, SizingRules};
    use crate::weather::{ClimateZone, HourlyWeather};
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use strum::IntoEnumIterator;

    fn loads(draws: &[(u32, f64)]) -> LoadProfile {
        LoadProfile::new(
            draws
                .iter()
                .enumerate()
                .map(|(index, (occupancy, draw))| HouseholdLoad {
                    id: format!("unit-{index}").as_str().into(),
                    occupancy: *occupancy,
                    hourly_draw: vec![*draw, 0.01],
                })
                .collect(),
        )
    }

    fn system(loads: &LoadProfile) -> SolarElectricSystem {
        let project = Project {
            climate_zone: ClimateZone::new(12).unwrap(),
            households: loads
                .households()
                .iter()
                .map(|load| Household {
                    id: load.id.clone(),
                    occupancy: load.occupancy,
                    at_home: true,
                })
                .collect(),
            scale: 1.,
            layout: CommunityLayout::Detached,
        };
        let peaks: Vec<f64> = loads.households().iter().map(|l| l.peak_draw()).collect();
        let sizes = size_system(
            &project.households,
            &peaks,
            project.scale,
            project.layout,
            SystemType::SolarElectric,
            &SizingRules::default(),
        )
        .unwrap();
        let params: SystemParameters = ComponentKind::iter()
            .map(|kind| (kind, kind.default_parameters()))
            .collect();

        SolarElectricSystem::new(&project, &sizes, &params, TemperatureLimits::default()).unwrap()
    }

    fn weather(irradiance: f64) -> HourlyWeather {
        HourlyWeather {
            temp_dry_bulb: 293.,
            temp_wet_bulb: 288.,
            temp_water_mains: 290.,
            irradiance,
        }
    }

    #[rstest]
    #[case(5000., 1000., 1500., 100., PvAllocation { to_heat_pump: 1000., after_heat_pump: 4000., to_backup: 1500., to_pump: 100., surplus: 2400. })]
    #[case(1200., 1000., 1500., 100., PvAllocation { to_heat_pump: 1000., after_heat_pump: 200., to_backup: 200., to_pump: 0., surplus: 0. })]
    #[case(600., 1000., 1500., 100., PvAllocation { to_heat_pump: 600., after_heat_pump: 0., to_backup: 0., to_pump: 0., surplus: 0. })]
    #[case(2550., 1000., 1500., 100., PvAllocation { to_heat_pump: 1000., after_heat_pump: 1550., to_backup: 1500., to_pump: 50., surplus: 0. })]
    fn should_allocate_pv_in_priority_order(
        #[case] pv_power: f64,
        #[case] heat_pump_use: f64,
        #[case] backup_use: f64,
        #[case] pump_use: f64,
        #[case] expected: PvAllocation,
    ) {
        assert_eq!(
            PvAllocation::new(pv_power, heat_pump_use, backup_use, pump_use),
            expected
        );
    }

    #[rstest]
    fn should_run_heat_pump_on_pv_in_sunshine() {
        let loads = loads(&[(3, 0.)]);
        let system = system(&loads);
        let drivers = SystemDrivers {
            hour: 0,
            weather: weather(900.),
            loads: &loads,
        };
        let state = system.initial_state(290.);
        let (next, results) = system.step(&state, &drivers).unwrap();

        let heat_pump_use = results.get(ResultLabel::HeatPumpElectricityUse).unwrap();
        let pv = results.get(ResultLabel::PvPower).unwrap();
        assert!(heat_pump_use > 0.);
        assert!(pv > 0.);
        assert_relative_eq!(
            results.get(ResultLabel::PvToHeatPump).unwrap(),
            heat_pump_use.min(pv)
        );
        assert_relative_eq!(
            results.get(ResultLabel::GridElectricityUse).unwrap(),
            (heat_pump_use - pv).max(0.),
            epsilon = 1e-9
        );
        assert!(next.tank.temp_upper > state.tank.temp_upper);
        assert!(next.heat_pump.on);
    }

    #[rstest]
    fn should_draw_backup_from_grid_at_night() {
        let loads = loads(&[(3, 0.02)]);
        let system = system(&loads);
        let drivers = SystemDrivers {
            hour: 0,
            weather: weather(0.),
            loads: &loads,
        };
        let state = SolarElectricState {
            tank: TankState {
                temp_upper: 290.,
                temp_lower: 290.,
            },
            heat_pump: HeatPumpControlState { on: false },
        };
        let (_, results) = system.step(&state, &drivers).unwrap();

        let backup_use = results.get(ResultLabel::BackupElectricityUse).unwrap();
        assert!(results.get(ResultLabel::BackupHeatDelivered).unwrap() > 0.);
        assert_eq!(results.get(ResultLabel::PvToBackup), Some(0.));
        assert_relative_eq!(
            results.get(ResultLabel::BackupGridElectricityUse).unwrap(),
            backup_use
        );
        assert_eq!(results.get(ResultLabel::SolarFraction).map(|f| f < 0.5), Some(true));
    }

    #[rstest]
    fn should_split_shared_electricity_by_occupancy() {
        let loads = loads(&[(2, 0.01), (2, 0.01)]);
        let system = system(&loads);
        let drivers = SystemDrivers {
            hour: 0,
            weather: weather(0.),
            loads: &loads,
        };
        let (_, results) = system.step(&system.initial_state(290.), &drivers).unwrap();

        let household_total: f64 = results
            .households
            .iter()
            .flat_map(|household| household.iter())
            .filter(|(label, _)| *label == HouseholdLabel::ElectricityUse)
            .map(|(_, value)| value)
            .sum();
        assert_relative_eq!(
            household_total,
            results.get(ResultLabel::GridElectricityUse).unwrap(),
            max_relative = 1e-9
        );
    }

    #[rstest]
    fn should_credit_pv_share_of_heat_in_annual_solar_fraction() {
        let loads = loads(&[(3, 0.01)]);
        let system = system(&loads);
        let mut series = ResultSeries::new(vec!["unit-0".into()]);
        let mut hour = HourlyResults::default();
        hour.push(ResultLabel::Demand, 1000.);
        hour.push(ResultLabel::HeatPumpHeat, 800.);
        hour.push(ResultLabel::HeatPumpElectricityUse, 400.);
        hour.push(ResultLabel::PvToHeatPump, 200.);
        hour.push(ResultLabel::BackupHeatDelivered, 200.);
        hour.push(ResultLabel::BackupElectricityUse, 200.);
        hour.push(ResultLabel::PvToBackup, 100.);
        series.append(hour);

        // (800 * 0.5 + 200 * 0.5) / 1000
        assert_relative_eq!(system.solar_fraction(&series), 0.5);
    }
}
