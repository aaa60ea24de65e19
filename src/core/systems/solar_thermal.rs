//! Solar collector heating a shared storage tank through a coil, with a gas backup in every
//! household.
use crate::core::component::{run_step, ComponentKind, StepFailure};
use crate::core::converters::heater::InstantaneousHeater;
use crate::core::converters::solar_collector::{CollectorDrivers, SolarCollector};
use crate::core::distribution::piping::Piping;
use crate::core::distribution::pump::Pump;
use crate::core::storage::gas_tank::GasTank;
use crate::core::storage::thermal_tank::{TankDrivers, TankState, ThermalTank};
use crate::core::storage::TemperatureLimits;
use crate::core::systems::backup::{BackupOutputs, InstantaneousBackup, StorageBackup};
use crate::core::systems::{
    annual_sum, household_results, hourly_solar_fraction, occupancy_shares, push_tank_results,
    push_weather_results, HourlySystem, SystemDrivers, SystemParameters,
};
use crate::errors::InvalidInputError;
use crate::input::{Installation, Project, SystemConfiguration, SystemType};
use crate::results::{HourlyResults, ResultLabel, ResultSeries};
use crate::sizing::SystemSizes;
use itertools::izip;
use tracing::warn;

#[derive(Clone, Debug)]
enum GasBackup {
    Tankless(InstantaneousBackup),
    Storage(StorageBackup),
}

#[derive(Clone, Debug)]
pub struct SolarThermalSystem {
    collector: SolarCollector,
    tank: ThermalTank,
    solar_pump: Pump,
    distribution_pump: Option<Pump>,
    backup: GasBackup,
    occupancy_shares: Vec<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolarThermalState {
    pub tank: TankState,
    /// temperature of the water returning from the coil to the collector, in K
    pub temp_coil_out: f64,
}

impl SolarThermalSystem {
    pub fn new(
        config: &SystemConfiguration,
        project: &Project,
        sizes: &SystemSizes,
        params: &SystemParameters,
        limits: TemperatureLimits,
    ) -> Result<Self, InvalidInputError> {
        let collector = SolarCollector::from_parameters(
            config.collector_model,
            sizes.collector_area,
            params.get(ComponentKind::SolarCollector)?,
        )?;
        let piping = Piping::from_parameters(sizes.piping_length, params.get(ComponentKind::Piping)?)?;
        let tank = ThermalTank::from_parameters(
            ComponentKind::SolarThermalTank,
            sizes.solar_tank_volume,
            params.get(ComponentKind::SolarThermalTank)?,
            limits,
            piping,
        )?;
        let solar_pump = Pump::from_parameters(
            ComponentKind::SolarPump,
            sizes.solar_pump_power,
            params.get(ComponentKind::SolarPump)?,
        )?;
        let distribution_pump = if project.is_community() {
            Some(Pump::from_parameters(
                ComponentKind::DistributionPump,
                sizes.distribution_pump_power,
                params.get(ComponentKind::DistributionPump)?,
            )?)
        } else {
            None
        };

        let backup = match config.installation {
            Installation::New => {
                let burner_params = params.get(ComponentKind::GasBurner)?;
                GasBackup::Tankless(InstantaneousBackup::new(
                    sizes
                        .households
                        .iter()
                        .map(|household| {
                            InstantaneousHeater::gas_burner(
                                Some(household.gas_burner_power),
                                burner_params,
                            )
                        })
                        .collect::<Result<Vec<_>, _>>()?,
                ))
            }
            Installation::Retrofit => {
                let tank_params = params.get(ComponentKind::GasTank)?;
                GasBackup::Storage(StorageBackup::new(
                    sizes
                        .households
                        .iter()
                        .map(|household| {
                            GasTank::from_parameters(household.gas_tank_volume, tank_params, &limits)
                        })
                        .collect::<Result<Vec<_>, _>>()?,
                ))
            }
        };

        let occupancies: Vec<u32> = sizes.households.iter().map(|h| h.occupancy).collect();

        Ok(Self {
            collector,
            tank,
            solar_pump,
            distribution_pump,
            backup,
            occupancy_shares: occupancy_shares(&occupancies),
        })
    }
}

impl HourlySystem for SolarThermalSystem {
    type State = SolarThermalState;

    fn system_type(&self) -> SystemType {
        SystemType::SolarThermal
    }

    fn initial_state(&self, temp_mains: f64) -> SolarThermalState {
        let tank = TankState::uniform(temp_mains, self.tank.limits());
        SolarThermalState {
            temp_coil_out: tank.temp_lower,
            tank,
        }
    }

    fn step(
        &self,
        state: &SolarThermalState,
        drivers: &SystemDrivers,
    ) -> Result<(SolarThermalState, HourlyResults), StepFailure> {
        let weather = &drivers.weather;

        let (_, collector) = run_step(
            ComponentKind::SolarCollector,
            &self.collector,
            &(),
            &CollectorDrivers {
                temp_inlet: state.temp_coil_out,
                temp_ambient: weather.temp_dry_bulb,
                irradiance: weather.irradiance,
            },
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
                heat_in: collector.gain,
            },
        )?;

        let load_ratios = drivers.load_ratios();
        let (backup, backup_no_dist_loss): (BackupOutputs, BackupOutputs) = match &self.backup {
            GasBackup::Tankless(burners) => (
                burners.cover(tank.unmet, &load_ratios)?,
                burners.cover_without_distribution_loss(tank.unmet, tank.dist_loss, &load_ratios)?,
            ),
            GasBackup::Storage(tanks) => {
                let draws: Vec<f64> = (0..load_ratios.len())
                    .map(|index| drivers.household_draw(index))
                    .collect();
                (
                    tanks.heat(&draws, state.tank.temp_upper - tank.dist_temp_drop)?,
                    tanks.heat(&draws, state.tank.temp_upper)?,
                )
            }
        };

        let solar_pump_on = if collector.gain > 0. { 1. } else { 0. };
        let (_, solar_pump) = run_step(
            self.solar_pump.kind(),
            &self.solar_pump,
            &(),
            &solar_pump_on,
        )?;
        let distribution_pump = match &self.distribution_pump {
            Some(pump) => run_step(pump.kind(), pump, &(), &tank.flow_on_fraction)?.1,
            None => Default::default(),
        };
        let pump_electricity = solar_pump.electricity_use + distribution_pump.electricity_use;

        let backup_heat = backup.total_heat_delivered();

        let mut results = HourlyResults::default();
        push_weather_results(&mut results, weather);
        results.push(ResultLabel::Irradiance, weather.irradiance);
        results.push(ResultLabel::CollectorGain, collector.gain);
        push_tank_results(&mut results, &tank);
        results.push(ResultLabel::CoilOutletTemperature, tank.temp_coil_out);
        results.push(ResultLabel::BackupHeatDelivered, backup_heat);
        results.push(
            ResultLabel::BackupHeatDeliveredNoDistributionLoss,
            backup_no_dist_loss.total_heat_delivered(),
        );
        results.push(ResultLabel::BackupGasUse, backup.total_energy_use());
        results.push(
            ResultLabel::BackupGasUseNoDistributionLoss,
            backup_no_dist_loss.total_energy_use(),
        );
        results.push(
            ResultLabel::SolarPumpElectricityUse,
            solar_pump.electricity_use,
        );
        results.push(ResultLabel::SolarPumpOnFraction, solar_pump.on_fraction);
        results.push(
            ResultLabel::DistributionPumpElectricityUse,
            distribution_pump.electricity_use,
        );
        results.push(
            ResultLabel::DistributionPumpOnFraction,
            distribution_pump.on_fraction,
        );
        results.push(ResultLabel::GridElectricityUse, pump_electricity);
        results.push(
            ResultLabel::SolarFraction,
            hourly_solar_fraction(tank.demand, backup_heat),
        );

        for (ratio, share, heat_delivered, heat_unmet, gas_use) in izip!(
            &load_ratios,
            &self.occupancy_shares,
            &backup.heat_delivered,
            &backup.heat_unmet,
            &backup.energy_use
        ) {
            results.households.push(household_results(
                ratio * tank.demand,
                *heat_delivered,
                *heat_unmet,
                *gas_use,
                share * pump_electricity,
            ));
        }

        Ok((
            SolarThermalState {
                tank: tank_state,
                temp_coil_out: tank.temp_coil_out,
            },
            results,
        ))
    }

    fn solar_fraction(&self, results: &ResultSeries) -> f64 {
        let demand = annual_sum(results, ResultLabel::Demand);
        if demand <= 0. {
            warn!("no hot water demand over the year, solar fraction is reported as 0");
            return 0.;
        }
        (demand - annual_sum(results, ResultLabel::BackupHeatDelivered)) / demand
    }
}
