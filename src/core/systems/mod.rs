//! The supported system topologies, each composed from component models with a fixed per-hour
//! call order: sources, primary storage, backup, then distribution and loss accounting.
pub mod backup;
pub mod gas_tank;
pub mod solar_electric;
pub mod solar_thermal;

use crate::core::component::{ComponentKind, ComponentParameters, StepFailure};
use crate::core::storage::thermal_tank::TankOutputs;
use crate::core::water_heat_demand::load_profile::LoadProfile;
use crate::errors::InvalidInputError;
use crate::input::{Installation, SystemType};
use crate::results::{HouseholdLabel, HourlyResults, ResultLabel, ResultSeries};
use crate::weather::HourlyWeather;
use indexmap::IndexMap;

impl SystemType {
    /// Component kinds whose performance parameters a system of this type needs. Only the
    /// solar thermal backup depends on the installation.
    pub fn component_kinds(&self, installation: Installation) -> &'static [ComponentKind] {
        match (self, installation) {
            (SystemType::GasTank, _) => &[ComponentKind::GasTank],
            (SystemType::SolarThermal, Installation::New) => &[
                ComponentKind::SolarCollector,
                ComponentKind::SolarThermalTank,
                ComponentKind::Piping,
                ComponentKind::SolarPump,
                ComponentKind::DistributionPump,
                ComponentKind::GasBurner,
            ],
            (SystemType::SolarThermal, Installation::Retrofit) => &[
                ComponentKind::SolarCollector,
                ComponentKind::SolarThermalTank,
                ComponentKind::Piping,
                ComponentKind::SolarPump,
                ComponentKind::DistributionPump,
                ComponentKind::GasTank,
            ],
            (SystemType::SolarElectric, _) => &[
                ComponentKind::PhotovoltaicPanel,
                ComponentKind::HeatPump,
                ComponentKind::HeatPumpTank,
                ComponentKind::Piping,
                ComponentKind::DistributionPump,
                ComponentKind::ElectricResistance,
            ],
        }
    }
}

/// Performance parameters for every component kind in a system.
#[derive(Clone, Debug, Default)]
pub struct SystemParameters(IndexMap<ComponentKind, ComponentParameters>);

impl SystemParameters {
    pub fn insert(&mut self, kind: ComponentKind, params: ComponentParameters) {
        self.0.insert(kind, params);
    }

    pub fn get(&self, kind: ComponentKind) -> Result<&ComponentParameters, InvalidInputError> {
        self.0.get(&kind).ok_or_else(|| {
            InvalidInputError::InvalidConfiguration(format!(
                "no performance parameters were provided for {kind}"
            ))
        })
    }
}

impl FromIterator<(ComponentKind, ComponentParameters)> for SystemParameters {
    fn from_iter<T: IntoIterator<Item = (ComponentKind, ComponentParameters)>>(iter: T) -> Self {
        Self(IndexMap::from_iter(iter))
    }
}

/// Inputs to a single hour of a system step.
pub struct SystemDrivers<'a> {
    pub hour: usize,
    pub weather: HourlyWeather,
    pub loads: &'a LoadProfile,
}

impl SystemDrivers<'_> {
    pub fn total_draw(&self) -> f64 {
        self.loads.total_draw()[self.hour]
    }

    pub fn household_draw(&self, index: usize) -> f64 {
        self.loads.households()[index].hourly_draw[self.hour]
    }

    pub fn load_ratios(&self) -> Vec<f64> {
        self.loads.load_ratios(self.hour)
    }
}

/// Share of a project level quantity assigned to each household in proportion to occupancy.
pub(crate) fn occupancy_shares(occupancies: &[u32]) -> Vec<f64> {
    let total: u32 = occupancies.iter().sum();
    occupancies
        .iter()
        .map(|occupancy| {
            if total > 0 {
                *occupancy as f64 / total as f64
            } else {
                0.
            }
        })
        .collect()
}

pub(crate) fn push_weather_results(results: &mut HourlyResults, weather: &HourlyWeather) {
    results.push(ResultLabel::AmbientTemperature, weather.temp_dry_bulb);
    results.push(ResultLabel::WaterMainsTemperature, weather.temp_water_mains);
}

pub(crate) fn push_tank_results(results: &mut HourlyResults, tank: &TankOutputs) {
    results.push(ResultLabel::Demand, tank.demand);
    results.push(
        ResultLabel::DemandWithDistributionLoss,
        tank.demand_with_dist_loss,
    );
    results.push(ResultLabel::TankHeatIn, tank.heat_in_net);
    results.push(ResultLabel::TankHeatDelivered, tank.delivered);
    results.push(ResultLabel::TankHeatUnmet, tank.unmet);
    results.push(ResultLabel::TankHeatLoss, tank.loss_upper + tank.loss_lower);
    results.push(ResultLabel::TankHeatDumped, tank.dumped);
    results.push(ResultLabel::TankOvercool, tank.overcool);
    results.push(ResultLabel::TankUpperTemperature, tank.temp_upper);
    results.push(ResultLabel::TankLowerTemperature, tank.temp_lower);
    results.push(ResultLabel::DistributionHeatLoss, tank.dist_loss);
    results.push(ResultLabel::DistributionTemperatureDrop, tank.dist_temp_drop);
}

/// Fraction of the demand not covered by backup, or 0 in hours without demand.
pub(crate) fn hourly_solar_fraction(demand: f64, backup_heat: f64) -> f64 {
    if demand > 0. {
        ((demand - backup_heat) / demand).clamp(0., 1.)
    } else {
        0.
    }
}

/// Per household results shared by every topology.
pub(crate) fn household_results(
    demand: f64,
    backup_heat: f64,
    unmet: f64,
    gas_use: f64,
    electricity_use: f64,
) -> Vec<(HouseholdLabel, f64)> {
    vec![
        (HouseholdLabel::Demand, demand),
        (HouseholdLabel::BackupHeat, backup_heat),
        (HouseholdLabel::Unmet, unmet),
        (HouseholdLabel::GasUse, gas_use),
        (HouseholdLabel::ElectricityUse, electricity_use),
    ]
}

fn annual_sum(results: &ResultSeries, label: ResultLabel) -> f64 {
    results
        .get(label)
        .map(|values| values.iter().sum())
        .unwrap_or(0.)
}

/// A system topology stepped hourly through the year.
pub trait HourlySystem {
    type State: Clone + std::fmt::Debug + PartialEq;

    fn system_type(&self) -> SystemType;

    /// State at the start of the first hour, given the first hour's mains temperature in K.
    fn initial_state(&self, temp_mains: f64) -> Self::State;

    fn step(
        &self,
        state: &Self::State,
        drivers: &SystemDrivers,
    ) -> Result<(Self::State, HourlyResults), StepFailure>;

    /// Annual solar fraction of a completed run.
    fn solar_fraction(&self, results: &ResultSeries) -> f64;
}
