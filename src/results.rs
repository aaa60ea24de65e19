//! Hourly result series and the annual summaries reduced from them.
use crate::input::{KeyString, SystemType};
use crate::simulation_time::SimulationTime;
use crate::statistics::{conditional_mean, percentile};
use indexmap::IndexMap;
use serde::Serialize;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};
use tracing::warn;

/// Relative error of the annual solar tank balance above which a warning is logged.
const TANK_BALANCE_WARNING_LIMIT: f64 = 0.01;

#[derive(
    Clone, Copy, Debug, Display, EnumIter, EnumString, Eq, Hash, IntoStaticStr, PartialEq, Serialize,
)]
pub enum ResultLabel {
    #[strum(serialize = "Ambient temperature")]
    AmbientTemperature,
    #[strum(serialize = "Water mains temperature")]
    WaterMainsTemperature,
    #[strum(serialize = "Collector plane irradiance")]
    Irradiance,
    #[strum(serialize = "Hot water heat demand")]
    Demand,
    #[strum(serialize = "Hot water heat demand with distribution loss")]
    DemandWithDistributionLoss,
    #[strum(serialize = "Collector heat gain")]
    CollectorGain,
    #[strum(serialize = "Tank heat input")]
    TankHeatIn,
    #[strum(serialize = "Tank heat delivered")]
    TankHeatDelivered,
    #[strum(serialize = "Tank heat unmet")]
    TankHeatUnmet,
    #[strum(serialize = "Tank heat loss")]
    TankHeatLoss,
    #[strum(serialize = "Tank heat dumped")]
    TankHeatDumped,
    #[strum(serialize = "Tank overcooling correction")]
    TankOvercool,
    #[strum(serialize = "Tank upper volume temperature")]
    TankUpperTemperature,
    #[strum(serialize = "Tank lower volume temperature")]
    TankLowerTemperature,
    #[strum(serialize = "Coil outlet temperature")]
    CoilOutletTemperature,
    #[strum(serialize = "Distribution heat loss")]
    DistributionHeatLoss,
    #[strum(serialize = "Distribution temperature drop")]
    DistributionTemperatureDrop,
    #[strum(serialize = "Backup heat delivered")]
    BackupHeatDelivered,
    #[strum(serialize = "Backup heat delivered without distribution loss")]
    BackupHeatDeliveredNoDistributionLoss,
    #[strum(serialize = "Backup gas use")]
    BackupGasUse,
    #[strum(serialize = "Backup gas use without distribution loss")]
    BackupGasUseNoDistributionLoss,
    #[strum(serialize = "Backup electricity use")]
    BackupElectricityUse,
    #[strum(serialize = "Backup grid electricity use")]
    BackupGridElectricityUse,
    #[strum(serialize = "Heat pump heat delivered")]
    HeatPumpHeat,
    #[strum(serialize = "Heat pump electricity use")]
    HeatPumpElectricityUse,
    #[strum(serialize = "PV AC power")]
    PvPower,
    #[strum(serialize = "PV power to heat pump")]
    PvToHeatPump,
    #[strum(serialize = "PV power after heat pump")]
    PvAfterHeatPump,
    #[strum(serialize = "PV power to backup")]
    PvToBackup,
    #[strum(serialize = "PV power surplus")]
    PvSurplus,
    #[strum(serialize = "Solar pump electricity use")]
    SolarPumpElectricityUse,
    #[strum(serialize = "Solar pump operating fraction")]
    SolarPumpOnFraction,
    #[strum(serialize = "Distribution pump electricity use")]
    DistributionPumpElectricityUse,
    #[strum(serialize = "Distribution pump operating fraction")]
    DistributionPumpOnFraction,
    #[strum(serialize = "Grid electricity use")]
    GridElectricityUse,
    #[strum(serialize = "Hourly solar fraction")]
    SolarFraction,
}

impl ResultLabel {
    pub fn unit(&self) -> &'static str {
        match self {
            ResultLabel::AmbientTemperature
            | ResultLabel::WaterMainsTemperature
            | ResultLabel::TankUpperTemperature
            | ResultLabel::TankLowerTemperature
            | ResultLabel::CoilOutletTemperature
            | ResultLabel::DistributionTemperatureDrop => "[K]",
            ResultLabel::Irradiance => "[W/m2]",
            ResultLabel::SolarPumpOnFraction
            | ResultLabel::DistributionPumpOnFraction
            | ResultLabel::SolarFraction => "[ratio]",
            _ => "[W]",
        }
    }

    /// Whether annual aggregation averages rather than sums this series.
    pub fn is_averaged(&self) -> bool {
        let name = self.to_string().to_lowercase();
        name.contains("temperature") || name.contains("fraction")
    }
}

/// Per household quantities.
#[derive(
    Clone, Copy, Debug, Display, EnumIter, EnumString, Eq, Hash, IntoStaticStr, PartialEq, Serialize,
)]
pub enum HouseholdLabel {
    #[strum(serialize = "Household heat demand")]
    Demand,
    #[strum(serialize = "Household backup heat delivered")]
    BackupHeat,
    #[strum(serialize = "Household heat unmet")]
    Unmet,
    #[strum(serialize = "Household gas use")]
    GasUse,
    #[strum(serialize = "Household electricity use")]
    ElectricityUse,
}

/// One hour of system results.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HourlyResults {
    pub values: Vec<(ResultLabel, f64)>,
    /// per household, in project order
    pub households: Vec<Vec<(HouseholdLabel, f64)>>,
}

impl HourlyResults {
    pub fn push(&mut self, label: ResultLabel, value: f64) {
        self.values.push((label, value));
    }

    pub fn get(&self, label: ResultLabel) -> Option<f64> {
        self.values
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, value)| *value)
    }
}

/// Hourly results of a run; the results of hour `h` sit at index `h` of every series.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultSeries {
    series: IndexMap<ResultLabel, Vec<f64>>,
    household_ids: Vec<KeyString>,
    households: Vec<IndexMap<HouseholdLabel, Vec<f64>>>,
    len: usize,
}

impl ResultSeries {
    pub fn new(household_ids: Vec<KeyString>) -> Self {
        Self {
            households: vec![IndexMap::new(); household_ids.len()],
            household_ids,
            ..Default::default()
        }
    }

    /// Append one hour of results. Series first reported after the start are backfilled with 0.
    pub fn append(&mut self, hour: HourlyResults) {
        for (label, value) in hour.values {
            let len = self.len;
            self.series
                .entry(label)
                .or_insert_with(|| vec![0.; len])
                .push(value);
        }
        for (index, values) in hour.households.into_iter().enumerate() {
            if let Some(household) = self.households.get_mut(index) {
                for (label, value) in values {
                    let len = self.len;
                    household
                        .entry(label)
                        .or_insert_with(|| vec![0.; len])
                        .push(value);
                }
            }
        }
        self.len += 1;
        for series in self
            .series
            .values_mut()
            .chain(self.households.iter_mut().flat_map(|h| h.values_mut()))
        {
            series.resize(self.len, 0.);
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn labels(&self) -> impl Iterator<Item = &ResultLabel> {
        self.series.keys()
    }

    pub fn get(&self, label: ResultLabel) -> Option<&[f64]> {
        self.series.get(&label).map(Vec::as_slice)
    }

    pub fn household_ids(&self) -> &[KeyString] {
        &self.household_ids
    }

    pub fn household(&self, index: usize, label: HouseholdLabel) -> Option<&[f64]> {
        self.households
            .get(index)
            .and_then(|household| household.get(&label))
            .map(Vec::as_slice)
    }

    pub fn household_labels(&self, index: usize) -> impl Iterator<Item = &HouseholdLabel> {
        self.households.get(index).into_iter().flat_map(|h| h.keys())
    }

    fn sum(&self, label: ResultLabel) -> f64 {
        self.get(label).map(|s| s.iter().sum()).unwrap_or(0.)
    }

    fn household_sum(&self, index: usize, label: HouseholdLabel) -> f64 {
        self.household(index, label)
            .map(|s| s.iter().sum())
            .unwrap_or(0.)
    }

    /// Annual total of each series: the mean for temperatures and fractions, the sum (W over
    /// 1 hour steps, so Wh) otherwise.
    pub fn annual_totals(&self) -> IndexMap<ResultLabel, f64> {
        self.series
            .iter()
            .map(|(label, values)| {
                let total: f64 = values.iter().sum();
                let aggregate = if label.is_averaged() && !values.is_empty() {
                    total / values.len() as f64
                } else {
                    total
                };
                (*label, aggregate)
            })
            .collect()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct SeasonalTotals {
    pub annual: f64,
    pub summer: f64,
    pub winter: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HouseholdSummary {
    pub id: KeyString,
    pub occupancy: u32,
    /// in Wh
    pub demand: f64,
    pub backup_heat: f64,
    pub unmet: f64,
    pub gas_use: f64,
    pub electricity_use: f64,
    pub solar_fraction: f64,
}

/// Percentiles of the upper tank volume temperature, in K
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TemperatureSpread {
    pub p5: f64,
    pub p50: f64,
    pub p95: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnnualSummary {
    pub solar_fraction: f64,
    /// mean hourly solar fraction over hours with demand, by month
    pub monthly_solar_fraction: Vec<Option<f64>>,
    pub summer_solar_fraction: Option<f64>,
    pub winter_solar_fraction: Option<f64>,
    /// in Wh
    pub demand: f64,
    pub backup_heat: f64,
    pub gas_use: SeasonalTotals,
    pub grid_electricity_use: SeasonalTotals,
    pub pump_electricity_use: f64,
    pub solar_pump_operating_hours: f64,
    pub distribution_pump_operating_hours: f64,
    pub pv_surplus: f64,
    /// `|in - (delivered + dumped + losses - overcool)| / in` over the year
    pub tank_balance_relative_error: Option<f64>,
    pub tank_temperature: Option<TemperatureSpread>,
    pub households: Vec<HouseholdSummary>,
}

impl AnnualSummary {
    /// Reduce a completed result series.
    ///
    /// Arguments:
    /// * `results`
    /// * `system_type`
    /// * `solar_fraction` - annual solar fraction, which depends on the system's energy flows
    /// * `occupancies` - occupancy of each household, in project order
    pub fn from_results(
        results: &ResultSeries,
        system_type: SystemType,
        solar_fraction: f64,
        occupancies: &[u32],
    ) -> Self {
        let simulation_time = SimulationTime::new(results.len());

        let mut monthly = vec![(0., 0usize); 12];
        let hourly_fraction = results.get(ResultLabel::SolarFraction);
        let demand = results.get(ResultLabel::Demand);
        if let (Some(fractions), Some(demand)) = (hourly_fraction, demand) {
            for t in simulation_time.iter() {
                if demand[t.index] > 0. {
                    let month = &mut monthly[t.current_month()];
                    month.0 += fractions[t.index];
                    month.1 += 1;
                }
            }
        }
        let seasonal_fraction = |summer: bool| {
            hourly_fraction.zip(demand).and_then(|(fractions, demand)| {
                conditional_mean(
                    fractions
                        .iter()
                        .zip(simulation_time.iter())
                        .map(|(f, t)| (f, demand[t.index] > 0. && t.is_summer() == summer)),
                )
            })
        };

        let seasonal = |label: ResultLabel| {
            let mut totals = SeasonalTotals::default();
            if let Some(values) = results.get(label) {
                for (value, t) in values.iter().zip(simulation_time.iter()) {
                    totals.annual += value;
                    if t.is_summer() {
                        totals.summer += value;
                    } else {
                        totals.winter += value;
                    }
                }
            }
            totals
        };

        let households = results
            .household_ids()
            .iter()
            .enumerate()
            .map(|(index, id)| {
                let demand = results.household_sum(index, HouseholdLabel::Demand);
                let backup_heat = results.household_sum(index, HouseholdLabel::BackupHeat);
                HouseholdSummary {
                    id: id.clone(),
                    occupancy: occupancies.get(index).copied().unwrap_or(0),
                    demand,
                    backup_heat,
                    unmet: results.household_sum(index, HouseholdLabel::Unmet),
                    gas_use: results.household_sum(index, HouseholdLabel::GasUse),
                    electricity_use: results.household_sum(index, HouseholdLabel::ElectricityUse),
                    solar_fraction: if system_type != SystemType::GasTank && demand > 0. {
                        ((demand - backup_heat) / demand).clamp(0., 1.)
                    } else {
                        0.
                    },
                }
            })
            .collect();

        Self {
            solar_fraction,
            monthly_solar_fraction: monthly
                .into_iter()
                .map(|(sum, count)| (count > 0).then(|| sum / count as f64))
                .collect(),
            summer_solar_fraction: seasonal_fraction(true),
            winter_solar_fraction: seasonal_fraction(false),
            demand: results.sum(ResultLabel::Demand),
            backup_heat: results.sum(ResultLabel::BackupHeatDelivered),
            gas_use: seasonal(ResultLabel::BackupGasUse),
            grid_electricity_use: seasonal(ResultLabel::GridElectricityUse),
            pump_electricity_use: results.sum(ResultLabel::SolarPumpElectricityUse)
                + results.sum(ResultLabel::DistributionPumpElectricityUse),
            solar_pump_operating_hours: results.sum(ResultLabel::SolarPumpOnFraction),
            distribution_pump_operating_hours: results
                .sum(ResultLabel::DistributionPumpOnFraction),
            pv_surplus: results.sum(ResultLabel::PvSurplus),
            tank_balance_relative_error: tank_balance_relative_error(results),
            tank_temperature: results
                .get(ResultLabel::TankUpperTemperature)
                .filter(|temps| !temps.is_empty())
                .map(|temps| TemperatureSpread {
                    p5: percentile(temps, 5),
                    p50: percentile(temps, 50),
                    p95: percentile(temps, 95),
                }),
            households,
        }
    }
}

/// Annual energy balance of a storage tank heated through a coil.
fn tank_balance_relative_error(results: &ResultSeries) -> Option<f64> {
    let heat_in = results.sum(ResultLabel::TankHeatIn);
    if results.get(ResultLabel::TankHeatIn).is_none() || heat_in <= 0. {
        return None;
    }
    let heat_out = results.sum(ResultLabel::TankHeatDelivered)
        + results.sum(ResultLabel::TankHeatDumped)
        + results.sum(ResultLabel::TankHeatLoss)
        - results.sum(ResultLabel::TankOvercool);
    let relative_error = (heat_in - heat_out).abs() / heat_in;
    if relative_error > TANK_BALANCE_WARNING_LIMIT {
        warn!(
            "annual tank balance relative error {:.3} exceeds {}",
            relative_error, TANK_BALANCE_WARNING_LIMIT
        );
    }

    Some(relative_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation_time::SimulationTimeIteration;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn hour(values: &[(ResultLabel, f64)]) -> HourlyResults {
        HourlyResults {
            values: values.to_vec(),
            households: vec![],
        }
    }

    #[rstest]
    fn should_keep_series_aligned_by_hour() {
        let mut results = ResultSeries::new(vec![]);
        results.append(hour(&[(ResultLabel::Demand, 1.)]));
        results.append(hour(&[(ResultLabel::Demand, 2.), (ResultLabel::PvPower, 5.)]));
        results.append(hour(&[(ResultLabel::PvPower, 6.)]));

        assert_eq!(results.len(), 3);
        assert_eq!(results.get(ResultLabel::Demand).unwrap(), &[1., 2., 0.]);
        assert_eq!(results.get(ResultLabel::PvPower).unwrap(), &[0., 5., 6.]);
    }

    #[rstest]
    fn should_average_temperatures_and_sum_energy() {
        let mut results = ResultSeries::new(vec![]);
        results.append(hour(&[
            (ResultLabel::TankUpperTemperature, 330.),
            (ResultLabel::Demand, 100.),
        ]));
        results.append(hour(&[
            (ResultLabel::TankUpperTemperature, 320.),
            (ResultLabel::Demand, 300.),
        ]));
        let totals = results.annual_totals();
        assert_eq!(totals[&ResultLabel::TankUpperTemperature], 325.);
        assert_eq!(totals[&ResultLabel::Demand], 400.);
        assert!(ResultLabel::SolarPumpOnFraction.is_averaged());
        assert!(!ResultLabel::BackupGasUse.is_averaged());
    }

    #[rstest]
    fn should_give_tank_balance_error() {
        let mut results = ResultSeries::new(vec![]);
        results.append(hour(&[
            (ResultLabel::TankHeatIn, 1000.),
            (ResultLabel::TankHeatDelivered, 700.),
            (ResultLabel::TankHeatLoss, 100.),
            (ResultLabel::TankHeatDumped, 150.),
            (ResultLabel::TankOvercool, 0.),
        ]));
        assert_relative_eq!(
            tank_balance_relative_error(&results).unwrap(),
            0.05,
            max_relative = 1e-12
        );
    }

    #[rstest]
    fn should_summarise_households_and_seasons() {
        let mut results = ResultSeries::new(vec!["a".into(), "b".into()]);
        for t in 0..8760 {
            let summer = SimulationTimeIteration { index: t }.is_summer();
            results.append(HourlyResults {
                values: vec![
                    (ResultLabel::Demand, 10.),
                    (ResultLabel::BackupGasUse, 2.),
                    (ResultLabel::SolarFraction, if summer { 0.8 } else { 0.4 }),
                ],
                households: vec![
                    vec![(HouseholdLabel::Demand, 4.), (HouseholdLabel::BackupHeat, 1.)],
                    vec![(HouseholdLabel::Demand, 6.), (HouseholdLabel::BackupHeat, 3.)],
                ],
            });
        }
        let summary =
            AnnualSummary::from_results(&results, SystemType::SolarThermal, 0.6, &[1, 3]);

        assert_relative_eq!(summary.gas_use.annual, 2. * 8760., max_relative = 1e-12);
        assert_relative_eq!(
            summary.gas_use.summer,
            2. * (6552. - 2880.),
            max_relative = 1e-12
        );
        assert_relative_eq!(summary.summer_solar_fraction.unwrap(), 0.8, max_relative = 1e-12);
        assert_relative_eq!(summary.winter_solar_fraction.unwrap(), 0.4, max_relative = 1e-12);
        assert_relative_eq!(summary.monthly_solar_fraction[6].unwrap(), 0.8, max_relative = 1e-12);
        assert_relative_eq!(summary.households[0].solar_fraction, 0.75, max_relative = 1e-12);
        assert_relative_eq!(summary.households[1].solar_fraction, 0.5, max_relative = 1e-12);
        assert_eq!(summary.households[1].occupancy, 3);
        assert_eq!(summary.tank_balance_relative_error, None);
    }
}
