//! Component sizing ahead of a run.
//!
//! Sizes follow the California Solar Initiative thermal sizing rule for the solar collector and
//! solar tank, first hour rating for gas storage water heaters, and regressions of rated power
//! against occupancy or project size for pumps and instantaneous heaters.
use crate::core::units::{
    cubic_metres_to_gallons, gallons_to_cubic_metres, square_feet_to_square_metres,
};
use crate::errors::InvalidInputError;
use crate::input::{CommunityLayout, Household, KeyString, SystemType, MAX_OCCUPANCY, MIN_OCCUPANCY};
use serde::{Deserialize, Serialize};

/// `y = coefficient * x ^ exponent`
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PowerLaw {
    pub coefficient: f64,
    pub exponent: f64,
}

impl PowerLaw {
    pub fn evaluate(&self, x: f64) -> f64 {
        self.coefficient * x.powf(self.exponent)
    }
}

/// The rule set from which component sizes are derived.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct SizingRules {
    /// daily demand estimate for a single occupant, in gal/day
    pub demand_one_occupant: f64,
    /// daily demand estimate for two occupants, in gal/day
    pub demand_two_occupants: f64,
    /// daily demand estimate for each occupant beyond the second, in gal/day
    pub demand_per_additional_occupant: f64,
    /// collector area per daily demand, in sqft per gal/day
    pub collector_area_per_demand: f64,
    /// upper compliance limit of `collector_area_per_demand`
    pub collector_area_per_demand_limit: f64,
    /// solar tank volume per collector area, in gal per sqft
    pub tank_volume_per_collector_area: f64,
    /// lower compliance limit of `tank_volume_per_collector_area`
    pub tank_volume_per_collector_area_limit: f64,
    /// in m
    pub pipe_length_per_household: f64,
    pub attached_pipe_length_factor: f64,
    pub detached_pipe_length_factor: f64,
    /// rated power (W) against total occupancy
    pub solar_pump: PowerLaw,
    /// rated power (W) against number of households, community projects only
    pub distribution_pump: PowerLaw,
    /// nominal power (W) against household occupancy
    pub gas_burner: PowerLaw,
    /// in W, per household
    pub electric_resistance_power: f64,
    /// rated heating capacity, in W
    pub heat_pump_capacity: f64,
    /// in gal
    pub heat_pump_tank_volume: f64,
    /// in m2
    pub pv_area: f64,
    /// available gas storage water heater sizes, in gal, ascending
    pub gas_tank_sizes: Vec<f64>,
}

impl Default for SizingRules {
    fn default() -> Self {
        Self {
            demand_one_occupant: 20.,
            demand_two_occupants: 35.,
            demand_per_additional_occupant: 10.,
            collector_area_per_demand: 1.2,
            collector_area_per_demand_limit: 1.25,
            tank_volume_per_collector_area: 1.3,
            tank_volume_per_collector_area_limit: 1.25,
            pipe_length_per_household: 3.048,
            attached_pipe_length_factor: 3.,
            detached_pipe_length_factor: 6.,
            solar_pump: PowerLaw {
                coefficient: 7.5101,
                exponent: 0.5322,
            },
            distribution_pump: PowerLaw {
                coefficient: 10.4376,
                exponent: 0.9277,
            },
            gas_burner: PowerLaw {
                coefficient: 24875.,
                exponent: 0.5175,
            },
            electric_resistance_power: 6500.,
            heat_pump_capacity: 2350.,
            heat_pump_tank_volume: 80.,
            pv_area: 6.25,
            gas_tank_sizes: vec![
                20., 28., 29., 30., 33., 34., 37., 38., 39., 40., 46., 47., 48., 49., 50., 53., 55.,
                60., 63., 65., 71., 72., 73., 75., 80., 81., 93., 95., 96., 98., 100., 112.,
            ],
        }
    }
}

impl SizingRules {
    /// Check the rule set lies inside the compliance envelope.
    pub fn validate(&self) -> Result<(), InvalidInputError> {
        if !(self.collector_area_per_demand > 0.
            && self.collector_area_per_demand <= self.collector_area_per_demand_limit)
        {
            return Err(InvalidInputError::NonCompliantSizingRule(
                "collector_area_per_demand".into(),
            ));
        }
        if self.tank_volume_per_collector_area < self.tank_volume_per_collector_area_limit {
            return Err(InvalidInputError::NonCompliantSizingRule(
                "tank_volume_per_collector_area".into(),
            ));
        }
        if self.gas_tank_sizes.is_empty()
            || self
                .gas_tank_sizes
                .windows(2)
                .any(|pair| pair[0] > pair[1])
        {
            return Err(InvalidInputError::NonCompliantSizingRule(
                "gas_tank_sizes".into(),
            ));
        }
        Ok(())
    }

    /// Daily hot water demand estimate for a household, in gal/day
    pub fn demand_estimate(&self, occupancy: u32) -> f64 {
        match occupancy {
            0 => 0.,
            1 => self.demand_one_occupant,
            n => self.demand_two_occupants + self.demand_per_additional_occupant * (n - 2) as f64,
        }
    }

    /// Smallest available gas tank holding the peak hourly draw, in gal
    fn gas_tank_size(&self, peak_draw_gal: f64) -> f64 {
        self.gas_tank_sizes
            .iter()
            .copied()
            .find(|size| *size >= peak_draw_gal)
            .or(self.gas_tank_sizes.last().copied())
            .unwrap_or(peak_draw_gal)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct HouseholdSizes {
    pub id: KeyString,
    pub occupancy: u32,
    /// in gal/day
    pub demand_estimate: f64,
    /// tankless gas backup, in W
    pub gas_burner_power: f64,
    /// in W
    pub electric_resistance_power: f64,
    /// in m3
    pub gas_tank_volume: f64,
}

/// Component sizes for a project, in SI units. Components absent from the system type are 0.
#[derive(Clone, Debug, PartialEq)]
pub struct SystemSizes {
    /// in gal/day
    pub demand_estimate: f64,
    /// in m2
    pub collector_area: f64,
    /// in m3
    pub solar_tank_volume: f64,
    /// in m2
    pub pv_area: f64,
    /// in W
    pub heat_pump_capacity: f64,
    /// in m3
    pub heat_pump_tank_volume: f64,
    /// in W
    pub solar_pump_power: f64,
    /// in W
    pub distribution_pump_power: f64,
    /// in m
    pub piping_length: f64,
    pub households: Vec<HouseholdSizes>,
}

/// Size every component of a system.
///
/// Arguments:
/// * `households` - households served by the system
/// * `peak_draws` - peak hourly draw of each household, in m3, used for gas tanks
/// * `scale` - multiplier on the shared solar components
/// * `layout` - arrangement of community dwellings
/// * `system_type`
/// * `rules`
pub fn size_system(
    households: &[Household],
    peak_draws: &[f64],
    scale: f64,
    layout: CommunityLayout,
    system_type: SystemType,
    rules: &SizingRules,
) -> Result<SystemSizes, InvalidInputError> {
    if households.is_empty() {
        return Err(InvalidInputError::NoHouseholds);
    }
    if !(scale > 0.) || !scale.is_finite() {
        return Err(InvalidInputError::NonPositiveScale(scale));
    }
    if let Some(household) = households
        .iter()
        .find(|household| !(MIN_OCCUPANCY..=MAX_OCCUPANCY).contains(&household.occupancy))
    {
        return Err(InvalidInputError::OccupancyOutOfRange {
            household: household.id.to_string(),
            occupancy: household.occupancy,
        });
    }
    if peak_draws.len() != households.len() {
        return Err(InvalidInputError::SeriesLength {
            series: "household peak draws".into(),
            expected: households.len(),
            actual: peak_draws.len(),
        });
    }
    rules.validate()?;

    let household_count = households.len();
    let community = household_count > 1;
    let total_occupancy: u32 = households.iter().map(|h| h.occupancy).sum();

    let household_sizes: Vec<HouseholdSizes> = households
        .iter()
        .zip(peak_draws)
        .map(|(household, peak_draw)| HouseholdSizes {
            id: household.id.clone(),
            occupancy: household.occupancy,
            demand_estimate: rules.demand_estimate(household.occupancy),
            gas_burner_power: rules.gas_burner.evaluate(household.occupancy as f64),
            electric_resistance_power: rules.electric_resistance_power,
            gas_tank_volume: gallons_to_cubic_metres(
                rules.gas_tank_size(cubic_metres_to_gallons(*peak_draw)),
            ),
        })
        .collect();
    let demand_estimate: f64 = household_sizes.iter().map(|h| h.demand_estimate).sum();

    let piping_length = if community {
        let factor = match layout {
            CommunityLayout::Attached => rules.attached_pipe_length_factor,
            CommunityLayout::Detached => rules.detached_pipe_length_factor,
        };
        factor * rules.pipe_length_per_household * household_count as f64
    } else {
        rules.pipe_length_per_household
    };
    let distribution_pump_power = if community {
        rules.distribution_pump.evaluate(household_count as f64)
    } else {
        0.
    };

    let collector_area_sqft = rules.collector_area_per_demand * demand_estimate * scale;
    let mut sizes = SystemSizes {
        demand_estimate,
        collector_area: 0.,
        solar_tank_volume: 0.,
        pv_area: 0.,
        heat_pump_capacity: 0.,
        heat_pump_tank_volume: 0.,
        solar_pump_power: 0.,
        distribution_pump_power: 0.,
        piping_length: 0.,
        households: household_sizes,
    };

    match system_type {
        SystemType::GasTank => {}
        SystemType::SolarThermal => {
            sizes.collector_area = square_feet_to_square_metres(collector_area_sqft);
            sizes.solar_tank_volume = gallons_to_cubic_metres(
                rules.tank_volume_per_collector_area * collector_area_sqft,
            );
            sizes.solar_pump_power = rules.solar_pump.evaluate(total_occupancy as f64);
            sizes.distribution_pump_power = distribution_pump_power;
            sizes.piping_length = piping_length;
        }
        SystemType::SolarElectric => {
            sizes.pv_area = rules.pv_area * scale;
            sizes.heat_pump_capacity = rules.heat_pump_capacity * scale;
            sizes.heat_pump_tank_volume =
                gallons_to_cubic_metres(rules.heat_pump_tank_volume * scale);
            sizes.distribution_pump_power = distribution_pump_power;
            sizes.piping_length = piping_length;
        }
    }

    Ok(sizes)
}
