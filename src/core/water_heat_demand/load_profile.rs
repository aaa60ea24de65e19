use crate::core::units::{gallons_to_cubic_metres, HOURS_PER_DAY};
use crate::errors::InvalidInputError;
use crate::input::{Household, KeyString};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

/// Hourly hot water draw of a single household.
#[derive(Clone, Debug, PartialEq)]
pub struct HouseholdLoad {
    pub id: KeyString,
    pub occupancy: u32,
    /// in m3 per hour
    pub hourly_draw: Vec<f64>,
}

impl HouseholdLoad {
    pub fn annual_draw(&self) -> f64 {
        self.hourly_draw.iter().sum()
    }

    pub fn peak_draw(&self) -> f64 {
        self.hourly_draw.iter().copied().fold(0., f64::max)
    }
}

/// The hourly hot water load of every household in a project. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadProfile {
    households: Vec<HouseholdLoad>,
    total: Vec<f64>,
}

impl LoadProfile {
    pub fn new(households: Vec<HouseholdLoad>) -> Self {
        let hours = households
            .iter()
            .map(|household| household.hourly_draw.len())
            .max()
            .unwrap_or(0);
        let total = (0..hours)
            .map(|t| {
                households
                    .iter()
                    .map(|household| household.hourly_draw.get(t).copied().unwrap_or(0.))
                    .sum()
            })
            .collect();

        Self { households, total }
    }

    pub fn households(&self) -> &[HouseholdLoad] {
        &self.households
    }

    pub fn len(&self) -> usize {
        self.total.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total.is_empty()
    }

    /// Total draw across all households, in m3 per hour
    pub fn total_draw(&self) -> &[f64] {
        &self.total
    }

    pub fn max_total_draw(&self) -> f64 {
        self.total.iter().copied().fold(0., f64::max)
    }

    /// Share of the total draw taken by each household at the given hour. Shares are zero for
    /// every household when nothing is drawn.
    pub fn load_ratios(&self, hour: usize) -> Vec<f64> {
        let total = self.total[hour];
        self.households
            .iter()
            .map(|household| {
                if total > 0. {
                    household.hourly_draw[hour] / total
                } else {
                    0.
                }
            })
            .collect()
    }

    pub fn validate(&self, expected_len: usize) -> Result<(), InvalidInputError> {
        if self.households.is_empty() {
            return Err(InvalidInputError::NoHouseholds);
        }
        for household in self.households.iter() {
            let series = format!("load profile for household {}", household.id);
            if household.hourly_draw.len() != expected_len {
                return Err(InvalidInputError::SeriesLength {
                    series,
                    expected: expected_len,
                    actual: household.hourly_draw.len(),
                });
            }
            if let Some(hour) = household
                .hourly_draw
                .iter()
                .position(|draw| !draw.is_finite() || *draw < 0.)
            {
                return Err(InvalidInputError::NonFiniteSeries { series, hour });
            }
        }
        Ok(())
    }
}

/// Relative draw in each hour of the day for a household that is out during the working day.
const AWAY_DAILY_SHAPE: [f64; 24] = [
    0.5, 0.2, 0.1, 0.1, 0.3, 1.8, 5.5, 8.5, 7.0, 4.0, 2.0, 1.5, 1.5, 1.2, 1.0, 1.2, 2.5, 4.5,
    6.5, 7.5, 6.5, 5.0, 3.0, 1.5,
];

/// Relative draw in each hour of the day for a household with daytime occupancy.
const AT_HOME_DAILY_SHAPE: [f64; 24] = [
    0.5, 0.2, 0.1, 0.1, 0.3, 1.5, 4.0, 6.5, 6.0, 4.5, 3.5, 3.5, 4.0, 3.5, 3.0, 3.0, 3.5, 4.5,
    6.0, 6.5, 5.5, 4.5, 3.0, 1.5,
];

/// Maximum relative deviation of a single day's total draw from the mean.
const DAILY_VARIATION: f64 = 0.2;

/// Builds synthetic, repeatable household load profiles from occupancy, daytime occupancy and
/// a design daily demand.
#[derive(Clone, Debug)]
pub struct LoadProfileGenerator {
    seed: u64,
    hours: usize,
}

impl LoadProfileGenerator {
    pub fn new(seed: u64, hours: usize) -> Self {
        Self { seed, hours }
    }

    /// Arguments:
    /// * `household` - occupancy and whether somebody is home in the day
    /// * `index` - position of the household in its project, so households draw independently
    /// * `demand_gal_per_day` - mean daily draw, in gallons
    pub fn household(
        &self,
        household: &Household,
        index: usize,
        demand_gal_per_day: f64,
    ) -> HouseholdLoad {
        let mut rng = Pcg64::seed_from_u64(self.seed.wrapping_add(index as u64));
        let shape = if household.at_home {
            &AT_HOME_DAILY_SHAPE
        } else {
            &AWAY_DAILY_SHAPE
        };
        let shape_total: f64 = shape.iter().sum();
        let daily_volume = gallons_to_cubic_metres(demand_gal_per_day);

        let mut hourly_draw = Vec::with_capacity(self.hours);
        let mut day_factor = 1.;
        for t in 0..self.hours {
            let hour_of_day = t % HOURS_PER_DAY as usize;
            if hour_of_day == 0 {
                day_factor = 1. + rng.random_range(-DAILY_VARIATION..=DAILY_VARIATION);
            }
            hourly_draw.push(daily_volume * day_factor * shape[hour_of_day] / shape_total);
        }

        HouseholdLoad {
            id: household.id.clone(),
            occupancy: household.occupancy,
            hourly_draw,
        }
    }
}
