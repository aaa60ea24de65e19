//! Whole-year runs over a synthetic weather year.
mod test_project_outputs;

use crate::core::units::HOURS_PER_YEAR;
use crate::input::{Household, Input, Project, SimulationSettings, SystemConfiguration, SystemType};
use crate::parameter_store::InMemoryStore;
use crate::weather::{ClimateZone, WeatherSeries};
use std::f64::consts::PI;

pub(crate) const LOAD_SEED: u64 = 11;

/// Seasonal swing between -1 in winter and 1 in mid summer.
fn season(hour: usize) -> f64 {
    (2. * PI * (hour as f64 / HOURS_PER_YEAR as f64 - 0.3)).sin()
}

/// A year of mild climate weather for zone 12, irradiance already on the collector plane.
pub(crate) fn weather_year() -> WeatherSeries {
    let temp_dry_bulb: Vec<f64> = (0..HOURS_PER_YEAR)
        .map(|t| 288.15 + 8. * season(t) + 5. * (2. * PI * ((t % 24) as f64 - 9.) / 24.).sin())
        .collect();
    let irradiance = (0..HOURS_PER_YEAR)
        .map(|t| {
            let hour_of_day = (t % 24) as f64;
            if (6. ..=18.).contains(&hour_of_day) {
                900. * (PI * (hour_of_day - 6.) / 12.).sin() * (0.75 + 0.25 * season(t))
            } else {
                0.
            }
        })
        .collect();

    WeatherSeries {
        climate_zone: climate_zone(),
        temp_wet_bulb: temp_dry_bulb.iter().map(|t| t - 4.).collect(),
        temp_dry_bulb,
        temp_water_mains: (0..HOURS_PER_YEAR)
            .map(|t| 287.15 + 4. * season(t))
            .collect(),
        irradiance,
    }
}

pub(crate) fn climate_zone() -> ClimateZone {
    ClimateZone::new(12).unwrap()
}

pub(crate) fn store() -> InMemoryStore {
    InMemoryStore::new()
        .with_weather(weather_year())
        .with_default_components()
        .with_generated_loads()
}

pub(crate) fn household(id: &str, occupancy: u32) -> Household {
    Household {
        id: id.into(),
        occupancy,
        at_home: false,
    }
}

pub(crate) fn input(system: SystemConfiguration, households: Vec<Household>) -> Input {
    Input {
        project: Project {
            climate_zone: climate_zone(),
            households,
            scale: 1.,
            layout: Default::default(),
        },
        system,
        simulation: SimulationSettings {
            seed: LOAD_SEED,
            ..Default::default()
        },
    }
}

pub(crate) fn single_household(system_type: SystemType) -> Input {
    input(
        SystemConfiguration::new(system_type),
        vec![household("unit_1", 3)],
    )
}
