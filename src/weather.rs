use crate::errors::InvalidInputError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// Climate zone identifier, following the California numbering (CZ01 to CZ16), though any
/// positive zone number is accepted so that further zones can be added to a parameter store.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClimateZone(u8);

#[derive(Debug, Error)]
#[error("'{0}' is not a recognised climate zone")]
pub struct ClimateZoneParseError(String);

impl ClimateZone {
    pub fn new(number: u8) -> Result<Self, ClimateZoneParseError> {
        if number == 0 {
            return Err(ClimateZoneParseError(number.to_string()));
        }
        Ok(Self(number))
    }

    pub fn number(&self) -> u8 {
        self.0
    }
}

impl FromStr for ClimateZone {
    type Err = ClimateZoneParseError;

    /// Accepts "CZ12", "cz12", "12" or "1"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("CZ")
            .or_else(|| trimmed.strip_prefix("cz"))
            .unwrap_or(trimmed);
        digits
            .parse::<u8>()
            .ok()
            .and_then(|number| ClimateZone::new(number).ok())
            .ok_or_else(|| ClimateZoneParseError(s.to_string()))
    }
}

impl TryFrom<String> for ClimateZone {
    type Error = ClimateZoneParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClimateZone> for String {
    fn from(value: ClimateZone) -> Self {
        value.to_string()
    }
}

impl Display for ClimateZone {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "CZ{:02}", self.0)
    }
}

/// Hourly weather for a representative year, already resolved onto the collector plane.
/// All temperatures are in K and irradiance in W/m2.
#[derive(Clone, Debug, PartialEq)]
pub struct WeatherSeries {
    pub climate_zone: ClimateZone,
    pub temp_dry_bulb: Vec<f64>,
    pub temp_wet_bulb: Vec<f64>,
    pub temp_water_mains: Vec<f64>,
    pub irradiance: Vec<f64>,
}

/// Weather drivers for a single hour.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HourlyWeather {
    pub temp_dry_bulb: f64,
    pub temp_wet_bulb: f64,
    pub temp_water_mains: f64,
    pub irradiance: f64,
}

impl WeatherSeries {
    pub fn len(&self) -> usize {
        self.irradiance.len()
    }

    pub fn is_empty(&self) -> bool {
        self.irradiance.is_empty()
    }

    pub fn at(&self, hour: usize) -> HourlyWeather {
        HourlyWeather {
            temp_dry_bulb: self.temp_dry_bulb[hour],
            temp_wet_bulb: self.temp_wet_bulb[hour],
            temp_water_mains: self.temp_water_mains[hour],
            irradiance: self.irradiance[hour],
        }
    }

    fn named_series(&self) -> [(&'static str, &[f64]); 4] {
        [
            ("dry bulb temperature", &self.temp_dry_bulb),
            ("wet bulb temperature", &self.temp_wet_bulb),
            ("water mains temperature", &self.temp_water_mains),
            ("irradiance", &self.irradiance),
        ]
    }

    /// Check that every series covers the simulated year and holds only finite values.
    pub fn validate(&self, expected_len: usize) -> Result<(), InvalidInputError> {
        for (series, values) in self.named_series() {
            if values.len() != expected_len {
                return Err(InvalidInputError::SeriesLength {
                    series: format!("weather {series}"),
                    expected: expected_len,
                    actual: values.len(),
                });
            }
            if let Some(hour) = values.iter().position(|value| !value.is_finite()) {
                return Err(InvalidInputError::NonFiniteSeries {
                    series: format!("weather {series}"),
                    hour,
                });
            }
        }
        Ok(())
    }
}
