use crate::core::units::{celsius_to_kelvin, BelowAbsoluteZeroError, DAYS_IN_MONTH};
use crate::irradiation::{
    tilted_irradiance, wet_bulb_temperature, CollectorOrientation, HorizontalIrradiance, Site,
};
use crate::weather::{ClimateZone, ClimateZoneParseError, WeatherSeries};
use csv::{ReaderBuilder as CsvReaderBuilder, StringRecord};
use std::io::Read;
use thiserror::Error;

const COLUMN_MONTH: usize = 0;
const COLUMN_DAY: usize = 1;
const COLUMN_HOUR: usize = 2; // hour ending, 1 to 24
const COLUMN_DRY_BULB: usize = 3; // in deg C
const COLUMN_HUMIDITY: usize = 4; // wet bulb in deg C, or relative humidity in %
const COLUMN_GHI: usize = 5; // global horizontal irradiance in W/m2
const COLUMN_DHI: usize = 6; // diffuse horizontal irradiance in W/m2
const COLUMN_MAINS: usize = 7; // water mains temperature in deg C

#[derive(Debug, Error)]
pub enum WeatherFileError {
    #[error("weather file could not be read: {0}")]
    Csv(#[from] csv::Error),
    #[error("weather file is missing its LOCATION line")]
    MissingLocation,
    #[error("weather file is missing its header row")]
    MissingHeader,
    #[error("weather file header has unexpected humidity column '{0}'")]
    UnknownHumidityColumn(String),
    #[error("weather file row {row}: could not read '{column}'")]
    InvalidValue { row: usize, column: &'static str },
    #[error("weather file row {row}: date {month}/{day} is not in a 365 day year")]
    InvalidDate { row: usize, month: u32, day: u32 },
    #[error(transparent)]
    ClimateZone(#[from] ClimateZoneParseError),
    #[error(transparent)]
    Temperature(#[from] BelowAbsoluteZeroError),
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum HumidityMeasure {
    WetBulb,
    RelativeHumidity,
}

/// One hourly row of a weather file, in the units of the file.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeatherRecord {
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub temp_dry_bulb_c: f64,
    pub temp_wet_bulb_c: f64,
    pub global_horizontal: f64,
    pub diffuse_horizontal: f64,
    pub temp_water_mains_c: f64,
}

impl WeatherRecord {
    fn day_of_year(&self) -> u32 {
        DAYS_IN_MONTH[..(self.month - 1) as usize].iter().sum::<u32>() + self.day
    }
}

/// Contents of a weather file before conversion onto the collector plane.
#[derive(Clone, Debug, PartialEq)]
pub struct WeatherFile {
    pub climate_zone: ClimateZone,
    pub site: Site,
    pub records: Vec<WeatherRecord>,
}

impl WeatherFile {
    /// Convert to SI series, computing irradiance on the collector plane for each hour.
    pub fn into_series(
        self,
        orientation: &CollectorOrientation,
    ) -> Result<WeatherSeries, WeatherFileError> {
        let mut series = WeatherSeries {
            climate_zone: self.climate_zone,
            temp_dry_bulb: Vec::with_capacity(self.records.len()),
            temp_wet_bulb: Vec::with_capacity(self.records.len()),
            temp_water_mains: Vec::with_capacity(self.records.len()),
            irradiance: Vec::with_capacity(self.records.len()),
        };

        for record in self.records.iter() {
            series
                .temp_dry_bulb
                .push(celsius_to_kelvin(record.temp_dry_bulb_c)?);
            series
                .temp_wet_bulb
                .push(celsius_to_kelvin(record.temp_wet_bulb_c)?);
            series
                .temp_water_mains
                .push(celsius_to_kelvin(record.temp_water_mains_c)?);
            series.irradiance.push(tilted_irradiance(
                &self.site,
                orientation,
                record.day_of_year(),
                record.hour - 1,
                HorizontalIrradiance {
                    global: record.global_horizontal,
                    diffuse: record.diffuse_horizontal,
                },
            ));
        }

        Ok(series)
    }
}

fn field<T: std::str::FromStr>(
    record: &StringRecord,
    index: usize,
    row: usize,
    column: &'static str,
) -> Result<T, WeatherFileError> {
    record
        .get(index)
        .and_then(|value| value.trim().parse().ok())
        .ok_or(WeatherFileError::InvalidValue { row, column })
}

/// Read a weather file: a `LOCATION,<zone>,<latitude>,<longitude>` line, a header row, then one
/// row per hour.
pub fn weather_data_to_vec(file: impl Read) -> Result<WeatherFile, WeatherFileError> {
    let mut reader = CsvReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_reader(file);
    let mut records = reader.records();

    let location = records.next().ok_or(WeatherFileError::MissingLocation)??;
    if location.get(0).map(str::trim) != Some("LOCATION") {
        return Err(WeatherFileError::MissingLocation);
    }
    let climate_zone: ClimateZone = location
        .get(1)
        .ok_or(WeatherFileError::MissingLocation)?
        .parse()?;
    let site = Site {
        latitude: field(&location, 2, 0, "latitude")?,
        longitude: field(&location, 3, 0, "longitude")?,
    };

    let header = records.next().ok_or(WeatherFileError::MissingHeader)??;
    let humidity = match header.get(COLUMN_HUMIDITY).map(str::trim) {
        Some("wet_bulb_c") => HumidityMeasure::WetBulb,
        Some("relative_humidity") => HumidityMeasure::RelativeHumidity,
        Some(other) => return Err(WeatherFileError::UnknownHumidityColumn(other.to_string())),
        None => return Err(WeatherFileError::MissingHeader),
    };

    let mut weather = vec![];
    for (i, result) in records.enumerate() {
        let record = result?;
        let row = i + 3;
        let month: u32 = field(&record, COLUMN_MONTH, row, "month")?;
        let day: u32 = field(&record, COLUMN_DAY, row, "day")?;
        if !(1..=12).contains(&month) || day == 0 || day > DAYS_IN_MONTH[(month - 1) as usize] {
            return Err(WeatherFileError::InvalidDate { row, month, day });
        }
        let hour: u32 = field(&record, COLUMN_HOUR, row, "hour")?;
        if !(1..=24).contains(&hour) {
            return Err(WeatherFileError::InvalidValue { row, column: "hour" });
        }
        let temp_dry_bulb_c: f64 = field(&record, COLUMN_DRY_BULB, row, "dry bulb temperature")?;
        let humidity_value: f64 = field(&record, COLUMN_HUMIDITY, row, "humidity")?;

        weather.push(WeatherRecord {
            month,
            day,
            hour,
            temp_dry_bulb_c,
            temp_wet_bulb_c: match humidity {
                HumidityMeasure::WetBulb => humidity_value,
                HumidityMeasure::RelativeHumidity => {
                    wet_bulb_temperature(temp_dry_bulb_c, humidity_value)
                }
            },
            global_horizontal: field(&record, COLUMN_GHI, row, "global horizontal irradiance")?,
            diffuse_horizontal: field(&record, COLUMN_DHI, row, "diffuse horizontal irradiance")?,
            temp_water_mains_c: field(&record, COLUMN_MAINS, row, "mains temperature")?,
        });
    }

    Ok(WeatherFile {
        climate_zone,
        site,
        records: weather,
    })
}
