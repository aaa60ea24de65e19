use thiserror::Error;

pub const SECONDS_PER_HOUR: u32 = 3_600;
pub const HOURS_PER_DAY: u32 = 24;
pub const DAYS_PER_YEAR: u32 = 365;
pub const HOURS_PER_YEAR: usize = 8_760;
pub const DAYS_IN_MONTH: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

pub const ZERO_CELSIUS_IN_KELVIN: f64 = 273.15;
pub const CUBIC_METRES_PER_GALLON: f64 = 0.00378541;
pub const SQUARE_METRES_PER_SQUARE_FOOT: f64 = 0.092903;
pub const METRES_PER_FOOT: f64 = 0.3048;

pub fn celsius_to_kelvin(temp_c: f64) -> Result<f64, BelowAbsoluteZeroError> {
    if temp_c < -ZERO_CELSIUS_IN_KELVIN {
        Err(BelowAbsoluteZeroError::from_c(temp_c))
    } else {
        Ok(temp_c + ZERO_CELSIUS_IN_KELVIN)
    }
}

pub fn kelvin_to_celsius(temp_k: f64) -> Result<f64, BelowAbsoluteZeroError> {
    if temp_k < 0.0 {
        Err(BelowAbsoluteZeroError::from_k(temp_k))
    } else {
        Ok(temp_k - ZERO_CELSIUS_IN_KELVIN)
    }
}

pub fn fahrenheit_to_kelvin(temp_f: f64) -> Result<f64, BelowAbsoluteZeroError> {
    celsius_to_kelvin((temp_f - 32.) * 5. / 9.)
}

pub fn gallons_to_cubic_metres(volume_gal: f64) -> f64 {
    volume_gal * CUBIC_METRES_PER_GALLON
}

pub fn cubic_metres_to_gallons(volume_m3: f64) -> f64 {
    volume_m3 / CUBIC_METRES_PER_GALLON
}

pub fn square_feet_to_square_metres(area_sqft: f64) -> f64 {
    area_sqft * SQUARE_METRES_PER_SQUARE_FOOT
}

/// Convert an hourly volume (m3 over one hour) into a volumetric flow rate in m3/s
pub fn per_hour_to_per_second(volume_per_hour: f64) -> f64 {
    volume_per_hour / SECONDS_PER_HOUR as f64
}

/// Round to the given number of decimal places.
pub fn round_by_precision(value: f64, decimal_places: i32) -> f64 {
    let factor = 10f64.powi(decimal_places);
    (value * factor).round() / factor
}

#[derive(Debug, Error)]
#[error("Temperature was below absolute zero: {temperature}{unit}")]
pub struct BelowAbsoluteZeroError {
    temperature: f64,
    unit: &'static str,
}

impl BelowAbsoluteZeroError {
    fn from_c(temperature: f64) -> Self {
        Self {
            temperature,
            unit: "C",
        }
    }

    fn from_k(temperature: f64) -> Self {
        Self {
            temperature,
            unit: "K",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case(0., 273.15)]
    #[case(-10., 263.15)]
    #[case(48.89, 322.04)]
    fn should_convert_celsius_to_kelvin(#[case] temp_c: f64, #[case] expected: f64) {
        assert_relative_eq!(celsius_to_kelvin(temp_c).unwrap(), expected, epsilon = 1e-9);
    }

    #[rstest]
    fn should_reject_temperatures_below_absolute_zero() {
        assert!(celsius_to_kelvin(-300.).is_err());
        assert!(kelvin_to_celsius(-1.).is_err());
    }

    #[rstest]
    fn should_convert_fahrenheit_to_kelvin() {
        assert_relative_eq!(fahrenheit_to_kelvin(212.).unwrap(), 373.15, epsilon = 1e-9);
    }

    #[rstest]
    fn should_convert_gallons_both_ways() {
        assert_relative_eq!(gallons_to_cubic_metres(80.), 0.3028328, epsilon = 1e-9);
        assert_relative_eq!(cubic_metres_to_gallons(CUBIC_METRES_PER_GALLON), 1.);
    }

    #[rstest]
    fn should_round_by_precision() {
        assert_eq!(round_by_precision(1.23456, 2), 1.23);
        assert_eq!(round_by_precision(-0.005001, 2), -0.01);
    }

    #[rstest]
    fn should_have_months_summing_to_a_year() {
        assert_eq!(DAYS_IN_MONTH.iter().sum::<u32>(), DAYS_PER_YEAR);
        assert_eq!(
            (DAYS_PER_YEAR * HOURS_PER_DAY) as usize,
            HOURS_PER_YEAR
        );
    }
}
