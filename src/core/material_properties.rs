use crate::core::units::SECONDS_PER_HOUR;
use std::sync::LazyLock;

/// Physical properties of heat transfer fluids.
#[derive(Clone, Copy, Debug)]
pub struct MaterialProperties {
    density: f64,                  // kg/m3
    specific_heat_capacity: f64,   // J/(kg.K)
    volumetric_heat_capacity: f64, // J/(m3.K)
}

impl MaterialProperties {
    pub fn new(density: f64, specific_heat_capacity: f64) -> Self {
        Self {
            density,
            specific_heat_capacity,
            volumetric_heat_capacity: specific_heat_capacity * density,
        }
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn specific_heat_capacity(&self) -> f64 {
        self.specific_heat_capacity
    }

    pub fn volumetric_heat_capacity(&self) -> f64 {
        self.volumetric_heat_capacity
    }

    /// Return the heat content of a volume of material, in J
    ///
    /// Arguments:
    /// * `volume` - in m3
    /// * `temp_high` - temperature for which the content is calculated, in K
    /// * `temp_base` - temperature which defines "zero energy", in K
    pub fn energy_content(&self, volume: f64, temp_high: f64, temp_base: f64) -> f64 {
        volume * self.volumetric_heat_capacity * (temp_high - temp_base)
    }

    /// Return the heat rate, in W, carried by a volume drawn evenly over one hour
    ///
    /// Arguments:
    /// * `volume_per_hour` - in m3
    /// * `temp_diff` - temperature lift, in K
    pub fn hourly_heat_rate(&self, volume_per_hour: f64, temp_diff: f64) -> f64 {
        volume_per_hour / SECONDS_PER_HOUR as f64 * self.volumetric_heat_capacity * temp_diff
    }
}

pub static WATER: LazyLock<MaterialProperties> =
    LazyLock::new(|| MaterialProperties::new(998.2, 4180.));

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::*;

    #[rstest]
    fn should_have_correct_volumetric_heat_capacity() {
        assert_relative_eq!(WATER.volumetric_heat_capacity(), 4_172_476.);
    }

    #[rstest]
    fn should_calc_hourly_heat_rate_for_one_litre_lift() {
        // 1 m3 over an hour heated by 1 K
        assert_relative_eq!(
            WATER.hourly_heat_rate(1., 1.),
            4_172_476. / 3_600.,
            max_relative = 1e-12
        );
    }

    #[rstest]
    fn should_calc_energy_content() {
        assert_relative_eq!(WATER.energy_content(0.5, 330., 320.), 20_862_380.);
    }
}
