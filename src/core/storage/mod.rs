pub mod gas_tank;
pub mod thermal_tank;

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Temperature thresholds shared by all storage in a run, in K.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct TemperatureLimits {
    /// nominal temperature at which hot water is delivered to the end use
    pub draw_setpoint: f64,
    /// tank volumes are never allowed to cool below this temperature
    pub freeze_protection: f64,
}

impl Default for TemperatureLimits {
    fn default() -> Self {
        Self {
            draw_setpoint: 322.04,
            freeze_protection: 277.15,
        }
    }
}

/// Radius and height of a cylindrical tank of the given volume (m3) and height to radius ratio.
pub(crate) fn cylinder_dimensions(volume: f64, height_to_radius: f64) -> (f64, f64) {
    let radius = (volume / (height_to_radius * PI)).cbrt();
    (radius, radius * height_to_radius)
}

/// Envelope area of the whole cylinder, in m2
pub(crate) fn cylinder_area(volume: f64, height_to_radius: f64) -> f64 {
    let (radius, height) = cylinder_dimensions(volume, height_to_radius);
    2. * PI * radius.powi(2) + 2. * PI * radius * height
}

/// Heat loss through an insulated surface, in W
pub(crate) fn thermal_loss(u_value: f64, area: f64, temp_ambient: f64, temp_node: f64) -> f64 {
    u_value * area * (temp_node - temp_ambient)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::*;

    #[rstest]
    fn should_size_cylinder_to_volume() {
        let (radius, height) = cylinder_dimensions(0.3, 6.);
        assert_relative_eq!(PI * radius.powi(2) * height, 0.3, max_relative = 1e-12);
        assert_relative_eq!(height / radius, 6., max_relative = 1e-12);
    }

    #[rstest]
    fn should_calc_thermal_loss() {
        assert_relative_eq!(thermal_loss(0.5, 2., 290., 330.), 40.);
        assert_relative_eq!(thermal_loss(0.5, 2., 290., 280.), -10.);
    }
}
