//! Irradiance on a tilted collector plane from global and diffuse horizontal irradiance, and
//! wet bulb temperature from dry bulb temperature and relative humidity.
//!
//! Beam tilt factors are averaged over each hour, which avoids the singularities of the
//! instantaneous ratio around sunrise and sunset.
use serde::{Deserialize, Serialize};
use serde_valid::Validate;

/// Limit above which a tilted irradiance result is treated as a numerical artefact.
const MAX_TILTED_IRRADIANCE: f64 = 2000.;

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkyModel {
    #[default]
    IsotropicDiffuse,
    /// Hay, Davies, Klucher and Reindl anisotropic sky
    Hdkr,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CollectorOrientation {
    /// in degrees from horizontal; defaults to the site latitude
    #[serde(default)]
    #[validate(minimum = 0.)]
    #[validate(maximum = 90.)]
    pub tilt: Option<f64>,
    /// in degrees from south, west positive
    #[serde(default)]
    #[validate(minimum = -180.)]
    #[validate(maximum = 180.)]
    pub azimuth: f64,
    #[serde(default = "default_ground_reflectance")]
    #[validate(minimum = 0.)]
    #[validate(maximum = 1.)]
    pub ground_reflectance: f64,
    #[serde(default = "default_solar_constant")]
    #[validate(minimum = 1300.)]
    #[validate(maximum = 1450.)]
    pub solar_constant: f64,
    #[serde(default)]
    pub sky_model: SkyModel,
}

fn default_ground_reflectance() -> f64 {
    0.16
}

fn default_solar_constant() -> f64 {
    1367.
}

impl Default for CollectorOrientation {
    fn default() -> Self {
        Self {
            tilt: None,
            azimuth: 0.,
            ground_reflectance: default_ground_reflectance(),
            solar_constant: default_solar_constant(),
            sky_model: SkyModel::default(),
        }
    }
}

/// Site location, latitude north positive and longitude east positive, in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Site {
    pub latitude: f64,
    pub longitude: f64,
}

impl Site {
    /// Meridian of the local standard time zone
    fn standard_meridian(&self) -> f64 {
        (self.longitude / 15.).round() * 15.
    }
}

/// Horizontal irradiance for one hour, in W/m2
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HorizontalIrradiance {
    pub global: f64,
    pub diffuse: f64,
}

/// Solar geometry for one hour starting at `hour` (0 to 23) on day `day_of_year` (1 to 365).
struct HourGeometry {
    declination: f64,
    hour_angle_start: f64,
    hour_angle_end: f64,
    extraterrestrial_normal: f64,
}

impl HourGeometry {
    fn new(site: &Site, solar_constant: f64, day_of_year: u32, hour: u32) -> Self {
        let b = ((day_of_year as f64 - 1.) * 360. / 365.).to_radians();

        // equation of time, in minutes
        let equation_of_time = 229.2
            * (0.000075 + 0.001868 * b.cos()
                - 0.032077 * b.sin()
                - 0.014615 * (2. * b).cos()
                - 0.04089 * (2. * b).sin());
        let solar_time = hour as f64
            + (4. * (site.longitude - site.standard_meridian()) + equation_of_time) / 60.;

        let declination = (0.006918 - 0.399912 * b.cos() + 0.070257 * b.sin()
            - 0.006758 * (2. * b).cos()
            + 0.000907 * (2. * b).sin()
            - 0.002697 * (3. * b).cos()
            + 0.001480 * (3. * b).sin())
        .to_degrees();

        Self {
            declination,
            hour_angle_start: 15. * (solar_time - 12.),
            hour_angle_end: 15. * (solar_time + 1. - 12.),
            extraterrestrial_normal: solar_constant
                * (1. + 0.033 * (360. * day_of_year as f64 / 365.).to_radians().cos()),
        }
    }

    /// Integral of the cosine of the zenith angle over the hour, per radian of hour angle
    fn horizontal_integral(&self, latitude: f64) -> f64 {
        let (lat, dec) = (latitude.to_radians(), self.declination.to_radians());
        let (w1, w2) = (
            self.hour_angle_start.to_radians(),
            self.hour_angle_end.to_radians(),
        );
        lat.cos() * dec.cos() * (w2.sin() - w1.sin()) + lat.sin() * dec.sin() * (w2 - w1)
    }

    fn tilted_integral(&self, latitude: f64, tilt: f64, azimuth: f64) -> f64 {
        let (lat, dec) = (latitude.to_radians(), self.declination.to_radians());
        let (beta, gamma) = (tilt.to_radians(), azimuth.to_radians());
        let (w1, w2) = (
            self.hour_angle_start.to_radians(),
            self.hour_angle_end.to_radians(),
        );

        (dec.sin() * lat.sin() * beta.cos() - dec.sin() * lat.cos() * beta.sin() * gamma.cos())
            * (w2 - w1)
            + (dec.cos() * lat.cos() * beta.cos()
                + dec.cos() * lat.sin() * beta.sin() * gamma.cos())
                * (w2.sin() - w1.sin())
            - dec.cos() * beta.sin() * gamma.sin() * (w2.cos() - w1.cos())
    }

    /// Extraterrestrial irradiance on a horizontal plane averaged over the hour, in W/m2
    fn extraterrestrial_horizontal(&self, latitude: f64) -> f64 {
        // hour angle span of one hour is 15 degrees, i.e. pi/12 rad
        (self.extraterrestrial_normal * self.horizontal_integral(latitude) * 12. / std::f64::consts::PI)
            .max(0.)
    }
}

/// Total irradiance on the collector plane for one hour, in W/m2
pub fn tilted_irradiance(
    site: &Site,
    orientation: &CollectorOrientation,
    day_of_year: u32,
    hour: u32,
    horizontal: HorizontalIrradiance,
) -> f64 {
    if horizontal.global == 0. && horizontal.diffuse == 0. {
        return 0.;
    }

    let tilt = orientation.tilt.unwrap_or(site.latitude.abs());
    let geometry = HourGeometry::new(site, orientation.solar_constant, day_of_year, hour);

    let beam_ratio = geometry.tilted_integral(site.latitude, tilt, orientation.azimuth)
        / geometry.horizontal_integral(site.latitude);
    let beam = horizontal.global - horizontal.diffuse;
    let sky_view = (1. + tilt.to_radians().cos()) / 2.;
    let ground = horizontal.global * orientation.ground_reflectance
        * (1. - tilt.to_radians().cos())
        / 2.;

    let total = match orientation.sky_model {
        SkyModel::IsotropicDiffuse => beam * beam_ratio + horizontal.diffuse * sky_view + ground,
        SkyModel::Hdkr => {
            let extraterrestrial = geometry.extraterrestrial_horizontal(site.latitude);
            let anisotropy = if extraterrestrial > 0. {
                beam / extraterrestrial
            } else {
                0.
            };
            let modulation = if horizontal.global > 0. {
                (beam / horizontal.global).max(0.).sqrt()
            } else {
                0.
            };
            (beam + horizontal.diffuse * anisotropy) * beam_ratio
                + horizontal.diffuse
                    * (1. - anisotropy)
                    * sky_view
                    * (1. + modulation * (tilt / 2.).to_radians().sin().powi(3))
                + ground
        }
    };

    if !total.is_finite() || !(0. ..MAX_TILTED_IRRADIANCE).contains(&total) {
        0.
    } else {
        total
    }
}

/// Wet bulb temperature (deg C) at sea level pressure from dry bulb temperature (deg C) and
/// relative humidity (%), after Stull (2011).
pub fn wet_bulb_temperature(dry_bulb_c: f64, relative_humidity: f64) -> f64 {
    dry_bulb_c * (0.151977 * (relative_humidity + 8.313659).sqrt()).atan()
        + (dry_bulb_c + relative_humidity).atan()
        - (relative_humidity - 1.676331).atan()
        + 0.00391838 * relative_humidity.powf(1.5) * (0.023101 * relative_humidity).atan()
        - 4.686035
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn site() -> Site {
        // Sacramento
        Site {
            latitude: 38.5,
            longitude: -121.5,
        }
    }

    #[rstest]
    fn should_return_zero_without_irradiance(site: Site) {
        assert_eq!(
            tilted_irradiance(
                &site,
                &CollectorOrientation::default(),
                172,
                12,
                HorizontalIrradiance {
                    global: 0.,
                    diffuse: 0.
                }
            ),
            0.
        );
    }

    #[rstest]
    fn should_gain_over_horizontal_in_winter_at_noon(site: Site) {
        let horizontal = HorizontalIrradiance {
            global: 500.,
            diffuse: 80.,
        };
        let tilted =
            tilted_irradiance(&site, &CollectorOrientation::default(), 15, 11, horizontal);
        assert!(tilted > horizontal.global);
        assert!(tilted < MAX_TILTED_IRRADIANCE);
    }

    #[rstest]
    fn should_match_horizontal_for_flat_collector(site: Site) {
        let orientation = CollectorOrientation {
            tilt: Some(0.),
            ..Default::default()
        };
        let horizontal = HorizontalIrradiance {
            global: 700.,
            diffuse: 120.,
        };
        assert_relative_eq!(
            tilted_irradiance(&site, &orientation, 172, 12, horizontal),
            700.,
            max_relative = 1e-9
        );
    }

    #[rstest]
    fn should_give_similar_results_for_both_sky_models(site: Site) {
        let horizontal = HorizontalIrradiance {
            global: 800.,
            diffuse: 100.,
        };
        let isotropic =
            tilted_irradiance(&site, &CollectorOrientation::default(), 172, 12, horizontal);
        let hdkr = tilted_irradiance(
            &site,
            &CollectorOrientation {
                sky_model: SkyModel::Hdkr,
                ..Default::default()
            },
            172,
            12,
            horizontal,
        );
        assert!(hdkr >= isotropic);
        assert_relative_eq!(hdkr, isotropic, max_relative = 0.1);
    }

    #[rstest]
    fn should_approximate_wet_bulb_temperature() {
        // reference value from Stull (2011)
        assert_relative_eq!(wet_bulb_temperature(20., 50.), 13.7, epsilon = 0.1);
        assert!(wet_bulb_temperature(30., 100.) > 29.);
    }
}
