use crate::core::component::{ComponentKind, ComponentParameters};
use crate::core::material_properties::{MaterialProperties, WATER};
use crate::core::units::per_hour_to_per_second;
use crate::errors::InvalidInputError;
use std::f64::consts::PI;

/// Nominal inner diameters available for distribution piping, in m
pub const PIPE_DIAMETERS: [f64; 9] = [
    0.0127, 0.01905, 0.0254, 0.03175, 0.0381, 0.0508, 0.0635, 0.0762, 0.1016,
];

// fit of installed pipe diameter against total pipe length
const DIAMETER_FIT_COEFFICIENT: f64 = 0.007911283766743384;
const DIAMETER_FIT_EXPONENT: f64 = 0.43082708345352605;

/// Heat loss from insulated hot water distribution piping.
#[derive(Clone, Debug)]
pub struct Piping {
    length: f64,
    diameter: f64,
    insulation_thickness: f64,
    u_value: f64,
    flow_factor: f64,
    circulation: bool,
    length_ratio: f64,
    contents: MaterialProperties,
}

pub struct PipingDrivers {
    /// temperature of water leaving the tank, in K
    pub temp_in: f64,
    /// temperature around the piping, in K
    pub temp_ambient: f64,
    /// volume drawn during the hour, in m3
    pub volume: f64,
    /// largest hourly volume drawn over the year, in m3
    pub max_volume: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PipingOutputs {
    /// average heat loss over the hour, in W
    pub heat_loss: f64,
    /// temperature drop along the piping while water flows, in K
    pub temp_drop: f64,
    /// fraction of the hour with flow in the piping
    pub flow_on_fraction: f64,
}


/// Select the smallest catalogue diameter that is not smaller than the fitted diameter for
/// the given length.
pub fn pipe_diameter_for_length(length: f64) -> f64 {
    let fitted = DIAMETER_FIT_COEFFICIENT * length.powf(DIAMETER_FIT_EXPONENT);
    PIPE_DIAMETERS
        .iter()
        .copied()
        .find(|diameter| *diameter >= fitted)
        .unwrap_or(PIPE_DIAMETERS[PIPE_DIAMETERS.len() - 1])
}

impl Piping {
    /// Arguments:
    /// * `length` - total length of piping, in m
    /// * `params` - insulation properties, flow factor, circulation flag and the ratio of
    ///              effective to total length
    pub fn from_parameters(
        length: f64,
        params: &ComponentParameters,
    ) -> Result<Self, InvalidInputError> {
        let kind = ComponentKind::Piping;
        let insulation_thickness = params.get(kind, "insulation_thickness")?;

        Ok(Self {
            length,
            diameter: pipe_diameter_for_length(length),
            insulation_thickness,
            u_value: params.get(kind, "insulation_conductivity")? / insulation_thickness,
            flow_factor: params.get(kind, "flow_factor")?,
            circulation: params.get(kind, "circulation")? != 0.,
            length_ratio: params.get(kind, "length_ratio")?,
            contents: *WATER,
        })
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn diameter(&self) -> f64 {
        self.diameter
    }

    fn outer_circumference(&self) -> f64 {
        (self.diameter + 2. * self.insulation_thickness) * PI
    }

    pub fn losses(&self, drivers: &PipingDrivers) -> PipingOutputs {
        if self.length <= 0. || drivers.max_volume <= 0. {
            return PipingOutputs::default();
        }

        let (flow_on_fraction, volume) = if self.circulation {
            (1., drivers.max_volume / self.flow_factor)
        } else {
            (
                drivers.volume * self.flow_factor / drivers.max_volume,
                drivers.volume,
            )
        };

        if volume <= 0. {
            return PipingOutputs::default();
        }

        // flow rate while the piping is in use, in m3/s
        let flow_rate = per_hour_to_per_second(volume / flow_on_fraction);
        let effective_length = self.length_ratio * self.length;
        let capacity_rate = self.contents.volumetric_heat_capacity() * flow_rate;

        let k = self.u_value * self.outer_circumference() * effective_length / capacity_rate;
        let temp_avg =
            (drivers.temp_in - drivers.temp_ambient) * (1. - (-k).exp()) / k + drivers.temp_ambient;

        let loss_rate =
            self.outer_circumference() * self.length * self.u_value * (temp_avg - drivers.temp_ambient);
        let temp_drop = loss_rate * self.length_ratio / capacity_rate;

        PipingOutputs {
            heat_loss: loss_rate * flow_on_fraction,
            temp_drop,
            flow_on_fraction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn piping() -> Piping {
        Piping::from_parameters(3.048, &ComponentKind::Piping.default_parameters()).unwrap()
    }

    #[rstest]
    #[case(1., 0.0127)]
    #[case(3.048, 0.01905)]
    #[case(91.44, 0.0635)]
    #[case(10_000., 0.1016)]
    fn should_snap_pipe_diameter(#[case] length: f64, #[case] expected: f64) {
        assert_eq!(pipe_diameter_for_length(length), expected);
    }

    #[rstest]
    fn should_lose_nothing_without_flow(piping: Piping) {
        let outputs = piping.losses(&PipingDrivers {
            temp_in: 330.,
            temp_ambient: 290.,
            volume: 0.,
            max_volume: 0.05,
        });
        assert_eq!(outputs, PipingOutputs::default());
    }

    #[rstest]
    fn should_calc_loss_and_temperature_drop(piping: Piping) {
        let drivers = PipingDrivers {
            temp_in: 330.,
            temp_ambient: 290.,
            volume: 0.025,
            max_volume: 0.05,
        };
        let outputs = piping.losses(&drivers);

        let u = 0.0175 / 0.008;
        let circumference = (0.01905 + 0.016) * PI;
        let frac = 0.025 * 0.8 / 0.05;
        let flow_rate = 0.025 / frac / 3600.;
        let capacity_rate = 998.2 * 4180. * flow_rate;
        let k = u * circumference * 3.048 / capacity_rate;
        let temp_avg = 40. * (1. - (-k).exp()) / k + 290.;
        let loss_rate = circumference * 3.048 * u * (temp_avg - 290.);

        assert_relative_eq!(outputs.flow_on_fraction, 0.4, max_relative = 1e-12);
        assert_relative_eq!(outputs.heat_loss, loss_rate * frac, max_relative = 1e-9);
        assert_relative_eq!(outputs.temp_drop, loss_rate / capacity_rate, max_relative = 1e-9);
        assert!(outputs.temp_drop > 0. && outputs.temp_drop < 40.);
    }

    #[rstest]
    fn should_run_full_hour_with_circulation() {
        let mut params = ComponentKind::Piping.default_parameters();
        params.insert("circulation", 1.);
        let piping = Piping::from_parameters(30., &params).unwrap();
        let outputs = piping.losses(&PipingDrivers {
            temp_in: 330.,
            temp_ambient: 290.,
            volume: 0.,
            max_volume: 0.05,
        });
        assert_eq!(outputs.flow_on_fraction, 1.);
        assert!(outputs.heat_loss > 0.);
    }

    #[rstest]
    fn should_have_no_losses_for_zero_length() {
        let piping =
            Piping::from_parameters(0., &ComponentKind::Piping.default_parameters()).unwrap();
        let outputs = piping.losses(&PipingDrivers {
            temp_in: 330.,
            temp_ambient: 290.,
            volume: 0.05,
            max_volume: 0.05,
        });
        assert_eq!(outputs, PipingOutputs::default());
    }
}
