use crate::errors::InvalidInputError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

/// The kinds of component that can take part in a system.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    Eq,
    Hash,
    PartialEq,
    Serialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ComponentKind {
    SolarCollector,
    PhotovoltaicPanel,
    HeatPump,
    GasBurner,
    ElectricResistance,
    SolarThermalTank,
    HeatPumpTank,
    GasTank,
    SolarPump,
    DistributionPump,
    Piping,
}

impl ComponentKind {
    /// Performance parameters used when no external parameter set is available.
    pub fn default_parameters(&self) -> ComponentParameters {
        let values: &[(&str, f64)] = match self {
            ComponentKind::SolarCollector => &[
                ("hwb_intercept", 0.753),
                ("hwb_slope", -4.025),
                ("cd_intercept", 0.75),
                ("cd_a1", -3.688),
                ("cd_a2", -0.0055),
            ],
            ComponentKind::PhotovoltaicPanel => &[
                ("efficiency", 0.16),
                ("active_area_fraction", 1.),
                ("reference_irradiance", 1000.),
                ("dc_to_ac_efficiency", 0.85),
            ],
            ComponentKind::HeatPump => &[
                ("rated_cop", 2.43),
                ("cop_c1", 1.229),
                ("cop_c2", 5.549e-2),
                ("cop_c3", 1.139e-4),
                ("cop_c4", -1.128e-2),
                ("cop_c5", -3.570e-6),
                ("cop_c6", -7.234e-4),
                ("cap_c1", 7.055e-1),
                ("cap_c2", 3.945e-2),
                ("cap_c3", 1.433e-4),
                ("cap_c4", 2.768e-3),
                ("cap_c5", -1.069e-4),
                ("cap_c6", -2.494e-4),
                ("hysteresis_band", 5.),
            ],
            ComponentKind::GasBurner => &[("combustion_efficiency", 0.85)],
            ComponentKind::ElectricResistance => &[("efficiency", 1.)],
            ComponentKind::SolarThermalTank => &[
                ("upper_volume_fraction", 0.5),
                ("height_to_radius", 6.),
                ("approach_temp_difference", 2.),
                ("max_temp", 344.15),
                ("insulation_thickness", 0.085),
                ("insulation_conductivity", 0.04),
                ("coil_efficiency", 0.84),
                ("overcool_warning_temp_difference", 2.),
            ],
            ComponentKind::HeatPumpTank => &[
                ("upper_volume_fraction", 0.5),
                ("height_to_radius", 6.),
                ("approach_temp_difference", 2.),
                ("max_temp", 344.15),
                ("insulation_thickness", 0.04),
                ("insulation_conductivity", 0.04),
                ("coil_efficiency", 1.),
                ("overcool_warning_temp_difference", 2.),
            ],
            ComponentKind::GasTank => &[
                ("recovery_efficiency", 0.78),
                ("height_to_radius", 6.),
                ("insulation_thickness", 0.03),
                ("insulation_conductivity", 0.081),
                ("ambient_temp", 291.48),
                ("nominal_power_per_volume", 63_560.),
                ("nominal_power_offset", 1777.9),
            ],
            ComponentKind::SolarPump | ComponentKind::DistributionPump => {
                &[("efficiency", 0.85)]
            }
            ComponentKind::Piping => &[
                ("insulation_thickness", 0.008),
                ("insulation_conductivity", 0.0175),
                ("flow_factor", 0.8),
                ("circulation", 0.),
                ("length_ratio", 1.),
            ],
        };

        ComponentParameters::from_iter(values.iter().map(|(k, v)| (k.to_string(), *v)))
    }
}

/// A performance parameter mapping (name to value) for a single component kind.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ComponentParameters(IndexMap<String, f64>);

impl ComponentParameters {
    pub fn get(&self, component: ComponentKind, name: &str) -> Result<f64, InvalidInputError> {
        self.0
            .get(name)
            .copied()
            .ok_or_else(|| InvalidInputError::MissingComponentParameter {
                component,
                parameter: name.to_string(),
            })
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    /// Return a copy of these parameters with the given values replacing or adding to them.
    pub fn with_overrides(&self, overrides: Option<&ComponentParameters>) -> Self {
        let mut merged = self.clone();
        if let Some(overrides) = overrides {
            for (name, value) in overrides.0.iter() {
                merged.0.insert(name.clone(), *value);
            }
        }
        merged
    }
}

impl FromIterator<(String, f64)> for ComponentParameters {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        Self(IndexMap::from_iter(iter))
    }
}

/// Errors raised by a component when its internal balance cannot be kept.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ComponentStepError {
    #[error("lower volume temperature {lower} K is above upper volume temperature {upper} K")]
    InvertedStratification { upper: f64, lower: f64 },
    #[error("tap balance relative error {relative_error} exceeds 1%")]
    TapBalance { relative_error: f64 },
    #[error("coefficient of performance {cop} is not positive")]
    NonPositiveCop { cop: f64 },
}

/// A failure of a single hourly step, attributed to the component that produced it.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum StepFailure {
    #[error("{component} produced a non-finite {quantity} ({value})")]
    NonFinite {
        component: ComponentKind,
        quantity: &'static str,
        value: f64,
    },
    #[error("{component} failed: {source}")]
    Component {
        component: ComponentKind,
        source: ComponentStepError,
    },
}

/// Shared capability of every component model: given the state at the start of an hour and
/// the drivers for that hour, produce the state at the end of the hour and the hour's outputs.
///
/// Only values known at the start of the step are used, so every implementation is an explicit
/// (forward Euler) update.
pub trait HourlyStep {
    type State: Clone + Debug;
    type Drivers;
    type Outputs: ReportedOutputs;

    fn step(
        &self,
        state: &Self::State,
        drivers: &Self::Drivers,
    ) -> Result<(Self::State, Self::Outputs), ComponentStepError>;
}

/// Outputs that can be inspected by name, used to check every reported quantity is finite.
pub trait ReportedOutputs {
    fn named_values(&self) -> Vec<(&'static str, f64)>;
}

impl ReportedOutputs for () {
    fn named_values(&self) -> Vec<(&'static str, f64)> {
        vec![]
    }
}

/// Run one hourly step of a component and check that all outputs are finite.
pub fn run_step<C: HourlyStep>(
    component: ComponentKind,
    model: &C,
    state: &C::State,
    drivers: &C::Drivers,
) -> Result<(C::State, C::Outputs), StepFailure> {
    let (new_state, outputs) = model
        .step(state, drivers)
        .map_err(|source| StepFailure::Component { component, source })?;
    ensure_finite(component, &outputs)?;

    Ok((new_state, outputs))
}

pub fn ensure_finite(
    component: ComponentKind,
    outputs: &impl ReportedOutputs,
) -> Result<(), StepFailure> {
    match outputs
        .named_values()
        .into_iter()
        .find(|(_, value)| !value.is_finite())
    {
        Some((quantity, value)) => Err(StepFailure::NonFinite {
            component,
            quantity,
            value,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    struct Doubler;

    #[derive(Debug)]
    struct Doubled(f64);

    impl ReportedOutputs for Doubled {
        fn named_values(&self) -> Vec<(&'static str, f64)> {
            vec![("doubled", self.0)]
        }
    }

    impl HourlyStep for Doubler {
        type State = f64;
        type Drivers = f64;
        type Outputs = Doubled;

        fn step(&self, state: &f64, drivers: &f64) -> Result<(f64, Doubled), ComponentStepError> {
            Ok((state + drivers, Doubled(2. * drivers)))
        }
    }

    #[rstest]
    fn should_pass_through_finite_step() {
        let (state, outputs) = run_step(ComponentKind::HeatPump, &Doubler, &1., &2.).unwrap();
        assert_eq!(state, 3.);
        assert_eq!(outputs.0, 4.);
    }

    #[rstest]
    fn should_flag_non_finite_outputs() {
        let failure = run_step(ComponentKind::HeatPump, &Doubler, &1., &f64::INFINITY).unwrap_err();
        assert_eq!(
            failure,
            StepFailure::NonFinite {
                component: ComponentKind::HeatPump,
                quantity: "doubled",
                value: f64::INFINITY
            }
        );
    }

    #[rstest]
    fn should_have_default_parameters_for_every_kind() {
        for kind in ComponentKind::iter() {
            assert!(kind.default_parameters() != ComponentParameters::default());
        }
    }

    #[rstest]
    fn should_report_missing_parameter() {
        let params = ComponentKind::GasBurner.default_parameters();
        assert!(params.get(ComponentKind::GasBurner, "nonexistent").is_err());
        assert_eq!(
            params
                .get(ComponentKind::GasBurner, "combustion_efficiency")
                .unwrap(),
            0.85
        );
    }

    #[rstest]
    fn should_apply_overrides() {
        let mut overrides = ComponentParameters::default();
        overrides.insert("combustion_efficiency", 0.9);
        let params = ComponentKind::GasBurner
            .default_parameters()
            .with_overrides(Some(&overrides));
        assert_eq!(
            params
                .get(ComponentKind::GasBurner, "combustion_efficiency")
                .unwrap(),
            0.9
        );
    }

    #[rstest]
    fn should_parse_kind_from_snake_case() {
        assert_eq!(
            ComponentKind::from_str("solar_thermal_tank").unwrap(),
            ComponentKind::SolarThermalTank
        );
        assert_eq!(ComponentKind::HeatPumpTank.to_string(), "heat_pump_tank");
    }
}
