use crate::core::component::{
    ComponentKind, ComponentParameters, ComponentStepError, HourlyStep, ReportedOutputs,
};
use crate::errors::InvalidInputError;

/// Circulation pump, either on the solar loop or on a community distribution loop.
#[derive(Clone, Debug)]
pub struct Pump {
    kind: ComponentKind,
    nominal_power: f64,
    efficiency: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PumpOutputs {
    pub electricity_use: f64,
    pub on_fraction: f64,
}

impl ReportedOutputs for PumpOutputs {
    fn named_values(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("pump electricity use", self.electricity_use),
            ("pump on fraction", self.on_fraction),
        ]
    }
}

impl Pump {
    /// Arguments:
    /// * `kind` - solar or distribution pump
    /// * `nominal_power` - in W
    pub fn from_parameters(
        kind: ComponentKind,
        nominal_power: f64,
        params: &ComponentParameters,
    ) -> Result<Self, InvalidInputError> {
        Ok(Self {
            kind,
            nominal_power,
            efficiency: params.get(kind, "efficiency")?,
        })
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn nominal_power(&self) -> f64 {
        self.nominal_power
    }

    /// Electricity use for the fraction of the hour the pump runs (clamped to 0..=1)
    pub fn operate(&self, on_fraction: f64) -> PumpOutputs {
        let on_fraction = on_fraction.clamp(0., 1.);
        PumpOutputs {
            electricity_use: self.nominal_power / self.efficiency * on_fraction,
            on_fraction,
        }
    }
}

impl HourlyStep for Pump {
    type State = ();
    type Drivers = f64;
    type Outputs = PumpOutputs;

    fn step(&self, _state: &(), on_fraction: &f64) -> Result<((), PumpOutputs), ComponentStepError> {
        Ok(((), self.operate(*on_fraction)))
    }
}
