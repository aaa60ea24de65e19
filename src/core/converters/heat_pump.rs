use crate::core::component::{
    ComponentKind, ComponentParameters, ComponentStepError, HourlyStep, ReportedOutputs,
};
use crate::core::units::ZERO_CELSIUS_IN_KELVIN;
use crate::errors::InvalidInputError;

/// Biquadratic performance curve in wet bulb and tank temperature (both in deg C):
/// `c1 + c2*Twb + c3*Twb^2 + c4*Tt + c5*Tt^2 + c6*Twb*Tt`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PerformanceCurve([f64; 6]);

impl PerformanceCurve {
    pub fn new(coefficients: [f64; 6]) -> Self {
        Self(coefficients)
    }

    fn from_parameters(
        params: &ComponentParameters,
        prefix: &str,
    ) -> Result<Self, InvalidInputError> {
        let mut coefficients = [0.; 6];
        for (i, coefficient) in coefficients.iter_mut().enumerate() {
            *coefficient = params.get(ComponentKind::HeatPump, &format!("{prefix}_c{}", i + 1))?;
        }
        Ok(Self(coefficients))
    }

    pub fn factor(&self, temp_wet_bulb_c: f64, temp_tank_c: f64) -> f64 {
        let [c1, c2, c3, c4, c5, c6] = self.0;
        c1 + c2 * temp_wet_bulb_c
            + c3 * temp_wet_bulb_c.powi(2)
            + c4 * temp_tank_c
            + c5 * temp_tank_c.powi(2)
            + c6 * temp_wet_bulb_c * temp_tank_c
    }
}

/// Air source heat pump heating a storage tank, with on/off temperature hysteresis control.
#[derive(Clone, Debug)]
pub struct HeatPump {
    rated_heat_capacity: f64,
    rated_cop: f64,
    cop_curve: PerformanceCurve,
    capacity_curve: PerformanceCurve,
    hysteresis_band: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeatPumpControlState {
    pub on: bool,
}

impl Default for HeatPumpControlState {
    fn default() -> Self {
        Self { on: true }
    }
}

pub struct HeatPumpDrivers {
    /// in K
    pub temp_wet_bulb: f64,
    /// temperature of the tank volume that is tapped, in K
    pub temp_tank: f64,
    /// tank temperature at which the heat pump switches off, in K
    pub temp_limit: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HeatPumpOutputs {
    pub heat_capacity: f64,
    pub electricity_use: f64,
    pub cop: f64,
}

impl ReportedOutputs for HeatPumpOutputs {
    fn named_values(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("heat pump heat rate", self.heat_capacity),
            ("heat pump electricity use", self.electricity_use),
            ("heat pump COP", self.cop),
        ]
    }
}

impl HeatPump {
    /// Arguments:
    /// * `rated_heat_capacity` - in W
    /// * `params` - performance curve coefficients, rated COP and hysteresis band
    pub fn from_parameters(
        rated_heat_capacity: f64,
        params: &ComponentParameters,
    ) -> Result<Self, InvalidInputError> {
        Ok(Self {
            rated_heat_capacity,
            rated_cop: params.get(ComponentKind::HeatPump, "rated_cop")?,
            cop_curve: PerformanceCurve::from_parameters(params, "cop")?,
            capacity_curve: PerformanceCurve::from_parameters(params, "cap")?,
            hysteresis_band: params.get(ComponentKind::HeatPump, "hysteresis_band")?,
        })
    }

    /// Performance while running at the given wet bulb and tank temperatures (in K).
    pub fn performance(
        &self,
        temp_wet_bulb: f64,
        temp_tank: f64,
    ) -> Result<HeatPumpOutputs, ComponentStepError> {
        let twb = temp_wet_bulb - ZERO_CELSIUS_IN_KELVIN;
        let tt = temp_tank - ZERO_CELSIUS_IN_KELVIN;

        let heat_capacity = (self.rated_heat_capacity * self.capacity_curve.factor(twb, tt)).max(0.);
        let cop = self.rated_cop * self.cop_curve.factor(twb, tt);
        if cop <= 0. {
            return Err(ComponentStepError::NonPositiveCop { cop });
        }
        let electricity_use = if heat_capacity > 0. {
            heat_capacity / cop
        } else {
            0.
        };

        Ok(HeatPumpOutputs {
            heat_capacity,
            electricity_use,
            cop,
        })
    }

    fn should_run(&self, state: &HeatPumpControlState, temp_tank: f64, temp_limit: f64) -> bool {
        (state.on && temp_tank < temp_limit)
            || (!state.on && temp_tank < temp_limit - self.hysteresis_band)
    }
}

impl HourlyStep for HeatPump {
    type State = HeatPumpControlState;
    type Drivers = HeatPumpDrivers;
    type Outputs = HeatPumpOutputs;

    fn step(
        &self,
        state: &HeatPumpControlState,
        drivers: &HeatPumpDrivers,
    ) -> Result<(HeatPumpControlState, HeatPumpOutputs), ComponentStepError> {
        if self.should_run(state, drivers.temp_tank, drivers.temp_limit) {
            Ok((
                HeatPumpControlState { on: true },
                self.performance(drivers.temp_wet_bulb, drivers.temp_tank)?,
            ))
        } else {
            Ok((
                HeatPumpControlState { on: false },
                HeatPumpOutputs::default(),
            ))
        }
    }
}
