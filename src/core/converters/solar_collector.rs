use crate::core::component::{
    ComponentKind, ComponentParameters, ComponentStepError, HourlyStep, ReportedOutputs,
};
use crate::errors::InvalidInputError;
use serde::{Deserialize, Serialize};

/// Rating curve shape used to calculate the instantaneous collector efficiency.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectorEfficiencyModel {
    /// Linear curve of a glazed flat plate collector
    #[default]
    HotWaterBasic,
    /// Second order curve of a combined drainback collector
    CombinedDrainback,
}

#[derive(Clone, Debug)]
pub struct SolarCollector {
    model: CollectorEfficiencyModel,
    gross_area: f64,
    intercept: f64,
    a_1: f64,
    a_2: f64,
}

pub struct CollectorDrivers {
    /// collector inlet temperature, in K
    pub temp_inlet: f64,
    /// ambient air temperature, in K
    pub temp_ambient: f64,
    /// irradiance on the collector plane, in W/m2
    pub irradiance: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CollectorOutputs {
    pub gain: f64,
    pub efficiency: f64,
}

impl ReportedOutputs for CollectorOutputs {
    fn named_values(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("collector gain", self.gain),
            ("collector efficiency", self.efficiency),
        ]
    }
}

impl SolarCollector {
    /// Arguments:
    /// * `model` - efficiency curve to use
    /// * `gross_area` - collector gross area, in m2
    /// * `intercept` - optical efficiency
    /// * `a_1` - first order loss coefficient, in W/m2K
    /// * `a_2` - second order loss coefficient (combined drainback only)
    pub fn new(
        model: CollectorEfficiencyModel,
        gross_area: f64,
        intercept: f64,
        a_1: f64,
        a_2: f64,
    ) -> Self {
        Self {
            model,
            gross_area,
            intercept,
            a_1,
            a_2,
        }
    }

    pub fn from_parameters(
        model: CollectorEfficiencyModel,
        gross_area: f64,
        params: &ComponentParameters,
    ) -> Result<Self, InvalidInputError> {
        let kind = ComponentKind::SolarCollector;
        Ok(match model {
            CollectorEfficiencyModel::HotWaterBasic => Self::new(
                model,
                gross_area,
                params.get(kind, "hwb_intercept")?,
                params.get(kind, "hwb_slope")?,
                0.,
            ),
            CollectorEfficiencyModel::CombinedDrainback => Self::new(
                model,
                gross_area,
                params.get(kind, "cd_intercept")?,
                params.get(kind, "cd_a1")?,
                params.get(kind, "cd_a2")?,
            ),
        })
    }

    pub fn gross_area(&self) -> f64 {
        self.gross_area
    }

    /// Instantaneous efficiency; zero when there is no irradiance.
    pub fn efficiency(&self, temp_inlet: f64, temp_ambient: f64, irradiance: f64) -> f64 {
        if irradiance == 0. {
            return 0.;
        }
        let temp_diff = temp_inlet - temp_ambient;

        match self.model {
            CollectorEfficiencyModel::HotWaterBasic => {
                self.intercept + self.a_1 * temp_diff / irradiance
            }
            CollectorEfficiencyModel::CombinedDrainback => {
                self.intercept
                    + self.a_1 * temp_diff / irradiance
                    + self.a_2 * temp_diff / irradiance.powi(2)
            }
        }
    }

    pub fn outputs(&self, drivers: &CollectorDrivers) -> CollectorOutputs {
        let efficiency = self.efficiency(
            drivers.temp_inlet,
            drivers.temp_ambient,
            drivers.irradiance,
        );
        // negative gains at cold weather are not physical
        let gain = (drivers.irradiance * self.gross_area * efficiency).max(0.);

        CollectorOutputs { gain, efficiency }
    }
}

impl HourlyStep for SolarCollector {
    type State = ();
    type Drivers = CollectorDrivers;
    type Outputs = CollectorOutputs;

    fn step(
        &self,
        _state: &(),
        drivers: &CollectorDrivers,
    ) -> Result<((), CollectorOutputs), ComponentStepError> {
        Ok(((), self.outputs(drivers)))
    }
}
