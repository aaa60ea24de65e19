use crate::core::component::{
    ComponentKind, ComponentParameters, ComponentStepError, HourlyStep, ReportedOutputs,
};
use crate::errors::InvalidInputError;

/// Instantaneous heater (tankless gas burner or electric resistance element) covering a heat
/// demand up to its nominal power.
#[derive(Clone, Debug)]
pub struct InstantaneousHeater {
    kind: ComponentKind,
    nominal_power: Option<f64>,
    efficiency: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HeaterOutputs {
    pub heat_delivered: f64,
    pub heat_unmet: f64,
    /// gas or electricity, in W
    pub energy_use: f64,
}

impl ReportedOutputs for HeaterOutputs {
    fn named_values(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("heater heat delivered", self.heat_delivered),
            ("heater heat unmet", self.heat_unmet),
            ("heater energy use", self.energy_use),
        ]
    }
}

impl InstantaneousHeater {
    pub fn gas_burner(
        nominal_power: Option<f64>,
        params: &ComponentParameters,
    ) -> Result<Self, InvalidInputError> {
        Ok(Self {
            kind: ComponentKind::GasBurner,
            nominal_power,
            efficiency: params.get(ComponentKind::GasBurner, "combustion_efficiency")?,
        })
    }

    pub fn electric_resistance(
        nominal_power: Option<f64>,
        params: &ComponentParameters,
    ) -> Result<Self, InvalidInputError> {
        Ok(Self {
            kind: ComponentKind::ElectricResistance,
            nominal_power,
            efficiency: params.get(ComponentKind::ElectricResistance, "efficiency")?,
        })
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    /// Arguments:
    /// * `heat_demand` - heat rate to be covered during the hour, in W
    pub fn demand_heat(&self, heat_demand: f64) -> HeaterOutputs {
        let heat_delivered = match self.nominal_power {
            Some(nominal_power) => heat_demand.min(nominal_power),
            None => heat_demand,
        };

        HeaterOutputs {
            heat_delivered,
            heat_unmet: heat_demand - heat_delivered,
            energy_use: heat_delivered / self.efficiency,
        }
    }
}

impl HourlyStep for InstantaneousHeater {
    type State = ();
    type Drivers = f64;
    type Outputs = HeaterOutputs;

    fn step(&self, _state: &(), heat_demand: &f64) -> Result<((), HeaterOutputs), ComponentStepError> {
        Ok(((), self.demand_heat(*heat_demand)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn should_cover_demand_below_nominal_power() {
        let burner = InstantaneousHeater::gas_burner(
            Some(43_000.),
            &ComponentKind::GasBurner.default_parameters(),
        )
        .unwrap();
        let outputs = burner.demand_heat(1_700.);
        assert_eq!(outputs.heat_delivered, 1_700.);
        assert_eq!(outputs.heat_unmet, 0.);
        assert_relative_eq!(outputs.energy_use, 2_000.);
    }

    #[rstest]
    fn should_cap_delivery_at_nominal_power() {
        let element = InstantaneousHeater::electric_resistance(
            Some(6_500.),
            &ComponentKind::ElectricResistance.default_parameters(),
        )
        .unwrap();
        let outputs = element.demand_heat(8_000.);
        assert_eq!(
            outputs,
            HeaterOutputs {
                heat_delivered: 6_500.,
                heat_unmet: 1_500.,
                energy_use: 6_500.
            }
        );
    }

    #[rstest]
    fn should_deliver_everything_without_nominal_power() {
        let element = InstantaneousHeater::electric_resistance(
            None,
            &ComponentKind::ElectricResistance.default_parameters(),
        )
        .unwrap();
        assert_eq!(element.demand_heat(1e5).heat_unmet, 0.);
    }
}
