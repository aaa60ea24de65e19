use crate::core::component::{
    ComponentKind, ComponentParameters, ComponentStepError, HourlyStep, ReportedOutputs,
};
use crate::errors::InvalidInputError;

/// How the panel output is scaled.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PanelRating {
    /// Gross panel area, in m2
    Area(f64),
    /// Peak power at reference irradiance, in W
    PeakPower(f64),
}

#[derive(Clone, Debug)]
pub struct PhotovoltaicPanel {
    rating: PanelRating,
    efficiency: f64,
    active_area_fraction: f64,
    reference_irradiance: f64,
    dc_to_ac_efficiency: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PanelOutputs {
    pub dc: f64,
    pub ac: f64,
}

impl ReportedOutputs for PanelOutputs {
    fn named_values(&self) -> Vec<(&'static str, f64)> {
        vec![("PV dc power", self.dc), ("PV ac power", self.ac)]
    }
}

impl PhotovoltaicPanel {
    pub fn from_parameters(
        rating: PanelRating,
        params: &ComponentParameters,
    ) -> Result<Self, InvalidInputError> {
        let kind = ComponentKind::PhotovoltaicPanel;
        Ok(Self {
            rating,
            efficiency: params.get(kind, "efficiency")?,
            active_area_fraction: params.get(kind, "active_area_fraction")?,
            reference_irradiance: params.get(kind, "reference_irradiance")?,
            dc_to_ac_efficiency: params.get(kind, "dc_to_ac_efficiency")?,
        })
    }

    /// Return the DC and AC power in W for irradiance on the panel plane in W/m2
    pub fn power(&self, irradiance: f64) -> PanelOutputs {
        let dc = match self.rating {
            PanelRating::Area(area) => {
                area * self.active_area_fraction * self.efficiency * irradiance
            }
            PanelRating::PeakPower(peak) => peak / self.reference_irradiance * irradiance,
        };

        PanelOutputs {
            dc,
            ac: dc * self.dc_to_ac_efficiency,
        }
    }
}

impl HourlyStep for PhotovoltaicPanel {
    type State = ();
    type Drivers = f64;
    type Outputs = PanelOutputs;

    fn step(&self, _state: &(), irradiance: &f64) -> Result<((), PanelOutputs), ComponentStepError> {
        Ok(((), self.power(*irradiance)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::*;

    #[rstest]
    #[case(PanelRating::Area(6.25), 800., 800.)]
    #[case(PanelRating::PeakPower(1000.), 800., 800.)]
    #[case(PanelRating::Area(6.25), 0., 0.)]
    fn should_calc_panel_power(
        #[case] rating: PanelRating,
        #[case] irradiance: f64,
        #[case] expected_dc: f64,
    ) {
        let panel = PhotovoltaicPanel::from_parameters(
            rating,
            &ComponentKind::PhotovoltaicPanel.default_parameters(),
        )
        .unwrap();
        let outputs = panel.power(irradiance);
        assert_relative_eq!(outputs.dc, expected_dc, max_relative = 1e-9);
        assert_relative_eq!(outputs.ac, expected_dc * 0.85, max_relative = 1e-9);
    }
}
