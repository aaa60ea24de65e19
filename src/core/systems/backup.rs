//! Backup water heaters in each household, covering whatever the shared solar system could
//! not deliver.
use crate::core::component::{run_step, ComponentKind, StepFailure};
use crate::core::converters::heater::{HeaterOutputs, InstantaneousHeater};
use crate::core::storage::gas_tank::{GasTank, GasTankDrivers};

/// Heat (W) and primary energy (W of gas or electricity) of each household's backup.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BackupOutputs {
    pub heat_delivered: Vec<f64>,
    pub heat_unmet: Vec<f64>,
    pub energy_use: Vec<f64>,
}

impl BackupOutputs {
    fn with_capacity(households: usize) -> Self {
        Self {
            heat_delivered: Vec::with_capacity(households),
            heat_unmet: Vec::with_capacity(households),
            energy_use: Vec::with_capacity(households),
        }
    }

    fn push(&mut self, outputs: HeaterOutputs) {
        self.heat_delivered.push(outputs.heat_delivered);
        self.heat_unmet.push(outputs.heat_unmet);
        self.energy_use.push(outputs.energy_use);
    }

    pub fn total_heat_delivered(&self) -> f64 {
        self.heat_delivered.iter().sum()
    }

    pub fn total_energy_use(&self) -> f64 {
        self.energy_use.iter().sum()
    }
}

/// Instantaneous (tankless gas or electric resistance) heaters, one per household.
#[derive(Clone, Debug)]
pub struct InstantaneousBackup {
    heaters: Vec<InstantaneousHeater>,
}

impl InstantaneousBackup {
    pub fn new(heaters: Vec<InstantaneousHeater>) -> Self {
        Self { heaters }
    }

    fn kind(&self) -> ComponentKind {
        self.heaters
            .first()
            .map(|heater| heater.kind())
            .unwrap_or(ComponentKind::GasBurner)
    }

    /// Cover the heat the shared system left unmet, split between households by load ratio.
    pub fn cover(&self, heat_unmet: f64, load_ratios: &[f64]) -> Result<BackupOutputs, StepFailure> {
        let mut outputs = BackupOutputs::with_capacity(self.heaters.len());
        for (heater, ratio) in self.heaters.iter().zip(load_ratios) {
            let (_, heater_outputs) =
                run_step(heater.kind(), heater, &(), &(ratio * heat_unmet.max(0.)))?;
            outputs.push(heater_outputs);
        }
        Ok(outputs)
    }

    /// As [`InstantaneousBackup::cover`], with the distribution loss removed from the unmet heat
    /// whenever there is any unmet heat.
    pub fn cover_without_distribution_loss(
        &self,
        heat_unmet: f64,
        distribution_loss: f64,
        load_ratios: &[f64],
    ) -> Result<BackupOutputs, StepFailure> {
        let heat_unmet = if heat_unmet > 0. {
            (heat_unmet - distribution_loss).max(0.)
        } else {
            0.
        };
        self.cover(heat_unmet, load_ratios)
            .map_err(|failure| match failure {
                StepFailure::NonFinite {
                    quantity, value, ..
                } => StepFailure::NonFinite {
                    component: self.kind(),
                    quantity,
                    value,
                },
                other => other,
            })
    }
}

/// Gas storage water heaters kept in each household of a retrofit, heating the water arriving
/// from the solar tank.
#[derive(Clone, Debug)]
pub struct StorageBackup {
    tanks: Vec<GasTank>,
}

impl StorageBackup {
    pub fn new(tanks: Vec<GasTank>) -> Self {
        Self { tanks }
    }

    /// Arguments:
    /// * `household_draws` - hot water volume drawn by each household over the hour, in m3
    /// * `temp_feed` - temperature of the water supplied by the solar tank, in K
    pub fn heat(&self, household_draws: &[f64], temp_feed: f64) -> Result<BackupOutputs, StepFailure> {
        let mut outputs = BackupOutputs::with_capacity(self.tanks.len());
        for (tank, volume_draw) in self.tanks.iter().zip(household_draws) {
            let (_, tank_outputs) = run_step(
                ComponentKind::GasTank,
                tank,
                &(),
                &GasTankDrivers {
                    volume_draw: *volume_draw,
                    temp_feed,
                },
            )?;
            outputs.heat_delivered.push(tank_outputs.heat_delivered);
            outputs.heat_unmet.push(0.);
            outputs.energy_use.push(tank_outputs.gas_use);
        }
        Ok(outputs)
    }
}
