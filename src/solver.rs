//! Annual hourly solver: marches a composed system through the representative year one hour at
//! a time, never revisiting an hour.
use crate::core::component::ComponentKind;
use crate::core::systems::gas_tank::GasTankSystem;
use crate::core::systems::solar_electric::SolarElectricSystem;
use crate::core::systems::solar_thermal::SolarThermalSystem;
use crate::core::systems::{HourlySystem, SystemDrivers, SystemParameters};
use crate::core::water_heat_demand::load_profile::LoadProfile;
use crate::errors::{FailedRun, FailureReport, InvalidInputError, SwhError};
use crate::input::{Input, SystemConfiguration, SystemType};
use crate::parameter_store::{LoadRequest, ParameterStore};
use crate::results::{AnnualSummary, ResultSeries};
use crate::simulation_time::SimulationTime;
use crate::sizing::{size_system, SystemSizes};
use crate::weather::WeatherSeries;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info};

/// Where a run is in its lifecycle. `Running { hour }` names the next hour to be stepped.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SolverStatus {
    Initialized,
    Running { hour: usize },
    Completed,
    Failed { hour: usize },
    Cancelled { hour: usize },
}

/// Results of a run that stepped every hour of the year.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationRun {
    pub system_type: SystemType,
    pub results: ResultSeries,
    pub solar_fraction: f64,
}

pub struct AnnualSolver<S: HourlySystem> {
    system: S,
    weather: WeatherSeries,
    loads: LoadProfile,
    simulation_time: SimulationTime,
    state: S::State,
    results: ResultSeries,
    status: SolverStatus,
    failure: Option<FailureReport>,
}

impl<S: HourlySystem> AnnualSolver<S> {
    /// Check the drivers cover the whole year and set the system to its initial state.
    /// Invalid drivers are rejected here, so a solver that reaches `Running` has valid inputs.
    pub fn new(
        system: S,
        weather: WeatherSeries,
        loads: LoadProfile,
        year_length: usize,
    ) -> Result<Self, InvalidInputError> {
        weather.validate(year_length)?;
        loads.validate(year_length)?;
        let temp_mains = weather.temp_water_mains.first().copied().ok_or_else(|| {
            InvalidInputError::SeriesLength {
                series: "weather water mains temperature".into(),
                expected: year_length.max(1),
                actual: 0,
            }
        })?;

        let household_ids = loads.households().iter().map(|h| h.id.clone()).collect();

        Ok(Self {
            state: system.initial_state(temp_mains),
            system,
            weather,
            loads,
            simulation_time: SimulationTime::new(year_length),
            results: ResultSeries::new(household_ids),
            status: SolverStatus::Initialized,
            failure: None,
        })
    }

    pub fn status(&self) -> SolverStatus {
        self.status
    }

    pub fn state(&self) -> &S::State {
        &self.state
    }

    /// Results of every hour stepped so far.
    pub fn results(&self) -> &ResultSeries {
        &self.results
    }

    /// Step the next hour. A completed or cancelled run is left unchanged; a failed run
    /// reports its failure again.
    pub fn advance(&mut self) -> Result<SolverStatus, FailureReport> {
        if let Some(report) = &self.failure {
            return Err(report.clone());
        }
        let hour = match self.status {
            SolverStatus::Initialized => 0,
            SolverStatus::Running { hour } => hour,
            finished => return Ok(finished),
        };
        let total_steps = self.simulation_time.total_steps();
        if hour >= total_steps {
            self.status = SolverStatus::Completed;
            return Ok(self.status);
        }
        self.status = SolverStatus::Running { hour };

        let drivers = SystemDrivers {
            hour,
            weather: self.weather.at(hour),
            loads: &self.loads,
        };
        match self.system.step(&self.state, &drivers) {
            Ok((state, results)) => {
                self.state = state;
                self.results.append(results);
                self.status = if hour + 1 == total_steps {
                    SolverStatus::Completed
                } else {
                    SolverStatus::Running { hour: hour + 1 }
                };
                Ok(self.status)
            }
            Err(cause) => {
                error!("run failed at hour {hour}: {cause}");
                self.status = SolverStatus::Failed { hour };
                let report = FailureReport { hour, cause };
                self.failure = Some(report.clone());
                Err(report)
            }
        }
    }

    /// Step every remaining hour, checking for cancellation between hours.
    pub fn run(mut self, cancel: &AtomicBool) -> Result<SimulationRun, SwhError> {
        info!(
            "running {:?} system over {} hours",
            self.system.system_type(),
            self.simulation_time.total_steps()
        );
        loop {
            if let Some(report) = self.failure.take() {
                return Err(FailedRun {
                    report,
                    partial: self.results,
                }
                .into());
            }
            match self.status {
                SolverStatus::Completed => break,
                SolverStatus::Cancelled { hour } => {
                    return Err(SwhError::Cancelled {
                        hour,
                        partial: Box::new(self.results),
                    });
                }
                SolverStatus::Initialized | SolverStatus::Running { .. }
                    if cancel.load(Ordering::Relaxed) =>
                {
                    let hour = match self.status {
                        SolverStatus::Running { hour } => hour,
                        _ => 0,
                    };
                    info!("run cancelled before hour {hour}");
                    self.status = SolverStatus::Cancelled { hour };
                    return Err(SwhError::Cancelled {
                        hour,
                        partial: Box::new(self.results),
                    });
                }
                _ => {}
            }
            if let Err(report) = self.advance() {
                return Err(FailedRun {
                    report,
                    partial: self.results,
                }
                .into());
            }
        }

        let solar_fraction = self.system.solar_fraction(&self.results);
        debug!("annual solar fraction {solar_fraction:.3}");

        Ok(SimulationRun {
            system_type: self.system.system_type(),
            results: self.results,
            solar_fraction,
        })
    }
}

/// A completed project run, with the component sizes it ran with.
#[derive(Clone, Debug)]
pub struct ProjectRun {
    pub sizes: SystemSizes,
    pub run: SimulationRun,
    pub summary: AnnualSummary,
}

/// Performance parameters from the store, with the configuration's overrides applied.
pub fn system_parameters(
    config: &SystemConfiguration,
    store: &impl ParameterStore,
) -> Result<SystemParameters, InvalidInputError> {
    config
        .system_type
        .component_kinds(config.installation)
        .iter()
        .map(|kind| -> Result<(ComponentKind, _), InvalidInputError> {
            let params = store.get_component_params(*kind)?;
            Ok((
                *kind,
                params.with_overrides(config.parameter_overrides.get(kind)),
            ))
        })
        .collect()
}

/// Size, assemble and run the system an input describes.
pub fn simulate(
    input: &Input,
    store: &impl ParameterStore,
    cancel: &AtomicBool,
) -> Result<ProjectRun, SwhError> {
    let Input {
        project,
        system: config,
        simulation,
    } = input;

    let weather = store
        .get_weather(project.climate_zone, &config.orientation)
        .map_err(InvalidInputError::from)?;
    let load_request = LoadRequest {
        seed: simulation.seed,
        hours: simulation.year_length,
        rules: &config.sizing_rules,
    };
    let loads = store
        .get_load_profile(project, &load_request)
        .map_err(InvalidInputError::from)?;
    loads.validate(simulation.year_length)?;

    let peak_draws: Vec<f64> = loads.households().iter().map(|h| h.peak_draw()).collect();
    let sizes = size_system(
        &project.households,
        &peak_draws,
        project.scale,
        project.layout,
        config.system_type,
        &config.sizing_rules,
    )?;
    let params = system_parameters(config, store)?;
    let limits = simulation.limits;
    let year_length = simulation.year_length;

    let run = match config.system_type {
        SystemType::GasTank => AnnualSolver::new(
            GasTankSystem::new(&sizes, &params, limits)?,
            weather,
            loads,
            year_length,
        )?
        .run(cancel)?,
        SystemType::SolarThermal => AnnualSolver::new(
            SolarThermalSystem::new(config, project, &sizes, &params, limits)?,
            weather,
            loads,
            year_length,
        )?
        .run(cancel)?,
        SystemType::SolarElectric => AnnualSolver::new(
            SolarElectricSystem::new(project, &sizes, &params, limits)?,
            weather,
            loads,
            year_length,
        )?
        .run(cancel)?,
    };

    let occupancies: Vec<u32> = project.households.iter().map(|h| h.occupancy).collect();
    let summary = AnnualSummary::from_results(
        &run.results,
        run.system_type,
        run.solar_fraction,
        &occupancies,
    );

    Ok(ProjectRun {
        sizes,
        run,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::component::{ComponentStepError, StepFailure};
    use crate::core::water_heat_demand::load_profile::HouseholdLoad;
    use crate::input::Installation;
    use crate::parameter_store::InMemoryStore;
    use crate::results::{HourlyResults, ResultLabel};
    use crate::weather::ClimateZone;
    use pretty_assertions::assert_eq;
    use rstest::*;

    /// Counts hours, failing at a chosen hour.
    struct Counter {
        fail_at: Option<usize>,
    }

    impl HourlySystem for Counter {
        type State = usize;

        fn system_type(&self) -> SystemType {
            SystemType::GasTank
        }

        fn initial_state(&self, _temp_mains: f64) -> usize {
            0
        }

        fn step(
            &self,
            state: &usize,
            drivers: &SystemDrivers,
        ) -> Result<(usize, HourlyResults), StepFailure> {
            if self.fail_at == Some(drivers.hour) {
                return Err(StepFailure::Component {
                    component: ComponentKind::SolarThermalTank,
                    source: ComponentStepError::TapBalance {
                        relative_error: 0.5,
                    },
                });
            }
            let mut results = HourlyResults::default();
            results.push(ResultLabel::Demand, drivers.hour as f64);
            Ok((state + 1, results))
        }

        fn solar_fraction(&self, _results: &ResultSeries) -> f64 {
            0.
        }
    }

    fn weather(hours: usize) -> WeatherSeries {
        WeatherSeries {
            climate_zone: ClimateZone::new(12).unwrap(),
            temp_dry_bulb: vec![290.; hours],
            temp_wet_bulb: vec![285.; hours],
            temp_water_mains: vec![288.; hours],
            irradiance: vec![0.; hours],
        }
    }

    fn loads(hours: usize) -> LoadProfile {
        LoadProfile::new(vec![HouseholdLoad {
            id: "home".into(),
            occupancy: 2,
            hourly_draw: vec![0.01; hours],
        }])
    }

    #[rstest]
    fn should_step_every_hour_in_order() {
        let mut solver = AnnualSolver::new(Counter { fail_at: None }, weather(5), loads(5), 5).unwrap();
        assert_eq!(solver.status(), SolverStatus::Initialized);
        assert_eq!(solver.advance().unwrap(), SolverStatus::Running { hour: 1 });
        assert_eq!(*solver.state(), 1);

        let run = solver.run(&AtomicBool::new(false)).unwrap();
        assert_eq!(
            run.results.get(ResultLabel::Demand).unwrap(),
            &[0., 1., 2., 3., 4.]
        );
    }

    #[rstest]
    fn should_reject_short_weather_before_running() {
        let result = AnnualSolver::new(Counter { fail_at: None }, weather(100), loads(8760), 8760);
        assert!(matches!(
            result,
            Err(InvalidInputError::SeriesLength {
                expected: 8760,
                actual: 100,
                ..
            })
        ));
    }

    #[rstest]
    fn should_keep_partial_results_on_failure() {
        let solver = AnnualSolver::new(Counter { fail_at: Some(3) }, weather(5), loads(5), 5).unwrap();
        match solver.run(&AtomicBool::new(false)) {
            Err(SwhError::FailureInCalculation(failed)) => {
                assert_eq!(failed.report.hour, 3);
                assert_eq!(failed.report.component(), ComponentKind::SolarThermalTank);
                assert_eq!(failed.partial.len(), 3);
            }
            other => panic!("expected a failed run, got {other:?}"),
        }
    }

    #[rstest]
    fn should_not_step_after_failure() {
        let mut solver =
            AnnualSolver::new(Counter { fail_at: Some(0) }, weather(5), loads(5), 5).unwrap();
        assert!(solver.advance().is_err());
        assert_eq!(solver.status(), SolverStatus::Failed { hour: 0 });
        assert_eq!(solver.advance().unwrap_err().hour, 0);
        assert_eq!(solver.status(), SolverStatus::Failed { hour: 0 });
        assert!(solver.results().is_empty());
    }

    #[rstest]
    fn should_return_failure_when_run_after_failed_advance() {
        let mut solver =
            AnnualSolver::new(Counter { fail_at: Some(2) }, weather(5), loads(5), 5).unwrap();
        while solver.advance().is_ok() {}
        assert_eq!(solver.status(), SolverStatus::Failed { hour: 2 });

        match solver.run(&AtomicBool::new(false)) {
            Err(SwhError::FailureInCalculation(failed)) => {
                assert_eq!(failed.report.hour, 2);
                assert_eq!(failed.partial.len(), 2);
            }
            other => panic!("expected a failed run, got {other:?}"),
        }
    }

    #[rstest]
    fn should_stop_between_hours_when_cancelled() {
        let solver = AnnualSolver::new(Counter { fail_at: None }, weather(5), loads(5), 5).unwrap();
        match solver.run(&AtomicBool::new(true)) {
            Err(SwhError::Cancelled { hour, partial }) => {
                assert_eq!(hour, 0);
                assert!(partial.is_empty());
            }
            other => panic!("expected a cancelled run, got {other:?}"),
        }
    }

    #[rstest]
    fn should_not_request_parameters_of_an_uninstalled_backup() {
        let store = InMemoryStore::new().with_default_components();
        let mut without_gas_tank = InMemoryStore::new();
        for kind in SystemType::SolarThermal.component_kinds(Installation::New) {
            without_gas_tank =
                without_gas_tank.with_component_params(*kind, kind.default_parameters());
        }

        let new_build = SystemConfiguration::new(SystemType::SolarThermal);
        let retrofit = new_build.clone().with_installation(Installation::Retrofit);

        let params = system_parameters(&new_build, &without_gas_tank).unwrap();
        assert!(params.get(ComponentKind::GasBurner).is_ok());
        assert!(params.get(ComponentKind::GasTank).is_err());
        assert!(system_parameters(&retrofit, &without_gas_tank).is_err());
        assert!(system_parameters(&retrofit, &store)
            .unwrap()
            .get(ComponentKind::GasBurner)
            .is_err());
    }
}
