use crate::core::component::{ComponentKind, StepFailure};
use crate::parameter_store::StoreError;
use crate::results::ResultSeries;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SwhError {
    #[error("Request was considered invalid due to error: {0}")]
    InvalidRequest(#[from] InvalidInputError),
    #[error("Error identified during solar water heating calculation: {0}")]
    FailureInCalculation(Box<FailedRun>),
    #[error("Run was cancelled before hour {hour}")]
    Cancelled { hour: usize, partial: Box<ResultSeries> },
    #[error("Error during postprocessing: {0}")]
    ErrorInPostprocessing(#[from] PostprocessingError),
}

impl From<FailedRun> for SwhError {
    fn from(value: FailedRun) -> Self {
        Self::FailureInCalculation(Box::new(value))
    }
}

/// Errors that reject a run before it starts.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    #[error("Household '{household}' has occupancy {occupancy}, supported occupancy is 1 to 6")]
    OccupancyOutOfRange { household: String, occupancy: u32 },
    #[error("Project scale must be positive, was {0}")]
    NonPositiveScale(f64),
    #[error("Project has no households")]
    NoHouseholds,
    #[error("Expected {expected} hourly values in {series}, found {actual}")]
    SeriesLength {
        series: String,
        expected: usize,
        actual: usize,
    },
    #[error("{series} holds an invalid value at hour {hour}")]
    NonFiniteSeries { series: String, hour: usize },
    #[error("Invalid system configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Parameter '{parameter}' for component {component} was not provided")]
    MissingComponentParameter {
        component: ComponentKind,
        parameter: String,
    },
    #[error("Input could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Input failed validation: {0}")]
    Validation(String),
    #[error("Sizing rule '{0}' falls outside the compliance envelope")]
    NonCompliantSizingRule(String),
    #[error(transparent)]
    MissingData(#[from] StoreError),
}

/// Identifies the hour and component at which a run failed.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("hour {hour}: {cause}")]
pub struct FailureReport {
    pub hour: usize,
    pub cause: StepFailure,
}

impl FailureReport {
    pub fn component(&self) -> ComponentKind {
        match &self.cause {
            StepFailure::NonFinite { component, .. } | StepFailure::Component { component, .. } => {
                *component
            }
        }
    }
}

/// A failure report together with the results of every hour completed before the failure.
#[derive(Debug, Error)]
#[error("{report}")]
pub struct FailedRun {
    pub report: FailureReport,
    pub partial: ResultSeries,
}

#[derive(Debug, Error)]
#[error(transparent)]
pub struct PostprocessingError {
    error: anyhow::Error,
}

impl PostprocessingError {
    pub fn new(error: anyhow::Error) -> Self {
        Self { error }
    }
}
