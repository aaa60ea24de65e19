//! Runs many independent projects in parallel against one shared store.
use crate::errors::SwhError;
use crate::input::Input;
use crate::parameter_store::ParameterStore;
use crate::solver::{simulate, ProjectRun};
#[cfg(feature = "indicatif")]
use indicatif::ProgressBar;
use rayon::prelude::*;
use std::sync::atomic::AtomicBool;
use tracing::{error, info};

/// Simulate every input, returning one result per input in input order.
///
/// A failed or cancelled run does not stop the others.
pub fn run_batch<S: ParameterStore>(
    inputs: &[Input],
    store: &S,
    cancel: &AtomicBool,
) -> Vec<Result<ProjectRun, SwhError>> {
    info!("running batch of {} projects", inputs.len());

    #[cfg(feature = "indicatif")]
    let progress = ProgressBar::new(inputs.len() as u64);

    let runs: Vec<_> = inputs
        .par_iter()
        .enumerate()
        .map(|(index, input)| {
            let run = simulate(input, store, cancel);
            if let Err(err) = &run {
                error!("project {index} did not complete: {err}");
            }
            #[cfg(feature = "indicatif")]
            progress.inc(1);
            run
        })
        .collect();

    #[cfg(feature = "indicatif")]
    progress.finish();

    runs
}
