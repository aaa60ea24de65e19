#![allow(clippy::too_many_arguments)]

pub mod batch;
pub mod core;
pub mod errors;
pub mod input;
pub mod irradiation;
pub mod output_writer;
pub mod parameter_store;
pub mod read_weather_file;
pub mod results;
mod simulation_time;
pub mod sizing;
pub mod solver;
mod statistics;
pub mod weather;

#[cfg(test)]
mod tests;

#[macro_use]
extern crate is_close;
extern crate lazy_static;

use crate::errors::{PostprocessingError, SwhError};
use crate::input::{ingest_for_processing, KeyString};
use crate::output_writer::OutputWriter;
use crate::parameter_store::ParameterStore;
use crate::results::{HouseholdLabel, ResultLabel};
use crate::simulation_time::SimulationTime;
pub use crate::solver::{simulate, ProjectRun};
use csv::WriterBuilder;
use indexmap::IndexMap;
use lazy_static::lazy_static;
use std::io::Read;
use std::sync::atomic::AtomicBool;
use strum::IntoEnumIterator;
use tracing::info;

/// Read a JSON input, run it against the store and write its results and summary files.
pub fn run_project(
    input: impl Read,
    store: &impl ParameterStore,
    output: impl OutputWriter,
    cancel: &AtomicBool,
) -> Result<ProjectRun, SwhError> {
    let input = ingest_for_processing(input)?;
    let project_run = simulate(&input, store, cancel)?;

    write_project_outputs(&output, &project_run)
        .map_err(|error| SwhError::ErrorInPostprocessing(PostprocessingError::new(error)))?;

    Ok(project_run)
}

/// Write the hourly results file and the annual summary file of a completed run.
pub fn write_project_outputs(
    output: &impl OutputWriter,
    project_run: &ProjectRun,
) -> anyhow::Result<()> {
    if output.is_noop() {
        return Ok(());
    }
    write_results_file(output, "results", project_run)?;
    write_summary_file(output, "summary", project_run)?;

    Ok(())
}

lazy_static! {
    pub static ref UNITS_MAP: IndexMap<KeyString, &'static str> = ResultLabel::iter()
        .map(|label| (KeyString::from(label.to_string()), label.unit()))
        .chain(HouseholdLabel::iter().map(|label| (KeyString::from(label.to_string()), "[W]")))
        .collect();
}

fn unit_for(name: &str) -> &'static str {
    UNITS_MAP.get(name).copied().unwrap_or("Unit not defined")
}

fn write_results_file(
    output: &impl OutputWriter,
    output_key: &str,
    project_run: &ProjectRun,
) -> anyhow::Result<()> {
    let results = &project_run.run.results;

    info!("writing out to {output_key}");
    let writer = output.writer_for_location_key(output_key, "csv")?;
    let mut writer = WriterBuilder::new().flexible(true).from_writer(writer);

    let mut headings: Vec<String> = vec!["Timestamp".into(), "Hour".into()];
    let mut units_row = vec!["[datetime]", "[count]"];
    let mut columns: Vec<&[f64]> = vec![];

    for label in results.labels() {
        if let Some(series) = results.get(*label) {
            headings.push(label.to_string());
            units_row.push(label.unit());
            columns.push(series);
        }
    }
    for (index, id) in results.household_ids().iter().enumerate() {
        for label in results.household_labels(index) {
            if let Some(series) = results.household(index, *label) {
                headings.push(format!("{id} {label}"));
                units_row.push(unit_for(&label.to_string()));
                columns.push(series);
            }
        }
    }

    writer.write_record(&headings)?;
    writer.write_record(&units_row)?;

    for t_it in SimulationTime::new(results.len()).iter() {
        let mut row: Vec<String> = vec![
            t_it.timestamp()
                .map(|timestamp| timestamp.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
            t_it.index.to_string(),
        ];
        row.extend(columns.iter().map(|column| column[t_it.index].to_string()));
        writer.write_record(&row)?;
    }

    info!("flushing out CSV");
    writer.flush()?;

    Ok(())
}

fn write_summary_file(
    output: &impl OutputWriter,
    output_key: &str,
    project_run: &ProjectRun,
) -> anyhow::Result<()> {
    let ProjectRun { sizes, run, summary } = project_run;

    info!("writing out to {output_key}");
    let writer = output.writer_for_location_key(output_key, "csv")?;
    let mut writer = WriterBuilder::new().flexible(true).from_writer(writer);

    let optional = |value: Option<f64>| value.map(|v| v.to_string()).unwrap_or_default();

    writer.write_record(["Quantity", "Value", "Unit"])?;
    let mut write_row =
        |name: &str, value: String, unit: &str| writer.write_record([name, value.as_str(), unit]);

    write_row("System type", format!("{:?}", run.system_type), "")?;
    write_row("Annual solar fraction", run.solar_fraction.to_string(), "[ratio]")?;
    write_row(
        "Summer solar fraction",
        optional(summary.summer_solar_fraction),
        "[ratio]",
    )?;
    write_row(
        "Winter solar fraction",
        optional(summary.winter_solar_fraction),
        "[ratio]",
    )?;
    for (month, fraction) in summary.monthly_solar_fraction.iter().enumerate() {
        write_row(
            &format!("Solar fraction month {}", month + 1),
            optional(*fraction),
            "[ratio]",
        )?;
    }
    write_row("Hot water heat demand", summary.demand.to_string(), "[Wh]")?;
    write_row("Backup heat delivered", summary.backup_heat.to_string(), "[Wh]")?;
    for (name, totals) in [
        ("Gas use", &summary.gas_use),
        ("Grid electricity use", &summary.grid_electricity_use),
    ] {
        write_row(name, totals.annual.to_string(), "[Wh]")?;
        write_row(&format!("{name} summer"), totals.summer.to_string(), "[Wh]")?;
        write_row(&format!("{name} winter"), totals.winter.to_string(), "[Wh]")?;
    }
    write_row(
        "Pump electricity use",
        summary.pump_electricity_use.to_string(),
        "[Wh]",
    )?;
    write_row(
        "Solar pump operating hours",
        summary.solar_pump_operating_hours.to_string(),
        "[h]",
    )?;
    write_row(
        "Distribution pump operating hours",
        summary.distribution_pump_operating_hours.to_string(),
        "[h]",
    )?;
    write_row("PV power surplus", summary.pv_surplus.to_string(), "[Wh]")?;
    write_row(
        "Tank balance relative error",
        optional(summary.tank_balance_relative_error),
        "[ratio]",
    )?;
    if let Some(spread) = &summary.tank_temperature {
        write_row("Tank upper temperature p5", spread.p5.to_string(), "[K]")?;
        write_row("Tank upper temperature p50", spread.p50.to_string(), "[K]")?;
        write_row("Tank upper temperature p95", spread.p95.to_string(), "[K]")?;
    }

    write_row("Collector area", sizes.collector_area.to_string(), "[m2]")?;
    write_row("Solar tank volume", sizes.solar_tank_volume.to_string(), "[m3]")?;
    write_row("PV area", sizes.pv_area.to_string(), "[m2]")?;
    write_row(
        "Heat pump capacity",
        sizes.heat_pump_capacity.to_string(),
        "[W]",
    )?;
    write_row(
        "Heat pump tank volume",
        sizes.heat_pump_tank_volume.to_string(),
        "[m3]",
    )?;
    write_row("Piping length", sizes.piping_length.to_string(), "[m]")?;

    for (label, total) in run.results.annual_totals() {
        let unit = match label.unit() {
            "[W]" => "[Wh]",
            unit => unit,
        };
        write_row(&format!("Annual {label}"), total.to_string(), unit)?;
    }

    writer.write_record([
        "Household",
        "Occupancy",
        "Heat demand [Wh]",
        "Backup heat [Wh]",
        "Heat unmet [Wh]",
        "Gas use [Wh]",
        "Electricity use [Wh]",
        "Solar fraction [ratio]",
    ])?;
    for household in &summary.households {
        writer.write_record([
            household.id.to_string(),
            household.occupancy.to_string(),
            household.demand.to_string(),
            household.backup_heat.to_string(),
            household.unmet.to_string(),
            household.gas_use.to_string(),
            household.electricity_use.to_string(),
            household.solar_fraction.to_string(),
        ])?;
    }

    info!("flushing out CSV");
    writer.flush()?;

    Ok(())
}
