use super::*;
use crate::batch::run_batch;
use crate::input::SystemType;
use crate::output_writer::{FileOutputWriter, SinkOutputWriter};
use crate::run_project;
use pretty_assertions::assert_eq;
use rstest::*;
use std::env::temp_dir;
use std::fs;
use std::sync::atomic::AtomicBool;

const INPUT: &str = r#"{
    "project": {
        "climate_zone": "CZ12",
        "households": [{"id": "unit_1", "occupancy": 3}]
    },
    "system": {"system_type": "solar_thermal"}
}"#;

#[rstest]
fn should_write_results_and_summary_files() {
    let directory = temp_dir().join("swh_project_outputs_test");
    fs::create_dir_all(&directory).unwrap();
    let output = FileOutputWriter::new(directory.clone(), "project__{}.{}".to_string());

    let run = run_project(INPUT.as_bytes(), &store(), output, &AtomicBool::new(false)).unwrap();

    let results = fs::read_to_string(directory.join("project__results.csv")).unwrap();
    let mut lines = results.lines();
    assert!(lines.next().unwrap().starts_with("Timestamp,Hour,"));
    assert!(lines.next().unwrap().starts_with("[datetime],[count],"));
    assert_eq!(lines.count(), run.run.results.len());

    let summary = fs::read_to_string(directory.join("project__summary.csv")).unwrap();
    assert!(summary.starts_with("Quantity,Value,Unit"));
    assert!(summary
        .lines()
        .any(|line| line == format!("Annual solar fraction,{},[ratio]", run.run.solar_fraction)));
    assert!(summary.lines().any(|line| line.starts_with("unit_1,3,")));
}

#[rstest]
fn should_run_without_writing_to_sink() {
    let run = run_project(
        INPUT.as_bytes(),
        &store(),
        SinkOutputWriter,
        &AtomicBool::new(false),
    )
    .unwrap();

    assert_eq!(run.run.system_type, SystemType::SolarThermal);
}

#[rstest]
fn batch_should_keep_input_order() {
    let inputs = vec![
        single_household(SystemType::SolarThermal),
        single_household(SystemType::GasTank),
    ];

    let runs = run_batch(&inputs, &store(), &AtomicBool::new(false));

    let system_types: Vec<_> = runs
        .iter()
        .map(|run| run.as_ref().unwrap().run.system_type)
        .collect();
    assert_eq!(
        system_types,
        vec![SystemType::SolarThermal, SystemType::GasTank]
    );
    assert!(
        runs[0].as_ref().unwrap().run.solar_fraction > runs[1].as_ref().unwrap().run.solar_fraction
    );
}
