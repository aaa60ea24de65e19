extern crate swh;

use anyhow::{anyhow, bail};
use clap::Parser;
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use swh::batch::run_batch;
use swh::input::ingest_for_processing;
use swh::output_writer::FileOutputWriter;
use swh::parameter_store::DirectoryStore;
use swh::write_project_outputs;
use tracing::{debug, error, info};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct SwhArgs {
    #[arg(required = true, help = "Paths to project input files in .json format")]
    input_files: Vec<String>,
    #[arg(
        long,
        short,
        default_value = "data",
        help = "Directory holding weather, load profile and component data"
    )]
    data_dir: PathBuf,
    #[arg(
        long,
        short,
        help = "Directory to write results to, defaults to a directory beside each input file"
    )]
    output_dir: Option<PathBuf>,
    #[clap(
        long,
        default_value_t = false,
        help = "Generate load profiles for households without a profile file"
    )]
    generate_loads: bool,
    #[arg(long, help = "Seed for generated load profiles, replacing each input's own seed")]
    seed: Option<u64>,
    #[clap(long, default_value_t = tracing::Level::INFO, help = "Maximum level of logs to write")]
    log_level: tracing::Level,
    #[clap(long, default_value_t = false, help = "Whether to log out spans")]
    log_spans: bool,
}

fn main() -> anyhow::Result<()> {
    let args = SwhArgs::parse();

    // set up basic tracing
    let tracing_subscriber = {
        let mut builder = tracing_subscriber::fmt::fmt().with_max_level(args.log_level);

        if args.log_spans {
            builder = builder.with_span_events(FmtSpan::CLOSE);
        }

        builder.finish()
    };
    tracing::subscriber::set_global_default(tracing_subscriber)
        .expect("setting tracing subscriber failed");

    let mut store = DirectoryStore::new(args.data_dir.clone())?;
    if args.generate_loads {
        store = store.with_generated_loads();
    }

    let mut inputs = Vec::with_capacity(args.input_files.len());
    let mut outputs = Vec::with_capacity(args.input_files.len());
    for input_file in &args.input_files {
        let input_path = Path::new(input_file);
        let input_file_stem = input_path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| anyhow!("input file name '{input_file}' could not be read"))?;

        let output_path = match &args.output_dir {
            Some(directory) => directory.clone(),
            None => input_path.with_file_name(format!("{input_file_stem}__results")),
        };
        fs::create_dir_all(&output_path)?;
        debug!("writing results for {input_file} to {output_path:?}");

        let mut input = ingest_for_processing(File::open(input_path)?)?;
        if let Some(seed) = args.seed {
            input.simulation.seed = seed;
        }
        inputs.push(input);
        outputs.push(FileOutputWriter::new(
            output_path,
            format!("{input_file_stem}__{{}}.{{}}"),
        ));
    }

    let cancel = AtomicBool::new(false);
    let runs = run_batch(&inputs, &store, &cancel);

    let mut failures = 0;
    for ((input_file, output), run) in args.input_files.iter().zip(&outputs).zip(runs) {
        match run {
            Ok(project_run) => {
                write_project_outputs(output, &project_run)?;
                info!(
                    "{input_file}: annual solar fraction {:.3}",
                    project_run.run.solar_fraction
                );
            }
            Err(err) => {
                error!("{input_file}: {err}");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} runs did not complete", args.input_files.len());
    }

    Ok(())
}
