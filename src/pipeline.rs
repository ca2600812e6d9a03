//! The two-pass driver.
//!
//! build → per benchmark (baseline run, stage generated source) → rebuild →
//! per benchmark (final run, extract, record, restore). Failures stay with the
//! benchmark that caused them; the pipeline always runs to the end.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::errors::BenchError;
use crate::extract;
use crate::runner::{CommandSpec, Executor, absolute_program};
use crate::swap;
use crate::table::{
    RESULTS_HEADER, Table, VECTORIZATION_HEADER, metrics_row, vectorization_row,
};
use crate::types::{Benchmark, Outcome, PipelineReport, StepStatus, VectorizationRecord};

/// The two output tables, created (and truncated) once per pipeline run.
#[derive(Debug)]
pub struct Tables {
    pub results: Table,
    pub vectorization: Table,
}

impl Tables {
    pub fn create(config: &Config) -> Result<Tables, BenchError> {
        Ok(Tables {
            results: Table::create(&config.results_csv, RESULTS_HEADER)?,
            vectorization: Table::create(&config.vectorization_csv, VECTORIZATION_HEADER)?,
        })
    }
}

/// Run the whole pipeline over `benchmarks`.
///
/// Only creating the output tables can fail; everything after that is logged
/// and recorded in the returned report.
pub fn run_pipeline(
    config: &Config,
    benchmarks: &[Benchmark],
    exec: &mut dyn Executor,
) -> Result<PipelineReport, BenchError> {
    let started = Utc::now();
    let tables = Tables::create(config)?;
    let mut outcomes: Vec<Outcome> = benchmarks.iter().map(|b| Outcome::new(&b.name)).collect();

    info!("baseline build");
    let baseline_build = build(config, exec);

    let mut staging = vec![Staging::NotAttempted; benchmarks.len()];

    for ((bench, outcome), staged) in benchmarks
        .iter()
        .zip(outcomes.iter_mut())
        .zip(staging.iter_mut())
    {
        if !bench.is_built() {
            debug!(benchmark = %bench.name, "no build output, skipping");
            continue;
        }
        info!(benchmark = %bench.name, "baseline run");
        let baseline = baseline_run(config, bench, exec, &tables.vectorization, outcome);
        outcome.baseline = baseline;
        let (status, state) = stage(bench);
        outcome.swap = status;
        *staged = state;
    }

    info!("final build");
    let final_build = build(config, exec);

    for ((bench, outcome), staged) in benchmarks.iter().zip(outcomes.iter_mut()).zip(&staging)
    {
        if *staged == Staging::MissingSource {
            // No source means no trustworthy binary to measure.
            warn!(benchmark = %bench.name, "source missing, skipping final run");
            outcome.final_run = StepStatus::Skipped("source missing".to_string());
        } else if bench.is_built() {
            info!(benchmark = %bench.name, "final run");
            let status = final_run(config, bench, exec, &tables.results, outcome);
            outcome.final_run = status;
        } else {
            debug!(benchmark = %bench.name, "no build output after final build");
        }

        // Restore whenever staging was attempted, even if the build output
        // disappeared in between.
        if *staged != Staging::NotAttempted || outcome.final_run != StepStatus::NotRun {
            if *staged == Staging::StaleBackup {
                warn!(
                    benchmark = %bench.name,
                    backup = %bench.backup.display(),
                    "overwriting current source with backup from an earlier run"
                );
            }
            outcome.restore = restore(bench);
        }
    }

    info!("done");
    Ok(PipelineReport {
        started,
        finished: Utc::now(),
        baseline_build,
        final_build,
        outcomes,
    })
}

/// configure, build, install. Stops at the first failing step.
pub fn build(config: &Config, exec: &mut dyn Executor) -> StepStatus {
    for step in config.build_sequence() {
        if let Err(e) = exec.execute(&step) {
            warn!(error = %e, "build failed, continuing with whatever was built");
            return StepStatus::Failed(e.to_string());
        }
    }
    StepStatus::Ok
}

fn benchmark_command(bench: &Benchmark, args: &[String]) -> CommandSpec {
    CommandSpec::new(absolute_program(&bench.executable), args.to_vec()).in_dir(&bench.build_dir)
}

fn baseline_run(
    config: &Config,
    bench: &Benchmark,
    exec: &mut dyn Executor,
    table: &Table,
    outcome: &mut Outcome,
) -> StepStatus {
    let result = match exec.execute(&benchmark_command(bench, &config.baseline_args)) {
        Ok(r) => r,
        Err(e) => {
            warn!(benchmark = %bench.name, error = %e, "baseline run failed");
            return StepStatus::Failed(e.to_string());
        }
    };

    let record = VectorizationRecord {
        benchmark: bench.name.clone(),
        time: extract::extract_vectorization_time(&result.stdout),
    };
    if record.time.is_none() {
        warn!(benchmark = %bench.name, "no vectorization time in baseline output");
    }

    let status = match table.append(&vectorization_row(&record)) {
        Ok(()) => StepStatus::Ok,
        Err(e) => {
            warn!(benchmark = %bench.name, error = %e, "could not record vectorization time");
            StepStatus::Failed(e.to_string())
        }
    };
    outcome.vectorization = Some(record);
    status
}

/// What staging left on disk for one benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Staging {
    NotAttempted,
    Swapped,
    MissingSource,
    MissingGenerated,
    StaleBackup,
    Failed,
}

fn stage(bench: &Benchmark) -> (StepStatus, Staging) {
    match swap::stage(bench) {
        Ok(()) => (StepStatus::Ok, Staging::Swapped),
        Err(e @ BenchError::MissingSource { .. }) => {
            warn!(benchmark = %bench.name, error = %e, "skipping benchmark");
            (StepStatus::Skipped(e.to_string()), Staging::MissingSource)
        }
        Err(e @ BenchError::MissingGenerated { .. }) => {
            warn!(benchmark = %bench.name, error = %e, "skipping source swap");
            (StepStatus::Skipped(e.to_string()), Staging::MissingGenerated)
        }
        Err(e @ BenchError::StaleBackup { .. }) => {
            (StepStatus::Failed(e.to_string()), Staging::StaleBackup)
        }
        Err(e) => {
            warn!(benchmark = %bench.name, error = %e, "source swap failed");
            (StepStatus::Failed(e.to_string()), Staging::Failed)
        }
    }
}

fn final_run(
    config: &Config,
    bench: &Benchmark,
    exec: &mut dyn Executor,
    table: &Table,
    outcome: &mut Outcome,
) -> StepStatus {
    let result = match exec.execute(&benchmark_command(bench, &config.final_args)) {
        Ok(r) => r,
        Err(e) => {
            warn!(benchmark = %bench.name, error = %e, "final run failed");
            return StepStatus::Failed(e.to_string());
        }
    };

    let record = extract::extract_metrics(&bench.name, &result.stdout);
    let mut status = StepStatus::Ok;

    if let Err(e) = table.append(&metrics_row(&record)) {
        warn!(benchmark = %bench.name, error = %e, "could not record metrics");
        status = StepStatus::Failed(e.to_string());
    }
    if let Err(e) = std::fs::write(&bench.output_log, &result.stdout) {
        warn!(
            benchmark = %bench.name,
            path = %bench.output_log.display(),
            error = %e,
            "could not save run output"
        );
    }

    outcome.metrics = Some(record);
    status
}

fn restore(bench: &Benchmark) -> StepStatus {
    match swap::restore(bench) {
        Ok(true) => StepStatus::Ok,
        Ok(false) => StepStatus::Skipped("no backup".to_string()),
        Err(e) => {
            warn!(benchmark = %bench.name, error = %e, "could not restore original source");
            StepStatus::Failed(e.to_string())
        }
    }
}
