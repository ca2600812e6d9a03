use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Config;

/// One benchmark directory and the files the pipeline touches for it.
#[derive(Debug, Clone)]
pub struct Benchmark {
    pub name: String,
    /// `<benchmarks>/<name>/<name>.<ext>`
    pub source: PathBuf,
    /// `<benchmarks>/<name>/backup.<ext>`, only present between staging and restore
    pub backup: PathBuf,
    /// `<build-output>/<name>`; also the working directory for every run
    pub build_dir: PathBuf,
    /// Produced by a build against the original source
    pub generated: PathBuf,
    pub executable: PathBuf,
    pub output_log: PathBuf,
}

impl Benchmark {
    pub fn new(name: &str, config: &Config) -> Self {
        let bench_dir = config.benchmarks_dir.join(name);
        let build_dir = config.build_output_dir.join(name);
        let ext = &config.source_extension;
        Benchmark {
            name: name.to_string(),
            source: bench_dir.join(format!("{name}.{ext}")),
            backup: bench_dir.join(format!("backup.{ext}")),
            generated: build_dir.join(&config.generated_file),
            executable: build_dir.join(format!("{name}{}", std::env::consts::EXE_SUFFIX)),
            output_log: build_dir.join(format!("{name}_output.txt")),
            build_dir,
        }
    }

    pub fn is_built(&self) -> bool {
        self.build_dir.is_dir()
    }
}

/// Captured output of one finished process.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

/// Everything extracted from a final run. Unknown fields stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsRecord {
    pub benchmark: String,
    pub time: Option<f64>,
    pub depth: Option<u64>,
    pub multiplicative_depth: Option<u64>,
    pub plain_multiplications: Option<u64>,
    pub multiplications: Option<u64>,
    pub additions: Option<u64>,
    pub rotations: Option<u64>,
    pub squares: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorizationRecord {
    pub benchmark: String,
    /// Kept as the raw token printed by the benchmark, e.g. `"12.5"`.
    pub time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum StepStatus {
    Ok,
    Skipped(String),
    Failed(String),
    NotRun,
}

/// Per-benchmark trail through both passes.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub benchmark: String,
    pub baseline: StepStatus,
    pub swap: StepStatus,
    pub final_run: StepStatus,
    pub restore: StepStatus,
    pub vectorization: Option<VectorizationRecord>,
    pub metrics: Option<MetricsRecord>,
}

impl Outcome {
    pub fn new(benchmark: &str) -> Self {
        Outcome {
            benchmark: benchmark.to_string(),
            baseline: StepStatus::NotRun,
            swap: StepStatus::NotRun,
            final_run: StepStatus::NotRun,
            restore: StepStatus::NotRun,
            vectorization: None,
            metrics: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
    pub baseline_build: StepStatus,
    pub final_build: StepStatus,
    pub outcomes: Vec<Outcome>,
}

/// Formats an optional cell: unknown values become an empty field.
pub fn opt_cell<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}
