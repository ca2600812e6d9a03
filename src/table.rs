use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::BenchError;
use crate::types::{MetricsRecord, VectorizationRecord, opt_cell};

pub const RESULTS_HEADER: &[&str] = &[
    "Benchmark",
    "Compilation Time",
    "Depth",
    "Multiplicative Depth",
    "Plain Multiplications",
    "Multiplications",
    "Additions",
    "Rotations",
    "Squares",
];

pub const VECTORIZATION_HEADER: &[&str] = &["Benchmark", "Vectorization Time"];

/// Append-only CSV file. The file is opened and closed around every write so
/// a run that dies halfway leaves every finished row on disk.
#[derive(Debug)]
pub struct Table {
    path: PathBuf,
    columns: usize,
}

impl Table {
    /// Truncate `path` and write `header` as its only line.
    pub fn create(path: impl Into<PathBuf>, header: &[&str]) -> Result<Table, BenchError> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| BenchError::io(parent, e))?;
        }
        let line = format_row(header.iter().copied());
        std::fs::write(&path, line).map_err(|e| BenchError::io(&path, e))?;
        Ok(Table {
            path,
            columns: header.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, row: &[String]) -> Result<(), BenchError> {
        debug_assert_eq!(row.len(), self.columns, "row width must match header");
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| BenchError::io(&self.path, e))?;
        file.write_all(format_row(row.iter().map(String::as_str)).as_bytes())
            .map_err(|e| BenchError::io(&self.path, e))
    }
}

pub fn metrics_row(record: &MetricsRecord) -> Vec<String> {
    vec![
        record.benchmark.clone(),
        // Debug keeps the trailing `.0` on whole numbers, e.g. `3.0`.
        record.time.map(|t| format!("{t:?}")).unwrap_or_default(),
        opt_cell(&record.depth),
        opt_cell(&record.multiplicative_depth),
        opt_cell(&record.plain_multiplications),
        opt_cell(&record.multiplications),
        opt_cell(&record.additions),
        opt_cell(&record.rotations),
        opt_cell(&record.squares),
    ]
}

pub fn vectorization_row(record: &VectorizationRecord) -> Vec<String> {
    vec![record.benchmark.clone(), opt_cell(&record.time)]
}

fn format_row<'a>(fields: impl Iterator<Item = &'a str>) -> String {
    let mut line = fields.map(escape_field).collect::<Vec<_>>().join(",");
    line.push_str("\r\n");
    line
}

/// Quote a field if it contains a separator, quote, or line break.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
