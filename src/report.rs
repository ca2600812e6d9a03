use owo_colors::{OwoColorize, Stream};

use crate::types::{PipelineReport, StepStatus};

fn status_cell(status: &StepStatus) -> String {
    // Details are in the log; the table stays one line per benchmark.
    match status {
        StepStatus::Ok => format!("{:<5}", "ok")
            .if_supports_color(Stream::Stdout, |s| s.green())
            .to_string(),
        StepStatus::Skipped(_) => format!("{:<5}", "skip")
            .if_supports_color(Stream::Stdout, |s| s.yellow())
            .to_string(),
        StepStatus::Failed(_) => format!("{:<5}", "FAIL")
            .if_supports_color(Stream::Stdout, |s| s.red())
            .to_string(),
        StepStatus::NotRun => format!("{:<5}", "-")
            .if_supports_color(Stream::Stdout, |s| s.dimmed())
            .to_string(),
    }
}

/// One line per benchmark plus both build results.
pub fn format_text(report: &PipelineReport) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "baseline build {}  final build {}\n\n",
        status_cell(&report.baseline_build),
        status_cell(&report.final_build)
    ));

    let width = report
        .outcomes
        .iter()
        .map(|o| o.benchmark.len())
        .max()
        .unwrap_or(0)
        .max("benchmark".len());

    let header = format!(
        "{:<width$}  {:<5} {:<5} {:<5} {:<5}",
        "benchmark", "base", "swap", "final", "restore"
    );
    out.push_str(
        &header
            .if_supports_color(Stream::Stdout, |s| s.dimmed())
            .to_string(),
    );
    out.push('\n');

    for outcome in &report.outcomes {
        out.push_str(&format!(
            "{:<width$}  {} {} {} {}\n",
            outcome.benchmark,
            status_cell(&outcome.baseline),
            status_cell(&outcome.swap),
            status_cell(&outcome.final_run),
            status_cell(&outcome.restore),
        ));
    }

    let recorded = report.outcomes.iter().filter(|o| o.metrics.is_some()).count();
    let elapsed = report.finished - report.started;
    out.push_str(&format!(
        "\n{recorded}/{} benchmarks recorded in {}s\n",
        report.outcomes.len(),
        elapsed.num_seconds()
    ));
    out
}

pub fn format_json(report: &PipelineReport) -> String {
    // PipelineReport only holds strings, numbers and timestamps.
    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
}
