//! Pull metrics out of the text a benchmark prints.
//!
//! Every function here is pure and total: a field that cannot be found or
//! parsed comes back as `None`, never as an error.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::types::MetricsRecord;

// ASCII digits only: `\d` would also match other scripts' digits, which
// `str::parse` rejects.

/// First decimal number anywhere in the output
static TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[0-9]+\.[0-9]+\b").expect("time regex"));

/// `max: (<depth>, <multiplicative depth>)`
static DEPTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"max:\s*\(([0-9]+),\s*([0-9]+)\)").expect("depth regex"));

static TOTAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"total:\s*([0-9]+)").expect("total regex"));

/// How many lines after a marker may hold its `total:` line.
pub const TOTAL_WINDOW: usize = 2;

/// Unit suffix that identifies the vectorization time line.
pub const VECTORIZATION_UNIT: &str = "ms";

/// Operation counters reported by the FHE runtime, one block per counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Counter {
    PlainMultiplications,
    Multiplications,
    Additions,
    Rotations,
    Squares,
}

impl Counter {
    pub const ALL: [Counter; 5] = [
        Counter::PlainMultiplications,
        Counter::Multiplications,
        Counter::Additions,
        Counter::Rotations,
        Counter::Squares,
    ];

    pub fn marker(self) -> &'static str {
        match self {
            Counter::PlainMultiplications => "|mul_plain|",
            Counter::Multiplications => "|mul|",
            Counter::Additions => "|he_add|",
            Counter::Rotations => "|rotate|",
            Counter::Squares => "|square|",
        }
    }
}

pub fn extract_time(text: &str) -> Option<f64> {
    TIME.find(text).and_then(|m| m.as_str().parse().ok())
}

/// Returns `(depth, multiplicative_depth)`.
pub fn extract_depths(text: &str) -> (Option<u64>, Option<u64>) {
    match DEPTH.captures(text) {
        Some(caps) => (
            caps.get(1).and_then(|m| m.as_str().parse().ok()),
            caps.get(2).and_then(|m| m.as_str().parse().ok()),
        ),
        None => (None, None),
    }
}

/// Find the first line containing `marker` whose following `TOTAL_WINDOW`
/// lines carry a `total: <n>`, and return `n`.
///
/// A marker occurrence with no total in its window does not end the search;
/// a later occurrence may still match.
pub fn extract_counter(text: &str, marker: &str) -> Option<u64> {
    let lines: Vec<&str> = text.lines().collect();

    for (i, line) in lines.iter().enumerate() {
        if !line.contains(marker) {
            continue;
        }
        let window = lines.iter().skip(i + 1).take(TOTAL_WINDOW);
        for next in window {
            if let Some(caps) = TOTAL.captures(next) {
                // A total too large for u64 is as good as absent.
                return caps.get(1).and_then(|m| m.as_str().parse().ok());
            }
        }
    }

    None
}

/// Leading token of the first line mentioning `VECTORIZATION_UNIT`.
pub fn extract_vectorization_time(text: &str) -> Option<String> {
    text.lines()
        .find(|line| line.contains(VECTORIZATION_UNIT))
        .and_then(|line| line.split_whitespace().next())
        .map(str::to_string)
}

pub fn extract_metrics(benchmark: &str, text: &str) -> MetricsRecord {
    let (depth, multiplicative_depth) = extract_depths(text);
    let counter = |c: Counter| extract_counter(text, c.marker());

    MetricsRecord {
        benchmark: benchmark.to_string(),
        time: extract_time(text),
        depth,
        multiplicative_depth,
        plain_multiplications: counter(Counter::PlainMultiplications),
        multiplications: counter(Counter::Multiplications),
        additions: counter(Counter::Additions),
        rotations: counter(Counter::Rotations),
        squares: counter(Counter::Squares),
    }
}
