use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::errors::BenchError;
use crate::runner::CommandSpec;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "fheco-bench.toml";

/// Directory layout and external command contracts.
///
/// Defaults reproduce the layout of the FHE compiler repository: benchmarks
/// under `benchmarks/`, a CMake build in `build/` that installs one directory
/// per benchmark under `build/benchmarks/`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub benchmarks_dir: PathBuf,
    pub build_output_dir: PathBuf,
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
    pub cmake: String,
    /// Passed as `-G <generator>`; `None` lets CMake pick its default.
    pub generator: Option<String>,
    pub source_extension: String,
    pub generated_file: String,
    pub baseline_args: Vec<String>,
    pub final_args: Vec<String>,
    pub results_csv: PathBuf,
    pub vectorization_csv: PathBuf,
    /// Unset means processes may run forever.
    pub timeout_secs: Option<u64>,
    /// Restrict the run to these benchmarks. Empty means all.
    pub only: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            benchmarks_dir: PathBuf::from("benchmarks"),
            build_output_dir: Path::new("build").join("benchmarks"),
            source_dir: PathBuf::from("."),
            build_dir: PathBuf::from("build"),
            cmake: "cmake".to_string(),
            generator: Some("MSYS Makefiles".to_string()),
            source_extension: "cpp".to_string(),
            generated_file: "fhe_vectorized.cpp".to_string(),
            baseline_args: vec!["1".to_string(), "0".to_string()],
            final_args: vec!["1".to_string()],
            results_csv: PathBuf::from("results.csv"),
            vectorization_csv: PathBuf::from("vectorization.csv"),
            timeout_secs: None,
            only: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from `explicit`, or from `DEFAULT_CONFIG_FILE` in
    /// `search_dir` if present, or fall back to defaults.
    ///
    /// An explicit path that cannot be read is an error; a missing default
    /// file is not.
    pub fn load(explicit: Option<&Path>, search_dir: &Path) -> Result<Config, BenchError> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => {
                let candidate = search_dir.join(DEFAULT_CONFIG_FILE);
                if !candidate.is_file() {
                    return Ok(Config::default());
                }
                candidate
            }
        };

        let text = std::fs::read_to_string(&path).map_err(|source| BenchError::ConfigRead {
            path: path.clone(),
            source,
        })?;
        Config::from_toml(&text).map_err(|detail| BenchError::ConfigParse { path, detail })
    }

    pub fn from_toml(text: &str) -> Result<Config, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// configure, build, install — run once per pass.
    pub fn build_sequence(&self) -> Vec<CommandSpec> {
        let source = self.source_dir.to_string_lossy().into_owned();
        let build = self.build_dir.to_string_lossy().into_owned();

        let mut configure = Vec::new();
        if let Some(generator) = &self.generator {
            configure.push("-G".to_string());
            configure.push(generator.clone());
        }
        configure.extend(["-S".to_string(), source, "-B".to_string(), build.clone()]);

        vec![
            CommandSpec::new(&self.cmake, configure),
            CommandSpec::new(&self.cmake, vec!["--build".to_string(), build.clone()]),
            CommandSpec::new(&self.cmake, vec!["--install".to_string(), build]),
        ]
    }
}
