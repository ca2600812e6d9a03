use tracing::warn;

use crate::config::Config;
use crate::errors::BenchError;
use crate::types::Benchmark;

/// List benchmark directories under `config.benchmarks_dir`, sorted by name.
///
/// Whether a benchmark was built is not checked here; the pipeline checks
/// that separately in each pass. When `config.only` is non-empty the result
/// is restricted to those names, and names with no directory are warned about.
pub fn discover_benchmarks(config: &Config) -> Result<Vec<Benchmark>, BenchError> {
    let root = &config.benchmarks_dir;
    if !root.is_dir() {
        return Err(BenchError::BenchmarksDirNotFound { path: root.clone() });
    }

    let entries = std::fs::read_dir(root).map_err(|e| BenchError::io(root, e))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };

        if !entry.path().is_dir() {
            continue;
        }

        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => warn!(name = ?raw, "skipping benchmark directory with non-UTF-8 name"),
        }
    }

    names.sort();

    if !config.only.is_empty() {
        for wanted in &config.only {
            if !names.contains(wanted) {
                warn!(benchmark = %wanted, "requested benchmark not found, ignoring");
            }
        }
        names.retain(|name| config.only.contains(name));
    }

    Ok(names.iter().map(|name| Benchmark::new(name, config)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn config_for(root: &Path) -> Config {
        Config {
            benchmarks_dir: root.join("benchmarks"),
            build_output_dir: root.join("build").join("benchmarks"),
            ..Config::default()
        }
    }

    #[test]
    fn sorted_directories_only() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let config = config_for(tmp.path());
        for name in ["sobel", "box_blur", "matrix_mul"] {
            fs::create_dir_all(config.benchmarks_dir.join(name)).unwrap();
        }
        fs::write(config.benchmarks_dir.join("CMakeLists.txt"), "").unwrap();

        let found = discover_benchmarks(&config).unwrap();
        let names: Vec<_> = found.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["box_blur", "matrix_mul", "sobel"]);
    }

    #[test]
    fn benchmark_paths_follow_layout() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let config = config_for(tmp.path());
        fs::create_dir_all(config.benchmarks_dir.join("sobel")).unwrap();

        let found = discover_benchmarks(&config).unwrap();
        let bench = &found[0];
        assert_eq!(bench.source, config.benchmarks_dir.join("sobel").join("sobel.cpp"));
        assert_eq!(bench.backup, config.benchmarks_dir.join("sobel").join("backup.cpp"));
        assert_eq!(
            bench.generated,
            config.build_output_dir.join("sobel").join("fhe_vectorized.cpp")
        );
        assert_eq!(
            bench.output_log,
            config.build_output_dir.join("sobel").join("sobel_output.txt")
        );
        assert!(!bench.is_built());
    }

    #[test]
    fn only_filter_restricts() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let mut config = config_for(tmp.path());
        for name in ["a", "b", "c"] {
            fs::create_dir_all(config.benchmarks_dir.join(name)).unwrap();
        }
        config.only = vec!["c".to_string(), "missing".to_string(), "a".to_string()];

        let found = discover_benchmarks(&config).unwrap();
        let names: Vec<_> = found.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["a", "c"]);
    }

    #[test]
    fn missing_root_is_error() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let err = discover_benchmarks(&config_for(tmp.path())).unwrap_err();
        assert!(err.to_string().contains("No benchmarks directory found"));
    }

    #[test]
    fn empty_root_yields_nothing() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let config = config_for(tmp.path());
        fs::create_dir_all(&config.benchmarks_dir).unwrap();
        assert!(discover_benchmarks(&config).unwrap().is_empty());
    }
}
