use std::fs;

use tracing::{debug, error, warn};

use crate::errors::BenchError;
use crate::types::Benchmark;

/// Back up the benchmark's source, then overwrite it with the generated variant.
///
/// - Missing source: nothing is touched, `MissingSource` is returned.
/// - Existing backup: left as is and reported as `StaleBackup`. It most likely
///   holds the original source from an interrupted run, so the later restore
///   puts that back.
/// - Missing generated file: the backup stays in place (the source is still
///   the original) and `MissingGenerated` is returned. `restore` cleans up.
pub fn stage(bench: &Benchmark) -> Result<(), BenchError> {
    if !bench.source.is_file() {
        return Err(BenchError::MissingSource {
            path: bench.source.clone(),
        });
    }

    if bench.backup.exists() {
        error!(
            benchmark = %bench.name,
            backup = %bench.backup.display(),
            "backup already exists, refusing to overwrite it"
        );
        return Err(BenchError::StaleBackup {
            path: bench.backup.clone(),
        });
    }

    fs::copy(&bench.source, &bench.backup).map_err(|e| BenchError::io(&bench.backup, e))?;
    debug!(benchmark = %bench.name, backup = %bench.backup.display(), "source backed up");

    let generated = match fs::read(&bench.generated) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(BenchError::MissingGenerated {
                path: bench.generated.clone(),
            });
        }
        Err(e) => return Err(BenchError::io(&bench.generated, e)),
    };

    fs::write(&bench.source, generated).map_err(|e| BenchError::io(&bench.source, e))?;
    debug!(benchmark = %bench.name, "generated variant swapped in");
    Ok(())
}

/// Copy the backup over the source and delete it.
///
/// Returns `Ok(false)` without touching anything when there is no backup,
/// i.e. the benchmark was never staged.
pub fn restore(bench: &Benchmark) -> Result<bool, BenchError> {
    if !bench.backup.is_file() {
        warn!(benchmark = %bench.name, "no backup to restore, skipping");
        return Ok(false);
    }

    fs::copy(&bench.backup, &bench.source).map_err(|e| BenchError::io(&bench.source, e))?;
    fs::remove_file(&bench.backup).map_err(|e| BenchError::io(&bench.backup, e))?;
    debug!(benchmark = %bench.name, "original source restored");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::path::Path;

    const ORIGINAL: &str = "int main() { return 0; }\n";
    const GENERATED: &str = "// vectorized\nint main() { return 1; }\n";

    fn setup(root: &Path, name: &str, with_source: bool, with_generated: bool) -> Benchmark {
        let config = Config {
            benchmarks_dir: root.join("benchmarks"),
            build_output_dir: root.join("build").join("benchmarks"),
            ..Config::default()
        };
        let bench = Benchmark::new(name, &config);
        fs::create_dir_all(bench.source.parent().unwrap()).unwrap();
        fs::create_dir_all(&bench.build_dir).unwrap();
        if with_source {
            fs::write(&bench.source, ORIGINAL).unwrap();
        }
        if with_generated {
            fs::write(&bench.generated, GENERATED).unwrap();
        }
        bench
    }

    #[test]
    fn stage_swaps_in_generated_and_keeps_backup() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let bench = setup(tmp.path(), "box_blur", true, true);

        stage(&bench).unwrap();

        assert_eq!(fs::read_to_string(&bench.source).unwrap(), GENERATED);
        assert_eq!(fs::read_to_string(&bench.backup).unwrap(), ORIGINAL);
    }

    #[test]
    fn stage_then_restore_round_trips() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let bench = setup(tmp.path(), "sobel", true, true);
        let before = fs::read(&bench.source).unwrap();

        stage(&bench).unwrap();
        assert!(restore(&bench).unwrap());

        assert_eq!(fs::read(&bench.source).unwrap(), before);
        assert!(!bench.backup.exists());
    }

    #[test]
    fn missing_source_creates_no_backup() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let bench = setup(tmp.path(), "poly_reg", false, true);

        let err = stage(&bench).unwrap_err();
        assert!(matches!(err, BenchError::MissingSource { .. }));
        assert!(!bench.backup.exists());
    }

    #[test]
    fn missing_generated_leaves_source_and_backup() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let bench = setup(tmp.path(), "matrix_mul", true, false);

        let err = stage(&bench).unwrap_err();
        assert!(matches!(err, BenchError::MissingGenerated { .. }));
        assert_eq!(fs::read_to_string(&bench.source).unwrap(), ORIGINAL);
        assert!(bench.backup.exists());

        assert!(restore(&bench).unwrap());
        assert_eq!(fs::read_to_string(&bench.source).unwrap(), ORIGINAL);
        assert!(!bench.backup.exists());
    }

    #[test]
    fn restore_without_backup_is_noop() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let bench = setup(tmp.path(), "box_blur", true, true);

        assert!(!restore(&bench).unwrap());
        assert_eq!(fs::read_to_string(&bench.source).unwrap(), ORIGINAL);
    }

    #[test]
    fn stale_backup_is_not_overwritten() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let bench = setup(tmp.path(), "box_blur", true, true);
        fs::write(&bench.backup, "older original").unwrap();

        let err = stage(&bench).unwrap_err();
        assert!(matches!(err, BenchError::StaleBackup { .. }));
        assert_eq!(fs::read_to_string(&bench.backup).unwrap(), "older original");
        assert_eq!(fs::read_to_string(&bench.source).unwrap(), ORIGINAL);
    }
}
