//! Spec discovery, per-file execution, and report aggregation.

use crate::loader::{self, LoadError};
use crate::report::Report;
use crate::runner::{HookError, SpecRunner};
use std::path::{Path, PathBuf};

/// Error type for a harness run. Any of these aborts the whole run:
/// file-level isolation is not provided.
#[derive(Debug)]
pub enum EngineError {
    /// The spec directory could not be read.
    Io(std::io::Error),
    /// A spec file failed to load or build.
    Load { path: PathBuf, source: LoadError },
    /// A lifecycle hook failed while a spec file was running.
    Hook { path: PathBuf, source: HookError },
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Io(e) => write!(f, "failed to read spec directory: {e}"),
            EngineError::Load { path, source } => write!(f, "{}: {source}", path.display()),
            EngineError::Hook { path, source } => write!(f, "{}: {source}", path.display()),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Io(e) => Some(e),
            EngineError::Load { source, .. } => Some(source),
            EngineError::Hook { source, .. } => Some(source),
        }
    }
}

/// Harness configuration: the program under test and the directory of
/// spec files to run against it.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub program: PathBuf,
    pub spec_dir: PathBuf,
}

/// Discovers spec files, runs each as an independent suite root, and
/// aggregates their reports.
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Run one spec file as an independent suite root.
    pub fn run_spec_file(&self, path: &Path) -> Result<Report, EngineError> {
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        println!("{name}");

        let tree = loader::load_spec(path).map_err(|source| EngineError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        SpecRunner::new(&self.config.program, &self.config.spec_dir)
            .run(&tree)
            .map_err(|source| EngineError::Hook {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Run every spec file in the configured directory, in lexicographic
    /// order, and print the final tally.
    pub fn run(&self) -> Result<Report, EngineError> {
        let specs = loader::find_specs(&self.config.spec_dir).map_err(EngineError::Io)?;

        let mut report = Report::default();
        for path in &specs {
            report = report.merge(self.run_spec_file(path)?);
            println!();
        }

        println!("Test Summary:");
        println!("  Total:  {}", report.total());
        println!("  Passed: {}", report.passed());
        println!("  Failed: {}", report.failed());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    fn engine(dir: &TempDir) -> Engine {
        Engine::new(EngineConfig {
            program: PathBuf::from("sh"),
            spec_dir: dir.path().to_path_buf(),
        })
    }

    fn one_pass_one_fail(suite: &str) -> String {
        format!(
            r#"
suite: {suite}
tests:
  - name: passes
    body:
      - exec:
          args: ["-c", "true"]
  - name: fails
    body:
      - exec:
          args: ["-c", "exit 1"]
"#
        )
    }

    #[test]
    fn aggregates_across_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a_spec.yaml"), one_pass_one_fail("a")).unwrap();
        fs::write(dir.path().join("b_spec.yaml"), one_pass_one_fail("b")).unwrap();

        let report = engine(&dir).run().unwrap();
        assert_eq!(report.total(), 4);
        assert_eq!(report.passed(), 2);
        assert_eq!(report.failed(), 2);
    }

    #[test]
    fn empty_directory_yields_empty_report() {
        let dir = tempdir().unwrap();
        let report = engine(&dir).run().unwrap();
        assert_eq!(report.total(), 0);
    }

    #[test]
    fn missing_directory_is_io_error() {
        let dir = tempdir().unwrap();
        let engine = Engine::new(EngineConfig {
            program: PathBuf::from("sh"),
            spec_dir: dir.path().join("nope"),
        });
        assert!(matches!(engine.run(), Err(EngineError::Io(_))));
    }

    #[test]
    fn malformed_file_aborts_the_run() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a_spec.yaml"), one_pass_one_fail("a")).unwrap();
        fs::write(dir.path().join("b_spec.yaml"), "tests: [not: {valid").unwrap();

        let err = engine(&dir).run().unwrap_err();
        assert!(matches!(err, EngineError::Load { .. }));
        assert!(err.to_string().contains("b_spec.yaml"));
    }

    #[test]
    fn hook_failure_aborts_the_run() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("a_spec.yaml"),
            r#"
before_all:
  - clear_dir: "${basedir}/missing"
tests:
  - name: never reached
"#,
        )
        .unwrap();

        let err = engine(&dir).run().unwrap_err();
        assert!(matches!(err, EngineError::Hook { .. }));
    }

    #[test]
    fn run_spec_file_uses_basedir_from_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ctx_spec.yaml");
        fs::write(
            &path,
            r#"
before_all:
  - make_dir: "${basedir}/tmp"
tests:
  - name: writes into tmp
    body:
      - exec:
          args: ["-c", "echo x > ${basedir}/tmp/out.txt"]
      - assert:
          file_exists: "${basedir}/tmp/out.txt"
"#,
        )
        .unwrap();

        let report = engine(&dir).run_spec_file(&path).unwrap();
        assert_eq!(report.passed(), 1);
        assert!(dir.path().join("tmp/out.txt").is_file());
    }
}
