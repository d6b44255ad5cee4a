//! Per-suite execution context and the step vocabulary.
//!
//! One context exists per suite invocation: created before that suite's
//! `before_all` hooks, dropped after its `after_all` hooks, and visible
//! to nothing else. Hook and test bodies evaluate their steps against it.

use crate::interp;
use crate::process::{self, ProcessError};
use crate::schema::{Assert, Exec, InputSource, OutputSink, Step, Value};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Error type for step evaluation.
///
/// Inside a test body this fails only that test; inside a hook it is
/// escalated to a fatal [`crate::runner::HookError`].
#[derive(Debug)]
pub enum StepError {
    /// An assertion predicate evaluated to false.
    Assertion(String),
    /// The program under test could not run or exited nonzero.
    Process(ProcessError),
    /// A file or directory operation failed.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A `${key}` reference could not be resolved.
    Var(String),
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepError::Assertion(msg) => write!(f, "assertion failed: {msg}"),
            StepError::Process(e) => write!(f, "{e}"),
            StepError::Io { path, source } => write!(f, "{}: {source}", path.display()),
            StepError::Var(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for StepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StepError::Process(e) => Some(e),
            StepError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ProcessError> for StepError {
    fn from(e: ProcessError) -> Self {
        StepError::Process(e)
    }
}

fn io_err(path: &Path) -> impl Fn(std::io::Error) -> StepError {
    let path = path.to_path_buf();
    move |source| StepError::Io {
        path: path.clone(),
        source,
    }
}

/// Key/value state scoped to one suite invocation, plus access to the
/// program under test.
pub struct ExecutionContext<'a> {
    program: &'a Path,
    values: HashMap<String, Value>,
}

impl<'a> ExecutionContext<'a> {
    /// A fresh context, seeded with `basedir` pointing at the spec
    /// directory.
    pub fn new(program: &'a Path, basedir: &Path) -> Self {
        let mut values = HashMap::new();
        values.insert(
            "basedir".to_string(),
            Value::Str(basedir.display().to_string()),
        );
        Self { program, values }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    fn expand(&self, s: &str) -> Result<String, StepError> {
        interp::expand(s, &self.values).map_err(StepError::Var)
    }

    fn expand_path(&self, s: &str) -> Result<PathBuf, StepError> {
        self.expand(s).map(PathBuf::from)
    }

    /// Evaluate one step.
    pub fn eval(&mut self, step: &Step) -> Result<(), StepError> {
        match step {
            Step::Set { key, value } => {
                // Interpolate string values so `set` can derive paths
                // from earlier keys like `${basedir}`.
                let value = match value {
                    Value::Str(s) => Value::Str(self.expand(s)?),
                    other => other.clone(),
                };
                self.set(key.clone(), value);
                Ok(())
            }
            Step::MakeDir(path) => self.make_dir(&self.expand_path(path)?),
            Step::ClearDir(path) => self.clear_dir(&self.expand_path(path)?),
            Step::Exec(exec) => self.exec(exec),
            Step::Assert(assert) => self.assert(assert),
        }
    }

    /// Create a directory if it does not exist yet.
    pub fn make_dir(&self, path: &Path) -> Result<(), StepError> {
        if path.is_dir() {
            return Ok(());
        }
        fs::create_dir_all(path).map_err(io_err(path))
    }

    /// Remove every entry of a directory, files and subtrees alike.
    pub fn clear_dir(&self, path: &Path) -> Result<(), StepError> {
        for entry in fs::read_dir(path).map_err(io_err(path))? {
            let entry = entry.map_err(io_err(path))?;
            let entry_path = entry.path();
            if entry_path.is_dir() {
                fs::remove_dir_all(&entry_path).map_err(io_err(&entry_path))?;
            } else {
                fs::remove_file(&entry_path).map_err(io_err(&entry_path))?;
            }
        }
        Ok(())
    }

    fn exec(&mut self, exec: &Exec) -> Result<(), StepError> {
        let mut args = Vec::with_capacity(exec.args.len());
        for arg in &exec.args {
            args.push(self.expand(arg)?);
        }

        let input = match &exec.stdin {
            None => None,
            Some(InputSource::Text(text)) => Some(self.expand(text)?.into_bytes()),
            Some(InputSource::File(path)) => {
                let path = self.expand_path(path)?;
                Some(fs::read(&path).map_err(io_err(&path))?)
            }
        };

        let capture = exec.stdout.is_some();
        let output = process::invoke(self.program, &args, input.as_deref(), capture)?;

        if let Some(bytes) = output {
            match &exec.stdout {
                Some(OutputSink::Var(key)) => {
                    let text = String::from_utf8_lossy(&bytes).into_owned();
                    self.set(key.clone(), Value::Str(text));
                }
                Some(OutputSink::File(path)) => {
                    let path = self.expand_path(path)?;
                    fs::write(&path, &bytes).map_err(io_err(&path))?;
                }
                None => {}
            }
        }
        Ok(())
    }

    fn assert(&self, assert: &Assert) -> Result<(), StepError> {
        match assert {
            Assert::FilesEqual { path, golden } => {
                let path = self.expand_path(path)?;
                let golden = self.expand_path(golden)?;
                let actual = fs::read(&path).map_err(io_err(&path))?;
                let expected = fs::read(&golden).map_err(io_err(&golden))?;
                if actual != expected {
                    return Err(StepError::Assertion(format!(
                        "{} differs from {}",
                        path.display(),
                        golden.display()
                    )));
                }
                Ok(())
            }
            Assert::Equals { value, golden } => {
                let value = self.expand(value)?;
                let golden = self.expand_path(golden)?;
                let expected = fs::read(&golden).map_err(io_err(&golden))?;
                if value.as_bytes() != expected.as_slice() {
                    return Err(StepError::Assertion(format!(
                        "value differs from {}",
                        golden.display()
                    )));
                }
                Ok(())
            }
            Assert::Contains { value, needle } => {
                let value = self.expand(value)?;
                let needle = self.expand(needle)?;
                if !value.contains(&needle) {
                    return Err(StepError::Assertion(format!(
                        "{value:?} does not contain {needle:?}"
                    )));
                }
                Ok(())
            }
            Assert::Matches { value, pattern } => {
                let value = self.expand(value)?;
                let pattern = self.expand(pattern)?;
                let re = regex::Regex::new(&pattern).map_err(|e| {
                    StepError::Assertion(format!("invalid regex {pattern:?}: {e}"))
                })?;
                if !re.is_match(&value) {
                    return Err(StepError::Assertion(format!(
                        "{value:?} does not match {pattern:?}"
                    )));
                }
                Ok(())
            }
            Assert::FileExists(path) => {
                let path = self.expand_path(path)?;
                if !path.exists() {
                    return Err(StepError::Assertion(format!(
                        "{} does not exist",
                        path.display()
                    )));
                }
                Ok(())
            }
        }
    }
}
