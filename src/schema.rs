//! Schema definitions for binspec spec documents.
//!
//! A spec file describes one suite of tests for the program under test.
//! Documents are written in YAML or TOML and validated against these types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Root document for a spec file, and the shape of every nested suite.
///
/// The file root may omit `suite`; nested suites must carry one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SuiteDoc {
    /// Suite name, printed when the suite runs.
    #[serde(default)]
    pub suite: Option<String>,

    /// Hooks run once before the first test of this suite.
    #[serde(default)]
    pub before_all: Vec<Step>,

    /// Hooks run before every test of this suite.
    #[serde(default)]
    pub before_each: Vec<Step>,

    /// Hooks run after every test of this suite, pass or fail.
    #[serde(default)]
    pub after_each: Vec<Step>,

    /// Hooks run once after the last test of this suite.
    #[serde(default)]
    pub after_all: Vec<Step>,

    /// The tests declared directly in this suite.
    #[serde(default)]
    pub tests: Vec<TestDoc>,

    /// Nested suites, run before this suite's own tests.
    #[serde(default)]
    pub suites: Vec<SuiteDoc>,
}

/// A single named test scenario.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TestDoc {
    /// Name for this test, printed on its result line.
    pub name: String,

    /// The steps the test evaluates, in order. The first failing step
    /// skips the rest of the body.
    #[serde(default)]
    pub body: Vec<Step>,
}

/// One statement of a test body or hook.
///
/// Each step is a single-key map where the key determines the action.
/// Every string field is `${key}`-interpolated against the suite's
/// execution context before use.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Bind a context key to a value.
    Set { key: String, value: Value },

    /// Create a directory if it does not exist yet.
    MakeDir(String),

    /// Remove every entry of a directory.
    ClearDir(String),

    /// Invoke the program under test.
    Exec(Exec),

    /// Check a predicate; a false predicate fails the enclosing test.
    Assert(Assert),
}

/// A scalar held in the execution context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Value {
    /// Boolean flag.
    Bool(bool),
    /// Integer, e.g. an expected count.
    Int(i64),
    /// Text, the common case for paths and captured output.
    Str(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

/// One invocation of the program under test.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Exec {
    /// Arguments passed to the program.
    pub args: Vec<String>,

    /// Bytes fed to the program's standard input, closed after writing.
    #[serde(default)]
    pub stdin: Option<InputSource>,

    /// Destination for the program's standard output. When absent the
    /// output is discarded.
    #[serde(default)]
    pub stdout: Option<OutputSink>,
}

/// Where the bytes for the program's standard input come from.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum InputSource {
    /// Literal text, written exactly as given.
    Text(String),
    /// Contents of a file.
    File(String),
}

/// Where the program's captured standard output goes.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OutputSink {
    /// Store the output in the context under this key.
    Var(String),
    /// Write the output bytes to a file.
    File(String),
}

/// A boolean predicate over the context and the filesystem.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Assert {
    /// Two files hold identical bytes.
    FilesEqual { path: String, golden: String },

    /// An interpolated string equals the bytes of a golden file.
    Equals { value: String, golden: String },

    /// An interpolated string contains a substring.
    Contains { value: String, needle: String },

    /// An interpolated string matches a regular expression.
    Matches { value: String, pattern: String },

    /// A file exists at the given path.
    FileExists(String),
}

/// Generate the JSON Schema for spec documents.
pub fn generate_schema() -> schemars::schema::RootSchema {
    schemars::schema_for!(SuiteDoc)
}
