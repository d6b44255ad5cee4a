mod context;
mod engine;
mod interp;
mod loader;
mod process;
mod report;
mod runner;
mod schema;
mod tree;

use clap::{Parser, Subcommand};
use engine::{Engine, EngineConfig};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "binspec")]
#[command(about = "A behavior-driven test harness for command-line programs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run every spec file in a directory against a program
    Run {
        /// Path to the program under test
        program: PathBuf,
        /// Directory containing *_spec.{yaml,yml,toml} files
        spec_dir: PathBuf,
    },
    /// Load and build spec files without running them
    Validate {
        /// Directory containing spec files
        spec_dir: PathBuf,
    },
    /// Scaffold a new spec file
    Init {
        /// Output path for the new spec file
        #[arg(default_value = "specs/example_spec.yaml")]
        path: PathBuf,
    },
    /// Output the spec document schema (for AI consumers)
    Schema,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Run { program, spec_dir } => {
            let engine = Engine::new(EngineConfig { program, spec_dir });
            if let Err(e) = engine.run() {
                eprintln!("Fatal: {e}");
                std::process::exit(1);
            }
            // Failing tests show up in the summary; only a fatal error
            // changes the exit status.
        }
        Command::Validate { spec_dir } => {
            let specs = match loader::find_specs(&spec_dir) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Error finding specs: {e}");
                    std::process::exit(1);
                }
            };

            if specs.is_empty() {
                eprintln!("No spec files found in: {}", spec_dir.display());
                std::process::exit(1);
            }

            let mut errors = 0;
            for path in &specs {
                match loader::load_spec(path) {
                    Ok(tree) => {
                        println!("✓ {} ({} tests)", path.display(), tree.test_count());
                    }
                    Err(e) => {
                        eprintln!("✗ {}: {e}", path.display());
                        errors += 1;
                    }
                }
            }

            if errors > 0 {
                eprintln!("\n{errors} spec(s) failed validation");
                std::process::exit(1);
            }
            println!("\nAll {} spec(s) valid", specs.len());
        }
        Command::Init { path } => {
            let template = r#"suite: example

before_all:
  - set: { key: tmp_dir, value: "${basedir}/tmp" }
  - make_dir: "${tmp_dir}"

before_each:
  - clear_dir: "${tmp_dir}"

after_all:
  - clear_dir: "${tmp_dir}"

tests:
  - name: copies input to output
    body:
      - exec:
          args: ["-"]
          stdin: { text: "hello\n" }
          stdout: { var: out }
      - assert:
          contains: { value: "${out}", needle: "hello" }

# suites:
#   - suite: nested scenarios
#     tests:
#       - name: compares against a golden file
#         body:
#           - exec:
#               args: ["${basedir}/data/input01.json", "--copy", "${tmp_dir}/out.json"]
#           - assert:
#               files_equal: { path: "${tmp_dir}/out.json", golden: "${basedir}/data/expect01.json" }
"#;
            if path.exists() {
                eprintln!("Error: file already exists: {}", path.display());
                std::process::exit(1);
            }
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
                && let Err(e) = fs::create_dir_all(parent)
            {
                eprintln!("Error creating directory: {e}");
                std::process::exit(1);
            }
            if let Err(e) = fs::write(&path, template) {
                eprintln!("Error writing file: {e}");
                std::process::exit(1);
            }
            println!("Created: {}", path.display());
        }
        Command::Schema => {
            let schema = schema::generate_schema();
            let json = serde_json::to_string_pretty(&schema).expect("Failed to serialize schema");
            println!("{json}");
        }
    }
}
