//! Invocation of the program under test.
//!
//! Spawns the program, optionally feeds its standard input, optionally
//! captures its standard output, and always waits for it to exit. A
//! nonzero exit is an error carrying the observed status.

use std::io::{ErrorKind, Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

/// Error type for program invocations.
#[derive(Debug)]
pub enum ProcessError {
    /// The program could not be spawned.
    Spawn(std::io::Error),
    /// Writing the program's standard input failed.
    Stdin(std::io::Error),
    /// Reading the program's standard output failed.
    Stdout(std::io::Error),
    /// Waiting for the program failed.
    Wait(std::io::Error),
    /// The program ran but did not exit with status zero.
    Exit {
        code: Option<i32>,
        signal: Option<i32>,
    },
}

impl ProcessError {
    /// The exit code for an [`ProcessError::Exit`], if the program
    /// exited normally.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ProcessError::Exit { code, .. } => *code,
            _ => None,
        }
    }
}

impl std::fmt::Display for ProcessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessError::Spawn(e) => write!(f, "failed to spawn program: {e}"),
            ProcessError::Stdin(e) => write!(f, "failed to write program input: {e}"),
            ProcessError::Stdout(e) => write!(f, "failed to read program output: {e}"),
            ProcessError::Wait(e) => write!(f, "failed to wait for program: {e}"),
            ProcessError::Exit {
                code: Some(code), ..
            } => {
                write!(f, "program exited with code {code}")
            }
            ProcessError::Exit {
                signal: Some(signal),
                ..
            } => {
                write!(f, "program terminated by signal {signal}")
            }
            ProcessError::Exit { .. } => write!(f, "program exited abnormally"),
        }
    }
}

impl std::error::Error for ProcessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProcessError::Spawn(e)
            | ProcessError::Stdin(e)
            | ProcessError::Stdout(e)
            | ProcessError::Wait(e) => Some(e),
            ProcessError::Exit { .. } => None,
        }
    }
}

/// Run the program under test to completion.
///
/// Returns the captured output bytes when `capture` is set. Input bytes
/// are written from a scoped thread while the calling thread drains
/// standard output: writing everything first and reading second deadlocks
/// once the program fills its pipe buffer before consuming all input.
/// Standard error goes to the null device, so the program can never block
/// writing diagnostics.
pub fn invoke(
    program: &Path,
    args: &[String],
    input: Option<&[u8]>,
    capture: bool,
) -> Result<Option<Vec<u8>>, ProcessError> {
    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.stdin(if input.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    });
    cmd.stdout(if capture { Stdio::piped() } else { Stdio::null() });
    cmd.stderr(Stdio::null());

    let mut child = cmd.spawn().map_err(ProcessError::Spawn)?;
    let stdin = child.stdin.take();
    let mut stdout = child.stdout.take();

    let captured = thread::scope(|scope| {
        let writer = input.and_then(|bytes| {
            stdin.map(|mut sink| {
                scope.spawn(move || {
                    match sink.write_all(bytes) {
                        // The program may exit without consuming all of
                        // its input; its exit status tells the story.
                        Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
                        other => other,
                    }
                    // Dropping the sink closes the pipe; the program
                    // observes end-of-input.
                })
            })
        });

        let captured = match stdout.as_mut() {
            Some(out) => {
                let mut buf = Vec::new();
                out.read_to_end(&mut buf).map_err(ProcessError::Stdout)?;
                Some(buf)
            }
            None => None,
        };

        if let Some(handle) = writer {
            handle
                .join()
                .expect("stdin writer panicked")
                .map_err(ProcessError::Stdin)?;
        }

        Ok(captured)
    })?;

    let status = child.wait().map_err(ProcessError::Wait)?;
    if !status.success() {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        return Err(ProcessError::Exit {
            code: status.code(),
            signal,
        });
    }

    Ok(captured)
}
