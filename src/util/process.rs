//! Subprocess execution utilities.
//!
//! Output is consumed as a pull-based stream of lines: the child's stdout is
//! read one line at a time while stderr is buffered on the side. The exit
//! status is only inspected once stdout has been exhausted.

use std::ffi::OsStr;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};

use miette::Diagnostic;
use thiserror::Error;
use tracing::debug;

/// Error running a subprocess.
#[derive(Debug, Error, Diagnostic)]
pub enum ExecError {
    #[error("failed to spawn `{command}`")]
    #[diagnostic(code(agfapi::exec::spawn))]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to read output of `{command}`")]
    #[diagnostic(code(agfapi::exec::read))]
    Read {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("agfapi command failed ({}):\n{stderr}", describe_exit(*code))]
    #[diagnostic(code(agfapi::exec::failed))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// Quote a single argument for display in a command line.
///
/// The argument is wrapped in double quotes and embedded double quotes are
/// backslash-escaped.
pub fn quote_arg(arg: &str) -> String {
    format!("\"{}\"", arg.replace('"', "\\\""))
}

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// The full command line, with every argument quoted.
    ///
    /// Arguments are passed to the child directly rather than through a
    /// shell, so this rendering is for logs and error messages only.
    pub fn command_line(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().map(|a| quote_arg(a)));
        parts.join(" ")
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd
    }

    /// Spawn the process and return its stdout as a stream of lines.
    pub fn stream(&self) -> Result<OutputLines, ExecError> {
        let command = self.command_line();
        debug!("Running {}", command);

        let mut child = self
            .build_command()
            .spawn()
            .map_err(|source| ExecError::Spawn {
                command: command.clone(),
                source,
            })?;

        let stdout = child.stdout.take().map(BufReader::new);
        let stderr = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = pipe.read_to_end(&mut buf);
                buf
            })
        });

        Ok(OutputLines {
            command,
            child,
            stdout,
            stderr,
            stderr_text: String::new(),
            status: None,
            done: false,
        })
    }

    /// Run to completion and return stdout lines joined with `\n`.
    pub fn exec_joined(&self) -> Result<String, ExecError> {
        let lines = self.stream()?.collect::<Result<Vec<_>, _>>()?;
        Ok(lines.join("\n"))
    }
}

/// Lines of a running process's stdout.
///
/// Yields `Ok(line)` for each line (without its line terminator, invalid
/// UTF-8 replaced), then, once stdout closes, a single `Err` if the process
/// exited unsuccessfully. The stream is single-pass. Dropping it before the
/// end kills the process.
pub struct OutputLines {
    command: String,
    child: Child,
    stdout: Option<BufReader<ChildStdout>>,
    stderr: Option<JoinHandle<Vec<u8>>>,
    stderr_text: String,
    status: Option<ExitStatus>,
    done: bool,
}

impl OutputLines {
    /// Drain the remaining output and return the exit status.
    ///
    /// Fails with [`ExecError::CommandFailed`] on a non-zero exit, even if
    /// the failure was already yielded by the iterator.
    pub fn finish(mut self) -> Result<ExitStatus, ExecError> {
        while self.read_line()?.is_some() {}
        self.wait()
    }

    fn read_line(&mut self) -> Result<Option<String>, ExecError> {
        let Some(reader) = self.stdout.as_mut() else {
            return Ok(None);
        };

        let mut buf = Vec::new();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|source| ExecError::Read {
                command: self.command.clone(),
                source,
            })?;

        if read == 0 {
            self.stdout = None;
            return Ok(None);
        }

        if buf.ends_with(b"\n") {
            buf.pop();
            if buf.ends_with(b"\r") {
                buf.pop();
            }
        }
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }

    fn wait(&mut self) -> Result<ExitStatus, ExecError> {
        let status = match self.status {
            Some(status) => status,
            None => {
                self.stdout = None;
                let status = self.child.wait().map_err(|source| ExecError::Read {
                    command: self.command.clone(),
                    source,
                })?;
                let stderr = self
                    .stderr
                    .take()
                    .and_then(|handle| handle.join().ok())
                    .unwrap_or_default();
                self.stderr_text = String::from_utf8_lossy(&stderr).trim().to_string();
                self.status = Some(status);
                status
            }
        };

        if status.success() {
            Ok(status)
        } else {
            Err(ExecError::CommandFailed {
                command: self.command.clone(),
                code: status.code(),
                stderr: self.stderr_text.clone(),
            })
        }
    }
}

impl Iterator for OutputLines {
    type Item = Result<String, ExecError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.read_line() {
            Ok(Some(line)) => Some(Ok(line)),
            Ok(None) => {
                self.done = true;
                self.wait().err().map(Err)
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl Drop for OutputLines {
    fn drop(&mut self) {
        if self.status.is_none() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}
