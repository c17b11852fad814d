//! The agfapi client: a provisioned binary and the ways to run it.
//!
//! The binary is provisioned once per process. [`Agfapi::global`] does so
//! lazily from the environment; [`Agfapi::init`] does so eagerly from
//! explicit settings and must run before anything else touches the client.
//! The outcome of that single attempt is kept: the resolved path never
//! changes afterwards, and a failure is reported again rather than retried.

use std::ffi::OsStr;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::Error;
use crate::provision::{BinaryProvisioner, ProvisionError};
use crate::util::config::Settings;
use crate::util::process::{ExecError, OutputLines, ProcessBuilder};

/// Exit code of [`Agfapi::passthrough`] when the command fails.
pub const FAILURE_EXIT_CODE: i32 = 11;

static GLOBAL: ClientSlot = ClientSlot::new();

/// Outcome of the one provisioning attempt a process makes.
struct ClientSlot(OnceLock<Result<Agfapi, String>>);

impl ClientSlot {
    const fn new() -> Self {
        ClientSlot(OnceLock::new())
    }

    fn is_set(&self) -> bool {
        self.0.get().is_some()
    }

    /// The recorded outcome, or run `attempt` if there is none yet.
    fn get_or_attempt<E>(&self, attempt: impl FnOnce() -> Result<Agfapi, E>) -> Result<&Agfapi, E>
    where
        E: fmt::Display + From<ProvisionError>,
    {
        if self.is_set() {
            return self.recorded();
        }
        self.attempt(attempt)
    }

    /// Run `attempt` and record its outcome. If another attempt was
    /// recorded first, that one wins.
    fn attempt<E>(&self, attempt: impl FnOnce() -> Result<Agfapi, E>) -> Result<&Agfapi, E>
    where
        E: fmt::Display + From<ProvisionError>,
    {
        let outcome = attempt();
        let recorded = match &outcome {
            Ok(client) => Ok(client.clone()),
            Err(e) => Err(e.to_string()),
        };
        let won = self.0.set(recorded).is_ok();

        match outcome {
            Err(e) if won => Err(e),
            _ => self.recorded(),
        }
    }

    fn recorded<E: From<ProvisionError>>(&self) -> Result<&Agfapi, E> {
        match self.0.get() {
            Some(Ok(client)) => Ok(client),
            Some(Err(message)) => Err(ProvisionError::PreviouslyFailed {
                message: message.clone(),
            }
            .into()),
            None => Err(ProvisionError::AlreadyInitialized.into()),
        }
    }
}

/// Handle to a ready-to-run agfapi binary.
#[derive(Debug, Clone)]
pub struct Agfapi {
    binary: PathBuf,
}

impl Agfapi {
    /// Wrap an already provisioned binary.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Agfapi {
            binary: binary.into(),
        }
    }

    /// The process-wide client, provisioned from the environment on first use.
    pub fn global() -> Result<&'static Agfapi, Error> {
        GLOBAL.get_or_attempt(|| -> Result<Agfapi, Error> {
            let settings = Settings::load()?;
            let binary = BinaryProvisioner::from_settings(&settings).provision()?;
            Ok(Agfapi::new(binary))
        })
    }

    /// Provision the process-wide client from `settings`.
    ///
    /// Fails with [`ProvisionError::AlreadyInitialized`] once provisioning
    /// has been attempted, successfully or not; the client is never
    /// reconfigured.
    pub fn init(settings: &Settings) -> Result<&'static Agfapi, ProvisionError> {
        Self::init_with(BinaryProvisioner::from_settings(settings))
    }

    /// Provision the process-wide client with a configured provisioner.
    pub fn init_with(provisioner: BinaryProvisioner) -> Result<&'static Agfapi, ProvisionError> {
        if GLOBAL.is_set() {
            return Err(ProvisionError::AlreadyInitialized);
        }

        GLOBAL.attempt(|| provisioner.provision().map(Agfapi::new))
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// A command invoking the binary with `args`.
    pub fn command<I, S>(&self, args: I) -> ProcessBuilder
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        ProcessBuilder::new(&self.binary).args(args)
    }

    /// Run the binary and stream its output lines.
    pub fn run<I, S>(&self, args: I) -> Result<OutputLines, ExecError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.command(args).stream()
    }

    /// Run the binary and return its output joined with `\n`.
    pub fn run_joined<I, S>(&self, args: I) -> Result<String, ExecError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.command(args).exec_joined()
    }

    /// Run the binary, printing each output line to stdout as it arrives.
    ///
    /// Returns the process exit code to use: `0` on success, or
    /// [`FAILURE_EXIT_CODE`] after writing the error to stderr.
    pub fn passthrough<I, S>(&self, args: I) -> i32
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        self.passthrough_to(args, &mut stdout.lock(), &mut stderr.lock())
    }

    /// [`Agfapi::passthrough`] writing to the given streams.
    pub fn passthrough_to<I, S>(&self, args: I, out: &mut dyn Write, err: &mut dyn Write) -> i32
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        match self.stream_to(args, out) {
            Ok(()) => 0,
            Err(e) => {
                let _ = writeln!(err, "{}", e);
                FAILURE_EXIT_CODE
            }
        }
    }

    fn stream_to<I, S>(&self, args: I, out: &mut dyn Write) -> Result<(), ExecError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for line in self.run(args)? {
            let line = line?;
            // A closed stdout (e.g. `| head`) is not a command failure.
            let _ = writeln!(out, "{}", line).and_then(|_| out.flush());
        }
        Ok(())
    }
}
