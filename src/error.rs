//! Crate-level error type.

use miette::Diagnostic;
use thiserror::Error;

use crate::provision::ProvisionError;
use crate::util::config::ConfigError;
use crate::util::process::ExecError;
use crate::worklist::WorklistError;

/// Any error this crate can return.
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Provision(#[from] ProvisionError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Exec(#[from] ExecError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Worklist(#[from] WorklistError),
}
