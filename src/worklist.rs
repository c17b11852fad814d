//! Worklist retrieval through `agfapi worklist get <id>`.

use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

use crate::client::Agfapi;
use crate::util::process::ExecError;

/// Error fetching a worklist.
#[derive(Debug, Error, Diagnostic)]
pub enum WorklistError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Exec(#[from] ExecError),

    #[error("agfapi returned non-JSON output for worklist '{id}':\n{output}")]
    #[diagnostic(code(agfapi::worklist::malformed))]
    MalformedOutput {
        id: String,
        output: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Agfapi {
    /// Raw output of `worklist get <id>`, lines joined with `\n`.
    pub fn worklist_raw(&self, id: &str) -> Result<String, ExecError> {
        self.run_joined(["worklist", "get", id])
    }

    /// Fetch worklist `id` and parse it as JSON.
    pub fn get_worklist(&self, id: &str) -> Result<Value, WorklistError> {
        let output = self.worklist_raw(id)?;
        decode_worklist(id, &output)
    }
}

/// Fetch worklist `id` with the process-wide client.
pub fn get_worklist(id: &str) -> Result<Value, crate::Error> {
    Ok(Agfapi::global()?.get_worklist(id)?)
}

/// Parse the output of `worklist get <id>`.
pub fn decode_worklist(id: &str, output: &str) -> Result<Value, WorklistError> {
    let output = output.trim();
    serde_json::from_str(output).map_err(|source| WorklistError::MalformedOutput {
        id: id.to_string(),
        output: output.to_string(),
        source,
    })
}
