//! Forwarding of unrecognized commands to the agfapi binary.

use std::ffi::OsString;

use anyhow::Result;

use agfapi::{Agfapi, Settings};

/// Run the binary with `args` and return the exit code for this process.
pub fn execute(args: Vec<OsString>, settings: &Settings) -> Result<i32> {
    let client = Agfapi::init(settings)?;
    Ok(client.passthrough(args))
}
