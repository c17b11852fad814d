//! `agfapi self worklist` command

use anyhow::{Context, Result};

use crate::cli::WorklistArgs;
use agfapi::{Agfapi, Settings};

pub fn execute(args: WorklistArgs, settings: &Settings) -> Result<()> {
    let client = Agfapi::init(settings)?;
    let worklist = client.get_worklist(&args.id)?;

    let json = serde_json::to_string_pretty(&worklist).context("failed to render worklist")?;
    println!("{}", json);
    Ok(())
}
