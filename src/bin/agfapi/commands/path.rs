//! `agfapi self path` command

use anyhow::Result;

use agfapi::{BinaryProvisioner, Settings};

pub fn execute(settings: &Settings) -> Result<()> {
    let binary = BinaryProvisioner::from_settings(settings).provision()?;
    println!("{}", binary.display());
    Ok(())
}
