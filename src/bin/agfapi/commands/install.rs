//! `agfapi self install` command

use anyhow::Result;

use crate::cli::InstallArgs;
use agfapi::{BinaryProvisioner, Settings};

pub fn execute(args: InstallArgs, settings: &Settings) -> Result<()> {
    let provisioner = BinaryProvisioner::from_settings(settings);
    let version = provisioner.resolve_version()?;

    let binary = if args.force {
        provisioner.reinstall()?
    } else {
        provisioner.provision()?
    };

    eprintln!("   Installed agfapi {} at {}", version, binary.display());
    Ok(())
}
