//! agfapi CLI - provisions the agfapi binary and forwards commands to it

use std::ffi::OsString;

use anyhow::Result;
use clap::Parser;
use miette::Diagnostic;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use agfapi::util::config::{HOME_ENV, VERSION_ENV};
use agfapi::Settings;
use cli::{Cli, Commands, SelfArgs, SelfCommands};

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {}", render_chain(&e));
            if let Some(help) = help_for(&e) {
                eprintln!("help: {}", help);
            }
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let args: Vec<OsString> = std::env::args_os().collect();

    // Everything but `agfapi self ...` belongs to the wrapped binary
    if !cli::is_self_command(args.get(1..).unwrap_or_default()) {
        init_logging(false);
        let settings = Settings::load()?;
        let forwarded = args.into_iter().skip(1).collect();
        return commands::passthrough::execute(forwarded, &settings);
    }

    // Parse CLI
    let Commands::SelfCmd(args) = Cli::parse_from(args).command;

    init_logging(args.verbose);
    let settings = load_settings(&args)?;

    // Execute command
    let result = match args.command {
        SelfCommands::Install(args) => commands::install::execute(args, &settings),
        SelfCommands::Path => commands::path::execute(&settings),
        SelfCommands::Cache(args) => commands::cache::execute(args, &settings),
        SelfCommands::Worklist(args) => commands::worklist::execute(args, &settings),
        SelfCommands::Completions(args) => commands::completions::execute(args),
    };
    result.map(|()| 0)
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("agfapi=debug")
        } else {
            EnvFilter::new("agfapi=info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Settings with `--home` and `--binary-version` taking the place of their
/// environment variables.
fn load_settings(args: &SelfArgs) -> Result<Settings> {
    let home = args.home.as_ref().map(|p| p.display().to_string());
    let version = args.binary_version.clone();

    let settings = Settings::load_with(|key| match key {
        HOME_ENV => home.clone(),
        VERSION_ENV => version.clone(),
        _ => std::env::var(key).ok(),
    })?;
    Ok(settings)
}

/// The error and its causes joined with `: `, skipping causes whose text
/// an outer message already includes.
fn render_chain(e: &anyhow::Error) -> String {
    let mut message = e.to_string();
    for cause in e.chain().skip(1) {
        let cause = cause.to_string();
        if !message.contains(&cause) {
            message.push_str(": ");
            message.push_str(&cause);
        }
    }
    message
}

/// The first `help` text found along the error chain.
fn help_for(e: &anyhow::Error) -> Option<String> {
    e.chain().find_map(|cause| {
        cause
            .downcast_ref::<agfapi::Error>()
            .and_then(|d| d.help())
            .or_else(|| {
                cause
                    .downcast_ref::<agfapi::ProvisionError>()
                    .and_then(|d| d.help())
            })
            .or_else(|| {
                cause
                    .downcast_ref::<agfapi::util::config::ConfigError>()
                    .and_then(|d| d.help())
            })
            .map(|help| help.to_string())
    })
}
