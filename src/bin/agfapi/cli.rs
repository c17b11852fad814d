//! CLI definitions using clap.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// First argument that selects the wrapper's own commands. Any other
/// command line is forwarded to the agfapi binary untouched.
pub const SELF_COMMAND: &str = "self";

/// Whether `args` (without the program name) belong to the wrapper.
pub fn is_self_command(args: &[OsString]) -> bool {
    args.first().is_some_and(|first| first == SELF_COMMAND)
}

/// agfapi - runs the agfapi client, downloading it on first use
///
/// Only `agfapi self ...` is handled here; every other command line is
/// forwarded to the agfapi binary unchanged.
#[derive(Parser)]
#[command(name = "agfapi")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage the provisioned agfapi binary
    #[command(name = "self")]
    SelfCmd(SelfArgs),
}

#[derive(Args)]
pub struct SelfArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding the binary cache and config.toml
    #[arg(long, global = true, env = "AGFAPI_HOME_DIR", value_name = "DIR")]
    pub home: Option<PathBuf>,

    /// Release of the agfapi binary to use (e.g. v1.2.3 or latest)
    #[arg(long, global = true, env = "AGFAPI_VERSION", value_name = "TAG")]
    pub binary_version: Option<String>,

    #[command(subcommand)]
    pub command: SelfCommands,
}

#[derive(Subcommand)]
pub enum SelfCommands {
    /// Download the agfapi binary if it is not cached
    Install(InstallArgs),

    /// Print the path of the agfapi binary, downloading it if needed
    Path,

    /// Manage cached binaries
    Cache(CacheArgs),

    /// Fetch a worklist and pretty-print it as JSON
    Worklist(WorklistArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct InstallArgs {
    /// Discard the cached binary and download it again
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommands,
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// List cached versions
    List,

    /// Remove cached binaries
    Clean(CacheCleanArgs),
}

#[derive(Args)]
pub struct CacheCleanArgs {
    /// Only remove this version
    #[arg(long, value_name = "TAG")]
    pub version: Option<String>,
}

#[derive(Args)]
pub struct WorklistArgs {
    /// Worklist identifier
    pub id: String,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
