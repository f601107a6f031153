// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "keyward")]
#[command(about = "Clone and update git repositories over SSH with verified host keys")]
#[command(version)]
pub struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print final results
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print results as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    /// Accept any SSH host key. Only for throwaway test environments.
    #[arg(long, global = true, hide = true)]
    pub insecure_skip_host_verification: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clone a repository
    Clone {
        /// Repository URL
        url: String,

        /// Target directory (defaults to the repository name)
        dir: Option<PathBuf>,

        /// Create a bare repository
        #[arg(long)]
        bare: bool,

        /// Private key file, overriding keyward.yml
        #[arg(short, long)]
        key: Option<PathBuf>,

        /// SSH user, overriding keyward.yml
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Fetch everything from origin
    Update {
        /// Repository directory
        #[arg(default_value = ".")]
        dir: PathBuf,
    },

    /// Clone or update every repository listed in keyward.yml
    Sync,

    /// Show the trusted keys for a host
    KnownHosts {
        /// Hostname, or [host]:port
        host: String,
    },
}
