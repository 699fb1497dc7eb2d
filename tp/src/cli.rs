//! CLI command definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Log file location for the `tp` binary
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tripplanner")
        .join("logs")
        .join("tripplanner.log")
}

/// tp - plan a group trip with a generative provider
#[derive(Parser)]
#[command(
    name = "tp",
    about = "Plan a group trip stage by stage: itineraries, attractions, hotels, transport",
    version,
    after_help = "Logs are written to: ~/.local/share/tripplanner/logs/tripplanner.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Walk through one planning session interactively
    Plan,

    /// Print the effective configuration as YAML
    Config,
}
