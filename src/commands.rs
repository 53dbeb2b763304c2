use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "cleanmeta")]
#[command(about = "Strip document properties from office files", long_about = None)]
pub struct Cli {
    /// Configuration file to load, without extension
    #[arg(long, global = true, default_value = "Config")]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Remove properties from every office document under the given paths
    Process(ProcessArgs),
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct ProcessArgs {
    /// Copy each file to <name>.bak before changing anything
    #[arg(short, long)]
    pub backup: bool,

    /// Write a daily log file into a `log` directory next to the first path
    #[arg(short, long)]
    pub log: bool,

    /// Files or directories to process
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}
