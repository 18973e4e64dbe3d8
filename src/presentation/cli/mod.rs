//! Command-line interface surface
//!
//! Built with `clap`'s derive API, the same way the original CLI parsed
//! its analyze/report flags; subcommands here are `validate`, `simulate`
//! and `optimise` instead of a single analysis pass.

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "flowweaver",
    version,
    about = "Production flow scheduler and discrete-event simulation engine"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enables debug-level logging.
    #[arg(long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Checks a flow definition for structural errors without simulating it.
    Validate {
        /// Path to the flow definition JSON file.
        input: PathBuf,
    },
    /// Runs a discrete-event simulation of a flow definition against a demand.
    Simulate {
        input: PathBuf,
        /// Flat unit count; mutually exclusive with `--lots`.
        #[arg(long)]
        units: Option<u32>,
        /// Path to a lot-list demand JSON file; mutually exclusive with `--units`.
        #[arg(long)]
        lots: Option<PathBuf>,
        /// Simulation start instant, "YYYY-MM-DD HH:MM"; defaults to the
        /// flow's calendar's next working minute after midnight today.
        #[arg(long)]
        start: Option<String>,
        /// Write the JSON report here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Searches for the minimum staffing that meets a deadline.
    Optimise {
        input: PathBuf,
        #[arg(long)]
        units: Option<u32>,
        #[arg(long)]
        lots: Option<PathBuf>,
        #[arg(long)]
        start: Option<String>,
        /// Resource pool ids to search over; repeatable.
        #[arg(long = "pool")]
        pools: Vec<String>,
        #[arg(long, default_value_t = 1)]
        min_capacity: u32,
        #[arg(long)]
        max_capacity: u32,
        #[arg(long)]
        deadline_minutes: u32,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}
