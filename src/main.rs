use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use flowweaver::presentation::cli::commands::{OptimiseCommand, SimulateCommand, ValidateCommand};
use flowweaver::presentation::cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("flowweaver=debug,info")
    } else {
        EnvFilter::new("flowweaver=info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::Validate { input } => ValidateCommand::execute(&input)?,
        Commands::Simulate {
            input,
            units,
            lots,
            start,
            output,
        } => SimulateCommand::execute(&input, units, lots, start, output)?,
        Commands::Optimise {
            input,
            units,
            lots,
            start,
            pools,
            min_capacity,
            max_capacity,
            deadline_minutes,
            output,
        } => OptimiseCommand::execute(
            &input,
            units,
            lots,
            start,
            pools,
            min_capacity,
            max_capacity,
            deadline_minutes,
            output,
        )?,
    }

    Ok(())
}
