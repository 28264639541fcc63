use std::error::Error;

use clap::{Parser, Subcommand};
use commands::{
    analyze::{self, AnalyzeArgs},
    ci::{self, CiArgs},
    demo::{self, DemoArgs},
    simulate::{self, SimulateArgs},
};

mod commands;
mod manifest;

#[derive(Parser, Debug)]
#[command(name = "oaf", about = "Optimus calibration-graph simulator and trace analysis")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a scenario and write its trace into a run directory.
    Simulate(SimulateArgs),
    /// Derive base-failure attribution and check scores from a run directory.
    Analyze(AnalyzeArgs),
    /// Compute confidence intervals over one or more run directories.
    Ci(CiArgs),
    /// Run a canned scenario and print a JSON summary.
    Demo(DemoArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    match cli.command {
        Command::Simulate(args) => simulate::run(&args),
        Command::Analyze(args) => analyze::run(&args),
        Command::Ci(args) => ci::run(&args),
        Command::Demo(args) => demo::run(&args),
    }
}
