use std::error::Error;

use clap::{Args, ValueEnum};
use oaf_analysis::count_failures;
use oaf_sim::{distribution_chain, simple_chain, simple_diamond, trend_chain};
use serde_json::json;

#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Canned scenario to run.
    #[arg(long, value_enum, default_value_t = Scenario::SimpleDiamond)]
    pub scenario: Scenario,
    /// Override the master seed.
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Scenario {
    SimpleChain,
    SimpleDiamond,
    TrendChain,
    DistributionChain,
    SpaChain,
}

pub fn run(args: &DemoArgs) -> Result<(), Box<dyn Error>> {
    let mut scenario = match args.scenario {
        Scenario::SimpleChain => simple_chain(),
        Scenario::SimpleDiamond => simple_diamond(),
        Scenario::TrendChain => trend_chain(),
        Scenario::DistributionChain => distribution_chain(false),
        Scenario::SpaChain => distribution_chain(true),
    };
    if let Some(seed) = args.seed {
        scenario.seed_policy.master_seed = seed;
    }

    let graph = scenario.build_graph()?;
    let trace = scenario.run()?;
    let diagnosis_waves = trace.waves.iter().filter(|w| !w.timed_trigger).count();
    let failed_checks = trace
        .checks
        .iter()
        .filter(|c| c.failure_magnitude.is_failure())
        .count();

    let report = json!({
        "scenario": scenario.name,
        "master_seed": scenario.seed_policy.master_seed,
        "steps": scenario.steps,
        "nodes": graph.nodes(),
        "waves": trace.waves.len(),
        "diagnosis_waves": diagnosis_waves,
        "checks": trace.checks.len(),
        "failed_checks": failed_checks,
        "failure_counts": count_failures(&trace.waves, graph.nodes()),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
