use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Args;
use oaf_analysis::{time_to_failure, time_to_failure_base};
use oaf_stats::{ci_failures_per_period, ci_time_to_failure, FailureKind};
use serde_json::json;

use super::{load_graph, load_waves, write_json};

#[derive(Args, Debug)]
pub struct CiArgs {
    /// Run directories to pool, one per observation period.
    #[arg(long = "inputs", value_name = "PATH", required = true)]
    pub inputs: Vec<PathBuf>,
    /// Output JSON report path.
    #[arg(long)]
    pub out: PathBuf,
    /// Population proportion the intervals cover.
    #[arg(long, default_value_t = 0.9)]
    pub proportion: f64,
    /// Confidence level of the intervals.
    #[arg(long, default_value_t = 0.9)]
    pub confidence: f64,
    /// Attribute failures to base causes instead of counting every diagnosis.
    #[arg(long)]
    pub base: bool,
}

pub fn run(args: &CiArgs) -> Result<(), Box<dyn Error>> {
    let graph = load_graph(&args.inputs[0])?;
    let mut periods = Vec::new();
    for dir in &args.inputs {
        periods.push(load_waves(dir)?);
    }
    let kind = if args.base {
        FailureKind::Base
    } else {
        FailureKind::All
    };

    // Each run restarts its clock, so time-to-failure samples are computed
    // per run and pooled per node before interval estimation.
    let mut ttf_samples: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for waves in &periods {
        let per_run = match kind {
            FailureKind::All => time_to_failure(waves, graph.nodes()),
            FailureKind::Base => time_to_failure_base(waves, &graph)?,
        };
        for (node, mut samples) in per_run {
            ttf_samples.entry(node).or_default().append(&mut samples);
        }
    }

    let time_to_failure_ci = ci_time_to_failure(&ttf_samples, args.proportion, args.confidence)?;
    let failures_per_period =
        ci_failures_per_period(&periods, &graph, kind, args.proportion, args.confidence)?;

    let report = json!({
        "kind": kind,
        "proportion": args.proportion,
        "confidence": args.confidence,
        "runs": args.inputs.len(),
        "time_to_failure": time_to_failure_ci,
        "failures_per_period": failures_per_period,
    });
    if let Some(parent) = args.out.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    write_json(&args.out, &report)?;
    Ok(())
}
