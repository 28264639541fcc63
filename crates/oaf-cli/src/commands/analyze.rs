use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Args;
use oaf_analysis::{
    base_failure_proportions, check_scores, co_occurring_check_failures, co_occurring_failures,
    count_base_failures, count_failures, failure_propagation_depth, find_base_failures,
    mean_failure_chain_length, time_to_failure, time_to_failure_base,
};
use serde::Serialize;
use serde_json::json;

use super::{load_checks, load_graph, load_waves, write_json};
use crate::manifest::RunManifest;

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Run directory produced by `oaf simulate`.
    #[arg(long)]
    pub input: PathBuf,
    /// Output directory for analysis artefacts.
    #[arg(long)]
    pub out: PathBuf,
}

#[derive(Debug, Serialize)]
struct TtfRow<'a> {
    node: &'a str,
    kind: &'static str,
    time: f64,
}

#[derive(Debug, Serialize)]
struct CoOccurrenceRow<'a> {
    node_a: &'a str,
    node_b: &'a str,
    wave_failures: usize,
    check_failures: usize,
}

#[derive(Debug, Serialize)]
struct ChainRow<'a> {
    node: &'a str,
    mean_chain_length: f64,
}

#[derive(Debug, Serialize)]
struct DepthRow<'a> {
    node: &'a str,
    depth: f64,
    failures: usize,
}

#[derive(Debug, Serialize)]
struct ScoreRow<'a> {
    node: &'a str,
    checks: usize,
    failures: usize,
    avg_failure_magnitude: f64,
    avg_failure_chain_length: f64,
    cofailure_score: usize,
    check_more: f64,
    check_less: f64,
}

pub fn run(args: &AnalyzeArgs) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(&args.out)?;
    let waves = load_waves(&args.input)?;
    let checks = load_checks(&args.input)?;
    let graph = load_graph(&args.input)?;

    let manifest = RunManifest::load(&args.input.join("manifest.json"))?;

    let stats = find_base_failures(&waves, &graph)?;
    let base = json!({
        "scenario": manifest.scenario,
        "master_seed": manifest.provenance.seed,
        "config_sha256": manifest.provenance.input_hash,
        "failure_counts": count_failures(&waves, graph.nodes()),
        "base_failure_counts": count_base_failures(&waves, &graph)?,
        "base_failure_proportions": base_failure_proportions(&stats),
    });
    write_json(&args.out.join("base_failures.json"), &base)?;

    let mut wtr = csv::Writer::from_path(args.out.join("time_to_failure.csv"))?;
    for (node, times) in time_to_failure(&waves, graph.nodes()) {
        for time in times {
            wtr.serialize(TtfRow {
                node: &node,
                kind: "all",
                time,
            })?;
        }
    }
    for (node, times) in time_to_failure_base(&waves, &graph)? {
        for time in times {
            wtr.serialize(TtfRow {
                node: &node,
                kind: "base",
                time,
            })?;
        }
    }
    wtr.flush()?;

    let wave_pairs = co_occurring_failures(&waves, graph.nodes());
    let check_pairs = co_occurring_check_failures(&waves, &checks);
    let mut wtr = csv::Writer::from_path(args.out.join("co_occurrence.csv"))?;
    for ((a, b), wave_failures) in &wave_pairs {
        let check_failures = *check_pairs.get(&(a.clone(), b.clone())).unwrap_or(&0);
        wtr.serialize(CoOccurrenceRow {
            node_a: a,
            node_b: b,
            wave_failures: *wave_failures,
            check_failures,
        })?;
    }
    wtr.flush()?;

    let mut wtr = csv::Writer::from_path(args.out.join("chain_lengths.csv"))?;
    for (node, mean_chain_length) in mean_failure_chain_length(&stats, &graph)? {
        wtr.serialize(ChainRow {
            node: &node,
            mean_chain_length,
        })?;
    }
    wtr.flush()?;

    let mut wtr = csv::Writer::from_path(args.out.join("propagation_depth.csv"))?;
    for (node, depth) in failure_propagation_depth(&stats, &graph)? {
        wtr.serialize(DepthRow {
            node: &node,
            depth: depth.depth,
            failures: depth.failures,
        })?;
    }
    wtr.flush()?;

    let mut wtr = csv::Writer::from_path(args.out.join("check_scores.csv"))?;
    for (node, score) in check_scores(&waves, &checks, &graph)? {
        wtr.serialize(ScoreRow {
            node: &node,
            checks: score.checks,
            failures: score.failures,
            avg_failure_magnitude: score.avg_failure_magnitude,
            avg_failure_chain_length: score.avg_failure_chain_length,
            cofailure_score: score.cofailure_score,
            check_more: score.check_more,
            check_less: score.check_less,
        })?;
    }
    wtr.flush()?;
    Ok(())
}
