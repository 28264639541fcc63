//! Failure attribution and timing analysis over wave traces.
//!
//! A *base failure* is a failed node none of whose dependencies failed in
//! the same trigger group: the place the failure chain started. A
//! *downstream node* is a failed node none of whose dependents failed, i.e.
//! the furthest point the chain propagated to.

use std::collections::{BTreeMap, BTreeSet};

use oaf_core::errors::OafError;
use oaf_core::records::{sort_waves, WaveRecord};
use oaf_graph::CalibrationGraph;
use serde::{Deserialize, Serialize};

use crate::processing::split_by_trigger;

/// Aggregated base-failure counts: downstream node -> base cause -> count.
pub type BaseFailureStats = BTreeMap<String, BTreeMap<String, usize>>;

/// Per-node times between successive failures.
///
/// Timing starts at the first timed trigger, where every node is treated as
/// freshly calibrated. Each diagnosis wave rooted at a node marks a failure.
pub fn time_to_failure(waves: &[WaveRecord], nodes: &[String]) -> BTreeMap<String, Vec<f64>> {
    let mut sorted = waves.to_vec();
    sort_waves(&mut sorted);
    let first_trigger = sorted.iter().position(|record| record.timed_trigger);
    let Some(first) = first_trigger else {
        return nodes.iter().map(|n| (n.clone(), Vec::new())).collect();
    };
    let sorted = &sorted[first..];

    let mut times: BTreeMap<String, Vec<f64>> =
        nodes.iter().map(|n| (n.clone(), Vec::new())).collect();
    let mut last_failure: BTreeMap<String, f64> =
        nodes.iter().map(|n| (n.clone(), sorted[0].wave)).collect();

    for record in sorted {
        if record.timed_trigger {
            continue;
        }
        for node in &record.root_nodes {
            if let (Some(last), Some(entries)) =
                (last_failure.get_mut(node), times.get_mut(node))
            {
                entries.push(record.wave - *last);
                *last = record.wave;
            }
        }
    }
    times
}

/// Per-node times between the trigger groups in which the node was a base
/// cause.
pub fn time_to_failure_base(
    waves: &[WaveRecord],
    graph: &CalibrationGraph,
) -> Result<BTreeMap<String, Vec<f64>>, OafError> {
    let groups = split_by_trigger(waves);
    let mut times: BTreeMap<String, Vec<f64>> = graph
        .nodes()
        .iter()
        .map(|n| (n.clone(), Vec::new()))
        .collect();
    let Some(first_group) = groups.first() else {
        return Ok(times);
    };
    let start = first_group[0].wave;
    let mut last_failure: BTreeMap<String, f64> =
        graph.nodes().iter().map(|n| (n.clone(), start)).collect();

    for group in &groups {
        let failure_time = group[0].wave;
        let attribution = base_failures_for_group(group, graph)?;
        let base_nodes: BTreeSet<&String> =
            attribution.values().flat_map(|causes| causes.iter()).collect();
        for node in base_nodes {
            if let (Some(last), Some(entries)) =
                (last_failure.get_mut(node.as_str()), times.get_mut(node.as_str()))
            {
                entries.push(failure_time - *last);
                *last = failure_time;
            }
        }
    }
    Ok(times)
}

/// Counts diagnosis-wave failures per node over a stretch of wave data.
pub fn count_failures(waves: &[WaveRecord], nodes: &[String]) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = nodes.iter().map(|n| (n.clone(), 0)).collect();
    for record in waves {
        if record.timed_trigger {
            continue;
        }
        for node in &record.root_nodes {
            if let Some(count) = counts.get_mut(node) {
                *count += 1;
            }
        }
    }
    counts
}

/// Counts base-cause failures per node over a stretch of wave data.
pub fn count_base_failures(
    waves: &[WaveRecord],
    graph: &CalibrationGraph,
) -> Result<BTreeMap<String, usize>, OafError> {
    let mut counts: BTreeMap<String, usize> =
        graph.nodes().iter().map(|n| (n.clone(), 0)).collect();
    for group in split_by_trigger(waves) {
        let attribution = base_failures_for_group(&group, graph)?;
        let base_nodes: BTreeSet<&String> =
            attribution.values().flat_map(|causes| causes.iter()).collect();
        for node in base_nodes {
            if let Some(count) = counts.get_mut(node) {
                *count += 1;
            }
        }
    }
    Ok(counts)
}

/// Attributes the failures of one trigger group to their base causes.
///
/// Downstream nodes are those submitted by the trigger that failed and have
/// no failed dependent; each is mapped to the deepest failed nodes reachable
/// along its failed dependencies.
pub fn base_failures_for_group(
    group: &[WaveRecord],
    graph: &CalibrationGraph,
) -> Result<BTreeMap<String, Vec<String>>, OafError> {
    let mut failed: BTreeSet<String> = BTreeSet::new();
    for record in group {
        if !record.timed_trigger {
            failed.extend(record.root_nodes.iter().cloned());
        }
    }

    let mut downstream: BTreeSet<String> = BTreeSet::new();
    for record in group {
        if record.timed_trigger {
            for node in &record.submitted_nodes {
                if failed.contains(node) {
                    downstream.insert(node.clone());
                }
            }
        }
    }
    // A failed node with a failed dependent is intermediate, not downstream.
    let downstream: Vec<String> = downstream
        .into_iter()
        .filter(|node| {
            graph
                .predecessors(node)
                .map(|deps| !deps.iter().any(|dep| failed.contains(dep)))
                .unwrap_or(true)
        })
        .collect();

    let mut attribution = BTreeMap::new();
    for node in downstream {
        let causes = base_causes(&node, &failed, graph)?;
        attribution.insert(node, causes);
    }
    Ok(attribution)
}

fn base_causes(
    node: &str,
    failed: &BTreeSet<String>,
    graph: &CalibrationGraph,
) -> Result<Vec<String>, OafError> {
    let mut causes = BTreeSet::new();
    let mut found_deeper = false;
    for dependency in graph.successors(node)? {
        if failed.contains(dependency) {
            found_deeper = true;
            causes.extend(base_causes(dependency, failed, graph)?);
        }
    }
    if found_deeper {
        Ok(causes.into_iter().collect())
    } else {
        Ok(vec![node.to_string()])
    }
}

/// Aggregates base-failure attributions over every trigger group.
pub fn find_base_failures(
    waves: &[WaveRecord],
    graph: &CalibrationGraph,
) -> Result<BaseFailureStats, OafError> {
    let mut stats: BaseFailureStats = BTreeMap::new();
    for group in split_by_trigger(waves) {
        let attribution = base_failures_for_group(&group, graph)?;
        for (node, causes) in attribution {
            let entry = stats.entry(node).or_default();
            for cause in causes {
                *entry.entry(cause).or_insert(0) += 1;
            }
        }
    }
    Ok(stats)
}

/// Normalizes base-cause counts to proportions per downstream node.
pub fn base_failure_proportions(stats: &BaseFailureStats) -> BTreeMap<String, BTreeMap<String, f64>> {
    let mut proportions = BTreeMap::new();
    for (node, causes) in stats {
        let total: usize = causes.values().sum();
        let mut scaled = BTreeMap::new();
        for (cause, count) in causes {
            scaled.insert(cause.clone(), *count as f64 / total as f64);
        }
        proportions.insert(node.clone(), scaled);
    }
    proportions
}

/// Average dependency-path length from downstream node to base cause per
/// base node, weighted by failure count. Nodes never seen as a base cause
/// map to zero.
pub fn mean_failure_chain_length(
    stats: &BaseFailureStats,
    graph: &CalibrationGraph,
) -> Result<BTreeMap<String, f64>, OafError> {
    let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for (downstream, causes) in stats {
        let lengths = graph.shortest_path_lengths(downstream)?;
        for (cause, count) in causes {
            let length = *lengths.get(cause).unwrap_or(&0) as f64;
            let entry = sums.entry(cause.clone()).or_insert((0.0, 0));
            entry.0 += length * *count as f64;
            entry.1 += count;
        }
    }

    let mut averages = BTreeMap::new();
    for node in graph.nodes() {
        let value = sums
            .get(node)
            .map(|(total, count)| total / *count as f64)
            .unwrap_or(0.0);
        averages.insert(node.clone(), value);
    }
    Ok(averages)
}

/// Mean propagation depth and failure count for one base node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropagationDepth {
    /// Mean hop depth from downstream failure to this base cause, or `-1.0`
    /// when the node never caused a failure.
    pub depth: f64,
    /// Number of distinct downstream nodes attributed to this base cause.
    pub failures: usize,
}

/// Per-node mean failure propagation depth derived from base-failure stats.
///
/// Each `(downstream, base cause)` pair contributes its path depth once,
/// however many trigger groups it recurred in.
pub fn failure_propagation_depth(
    stats: &BaseFailureStats,
    graph: &CalibrationGraph,
) -> Result<BTreeMap<String, PropagationDepth>, OafError> {
    let mut depths: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (downstream, causes) in stats {
        let lengths = graph.shortest_path_lengths(downstream)?;
        for cause in causes.keys() {
            let length = *lengths.get(cause).unwrap_or(&0) as f64;
            depths.entry(cause.clone()).or_default().push(length);
        }
    }

    let mut result = BTreeMap::new();
    for node in graph.nodes() {
        let entry = match depths.get(node) {
            Some(values) if !values.is_empty() => PropagationDepth {
                depth: values.iter().sum::<f64>() / values.len() as f64,
                failures: values.len(),
            },
            _ => PropagationDepth {
                depth: -1.0,
                failures: 0,
            },
        };
        result.insert(node.clone(), entry);
    }
    Ok(result)
}

/// Counts, per sorted node pair, how often both nodes failed within the same
/// trigger group.
pub fn co_occurring_failures(
    waves: &[WaveRecord],
    nodes: &[String],
) -> BTreeMap<(String, String), usize> {
    let mut matrix: BTreeMap<(String, String), usize> = BTreeMap::new();
    for (idx, a) in nodes.iter().enumerate() {
        for b in &nodes[idx + 1..] {
            let pair = sorted_pair(a, b);
            matrix.insert(pair, 0);
        }
    }

    for group in split_by_trigger(waves) {
        let mut failing: Vec<&String> = Vec::new();
        for record in &group {
            if !record.timed_trigger {
                failing.extend(record.root_nodes.iter());
            }
        }
        for (idx, a) in failing.iter().enumerate() {
            for b in &failing[idx + 1..] {
                if a == b {
                    continue;
                }
                let pair = sorted_pair(a, b);
                *matrix.entry(pair).or_insert(0) += 1;
            }
        }
    }
    matrix
}

pub(crate) fn sorted_pair(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}
