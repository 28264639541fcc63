//! Node importance scoring: which nodes deserve more or fewer checks.

use std::collections::BTreeMap;

use oaf_core::errors::OafError;
use oaf_core::records::{CheckKind, CheckRecord, WaveRecord};
use oaf_graph::CalibrationGraph;
use serde::{Deserialize, Serialize};

use crate::failure::{find_base_failures, mean_failure_chain_length, sorted_pair};
use crate::processing::organize_checks_by_trigger;

/// Counts, per sorted node pair, how often both nodes failed a data check
/// within the same trigger bucket.
pub fn co_occurring_check_failures(
    waves: &[WaveRecord],
    checks: &[CheckRecord],
) -> BTreeMap<(String, String), usize> {
    let mut matrix: BTreeMap<(String, String), usize> = BTreeMap::new();
    for (_, bucket) in organize_checks_by_trigger(waves, checks) {
        let failing: Vec<&String> = bucket
            .iter()
            .filter(|check| {
                check.failure_magnitude.is_failure() && check.check_kind == CheckKind::CheckData
            })
            .map(|check| &check.node)
            .collect();
        for (idx, a) in failing.iter().enumerate() {
            for b in &failing[idx + 1..] {
                if a == b {
                    continue;
                }
                *matrix.entry(sorted_pair(a, b)).or_insert(0) += 1;
            }
        }
    }
    matrix
}

/// Per-node check statistics and the derived check-more / check-less scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckScore {
    /// Number of data checks recorded for the node.
    pub checks: usize,
    /// Number of failed data checks.
    pub failures: usize,
    /// Mean failure magnitude code over the failed checks.
    pub avg_failure_magnitude: f64,
    /// Average failure chain length when the node was a base cause.
    pub avg_failure_chain_length: f64,
    /// Total pairwise co-failure count involving the node.
    pub cofailure_score: usize,
    /// Weighted score suggesting the node should be checked more often.
    pub check_more: f64,
    /// Weighted score suggesting the node could be checked less often.
    pub check_less: f64,
}

/// Computes check scores for every node from raw wave and check data.
///
/// A high `check_more` score flags nodes that fail often, fail hard, or sit
/// at the base of long failure chains; a high `check_less` score flags nodes
/// whose checks almost always pass.
pub fn check_scores(
    waves: &[WaveRecord],
    checks: &[CheckRecord],
    graph: &CalibrationGraph,
) -> Result<BTreeMap<String, CheckScore>, OafError> {
    let stats = find_base_failures(waves, graph)?;
    let chain_lengths = mean_failure_chain_length(&stats, graph)?;
    let co_failures = co_occurring_check_failures(waves, checks);

    let mut counts: BTreeMap<&str, (usize, usize, Vec<u8>)> = graph
        .nodes()
        .iter()
        .map(|node| (node.as_str(), (0usize, 0usize, Vec::new())))
        .collect();
    for check in checks {
        if check.check_kind != CheckKind::CheckData {
            continue;
        }
        if let Some((total, failures, magnitudes)) = counts.get_mut(check.node.as_str()) {
            *total += 1;
            if check.failure_magnitude.is_failure() {
                *failures += 1;
                magnitudes.push(u8::from(check.failure_magnitude));
            }
        }
    }

    let mut scores = BTreeMap::new();
    for node in graph.nodes() {
        let (total, failures, magnitudes) = &counts[node.as_str()];
        let success_rate = (*total - *failures) as f64 / (*total).max(1) as f64;
        let avg_magnitude = magnitudes.iter().map(|m| *m as f64).sum::<f64>()
            / magnitudes.len().max(1) as f64;
        let chain_length = chain_lengths[node];
        let cofailure: usize = graph
            .nodes()
            .iter()
            .filter(|other| *other != node)
            .map(|other| *co_failures.get(&sorted_pair(node, other)).unwrap_or(&0))
            .sum();

        let check_more = 4.0 * avg_magnitude
            + 10.0 * (1.0 - success_rate)
            + 10.0 * chain_length
            + 3.0 * cofailure as f64;
        let check_less = 0.5 * success_rate
            + 0.2 * (1.0 / avg_magnitude.max(1.0))
            + 0.2 * (1.0 / chain_length.max(1.0));

        scores.insert(
            node.clone(),
            CheckScore {
                checks: *total,
                failures: *failures,
                avg_failure_magnitude: avg_magnitude,
                avg_failure_chain_length: chain_length,
                cofailure_score: cofailure,
                check_more,
                check_less,
            },
        );
    }
    Ok(scores)
}
