//! Confidence-interval wrappers over simulation traces.

use std::collections::BTreeMap;

use oaf_analysis::{count_base_failures, count_failures, time_to_failure, time_to_failure_base};
use oaf_core::errors::{ErrorInfo, OafError};
use oaf_core::WaveRecord;
use oaf_graph::CalibrationGraph;
use serde::{Deserialize, Serialize};

use crate::spa::{min_num_samples, quantile_interval, ConfidenceInterval};

/// Which failures to count when deriving intervals from a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Every diagnosis-wave failure.
    All,
    /// Only failures attributed as base causes.
    Base,
}

/// Confidence interval for an arbitrary sampled parameter.
pub fn ci_for_parameter(
    values: &[f64],
    proportion: f64,
    confidence: f64,
) -> Result<Option<ConfidenceInterval>, OafError> {
    quantile_interval(values, proportion, confidence)
}

/// Per-node confidence intervals for time-to-failure samples. Nodes with too
/// few samples map to `None`.
pub fn ci_time_to_failure(
    times: &BTreeMap<String, Vec<f64>>,
    proportion: f64,
    confidence: f64,
) -> Result<BTreeMap<String, Option<ConfidenceInterval>>, OafError> {
    let mut intervals = BTreeMap::new();
    for (node, samples) in times {
        intervals.insert(node.clone(), quantile_interval(samples, proportion, confidence)?);
    }
    Ok(intervals)
}

/// Per-node time-to-failure intervals computed directly from a wave trace.
pub fn ci_time_to_failure_from_waves(
    waves: &[WaveRecord],
    graph: &CalibrationGraph,
    kind: FailureKind,
    proportion: f64,
    confidence: f64,
) -> Result<BTreeMap<String, Option<ConfidenceInterval>>, OafError> {
    let times = match kind {
        FailureKind::All => time_to_failure(waves, graph.nodes()),
        FailureKind::Base => time_to_failure_base(waves, graph)?,
    };
    ci_time_to_failure(&times, proportion, confidence)
}

/// Per-node confidence intervals for the number of failures in a time
/// period, computed over several independent periods of wave data.
pub fn ci_failures_per_period(
    periods: &[Vec<WaveRecord>],
    graph: &CalibrationGraph,
    kind: FailureKind,
    proportion: f64,
    confidence: f64,
) -> Result<BTreeMap<String, Option<ConfidenceInterval>>, OafError> {
    let required = min_num_samples(proportion, confidence)?;
    if periods.len() < required {
        return Err(OafError::Stats(
            ErrorInfo::new(
                "insufficient-periods",
                "not enough time periods for the requested proportion and confidence",
            )
            .with_context("periods", periods.len().to_string())
            .with_context("required", required.to_string()),
        ));
    }

    let mut per_node: BTreeMap<String, Vec<f64>> = graph
        .nodes()
        .iter()
        .map(|node| (node.clone(), Vec::new()))
        .collect();
    for period in periods {
        let counts = match kind {
            FailureKind::All => count_failures(period, graph.nodes()),
            FailureKind::Base => count_base_failures(period, graph)?,
        };
        for (node, samples) in per_node.iter_mut() {
            samples.push(*counts.get(node).unwrap_or(&0) as f64);
        }
    }

    let mut intervals = BTreeMap::new();
    for (node, samples) in per_node {
        intervals.insert(node, quantile_interval(&samples, proportion, confidence)?);
    }
    Ok(intervals)
}
