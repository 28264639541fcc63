//! Trace record types emitted by the calibration simulator.
//!
//! A run produces three streams: wave records (one per trigger or diagnosis
//! wave), check records (one per `check_data` evaluation), and ground truth
//! samples (per-step in-spec state of every node, independent of checks).
//! Diagnosis waves are stamped with a small fractional offset from their
//! trigger time so that sorting by wave value reconstructs causal order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Spacing between consecutive wave stamps issued within one time step.
pub const WAVE_OFFSET_STEP: f64 = 0.001;

/// Severity of a detected failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum FailureMagnitude {
    /// Node is in spec.
    None,
    /// Failure close to the acceptance threshold.
    Minor,
    /// Failure far outside the acceptance threshold.
    Major,
}

impl FailureMagnitude {
    /// Returns true for any failing magnitude.
    pub fn is_failure(&self) -> bool {
        !matches!(self, FailureMagnitude::None)
    }
}

impl From<FailureMagnitude> for u8 {
    fn from(value: FailureMagnitude) -> Self {
        match value {
            FailureMagnitude::None => 0,
            FailureMagnitude::Minor => 1,
            FailureMagnitude::Major => 2,
        }
    }
}

impl TryFrom<u8> for FailureMagnitude {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FailureMagnitude::None),
            1 => Ok(FailureMagnitude::Minor),
            2 => Ok(FailureMagnitude::Major),
            other => Err(format!("invalid failure magnitude: {other}")),
        }
    }
}

/// Kind of check performed on a node during a wave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    /// Full data check issued by the wave algorithm.
    CheckData,
}

/// One trigger or diagnosis wave recorded by the simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveRecord {
    /// Wave stamp: trigger time plus diagnosis offset.
    pub wave: f64,
    /// True for timed trigger waves, false for diagnosis waves.
    pub timed_trigger: bool,
    /// Root nodes of the wave. A diagnosis wave has exactly one root: the
    /// node whose check failed.
    pub root_nodes: Vec<String>,
    /// Nodes submitted for checking by this wave, in submission order.
    pub submitted_nodes: Vec<String>,
}

/// Result of a single `check_data` evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRecord {
    /// Wave stamp at which the check ran.
    pub wave: f64,
    /// Name of the checked node.
    pub node: String,
    /// Kind of check performed.
    pub check_kind: CheckKind,
    /// Failure magnitude observed before any recalibration.
    pub failure_magnitude: FailureMagnitude,
    /// Raw data values produced by the check, when the model exposes them.
    #[serde(default)]
    pub values: Vec<f64>,
}

/// Per-step in-spec state of every node, recorded before checks run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundTruthSample {
    /// Simulation time of the sample.
    pub time: f64,
    /// Map from node name to whether the node was in spec.
    pub in_spec: BTreeMap<String, bool>,
}

/// Sorts wave records in place by wave stamp.
pub fn sort_waves(waves: &mut [WaveRecord]) {
    waves.sort_by(|a, b| a.wave.total_cmp(&b.wave));
}

/// Sorts check records in place by wave stamp.
pub fn sort_checks(checks: &mut [CheckRecord]) {
    checks.sort_by(|a, b| a.wave.total_cmp(&b.wave));
}
