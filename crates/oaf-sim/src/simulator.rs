//! Discrete-time simulator driving the Optimus wave algorithm over a
//! calibration graph.
//!
//! Each step the simulator records ground truth, fires a timed trigger wave
//! for nodes whose timeout elapsed, walks the submitted nodes with the wave
//! check (skipping nodes `check_state` believes in spec, diagnosing and
//! recalibrating failed ones), then advances every node's failure model.
//! Wave stamps are the trigger time plus a per-check offset of
//! [`WAVE_OFFSET_STEP`], so sorting records by stamp reconstructs causality.

use std::collections::BTreeMap;

use oaf_core::errors::{ErrorInfo, OafError};
use oaf_core::records::{
    CheckKind, CheckRecord, GroundTruthSample, WaveRecord, WAVE_OFFSET_STEP,
};
use oaf_core::rng::RngHandle;
use oaf_graph::CalibrationGraph;
use serde::{Deserialize, Serialize};

use crate::node::{CalibrationNode, ExportedState, Exports, NodeCore};

/// Boxed node model keyed by name.
pub type NodeMap = BTreeMap<String, Box<dyn CalibrationNode>>;

/// Complete record streams produced by one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunTrace {
    /// Trigger and diagnosis waves, in emission order.
    pub waves: Vec<WaveRecord>,
    /// Data check results, in emission order.
    pub checks: Vec<CheckRecord>,
    /// Per-step in-spec truth for every node.
    pub ground_truth: Vec<GroundTruthSample>,
}

/// Simulator state for one run.
pub struct CalibrationSimulator {
    graph: CalibrationGraph,
    nodes: NodeMap,
    root_nodes: Vec<String>,
    time_step: u32,
    current_time: f64,
    wave_offset: u32,
    rng: RngHandle,
    waves: Vec<WaveRecord>,
    checks: Vec<CheckRecord>,
    ground_truth: Vec<GroundTruthSample>,
}

impl CalibrationSimulator {
    /// Creates a simulator over `graph` with one model per graph node.
    pub fn new(
        graph: CalibrationGraph,
        nodes: NodeMap,
        root_nodes: Vec<String>,
        time_step: u32,
        rng: RngHandle,
    ) -> Result<Self, OafError> {
        if time_step == 0 {
            return Err(OafError::Sim(ErrorInfo::new(
                "invalid-time-step",
                "time step must be at least 1",
            )));
        }
        for name in graph.nodes() {
            if !nodes.contains_key(name) {
                return Err(OafError::Sim(
                    ErrorInfo::new("node-set-mismatch", "graph node has no model")
                        .with_context("node", name),
                ));
            }
        }
        for name in nodes.keys() {
            if !graph.contains(name) {
                return Err(OafError::Sim(
                    ErrorInfo::new("node-set-mismatch", "model node absent from graph")
                        .with_context("node", name),
                ));
            }
        }
        for root in &root_nodes {
            if !graph.contains(root) {
                return Err(OafError::Sim(
                    ErrorInfo::new("unknown-root", "root node absent from graph")
                        .with_context("node", root),
                ));
            }
        }
        Ok(Self {
            graph,
            nodes,
            root_nodes,
            time_step,
            current_time: 0.0,
            wave_offset: 0,
            rng,
            waves: Vec::new(),
            checks: Vec::new(),
            ground_truth: Vec::new(),
        })
    }

    /// Runs the simulation until `total_time_steps` units have elapsed.
    pub fn simulate(&mut self, total_time_steps: u32) -> Result<(), OafError> {
        while self.current_time < f64::from(total_time_steps) {
            self.step()?;
        }
        Ok(())
    }

    fn step(&mut self) -> Result<(), OafError> {
        self.record_ground_truth();

        let mut timed_out = Vec::new();
        for name in self.graph.nodes() {
            let core = self.node_core(name)?;
            if self.current_time - core.last_check >= core.timeout {
                timed_out.push(name.clone());
            }
        }

        let mut submitted: Vec<String> = Vec::new();
        if !timed_out.is_empty() {
            for name in &timed_out {
                for dep in self.graph.transitive_dependencies(name)? {
                    if !submitted.contains(&dep) {
                        submitted.push(dep);
                    }
                }
                if !submitted.contains(name) {
                    submitted.push(name.clone());
                }
            }
            self.waves.push(WaveRecord {
                wave: self.current_time,
                timed_trigger: true,
                root_nodes: self.root_nodes.clone(),
                submitted_nodes: submitted.clone(),
            });
        }

        self.wave_offset = 0;
        for name in &submitted {
            self.check_node(name, false)?;
        }

        self.advance()?;
        Ok(())
    }

    fn record_ground_truth(&mut self) {
        let mut in_spec = BTreeMap::new();
        for (name, node) in &self.nodes {
            in_spec.insert(name.clone(), !node.core().failed);
        }
        self.ground_truth.push(GroundTruthSample {
            time: self.current_time,
            in_spec,
        });
    }

    /// Whether the wave algorithm may assume the node is in spec: its
    /// timeout has not elapsed and no dependency was recalibrated since it
    /// was last calibrated or checked.
    fn check_state(&self, name: &str) -> Result<bool, OafError> {
        let core = self.node_core(name)?;
        let max_check_time = core.last_calibration.max(core.last_check);
        if self.current_time - max_check_time >= core.timeout {
            return Ok(false);
        }
        for dep in self.graph.successors(name)? {
            if self.node_core(dep)?.last_calibration > max_check_time {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Runs the wave check on one node; `diagnosis` waves bypass
    /// `check_state`.
    fn check_node(&mut self, name: &str, diagnosis: bool) -> Result<(), OafError> {
        self.wave_offset += 1;
        let offset = self.wave_offset;
        let time = self.current_time;

        if !diagnosis && self.check_state(name)? {
            return Ok(());
        }

        let exports = self.snapshot_exports();
        let values = self.node(name)?.check_values();
        let own_failed = {
            let node = self.node_mut(name)?;
            node.core_mut().last_check = time;
            node.check_data(time, &exports)?
        };
        let failed = own_failed || self.any_dependency_failed(name)?;
        let stamp = time + f64::from(offset) * WAVE_OFFSET_STEP;

        if !failed {
            let failure_magnitude = self.node_core(name)?.failure_magnitude;
            self.checks.push(CheckRecord {
                wave: stamp,
                node: name.to_string(),
                check_kind: CheckKind::CheckData,
                failure_magnitude,
                values,
            });
            return Ok(());
        }

        // Diagnosis wave: walk direct dependencies before recalibrating.
        let successors: Vec<String> = self.graph.successors(name)?.to_vec();
        for dep in &successors {
            self.check_node(dep, true)?;
        }

        // Magnitude is captured before calibration clears it.
        let failure_magnitude = self.node_core(name)?.failure_magnitude;
        let exports = self.snapshot_exports();
        {
            let node = self.nodes.get_mut(name).ok_or_else(|| unknown_node(name))?;
            node.calibrate(time, &exports, &mut self.rng)?;
        }

        self.waves.push(WaveRecord {
            wave: stamp,
            timed_trigger: false,
            root_nodes: vec![name.to_string()],
            submitted_nodes: successors,
        });
        self.checks.push(CheckRecord {
            wave: stamp,
            node: name.to_string(),
            check_kind: CheckKind::CheckData,
            failure_magnitude,
            values,
        });
        Ok(())
    }

    fn any_dependency_failed(&self, name: &str) -> Result<bool, OafError> {
        for dep in self.graph.transitive_dependencies(name)? {
            if self.node_core(&dep)?.failed {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn advance(&mut self) -> Result<(), OafError> {
        for _ in 0..self.time_step {
            let order: Vec<String> = self.graph.nodes().to_vec();
            for name in &order {
                let exports = self.snapshot_exports();
                let time = self.current_time;
                let node = self.nodes.get_mut(name).ok_or_else(|| unknown_node(name))?;
                node.simulate_failure(time, &exports, &mut self.rng)?;
            }
        }
        self.current_time += f64::from(self.time_step);
        Ok(())
    }

    fn snapshot_exports(&self) -> Exports {
        self.nodes
            .iter()
            .map(|(name, node)| {
                (
                    name.clone(),
                    ExportedState {
                        value: node.export(),
                        failed: node.core().failed,
                    },
                )
            })
            .collect()
    }

    fn node(&self, name: &str) -> Result<&dyn CalibrationNode, OafError> {
        self.nodes
            .get(name)
            .map(|node| node.as_ref())
            .ok_or_else(|| unknown_node(name))
    }

    fn node_mut(&mut self, name: &str) -> Result<&mut Box<dyn CalibrationNode>, OafError> {
        self.nodes.get_mut(name).ok_or_else(|| unknown_node(name))
    }

    fn node_core(&self, name: &str) -> Result<&NodeCore, OafError> {
        Ok(self.node(name)?.core())
    }

    /// The dependency graph driving the waves.
    pub fn graph(&self) -> &CalibrationGraph {
        &self.graph
    }

    /// Current simulation time.
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Wave records emitted so far.
    pub fn waves(&self) -> &[WaveRecord] {
        &self.waves
    }

    /// Check records emitted so far.
    pub fn checks(&self) -> &[CheckRecord] {
        &self.checks
    }

    /// Ground truth samples recorded so far.
    pub fn ground_truth(&self) -> &[GroundTruthSample] {
        &self.ground_truth
    }

    /// Read access to a node model's shared state.
    pub fn node_state(&self, name: &str) -> Result<&NodeCore, OafError> {
        self.node_core(name)
    }

    /// Consumes the simulator, yielding the recorded trace.
    pub fn into_trace(self) -> RunTrace {
        RunTrace {
            waves: self.waves,
            checks: self.checks,
            ground_truth: self.ground_truth,
        }
    }
}

fn unknown_node(name: &str) -> OafError {
    OafError::Sim(
        ErrorInfo::new("unknown-node", "no model registered for node").with_context("node", name),
    )
}
