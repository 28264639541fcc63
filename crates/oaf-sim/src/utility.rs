//! Structural and experiment-support nodes.

use std::collections::BTreeMap;

use oaf_core::errors::OafError;
use oaf_core::rng::RngHandle;
use rand::Rng;

use crate::func::{ParamSpec, ParamTable};
use crate::node::{require_export, CalibrationNode, Exports, NodeCore};

/// Node whose calibration occasionally jumps its parameter by a large
/// amount, exposing the jump to dependents through its export.
///
/// Its own check proxies the failure state of a designated dependency, so
/// the node fails exactly when that dependency does.
#[derive(Debug, Clone)]
pub struct RandomlyChangeParamNode {
    core: NodeCore,
    params: ParamTable,
    dependence: String,
    jump_probability: f64,
    jump_amount: f64,
}

impl RandomlyChangeParamNode {
    /// Creates the node with its parameter at `initial`.
    pub fn new(
        core: NodeCore,
        dependence: impl Into<String>,
        initial: f64,
        jump_probability: f64,
        jump_amount: f64,
    ) -> Self {
        let mut specs = BTreeMap::new();
        specs.insert(
            "param".to_string(),
            ParamSpec::unbounded(initial, 0.0, 0.5),
        );
        Self {
            core,
            params: ParamTable::new(specs),
            dependence: dependence.into(),
            jump_probability,
            jump_amount,
        }
    }

    fn param(&self) -> f64 {
        // The table is built with exactly one "param" entry.
        self.params.get("param").unwrap_or(0.0)
    }
}

impl CalibrationNode for RandomlyChangeParamNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn simulate_failure(
        &mut self,
        _time: f64,
        exports: &Exports,
        _rng: &mut RngHandle,
    ) -> Result<(), OafError> {
        self.core.failed = require_export(exports, &self.dependence, &self.core.name)?.failed;
        Ok(())
    }

    fn check_data(&mut self, time: f64, exports: &Exports) -> Result<bool, OafError> {
        self.core.note_check(time);
        Ok(require_export(exports, &self.dependence, &self.core.name)?.failed)
    }

    fn calibrate(
        &mut self,
        time: f64,
        _exports: &Exports,
        rng: &mut RngHandle,
    ) -> Result<(), OafError> {
        if rng.gen::<f64>() < self.jump_probability {
            let jumped = self.param() + self.jump_amount;
            self.params.set("param", jumped)?;
        }
        self.core.mark_calibrated(time);
        Ok(())
    }

    fn check_values(&self) -> Vec<f64> {
        vec![self.param()]
    }

    fn export(&self) -> Option<f64> {
        Some(self.param())
    }
}

/// Connector node that always fails its check so diagnosis descends through
/// it, tying same-level nodes together. Calibration leaves it failed.
#[derive(Debug, Clone)]
pub struct VirtualConnectionNode {
    core: NodeCore,
}

impl VirtualConnectionNode {
    /// Creates a virtual connector, permanently failed.
    pub fn new(mut core: NodeCore) -> Self {
        core.failed = true;
        Self { core }
    }
}

impl CalibrationNode for VirtualConnectionNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn simulate_failure(
        &mut self,
        _time: f64,
        _exports: &Exports,
        _rng: &mut RngHandle,
    ) -> Result<(), OafError> {
        Ok(())
    }

    fn calibrate(
        &mut self,
        _time: f64,
        _exports: &Exports,
        _rng: &mut RngHandle,
    ) -> Result<(), OafError> {
        Ok(())
    }
}
