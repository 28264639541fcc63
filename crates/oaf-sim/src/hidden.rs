//! Hidden environmental nodes and the compensating node that tracks one.
//!
//! Hidden nodes model conditions outside the calibration loop, such as a
//! slowly wandering ambient voltage. They drift but never fail a check, so
//! the wave algorithm never calibrates them; their influence reaches the
//! graph only through nodes that consume their export.

use std::collections::BTreeMap;

use oaf_core::errors::{ErrorInfo, OafError};
use oaf_core::rng::RngHandle;

use crate::func::{FuncNode, ParamSpec, ParamTable, Response};
use crate::node::{require_export_value, CalibrationNode, Exports, NodeCore};

/// Drift-only node exposing `floor(param)` to consumers.
#[derive(Debug, Clone)]
pub struct HiddenParamNode {
    core: NodeCore,
    params: ParamTable,
}

impl HiddenParamNode {
    /// Creates a hidden node with one unbounded drifting parameter.
    pub fn new(core: NodeCore, initial: f64, drift_rate: f64, drift_bias: f64) -> Self {
        let mut specs = BTreeMap::new();
        specs.insert(
            "param".to_string(),
            ParamSpec::unbounded(initial, drift_rate, drift_bias),
        );
        Self {
            core,
            params: ParamTable::new(specs),
        }
    }

    fn param(&self) -> f64 {
        // The table is built with exactly one "param" entry.
        self.params.get("param").unwrap_or(0.0)
    }
}

impl CalibrationNode for HiddenParamNode {
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
        rng: &mut RngHandle,
    ) -> Result<(), OafError> {
        self.params.drift(1.0, rng);
        Ok(())
    }

    fn check_data(&mut self, _time: f64, _exports: &Exports) -> Result<bool, OafError> {
        // Hidden nodes never report a failure.
        Ok(false)
    }

    fn check_values(&self) -> Vec<f64> {
        vec![self.param()]
    }

    fn export(&self) -> Option<f64> {
        Some(self.param().floor())
    }
}

/// Exp-decay node whose response shifts with a hidden baseline and whose
/// calibration re-baselines against the current hidden value.
#[derive(Debug, Clone)]
pub struct CompensatingExpDecayNode {
    func: FuncNode,
    baseline_source: String,
    compensation: f64,
}

impl CompensatingExpDecayNode {
    /// Wraps an exp-decay func node around a hidden baseline source.
    pub fn new(func: FuncNode, baseline_source: impl Into<String>) -> Result<Self, OafError> {
        if func.response != Response::ExpDecay {
            return Err(OafError::Node(
                ErrorInfo::new("invalid-response", "compensating node requires exp-decay")
                    .with_context("node", func.core.name.clone()),
            ));
        }
        Ok(Self {
            func,
            baseline_source: baseline_source.into(),
            compensation: 0.0,
        })
    }

    /// Baseline value captured at the last calibration.
    pub fn compensation(&self) -> f64 {
        self.compensation
    }

    fn baseline(&self, exports: &Exports) -> Result<f64, OafError> {
        require_export_value(exports, &self.baseline_source, &self.func.core.name)
    }
}

impl CalibrationNode for CompensatingExpDecayNode {
    fn core(&self) -> &NodeCore {
        &self.func.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.func.core
    }

    fn simulate_failure(
        &mut self,
        time: f64,
        exports: &Exports,
        rng: &mut RngHandle,
    ) -> Result<(), OafError> {
        let coeff = self.func.drift_coeff(time);
        self.func.params.drift(coeff, rng);
        if self.func.options.monitor_in_spec {
            let raw = self.func.response_raw(exports)? + self.baseline(exports)?
                - self.compensation;
            self.func.record_check(1.0 - raw);
        }
        Ok(())
    }

    fn calibrate(
        &mut self,
        time: f64,
        exports: &Exports,
        rng: &mut RngHandle,
    ) -> Result<(), OafError> {
        self.func.recalibrate_params(rng)?;
        self.func.core.mark_calibrated(time);
        self.compensation = self.baseline(exports)?;
        Ok(())
    }

    fn check_values(&self) -> Vec<f64> {
        self.func.check_values()
    }

    fn export(&self) -> Option<f64> {
        self.func.export()
    }
}
