#![deny(missing_docs)]

//! Directed acyclic calibration dependency graph for OAF.

mod graph;
mod serialization;

pub use graph::CalibrationGraph;
pub use serialization::{graph_from_json, graph_to_json};
