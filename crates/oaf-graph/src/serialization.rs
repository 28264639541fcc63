use oaf_core::errors::{ErrorInfo, OafError};
use oaf_core::provenance::SchemaVersion;
use serde::{Deserialize, Serialize};

use crate::graph::CalibrationGraph;

/// Serializes the graph to a JSON string.
pub fn graph_to_json(graph: &CalibrationGraph) -> Result<String, OafError> {
    let serializable = SerializableGraph::from_graph(graph);
    serde_json::to_string_pretty(&serializable)
        .map_err(|err| OafError::Serde(ErrorInfo::new("serialize-json", err.to_string())))
}

/// Restores a graph from a JSON string.
pub fn graph_from_json(json: &str) -> Result<CalibrationGraph, OafError> {
    let serializable: SerializableGraph = serde_json::from_str(json)
        .map_err(|err| OafError::Serde(ErrorInfo::new("deserialize-json", err.to_string())))?;
    serializable.into_graph()
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializableGraph {
    schema_version: SchemaVersion,
    nodes: Vec<String>,
    edges: Vec<(String, String)>,
}

impl SerializableGraph {
    fn from_graph(graph: &CalibrationGraph) -> Self {
        let nodes = graph.nodes().to_vec();
        let mut edges = Vec::new();
        for node in graph.nodes() {
            for successor in graph.successors(node).unwrap_or(&[]) {
                edges.push((node.clone(), successor.clone()));
            }
        }
        Self {
            schema_version: graph.schema(),
            nodes,
            edges,
        }
    }

    fn into_graph(self) -> Result<CalibrationGraph, OafError> {
        let mut graph = CalibrationGraph::new();
        for node in self.nodes {
            graph.add_node(node)?;
        }
        for (from, to) in self.edges {
            graph.add_edge(&from, &to)?;
        }
        Ok(graph)
    }
}
