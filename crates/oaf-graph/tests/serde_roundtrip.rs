use oaf_graph::{graph_from_json, graph_to_json, CalibrationGraph};

#[test]
fn graph_json_roundtrip_preserves_structure() {
    let mut graph = CalibrationGraph::new();
    for name in ["readout", "rabi", "gate"] {
        graph.add_node(name).unwrap();
    }
    graph.add_edge("gate", "rabi").unwrap();
    graph.add_edge("rabi", "readout").unwrap();

    let json = graph_to_json(&graph).unwrap();
    let restored = graph_from_json(&json).unwrap();
    assert_eq!(graph, restored);
    assert_eq!(
        restored.transitive_dependencies("gate").unwrap(),
        vec!["readout".to_string(), "rabi".to_string()]
    );
}

#[test]
fn malformed_json_is_a_serde_error() {
    let err = graph_from_json("{not json").unwrap_err();
    assert_eq!(err.info().code, "deserialize-json");
}
