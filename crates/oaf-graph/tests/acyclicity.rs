use oaf_core::errors::OafError;
use oaf_graph::CalibrationGraph;

fn chain() -> CalibrationGraph {
    let mut graph = CalibrationGraph::new();
    for name in ["a", "b", "c"] {
        graph.add_node(name).unwrap();
    }
    graph.add_edge("c", "b").unwrap();
    graph.add_edge("b", "a").unwrap();
    graph
}

#[test]
fn closing_edge_is_rejected() {
    let mut graph = chain();
    let err = graph.add_edge("a", "c").unwrap_err();
    assert!(matches!(err, OafError::Graph(info) if info.code == "would-create-cycle"));
}

#[test]
fn self_loop_is_rejected() {
    let mut graph = chain();
    let err = graph.add_edge("b", "b").unwrap_err();
    assert!(matches!(err, OafError::Graph(info) if info.code == "self-loop"));
}

#[test]
fn duplicate_edge_is_rejected() {
    let mut graph = chain();
    let err = graph.add_edge("c", "b").unwrap_err();
    assert!(matches!(err, OafError::Graph(info) if info.code == "duplicate-edge"));
}

#[test]
fn unknown_endpoint_is_rejected() {
    let mut graph = chain();
    let err = graph.add_edge("c", "zz").unwrap_err();
    assert!(matches!(err, OafError::Graph(info) if info.code == "unknown-node"));
}
