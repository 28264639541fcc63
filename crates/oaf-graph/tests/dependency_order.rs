use oaf_graph::CalibrationGraph;

/// Diamond used by the original five-node scenario:
/// c -> b -> a and e -> d -> a.
fn diamond() -> CalibrationGraph {
    let mut graph = CalibrationGraph::new();
    for name in ["a", "b", "c", "d", "e"] {
        graph.add_node(name).unwrap();
    }
    graph.add_edge("c", "b").unwrap();
    graph.add_edge("b", "a").unwrap();
    graph.add_edge("e", "d").unwrap();
    graph.add_edge("d", "a").unwrap();
    graph
}

#[test]
fn postorder_visits_dependencies_first() {
    let graph = diamond();
    let deps = graph.transitive_dependencies("c").unwrap();
    assert_eq!(deps, vec!["a".to_string(), "b".to_string()]);

    let deps = graph.transitive_dependencies("e").unwrap();
    assert_eq!(deps, vec!["a".to_string(), "d".to_string()]);
}

#[test]
fn postorder_is_duplicate_free_on_shared_dependencies() {
    let mut graph = diamond();
    // f depends on both branches, sharing the deep node a.
    graph.add_node("f").unwrap();
    graph.add_edge("f", "b").unwrap();
    graph.add_edge("f", "d").unwrap();

    let deps = graph.transitive_dependencies("f").unwrap();
    assert_eq!(
        deps,
        vec!["a".to_string(), "b".to_string(), "d".to_string()]
    );
}

#[test]
fn path_lengths_follow_dependency_edges() {
    let graph = diamond();
    let lengths = graph.shortest_path_lengths("c").unwrap();
    assert_eq!(lengths["c"], 0);
    assert_eq!(lengths["b"], 1);
    assert_eq!(lengths["a"], 2);
    assert!(!lengths.contains_key("e"));
}

#[test]
fn predecessors_are_dependents() {
    let graph = diamond();
    let mut dependents = graph.predecessors("a").unwrap().to_vec();
    dependents.sort();
    assert_eq!(dependents, vec!["b".to_string(), "d".to_string()]);
}
