use oaf_analysis::{
    base_failure_proportions, base_failures_for_group, failure_propagation_depth,
    find_base_failures, mean_failure_chain_length, split_by_trigger,
};
use oaf_core::records::WaveRecord;
use oaf_graph::CalibrationGraph;

fn trigger(wave: f64, roots: &[&str], submitted: &[&str]) -> WaveRecord {
    WaveRecord {
        wave,
        timed_trigger: true,
        root_nodes: roots.iter().map(|s| s.to_string()).collect(),
        submitted_nodes: submitted.iter().map(|s| s.to_string()).collect(),
    }
}

fn diagnosis(wave: f64, root: &str, submitted: &[&str]) -> WaveRecord {
    WaveRecord {
        wave,
        timed_trigger: false,
        root_nodes: vec![root.to_string()],
        submitted_nodes: submitted.iter().map(|s| s.to_string()).collect(),
    }
}

/// Chain where c depends on b depends on a.
fn chain() -> CalibrationGraph {
    let mut graph = CalibrationGraph::new();
    for name in ["a", "b", "c"] {
        graph.add_node(name).unwrap();
    }
    graph.add_edge("c", "b").unwrap();
    graph.add_edge("b", "a").unwrap();
    graph
}

/// One trigger group where the whole chain failed because of a.
fn chain_failure_group(at: f64) -> Vec<WaveRecord> {
    vec![
        trigger(at, &["c"], &["a", "b", "c"]),
        diagnosis(at + 0.001, "a", &[]),
        diagnosis(at + 0.002, "b", &["a"]),
        diagnosis(at + 0.003, "c", &["b"]),
    ]
}

#[test]
fn chain_failure_attributes_to_deepest_node() {
    let graph = chain();
    let group = chain_failure_group(5.0);
    let attribution = base_failures_for_group(&group, &graph).unwrap();
    assert_eq!(attribution.len(), 1);
    assert_eq!(attribution["c"], vec!["a".to_string()]);
}

#[test]
fn intermediate_failure_attributes_to_itself() {
    let graph = chain();
    // Only b and c failed; a stayed in spec.
    let group = vec![
        trigger(5.0, &["c"], &["a", "b", "c"]),
        diagnosis(5.001, "b", &["a"]),
        diagnosis(5.002, "c", &["b"]),
    ];
    let attribution = base_failures_for_group(&group, &graph).unwrap();
    assert_eq!(attribution["c"], vec!["b".to_string()]);
}

#[test]
fn aggregated_stats_count_repeated_causes() {
    let graph = chain();
    let mut waves = chain_failure_group(5.0);
    waves.extend(chain_failure_group(10.0));
    let stats = find_base_failures(&waves, &graph).unwrap();
    assert_eq!(stats["c"]["a"], 2);

    let proportions = base_failure_proportions(&stats);
    assert!((proportions["c"]["a"] - 1.0).abs() < 1e-12);
}

#[test]
fn chain_length_and_depth_follow_dependency_paths() {
    let graph = chain();
    let waves = chain_failure_group(5.0);
    let stats = find_base_failures(&waves, &graph).unwrap();

    let lengths = mean_failure_chain_length(&stats, &graph).unwrap();
    assert!((lengths["a"] - 2.0).abs() < 1e-12);
    assert_eq!(lengths["b"], 0.0);

    let depths = failure_propagation_depth(&stats, &graph).unwrap();
    assert!((depths["a"].depth - 2.0).abs() < 1e-12);
    assert_eq!(depths["a"].failures, 1);
    assert_eq!(depths["b"].depth, -1.0);
    assert_eq!(depths["b"].failures, 0);
}

#[test]
fn propagation_depth_counts_each_downstream_node_once() {
    let graph = chain();
    // a took the whole chain down twice, and b alone a third time.
    let mut waves = chain_failure_group(5.0);
    waves.extend(chain_failure_group(10.0));
    waves.extend(vec![
        trigger(15.0, &["c"], &["a", "b", "c"]),
        diagnosis(15.001, "a", &[]),
        diagnosis(15.002, "b", &["a"]),
    ]);
    let stats = find_base_failures(&waves, &graph).unwrap();
    assert_eq!(stats["c"]["a"], 2);
    assert_eq!(stats["b"]["a"], 1);

    // Depths average over the pairs (c, a) and (b, a), not over the three
    // attributed failures: (2 + 1) / 2.
    let depths = failure_propagation_depth(&stats, &graph).unwrap();
    assert!((depths["a"].depth - 1.5).abs() < 1e-12);
    assert_eq!(depths["a"].failures, 2);
}

#[test]
fn diamond_failure_can_have_two_base_causes() {
    // c -> b -> a, e -> d -> a; b and d both failed independently, a in spec.
    let mut graph = CalibrationGraph::new();
    for name in ["a", "b", "c", "d", "e"] {
        graph.add_node(name).unwrap();
    }
    graph.add_edge("c", "b").unwrap();
    graph.add_edge("b", "a").unwrap();
    graph.add_edge("e", "d").unwrap();
    graph.add_edge("d", "a").unwrap();

    let group = vec![
        trigger(3.0, &["c", "e"], &["a", "b", "c", "d", "e"]),
        diagnosis(3.001, "b", &["a"]),
        diagnosis(3.002, "c", &["b"]),
        diagnosis(3.003, "d", &["a"]),
        diagnosis(3.004, "e", &["d"]),
    ];
    let attribution = base_failures_for_group(&group, &graph).unwrap();
    assert_eq!(attribution["c"], vec!["b".to_string()]);
    assert_eq!(attribution["e"], vec!["d".to_string()]);
}

#[test]
fn split_drops_leading_diagnosis_records() {
    let waves = vec![
        diagnosis(1.001, "a", &[]),
        trigger(2.0, &["c"], &["a", "b", "c"]),
        diagnosis(2.001, "a", &[]),
        trigger(4.0, &["c"], &["a", "b", "c"]),
    ];
    let groups = split_by_trigger(&waves);
    assert_eq!(groups.len(), 2);
    assert!(groups[0][0].timed_trigger);
    assert_eq!(groups[0].len(), 2);
    assert_eq!(groups[1].len(), 1);
}
