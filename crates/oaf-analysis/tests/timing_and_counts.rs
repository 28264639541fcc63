use oaf_analysis::{
    co_occurring_failures, count_base_failures, count_failures, time_to_failure,
    time_to_failure_base,
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

fn chain() -> CalibrationGraph {
    let mut graph = CalibrationGraph::new();
    for name in ["a", "b", "c"] {
        graph.add_node(name).unwrap();
    }
    graph.add_edge("c", "b").unwrap();
    graph.add_edge("b", "a").unwrap();
    graph
}

fn two_failures_of_a() -> Vec<WaveRecord> {
    vec![
        trigger(5.0, &["c"], &["a", "b", "c"]),
        diagnosis(5.001, "a", &[]),
        diagnosis(5.002, "b", &["a"]),
        diagnosis(5.003, "c", &["b"]),
        trigger(10.0, &["c"], &["a", "b", "c"]),
        diagnosis(10.001, "a", &[]),
        diagnosis(10.002, "b", &["a"]),
        diagnosis(10.003, "c", &["b"]),
    ]
}

#[test]
fn time_to_failure_measures_between_diagnosis_waves() {
    let graph = chain();
    let times = time_to_failure(&two_failures_of_a(), graph.nodes());
    assert_eq!(times["a"].len(), 2);
    // First failure is measured from the first trigger.
    assert!((times["a"][0] - 0.001).abs() < 1e-9);
    assert!((times["a"][1] - 5.0).abs() < 1e-9);
}

#[test]
fn time_to_failure_ignores_records_before_first_trigger() {
    let graph = chain();
    let mut waves = vec![diagnosis(1.001, "a", &[])];
    waves.extend(two_failures_of_a());
    let times = time_to_failure(&waves, graph.nodes());
    assert_eq!(times["a"].len(), 2);
}

#[test]
fn time_to_failure_base_spaces_trigger_groups() {
    let graph = chain();
    let times = time_to_failure_base(&two_failures_of_a(), &graph).unwrap();
    // a was the base cause of both groups; the first interval is zero
    // (measured from the first trigger), the second spans the gap.
    assert_eq!(times["a"].len(), 2);
    assert!((times["a"][0]).abs() < 1e-9);
    assert!((times["a"][1] - 5.0).abs() < 1e-9);
    assert!(times["b"].is_empty());
}

#[test]
fn failure_counts_per_node() {
    let graph = chain();
    let waves = two_failures_of_a();
    let counts = count_failures(&waves, graph.nodes());
    assert_eq!(counts["a"], 2);
    assert_eq!(counts["b"], 2);
    assert_eq!(counts["c"], 2);

    let base_counts = count_base_failures(&waves, &graph).unwrap();
    assert_eq!(base_counts["a"], 2);
    assert_eq!(base_counts["b"], 0);
    assert_eq!(base_counts["c"], 0);
}

#[test]
fn co_occurrence_counts_pairs_per_group() {
    let graph = chain();
    let matrix = co_occurring_failures(&two_failures_of_a(), graph.nodes());
    assert_eq!(matrix[&("a".to_string(), "b".to_string())], 2);
    assert_eq!(matrix[&("a".to_string(), "c".to_string())], 2);
    assert_eq!(matrix[&("b".to_string(), "c".to_string())], 2);
}

#[test]
fn empty_trace_yields_empty_results() {
    let graph = chain();
    let times = time_to_failure(&[], graph.nodes());
    assert!(times.values().all(|v| v.is_empty()));
    let counts = count_base_failures(&[], &graph).unwrap();
    assert!(counts.values().all(|&c| c == 0));
}
