use oaf_core::errors::{ErrorInfo, OafError};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("node", "rabi")
        .with_context("reason", "example")
}

#[test]
fn graph_error_surface() {
    let err = OafError::Graph(sample_info("would-create-cycle", "cycle detected"));
    assert_eq!(err.info().code, "would-create-cycle");
    assert!(err.info().context.contains_key("node"));
}

#[test]
fn node_error_surface() {
    let err = OafError::Node(sample_info("bad-percentiles", "p95 must exceed p5"));
    assert_eq!(err.info().code, "bad-percentiles");
    assert!(err.info().context.contains_key("reason"));
}

#[test]
fn sim_error_surface() {
    let err = OafError::Sim(sample_info("node-set-mismatch", "graph and node map differ"));
    assert_eq!(err.info().code, "node-set-mismatch");
}

#[test]
fn stats_error_surface() {
    let err = OafError::Stats(sample_info("bad-proportion", "proportion out of range"));
    assert_eq!(err.info().code, "bad-proportion");
}

#[test]
fn error_display_includes_code_and_hint() {
    let err = OafError::Serde(
        ErrorInfo::new("manifest-parse", "unexpected token").with_hint("re-run simulate"),
    );
    let rendered = err.to_string();
    assert!(rendered.contains("manifest-parse"));
    assert!(rendered.contains("re-run simulate"));
}
