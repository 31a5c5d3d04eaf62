//! Unit tests for arbiter-core.

#[test]
fn test_crate_structure() {
    // Smoke test - verifies the public surface fits together
    use crate::{Arbiter, ArbiterConfig, GraphReport, RequestOutcome, WaitForGraph};

    let arbiter = Arbiter::new(ArbiterConfig::default()).unwrap();
    assert_eq!(arbiter.snapshot().total, vec![10, 5, 7]);
    let _outcome = RequestOutcome::granted(None);
    let report = GraphReport {
        graph: WaitForGraph::new(),
        cycles: Vec::new(),
    };
    assert!(!report.is_deadlocked());
}
