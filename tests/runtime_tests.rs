use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use graphbind::{Graph, GraphError, GraphSpec, RuntimeConfig, runtime};

// The runtime is process-wide and may be initialized once, so the whole
// lifecycle is exercised by a single test.
#[test]
fn test_runtime_lifecycle_and_fault_hook() {
    assert!(!runtime::is_initialized());
    let faults = Arc::new(AtomicUsize::new(0));
    let seen = faults.clone();
    runtime::init(RuntimeConfig::with_fault_hook(move |err| {
        assert!(matches!(err, GraphError::Internal(_)));
        seen.fetch_add(1, Ordering::SeqCst);
    }))
    .expect("first init");
    assert!(runtime::is_initialized());

    let err = runtime::init(RuntimeConfig::default()).expect_err("second init");
    assert!(matches!(err, GraphError::InvalidOperation(_)));

    let graph = Graph::create(&GraphSpec::new(2, vec![(0, 1)], false)).expect("graph");
    let link = graph.back_ref();
    let resolved = link.resolve().expect("resolve");
    let state = resolved.state().expect("state");
    let err = graph.add_vertices(1).expect_err("borrowed");
    assert!(matches!(err, GraphError::Internal(_)));
    let err = graph.destroy().expect_err("borrowed");
    assert!(matches!(err, GraphError::Internal(_)));
    assert_eq!(state.bounds().vertices, 2);
    drop(state);
    drop(resolved);
    assert_eq!(faults.load(Ordering::SeqCst), 2);

    let before = runtime::stats();
    assert!(before.created >= 1);
    graph.destroy().expect("destroy");
    let after = runtime::stats();
    assert!(after.released > before.released);
    assert!(after.live() <= before.live());

    runtime::shutdown().expect("shutdown");
    assert!(!runtime::is_initialized());
    assert!(runtime::shutdown().is_err());
    let err = runtime::init(RuntimeConfig::default()).expect_err("no re-init");
    assert!(matches!(err, GraphError::InvalidOperation(_)));
}
