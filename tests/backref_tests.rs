use graphbind::{BackRef, Generation, Graph, GraphError, GraphSpec};

fn triangle() -> Graph {
    Graph::create(&GraphSpec::new(3, vec![(0, 1), (1, 2), (2, 0)], false)).expect("graph")
}

#[test]
fn test_bind_captures_current_generation() {
    let graph = triangle();
    graph.add_vertices(1).unwrap();
    let link = BackRef::bind(&graph);
    assert_eq!(link.generation(), graph.generation());
    assert_eq!(link.resource_id(), graph.id());
    let resolved = link.resolve_exact().expect("fresh link");
    assert!(resolved.is_current());
    assert_eq!(resolved.state().unwrap().bounds().vertices, 4);
}

#[test]
fn test_resolve_after_mutation_reports_updated_generation() {
    let graph = triangle();
    let link = graph.back_ref();
    let new_generation = graph.delete_edges(&[0]).unwrap();

    let resolved = link.resolve().expect("still alive");
    assert_eq!(resolved.captured(), Generation::FIRST);
    assert_eq!(resolved.generation(), new_generation);
    assert!(!resolved.is_current());
}

#[test]
fn test_resolve_exact_rejects_mutated_resource() {
    let graph = triangle();
    let link = graph.back_ref();
    graph.add_edges(&[(0, 2)]).unwrap();
    let err = link.resolve_exact().expect_err("mutated since bind");
    assert!(matches!(err, GraphError::StaleReference(_)));

    let fresh = link.rebind().expect("rebind");
    assert_eq!(fresh.generation(), graph.generation());
    assert!(fresh.resolve_exact().is_ok());
}

#[test]
fn test_resolve_after_destroy_is_stale() {
    let graph = triangle();
    let link = graph.back_ref();
    graph.destroy().unwrap();
    let err = link.resolve().expect_err("destroyed");
    assert!(err.is_stale());
    assert!(link.rebind().unwrap_err().is_stale());
}

#[test]
fn test_resolve_after_drop_is_stale() {
    let graph = triangle();
    let link = graph.back_ref();
    drop(graph);
    let err = link.resolve().expect_err("dropped");
    assert!(err.is_stale());
}

#[test]
fn test_back_ref_does_not_keep_resource_alive() {
    let graph = triangle();
    let links: Vec<BackRef> = (0..4).map(|_| graph.back_ref()).collect();
    assert_eq!(graph.handle_count(), 1);
    assert_eq!(graph.weak_link_count(), 4);
    drop(links);
    assert_eq!(graph.weak_link_count(), 0);
}

#[test]
fn test_resolve_guard_holds_cell_but_not_native_state() {
    let graph = triangle();
    let link = graph.back_ref();
    let resolved = link.resolve().unwrap();
    assert_eq!(graph.handle_count(), 2);
    drop(resolved);
    graph.destroy().unwrap();
    assert!(link.resolve().unwrap_err().is_stale());
}

#[test]
fn test_clear_fails_fast() {
    let graph = triangle();
    let link = graph.back_ref();
    link.clear();
    assert!(link.is_cleared());
    let err = link.resolve().expect_err("cleared");
    assert!(err.to_string().contains("cleared"));
    assert!(graph.back_ref().resolve().is_ok());
}

#[test]
fn test_links_from_different_resources_never_match() {
    let a = triangle();
    let b = triangle();
    let la = a.back_ref();
    let lb = b.back_ref();
    assert_eq!(la.generation(), lb.generation());
    assert_ne!(la.resource_id(), lb.resource_id());
    assert_ne!(
        la.resolve().unwrap().resource_id(),
        lb.resolve().unwrap().resource_id()
    );
}
