use std::cell::Cell;
use std::rc::Rc;

use graphbind::{
    CycleScope, ElementKind, Graph, GraphSpec, Seq, Trace, VertexSeq, coordinator::strong_edges,
};

/// Host-side container that owns a graph and one of its views strongly.
struct Holder {
    graph: Graph,
    view: VertexSeq,
}

impl Trace for Holder {
    fn trace(&self, visit: &mut dyn FnMut(&dyn Trace)) {
        visit(&self.graph);
        visit(&self.view);
    }

    fn release_cycle_refs(&self) {
        self.view.release_cycle_refs();
        self.graph.release_cycle_refs();
    }
}

fn path_graph() -> Graph {
    Graph::create(&GraphSpec::new(3, vec![(0, 1), (1, 2)], false)).expect("graph")
}

fn release_counter(graph: &Graph) -> Rc<Cell<usize>> {
    let released = Rc::new(Cell::new(0));
    let counter = released.clone();
    graph.on_release(move |_| counter.set(counter.get() + 1));
    released
}

#[test]
fn test_proxies_trace_no_strong_children() {
    let graph = path_graph();
    let vs = graph.vs().unwrap();
    let v = graph.vertex(0).unwrap();
    assert_eq!(strong_edges(&graph, 4), 0);
    assert_eq!(strong_edges(&vs, 4), 0);
    assert_eq!(strong_edges(&v, 4), 0);
}

#[test]
fn test_destroy_then_release_breaks_graph_view_cycle() {
    let graph = path_graph();
    let released = release_counter(&graph);
    let view = graph.vs().unwrap();
    assert!(graph.has_cached_view(ElementKind::Vertex));

    graph.destroy().unwrap();
    assert_eq!(released.get(), 1);

    view.release_cycle_refs();
    graph.release_cycle_refs();

    assert!(view.link().is_cleared());
    assert!(!graph.has_cached_view(ElementKind::Vertex));
    assert_eq!(graph.handle_count(), 1);
    drop(graph);
    assert!(view.count().unwrap_err().is_stale());
    assert_eq!(released.get(), 1);
}

#[test]
fn test_scope_collects_host_cycle_group() {
    let graph = path_graph();
    let released = release_counter(&graph);
    let outside = graph.vs().unwrap();
    let holder = Holder {
        view: graph.vs().unwrap(),
        graph,
    };
    assert_eq!(strong_edges(&holder, 4), 2);

    let mut scope = CycleScope::new();
    scope.adopt(holder);
    let stats = scope.collect();

    assert_eq!(stats.members, 1);
    assert_eq!(stats.strong_edges, 2);
    assert_eq!(released.get(), 1);
    assert!(outside.link().is_cleared());
    assert!(outside.count().unwrap_err().is_stale());
}

#[test]
fn test_scope_drop_runs_collection() {
    let graph = path_graph();
    let released = release_counter(&graph);
    let handle = graph.vertex(2).unwrap();
    {
        let mut scope = CycleScope::new();
        scope.adopt(graph);
        let link = handle.link().rebind().unwrap();
        scope.adopt(Seq::subset(&link, ElementKind::Vertex, &[0]).unwrap());
        assert_eq!(scope.len(), 2);
    }
    assert_eq!(released.get(), 1);
    assert!(handle.value().unwrap_err().is_stale());
}

#[test]
fn test_releasing_live_graph_only_drops_cache() {
    let graph = path_graph();
    let vs = graph.vs().unwrap();
    graph.release_cycle_refs();
    assert!(!graph.has_cached_view(ElementKind::Vertex));
    assert_eq!(vs.count().unwrap(), 3);
    assert!(!vs.same_view(&graph.vs().unwrap()));
}
