use std::collections::HashSet;

use graphbind::{ElementData, ElementKind, Graph, GraphConfig, GraphError, GraphSpec, NeighborMode};
use serde_json::json;

fn path_graph() -> Graph {
    Graph::create(
        &GraphSpec::new(3, vec![(0, 1), (1, 2)], false)
            .with_vertex_attribute("name", vec![json!("a"), json!("b"), json!("c")]),
    )
    .expect("graph")
}

#[test]
fn test_vertex_value_reads_adjacency_and_attributes() {
    let graph = path_graph();
    let v = graph.vertex(1).expect("vertex");
    match v.value().expect("value") {
        ElementData::Vertex(data) => {
            assert_eq!(data.index, 1);
            assert_eq!(data.degree, 2);
            assert_eq!(data.neighbors, vec![0, 2]);
            assert_eq!(data.attributes.get("name"), Some(&json!("b")));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_edge_value_reads_endpoints() {
    let graph = path_graph();
    let e = graph.edge(1).expect("edge");
    assert_eq!(e.tuple().unwrap(), (1, 2));
    match e.value().unwrap() {
        ElementData::Edge(data) => assert_eq!((data.source, data.target), (1, 2)),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_kind_specific_operations_are_rejected() {
    let graph = path_graph();
    let e = graph.edge(0).unwrap();
    let err = e.neighbors(NeighborMode::All).expect_err("edges have no neighbors");
    assert!(matches!(err, GraphError::InvalidOperation(_)));
    let v = graph.vertex(0).unwrap();
    assert!(matches!(v.tuple(), Err(GraphError::InvalidOperation(_))));
}

#[test]
fn test_out_of_range_handle_creation() {
    let graph = path_graph();
    assert!(graph.vertex(3).unwrap_err().is_out_of_range());
    assert!(graph.edge(2).unwrap_err().is_out_of_range());
}

#[test]
fn test_removed_vertex_handle_is_out_of_range() {
    let graph = path_graph();
    let removed = graph.vertex(1).unwrap();
    let survivor = graph.vertex(2).unwrap();
    let edge = graph.edge(1).unwrap();

    graph.delete_vertices(&[1]).unwrap();

    let err = removed.value().expect_err("removed");
    assert!(matches!(err, GraphError::IndexOutOfRange(_)));
    assert_eq!(survivor.current_index().unwrap(), 1);
    assert_eq!(survivor.attribute("name").unwrap(), Some(json!("c")));
    assert!(edge.value().unwrap_err().is_out_of_range());
}

#[test]
fn test_handle_follows_permutation() {
    let graph = path_graph();
    let v = graph.vertex(0).unwrap();
    graph.permute_vertices(&[2, 0, 1]).unwrap();
    assert_eq!(v.current_index().unwrap(), 2);
    assert_eq!(v.attribute("name").unwrap(), Some(json!("a")));
    assert_eq!(v.index(), 0);
}

#[test]
fn test_additions_do_not_move_handles() {
    let graph = path_graph();
    let v = graph.vertex(2).unwrap();
    graph.add_vertices(3).unwrap();
    graph.add_edges(&[(2, 4)]).unwrap();
    assert_eq!(v.current_index().unwrap(), 2);
    assert_eq!(v.degree(NeighborMode::All).unwrap(), 2);
}

#[test]
fn test_handle_after_destroy_is_stale() {
    let graph = path_graph();
    let v = graph.vertex(0).unwrap();
    graph.destroy().unwrap();
    assert!(v.value().unwrap_err().is_stale());
    assert!(v.set_attribute("x", json!(1)).unwrap_err().is_stale());
}

#[test]
fn test_set_attribute_goes_through_mutation() {
    let graph = path_graph();
    let v = graph.vertex(0).unwrap();
    let before = graph.generation();
    let after = v.set_attribute("weight", json!(5)).unwrap();
    assert!(after > before);
    assert_eq!(v.attribute("weight").unwrap(), Some(json!(5)));
    assert_eq!(graph.vertex(1).unwrap().attribute("weight").unwrap(), Some(json!(null)));
}

#[test]
fn test_equality_uses_resource_identity() {
    let a = path_graph();
    let b = path_graph();
    assert_eq!(a.vertex(1).unwrap(), a.vertex(1).unwrap());
    assert_ne!(a.vertex(1).unwrap(), a.vertex(2).unwrap());
    assert_ne!(a.vertex(1).unwrap(), b.vertex(1).unwrap());
    assert_ne!(a.vertex(0).unwrap(), a.edge(0).unwrap());

    let set: HashSet<_> = [a.vertex(0).unwrap(), a.vertex(0).unwrap(), a.vertex(1).unwrap()]
        .into_iter()
        .collect();
    assert_eq!(set.len(), 2);
}

#[test]
fn test_equality_tracks_reindexed_elements() {
    let graph = path_graph();
    let old = graph.vertex(2).unwrap();
    graph.delete_vertices(&[0]).unwrap();
    let fresh = graph.vertex(1).unwrap();
    assert_eq!(old, fresh);
    assert_eq!(old.kind(), ElementKind::Vertex);
}

#[test]
fn test_removed_handle_differs_from_new_occupant() {
    let graph = path_graph();
    let removed = graph.vertex(1).unwrap();
    graph.delete_vertices(&[1]).unwrap();
    let occupant = graph.vertex(1).unwrap();

    assert!(removed.value().unwrap_err().is_out_of_range());
    assert_ne!(removed, occupant);
    assert_ne!(occupant, removed);
    assert_eq!(removed, removed.clone());
}

#[test]
fn test_destroy_does_not_merge_distinct_handles() {
    let graph = path_graph();
    let first = graph.vertex(1).unwrap();
    graph.delete_vertices(&[0]).unwrap();
    let second = graph.vertex(1).unwrap();
    assert_ne!(first, second);

    graph.destroy().unwrap();
    assert_ne!(first, second);
    assert_eq!(first, first.clone());
    assert_eq!(second, second.clone());
}

#[test]
fn test_handles_from_different_generations_compare_by_element() {
    let graph = path_graph();
    let early = graph.vertex(2).unwrap();
    graph.add_vertices(1).unwrap();
    let late = graph.vertex(2).unwrap();
    assert_ne!(early.captured_generation(), late.captured_generation());
    assert_eq!(early, late);

    graph.permute_vertices(&[1, 2, 0, 3]).unwrap();
    assert_eq!(early, late);
    assert_eq!(early, graph.vertex(0).unwrap());
}

#[test]
fn test_handles_older_than_history_are_stale() {
    let spec = GraphSpec::new(6, vec![(0, 1), (1, 2), (2, 3), (3, 4), (4, 5)], false);
    let graph = Graph::create_with_config(&spec, GraphConfig::default().with_reindex_history(2))
        .expect("graph");
    let old = graph.vertex(5).unwrap();
    graph.delete_vertices(&[0]).unwrap();
    let recent = graph.vertex(4).unwrap();
    graph.delete_vertices(&[0]).unwrap();
    graph.delete_vertices(&[0]).unwrap();

    let err = old.value().expect_err("history evicted");
    assert!(matches!(err, GraphError::StaleReference(_)));
    assert_eq!(recent.current_index().unwrap(), 2);
    assert_ne!(old, recent);
    assert_eq!(graph.vertex(2).unwrap(), recent);
}
