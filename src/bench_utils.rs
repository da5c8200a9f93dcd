use rand::{Rng, SeedableRng, rngs::StdRng};
use serde_json::json;

use crate::graph::{Bounds, ElementKind, GraphSpec, Mutation};

#[derive(Clone, Debug)]
pub enum GraphShape {
    Line,
    Star,
    RandomErdosRenyi { edges: usize },
}

pub fn generate_spec(shape: GraphShape, vertex_count: usize, seed: u64) -> GraphSpec {
    assert!(vertex_count > 1, "vertex_count must exceed 1");
    let edges = match shape {
        GraphShape::Line => (0..vertex_count - 1).map(|v| (v, v + 1)).collect(),
        GraphShape::Star => (1..vertex_count).map(|leaf| (0, leaf)).collect(),
        GraphShape::RandomErdosRenyi { edges } => random_edges(vertex_count, edges, seed),
    };
    let labels = (0..vertex_count).map(|idx| json!(idx)).collect();
    GraphSpec::new(
        vertex_count as i64,
        edges
            .into_iter()
            .map(|(from, to)| (from as i64, to as i64))
            .collect(),
        false,
    )
    .with_vertex_attribute("idx", labels)
}

fn random_edges(vertex_count: usize, edges: usize, seed: u64) -> Vec<(usize, usize)> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..edges)
        .map(|_| {
            let from = rng.gen_range(0..vertex_count);
            let mut to = rng.gen_range(0..vertex_count);
            if to == from {
                to = (to + 1) % vertex_count;
            }
            (from, to)
        })
        .collect()
}

/// Draws a mutation against `bounds`. Roughly one in five requests references
/// an element past the bounds and is expected to be rejected.
pub fn random_mutation(rng: &mut StdRng, bounds: Bounds) -> Mutation {
    let invalid = rng.gen_ratio(1, 5);
    match rng.gen_range(0..5) {
        0 => Mutation::AddVertices(rng.gen_range(0..3)),
        1 => {
            let from = pick_index(rng, bounds.vertices, invalid);
            let to = pick_index(rng, bounds.vertices, invalid);
            Mutation::AddEdges(vec![(from, to)])
        }
        2 => Mutation::DeleteVertices(vec![pick_index(rng, bounds.vertices, invalid)]),
        3 => Mutation::DeleteEdges(vec![pick_index(rng, bounds.edges, invalid)]),
        _ => Mutation::SetAttribute {
            kind: ElementKind::Vertex,
            index: pick_index(rng, bounds.vertices, invalid),
            name: "weight".to_string(),
            value: json!(rng.gen_range(0..100)),
        },
    }
}

fn pick_index(rng: &mut StdRng, bound: usize, invalid: bool) -> usize {
    if invalid || bound == 0 {
        bound + rng.gen_range(0..3)
    } else {
        rng.gen_range(0..bound)
    }
}

/// Bounds expected after `mutation` succeeds on a graph with `bounds`, given
/// how many edges it removes as a side effect.
pub fn expected_bounds(bounds: Bounds, mutation: &Mutation, incident_edges: usize) -> Bounds {
    match mutation {
        Mutation::AddVertices(n) => Bounds {
            vertices: bounds.vertices + n,
            ..bounds
        },
        Mutation::AddEdges(edges) => Bounds {
            edges: bounds.edges + edges.len(),
            ..bounds
        },
        Mutation::DeleteVertices(indices) => Bounds {
            vertices: bounds.vertices - indices.len(),
            edges: bounds.edges - incident_edges,
        },
        Mutation::DeleteEdges(indices) => Bounds {
            edges: bounds.edges - indices.len(),
            ..bounds
        },
        _ => bounds,
    }
}
