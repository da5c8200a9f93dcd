use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    constants::{StarMode, TreeMode},
    errors::GraphError,
};

/// Structural description a [`crate::Graph`] is built from.
///
/// Counts and endpoints are signed so that malformed input coming from a host
/// can be rejected with a typed error instead of being truncated on the way in.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GraphSpec {
    pub vertices: i64,
    pub edges: Vec<(i64, i64)>,
    pub directed: bool,
    #[serde(default)]
    pub graph_attributes: BTreeMap<String, Value>,
    #[serde(default)]
    pub vertex_attributes: BTreeMap<String, Vec<Value>>,
    #[serde(default)]
    pub edge_attributes: BTreeMap<String, Vec<Value>>,
}

impl GraphSpec {
    pub fn new(vertices: i64, edges: Vec<(i64, i64)>, directed: bool) -> Self {
        Self {
            vertices,
            edges,
            directed,
            ..Self::default()
        }
    }

    pub fn empty(vertices: i64) -> Self {
        Self::new(vertices, Vec::new(), false)
    }

    /// A star on `n` vertices around `center`. Every mode except
    /// [`StarMode::Undirected`] yields a directed graph.
    pub fn star(n: i64, mode: StarMode, center: i64) -> Result<Self, GraphError> {
        if n < 0 {
            return Err(GraphError::construction("vertex count must not be negative"));
        }
        if n > 0 && !(0..n).contains(&center) {
            return Err(GraphError::construction(format!(
                "star center {center} outside 0..{n}"
            )));
        }
        let edges = (0..n)
            .filter(|&leaf| leaf != center)
            .map(|leaf| match mode {
                StarMode::In => (leaf, center),
                StarMode::Out | StarMode::Undirected => (center, leaf),
            })
            .collect();
        Ok(Self::new(n, edges, mode != StarMode::Undirected))
    }

    /// A regular tree on `n` vertices where vertex `i` parents
    /// `i * children + 1 ..= i * children + children`.
    pub fn tree(n: i64, children: i64, mode: TreeMode) -> Result<Self, GraphError> {
        if n < 0 {
            return Err(GraphError::construction("vertex count must not be negative"));
        }
        if children <= 0 {
            return Err(GraphError::construction("tree fan-out must be positive"));
        }
        let mut edges = Vec::new();
        for child in 1..n {
            let parent = (child - 1) / children;
            edges.push(match mode {
                TreeMode::In => (child, parent),
                TreeMode::Out | TreeMode::Undirected => (parent, child),
            });
        }
        Ok(Self::new(n, edges, mode != TreeMode::Undirected))
    }

    pub fn with_vertex_attribute(mut self, name: &str, values: Vec<Value>) -> Self {
        self.vertex_attributes.insert(name.to_string(), values);
        self
    }

    pub fn with_edge_attribute(mut self, name: &str, values: Vec<Value>) -> Self {
        self.edge_attributes.insert(name.to_string(), values);
        self
    }

    pub fn with_graph_attribute(mut self, name: &str, value: Value) -> Self {
        self.graph_attributes.insert(name.to_string(), value);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElementKind {
    Vertex,
    Edge,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Vertex => f.write_str("vertex"),
            ElementKind::Edge => f.write_str("edge"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub vertices: usize,
    pub edges: usize,
}

impl Bounds {
    pub fn of(&self, kind: ElementKind) -> usize {
        match kind {
            ElementKind::Vertex => self.vertices,
            ElementKind::Edge => self.edges,
        }
    }

    pub fn check(&self, kind: ElementKind, index: usize) -> Result<(), GraphError> {
        let bound = self.of(kind);
        if index < bound {
            Ok(())
        } else {
            Err(GraphError::out_of_range(format!(
                "{kind} {index} outside 0..{bound}"
            )))
        }
    }
}

/// Structural or attribute edit applied atomically by [`crate::Graph::mutate`].
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    AddVertices(usize),
    /// Removes the listed vertices together with their incident edges.
    /// Survivors are compacted downwards, keeping their relative order.
    DeleteVertices(Vec<usize>),
    AddEdges(Vec<(usize, usize)>),
    /// Removes the listed edges; survivors are compacted like vertices.
    DeleteEdges(Vec<usize>),
    /// Moves vertex `i` to position `permutation[i]`.
    PermuteVertices(Vec<usize>),
    SetAttribute {
        kind: ElementKind,
        index: usize,
        name: String,
        value: Value,
    },
    SetGraphAttribute {
        name: String,
        value: Value,
    },
}

impl Mutation {
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::AddVertices(_) => "add_vertices",
            Mutation::DeleteVertices(_) => "delete_vertices",
            Mutation::AddEdges(_) => "add_edges",
            Mutation::DeleteEdges(_) => "delete_edges",
            Mutation::PermuteVertices(_) => "permute_vertices",
            Mutation::SetAttribute { .. } => "set_attribute",
            Mutation::SetGraphAttribute { .. } => "set_graph_attribute",
        }
    }
}
