//! In-process graph engine owned by a [`crate::Graph`].
//!
//! Everything here operates on plain indices and knows nothing about proxies,
//! generations or lifetimes; those live one layer up. Mutators validate the
//! whole request before touching any state, so a failed call leaves the
//! structure exactly as it was.

use std::collections::BTreeMap;

use ahash::{AHashMap, AHashSet};
use serde_json::Value;

use crate::{
    config::GraphConfig,
    constants::{AdjacencyLayout, Connectedness, NeighborMode},
    errors::GraphError,
    graph::{Bounds, ElementKind, GraphSpec, Mutation},
    reindex::Remap,
};

/// Largest vertex count a graph may reach. Vertex counts round-trip through
/// the signed count of a [`GraphSpec`].
pub const MAX_VERTICES: usize = i64::MAX as usize;

#[derive(Debug, Clone)]
pub struct NativeGraph {
    directed: bool,
    vertex_count: usize,
    edges: Vec<(usize, usize)>,
    graph_attributes: AHashMap<String, Value>,
    vertex_attributes: AHashMap<String, Vec<Value>>,
    edge_attributes: AHashMap<String, Vec<Value>>,
}

/// Index movements caused by one applied mutation.
#[derive(Debug, Default)]
pub struct Applied {
    pub vertices: Option<Remap>,
    pub edges: Option<Remap>,
}

impl NativeGraph {
    pub fn build(spec: &GraphSpec, config: &GraphConfig) -> Result<Self, GraphError> {
        if spec.vertices < 0 {
            return Err(GraphError::construction(format!(
                "vertex count must not be negative, got {}",
                spec.vertices
            )));
        }
        let vertex_count = spec.vertices as usize;
        let mut edges =
            Vec::with_capacity(config.reserve_edge_capacity.unwrap_or(0).max(spec.edges.len()));
        for (position, &(from, to)) in spec.edges.iter().enumerate() {
            let endpoint_ok = |v: i64| v >= 0 && (v as usize) < vertex_count;
            if !endpoint_ok(from) || !endpoint_ok(to) {
                return Err(GraphError::construction(format!(
                    "edge {position} ({from}, {to}) references a vertex outside 0..{vertex_count}"
                )));
            }
            edges.push((from as usize, to as usize));
        }
        let mut graph = Self {
            directed: spec.directed,
            vertex_count,
            edges: Vec::new(),
            graph_attributes: spec
                .graph_attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            vertex_attributes: AHashMap::new(),
            edge_attributes: AHashMap::new(),
        };
        graph.check_edge_policy(&edges, config).map_err(|err| match err {
            GraphError::InvalidOperation(msg) => GraphError::Construction(msg),
            other => other,
        })?;
        graph.edges = edges;

        for (name, column) in &spec.vertex_attributes {
            if column.len() != vertex_count {
                return Err(GraphError::construction(format!(
                    "vertex attribute '{name}' has {} values for {vertex_count} vertices",
                    column.len()
                )));
            }
            let mut values = Vec::with_capacity(config.reserve_vertex_capacity.unwrap_or(0));
            values.extend(column.iter().cloned());
            graph.vertex_attributes.insert(name.clone(), values);
        }
        for (name, column) in &spec.edge_attributes {
            if column.len() != graph.edges.len() {
                return Err(GraphError::construction(format!(
                    "edge attribute '{name}' has {} values for {} edges",
                    column.len(),
                    graph.edges.len()
                )));
            }
            graph.edge_attributes.insert(name.clone(), column.clone());
        }
        Ok(graph)
    }

    /// Consumes the structure. Returns the bounds it had when released.
    pub fn release(self) -> Bounds {
        self.bounds()
    }

    pub fn bounds(&self) -> Bounds {
        Bounds {
            vertices: self.vertex_count,
            edges: self.edges.len(),
        }
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    pub fn edge(&self, index: usize) -> Result<(usize, usize), GraphError> {
        self.edges
            .get(index)
            .copied()
            .ok_or_else(|| {
                GraphError::out_of_range(format!("edge {index} outside 0..{}", self.edges.len()))
            })
    }

    pub fn neighbors(&self, vertex: usize, mode: NeighborMode) -> Result<Vec<usize>, GraphError> {
        self.bounds().check(ElementKind::Vertex, vertex)?;
        let mut result = Vec::new();
        for &(from, to) in &self.edges {
            if !self.directed {
                if from == vertex {
                    result.push(to);
                }
                if to == vertex {
                    result.push(from);
                }
                continue;
            }
            if from == vertex && matches!(mode, NeighborMode::Out | NeighborMode::All) {
                result.push(to);
            }
            if to == vertex && matches!(mode, NeighborMode::In | NeighborMode::All) {
                result.push(from);
            }
        }
        result.sort_unstable();
        Ok(result)
    }

    pub fn degree(&self, vertex: usize, mode: NeighborMode) -> Result<usize, GraphError> {
        Ok(self.neighbors(vertex, mode)?.len())
    }

    /// Dense adjacency matrix with edge multiplicities. `layout` only matters
    /// for undirected graphs.
    pub fn adjacency(&self, layout: AdjacencyLayout) -> Vec<Vec<u32>> {
        let n = self.vertex_count;
        let mut matrix = vec![vec![0u32; n]; n];
        for &(from, to) in &self.edges {
            if self.directed {
                matrix[from][to] += 1;
                continue;
            }
            let (lo, hi) = if from <= to { (from, to) } else { (to, from) };
            match layout {
                AdjacencyLayout::Upper => matrix[lo][hi] += 1,
                AdjacencyLayout::Lower => matrix[hi][lo] += 1,
                AdjacencyLayout::Both => {
                    matrix[lo][hi] += 1;
                    if lo != hi {
                        matrix[hi][lo] += 1;
                    }
                }
            }
        }
        matrix
    }

    /// Undirected graphs ignore `mode`. The null graph counts as connected.
    pub fn is_connected(&self, mode: Connectedness) -> bool {
        if self.vertex_count == 0 {
            return true;
        }
        if !self.directed || mode == Connectedness::Weak {
            return self.reach(0, |from, to| vec![(from, to), (to, from)]) == self.vertex_count;
        }
        self.reach(0, |from, to| vec![(from, to)]) == self.vertex_count
            && self.reach(0, |from, to| vec![(to, from)]) == self.vertex_count
    }

    /// Breadth-first count of vertices reachable from `start` over the arcs
    /// that `arcs` derives from each edge.
    fn reach<F>(&self, start: usize, arcs: F) -> usize
    where
        F: Fn(usize, usize) -> Vec<(usize, usize)>,
    {
        let mut adjacency = vec![Vec::new(); self.vertex_count];
        for &(from, to) in &self.edges {
            for (a, b) in arcs(from, to) {
                adjacency[a].push(b);
            }
        }
        let mut seen = vec![false; self.vertex_count];
        let mut queue = std::collections::VecDeque::from([start]);
        seen[start] = true;
        let mut count = 1;
        while let Some(vertex) = queue.pop_front() {
            for &next in &adjacency[vertex] {
                if !seen[next] {
                    seen[next] = true;
                    count += 1;
                    queue.push_back(next);
                }
            }
        }
        count
    }

    pub fn graph_attribute(&self, name: &str) -> Option<&Value> {
        self.graph_attributes.get(name)
    }

    pub fn attribute(&self, kind: ElementKind, index: usize, name: &str) -> Option<&Value> {
        self.columns(kind).get(name).and_then(|column| column.get(index))
    }

    pub fn attributes(&self, kind: ElementKind, index: usize) -> BTreeMap<String, Value> {
        self.columns(kind)
            .iter()
            .filter_map(|(name, column)| column.get(index).map(|v| (name.clone(), v.clone())))
            .collect()
    }

    pub fn to_spec(&self) -> GraphSpec {
        GraphSpec {
            vertices: self.vertex_count as i64,
            edges: self
                .edges
                .iter()
                .map(|&(from, to)| (from as i64, to as i64))
                .collect(),
            directed: self.directed,
            graph_attributes: self
                .graph_attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            vertex_attributes: sorted_columns(&self.vertex_attributes),
            edge_attributes: sorted_columns(&self.edge_attributes),
        }
    }

    pub fn apply(
        &mut self,
        mutation: &Mutation,
        config: &GraphConfig,
    ) -> Result<Applied, GraphError> {
        match mutation {
            Mutation::AddVertices(count) => {
                let n = self
                    .vertex_count
                    .checked_add(*count)
                    .filter(|&n| n <= MAX_VERTICES)
                    .ok_or_else(|| {
                        GraphError::invalid_operation(format!(
                            "add_vertices: {} + {count} exceeds the limit of {MAX_VERTICES}",
                            self.vertex_count
                        ))
                    })?;
                self.vertex_count = n;
                for column in self.vertex_attributes.values_mut() {
                    column.resize(n, Value::Null);
                }
                Ok(Applied::default())
            }
            Mutation::AddEdges(new_edges) => {
                let bounds = self.bounds();
                for &(from, to) in new_edges {
                    bounds
                        .check(ElementKind::Vertex, from)
                        .and_then(|_| bounds.check(ElementKind::Vertex, to))
                        .map_err(|e| GraphError::invalid_operation(format!("add_edges: {e}")))?;
                }
                self.check_edge_policy(new_edges, config)?;
                self.edges.extend_from_slice(new_edges);
                let m = self.edges.len();
                for column in self.edge_attributes.values_mut() {
                    column.resize(m, Value::Null);
                }
                Ok(Applied::default())
            }
            Mutation::DeleteEdges(indices) => {
                self.check_all(ElementKind::Edge, indices, "delete_edges")?;
                let remap = Remap::removed(indices.clone());
                if let Remap::Removed(removed) = &remap {
                    let dropped: AHashSet<usize> = removed.iter().copied().collect();
                    self.retain_edges(|index| !dropped.contains(&index));
                }
                Ok(Applied {
                    vertices: None,
                    edges: Some(remap),
                })
            }
            Mutation::DeleteVertices(indices) => {
                self.check_all(ElementKind::Vertex, indices, "delete_vertices")?;
                let vertex_remap = Remap::removed(indices.clone());
                let dropped: AHashSet<usize> = indices.iter().copied().collect();
                let incident: Vec<usize> = self
                    .edges
                    .iter()
                    .enumerate()
                    .filter(|(_, (from, to))| dropped.contains(from) || dropped.contains(to))
                    .map(|(index, _)| index)
                    .collect();
                let edge_remap = Remap::removed(incident);
                if let Remap::Removed(removed_edges) = &edge_remap {
                    let gone: AHashSet<usize> = removed_edges.iter().copied().collect();
                    self.retain_edges(|index| !gone.contains(&index));
                }
                for endpoint in self.edges.iter_mut() {
                    // Endpoints of surviving edges are never in the removed set.
                    endpoint.0 = vertex_remap.apply(endpoint.0).unwrap_or(endpoint.0);
                    endpoint.1 = vertex_remap.apply(endpoint.1).unwrap_or(endpoint.1);
                }
                for column in self.vertex_attributes.values_mut() {
                    let mut index = 0;
                    column.retain(|_| {
                        let keep = !dropped.contains(&index);
                        index += 1;
                        keep
                    });
                }
                self.vertex_count -= dropped.len();
                Ok(Applied {
                    vertices: Some(vertex_remap),
                    edges: Some(edge_remap),
                })
            }
            Mutation::PermuteVertices(permutation) => {
                self.check_permutation(permutation)?;
                for endpoint in self.edges.iter_mut() {
                    endpoint.0 = permutation[endpoint.0];
                    endpoint.1 = permutation[endpoint.1];
                }
                for column in self.vertex_attributes.values_mut() {
                    let mut moved = vec![Value::Null; column.len()];
                    for (old, value) in column.drain(..).enumerate() {
                        moved[permutation[old]] = value;
                    }
                    *column = moved;
                }
                Ok(Applied {
                    vertices: Some(Remap::Permuted(permutation.clone())),
                    edges: None,
                })
            }
            Mutation::SetAttribute {
                kind,
                index,
                name,
                value,
            } => {
                self.bounds()
                    .check(*kind, *index)
                    .map_err(|e| GraphError::invalid_operation(format!("set_attribute: {e}")))?;
                let len = self.bounds().of(*kind);
                let column = self
                    .columns_mut(*kind)
                    .entry(name.clone())
                    .or_insert_with(|| vec![Value::Null; len]);
                column[*index] = value.clone();
                Ok(Applied::default())
            }
            Mutation::SetGraphAttribute { name, value } => {
                self.graph_attributes.insert(name.clone(), value.clone());
                Ok(Applied::default())
            }
        }
    }

    fn check_all(&self, kind: ElementKind, indices: &[usize], op: &str) -> Result<(), GraphError> {
        let bounds = self.bounds();
        for &index in indices {
            bounds
                .check(kind, index)
                .map_err(|e| GraphError::invalid_operation(format!("{op}: {e}")))?;
        }
        Ok(())
    }

    fn check_permutation(&self, permutation: &[usize]) -> Result<(), GraphError> {
        if permutation.len() != self.vertex_count {
            return Err(GraphError::invalid_operation(format!(
                "permute_vertices: permutation has {} entries for {} vertices",
                permutation.len(),
                self.vertex_count
            )));
        }
        let mut seen = vec![false; self.vertex_count];
        for &target in permutation {
            if target >= self.vertex_count || std::mem::replace(&mut seen[target], true) {
                return Err(GraphError::invalid_operation(format!(
                    "permute_vertices: {target} is out of range or repeated"
                )));
            }
        }
        Ok(())
    }

    fn check_edge_policy(
        &self,
        candidates: &[(usize, usize)],
        config: &GraphConfig,
    ) -> Result<(), GraphError> {
        if !config.allow_self_loops {
            if let Some((from, _)) = candidates.iter().find(|(from, to)| from == to) {
                return Err(GraphError::invalid_operation(format!(
                    "self loop on vertex {from} is not allowed"
                )));
            }
        }
        if !config.allow_multi_edges {
            let mut seen: AHashSet<(usize, usize)> =
                self.edges.iter().map(|&e| self.normalize(e)).collect();
            for &edge in candidates {
                if !seen.insert(self.normalize(edge)) {
                    return Err(GraphError::invalid_operation(format!(
                        "parallel edge ({}, {}) is not allowed",
                        edge.0, edge.1
                    )));
                }
            }
        }
        Ok(())
    }

    fn normalize(&self, (from, to): (usize, usize)) -> (usize, usize) {
        if self.directed || from <= to {
            (from, to)
        } else {
            (to, from)
        }
    }

    fn retain_edges<F: Fn(usize) -> bool>(&mut self, keep: F) {
        let mut index = 0;
        self.edges.retain(|_| {
            let k = keep(index);
            index += 1;
            k
        });
        for column in self.edge_attributes.values_mut() {
            let mut index = 0;
            column.retain(|_| {
                let k = keep(index);
                index += 1;
                k
            });
        }
    }

    fn columns(&self, kind: ElementKind) -> &AHashMap<String, Vec<Value>> {
        match kind {
            ElementKind::Vertex => &self.vertex_attributes,
            ElementKind::Edge => &self.edge_attributes,
        }
    }

    fn columns_mut(&mut self, kind: ElementKind) -> &mut AHashMap<String, Vec<Value>> {
        match kind {
            ElementKind::Vertex => &mut self.vertex_attributes,
            ElementKind::Edge => &mut self.edge_attributes,
        }
    }
}

fn sorted_columns(columns: &AHashMap<String, Vec<Value>>) -> BTreeMap<String, Vec<Value>> {
    columns
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
