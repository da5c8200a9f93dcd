//! Construction and mutation policy for a [`crate::Graph`].
//!
//! The defaults accept every structure the engine can represent. Tightening a
//! flag turns the corresponding shape into a [`crate::GraphError::Construction`]
//! at create time and a [`crate::GraphError::InvalidOperation`] at mutate time.

use crate::reindex::DEFAULT_REINDEX_HISTORY;

/// Policy applied by the engine while building or editing a graph.
///
/// # Default Configuration
///
/// ```rust
/// use graphbind::GraphConfig;
/// let config = GraphConfig::default();
/// assert!(config.allow_self_loops);
/// assert!(config.allow_multi_edges);
/// assert!(config.reserve_edge_capacity.is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphConfig {
    /// Whether an edge may join a vertex to itself
    ///
    /// **Default:** `true`
    pub allow_self_loops: bool,

    /// Whether two edges may join the same ordered pair of vertices
    ///
    /// **Default:** `true`
    ///
    /// For undirected graphs the pair is compared without orientation.
    pub allow_multi_edges: bool,

    /// Optional capacity hint for the vertex attribute columns
    pub reserve_vertex_capacity: Option<usize>,

    /// Optional capacity hint for the edge list
    pub reserve_edge_capacity: Option<usize>,

    /// Removals and permutations remembered per element kind
    ///
    /// **Default:** [`DEFAULT_REINDEX_HISTORY`]
    ///
    /// Element handles follow their element through this history. A handle
    /// captured before the oldest remembered entry fails with
    /// [`crate::GraphError::StaleReference`].
    pub reindex_history: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            allow_self_loops: true,
            allow_multi_edges: true,
            reserve_vertex_capacity: None,
            reserve_edge_capacity: None,
            reindex_history: DEFAULT_REINDEX_HISTORY,
        }
    }
}

impl GraphConfig {
    /// Configuration for simple graphs: no loops and no parallel edges.
    pub fn simple() -> Self {
        Self {
            allow_self_loops: false,
            allow_multi_edges: false,
            ..Self::default()
        }
    }

    pub fn with_capacity(mut self, vertices: usize, edges: usize) -> Self {
        self.reserve_vertex_capacity = Some(vertices);
        self.reserve_edge_capacity = Some(edges);
        self
    }

    pub fn with_reindex_history(mut self, entries: usize) -> Self {
        self.reindex_history = entries;
        self
    }
}
