//! Element handles: a back-reference plus an index, tagged vertex or edge.
//!
//! A handle never caches anything it read. Every accessor re-resolves the
//! resource, follows the captured index through any re-indexing recorded since
//! the handle was made, and checks it against the live bounds.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    backref::{BackRef, Generation, Resolved},
    constants::NeighborMode,
    errors::GraphError,
    graph::{ElementKind, Mutation},
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VertexData {
    pub index: usize,
    pub degree: usize,
    pub neighbors: Vec<usize>,
    pub attributes: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeData {
    pub index: usize,
    pub source: usize,
    pub target: usize,
    pub attributes: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ElementData {
    Vertex(VertexData),
    Edge(EdgeData),
}

impl ElementData {
    pub fn index(&self) -> usize {
        match self {
            ElementData::Vertex(v) => v.index,
            ElementData::Edge(e) => e.index,
        }
    }

    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        match self {
            ElementData::Vertex(v) => &v.attributes,
            ElementData::Edge(e) => &e.attributes,
        }
    }
}

#[derive(Clone)]
pub struct ElementHandle {
    link: BackRef,
    index: usize,
    kind: ElementKind,
}

impl ElementHandle {
    pub fn new(link: BackRef, index: usize, kind: ElementKind) -> Self {
        Self { link, index, kind }
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn is_vertex(&self) -> bool {
        self.kind == ElementKind::Vertex
    }

    /// Index as captured when the handle was made.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn link(&self) -> &BackRef {
        &self.link
    }

    pub fn captured_generation(&self) -> Generation {
        self.link.generation()
    }

    /// Where the element lives now.
    pub fn current_index(&self) -> Result<usize, GraphError> {
        self.locate().map(|(_, index)| index)
    }

    /// Validates the handle without reading element data.
    pub fn check(&self) -> Result<(), GraphError> {
        self.locate().map(|_| ())
    }

    pub fn value(&self) -> Result<ElementData, GraphError> {
        let (resolved, index) = self.locate()?;
        let state = resolved.state()?;
        let attributes = state.attributes(self.kind, index);
        Ok(match self.kind {
            ElementKind::Vertex => {
                let neighbors = state.neighbors(index, NeighborMode::All)?;
                ElementData::Vertex(VertexData {
                    index,
                    degree: neighbors.len(),
                    neighbors,
                    attributes,
                })
            }
            ElementKind::Edge => {
                let (source, target) = state.edge(index)?;
                ElementData::Edge(EdgeData {
                    index,
                    source,
                    target,
                    attributes,
                })
            }
        })
    }

    pub fn attribute(&self, name: &str) -> Result<Option<Value>, GraphError> {
        let (resolved, index) = self.locate()?;
        let state = resolved.state()?;
        Ok(state.attribute(self.kind, index, name).cloned())
    }

    pub fn set_attribute(&self, name: &str, value: Value) -> Result<Generation, GraphError> {
        let (resolved, index) = self.locate()?;
        resolved.cell().mutate(&Mutation::SetAttribute {
            kind: self.kind,
            index,
            name: name.to_string(),
            value,
        })
    }

    pub fn neighbors(&self, mode: NeighborMode) -> Result<Vec<usize>, GraphError> {
        self.require(ElementKind::Vertex, "neighbors")?;
        let (resolved, index) = self.locate()?;
        let state = resolved.state()?;
        state.neighbors(index, mode)
    }

    pub fn degree(&self, mode: NeighborMode) -> Result<usize, GraphError> {
        Ok(self.neighbors(mode)?.len())
    }

    /// `(source, target)` of an edge handle.
    pub fn tuple(&self) -> Result<(usize, usize), GraphError> {
        self.require(ElementKind::Edge, "tuple")?;
        let (resolved, index) = self.locate()?;
        let state = resolved.state()?;
        state.edge(index)
    }

    pub(crate) fn release_link(&self) {
        self.link.clear();
    }

    fn require(&self, kind: ElementKind, op: &str) -> Result<(), GraphError> {
        if self.kind == kind {
            Ok(())
        } else {
            Err(GraphError::invalid_operation(format!(
                "{op} is not defined for {} handles",
                self.kind
            )))
        }
    }

    fn locate(&self) -> Result<(Resolved, usize), GraphError> {
        let resolved = self.link.resolve()?;
        let index = resolved
            .cell()
            .follow(self.kind, self.index, self.link.generation())?;
        resolved.state()?.bounds().check(self.kind, index)?;
        Ok((resolved, index))
    }

    /// Same link target, generation, index and kind as `other`.
    fn same_capture(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.index == other.index
            && self.link.resource_id() == other.link.resource_id()
            && self.link.generation() == other.link.generation()
    }
}

/// Handles that both resolve are equal when they land on the same element of
/// the same live resource. A handle that no longer resolves (its element was
/// removed, or the resource is gone) is only equal to handles with the exact
/// same capture, such as its clones.
impl PartialEq for ElementHandle {
    fn eq(&self, other: &Self) -> bool {
        if self.kind != other.kind || self.link.resource_id() != other.link.resource_id() {
            return false;
        }
        match (self.current_index(), other.current_index()) {
            (Ok(a), Ok(b)) => a == b,
            (Err(_), Err(_)) => self.same_capture(other),
            _ => false,
        }
    }
}

impl Eq for ElementHandle {}

impl Hash for ElementHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.link.resource_id().hash(state);
        self.kind.hash(state);
    }
}

impl fmt::Debug for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementHandle")
            .field("kind", &self.kind)
            .field("index", &self.index)
            .field("resource", &self.link.resource_id())
            .field("generation", &self.link.generation())
            .finish()
    }
}
