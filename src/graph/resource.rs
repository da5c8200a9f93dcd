use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::{
    backref::{BackRef, Generation, ResourceId},
    config::GraphConfig,
    constants::{AdjacencyLayout, Connectedness, NeighborMode},
    errors::GraphError,
    handle::ElementHandle,
    native::NativeGraph,
    reindex::{Followed, ReindexLog},
    runtime,
    seq::{Seq, SeqInner},
};

use super::types::{Bounds, ElementKind, GraphSpec, Mutation};

/// Passed to a release observer when the native structure is freed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReleaseEvent {
    pub resource: ResourceId,
    pub bounds: Bounds,
}

type ReleaseObserver = Box<dyn FnOnce(ReleaseEvent)>;

/// Shared cell behind every [`Graph`] handle. Proxies only ever hold a `Weak`
/// to it, and it holds only `Weak`s to the views it caches.
pub(crate) struct ResourceCell {
    id: ResourceId,
    generation: Cell<Generation>,
    config: GraphConfig,
    state: RefCell<Option<NativeGraph>>,
    vertex_log: RefCell<ReindexLog>,
    edge_log: RefCell<ReindexLog>,
    vertex_view: RefCell<Weak<SeqInner>>,
    edge_view: RefCell<Weak<SeqInner>>,
    observer: RefCell<Option<ReleaseObserver>>,
}

impl ResourceCell {
    pub(crate) fn id(&self) -> ResourceId {
        self.id
    }

    pub(crate) fn generation(&self) -> Generation {
        self.generation.get()
    }

    pub(crate) fn state(&self) -> Result<Ref<'_, NativeGraph>, GraphError> {
        let slot = self
            .state
            .try_borrow()
            .map_err(|_| runtime::fault(format!("resource {} is being mutated", self.id)))?;
        Ref::filter_map(slot, Option::as_ref)
            .map_err(|_| GraphError::stale(format!("resource {} was destroyed", self.id)))
    }

    /// Maps an index captured at `since` to where that element lives now.
    pub(crate) fn follow(
        &self,
        kind: ElementKind,
        index: usize,
        since: Generation,
    ) -> Result<usize, GraphError> {
        let log = match kind {
            ElementKind::Vertex => self.vertex_log.borrow(),
            ElementKind::Edge => self.edge_log.borrow(),
        };
        match log.follow(index, since) {
            Followed::At(current) => Ok(current),
            Followed::Removed { generation } => Err(GraphError::out_of_range(format!(
                "{kind} {index} was removed at generation {generation}"
            ))),
            Followed::Expired { horizon } => Err(GraphError::stale(format!(
                "{kind} {index} was captured at generation {since}, \
                 before the re-index history horizon {horizon}"
            ))),
        }
    }

    pub(crate) fn mutate(&self, mutation: &Mutation) -> Result<Generation, GraphError> {
        let applied = {
            let mut slot = self.state.try_borrow_mut().map_err(|_| {
                runtime::fault(format!(
                    "resource {} is borrowed while applying {}",
                    self.id,
                    mutation.name()
                ))
            })?;
            let native = slot
                .as_mut()
                .ok_or_else(|| GraphError::stale(format!("resource {} was destroyed", self.id)))?;
            native.apply(mutation, &self.config)?
        };
        let generation = self.generation.get().next();
        self.generation.set(generation);
        if let Some(remap) = applied.vertices {
            self.vertex_log.borrow_mut().record(generation, remap);
        }
        if let Some(remap) = applied.edges {
            self.edge_log.borrow_mut().record(generation, remap);
        }
        tracing::trace!(resource = %self.id, op = mutation.name(), %generation, "mutated graph");
        Ok(generation)
    }

    /// Frees the native structure. Returns `Ok(false)` if it was already gone.
    fn release(&self, reason: &'static str) -> Result<bool, GraphError> {
        let native = self
            .state
            .try_borrow_mut()
            .map_err(|_| {
                runtime::fault(format!("resource {} is borrowed and cannot be destroyed", self.id))
            })?
            .take();
        let Some(native) = native else {
            return Ok(false);
        };
        self.generation.set(Generation::TERMINAL);
        let bounds = native.release();
        for slot in [&self.vertex_view, &self.edge_view] {
            let cached = slot.replace(Weak::new());
            if let Some(view) = cached.upgrade() {
                view.clear_link();
            }
        }
        self.vertex_log.borrow_mut().clear();
        self.edge_log.borrow_mut().clear();
        runtime::note_released();
        tracing::debug!(
            resource = %self.id,
            reason,
            vertices = bounds.vertices,
            edges = bounds.edges,
            "released native graph"
        );
        let observer = self.observer.borrow_mut().take();
        if let Some(observer) = observer {
            observer(ReleaseEvent {
                resource: self.id,
                bounds,
            });
        }
        Ok(true)
    }

    fn view_slot(&self, kind: ElementKind) -> &RefCell<Weak<SeqInner>> {
        match kind {
            ElementKind::Vertex => &self.vertex_view,
            ElementKind::Edge => &self.edge_view,
        }
    }

    fn drop_cached_views(&self) {
        self.vertex_view.replace(Weak::new());
        self.edge_view.replace(Weak::new());
    }
}

impl Drop for ResourceCell {
    fn drop(&mut self) {
        if let Err(err) = self.release("dropped") {
            runtime::report(&err);
        }
    }
}

/// Handle to a graph resource.
///
/// Cloning a `Graph` shares the same resource; the native structure is freed
/// when [`Graph::destroy`] is called or the last handle is dropped, whichever
/// comes first. Views and element handles obtained from a graph never keep it
/// alive.
#[derive(Clone)]
pub struct Graph {
    cell: Rc<ResourceCell>,
}

impl Graph {
    pub fn create(spec: &GraphSpec) -> Result<Self, GraphError> {
        Self::create_with_config(spec, GraphConfig::default())
    }

    pub fn create_with_config(spec: &GraphSpec, config: GraphConfig) -> Result<Self, GraphError> {
        let native = NativeGraph::build(spec, &config)?;
        let id = ResourceId::fresh();
        let bounds = native.bounds();
        let history = config.reindex_history;
        runtime::note_created();
        tracing::debug!(
            resource = %id,
            vertices = bounds.vertices,
            edges = bounds.edges,
            directed = native.is_directed(),
            "created graph"
        );
        Ok(Self {
            cell: Rc::new(ResourceCell {
                id,
                generation: Cell::new(Generation::FIRST),
                config,
                state: RefCell::new(Some(native)),
                vertex_log: RefCell::new(ReindexLog::with_capacity(history)),
                edge_log: RefCell::new(ReindexLog::with_capacity(history)),
                vertex_view: RefCell::new(Weak::new()),
                edge_view: RefCell::new(Weak::new()),
                observer: RefCell::new(None),
            }),
        })
    }

    pub fn id(&self) -> ResourceId {
        self.cell.id
    }

    pub fn generation(&self) -> Generation {
        self.cell.generation()
    }

    pub fn config(&self) -> &GraphConfig {
        &self.cell.config
    }

    pub fn is_destroyed(&self) -> bool {
        self.cell.generation().is_terminal()
    }

    /// Applies `mutation` atomically and returns the new generation.
    pub fn mutate(&self, mutation: Mutation) -> Result<Generation, GraphError> {
        self.cell.mutate(&mutation)
    }

    pub fn add_vertices(&self, count: usize) -> Result<Generation, GraphError> {
        self.mutate(Mutation::AddVertices(count))
    }

    pub fn delete_vertices(&self, indices: &[usize]) -> Result<Generation, GraphError> {
        self.mutate(Mutation::DeleteVertices(indices.to_vec()))
    }

    pub fn add_edges(&self, edges: &[(usize, usize)]) -> Result<Generation, GraphError> {
        self.mutate(Mutation::AddEdges(edges.to_vec()))
    }

    pub fn delete_edges(&self, indices: &[usize]) -> Result<Generation, GraphError> {
        self.mutate(Mutation::DeleteEdges(indices.to_vec()))
    }

    pub fn permute_vertices(&self, permutation: &[usize]) -> Result<Generation, GraphError> {
        self.mutate(Mutation::PermuteVertices(permutation.to_vec()))
    }

    pub fn set_graph_attribute(&self, name: &str, value: Value) -> Result<Generation, GraphError> {
        self.mutate(Mutation::SetGraphAttribute {
            name: name.to_string(),
            value,
        })
    }

    /// Frees the native structure now. Calling it again is a no-op.
    pub fn destroy(&self) -> Result<(), GraphError> {
        self.cell.release("destroyed").map(|_| ())
    }

    /// Registers a callback run exactly once when the native structure is freed.
    /// Replaces any previously registered observer. The callback must not own a
    /// `Graph` handle to this resource, or the resource can never be dropped.
    pub fn on_release<F>(&self, observer: F)
    where
        F: FnOnce(ReleaseEvent) + 'static,
    {
        self.cell.observer.replace(Some(Box::new(observer)));
    }

    pub fn snapshot_bounds(&self) -> Result<Bounds, GraphError> {
        Ok(self.cell.state()?.bounds())
    }

    pub fn is_directed(&self) -> Result<bool, GraphError> {
        Ok(self.cell.state()?.is_directed())
    }

    pub fn edge_list(&self) -> Result<Vec<(usize, usize)>, GraphError> {
        Ok(self.cell.state()?.edges().to_vec())
    }

    pub fn neighbors(&self, vertex: usize, mode: NeighborMode) -> Result<Vec<usize>, GraphError> {
        self.cell.state()?.neighbors(vertex, mode)
    }

    pub fn degree(&self, vertex: usize, mode: NeighborMode) -> Result<usize, GraphError> {
        self.cell.state()?.degree(vertex, mode)
    }

    pub fn adjacency(&self, layout: AdjacencyLayout) -> Result<Vec<Vec<u32>>, GraphError> {
        Ok(self.cell.state()?.adjacency(layout))
    }

    pub fn is_connected(&self, mode: Connectedness) -> Result<bool, GraphError> {
        Ok(self.cell.state()?.is_connected(mode))
    }

    pub fn graph_attribute(&self, name: &str) -> Result<Option<Value>, GraphError> {
        Ok(self.cell.state()?.graph_attribute(name).cloned())
    }

    pub fn to_spec(&self) -> Result<GraphSpec, GraphError> {
        Ok(self.cell.state()?.to_spec())
    }

    pub fn back_ref(&self) -> BackRef {
        BackRef::bind_cell(&self.cell)
    }

    /// View over all vertices. Returns the cached view while someone still
    /// holds it.
    pub fn vs(&self) -> Result<Seq, GraphError> {
        self.cached_view(ElementKind::Vertex)
    }

    /// View over all edges, cached like [`Graph::vs`].
    pub fn es(&self) -> Result<Seq, GraphError> {
        self.cached_view(ElementKind::Edge)
    }

    pub fn has_cached_view(&self, kind: ElementKind) -> bool {
        self.cell.view_slot(kind).borrow().strong_count() > 0
    }

    pub fn vertex(&self, index: usize) -> Result<ElementHandle, GraphError> {
        self.element(ElementKind::Vertex, index)
    }

    pub fn edge(&self, index: usize) -> Result<ElementHandle, GraphError> {
        self.element(ElementKind::Edge, index)
    }

    /// Strong holders of the resource: `Graph` handles plus outstanding
    /// [`crate::Resolved`] guards.
    pub fn handle_count(&self) -> usize {
        Rc::strong_count(&self.cell)
    }

    /// Non-owning links to the resource still in existence.
    pub fn weak_link_count(&self) -> usize {
        Rc::weak_count(&self.cell)
    }

    pub(crate) fn drop_cached_views(&self) {
        self.cell.drop_cached_views();
    }

    fn element(&self, kind: ElementKind, index: usize) -> Result<ElementHandle, GraphError> {
        self.cell.state()?.bounds().check(kind, index)?;
        Ok(ElementHandle::new(self.back_ref(), index, kind))
    }

    fn cached_view(&self, kind: ElementKind) -> Result<Seq, GraphError> {
        if self.is_destroyed() {
            return Err(GraphError::stale(format!(
                "resource {} was destroyed",
                self.cell.id
            )));
        }
        let slot = self.cell.view_slot(kind);
        if let Some(inner) = slot.borrow().upgrade() {
            if inner.link().points_at(&self.cell) && !inner.link().is_cleared() {
                tracing::trace!(resource = %self.cell.id, %kind, "reusing cached view");
                return Ok(Seq::from_inner(inner));
            }
        }
        let view = Seq::all(self.back_ref(), kind);
        slot.replace(view.downgrade());
        Ok(view)
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("id", &self.cell.id)
            .field("generation", &self.cell.generation())
            .finish()
    }
}
