//! Non-owning, generation-checked links from proxies back to their resource.
//!
//! A [`BackRef`] never keeps the resource alive. It holds a `Weak` to the
//! resource cell plus the generation that was current when the link was made,
//! so a proxy can tell "gone", "destroyed", "cleared" and "mutated since"
//! apart and report each as a typed error instead of reading stale state.

use std::cell::{Cell, Ref};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{
    errors::GraphError,
    graph::{Graph, ResourceCell},
    native::NativeGraph,
};

/// Monotonic mutation counter of a resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(u64);

impl Generation {
    /// Sentinel stored by a destroyed resource. No live resource ever reaches it.
    pub const TERMINAL: Generation = Generation(u64::MAX);
    pub const FIRST: Generation = Generation(1);

    pub const fn new(value: u64) -> Self {
        Generation(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn is_terminal(self) -> bool {
        self == Self::TERMINAL
    }

    pub(crate) fn next(self) -> Self {
        debug_assert!(!self.is_terminal());
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_terminal() {
            f.write_str("terminal")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Process-unique identity of a resource. Identities are never reused, so two
/// proxies compare equal only when they point at the very same resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u64);

static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

impl ResourceId {
    pub(crate) fn fresh() -> Self {
        ResourceId(NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone)]
pub struct BackRef {
    cell: Weak<ResourceCell>,
    resource: ResourceId,
    generation: Generation,
    cleared: Cell<bool>,
}

impl BackRef {
    pub(crate) fn bind_cell(cell: &Rc<ResourceCell>) -> Self {
        Self {
            cell: Rc::downgrade(cell),
            resource: cell.id(),
            generation: cell.generation(),
            cleared: Cell::new(false),
        }
    }

    /// Link to `graph` at its current generation. Same as [`Graph::back_ref`].
    pub fn bind(graph: &Graph) -> Self {
        graph.back_ref()
    }

    /// A link that was never bound. Resolving it always fails.
    pub fn detached() -> Self {
        Self {
            cell: Weak::new(),
            resource: ResourceId(0),
            generation: Generation::TERMINAL,
            cleared: Cell::new(true),
        }
    }

    pub fn resource_id(&self) -> ResourceId {
        self.resource
    }

    /// Generation captured when this link was bound.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_cleared(&self) -> bool {
        self.cleared.get()
    }

    /// Resolves the link while the resource is alive, not destroyed and the
    /// link has not been cleared. The returned guard reports the resource's
    /// current generation, which may be newer than [`BackRef::generation`].
    pub fn resolve(&self) -> Result<Resolved, GraphError> {
        if self.cleared.get() {
            return Err(GraphError::stale(format!(
                "link to resource {} was cleared",
                self.resource
            )));
        }
        let cell = self.cell.upgrade().ok_or_else(|| {
            GraphError::stale(format!("resource {} no longer exists", self.resource))
        })?;
        let current = cell.generation();
        if current.is_terminal() {
            return Err(GraphError::stale(format!(
                "resource {} was destroyed",
                self.resource
            )));
        }
        Ok(Resolved {
            cell,
            captured: self.generation,
            current,
        })
    }

    /// Like [`BackRef::resolve`] but also requires that no mutation happened
    /// since the link was bound.
    pub fn resolve_exact(&self) -> Result<Resolved, GraphError> {
        let resolved = self.resolve()?;
        if resolved.current != self.generation {
            return Err(GraphError::stale(format!(
                "resource {} moved from generation {} to {}",
                self.resource, self.generation, resolved.current
            )));
        }
        Ok(resolved)
    }

    /// Fresh link to the same resource at its current generation.
    pub fn rebind(&self) -> Result<BackRef, GraphError> {
        let resolved = self.resolve()?;
        Ok(BackRef::bind_cell(&resolved.cell))
    }

    /// Explicit invalidation. Every later resolve fails fast.
    pub fn clear(&self) {
        self.cleared.set(true);
    }

    pub(crate) fn points_at(&self, cell: &Rc<ResourceCell>) -> bool {
        self.resource == cell.id()
    }
}

impl fmt::Debug for BackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackRef")
            .field("resource", &self.resource)
            .field("generation", &self.generation)
            .field("cleared", &self.cleared.get())
            .finish()
    }
}

/// Temporary strong access to a live resource, obtained from [`BackRef::resolve`].
/// Holding it keeps the resource cell allocated but does not postpone an
/// explicit destroy; state access re-checks for that.
pub struct Resolved {
    cell: Rc<ResourceCell>,
    captured: Generation,
    current: Generation,
}

impl Resolved {
    pub fn generation(&self) -> Generation {
        self.current
    }

    pub fn captured(&self) -> Generation {
        self.captured
    }

    pub fn resource_id(&self) -> ResourceId {
        self.cell.id()
    }

    pub fn is_current(&self) -> bool {
        self.captured == self.current
    }

    pub fn state(&self) -> Result<Ref<'_, NativeGraph>, GraphError> {
        self.cell.state()
    }

    pub(crate) fn cell(&self) -> &Rc<ResourceCell> {
        &self.cell
    }
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolved")
            .field("resource", &self.cell.id())
            .field("captured", &self.captured)
            .field("current", &self.current)
            .finish()
    }
}
