//! The resource: sole owner of a native graph structure and its lifecycle.

mod resource;
mod types;

pub use resource::{Graph, ReleaseEvent};
pub(crate) use resource::ResourceCell;
pub use types::{Bounds, ElementKind, GraphSpec, Mutation};
