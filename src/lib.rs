//! Ownership substrate for exposing one graph resource through derived proxies.
//!
//! A [`Graph`] exclusively owns its native structure. Vertex and edge views
//! ([`VertexSeq`], [`EdgeSeq`]) and element handles ([`ElementHandle`]) only
//! reach it through generation-checked [`BackRef`]s, so no proxy keeps the
//! structure alive and no strong cycle ever includes the object that frees it.
//! Run Criterion benchmarks with `cargo bench` to inspect reports under `target/criterion`.

pub mod backref;
pub mod bench_utils;
pub mod config;
pub mod constants;
pub mod coordinator;
pub mod errors;
pub mod filter;
pub mod graph;
pub mod handle;
pub mod native;
pub mod reindex;
pub mod runtime;
pub mod seq;

pub use crate::backref::{BackRef, Generation, Resolved, ResourceId};
pub use crate::config::GraphConfig;
pub use crate::constants::{AdjacencyLayout, Connectedness, NeighborMode, StarMode, TreeMode};
pub use crate::coordinator::{CollectStats, CycleScope, Trace};
pub use crate::errors::GraphError;
pub use crate::filter::{CmpOp, Predicate};
pub use crate::graph::{Bounds, ElementKind, Graph, GraphSpec, Mutation, ReleaseEvent};
pub use crate::handle::{EdgeData, ElementData, ElementHandle, VertexData};
pub use crate::runtime::{LifetimeStats, RuntimeConfig};
pub use crate::seq::{EdgeSeq, Seq, SeqIter, VertexSeq};
