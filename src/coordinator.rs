//! Lifetime coordination between a resource and the proxies derived from it.
//!
//! There is no tracing collector underneath this crate, so the two hooks a
//! collector would call are exposed as the [`Trace`] trait and driven by an
//! explicit pass: a [`CycleScope`] adopts a group of objects and, when
//! collected or dropped, traces them, asks each to drop its cycle-forming
//! links, and then drops them in reverse adoption order.
//!
//! None of the crate's own types own each other strongly: a `Graph` caches its
//! views through `Weak` slots and every proxy reaches the graph through a
//! [`crate::BackRef`]. Their `trace` therefore visits nothing, and a scope only
//! reports strong edges introduced by host-side containers.

use crate::{graph::Graph, handle::ElementHandle, seq::Seq};

pub trait Trace {
    /// Calls `visit` once for every object this one owns strongly.
    fn trace(&self, visit: &mut dyn FnMut(&dyn Trace));

    /// Drops links that could take part in a cycle. Called once the group the
    /// object belongs to is known to be unreachable.
    fn release_cycle_refs(&self);
}

impl Trace for Graph {
    fn trace(&self, _visit: &mut dyn FnMut(&dyn Trace)) {}

    fn release_cycle_refs(&self) {
        self.drop_cached_views();
    }
}

impl Trace for Seq {
    fn trace(&self, _visit: &mut dyn FnMut(&dyn Trace)) {}

    fn release_cycle_refs(&self) {
        self.release_link();
    }
}

impl Trace for ElementHandle {
    fn trace(&self, _visit: &mut dyn FnMut(&dyn Trace)) {}

    fn release_cycle_refs(&self) {
        self.release_link();
    }
}

impl<T: Trace> Trace for Vec<T> {
    fn trace(&self, visit: &mut dyn FnMut(&dyn Trace)) {
        for item in self {
            visit(item);
        }
    }

    fn release_cycle_refs(&self) {
        for item in self {
            item.release_cycle_refs();
        }
    }
}

impl<T: Trace> Trace for Option<T> {
    fn trace(&self, visit: &mut dyn FnMut(&dyn Trace)) {
        if let Some(item) = self {
            visit(item);
        }
    }

    fn release_cycle_refs(&self) {
        if let Some(item) = self {
            item.release_cycle_refs();
        }
    }
}

/// Counts strong edges reachable from `root`, descending at most `max_depth`
/// levels. A cycle of strong edges shows up as a count that keeps growing with
/// the depth.
pub fn strong_edges(root: &dyn Trace, max_depth: usize) -> usize {
    fn walk(node: &dyn Trace, depth: usize, max_depth: usize, count: &mut usize) {
        if depth >= max_depth {
            return;
        }
        node.trace(&mut |child| {
            *count += 1;
            walk(child, depth + 1, max_depth, count);
        });
    }
    let mut count = 0;
    walk(root, 0, max_depth, &mut count);
    count
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollectStats {
    pub members: usize,
    pub strong_edges: usize,
    pub released: usize,
}

const TRACE_DEPTH: usize = 8;

/// Explicit cycle-breaking pass run at scope exit.
#[derive(Default)]
pub struct CycleScope {
    members: Vec<Box<dyn Trace>>,
    collected: bool,
}

impl CycleScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn adopt<T: Trace + 'static>(&mut self, member: T) {
        self.members.push(Box::new(member));
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Traces, releases and drops every adopted object.
    pub fn collect(mut self) -> CollectStats {
        self.run()
    }

    fn run(&mut self) -> CollectStats {
        self.collected = true;
        let members = std::mem::take(&mut self.members);
        let strong = members
            .iter()
            .map(|member| strong_edges(member.as_ref(), TRACE_DEPTH))
            .sum();
        for member in &members {
            member.release_cycle_refs();
        }
        let stats = CollectStats {
            members: members.len(),
            strong_edges: strong,
            released: members.len(),
        };
        for member in members.into_iter().rev() {
            drop(member);
        }
        tracing::debug!(
            members = stats.members,
            strong_edges = stats.strong_edges,
            "cycle scope collected"
        );
        stats
    }
}

impl Drop for CycleScope {
    fn drop(&mut self) {
        if !self.collected {
            self.run();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    struct Leaf(Rc<Cell<usize>>);

    impl Trace for Leaf {
        fn trace(&self, _visit: &mut dyn FnMut(&dyn Trace)) {}

        fn release_cycle_refs(&self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_containers_trace_their_items() {
        let hits = Rc::new(Cell::new(0));
        let leaves = vec![Leaf(hits.clone()), Leaf(hits.clone())];
        assert_eq!(strong_edges(&leaves, TRACE_DEPTH), 2);
        leaves.release_cycle_refs();
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_scope_releases_on_drop() {
        let hits = Rc::new(Cell::new(0));
        {
            let mut scope = CycleScope::new();
            scope.adopt(Leaf(hits.clone()));
            scope.adopt(Some(Leaf(hits.clone())));
            assert_eq!(scope.len(), 2);
        }
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_collect_reports_strong_edges() {
        let hits = Rc::new(Cell::new(0));
        let mut scope = CycleScope::new();
        scope.adopt(vec![Leaf(hits.clone()), Leaf(hits.clone()), Leaf(hits.clone())]);
        let stats = scope.collect();
        assert_eq!(stats.members, 1);
        assert_eq!(stats.strong_edges, 3);
        assert_eq!(hits.get(), 3);
    }
}
