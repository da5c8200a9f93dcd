//! Re-indexing history kept by a resource so that element handles can follow
//! their element across compacting removals and permutations.
//!
//! The history is bounded. Once it holds more entries than its capacity the
//! oldest ones are evicted, and a link captured before the newest evicted
//! entry can no longer be followed.

use std::collections::VecDeque;

use crate::backref::Generation;

/// Remaps kept per element kind unless a graph is configured otherwise.
pub const DEFAULT_REINDEX_HISTORY: usize = 256;

/// How one mutation moved the indices of a single element kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Remap {
    /// Sorted, de-duplicated indices that were removed. Survivors shift down.
    Removed(Vec<usize>),
    /// `permutation[old] == new`.
    Permuted(Vec<usize>),
}

impl Remap {
    pub fn removed(mut indices: Vec<usize>) -> Self {
        indices.sort_unstable();
        indices.dedup();
        Remap::Removed(indices)
    }

    /// Maps a pre-mutation index to its post-mutation position, or `None` if
    /// the element no longer exists.
    pub fn apply(&self, index: usize) -> Option<usize> {
        match self {
            Remap::Removed(removed) => match removed.binary_search(&index) {
                Ok(_) => None,
                Err(shift) => Some(index - shift),
            },
            Remap::Permuted(permutation) => Some(permutation.get(index).copied().unwrap_or(index)),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Remap::Removed(removed) => removed.is_empty(),
            Remap::Permuted(permutation) => permutation.iter().enumerate().all(|(i, &p)| i == p),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Followed {
    At(usize),
    Removed { generation: Generation },
    /// The remaps needed to follow the index were evicted. `horizon` is the
    /// oldest generation a link may have been captured at to still follow.
    Expired { horizon: Generation },
}

#[derive(Debug)]
pub struct ReindexLog {
    entries: VecDeque<(Generation, Remap)>,
    capacity: usize,
    horizon: Generation,
}

impl Default for ReindexLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_REINDEX_HISTORY)
    }
}

impl ReindexLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
            horizon: Generation::new(0),
        }
    }

    pub fn record(&mut self, generation: Generation, remap: Remap) {
        if remap.is_empty() {
            return;
        }
        self.entries.push_back((generation, remap));
        while self.entries.len() > self.capacity {
            if let Some((evicted, _)) = self.entries.pop_front() {
                self.horizon = evicted;
            }
        }
    }

    /// Follows `index`, captured at generation `since`, through every later remap.
    pub fn follow(&self, index: usize, since: Generation) -> Followed {
        if since < self.horizon {
            return Followed::Expired {
                horizon: self.horizon,
            };
        }
        let start = self
            .entries
            .partition_point(|(generation, _)| *generation <= since);
        let mut current = index;
        for (generation, remap) in self.entries.range(start..) {
            match remap.apply(current) {
                Some(next) => current = next,
                None => {
                    return Followed::Removed {
                        generation: *generation,
                    };
                }
            }
        }
        Followed::At(current)
    }

    /// Oldest capture generation that can still be followed.
    pub fn horizon(&self) -> Generation {
        self.horizon
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
