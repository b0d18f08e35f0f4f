use std::collections::{BTreeMap, BTreeSet};

use crate::topology::VertexId;

/// Undirected vertex pair, stored with the smaller key first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexPair {
    /// Smaller vertex key.
    pub lo: VertexId,
    /// Larger vertex key.
    pub hi: VertexId,
}

impl VertexPair {
    /// Creates the pair for the edge between `a` and `b`, in either direction.
    #[must_use]
    pub fn new(a: VertexId, b: VertexId) -> Self {
        if a <= b {
            Self { lo: a, hi: b }
        } else {
            Self { lo: b, hi: a }
        }
    }
}

/// Adjacency over the vertices of the non-manifold edges.
///
/// Non-manifold edges usually come in chains (two solids touching along a
/// polyline). Chains are walked as paths between vertices whose degree is
/// not two, so each chain is resolved in one sweep.
#[derive(Debug, Default)]
pub struct EdgeGraph {
    adjacency: BTreeMap<VertexId, BTreeSet<VertexId>>,
}

impl EdgeGraph {
    /// Builds the graph from a set of undirected edges.
    pub fn build<'a>(pairs: impl IntoIterator<Item = &'a VertexPair>) -> Self {
        let mut adjacency: BTreeMap<VertexId, BTreeSet<VertexId>> = BTreeMap::new();
        for pair in pairs {
            if pair.lo == pair.hi {
                continue;
            }
            adjacency.entry(pair.lo).or_default().insert(pair.hi);
            adjacency.entry(pair.hi).or_default().insert(pair.lo);
        }
        Self { adjacency }
    }

    /// Returns `true` once every edge has been removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    fn degree(&self, v: VertexId) -> usize {
        self.adjacency.get(&v).map_or(0, BTreeSet::len)
    }

    /// Walks one maximal path through degree-two vertices.
    ///
    /// Starts from the first vertex (in key order) whose degree is not two;
    /// if every vertex has degree two the graph is a union of cycles and the
    /// walk starts anywhere and returns to its start. Returns the vertices
    /// visited; consecutive entries are the path's edges.
    #[must_use]
    pub fn extract_path(&self) -> Option<Vec<VertexId>> {
        let start = self
            .adjacency
            .keys()
            .copied()
            .find(|&v| self.degree(v) != 2)
            .or_else(|| self.adjacency.keys().next().copied())?;

        let mut path = vec![start];
        let mut prev = start;
        let mut cur = *self.adjacency.get(&start)?.iter().next()?;
        path.push(cur);

        while cur != start && self.degree(cur) == 2 {
            let next = self
                .adjacency
                .get(&cur)?
                .iter()
                .copied()
                .find(|&n| n != prev)?;
            prev = cur;
            cur = next;
            path.push(cur);
        }
        Some(path)
    }

    /// Removes the edges of `path` and any vertices left without edges.
    pub fn remove_path(&mut self, path: &[VertexId]) {
        for w in path.windows(2) {
            let (a, b) = (w[0], w[1]);
            for (x, y) in [(a, b), (b, a)] {
                if let Some(set) = self.adjacency.get_mut(&x) {
                    set.remove(&y);
                    if set.is_empty() {
                        self.adjacency.remove(&x);
                    }
                }
            }
        }
    }
}
