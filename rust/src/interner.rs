//! String interning for arena indexing.
//!
//! Task and resource ids are mapped to dense integer indices so the graph,
//! timings and timelines can live in plain vectors.

use rustc_hash::FxHashMap;

/// Index into a task or resource arena.
pub type ArenaIdx = usize;

/// Interner that maps id strings to dense indices in insertion order.
#[derive(Debug, Clone)]
pub struct IdInterner {
    to_idx: FxHashMap<String, ArenaIdx>,
    from_idx: Vec<String>,
}

impl IdInterner {
    /// Create a new interner with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            to_idx: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            from_idx: Vec::with_capacity(capacity),
        }
    }

    /// Intern a string, returning its index.
    /// If already interned, returns the existing index.
    pub fn intern(&mut self, s: &str) -> ArenaIdx {
        if let Some(&idx) = self.to_idx.get(s) {
            return idx;
        }
        self.push(s)
    }

    /// Intern a string that must not be present yet.
    /// Returns `None` for a duplicate.
    pub fn intern_unique(&mut self, s: &str) -> Option<ArenaIdx> {
        if self.to_idx.contains_key(s) {
            return None;
        }
        Some(self.push(s))
    }

    fn push(&mut self, s: &str) -> ArenaIdx {
        let idx = self.from_idx.len();
        self.from_idx.push(s.to_string());
        self.to_idx.insert(s.to_string(), idx);
        idx
    }

    #[inline]
    pub fn get(&self, s: &str) -> Option<ArenaIdx> {
        self.to_idx.get(s).copied()
    }

    /// Get the string for an index.
    ///
    /// Indices come from this interner, so an out-of-range index is a bug.
    #[inline]
    pub fn resolve(&self, idx: ArenaIdx) -> &str {
        &self.from_idx[idx]
    }

    /// All ids in index order.
    pub fn ids(&self) -> &[String] {
        &self.from_idx
    }

    pub fn len(&self) -> usize {
        self.from_idx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.from_idx.is_empty()
    }
}

impl Default for IdInterner {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}
