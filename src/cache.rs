//! Compiled template caches.
//!
//! The engine always keeps the programs it compiled in memory for its own
//! lifetime. A [`Cache`] additionally lets compiled programs outlive a single
//! engine, or be shared between engines with the same configuration.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::types::program::{Key, Program};

/// Stores and retrieves compiled programs by their identity key.
pub trait Cache: Send + Sync {
    /// Returns a previously cached program.
    fn load(&self, key: &Key) -> Option<Arc<Program>>;

    /// Stores a newly compiled program.
    fn cache(&self, key: &Key, program: Arc<Program>);
}

impl<C> Cache for Arc<C>
where
    C: Cache + ?Sized,
{
    fn load(&self, key: &Key) -> Option<Arc<Program>> {
        (**self).load(key)
    }

    fn cache(&self, key: &Key, program: Arc<Program>) {
        (**self).cache(key, program)
    }
}

/// A cache that never stores anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

impl Cache for NoopCache {
    fn load(&self, _: &Key) -> Option<Arc<Program>> {
        None
    }

    fn cache(&self, _: &Key, _: Arc<Program>) {}
}

/// An in-memory cache, share it between engines using an [`Arc`].
#[derive(Debug, Default)]
pub struct MemoryCache {
    programs: RwLock<HashMap<Key, Arc<Program>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of cached programs.
    pub fn len(&self) -> usize {
        self.programs.read().len()
    }

    /// Returns whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.programs.read().is_empty()
    }
}

impl Cache for MemoryCache {
    fn load(&self, key: &Key) -> Option<Arc<Program>> {
        self.programs.read().get(key).cloned()
    }

    fn cache(&self, key: &Key, program: Arc<Program>) {
        self.programs.write().entry(*key).or_insert(program);
    }
}
