//! `PositionCache` – where each entity stood before its pending move.
//!
//! The host's "move happened" notification no longer carries the starting
//! position, so the "about to move" notification stashes it here. Entries are
//! ephemeral: never persisted, gone after the matching move is coordinated.

use crate::types::{EntityId, Point};
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct PositionCache {
    entries: Mutex<HashMap<EntityId, Point>>,
}

impl PositionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the pre-move position. A second call before the entry is
    /// consumed overwrites it.
    pub fn register(&self, entity_id: impl Into<EntityId>, position: Point) {
        self.entries.lock().insert(entity_id.into(), position);
    }

    pub fn get(&self, entity_id: &str) -> Option<Point> {
        self.entries.lock().get(entity_id).copied()
    }

    pub fn remove(&self, entity_id: &str) -> Option<Point> {
        self.entries.lock().remove(entity_id)
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.entries.lock().contains_key(entity_id)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop every entry (scene teardown).
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

/// Removes an entity's entry when dropped, so cleanup happens on every exit
/// path of a coordinate cycle, including errors and cancellation.
pub(crate) struct CacheCleanup<'a> {
    cache: &'a PositionCache,
    entity_id: &'a str,
}

impl<'a> CacheCleanup<'a> {
    pub(crate) fn new(cache: &'a PositionCache, entity_id: &'a str) -> Self {
        Self { cache, entity_id }
    }
}

impl Drop for CacheCleanup<'_> {
    fn drop(&mut self) {
        self.cache.remove(self.entity_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_remove() {
        let c = PositionCache::new();
        assert!(c.is_empty());

        c.register("tok1", Point::new(10.0, 10.0));
        assert_eq!(c.len(), 1);
        assert_eq!(c.get("tok1"), Some(Point::new(10.0, 10.0)));

        assert_eq!(c.remove("tok1"), Some(Point::new(10.0, 10.0)));
        assert!(!c.contains("tok1"));
    }

    #[test]
    fn second_register_overwrites() {
        let c = PositionCache::new();
        c.register("tok1", Point::new(1.0, 1.0));
        c.register("tok1", Point::new(2.0, 2.0));
        assert_eq!(c.len(), 1);
        assert_eq!(c.get("tok1"), Some(Point::new(2.0, 2.0)));
    }

    #[test]
    fn remove_missing_is_noop() {
        let c = PositionCache::new();
        assert_eq!(c.remove("ghost"), None);
        assert_eq!(c.len(), 0);
    }

    #[test]
    fn cleanup_guard_removes_on_drop() {
        let c = PositionCache::new();
        c.register("tok1", Point::new(0.0, 0.0));
        c.register("tok2", Point::new(0.0, 0.0));
        {
            let _guard = CacheCleanup::new(&c, "tok1");
            assert!(c.contains("tok1"));
        }
        assert!(!c.contains("tok1"));
        assert!(c.contains("tok2"));
    }
}
