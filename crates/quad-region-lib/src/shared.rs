//! Thread-safe handle around a [`SpatialIndex`]
//!
//! Readers (`locate`, `query_range`, `export`) share the lock; `subdivide` and
//! `import` take it exclusively, so a subdivision's four new children and the
//! parent's conversion become visible together. Imports are decoded before the
//! write lock is taken, keeping the exclusive section to a table swap.

use crate::{Bounds, QuadHit, QuadPath, Result, SpatialIndex, codec};
use geo::Point;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Cloneable, shared spatial index
#[derive(Debug, Clone, Default)]
pub struct SharedIndex {
    inner: Arc<RwLock<SpatialIndex>>,
}

impl SharedIndex {
    pub fn new(index: SpatialIndex) -> Self {
        Self {
            inner: Arc::new(RwLock::new(index)),
        }
    }

    /// Shared access to the underlying index
    pub fn read(&self) -> RwLockReadGuard<'_, SpatialIndex> {
        self.inner.read().unwrap_or_else(|poisoned| {
            tracing::warn!("Spatial index lock poisoned; recovering");
            poisoned.into_inner()
        })
    }

    /// Exclusive access to the underlying index
    pub fn write(&self) -> RwLockWriteGuard<'_, SpatialIndex> {
        self.inner.write().unwrap_or_else(|poisoned| {
            tracing::warn!("Spatial index lock poisoned; recovering");
            poisoned.into_inner()
        })
    }

    pub fn locate(&self, point: Point<f64>) -> QuadPath {
        self.read().locate(point)
    }

    pub fn query_range(&self, query: &Bounds) -> Vec<QuadHit> {
        self.read().query_range(query)
    }

    pub fn export(&self) -> Result<Vec<u8>> {
        self.read().export()
    }

    pub fn subdivide(&self, path: &QuadPath) -> bool {
        self.write().subdivide(path)
    }

    /// Locate and subdivide under a single write lock
    pub fn subdivide_at(&self, point: Point<f64>) -> Option<QuadPath> {
        self.write().subdivide_at(point)
    }

    pub fn import(&self, data: &[u8]) -> Result<()> {
        let snapshot = codec::decode(data)?;
        self.write().restore(snapshot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Node;
    use std::thread;

    #[test]
    fn test_clones_share_state() {
        let shared = SharedIndex::default();
        let other = shared.clone();
        assert!(shared.subdivide(&QuadPath::ROOT));
        assert_eq!(other.read().node(&QuadPath::ROOT), Some(Node::Internal));
        assert_eq!(other.locate(Point::new(10.0, 10.0)).to_string(), "01");
    }

    #[test]
    fn test_failed_import_keeps_state() {
        let shared = SharedIndex::default();
        shared.subdivide(&QuadPath::ROOT);
        let before = shared.export().unwrap();
        assert!(shared.import(b"{\"nodes\": 5}").is_err());
        assert_eq!(shared.export().unwrap(), before);
    }

    #[test]
    fn test_readers_never_see_partial_subdivision() {
        let shared = SharedIndex::default();
        let writer = {
            let shared = shared.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    shared.subdivide_at(Point::new(-120.0, 30.0));
                }
            })
        };

        for _ in 0..200 {
            let index = shared.read();
            // Every internal node always has all four children
            for (path, node) in index.iter() {
                if *node == Node::Internal {
                    for child in path.children().unwrap() {
                        assert!(index.node(&child).is_some(), "missing {child}");
                    }
                }
            }
        }
        writer.join().unwrap();
    }
}
