//! Region quadtree spatial index
//!
//! The tree is a flat table from [`QuadPath`] to [`Node`]. Geometry is never
//! stored: every rectangle is derived from the domain bounds and the path,
//! either all at once with [`bounds_of`] or step by step while walking down.
//!
//! Absent entries are treated as default leaves. An internal node whose
//! children were never written (or were dropped from an imported snapshot)
//! therefore still locates and queries cleanly, bottoming out at the missing
//! child.

use crate::codec::{self, Snapshot};
use crate::{Bounds, Config, Node, QuadPath, Result, bounds_of};
use geo::Point;
use std::collections::HashMap;

/// One node reported by [`SpatialIndex::query_range`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadHit {
    pub path: QuadPath,
    /// Derived rectangle of the node
    pub bounds: Bounds,
    pub node: Node,
    /// True when the path is missing from the table and reported as a default leaf
    pub implicit: bool,
}

impl QuadHit {
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.node.is_leaf()
    }
}

/// Region quadtree over a fixed latitude/longitude domain
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    /// Node table, keyed by path; the root is `QuadPath::ROOT`
    nodes: HashMap<QuadPath, Node>,
    config: Config,
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl SpatialIndex {
    /// Create an index holding a single root leaf
    pub fn new(config: Config) -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(QuadPath::ROOT, Node::default());
        Self {
            nodes,
            config: config.normalized(),
        }
    }

    /// Build an index straight from a snapshot produced by [`SpatialIndex::export`]
    pub fn from_bytes(config: Config, data: &[u8]) -> Result<Self> {
        let mut index = Self::new(config);
        index.import(data)?;
        Ok(index)
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Rectangle covered by the root
    #[inline]
    pub fn bounds(&self) -> Bounds {
        self.config.bounds
    }

    /// Number of entries in the node table
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of stored leaves
    pub fn leaf_count(&self) -> usize {
        self.nodes.values().filter(|n| n.is_leaf()).count()
    }

    /// Depth of the deepest stored node
    pub fn depth(&self) -> u8 {
        self.nodes.keys().map(QuadPath::depth).max().unwrap_or(0)
    }

    /// Stored node at `path`, if any
    #[inline]
    pub fn node(&self, path: &QuadPath) -> Option<Node> {
        self.nodes.get(path).copied()
    }

    /// Whether `path` behaves as a leaf; absent paths count as default leaves
    #[inline]
    pub fn is_leaf(&self, path: &QuadPath) -> bool {
        self.nodes.get(path).is_none_or(Node::is_leaf)
    }

    /// All stored entries, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&QuadPath, &Node)> {
        self.nodes.iter()
    }

    /// Derived rectangle of `path`
    #[inline]
    pub fn bounds_of(&self, path: &QuadPath) -> Bounds {
        bounds_of(self.config.bounds, path)
    }

    /// Path of the leaf containing `point`, descending at most the configured depth
    ///
    /// `point.x()` is longitude and `point.y()` latitude.
    pub fn locate(&self, point: Point<f64>) -> QuadPath {
        self.locate_with_depth(point, self.config.max_depth)
    }

    /// Like [`SpatialIndex::locate`] with an explicit depth limit
    ///
    /// Returns the first absent or leaf path on the way down, or the path
    /// reached after `max_depth` steps if internal nodes continue below it.
    pub fn locate_with_depth(&self, point: Point<f64>, max_depth: u8) -> QuadPath {
        let mut path = QuadPath::ROOT;
        let mut bounds = self.config.bounds;

        for _ in 0..max_depth {
            if self.is_leaf(&path) {
                break;
            }
            let quadrant = bounds.classify(point);
            match path.child(quadrant) {
                Some(child) => {
                    path = child;
                    bounds = bounds.quadrant(quadrant);
                }
                None => break,
            }
        }

        path
    }

    /// Split the leaf at `path` into four default leaves
    ///
    /// Absent and internal paths are left alone, as are leaves at the deepest
    /// representable level. Returns whether the table changed.
    pub fn subdivide(&mut self, path: &QuadPath) -> bool {
        let Some(Node::Leaf(_)) = self.nodes.get(path) else {
            tracing::trace!(%path, "subdivide ignored: not a stored leaf");
            return false;
        };
        let Some(children) = path.children() else {
            tracing::warn!(%path, "subdivide ignored: path is at the maximum depth");
            return false;
        };

        self.nodes.insert(*path, Node::Internal);
        for child in children {
            self.nodes.insert(child, Node::default());
        }
        tracing::debug!(%path, nodes = self.nodes.len(), "subdivided node");
        true
    }

    /// Locate the leaf under `point` and subdivide it
    ///
    /// Returns the subdivided path, or `None` if the located path could not be
    /// split (absent from the table, or the depth limit stopped on an internal node).
    pub fn subdivide_at(&mut self, point: Point<f64>) -> Option<QuadPath> {
        let path = self.locate(point);
        self.subdivide(&path).then_some(path)
    }

    /// All leaves (stored or implicit) whose rectangles intersect `query`
    ///
    /// Results are in pre-order with children visited TopLeft, TopRight,
    /// BottomLeft, BottomRight. Internal nodes are walked but never reported,
    /// and subtrees whose rectangles are disjoint from `query` are skipped.
    pub fn query_range(&self, query: &Bounds) -> Vec<QuadHit> {
        let mut results = Vec::new();
        self.collect_range(QuadPath::ROOT, self.config.bounds, query, &mut results);
        results
    }

    fn collect_range(
        &self,
        path: QuadPath,
        bounds: Bounds,
        query: &Bounds,
        results: &mut Vec<QuadHit>,
    ) {
        if !bounds.cell_intersects(query, &self.config.bounds) {
            return;
        }

        let node = self.nodes.get(&path).copied();
        let children = match node {
            Some(Node::Internal) => path.children(),
            _ => None,
        };

        match children {
            Some(children) => {
                for (child, child_bounds) in children.into_iter().zip(bounds.split()) {
                    self.collect_range(child, child_bounds, query, results);
                }
            }
            // Leaves, absent paths, and internal nodes too deep to have children
            None => results.push(QuadHit {
                path,
                bounds,
                node: node.unwrap_or_default(),
                implicit: node.is_none(),
            }),
        }
    }

    /// Serialize the whole table (and the domain bounds)
    pub fn export(&self) -> Result<Vec<u8>> {
        codec::encode(self.config.bounds, &self.nodes)
    }

    /// Replace the whole table with a snapshot
    ///
    /// On error the current table is kept as it was. The snapshot's bounds,
    /// when present, replace the domain bounds. Tree shape is not validated:
    /// orphaned paths are kept and simply never reached.
    pub fn import(&mut self, data: &[u8]) -> Result<()> {
        let snapshot = codec::decode(data)?;
        self.restore(snapshot);
        Ok(())
    }

    /// Swap in an already decoded snapshot
    pub(crate) fn restore(&mut self, snapshot: Snapshot) {
        if let Some(bounds) = snapshot.bounds {
            self.config.bounds = bounds;
        }
        self.nodes = snapshot.nodes;
        tracing::debug!(nodes = self.nodes.len(), "imported node table");
    }
}
