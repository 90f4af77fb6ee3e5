//! Quad Region Library - Region Quadtree over a Latitude/Longitude Domain
//!
//! This library provides a region quadtree that recursively splits a fixed
//! rectangular domain into quadrants on demand. Nodes are identified purely by
//! their path from the root and their rectangles are derived from that path,
//! so the index stores nothing but a compact path-to-node table.
//!
//! # Architecture
//!
//! - **[`QuadPath`]**: Bit-packed path (2 bits per level) identifying a node
//! - **[`Bounds`]**: Rectangle arithmetic and the single point-classification rule
//! - **[`SpatialIndex`]**: Node table with locate, subdivide, range query and snapshots
//! - **[`SharedIndex`]**: Reader/writer handle for use from several threads
//! - **[`worker`]**: Async task owning an index and serving requests in order
//! - **[`generate`]**: Random tree growth for fixtures and benchmarks
//!
//! # Performance Characteristics
//!
//! - **Locate**: O(D) where D = depth reached
//! - **Subdivide**: O(1)
//! - **Range query**: O(K) in the number of nodes whose rectangles overlap the query
//! - **Memory**: one small table entry per node, no per-node geometry

mod bounds;
mod codec;
pub mod generate;
mod index;
mod node;
mod path;
mod shared;
pub mod worker;

// Public API exports
pub use bounds::{Bounds, bounds_of};
pub use index::{QuadHit, SpatialIndex};
pub use node::{Node, Payload};
pub use path::{MAX_PATH_DEPTH, PathParseError, QuadPath, Quadrant};
pub use shared::SharedIndex;

use serde::{Deserialize, Serialize};

/// Default number of levels [`SpatialIndex::locate`] descends
pub const DEFAULT_MAX_DEPTH: u8 = 20;

/// Error types for the index
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("Malformed snapshot data: {0}")]
    MalformedData(String),

    #[error("Snapshot encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Index worker has shut down")]
    WorkerClosed,
}

pub type Result<T> = std::result::Result<T, DataError>;

/// Configuration for a spatial index
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Rectangle covered by the root node.
    /// Default: the whole world (90, -90, -180, 180)
    pub bounds: Bounds,
    /// Number of levels `locate` descends before giving up.
    /// Clamped to [`MAX_PATH_DEPTH`]. Default: 20
    pub max_depth: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bounds: Bounds::WORLD,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Config {
    /// Copy with `max_depth` clamped to what a path can represent
    pub fn normalized(self) -> Self {
        Self {
            max_depth: self.max_depth.min(MAX_PATH_DEPTH),
            ..self
        }
    }
}
