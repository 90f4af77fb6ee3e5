//! Whole-tree snapshot format
//!
//! Snapshots are JSON documents of the form
//!
//! ```json
//! {
//!   "bounds": { "north": 90.0, "south": -90.0, "west": -180.0, "east": 180.0 },
//!   "nodes": { "": { "isLeaf": false }, "00": { "isLeaf": true, "value": 0 } }
//! }
//! ```
//!
//! `bounds` is always written but optional when reading, so files that only
//! carry `nodes` still load. Decoding builds the complete table before anyone
//! gets to see it; a failure never leaves a half-imported tree behind.

use crate::{Bounds, DataError, Node, Payload, QuadPath, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Serialized form of a single node
#[derive(Serialize, Deserialize)]
struct NodeRecord {
    #[serde(rename = "isLeaf")]
    is_leaf: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Payload>,
}

impl From<Node> for NodeRecord {
    fn from(node: Node) -> Self {
        Self {
            is_leaf: node.is_leaf(),
            value: node.payload(),
        }
    }
}

impl From<NodeRecord> for Node {
    fn from(record: NodeRecord) -> Self {
        if record.is_leaf {
            Node::Leaf(record.value.unwrap_or_default())
        } else {
            Node::Internal
        }
    }
}

#[derive(Serialize)]
struct SnapshotOut {
    bounds: Bounds,
    /// Sorted by textual path so exports are stable and read top-down
    nodes: BTreeMap<String, NodeRecord>,
}

#[derive(Deserialize)]
struct SnapshotIn {
    #[serde(default)]
    bounds: Option<Bounds>,
    nodes: HashMap<QuadPath, NodeRecord>,
}

/// A decoded node table, ready to be swapped into an index
#[derive(Debug)]
pub(crate) struct Snapshot {
    pub(crate) bounds: Option<Bounds>,
    pub(crate) nodes: HashMap<QuadPath, Node>,
}

#[cfg_attr(feature = "profiling", profiling::function)]
pub(crate) fn encode(bounds: Bounds, nodes: &HashMap<QuadPath, Node>) -> Result<Vec<u8>> {
    let snapshot = SnapshotOut {
        bounds,
        nodes: nodes
            .iter()
            .map(|(path, node)| (path.to_string(), NodeRecord::from(*node)))
            .collect(),
    };
    Ok(serde_json::to_vec(&snapshot)?)
}

#[cfg_attr(feature = "profiling", profiling::function)]
pub(crate) fn decode(data: &[u8]) -> Result<Snapshot> {
    let raw: SnapshotIn =
        serde_json::from_slice(data).map_err(|e| DataError::MalformedData(e.to_string()))?;

    if let Some(b) = raw.bounds {
        if !(b.north >= b.south && b.east >= b.west) {
            return Err(DataError::MalformedData(format!(
                "degenerate domain bounds {b:?}"
            )));
        }
    }

    Ok(Snapshot {
        bounds: raw.bounds,
        nodes: raw
            .nodes
            .into_iter()
            .map(|(path, record)| (path, Node::from(record)))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> QuadPath {
        s.parse().unwrap()
    }

    #[test]
    fn test_decode_legacy_file_without_bounds() {
        let data = br#"{"nodes":{"":{"isLeaf":false},"00":{"isLeaf":true,"value":3},"01":{"isLeaf":true,"value":0}}}"#;
        let snapshot = decode(data).unwrap();
        assert!(snapshot.bounds.is_none());
        assert_eq!(snapshot.nodes.len(), 3);
        assert_eq!(snapshot.nodes[&QuadPath::ROOT], Node::Internal);
        assert_eq!(snapshot.nodes[&path("00")], Node::Leaf(3));
    }

    #[test]
    fn test_missing_value_defaults_to_zero() {
        let snapshot = decode(br#"{"nodes":{"10":{"isLeaf":true}}}"#).unwrap();
        assert_eq!(snapshot.nodes[&path("10")], Node::Leaf(0));
    }

    #[test]
    fn test_internal_value_is_ignored() {
        let snapshot = decode(br#"{"nodes":{"":{"isLeaf":false,"value":9}}}"#).unwrap();
        assert_eq!(snapshot.nodes[&QuadPath::ROOT], Node::Internal);
    }

    #[test]
    fn test_malformed_inputs() {
        let cases: [&[u8]; 7] = [
            b"not valid data",
            b"{}",
            br#"{"nodes":[]}"#,
            br#"{"nodes":{"012":{"isLeaf":true}}}"#,
            br#"{"nodes":{"00":{"isLeaf":true,"value":300}}}"#,
            br#"{"nodes":{"00":{"value":1}}}"#,
            br#"{"bounds":{"north":-10,"south":10,"west":0,"east":1},"nodes":{}}"#,
        ];
        for data in cases {
            let err = decode(data).unwrap_err();
            assert!(
                matches!(err, DataError::MalformedData(_)),
                "{:?} gave {err:?}",
                String::from_utf8_lossy(data)
            );
        }
    }

    #[test]
    fn test_encode_is_sorted_and_omits_internal_values() {
        let mut nodes = HashMap::new();
        nodes.insert(path("01"), Node::Leaf(7));
        nodes.insert(QuadPath::ROOT, Node::Internal);
        nodes.insert(path("00"), Node::Leaf(0));

        let bytes = encode(Bounds::WORLD, &nodes).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text,
            r#"{"bounds":{"north":90.0,"south":-90.0,"west":-180.0,"east":180.0},"nodes":{"":{"isLeaf":false},"00":{"isLeaf":true,"value":0},"01":{"isLeaf":true,"value":7}}}"#
        );
    }
}
