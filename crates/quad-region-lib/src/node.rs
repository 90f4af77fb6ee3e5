//! Node variants stored in the table

/// Per-leaf payload (e.g. a classification value)
pub type Payload = u8;

/// A single entry of the node table
///
/// Internal nodes carry no payload; their four children are implied by the
/// path and may be missing from the table, in which case they behave like
/// `Node::default()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Node {
    Leaf(Payload),
    Internal,
}

impl Node {
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    /// Payload of a leaf, `None` for internal nodes
    #[inline]
    pub fn payload(&self) -> Option<Payload> {
        match self {
            Node::Leaf(value) => Some(*value),
            Node::Internal => None,
        }
    }
}

impl Default for Node {
    fn default() -> Self {
        Node::Leaf(0)
    }
}
