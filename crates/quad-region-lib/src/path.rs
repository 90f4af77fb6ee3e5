//! Quadrant codes and bit-packed node paths
//!
//! A node is identified only by the sequence of quadrants taken from the root.
//! Each step is a 2-bit code (vertical bit, horizontal bit), so a whole path
//! fits in a single `u64` plus a depth byte. The textual form used in saved
//! snapshots spells every step as two characters, e.g. `"0110"` is TopRight
//! followed by BottomLeft.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Deepest level a [`QuadPath`] can represent (2 bits per level in a `u64`)
pub const MAX_PATH_DEPTH: u8 = 32;

/// One of the four quadrants of a node
///
/// The discriminant is the 2-bit code: the high bit is set for the southern
/// half, the low bit for the eastern half.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Quadrant {
    TopLeft = 0b00,
    TopRight = 0b01,
    BottomLeft = 0b10,
    BottomRight = 0b11,
}

impl Quadrant {
    /// All quadrants in traversal order
    pub const ALL: [Quadrant; 4] = [
        Quadrant::TopLeft,
        Quadrant::TopRight,
        Quadrant::BottomLeft,
        Quadrant::BottomRight,
    ];

    /// Build a quadrant from its two halves
    #[inline]
    pub fn from_halves(north: bool, east: bool) -> Self {
        match (north, east) {
            (true, false) => Quadrant::TopLeft,
            (true, true) => Quadrant::TopRight,
            (false, false) => Quadrant::BottomLeft,
            (false, true) => Quadrant::BottomRight,
        }
    }

    /// Decode the low two bits of `code`
    #[inline]
    pub fn from_bits(code: u8) -> Self {
        match code & 0b11 {
            0b00 => Quadrant::TopLeft,
            0b01 => Quadrant::TopRight,
            0b10 => Quadrant::BottomLeft,
            _ => Quadrant::BottomRight,
        }
    }

    #[inline]
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// True for the northern half (TopLeft, TopRight)
    #[inline]
    pub fn is_north(self) -> bool {
        self.bits() & 0b10 == 0
    }

    /// True for the eastern half (TopRight, BottomRight)
    #[inline]
    pub fn is_east(self) -> bool {
        self.bits() & 0b01 != 0
    }

    /// Two-character form used in the textual path
    pub fn as_str(self) -> &'static str {
        match self {
            Quadrant::TopLeft => "00",
            Quadrant::TopRight => "01",
            Quadrant::BottomLeft => "10",
            Quadrant::BottomRight => "11",
        }
    }
}

/// Error returned when a textual path cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathParseError {
    #[error("path has odd length {0}, expected two characters per level")]
    OddLength(usize),

    #[error("invalid character {0:?} in path, expected '0' or '1'")]
    InvalidChar(char),

    #[error("path depth {0} exceeds the maximum of {MAX_PATH_DEPTH}")]
    TooDeep(usize),
}

/// Position of a node in the tree, packed as 2 bits per level
///
/// The most recent step lives in the lowest bits, so the parent is a plain
/// shift and ancestor tests are a shift-and-compare. Equality and hashing
/// include the depth, which keeps the root distinct from `TopLeft...TopLeft`.
/// The ordering is arbitrary but total, which is enough for stable sorting.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QuadPath {
    bits: u64,
    depth: u8,
}

impl QuadPath {
    /// The empty path
    pub const ROOT: QuadPath = QuadPath { bits: 0, depth: 0 };

    #[inline]
    pub fn depth(&self) -> u8 {
        self.depth
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.depth == 0
    }

    /// Path of the given child, or `None` at [`MAX_PATH_DEPTH`]
    #[inline]
    pub fn child(&self, quadrant: Quadrant) -> Option<QuadPath> {
        if self.depth >= MAX_PATH_DEPTH {
            return None;
        }
        Some(QuadPath {
            bits: (self.bits << 2) | u64::from(quadrant.bits()),
            depth: self.depth + 1,
        })
    }

    /// All four children in traversal order
    pub fn children(&self) -> Option<[QuadPath; 4]> {
        if self.depth >= MAX_PATH_DEPTH {
            return None;
        }
        Some(Quadrant::ALL.map(|q| QuadPath {
            bits: (self.bits << 2) | u64::from(q.bits()),
            depth: self.depth + 1,
        }))
    }

    #[inline]
    pub fn parent(&self) -> Option<QuadPath> {
        if self.is_root() {
            return None;
        }
        Some(QuadPath {
            bits: self.bits >> 2,
            depth: self.depth - 1,
        })
    }

    /// The step taken to reach this node from its parent
    #[inline]
    pub fn last(&self) -> Option<Quadrant> {
        if self.is_root() {
            return None;
        }
        Some(Quadrant::from_bits((self.bits & 0b11) as u8))
    }

    /// Quadrant at `level` (0 = first step below the root)
    pub fn get(&self, level: u8) -> Option<Quadrant> {
        if level >= self.depth {
            return None;
        }
        let shift = 2 * u32::from(self.depth - 1 - level);
        Some(Quadrant::from_bits(((self.bits >> shift) & 0b11) as u8))
    }

    /// Steps from the root down to this node
    pub fn iter(&self) -> impl Iterator<Item = Quadrant> + '_ {
        (0..self.depth).filter_map(move |level| self.get(level))
    }

    /// True if `self` is a (non-strict) prefix of `other`
    pub fn is_ancestor_of(&self, other: &QuadPath) -> bool {
        if self.depth > other.depth {
            return false;
        }
        // Shifting a full-depth path by 64 bits overflows; only the root matches then
        let shift = 2 * u32::from(other.depth - self.depth);
        other.bits.checked_shr(shift).unwrap_or(0) == self.bits
    }
}

impl FromIterator<Quadrant> for QuadPath {
    /// Steps past [`MAX_PATH_DEPTH`] are dropped
    fn from_iter<I: IntoIterator<Item = Quadrant>>(iter: I) -> Self {
        let mut path = QuadPath::ROOT;
        for quadrant in iter {
            match path.child(quadrant) {
                Some(next) => path = next,
                None => break,
            }
        }
        path
    }
}

impl fmt::Display for QuadPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for quadrant in self.iter() {
            f.write_str(quadrant.as_str())?;
        }
        Ok(())
    }
}

impl fmt::Debug for QuadPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuadPath({:?})", self.to_string())
    }
}

impl FromStr for QuadPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(c) = s.chars().find(|c| *c != '0' && *c != '1') {
            return Err(PathParseError::InvalidChar(c));
        }
        let bytes = s.as_bytes();
        if bytes.len() % 2 != 0 {
            return Err(PathParseError::OddLength(bytes.len()));
        }
        let depth = bytes.len() / 2;
        if depth > usize::from(MAX_PATH_DEPTH) {
            return Err(PathParseError::TooDeep(depth));
        }

        Ok(bytes
            .chunks_exact(2)
            .map(|pair| Quadrant::from_halves(pair[0] == b'0', pair[1] == b'1'))
            .collect())
    }
}

impl TryFrom<String> for QuadPath {
    type Error = PathParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<QuadPath> for String {
    fn from(path: QuadPath) -> Self {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quadrant_codes_match_text_form() {
        for q in Quadrant::ALL {
            let text = q.as_str().as_bytes();
            assert_eq!(q.is_north(), text[0] == b'0');
            assert_eq!(q.is_east(), text[1] == b'1');
            assert_eq!(Quadrant::from_halves(q.is_north(), q.is_east()), q);
        }
    }

    #[test]
    fn test_root_is_empty_string() {
        assert_eq!(QuadPath::ROOT.to_string(), "");
        assert_eq!("".parse::<QuadPath>().unwrap(), QuadPath::ROOT);
        assert!(QuadPath::ROOT.parent().is_none());
        assert!(QuadPath::ROOT.last().is_none());
    }

    #[test]
    fn test_parse_and_display() {
        let path: QuadPath = "011000".parse().unwrap();
        assert_eq!(path.depth(), 3);
        assert_eq!(
            path.iter().collect::<Vec<_>>(),
            vec![Quadrant::TopRight, Quadrant::BottomLeft, Quadrant::TopLeft]
        );
        assert_eq!(path.to_string(), "011000");
    }

    #[test]
    fn test_root_differs_from_top_left_chain() {
        let tl: QuadPath = "0000".parse().unwrap();
        assert_ne!(tl, QuadPath::ROOT);
        assert_ne!(tl.parent().unwrap(), QuadPath::ROOT);
        assert_eq!(tl.parent().unwrap().parent().unwrap(), QuadPath::ROOT);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("010".parse::<QuadPath>(), Err(PathParseError::OddLength(3)));
        assert_eq!(
            "0a".parse::<QuadPath>(),
            Err(PathParseError::InvalidChar('a'))
        );
        let too_deep = "01".repeat(33);
        assert_eq!(
            too_deep.parse::<QuadPath>(),
            Err(PathParseError::TooDeep(33))
        );
        assert!("01".repeat(32).parse::<QuadPath>().is_ok());
    }

    #[test]
    fn test_children_and_parent() {
        let path: QuadPath = "11".parse().unwrap();
        let children = path.children().unwrap();
        let text: Vec<String> = children.iter().map(|c| c.to_string()).collect();
        assert_eq!(text, vec!["1100", "1101", "1110", "1111"]);
        for (child, q) in children.iter().zip(Quadrant::ALL) {
            assert_eq!(child.parent(), Some(path));
            assert_eq!(child.last(), Some(q));
        }
    }

    #[test]
    fn test_max_depth_has_no_children() {
        let deepest: QuadPath = "11".repeat(32).parse().unwrap();
        assert_eq!(deepest.depth(), MAX_PATH_DEPTH);
        assert!(deepest.children().is_none());
        assert!(deepest.child(Quadrant::TopLeft).is_none());
        assert_eq!(deepest.to_string(), "11".repeat(32));
    }

    #[test]
    fn test_ancestry() {
        let a: QuadPath = "01".parse().unwrap();
        let b: QuadPath = "0110".parse().unwrap();
        let c: QuadPath = "0010".parse().unwrap();
        assert!(a.is_ancestor_of(&b));
        assert!(a.is_ancestor_of(&a));
        assert!(!b.is_ancestor_of(&a));
        assert!(!a.is_ancestor_of(&c));
        assert!(QuadPath::ROOT.is_ancestor_of(&c));

        let deepest: QuadPath = "10".repeat(32).parse().unwrap();
        assert!(QuadPath::ROOT.is_ancestor_of(&deepest));
    }

    #[test]
    fn test_serde_as_string() {
        let path: QuadPath = "1001".parse().unwrap();
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"1001\"");
        let back: QuadPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
        assert!(serde_json::from_str::<QuadPath>("\"102\"").is_err());
    }
}
