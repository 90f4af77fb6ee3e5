//! Rectangle arithmetic shared by every tree walk
//!
//! Node rectangles are never stored. They are rebuilt by halving the domain
//! along a path, and the halving and point classification both live here so
//! that locate, range queries and bounds derivation always agree on which
//! side of a midpoint a coordinate falls.
//!
//! Points use the `geo` convention: `x` is longitude, `y` is latitude.

use crate::path::{QuadPath, Quadrant};
use geo::{Coord, Point, Rect};
use serde::{Deserialize, Serialize};

/// Axis-aligned latitude/longitude rectangle
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub north: f64,
    pub south: f64,
    pub west: f64,
    pub east: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::WORLD
    }
}

impl Bounds {
    /// The whole globe
    pub const WORLD: Bounds = Bounds {
        north: 90.0,
        south: -90.0,
        west: -180.0,
        east: 180.0,
    };

    pub const fn new(north: f64, south: f64, west: f64, east: f64) -> Self {
        Self {
            north,
            south,
            west,
            east,
        }
    }

    /// Midpoint latitude and longitude
    #[inline]
    pub fn midpoints(&self) -> (f64, f64) {
        (
            (self.north + self.south) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }

    /// Rectangle of one quadrant of this rectangle
    #[inline]
    pub fn quadrant(&self, quadrant: Quadrant) -> Bounds {
        let (mid_lat, mid_lng) = self.midpoints();
        let mut b = *self;
        match quadrant {
            Quadrant::TopLeft => {
                b.east = mid_lng;
                b.south = mid_lat;
            }
            Quadrant::TopRight => {
                b.west = mid_lng;
                b.south = mid_lat;
            }
            Quadrant::BottomLeft => {
                b.north = mid_lat;
                b.east = mid_lng;
            }
            Quadrant::BottomRight => {
                b.west = mid_lng;
                b.north = mid_lat;
            }
        }
        b
    }

    /// All four quadrant rectangles in traversal order
    #[inline]
    pub fn split(&self) -> [Bounds; 4] {
        Quadrant::ALL.map(|q| self.quadrant(q))
    }

    /// Quadrant a point falls into
    ///
    /// Points on the latitude midpoint go north, points on the longitude
    /// midpoint go east.
    #[inline]
    pub fn classify(&self, point: Point<f64>) -> Quadrant {
        let (mid_lat, mid_lng) = self.midpoints();
        Quadrant::from_halves(point.y() >= mid_lat, point.x() >= mid_lng)
    }

    /// True unless the rectangles are disjoint (shared edges intersect)
    #[inline]
    pub fn intersects(&self, other: &Bounds) -> bool {
        !(self.east < other.west
            || self.west > other.east
            || self.north < other.south
            || self.south > other.north)
    }

    /// Intersection test for a tree cell against a closed query rectangle
    ///
    /// A cell owns its south and west edges but not its north and east ones,
    /// mirroring [`Bounds::classify`], except where those edges lie on the
    /// border of `domain`. A query that only touches a neighbour's shared
    /// edge therefore does not report that neighbour.
    #[inline]
    pub fn cell_intersects(&self, query: &Bounds, domain: &Bounds) -> bool {
        let below = if self.north < domain.north {
            self.north <= query.south
        } else {
            self.north < query.south
        };
        let left_of = if self.east < domain.east {
            self.east <= query.west
        } else {
            self.east < query.west
        };
        !(below || left_of || self.west > query.east || self.south > query.north)
    }

    /// Closed containment test
    #[inline]
    pub fn contains(&self, point: Point<f64>) -> bool {
        point.y() <= self.north
            && point.y() >= self.south
            && point.x() >= self.west
            && point.x() <= self.east
    }

    /// Longitude span
    #[inline]
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Latitude span
    #[inline]
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Midpoint as a `geo` point (x = longitude, y = latitude)
    pub fn center(&self) -> Point<f64> {
        let (mid_lat, mid_lng) = self.midpoints();
        Point::new(mid_lng, mid_lat)
    }
}

impl From<Rect<f64>> for Bounds {
    fn from(rect: Rect<f64>) -> Self {
        Self {
            north: rect.max().y,
            south: rect.min().y,
            west: rect.min().x,
            east: rect.max().x,
        }
    }
}

impl From<Bounds> for Rect<f64> {
    fn from(b: Bounds) -> Self {
        Rect::new(
            Coord {
                x: b.west,
                y: b.south,
            },
            Coord {
                x: b.east,
                y: b.north,
            },
        )
    }
}

/// Derive the rectangle of `path` by halving `domain` once per step
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn bounds_of(domain: Bounds, path: &QuadPath) -> Bounds {
    path.iter().fold(domain, |b, q| b.quadrant(q))
}
