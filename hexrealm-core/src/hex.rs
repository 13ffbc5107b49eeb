//! Hex geometry with cube coordinates

use crate::error::HexError;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// Direction vectors in cube coordinates (dq, dr, ds)
/// Index: 0=E, 1=NE, 2=NW, 3=W, 4=SW, 5=SE
pub const DIRECTIONS: [Hex; 6] = [
    Hex::axial(1, 0),
    Hex::axial(1, -1),
    Hex::axial(0, -1),
    Hex::axial(-1, 0),
    Hex::axial(-1, 1),
    Hex::axial(0, 1),
];

/// Diagonal offsets, one per corner between two directions
pub const DIAGONALS: [Hex; 6] = [
    Hex::axial(2, -1),
    Hex::axial(1, -2),
    Hex::axial(-1, -1),
    Hex::axial(-2, 1),
    Hex::axial(-1, 2),
    Hex::axial(1, 1),
];

/// Cube hex coordinates. `q + r + s == 0` always holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "CubeRecord", into = "CubeRecord")]
pub struct Hex {
    q: i32,
    r: i32,
    s: i32,
}

/// Wire form of a coordinate; validated on the way in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CubeRecord {
    pub q: i32,
    pub r: i32,
    pub s: i32,
}

impl Hex {
    /// Build from axial (q, r); `s` is derived so the invariant holds.
    pub const fn axial(q: i32, r: i32) -> Self {
        Self { q, r, s: -q - r }
    }

    /// Build from all three cube components, rejecting mismatched triples.
    pub fn new(q: i32, r: i32, s: i32) -> Result<Self, HexError> {
        if q + r + s != 0 {
            return Err(HexError::InvalidCube { q, r, s });
        }
        Ok(Self { q, r, s })
    }

    pub const fn q(&self) -> i32 {
        self.q
    }

    pub const fn r(&self) -> i32 {
        self.r
    }

    pub const fn s(&self) -> i32 {
        self.s
    }

    /// Distance from the origin
    pub fn length(&self) -> u32 {
        (self.q.unsigned_abs() + self.r.unsigned_abs() + self.s.unsigned_abs()) / 2
    }

    /// Distance between two hexes
    pub fn distance_to(&self, other: Hex) -> u32 {
        (*self - other).length()
    }

    /// Get neighbor in direction (0-5)
    pub fn neighbor(&self, direction: usize) -> Hex {
        *self + DIRECTIONS[direction % 6]
    }

    /// Get diagonal neighbor (0-5), two steps away
    pub fn diagonal_neighbor(&self, direction: usize) -> Hex {
        *self + DIAGONALS[direction % 6]
    }

    /// The six adjacent coordinates, in `DIRECTIONS` order
    pub fn neighbors(self) -> impl Iterator<Item = Hex> {
        DIRECTIONS.into_iter().map(move |d| self + d)
    }

    /// Hexes on the straight line from `self` to `other`, both ends included
    pub fn line_to(&self, other: Hex) -> Vec<Hex> {
        let n = self.distance_to(other);
        let a = FractionalHex::from(*self).nudged();
        let b = FractionalHex::from(other).nudged();
        let step = 1.0 / f64::from(n.max(1));
        (0..=n)
            .map(|i| a.lerp(b, step * f64::from(i)).round())
            .collect()
    }
}

/// Cube distance between two hexes
pub fn distance(a: Hex, b: Hex) -> u32 {
    a.distance_to(b)
}

impl Add for Hex {
    type Output = Hex;

    fn add(self, other: Hex) -> Hex {
        Hex {
            q: self.q + other.q,
            r: self.r + other.r,
            s: self.s + other.s,
        }
    }
}

impl Sub for Hex {
    type Output = Hex;

    fn sub(self, other: Hex) -> Hex {
        Hex {
            q: self.q - other.q,
            r: self.r - other.r,
            s: self.s - other.s,
        }
    }
}

impl Mul<i32> for Hex {
    type Output = Hex;

    fn mul(self, k: i32) -> Hex {
        Hex {
            q: self.q * k,
            r: self.r * k,
            s: self.s * k,
        }
    }
}

impl TryFrom<CubeRecord> for Hex {
    type Error = HexError;

    fn try_from(rec: CubeRecord) -> Result<Self, Self::Error> {
        Hex::new(rec.q, rec.r, rec.s)
    }
}

impl From<Hex> for CubeRecord {
    fn from(hex: Hex) -> Self {
        CubeRecord {
            q: hex.q,
            r: hex.r,
            s: hex.s,
        }
    }
}

// ============================================================================
// FRACTIONAL HEXES
// ============================================================================

/// Non-integer cube position, e.g. from a pixel lookup or interpolation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FractionalHex {
    pub q: f64,
    pub r: f64,
    pub s: f64,
}

impl FractionalHex {
    pub fn new(q: f64, r: f64) -> Self {
        Self { q, r, s: -q - r }
    }

    /// Nearest valid cube coordinate.
    ///
    /// The axis with the largest rounding error is re-derived from the other
    /// two (priority q, then r, else s).
    pub fn round(&self) -> Hex {
        let mut qi = self.q.round();
        let mut ri = self.r.round();
        let mut si = self.s.round();

        let q_diff = (qi - self.q).abs();
        let r_diff = (ri - self.r).abs();
        let s_diff = (si - self.s).abs();

        if q_diff > r_diff && q_diff > s_diff {
            qi = -ri - si;
        } else if r_diff > s_diff {
            ri = -qi - si;
        } else {
            si = -qi - ri;
        }

        Hex {
            q: qi as i32,
            r: ri as i32,
            s: si as i32,
        }
    }

    pub fn lerp(&self, other: FractionalHex, t: f64) -> FractionalHex {
        FractionalHex {
            q: self.q * (1.0 - t) + other.q * t,
            r: self.r * (1.0 - t) + other.r * t,
            s: self.s * (1.0 - t) + other.s * t,
        }
    }

    // Pushes points off hex edges so line drawing never lands on a tie.
    fn nudged(self) -> FractionalHex {
        FractionalHex {
            q: self.q + 1e-6,
            r: self.r + 1e-6,
            s: self.s - 2e-6,
        }
    }
}

impl From<Hex> for FractionalHex {
    fn from(hex: Hex) -> Self {
        FractionalHex {
            q: f64::from(hex.q),
            r: f64::from(hex.r),
            s: f64::from(hex.s),
        }
    }
}

// ============================================================================
// PIXEL LAYOUT
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Forward (f) and inverse (b) projection matrices plus the first corner angle
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Orientation {
    pub f: [f64; 4],
    pub b: [f64; 4],
    pub start_angle: f64,
}

const SQRT_3: f64 = 1.732_050_807_568_877;

pub const POINTY: Orientation = Orientation {
    f: [SQRT_3, SQRT_3 / 2.0, 0.0, 3.0 / 2.0],
    b: [SQRT_3 / 3.0, -1.0 / 3.0, 0.0, 2.0 / 3.0],
    start_angle: 0.5,
};

/// Screen projection used by renderers to turn clicks into coordinates
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Layout {
    pub orientation: Orientation,
    pub size: Point,
    pub origin: Point,
}

impl Layout {
    pub fn pointy(size: Point, origin: Point) -> Self {
        Self {
            orientation: POINTY,
            size,
            origin,
        }
    }

    pub fn hex_to_pixel(&self, hex: Hex) -> Point {
        let m = &self.orientation.f;
        let (q, r) = (f64::from(hex.q), f64::from(hex.r));
        let x = (m[0] * q + m[1] * r) * self.size.x;
        let y = (m[2] * q + m[3] * r) * self.size.y;
        Point::new(x + self.origin.x, y + self.origin.y)
    }

    pub fn pixel_to_hex(&self, p: Point) -> FractionalHex {
        let m = &self.orientation.b;
        let x = (p.x - self.origin.x) / self.size.x;
        let y = (p.y - self.origin.y) / self.size.y;
        FractionalHex::new(m[0] * x + m[1] * y, m[2] * x + m[3] * y)
    }

    pub fn polygon_corners(&self, hex: Hex) -> [Point; 6] {
        let center = self.hex_to_pixel(hex);
        std::array::from_fn(|corner| {
            let angle =
                2.0 * std::f64::consts::PI * (self.orientation.start_angle - corner as f64) / 6.0;
            Point::new(
                center.x + self.size.x * angle.cos(),
                center.y + self.size.y * angle.sin(),
            )
        })
    }
}
