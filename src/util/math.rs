//! Math type re-exports and mesh-specific math utilities.
//!
//! This module re-exports types from `glam` and provides the bounding box
//! and plane types shared by the extractor and the lightmap stages.

pub use glam::{Vec2, Vec3};

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Neg;

/// Distance below which two points are treated as the same.
const POINT_EPSILON: f32 = 1.0 / 65536.0;

/// Axis-aligned bounds of a surface's vertices, in map units.
///
/// Starts out inverted ([`BBox3f::EMPTY`]) so the first point sets both corners.
#[derive(Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct BBox3f {
    pub min: Vec3,
    pub max: Vec3,
}

impl BBox3f {
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point of the iterator.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points.into_iter().fold(Self::EMPTY, |mut b, p| {
            b.add_point(p);
            b
        })
    }

    /// True until a point has been added.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    #[inline]
    pub fn add_point(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Inclusive on both corners.
    #[inline]
    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Snap outward to a grid of `cell`-sized cells, then grow by one cell on every side.
    pub fn snap_to_grid(&self, cell: f32) -> Self {
        Self {
            min: cell * ((self.min / cell).floor() - 1.0),
            max: cell * ((self.max / cell).ceil() + 1.0),
        }
    }
}

impl Default for BBox3f {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for BBox3f {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("BBox3f(empty)");
        }
        write!(f, "BBox3f({} .. {})", self.min, self.max)
    }
}

/// Plane in Hessian normal form: points `p` on the plane satisfy `normal · p = dist`.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
#[repr(C)]
pub struct Plane {
    pub normal: Vec3,
    pub dist: f32,
}

impl Plane {
    /// Create a plane from a normal and distance.
    #[inline]
    pub const fn new(normal: Vec3, dist: f32) -> Self {
        Self { normal, dist }
    }

    /// Plane through three points; the normal is `(p2 - p1) × (p3 - p2)`, normalized.
    pub fn from_points(p1: Vec3, p2: Vec3, p3: Vec3) -> Self {
        let normal = (p2 - p1).cross(p3 - p2).normalize_or_zero();
        Self { normal, dist: p1.dot(normal) }
    }

    /// Plane through a quad, skipping a corner that coincides with a neighbour.
    ///
    /// Wall parts can collapse one edge to a point (a wall meeting a slope at
    /// zero height), so the first three distinct corners are used.
    pub fn from_quad(p1: Vec3, p2: Vec3, p3: Vec3, p4: Vec3) -> Self {
        if approx_eq(p1, p3) {
            Self::from_points(p1, p2, p4)
        } else if approx_eq(p1, p2) || approx_eq(p2, p3) {
            Self::from_points(p1, p3, p4)
        } else {
            Self::from_points(p1, p2, p3)
        }
    }

    /// Signed distance of a point from the plane.
    #[inline]
    pub fn distance_to(&self, p: Vec3) -> f32 {
        self.normal.dot(p) - self.dist
    }
}

impl Default for Plane {
    fn default() -> Self {
        Self::new(Vec3::Z, 0.0)
    }
}

impl Neg for Plane {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.normal, -self.dist)
    }
}

#[inline]
fn approx_eq(a: Vec3, b: Vec3) -> bool {
    (a - b).abs().max_element() < POINT_EPSILON
}
