//! Axis-Aligned Bounding Box

use glam::DVec3;

use super::{sanitize, sanitize_size};

/// Axis-aligned box. `min <= max` on every axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: DVec3,
    /// Maximum corner
    pub max: DVec3,
}

impl Aabb {
    /// Create a box spanning two corners, in any order.
    pub fn new(a: DVec3, b: DVec3) -> Self {
        let a = sanitize(a);
        let b = sanitize(b);
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Create a box from its center and half extents.
    pub fn from_center(center: DVec3, half_extents: DVec3) -> Self {
        let center = sanitize(center);
        let half = DVec3::new(
            sanitize_size(half_extents.x),
            sanitize_size(half_extents.y),
            sanitize_size(half_extents.z),
        );
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Degenerate box containing a single point.
    pub fn point(p: DVec3) -> Self {
        let p = sanitize(p);
        Self { min: p, max: p }
    }

    /// Center of the box.
    #[inline]
    pub fn position(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Half of the box size on each axis.
    #[inline]
    pub fn half_extents(&self) -> DVec3 {
        (self.max - self.min) * 0.5
    }

    /// Same box, recentered on `point`.
    pub fn at(&self, point: DVec3) -> Self {
        Self::from_center(point, self.half_extents())
    }

    /// Same box, moved by `offset`.
    pub fn translate(&self, offset: DVec3) -> Self {
        let offset = sanitize(offset);
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Grow the box by `margin` in every direction.
    pub fn expand(&self, margin: f64) -> Self {
        let m = DVec3::splat(sanitize_size(margin));
        Self {
            min: self.min - m,
            max: self.max + m,
        }
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &Aabb) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Overlapping region of two boxes, if any.
    pub fn intersection(&self, other: &Aabb) -> Option<Self> {
        if !self.intersects(other) {
            return None;
        }
        Some(Self {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        })
    }

    /// Point containment, boundary inclusive.
    #[inline]
    pub fn contains(&self, p: DVec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Interval overlap on all three axes, boundary inclusive.
    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Closest point on or inside the box.
    #[inline]
    pub fn closest_point(&self, p: DVec3) -> DVec3 {
        sanitize(p).clamp(self.min, self.max)
    }
}
