//! Disk
//!
//! A thin oriented slab capped by a sphere: a point is inside the disk when
//! it is inside both.

use glam::DVec3;

use super::{sanitize, Aabb, Obb, Sphere};

/// Oriented slab intersected with a bounding sphere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Disk {
    /// Planar slab
    pub obb: Obb,
    /// Radial cap
    pub sphere: Sphere,
}

impl Disk {
    /// Create a disk. The sphere is recentered on the slab.
    pub fn new(obb: Obb, sphere: Sphere) -> Self {
        Self {
            sphere: sphere.at(obb.center),
            obb,
        }
    }

    /// Center of the disk.
    #[inline]
    pub fn position(&self) -> DVec3 {
        self.obb.center
    }

    /// Same disk, recentered on `point`.
    pub fn at(&self, point: DVec3) -> Self {
        let point = sanitize(point);
        Self {
            obb: self.obb.at(point),
            sphere: self.sphere.at(point),
        }
    }

    /// Same disk, moved by `offset`.
    pub fn translate(&self, offset: DVec3) -> Self {
        Self {
            obb: self.obb.translate(offset),
            sphere: self.sphere.translate(offset),
        }
    }

    /// Bounding box: overlap of the slab's and the sphere's bounds.
    pub fn outer(&self) -> Aabb {
        self.obb
            .outer()
            .intersection(&self.sphere.outer())
            .unwrap_or_else(|| Aabb::point(self.position()))
    }

    /// Point containment.
    pub fn contains(&self, p: DVec3) -> bool {
        self.sphere.contains(p) && self.obb.contains(p)
    }
}
