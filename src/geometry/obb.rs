//! Oriented Bounding Box
//!
//! Box-box overlap uses the separating axis test over the 15 candidate
//! axes (3 face normals of each box, 9 edge cross products). An epsilon is
//! added to the absolute rotation terms so near-parallel edges, whose cross
//! product degenerates, cannot produce a false separation.

use glam::{DMat3, DVec3};

use super::{sanitize, sanitize_size, Aabb, EPSILON};

/// Oriented box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Obb {
    /// Center
    pub center: DVec3,
    /// Local axes as matrix columns, orthonormal
    pub axes: DMat3,
    /// Half extents along each local axis
    pub extents: DVec3,
}

impl Obb {
    /// Create an oriented box.
    ///
    /// Axes are normalized; a degenerate axis falls back to the matching
    /// world axis.
    pub fn new(center: DVec3, axes: DMat3, extents: DVec3) -> Self {
        let fix = |column: DVec3, fallback: DVec3| {
            let n = sanitize(column).normalize_or_zero();
            if n == DVec3::ZERO {
                fallback
            } else {
                n
            }
        };
        Self {
            center: sanitize(center),
            axes: DMat3::from_cols(
                fix(axes.x_axis, DVec3::X),
                fix(axes.y_axis, DVec3::Y),
                fix(axes.z_axis, DVec3::Z),
            ),
            extents: DVec3::new(
                sanitize_size(extents.x),
                sanitize_size(extents.y),
                sanitize_size(extents.z),
            ),
        }
    }

    /// Axis-aligned box as an oriented box.
    pub fn from_aabb(aabb: &Aabb) -> Self {
        Self {
            center: aabb.position(),
            axes: DMat3::IDENTITY,
            extents: aabb.half_extents(),
        }
    }

    /// Box rotated by `angle` radians about `axis`, around its own center.
    pub fn rotated(aabb: &Aabb, axis: DVec3, angle: f64) -> Self {
        let axis = sanitize(axis).normalize_or_zero();
        let angle = super::sanitize_scalar(angle);
        let rotation = if axis == DVec3::ZERO {
            DMat3::IDENTITY
        } else {
            DMat3::from_axis_angle(axis, angle)
        };
        Self::new(aabb.position(), rotation, aabb.half_extents())
    }

    /// Local axis `i` (0, 1 or 2).
    #[inline]
    pub fn axis(&self, i: usize) -> DVec3 {
        self.axes.col(i)
    }

    /// Same box, recentered on `point`.
    pub fn at(&self, point: DVec3) -> Self {
        Self {
            center: sanitize(point),
            ..*self
        }
    }

    /// Same box, moved by `offset`.
    pub fn translate(&self, offset: DVec3) -> Self {
        Self {
            center: self.center + sanitize(offset),
            ..*self
        }
    }

    /// Express a world point in the box's local frame.
    #[inline]
    pub fn local_space(&self, p: DVec3) -> DVec3 {
        self.axes.transpose() * (sanitize(p) - self.center)
    }

    /// Express a world direction in the box's local frame.
    #[inline]
    pub fn local_direction(&self, d: DVec3) -> DVec3 {
        self.axes.transpose() * d
    }

    /// Closest point on or inside the box.
    pub fn closest_position(&self, target: DVec3) -> DVec3 {
        let local = self.local_space(target).clamp(-self.extents, self.extents);
        self.center + self.axes * local
    }

    /// Point containment, boundary inclusive.
    pub fn contains(&self, p: DVec3) -> bool {
        let local = self.local_space(p).abs();
        local.cmple(self.extents + DVec3::splat(EPSILON)).all()
    }

    /// Smallest axis-aligned box enclosing this box.
    pub fn outer(&self) -> Aabb {
        let half = self.axis(0).abs() * self.extents.x
            + self.axis(1).abs() * self.extents.y
            + self.axis(2).abs() * self.extents.z;
        Aabb::from_center(self.center, half)
    }

    /// Separating axis test against another oriented box.
    pub fn intersects(&self, other: &Obb) -> bool {
        let a = self;
        let b = other;
        let ea = a.extents.to_array();
        let eb = b.extents.to_array();

        let mut r = [[0.0f64; 3]; 3];
        let mut abs_r = [[0.0f64; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                r[i][j] = a.axis(i).dot(b.axis(j));
                abs_r[i][j] = r[i][j].abs() + EPSILON;
            }
        }

        let d = b.center - a.center;
        let t = [d.dot(a.axis(0)), d.dot(a.axis(1)), d.dot(a.axis(2))];

        // A's face normals
        for i in 0..3 {
            let ra = ea[i];
            let rb = eb[0] * abs_r[i][0] + eb[1] * abs_r[i][1] + eb[2] * abs_r[i][2];
            if t[i].abs() > ra + rb {
                return false;
            }
        }

        // B's face normals
        for j in 0..3 {
            let ra = ea[0] * abs_r[0][j] + ea[1] * abs_r[1][j] + ea[2] * abs_r[2][j];
            let rb = eb[j];
            let dist = t[0] * r[0][j] + t[1] * r[1][j] + t[2] * r[2][j];
            if dist.abs() > ra + rb {
                return false;
            }
        }

        // Edge cross products A_i x B_j
        for i in 0..3 {
            let (i1, i2) = ((i + 1) % 3, (i + 2) % 3);
            for j in 0..3 {
                let (j1, j2) = ((j + 1) % 3, (j + 2) % 3);
                let ra = ea[i1] * abs_r[i2][j] + ea[i2] * abs_r[i1][j];
                let rb = eb[j1] * abs_r[i][j2] + eb[j2] * abs_r[i][j1];
                let dist = t[i2] * r[i1][j] - t[i1] * r[i2][j];
                if dist.abs() > ra + rb {
                    return false;
                }
            }
        }

        true
    }
}
