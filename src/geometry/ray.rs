//! Bounded Ray
//!
//! A ray here is a segment: it starts at `origin` and stops after `length`.
//! Zero-length rays degenerate to a point test.

use glam::DVec3;

use super::{sanitize, Aabb, Obb, Sphere, EPSILON};

/// Segment with a unit direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    /// Start point
    pub origin: DVec3,
    /// Unit direction, or zero for a degenerate ray
    pub direction: DVec3,
    /// Extent along `direction`
    pub length: f64,
}

impl Ray {
    /// Create a ray whose extent is the magnitude of `direction`.
    pub fn new(origin: DVec3, direction: DVec3) -> Self {
        let direction = sanitize(direction);
        let length = direction.length();
        Self {
            origin: sanitize(origin),
            direction: direction.normalize_or_zero(),
            length: if length.is_finite() { length } else { 0.0 },
        }
    }

    /// Create a ray from a direction and an explicit length.
    pub fn with_length(origin: DVec3, direction: DVec3, length: f64) -> Self {
        let unit = sanitize(direction).normalize_or_zero();
        Self::new(origin, unit * super::sanitize_size(length))
    }

    /// Far end of the segment.
    #[inline]
    pub fn end(&self) -> DVec3 {
        self.origin + self.direction * self.length
    }

    /// Center of the segment.
    #[inline]
    pub fn position(&self) -> DVec3 {
        self.origin + self.direction * (self.length * 0.5)
    }

    /// Same ray, starting at `point`.
    pub fn at(&self, point: DVec3) -> Self {
        Self {
            origin: sanitize(point),
            ..*self
        }
    }

    /// Same ray, moved by `offset`.
    pub fn translate(&self, offset: DVec3) -> Self {
        Self {
            origin: self.origin + sanitize(offset),
            ..*self
        }
    }

    /// Bounding box of the segment.
    pub fn outer(&self) -> Aabb {
        Aabb::new(self.origin, self.end())
    }

    /// Closest point on the segment to `p`.
    pub fn closest_point(&self, p: DVec3) -> DVec3 {
        let t = (sanitize(p) - self.origin)
            .dot(self.direction)
            .clamp(0.0, self.length);
        self.origin + self.direction * t
    }

    /// Slab test against a box, clipped to `[0, length]`.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        clip_slabs(self.origin, self.direction, self.length, aabb.min, aabb.max)
    }

    /// Slab test in the box's local frame.
    pub fn intersects_obb(&self, obb: &Obb) -> bool {
        let origin = obb.local_space(self.origin);
        let direction = obb.local_direction(self.direction);
        clip_slabs(origin, direction, self.length, -obb.extents, obb.extents)
    }

    /// Closest point on the segment within the radius.
    pub fn intersects_sphere(&self, sphere: &Sphere) -> bool {
        let closest = self.closest_point(sphere.center);
        closest.distance_squared(sphere.center) <= sphere.radius * sphere.radius
    }

    /// Segments touch when their closest points coincide within tolerance.
    pub fn intersects_ray(&self, other: &Ray) -> bool {
        segment_distance_squared(self, other) <= EPSILON
    }
}

fn clip_slabs(origin: DVec3, direction: DVec3, length: f64, min: DVec3, max: DVec3) -> bool {
    let o = origin.to_array();
    let d = direction.to_array();
    let lo = min.to_array();
    let hi = max.to_array();

    let mut t_min = 0.0f64;
    let mut t_max = length;
    for axis in 0..3 {
        if d[axis].abs() < EPSILON {
            if o[axis] < lo[axis] || o[axis] > hi[axis] {
                return false;
            }
            continue;
        }
        let inv = 1.0 / d[axis];
        let mut t0 = (lo[axis] - o[axis]) * inv;
        let mut t1 = (hi[axis] - o[axis]) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_min = t_min.max(t0);
        t_max = t_max.min(t1);
        if t_min > t_max {
            return false;
        }
    }
    true
}

/// Squared distance between the closest points of two segments.
fn segment_distance_squared(a: &Ray, b: &Ray) -> f64 {
    let p1 = a.origin;
    let p2 = b.origin;
    let d1 = a.direction * a.length;
    let d2 = b.direction * b.length;
    let r = p1 - p2;
    let len_a = d1.length_squared();
    let len_b = d2.length_squared();
    let f = d2.dot(r);

    if len_a <= EPSILON && len_b <= EPSILON {
        return r.length_squared();
    }

    let (s, t) = if len_a <= EPSILON {
        (0.0, (f / len_b).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(r);
        if len_b <= EPSILON {
            ((-c / len_a).clamp(0.0, 1.0), 0.0)
        } else {
            let b_dot = d1.dot(d2);
            let denom = len_a * len_b - b_dot * b_dot;
            let s = if denom > 0.0 {
                ((b_dot * f - c * len_b) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let t = (b_dot * s + f) / len_b;
            if t < 0.0 {
                ((-c / len_a).clamp(0.0, 1.0), 0.0)
            } else if t > 1.0 {
                (((b_dot - c) / len_a).clamp(0.0, 1.0), 1.0)
            } else {
                (s, t)
            }
        }
    };

    let c1 = p1 + d1 * s;
    let c2 = p2 + d2 * t;
    c1.distance_squared(c2)
}
