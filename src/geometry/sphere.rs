//! Sphere

use glam::DVec3;

use super::{sanitize, sanitize_size, Aabb};

/// Sphere with non-negative radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sphere {
    /// Center
    pub center: DVec3,
    /// Radius
    pub radius: f64,
}

impl Sphere {
    /// Create a sphere. Negative radii are taken by magnitude.
    pub fn new(center: DVec3, radius: f64) -> Self {
        Self {
            center: sanitize(center),
            radius: sanitize_size(radius),
        }
    }

    /// Same sphere, recentered on `point`.
    pub fn at(&self, point: DVec3) -> Self {
        Self::new(point, self.radius)
    }

    /// Same sphere, moved by `offset`.
    pub fn translate(&self, offset: DVec3) -> Self {
        Self::new(self.center + sanitize(offset), self.radius)
    }

    /// Bounding box.
    pub fn outer(&self) -> Aabb {
        Aabb::from_center(self.center, DVec3::splat(self.radius))
    }

    /// Point containment, boundary inclusive.
    #[inline]
    pub fn contains(&self, p: DVec3) -> bool {
        self.center.distance_squared(sanitize(p)) <= self.radius * self.radius
    }

    /// Sphere overlap, boundary inclusive.
    #[inline]
    pub fn intersects(&self, other: &Sphere) -> bool {
        let r = self.radius + other.radius;
        self.center.distance_squared(other.center) <= r * r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touching_spheres_intersect() {
        let a = Sphere::new(DVec3::ZERO, 0.5);
        let b = Sphere::new(DVec3::new(1.0, 0.0, 0.0), 0.5);
        assert!(a.intersects(&b));
    }

    #[test]
    fn test_separated_spheres_do_not_intersect() {
        let a = Sphere::new(DVec3::ZERO, 0.5);
        let b = Sphere::new(DVec3::new(1.0 + 1e-9, 0.0, 0.0), 0.5);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_negative_radius_is_magnitude() {
        let s = Sphere::new(DVec3::ZERO, -2.0);
        assert_eq!(s.radius, 2.0);
        assert!(s.contains(DVec3::new(0.0, 2.0, 0.0)));
    }
}
