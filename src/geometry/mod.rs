//! Collision Geometry
//!
//! Immutable value types for the volumes an ability occupies, and the
//! pairwise intersection tests between them.
//!
//! ## Shapes
//!
//! - `Aabb`: axis-aligned box
//! - `Obb`: oriented box (center, orthonormal axes, half extents)
//! - `Sphere`: center and radius
//! - `Ray`: bounded segment (origin, unit direction, length)
//! - `Disk`: the intersection of an `Obb` slab and a capping `Sphere`
//!
//! All shapes sanitize their inputs on construction: non-finite components
//! become zero and negative sizes are taken by magnitude. Tests never panic,
//! which matters because they run inside the tick.

pub mod aabb;
pub mod collider;
pub mod disk;
pub mod obb;
pub mod ray;
pub mod sphere;

use glam::DVec3;

pub use aabb::Aabb;
pub use collider::{Collider, ColliderKind};
pub use disk::Disk;
pub use obb::Obb;
pub use ray::Ray;
pub use sphere::Sphere;

/// Tolerance used on axis projections and near-zero directions.
pub const EPSILON: f64 = 1e-8;

/// Replace non-finite components with zero.
#[inline]
pub fn sanitize(v: DVec3) -> DVec3 {
    DVec3::new(sanitize_scalar(v.x), sanitize_scalar(v.y), sanitize_scalar(v.z))
}

/// Replace a non-finite scalar with zero.
#[inline]
pub fn sanitize_scalar(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Sanitized magnitude of a size parameter (radius, extent).
#[inline]
pub(crate) fn sanitize_size(value: f64) -> f64 {
    sanitize_scalar(value).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_non_finite() {
        let v = sanitize(DVec3::new(f64::NAN, f64::INFINITY, 2.0));
        assert_eq!(v, DVec3::new(0.0, 0.0, 2.0));
        assert_eq!(sanitize_size(-3.0), 3.0);
        assert_eq!(sanitize_size(f64::NEG_INFINITY), 0.0);
    }
}
