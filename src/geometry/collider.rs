//! Collider
//!
//! Closed sum over the supported shapes with symmetric pairwise dispatch:
//! `a.intersects(&b) == b.intersects(&a)` for every pair. Tests whose
//! arithmetic depends on argument order (box-box SAT, segment-segment) are
//! run on a canonical ordering of their operands.

use std::cmp::Ordering;

use glam::DVec3;

use super::{Aabb, Disk, Obb, Ray, Sphere};

/// Any supported collision volume.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Collider {
    /// Axis-aligned box
    Aabb(Aabb),
    /// Oriented box
    Obb(Obb),
    /// Sphere
    Sphere(Sphere),
    /// Bounded ray
    Ray(Ray),
    /// Slab capped by a sphere
    Disk(Disk),
}

/// Shape discriminant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ColliderKind {
    /// Axis-aligned box
    Aabb = 0,
    /// Oriented box
    Obb = 1,
    /// Sphere
    Sphere = 2,
    /// Bounded ray
    Ray = 3,
    /// Disk
    Disk = 4,
}

impl Collider {
    /// Shape discriminant.
    pub fn kind(&self) -> ColliderKind {
        match self {
            Collider::Aabb(_) => ColliderKind::Aabb,
            Collider::Obb(_) => ColliderKind::Obb,
            Collider::Sphere(_) => ColliderKind::Sphere,
            Collider::Ray(_) => ColliderKind::Ray,
            Collider::Disk(_) => ColliderKind::Disk,
        }
    }

    /// Geometric test between two colliders.
    pub fn intersects(&self, other: &Collider) -> bool {
        match (self, other) {
            (Collider::Disk(d), o) | (o, Collider::Disk(d)) => disk_with(d, o),
            (Collider::Ray(r), o) | (o, Collider::Ray(r)) => ray_with(r, o),
            (Collider::Aabb(a), Collider::Aabb(b)) => a.intersects(b),
            (Collider::Sphere(a), Collider::Sphere(b)) => a.intersects(b),
            (Collider::Obb(a), Collider::Obb(b)) => obb_obb(a, b),
            (Collider::Aabb(a), Collider::Sphere(s)) | (Collider::Sphere(s), Collider::Aabb(a)) => {
                aabb_sphere(a, s)
            }
            (Collider::Obb(o), Collider::Sphere(s)) | (Collider::Sphere(s), Collider::Obb(o)) => {
                obb_sphere(o, s)
            }
            (Collider::Aabb(a), Collider::Obb(o)) | (Collider::Obb(o), Collider::Aabb(a)) => {
                obb_obb(&Obb::from_aabb(a), o)
            }
        }
    }

    /// Reference point of the shape (center, or ray origin).
    pub fn position(&self) -> DVec3 {
        match self {
            Collider::Aabb(b) => b.position(),
            Collider::Obb(o) => o.center,
            Collider::Sphere(s) => s.center,
            Collider::Ray(r) => r.origin,
            Collider::Disk(d) => d.position(),
        }
    }

    /// Axis-aligned bounds enclosing the shape.
    pub fn bounds(&self) -> Aabb {
        match self {
            Collider::Aabb(b) => *b,
            Collider::Obb(o) => o.outer(),
            Collider::Sphere(s) => s.outer(),
            Collider::Ray(r) => r.outer(),
            Collider::Disk(d) => d.outer(),
        }
    }

    /// Same shape with its reference point moved to `point`.
    pub fn at(&self, point: DVec3) -> Collider {
        match self {
            Collider::Aabb(b) => Collider::Aabb(b.at(point)),
            Collider::Obb(o) => Collider::Obb(o.at(point)),
            Collider::Sphere(s) => Collider::Sphere(s.at(point)),
            Collider::Ray(r) => Collider::Ray(r.at(point)),
            Collider::Disk(d) => Collider::Disk(d.at(point)),
        }
    }

    /// Same shape moved by `offset`.
    pub fn translate(&self, offset: DVec3) -> Collider {
        match self {
            Collider::Aabb(b) => Collider::Aabb(b.translate(offset)),
            Collider::Obb(o) => Collider::Obb(o.translate(offset)),
            Collider::Sphere(s) => Collider::Sphere(s.translate(offset)),
            Collider::Ray(r) => Collider::Ray(r.translate(offset)),
            Collider::Disk(d) => Collider::Disk(d.translate(offset)),
        }
    }

    /// Point containment.
    pub fn contains(&self, p: DVec3) -> bool {
        match self {
            Collider::Aabb(b) => b.contains(p),
            Collider::Obb(o) => o.contains(p),
            Collider::Sphere(s) => s.contains(p),
            Collider::Ray(r) => r.closest_point(p).distance_squared(p) <= super::EPSILON,
            Collider::Disk(d) => d.contains(p),
        }
    }
}

impl From<Aabb> for Collider {
    fn from(value: Aabb) -> Self {
        Collider::Aabb(value)
    }
}

impl From<Obb> for Collider {
    fn from(value: Obb) -> Self {
        Collider::Obb(value)
    }
}

impl From<Sphere> for Collider {
    fn from(value: Sphere) -> Self {
        Collider::Sphere(value)
    }
}

impl From<Ray> for Collider {
    fn from(value: Ray) -> Self {
        Collider::Ray(value)
    }
}

impl From<Disk> for Collider {
    fn from(value: Disk) -> Self {
        Collider::Disk(value)
    }
}

/// Bounding sphere first, then the slab.
fn disk_with(disk: &Disk, other: &Collider) -> bool {
    Collider::Sphere(disk.sphere).intersects(other) && Collider::Obb(disk.obb).intersects(other)
}

fn ray_with(ray: &Ray, other: &Collider) -> bool {
    match other {
        Collider::Aabb(b) => ray.intersects_aabb(b),
        Collider::Obb(o) => ray.intersects_obb(o),
        Collider::Sphere(s) => ray.intersects_sphere(s),
        Collider::Ray(r) => {
            if precedes(ray.origin, ray.end(), r.origin, r.end()) {
                ray.intersects_ray(r)
            } else {
                r.intersects_ray(ray)
            }
        }
        Collider::Disk(d) => disk_with(d, &Collider::Ray(*ray)),
    }
}

fn aabb_sphere(aabb: &Aabb, sphere: &Sphere) -> bool {
    let closest = aabb.closest_point(sphere.center);
    closest.distance_squared(sphere.center) <= sphere.radius * sphere.radius
}

fn obb_sphere(obb: &Obb, sphere: &Sphere) -> bool {
    let closest = obb.closest_position(sphere.center);
    closest.distance_squared(sphere.center) <= sphere.radius * sphere.radius
}

fn obb_obb(a: &Obb, b: &Obb) -> bool {
    if precedes(a.center, a.extents, b.center, b.extents) {
        a.intersects(b)
    } else {
        b.intersects(a)
    }
}

/// Total order on operand keys, used to fix argument order.
fn precedes(a0: DVec3, a1: DVec3, b0: DVec3, b1: DVec3) -> bool {
    let a = [a0.x, a0.y, a0.z, a1.x, a1.y, a1.z];
    let b = [b0.x, b0.y, b0.z, b1.x, b1.y, b1.z];
    for (x, y) in a.iter().zip(b.iter()) {
        match x.total_cmp(y) {
            Ordering::Less => return true,
            Ordering::Greater => return false,
            Ordering::Equal => {}
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn vec3() -> impl Strategy<Value = DVec3> {
        (-5.0f64..5.0, -5.0f64..5.0, -5.0f64..5.0).prop_map(|(x, y, z)| DVec3::new(x, y, z))
    }

    fn extent() -> impl Strategy<Value = DVec3> {
        (0.05f64..3.0, 0.05f64..3.0, 0.05f64..3.0).prop_map(|(x, y, z)| DVec3::new(x, y, z))
    }

    fn collider() -> impl Strategy<Value = Collider> {
        prop_oneof![
            (vec3(), extent()).prop_map(|(c, e)| Collider::Aabb(Aabb::from_center(c, e))),
            (vec3(), extent(), vec3(), -3.2f64..3.2).prop_map(|(c, e, axis, angle)| {
                Collider::Obb(Obb::rotated(&Aabb::from_center(c, e), axis, angle))
            }),
            (vec3(), 0.05f64..3.0).prop_map(|(c, r)| Collider::Sphere(Sphere::new(c, r))),
            (vec3(), vec3()).prop_map(|(o, d)| Collider::Ray(Ray::new(o, d))),
            (vec3(), extent(), vec3(), -3.2f64..3.2, 0.05f64..3.0).prop_map(
                |(c, e, axis, angle, r)| {
                    let slab = Obb::rotated(&Aabb::from_center(c, e), axis, angle);
                    Collider::Disk(Disk::new(slab, Sphere::new(c, r)))
                }
            ),
        ]
    }

    proptest! {
        #[test]
        fn prop_intersects_is_symmetric(a in collider(), b in collider()) {
            prop_assert_eq!(a.intersects(&b), b.intersects(&a));
        }

        #[test]
        fn prop_shape_intersects_itself(a in collider()) {
            prop_assert!(a.intersects(&a));
        }
    }

    #[test]
    fn test_sphere_boundary_is_inclusive() {
        let a = Collider::from(Sphere::new(DVec3::ZERO, 0.5));
        let touching = Collider::from(Sphere::new(DVec3::new(1.0, 0.0, 0.0), 0.5));
        let apart = Collider::from(Sphere::new(DVec3::new(1.0 + 1e-6, 0.0, 0.0), 0.5));
        assert!(a.intersects(&touching));
        assert!(!a.intersects(&apart));
    }

    #[test]
    fn test_sphere_at_unit_distance_from_box_face() {
        let b = Collider::from(Aabb::new(DVec3::ZERO, DVec3::ONE));
        let touching = Collider::from(Sphere::new(DVec3::new(2.0, 0.5, 0.5), 1.0));
        let apart = Collider::from(Sphere::new(DVec3::new(2.0 + 1e-6, 0.5, 0.5), 1.0));
        assert!(b.intersects(&touching) && touching.intersects(&b));
        assert!(!b.intersects(&apart) && !apart.intersects(&b));
    }

    #[test]
    fn test_aabb_overlap_through_dispatch() {
        let a = Collider::from(Aabb::new(DVec3::ZERO, DVec3::ONE));
        let b = Collider::from(Aabb::new(DVec3::splat(0.5), DVec3::splat(1.5)));
        let c = Collider::from(Aabb::new(DVec3::splat(2.0), DVec3::splat(3.0)));
        assert!(a.intersects(&b) && b.intersects(&a));
        assert!(!a.intersects(&c) && !c.intersects(&a));
    }

    #[test]
    fn test_box_meets_sphere_at_corner() {
        let b = Collider::from(Aabb::new(DVec3::ZERO, DVec3::ONE));
        let near = Collider::from(Sphere::new(DVec3::splat(1.5), 0.9));
        let far = Collider::from(Sphere::new(DVec3::splat(1.5), 0.8));
        // Corner distance is sqrt(0.75) ~= 0.866.
        assert!(b.intersects(&near));
        assert!(!b.intersects(&far));
    }

    #[test]
    fn test_disk_rejects_through_sphere_cap() {
        let slab = Obb::from_aabb(&Aabb::from_center(DVec3::ZERO, DVec3::new(0.15, 1.0, 1.0)));
        let disk = Collider::from(Disk::new(slab, Sphere::new(DVec3::ZERO, 1.0)));
        let in_corner = Collider::from(Sphere::new(DVec3::new(0.0, 0.95, 0.95), 0.05));
        let on_rim = Collider::from(Sphere::new(DVec3::new(0.0, 1.05, 0.0), 0.1));
        assert!(!disk.intersects(&in_corner));
        assert!(disk.intersects(&on_rim));
    }

    #[test]
    fn test_at_and_translate() {
        let s = Collider::from(Sphere::new(DVec3::ZERO, 1.0));
        assert_eq!(s.at(DVec3::X).position(), DVec3::X);
        assert_eq!(s.translate(DVec3::Y).position(), DVec3::Y);
        assert_eq!(s.kind(), ColliderKind::Sphere);
    }

    #[test]
    fn test_zero_radius_sphere_is_a_point() {
        let point = Collider::from(Sphere::new(DVec3::new(1.0, 2.0, 3.0), 0.0));
        let around = Collider::from(Aabb::new(DVec3::ZERO, DVec3::new(2.0, 4.0, 4.0)));
        let touching = Collider::from(Aabb::new(DVec3::new(1.0, 0.0, 0.0), DVec3::new(2.0, 2.0, 3.0)));
        let beside = Collider::from(Aabb::new(DVec3::new(1.5, 0.0, 0.0), DVec3::new(3.0, 4.0, 4.0)));

        assert!(point.intersects(&around));
        assert!(around.intersects(&point));
        assert!(point.intersects(&touching));
        assert!(!point.intersects(&beside));
        assert!(!beside.intersects(&point));
    }

    #[test]
    fn test_nan_inputs_do_not_panic() {
        let nan = DVec3::splat(f64::NAN);
        let shapes = [
            Collider::from(Aabb::new(nan, DVec3::ONE)),
            Collider::from(Sphere::new(nan, f64::NAN)),
            Collider::from(Ray::new(nan, nan)),
            Collider::from(Obb::rotated(&Aabb::new(nan, nan), nan, f64::NAN)),
        ];
        for a in &shapes {
            for b in &shapes {
                assert_eq!(a.intersects(b), b.intersects(a));
            }
        }
    }
}
