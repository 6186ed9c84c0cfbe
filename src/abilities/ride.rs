//! Hovering movement shared by the scooter and the wheel.

use glam::DVec3;

use crate::ability::{UpdateContext, UpdateResult};
use crate::geometry::{Aabb, EPSILON};
use crate::platform::World;

/// How far below the feet ground is searched for.
pub(crate) const SEARCH_DEPTH: f64 = 3.5;

/// Height the ride settles at.
const HOVER_HEIGHT: f64 = 1.25;

/// Largest vertical correction per tick.
const MAX_LIFT: f64 = 0.25;

/// Distance from `location` down to the top of the nearest solid block
/// within `depth`.
pub(crate) fn ground_distance(world: &dyn World, location: DVec3, depth: f64) -> Option<f64> {
    let column = Aabb::new(location - DVec3::new(0.0, depth, 0.0), location);
    world
        .nearby_blocks(&column, &|block| block.is_solid())
        .iter()
        .map(|block| location.y - block.bounds().max.y)
        .filter(|distance| *distance >= -EPSILON)
        .min_by(f64::total_cmp)
}

/// Whether a ride may start at `location`.
pub(crate) fn can_mount(world: &dyn World, location: DVec3, max_height: f64) -> bool {
    ground_distance(world, location, SEARCH_DEPTH)
        .is_some_and(|height| (0.5..=max_height).contains(&height))
}

/// Carries the user forward along their horizontal look direction.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Ride {
    pub speed: f64,
    pub max_height: f64,
}

impl Ride {
    pub(crate) fn new(speed: f64, max_height: f64) -> Self {
        Self { speed, max_height }
    }

    /// Push the user for one tick. Ends once the ground is out of reach.
    pub(crate) fn update(&self, ctx: &mut UpdateContext<'_>) -> UpdateResult {
        let location = ctx.user.location();
        let height = match ground_distance(ctx.world, location, SEARCH_DEPTH) {
            Some(height) if height <= self.max_height => height,
            _ => return UpdateResult::Remove,
        };

        let forward = ctx.user.direction().with_y(0.0).normalize_or_zero() * self.speed;
        let lift = ((HOVER_HEIGHT - height) * 0.25).clamp(-MAX_LIFT, MAX_LIFT);
        let push = forward.with_y(lift) - ctx.user.velocity();
        let target = ctx.user.entity_id();
        ctx.knockback(target, push);
        UpdateResult::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::memory::MemoryWorld;
    use crate::platform::WorldKey;

    #[test]
    fn test_ground_distance() {
        let mut world = MemoryWorld::new(WorldKey::new("overworld"));
        world.fill_floor(0, 2);

        let height = ground_distance(&world, DVec3::new(0.5, 2.5, 0.5), SEARCH_DEPTH).unwrap();
        assert!((height - 1.5).abs() < 1e-9);
        assert!(ground_distance(&world, DVec3::new(0.5, 8.0, 0.5), SEARCH_DEPTH).is_none());
        assert!(ground_distance(&world, DVec3::new(9.5, 2.0, 0.5), SEARCH_DEPTH).is_none());
    }

    #[test]
    fn test_mount_height_window() {
        let mut world = MemoryWorld::new(WorldKey::new("overworld"));
        world.fill_floor(0, 2);

        assert!(can_mount(&world, DVec3::new(0.5, 2.0, 0.5), 3.25));
        assert!(!can_mount(&world, DVec3::new(0.5, 1.0, 0.5), 3.25));
        assert!(!can_mount(&world, DVec3::new(0.5, 4.4, 0.5), 3.25));
    }
}
