//! Time-limited references
//!
//! An ability that remembers an entity ("last target", "already hit")
//! stores its id with an expiry tick instead of holding the entity.
//! Lookups go through the world, so a despawned entity simply resolves
//! to nothing.

use std::collections::BTreeMap;

use crate::platform::{EntityId, EntitySnapshot, World};
use crate::Tick;

/// A value that stops being visible at `expires`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiringRef<T> {
    value: T,
    expires: Tick,
}

impl<T> ExpiringRef<T> {
    /// Reference valid for `duration` ticks from `now`.
    pub fn new(value: T, now: Tick, duration: Tick) -> Self {
        Self {
            value,
            expires: now.saturating_add(duration),
        }
    }

    /// The value, unless expired.
    pub fn get(&self, now: Tick) -> Option<&T> {
        (now < self.expires).then_some(&self.value)
    }

    /// Expiry tick.
    pub fn expires(&self) -> Tick {
        self.expires
    }
}

impl ExpiringRef<EntityId> {
    /// Resolve the entity through the world, if still valid and present.
    pub fn resolve(&self, world: &dyn World, now: Tick) -> Option<EntitySnapshot> {
        self.get(now).and_then(|id| world.entity(*id))
    }
}

/// Set whose members expire individually.
#[derive(Debug, Clone)]
pub struct ExpiringSet<T: Ord> {
    members: BTreeMap<T, Tick>,
    duration: Tick,
}

impl<T: Ord> ExpiringSet<T> {
    /// Members live for `duration` ticks after insertion.
    pub fn new(duration: Tick) -> Self {
        Self {
            members: BTreeMap::new(),
            duration,
        }
    }

    /// Insert or refresh a member.
    pub fn insert(&mut self, value: T, now: Tick) {
        self.members.insert(value, now.saturating_add(self.duration));
    }

    /// Whether `value` is present and unexpired.
    pub fn contains(&self, value: &T, now: Tick) -> bool {
        self.members.get(value).is_some_and(|expires| now < *expires)
    }

    /// Drop expired members.
    pub fn prune(&mut self, now: Tick) {
        self.members.retain(|_, expires| now < *expires);
    }

    /// Number of stored members, including expired ones not yet pruned.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Aabb;
    use crate::platform::memory::MemoryWorld;
    use crate::platform::WorldKey;
    use glam::DVec3;

    #[test]
    fn test_ref_expires() {
        let r = ExpiringRef::new(7u32, 10, 5);
        assert_eq!(r.get(14), Some(&7));
        assert_eq!(r.get(15), None);
    }

    #[test]
    fn test_entity_ref_resolves_through_world() {
        let mut world = MemoryWorld::new(WorldKey::new("w"));
        let id = EntityId::new([9; 16]);
        world.upsert_entity(EntitySnapshot {
            id,
            bounds: Aabb::point(DVec3::ZERO),
            living: true,
            user: None,
        });
        let r = ExpiringRef::new(id, 0, 100);
        assert!(r.resolve(&world, 1).is_some());

        world.remove_entity(id);
        assert!(r.resolve(&world, 1).is_none());
    }

    #[test]
    fn test_set_members_expire_individually() {
        let mut set = ExpiringSet::new(10);
        set.insert("a", 0);
        set.insert("b", 5);
        assert!(set.contains(&"a", 9));
        assert!(!set.contains(&"a", 10));
        assert!(set.contains(&"b", 14));

        set.prune(10);
        assert_eq!(set.len(), 1);
    }
}
