//! In-memory platform
//!
//! Users, worlds and blocks kept in ordered maps. Used by tests and the
//! demo binary; a server adapter would implement the traits over its own
//! entity and chunk storage instead.

use std::collections::{BTreeMap, BTreeSet};

use glam::{DVec3, IVec3};

use super::{Block, EntityId, EntitySnapshot, Material, Platform, User, UserId, World, WorldKey};
use crate::ability::{AbilityDescription, AbilityKey, Element};
use crate::geometry::Aabb;

/// Mutable user record.
#[derive(Clone, Debug)]
pub struct MemoryUser {
    /// Identity
    pub id: UserId,
    /// Current world
    pub world: WorldKey,
    /// Feet position
    pub location: DVec3,
    /// Unit look direction
    pub direction: DVec3,
    /// Velocity per tick
    pub velocity: DVec3,
    /// Online
    pub valid: bool,
    /// Dead
    pub dead: bool,
    /// Sneak held
    pub sneaking: bool,
    /// Body in water
    pub in_water: bool,
    /// Body in lava
    pub in_lava: bool,
    /// Eyes in water
    pub eyes_in_water: bool,
    /// Eyes in lava
    pub eyes_in_lava: bool,
    /// Selected slot binding
    pub selected: Option<AbilityKey>,
    /// Elements the user may bend
    pub elements: BTreeSet<Element>,
}

impl MemoryUser {
    /// Online user at the world origin, looking along +X.
    pub fn new(id: UserId, world: WorldKey) -> Self {
        Self {
            id,
            world,
            location: DVec3::ZERO,
            direction: DVec3::X,
            velocity: DVec3::ZERO,
            valid: true,
            dead: false,
            sneaking: false,
            in_water: false,
            in_lava: false,
            eyes_in_water: false,
            eyes_in_lava: false,
            selected: None,
            elements: BTreeSet::new(),
        }
    }

    /// Grant an element.
    pub fn with_element(mut self, element: Element) -> Self {
        self.elements.insert(element);
        self
    }

    /// Place the user.
    pub fn at(mut self, location: DVec3) -> Self {
        self.location = location;
        self
    }

    /// Point the user.
    pub fn looking(mut self, direction: DVec3) -> Self {
        self.direction = direction.normalize_or_zero();
        self
    }

    fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot {
            id: self.entity_id(),
            bounds: self.bounds(),
            living: !self.dead,
            user: Some(self.id),
        }
    }
}

impl User for MemoryUser {
    fn id(&self) -> UserId {
        self.id
    }

    fn world(&self) -> &WorldKey {
        &self.world
    }

    fn location(&self) -> DVec3 {
        self.location
    }

    fn direction(&self) -> DVec3 {
        self.direction
    }

    fn velocity(&self) -> DVec3 {
        self.velocity
    }

    fn is_valid(&self) -> bool {
        self.valid
    }

    fn is_dead(&self) -> bool {
        self.dead
    }

    fn is_sneaking(&self) -> bool {
        self.sneaking
    }

    fn in_water(&self) -> bool {
        self.in_water
    }

    fn in_lava(&self) -> bool {
        self.in_lava
    }

    fn eyes_in_water(&self) -> bool {
        self.eyes_in_water
    }

    fn eyes_in_lava(&self) -> bool {
        self.eyes_in_lava
    }

    fn selected_ability(&self) -> Option<AbilityKey> {
        self.selected.clone()
    }

    fn can_bend(&self, description: &AbilityDescription) -> bool {
        description
            .elements()
            .iter()
            .any(|element| self.elements.contains(element))
    }
}

/// World with explicit entity and block tables.
#[derive(Clone, Debug, Default)]
pub struct MemoryWorld {
    key: WorldKey,
    entities: BTreeMap<EntityId, EntitySnapshot>,
    blocks: BTreeMap<(i32, i32, i32), Block>,
}

impl MemoryWorld {
    /// Empty world.
    pub fn new(key: WorldKey) -> Self {
        Self {
            key,
            entities: BTreeMap::new(),
            blocks: BTreeMap::new(),
        }
    }

    /// Insert or replace an entity.
    pub fn upsert_entity(&mut self, entity: EntitySnapshot) {
        self.entities.insert(entity.id, entity);
    }

    /// Remove an entity.
    pub fn remove_entity(&mut self, id: EntityId) -> Option<EntitySnapshot> {
        self.entities.remove(&id)
    }

    /// Place a block, replacing what was there.
    pub fn set_block(&mut self, block: Block) {
        let p = block.position;
        self.blocks.insert((p.x, p.y, p.z), block);
    }

    /// Fill a horizontal square of solid floor at height `y`.
    pub fn fill_floor(&mut self, y: i32, half_width: i32) {
        for x in -half_width..=half_width {
            for z in -half_width..=half_width {
                self.set_block(Block::new(IVec3::new(x, y, z), Material::Solid));
            }
        }
    }
}

impl World for MemoryWorld {
    fn key(&self) -> &WorldKey {
        &self.key
    }

    fn nearby_entities(&self, bounds: &Aabb) -> Vec<EntitySnapshot> {
        self.entities
            .values()
            .filter(|entity| entity.bounds.intersects(bounds))
            .cloned()
            .collect()
    }

    fn nearby_blocks(&self, bounds: &Aabb, predicate: &dyn Fn(&Block) -> bool) -> Vec<Block> {
        let min = bounds.min.floor().as_ivec3();
        let max = bounds.max.floor().as_ivec3();
        self.blocks
            .range((min.x, i32::MIN, i32::MIN)..=(max.x, i32::MAX, i32::MAX))
            .map(|(_, block)| block)
            .filter(|block| {
                let p = block.position;
                p.y >= min.y && p.y <= max.y && p.z >= min.z && p.z <= max.z
            })
            .filter(|block| predicate(block))
            .copied()
            .collect()
    }

    fn entity(&self, id: EntityId) -> Option<EntitySnapshot> {
        self.entities.get(&id).cloned()
    }
}

/// Users and worlds for one process.
#[derive(Clone, Debug, Default)]
pub struct MemoryPlatform {
    users: BTreeMap<UserId, MemoryUser>,
    worlds: BTreeMap<WorldKey, MemoryWorld>,
}

impl MemoryPlatform {
    /// Empty platform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a world.
    pub fn add_world(&mut self, world: MemoryWorld) {
        self.worlds.insert(world.key.clone(), world);
    }

    /// Unload a world.
    pub fn remove_world(&mut self, key: &WorldKey) -> Option<MemoryWorld> {
        self.worlds.remove(key)
    }

    /// Mutable world access.
    pub fn world_mut(&mut self, key: &WorldKey) -> Option<&mut MemoryWorld> {
        self.worlds.get_mut(key)
    }

    /// Connect a user and register its entity in its world.
    pub fn add_user(&mut self, user: MemoryUser) {
        if let Some(world) = self.worlds.get_mut(&user.world) {
            world.upsert_entity(user.snapshot());
        }
        self.users.insert(user.id, user);
    }

    /// Disconnect a user.
    pub fn remove_user(&mut self, id: UserId) -> Option<MemoryUser> {
        let user = self.users.remove(&id)?;
        if let Some(world) = self.worlds.get_mut(&user.world) {
            world.remove_entity(user.entity_id());
        }
        Some(user)
    }

    /// Read a user record.
    pub fn memory_user(&self, id: UserId) -> Option<&MemoryUser> {
        self.users.get(&id)
    }

    /// Edit a user record, keeping its world entity in sync.
    pub fn update_user<F>(&mut self, id: UserId, edit: F) -> bool
    where
        F: FnOnce(&mut MemoryUser),
    {
        let Some(user) = self.users.get_mut(&id) else {
            return false;
        };
        let old_world = user.world.clone();
        edit(user);
        let snapshot = user.snapshot();
        let new_world = user.world.clone();

        if old_world != new_world {
            if let Some(world) = self.worlds.get_mut(&old_world) {
                world.remove_entity(snapshot.id);
            }
        }
        if let Some(world) = self.worlds.get_mut(&new_world) {
            world.upsert_entity(snapshot);
        }
        true
    }
}

impl Platform for MemoryPlatform {
    fn user(&self, id: UserId) -> Option<&dyn User> {
        self.users.get(&id).map(|user| user as &dyn User)
    }

    fn world(&self, key: &WorldKey) -> Option<&dyn World> {
        self.worlds.get(key).map(|world| world as &dyn World)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overworld() -> WorldKey {
        WorldKey::new("overworld")
    }

    #[test]
    fn test_user_entity_tracks_location() {
        let mut platform = MemoryPlatform::new();
        platform.add_world(MemoryWorld::new(overworld()));
        let id = UserId::random();
        platform.add_user(MemoryUser::new(id, overworld()));

        platform.update_user(id, |u| u.location = DVec3::new(10.0, 0.0, 0.0));

        let world = platform.world(&overworld()).unwrap();
        let near_origin = world.nearby_entities(&Aabb::from_center(DVec3::ZERO, DVec3::ONE));
        let near_target =
            world.nearby_entities(&Aabb::from_center(DVec3::new(10.0, 1.0, 0.0), DVec3::ONE));
        assert!(near_origin.is_empty());
        assert_eq!(near_target.len(), 1);
        assert_eq!(near_target[0].user, Some(id));
    }

    #[test]
    fn test_world_change_moves_entity() {
        let mut platform = MemoryPlatform::new();
        platform.add_world(MemoryWorld::new(overworld()));
        platform.add_world(MemoryWorld::new(WorldKey::new("nether")));
        let id = UserId::random();
        platform.add_user(MemoryUser::new(id, overworld()));

        platform.update_user(id, |u| u.world = WorldKey::new("nether"));

        let entity = EntityId::from(id);
        assert!(platform.world(&overworld()).unwrap().entity(entity).is_none());
        assert!(platform.world(&WorldKey::new("nether")).unwrap().entity(entity).is_some());
    }

    #[test]
    fn test_nearby_blocks_applies_bounds_and_predicate() {
        let mut world = MemoryWorld::new(overworld());
        world.fill_floor(-1, 2);
        world.set_block(Block::new(IVec3::new(0, 0, 0), Material::Water));

        let around = Aabb::new(DVec3::new(-0.5, -0.5, -0.5), DVec3::new(0.5, 0.5, 0.5));
        let solid = world.nearby_blocks(&around, &|b: &Block| b.is_solid());
        let liquid = world.nearby_blocks(&around, &|b: &Block| b.is_liquid());

        // Bounds cover x,z in {-1, 0} at y = -1.
        assert_eq!(solid.len(), 4);
        assert_eq!(liquid.len(), 1);
    }

    #[test]
    fn test_missing_user_is_none() {
        let platform = MemoryPlatform::new();
        assert!(platform.user(UserId::random()).is_none());
        assert!(platform.world(&overworld()).is_none());
    }
}
