//! Platform Boundary
//!
//! Traits for the collaborators the engine consumes but does not own:
//! users, worlds and their spatial queries. A network or game-server
//! adapter implements these; `memory` provides an in-process version.
//!
//! Everything here is read-only from the engine's side. Effects the engine
//! wants applied to the world (damage, knockback) are returned as
//! `EntityCommand`s in the tick report.

pub mod memory;

use std::fmt;

use glam::{DVec3, IVec3};
use serde::{Deserialize, Serialize};

use crate::ability::{AbilityDescription, AbilityKey};
use crate::geometry::Aabb;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Unique user identifier (UUID as bytes).
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub [u8; 16]);

impl UserId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Fresh random id.
    pub fn random() -> Self {
        Self(*uuid::Uuid::new_v4().as_bytes())
    }

    /// Create from UUID string.
    pub fn from_uuid_str(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s).ok().map(|u| Self(*u.as_bytes()))
    }

    /// Convert to UUID string.
    pub fn to_uuid_string(&self) -> String {
        uuid::Uuid::from_bytes(self.0).to_string()
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uuid_string())
    }
}

/// Identifier of an entity in a world. Users are entities too.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub [u8; 16]);

impl EntityId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Fresh random id.
    pub fn random() -> Self {
        Self(*uuid::Uuid::new_v4().as_bytes())
    }
}

impl From<UserId> for EntityId {
    fn from(value: UserId) -> Self {
        Self(value.0)
    }
}

/// Name of a simulation partition.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WorldKey(pub String);

impl WorldKey {
    /// Create a world key.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Key as string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// WORLD DATA
// =============================================================================

/// Read-only view of an entity for one tick.
#[derive(Clone, Debug, PartialEq)]
pub struct EntitySnapshot {
    /// Entity id
    pub id: EntityId,
    /// Current bounds
    pub bounds: Aabb,
    /// Whether the entity can take damage
    pub living: bool,
    /// Owning user, when the entity is a user
    pub user: Option<UserId>,
}

/// What a block is made of, as far as abilities care.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Material {
    /// Empty
    #[default]
    Air,
    /// Solid ground
    Solid,
    /// Water
    Water,
    /// Lava
    Lava,
}

/// A unit block at an integer position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Block {
    /// Minimum corner
    pub position: IVec3,
    /// Material
    pub material: Material,
}

impl Block {
    /// Create a block.
    pub fn new(position: IVec3, material: Material) -> Self {
        Self { position, material }
    }

    /// Solid blocks support and obstruct.
    pub fn is_solid(&self) -> bool {
        self.material == Material::Solid
    }

    /// Water or lava.
    pub fn is_liquid(&self) -> bool {
        matches!(self.material, Material::Water | Material::Lava)
    }

    /// Unit cube occupied by the block.
    pub fn bounds(&self) -> Aabb {
        let min = self.position.as_dvec3();
        Aabb::new(min, min + DVec3::ONE)
    }
}

// =============================================================================
// COLLABORATOR TRAITS
// =============================================================================

/// A player as seen by the engine.
pub trait User {
    /// Stable identity.
    fn id(&self) -> UserId;

    /// Entity representing this user in its world.
    fn entity_id(&self) -> EntityId {
        EntityId::from(self.id())
    }

    /// World the user is currently in.
    fn world(&self) -> &WorldKey;

    /// Feet position.
    fn location(&self) -> DVec3;

    /// Eye position.
    fn eye_location(&self) -> DVec3 {
        self.location() + DVec3::new(0.0, 1.62, 0.0)
    }

    /// Unit look direction.
    fn direction(&self) -> DVec3;

    /// Current velocity per tick.
    fn velocity(&self) -> DVec3;

    /// Body bounds.
    fn bounds(&self) -> Aabb {
        let feet = self.location();
        Aabb::new(feet - DVec3::new(0.3, 0.0, 0.3), feet + DVec3::new(0.3, 1.8, 0.3))
    }

    /// Connected and present.
    fn is_valid(&self) -> bool;

    /// Dead users keep no abilities.
    fn is_dead(&self) -> bool;

    /// Sneak key held.
    fn is_sneaking(&self) -> bool;

    /// Body touching water.
    fn in_water(&self) -> bool;

    /// Body touching lava.
    fn in_lava(&self) -> bool;

    /// Eyes submerged in water.
    fn eyes_in_water(&self) -> bool;

    /// Eyes submerged in lava.
    fn eyes_in_lava(&self) -> bool;

    /// Ability bound to the selected slot.
    fn selected_ability(&self) -> Option<AbilityKey>;

    /// Permission and element gate for a description.
    fn can_bend(&self, description: &AbilityDescription) -> bool;
}

/// Spatial queries for one world.
pub trait World {
    /// Key of this world.
    fn key(&self) -> &WorldKey;

    /// Entities whose bounds intersect `bounds`.
    fn nearby_entities(&self, bounds: &Aabb) -> Vec<EntitySnapshot>;

    /// Blocks intersecting `bounds` that satisfy `predicate`.
    fn nearby_blocks(&self, bounds: &Aabb, predicate: &dyn Fn(&Block) -> bool) -> Vec<Block>;

    /// Look up one entity.
    fn entity(&self, id: EntityId) -> Option<EntitySnapshot>;

    /// Vertical build range; positions outside it are out of the world.
    fn height_range(&self) -> (f64, f64) {
        (-64.0, 320.0)
    }
}

/// Registry of users and worlds, snapshot for one tick.
pub trait Platform {
    /// Look up an online user.
    fn user(&self, id: UserId) -> Option<&dyn User>;

    /// Look up a loaded world.
    fn world(&self, key: &WorldKey) -> Option<&dyn World>;
}
