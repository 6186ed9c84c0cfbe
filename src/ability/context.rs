//! Ability Contexts
//!
//! Borrowed views handed to an ability during activation, update and
//! teardown. They expose the owner, the world, the tick and the config
//! snapshot, and collect effects for the platform to apply.

use glam::DVec3;

use super::{AbilityDescription, AbilityKey, RemovalPolicy};
use crate::config::AbilityAttributes;
use crate::game::cooldown::CooldownTracker;
use crate::geometry::Collider;
use crate::platform::{EntityId, EntitySnapshot, User, UserId, World};
use crate::Tick;

/// Effect on an entity, applied by the platform after the tick.
#[derive(Clone, Debug, PartialEq)]
pub enum EntityCommand {
    /// Deal damage
    Damage {
        /// Attacking user
        source: UserId,
        /// Damaged entity
        target: EntityId,
        /// Ability that dealt it
        ability: AbilityKey,
        /// Amount
        amount: f64,
    },
    /// Push an entity
    Knockback {
        /// Pushed entity
        target: EntityId,
        /// Velocity to add
        velocity: DVec3,
    },
}

/// Which entities `hit_entities` reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HitFilter {
    /// Skip non-living entities
    pub living_only: bool,
    /// Report the owner's own entity
    pub include_self: bool,
}

impl Default for HitFilter {
    fn default() -> Self {
        Self {
            living_only: true,
            include_self: false,
        }
    }
}

/// Context for [`Ability::activate`](super::Ability::activate).
pub struct ActivationContext<'a> {
    /// Activating user
    pub user: &'a dyn User,
    /// User's world
    pub world: &'a dyn World,
    /// Current tick
    pub now: Tick,
    /// Ability kind
    pub description: &'a AbilityDescription,
    /// Config snapshot
    pub attributes: &'a AbilityAttributes,
    pub(crate) cooldowns: &'a mut CooldownTracker,
    pub(crate) policy: RemovalPolicy,
}

impl<'a> ActivationContext<'a> {
    /// Policy checked every tick in addition to the shared base policy.
    pub fn set_removal_policy(&mut self, policy: RemovalPolicy) {
        self.policy = policy;
    }

    /// Start this ability's cooldown now.
    pub fn add_cooldown(&mut self, duration: Tick) {
        self.cooldowns
            .add(self.user.id(), self.description.key().clone(), self.now.saturating_add(duration));
    }

    /// Whether the user is cooling down on another ability.
    pub fn on_cooldown(&self, key: &AbilityKey) -> bool {
        self.cooldowns.is_on_cooldown(self.user.id(), key, self.now)
    }
}

/// Context for [`Ability::update`](super::Ability::update).
pub struct UpdateContext<'a> {
    /// Owner
    pub user: &'a dyn User,
    /// Owner's world
    pub world: &'a dyn World,
    /// Current tick
    pub now: Tick,
    /// Ability kind
    pub description: &'a AbilityDescription,
    /// Config snapshot
    pub attributes: &'a AbilityAttributes,
    pub(crate) cooldowns: &'a mut CooldownTracker,
    pub(crate) commands: &'a mut Vec<EntityCommand>,
    pub(crate) policy: &'a mut RemovalPolicy,
}

impl<'a> UpdateContext<'a> {
    /// Entities whose bounds intersect `collider`.
    pub fn hit_entities(&self, collider: &Collider, filter: HitFilter) -> Vec<EntitySnapshot> {
        let own = self.user.entity_id();
        self.world
            .nearby_entities(&collider.bounds())
            .into_iter()
            .filter(|entity| filter.include_self || entity.id != own)
            .filter(|entity| !filter.living_only || entity.living)
            .filter(|entity| collider.intersects(&Collider::Aabb(entity.bounds)))
            .collect()
    }

    /// Queue damage to `target` from this ability.
    pub fn damage(&mut self, target: EntityId, amount: f64) {
        self.commands.push(EntityCommand::Damage {
            source: self.user.id(),
            target,
            ability: self.description.key().clone(),
            amount,
        });
    }

    /// Queue a push on `target`.
    pub fn knockback(&mut self, target: EntityId, velocity: DVec3) {
        self.commands.push(EntityCommand::Knockback { target, velocity });
    }

    /// Start this ability's cooldown now.
    pub fn add_cooldown(&mut self, duration: Tick) {
        self.cooldowns
            .add(self.user.id(), self.description.key().clone(), self.now.saturating_add(duration));
    }

    /// Replace the instance's own removal policy.
    pub fn set_removal_policy(&mut self, policy: RemovalPolicy) {
        *self.policy = policy;
    }
}

/// Context for [`Ability::on_destroy`](super::Ability::on_destroy).
pub struct DestroyContext<'a> {
    /// Owner id
    pub user_id: UserId,
    /// Owner, when still online
    pub user: Option<&'a dyn User>,
    /// Current tick
    pub now: Tick,
    /// Ability kind
    pub description: &'a AbilityDescription,
    /// Config snapshot
    pub attributes: &'a AbilityAttributes,
    pub(crate) cooldowns: &'a mut CooldownTracker,
}

impl<'a> DestroyContext<'a> {
    /// Start this ability's cooldown now.
    pub fn add_cooldown(&mut self, duration: Tick) {
        self.cooldowns
            .add(self.user_id, self.description.key().clone(), self.now.saturating_add(duration));
    }
}
