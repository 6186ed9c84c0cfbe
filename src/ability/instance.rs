//! Ability Instances
//!
//! `Ability` is the behavior an ability kind implements. `AbilityInstance`
//! is the manager-owned wrapper that tracks the owner, the removal policy,
//! the config snapshot and the lifecycle state.
//!
//! Lifecycle: an ability body is created and activated before it is ever
//! wrapped, so the manager only holds fully activated instances. Teardown
//! moves the state to the terminal `Destroyed` variant, which makes a
//! second teardown a no-op.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::context::{ActivationContext, DestroyContext, UpdateContext};
use super::{AbilityDescription, Activation, RemovalPolicy};
use crate::config::AbilityAttributes;
use crate::error::AbilityError;
use crate::game::collision::Collision;
use crate::geometry::Collider;
use crate::platform::UserId;
use crate::Tick;

/// Monotonic per-manager instance id. Orders tick iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outcome of one update step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateResult {
    /// Stay active
    Continue,
    /// Finish; teardown runs in this tick's sweep
    Remove,
}

/// Behavior of one ability kind.
///
/// All methods run on the simulation thread and must not block.
pub trait Ability {
    /// Initialize from the activating input. Returning `false` rejects the
    /// activation and the body is dropped without teardown.
    fn activate(&mut self, ctx: &mut ActivationContext<'_>, method: Activation) -> bool;

    /// Advance one tick. Colliders must reflect this tick's geometry
    /// when this returns.
    fn update(&mut self, ctx: &mut UpdateContext<'_>) -> Result<UpdateResult, AbilityError>;

    /// Volumes currently occupied.
    fn colliders(&self) -> &[Collider] {
        &[]
    }

    /// Called once per colliding registered pair per tick.
    fn on_collision(&mut self, _collision: &mut Collision<'_>) {}

    /// Called exactly once when the instance ends.
    fn on_destroy(&mut self, _ctx: &mut DestroyContext<'_>) {}

    /// A newer config snapshot was swapped in before this update.
    fn on_config_reload(&mut self, _attributes: &AbilityAttributes) {}

    /// Ownership moved to another user.
    fn on_user_change(&mut self, _new_user: UserId) {}
}

pub(crate) enum Lifecycle {
    Active(Box<dyn Ability>),
    Destroyed,
}

/// A live ability owned by one user.
pub struct AbilityInstance {
    id: InstanceId,
    user: UserId,
    description: Arc<AbilityDescription>,
    policy: RemovalPolicy,
    attributes: Arc<AbilityAttributes>,
    generation: u64,
    created: Tick,
    state: Lifecycle,
}

impl AbilityInstance {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: InstanceId,
        user: UserId,
        description: Arc<AbilityDescription>,
        ability: Box<dyn Ability>,
        policy: RemovalPolicy,
        attributes: Arc<AbilityAttributes>,
        generation: u64,
        created: Tick,
    ) -> Self {
        Self {
            id,
            user,
            description,
            policy,
            attributes,
            generation,
            created,
            state: Lifecycle::Active(ability),
        }
    }

    /// Instance id.
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Owner.
    pub fn user(&self) -> UserId {
        self.user
    }

    /// Ability kind.
    pub fn description(&self) -> &Arc<AbilityDescription> {
        &self.description
    }

    /// Instance-specific removal policy.
    pub fn policy(&self) -> &RemovalPolicy {
        &self.policy
    }

    /// Config values in effect for this instance.
    pub fn attributes(&self) -> &Arc<AbilityAttributes> {
        &self.attributes
    }

    /// Config generation of `attributes`.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Tick of activation.
    pub fn created(&self) -> Tick {
        self.created
    }

    /// Not yet torn down.
    pub fn is_active(&self) -> bool {
        matches!(self.state, Lifecycle::Active(_))
    }

    /// Current colliders; empty once destroyed.
    pub fn colliders(&self) -> &[Collider] {
        match &self.state {
            Lifecycle::Active(ability) => ability.colliders(),
            Lifecycle::Destroyed => &[],
        }
    }

    pub(crate) fn ability_mut(&mut self) -> Option<&mut (dyn Ability + 'static)> {
        match &mut self.state {
            Lifecycle::Active(ability) => Some(ability.as_mut()),
            Lifecycle::Destroyed => None,
        }
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut RemovalPolicy, Option<&mut (dyn Ability + 'static)>) {
        let ability = match &mut self.state {
            Lifecycle::Active(ability) => Some(ability.as_mut()),
            Lifecycle::Destroyed => None,
        };
        (&mut self.policy, ability)
    }

    pub(crate) fn swap_attributes(&mut self, attributes: Arc<AbilityAttributes>, generation: u64) {
        self.attributes = attributes;
        self.generation = generation;
    }

    pub(crate) fn set_user(&mut self, user: UserId) {
        self.user = user;
    }

    /// Move to `Destroyed`, returning the body if it was still active.
    pub(crate) fn take_for_teardown(&mut self) -> Option<Box<dyn Ability>> {
        match std::mem::replace(&mut self.state, Lifecycle::Destroyed) {
            Lifecycle::Active(ability) => Some(ability),
            Lifecycle::Destroyed => None,
        }
    }
}

impl fmt::Debug for AbilityInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbilityInstance")
            .field("id", &self.id)
            .field("user", &self.user)
            .field("ability", self.description.key())
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::testing::Inert;
    use crate::ability::Element;

    fn instance() -> AbilityInstance {
        let description = AbilityDescription::builder("Inert", || Box::new(Inert::default()))
            .element(Element::Air)
            .activation(&[Activation::Attack])
            .build()
            .unwrap();
        let ability = description.create_ability();
        AbilityInstance::new(
            InstanceId(1),
            UserId::default(),
            description,
            ability,
            RemovalPolicy::none(),
            Arc::new(AbilityAttributes::default()),
            0,
            0,
        )
    }

    #[test]
    fn test_teardown_happens_once() {
        let mut inst = instance();
        assert!(inst.is_active());
        assert!(inst.take_for_teardown().is_some());
        assert!(!inst.is_active());
        assert!(inst.take_for_teardown().is_none());
        assert!(inst.colliders().is_empty());
        assert!(inst.ability_mut().is_none());
    }
}
