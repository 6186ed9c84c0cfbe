//! Removal Policies
//!
//! A policy is a list of conditions evaluated once per tick before an
//! instance updates; the first condition that holds ends the instance.
//! Timeouts are ordinary conditions (`Expire`), not timers.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use glam::DVec3;

use super::AbilityKey;
use crate::platform::{User, World};
use crate::Tick;

/// Arbitrary removal predicate.
pub type Predicate = Arc<dyn Fn(&dyn User, Tick) -> bool + Send + Sync>;

/// A single removal condition.
#[derive(Clone)]
pub enum Condition {
    /// User is dead
    Dead,
    /// User went offline or became invalid
    Offline,
    /// User is sneaking
    Sneaking,
    /// User is not sneaking
    NotSneaking,
    /// Body touches water or lava
    InLiquid,
    /// Eyes in water
    UnderWater,
    /// Eyes in lava
    UnderLava,
    /// Selected slot no longer holds this ability
    SwappedSlots(AbilityKey),
    /// Tick deadline passed
    Expire {
        /// First tick at which the instance is removed
        deadline: Tick,
    },
    /// User moved too far from an origin
    OutOfRange {
        /// Anchor point
        origin: DVec3,
        /// Maximum distance
        range: f64,
    },
    /// User left the world's vertical range
    OutOfWorld,
    /// Caller-defined predicate
    Custom(&'static str, Predicate),
}

impl Condition {
    /// Expire `duration` ticks after `now`.
    pub fn expire_after(now: Tick, duration: Tick) -> Self {
        Condition::Expire {
            deadline: now.saturating_add(duration),
        }
    }

    /// Custom predicate with a name for logging.
    pub fn custom<F>(name: &'static str, predicate: F) -> Self
    where
        F: Fn(&dyn User, Tick) -> bool + Send + Sync + 'static,
    {
        Condition::Custom(name, Arc::new(predicate))
    }

    /// Short name used as the removal reason.
    pub fn name(&self) -> &'static str {
        match self {
            Condition::Dead => "dead",
            Condition::Offline => "offline",
            Condition::Sneaking => "sneaking",
            Condition::NotSneaking => "not_sneaking",
            Condition::InLiquid => "in_liquid",
            Condition::UnderWater => "under_water",
            Condition::UnderLava => "under_lava",
            Condition::SwappedSlots(_) => "swapped_slots",
            Condition::Expire { .. } => "expired",
            Condition::OutOfRange { .. } => "out_of_range",
            Condition::OutOfWorld => "out_of_world",
            Condition::Custom(name, _) => *name,
        }
    }

    /// Whether the condition holds.
    pub fn test(&self, user: &dyn User, world: &dyn World, now: Tick) -> bool {
        match self {
            Condition::Dead => user.is_dead(),
            Condition::Offline => !user.is_valid(),
            Condition::Sneaking => user.is_sneaking(),
            Condition::NotSneaking => !user.is_sneaking(),
            Condition::InLiquid => user.in_water() || user.in_lava(),
            Condition::UnderWater => user.eyes_in_water(),
            Condition::UnderLava => user.eyes_in_lava(),
            Condition::SwappedSlots(key) => user.selected_ability().as_ref() != Some(key),
            Condition::Expire { deadline } => now >= *deadline,
            Condition::OutOfRange { origin, range } => {
                user.location().distance_squared(*origin) > range * range
            }
            Condition::OutOfWorld => {
                let (min, max) = world.height_range();
                let y = user.location().y;
                y < min || y > max
            }
            Condition::Custom(_, predicate) => predicate(user, now),
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::SwappedSlots(key) => write!(f, "SwappedSlots({key})"),
            Condition::Expire { deadline } => write!(f, "Expire({deadline})"),
            Condition::OutOfRange { origin, range } => write!(f, "OutOfRange({origin}, {range})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Ordered set of removal conditions.
#[derive(Clone, Debug, Default)]
pub struct RemovalPolicy {
    conditions: Vec<Condition>,
}

impl RemovalPolicy {
    /// Policy that never removes.
    pub fn none() -> Self {
        Self::default()
    }

    /// Dead or offline.
    pub fn defaults() -> Self {
        Self::none().and(Condition::Dead).and(Condition::Offline)
    }

    /// Add a condition.
    pub fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Conditions in evaluation order.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Whether no condition is present.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Name of the first condition that holds.
    pub fn test(&self, user: &dyn User, world: &dyn World, now: Tick) -> Option<&'static str> {
        self.conditions
            .iter()
            .find(|condition| condition.test(user, world, now))
            .map(Condition::name)
    }
}

/// Shared default policy plus per-ability overrides, given to a manager
/// at construction.
#[derive(Clone, Debug)]
pub struct PolicyConfig {
    /// Applies to abilities without an override
    pub defaults: RemovalPolicy,
    /// Replaces `defaults` for specific abilities
    pub overrides: BTreeMap<AbilityKey, RemovalPolicy>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            defaults: RemovalPolicy::defaults(),
            overrides: BTreeMap::new(),
        }
    }
}

impl PolicyConfig {
    /// Override the base policy for one ability.
    pub fn with_override(mut self, key: AbilityKey, policy: RemovalPolicy) -> Self {
        self.overrides.insert(key, policy);
        self
    }

    /// Base policy for `key`.
    pub fn base_for(&self, key: &AbilityKey) -> &RemovalPolicy {
        self.overrides.get(key).unwrap_or(&self.defaults)
    }
}
