//! Game Events
//!
//! Events generated during simulation, returned in each tick report for
//! the presentation layer and recorded for replay comparison.

use serde::{Deserialize, Serialize};

use crate::ability::{AbilityKey, Activation, InstanceId};
use crate::platform::UserId;
use crate::Tick;

/// Priority for event processing order.
///
/// Lower value = processed first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventPriority {
    /// Config changes apply before anything else in a tick
    Config = 0,
    /// Then collisions
    Collision = 1,
    /// Then removals
    Removal = 2,
    /// Then new activations
    Activation = 3,
    /// Then combos
    Sequence = 4,
    /// Lowest priority
    Other = 255,
}

/// Why an instance ended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalReason {
    /// `update` returned `Remove`
    Completed,
    /// A removal condition held
    Policy {
        /// Condition name
        condition: String,
    },
    /// A collision flagged it
    Collision,
    /// `update` failed or panicked
    Fault,
    /// Destroyed from outside (disconnect, world change, command)
    Forced,
    /// Owner no longer exists
    UserMissing,
    /// The world partition went away
    WorldUnloaded,
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEventData {
    /// An activation produced a live instance
    AbilityActivated {
        /// Owner
        user_id: UserId,
        /// Ability kind
        ability: AbilityKey,
        /// New instance
        instance: InstanceId,
        /// Triggering method
        method: Activation,
    },

    /// An instance was torn down
    AbilityRemoved {
        /// Owner at removal
        user_id: UserId,
        /// Ability kind
        ability: AbilityKey,
        /// Removed instance
        instance: InstanceId,
        /// Cause
        reason: RemovalReason,
    },

    /// Two registered instances intersected
    CollisionResolved {
        /// Lower instance id
        first: InstanceId,
        /// Higher instance id
        second: InstanceId,
        /// Kind of `first`
        first_ability: AbilityKey,
        /// Kind of `second`
        second_ability: AbilityKey,
        /// Final removal flag for `first`
        remove_first: bool,
        /// Final removal flag for `second`
        remove_second: bool,
    },

    /// A combo matched the user's recent actions
    SequenceTriggered {
        /// Acting user
        user_id: UserId,
        /// Combo ability
        sequence: AbilityKey,
    },

    /// New ability attributes are in effect
    ConfigReloaded {
        /// Snapshot generation
        generation: u64,
    },

    /// A reload was rejected; previous values kept
    ConfigReloadFailed {
        /// Error text
        reason: String,
    },
}

/// A game event with timing and priority.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick when event occurred
    pub tick: Tick,

    /// Processing priority
    pub priority: EventPriority,

    /// User involved (for tie-breaking)
    pub user_id: Option<UserId>,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(tick: Tick, priority: EventPriority, data: GameEventData) -> Self {
        let user_id = match &data {
            GameEventData::AbilityActivated { user_id, .. } => Some(*user_id),
            GameEventData::AbilityRemoved { user_id, .. } => Some(*user_id),
            GameEventData::SequenceTriggered { user_id, .. } => Some(*user_id),
            _ => None,
        };

        Self {
            tick,
            priority,
            user_id,
            data,
        }
    }

    /// Create ability activated event.
    pub fn ability_activated(
        tick: Tick,
        user_id: UserId,
        ability: AbilityKey,
        instance: InstanceId,
        method: Activation,
    ) -> Self {
        Self::new(
            tick,
            EventPriority::Activation,
            GameEventData::AbilityActivated {
                user_id,
                ability,
                instance,
                method,
            },
        )
    }

    /// Create ability removed event.
    pub fn ability_removed(
        tick: Tick,
        user_id: UserId,
        ability: AbilityKey,
        instance: InstanceId,
        reason: RemovalReason,
    ) -> Self {
        Self::new(
            tick,
            EventPriority::Removal,
            GameEventData::AbilityRemoved {
                user_id,
                ability,
                instance,
                reason,
            },
        )
    }

    /// Create sequence triggered event.
    pub fn sequence_triggered(tick: Tick, user_id: UserId, sequence: AbilityKey) -> Self {
        Self::new(
            tick,
            EventPriority::Sequence,
            GameEventData::SequenceTriggered { user_id, sequence },
        )
    }

    /// Create config reloaded event.
    pub fn config_reloaded(tick: Tick, generation: u64) -> Self {
        Self::new(
            tick,
            EventPriority::Config,
            GameEventData::ConfigReloaded { generation },
        )
    }

    /// Create config reload failed event.
    pub fn config_reload_failed(tick: Tick, reason: String) -> Self {
        Self::new(
            tick,
            EventPriority::Config,
            GameEventData::ConfigReloadFailed { reason },
        )
    }
}

impl PartialEq for GameEvent {
    fn eq(&self, other: &Self) -> bool {
        self.tick == other.tick
            && self.priority == other.priority
            && self.user_id == other.user_id
    }
}

impl Eq for GameEvent {}

impl PartialOrd for GameEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GameEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Sort by: tick, then priority, then user_id
        self.tick
            .cmp(&other.tick)
            .then(self.priority.cmp(&other.priority))
            .then(self.user_id.cmp(&other.user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_ordering() {
        let id1 = UserId::new([1; 16]);
        let id2 = UserId::new([2; 16]);
        let key = AbilityKey::new("airblast").unwrap();

        let removed1 =
            GameEvent::ability_removed(10, id1, key.clone(), InstanceId(1), RemovalReason::Completed);
        let activated =
            GameEvent::ability_activated(10, id1, key.clone(), InstanceId(2), Activation::Attack);
        let removed2 =
            GameEvent::ability_removed(10, id2, key, InstanceId(3), RemovalReason::Forced);

        // Same tick, but removal < activation
        assert!(removed1 < activated);

        // Same tick and priority, but id1 < id2
        assert!(removed1 < removed2);

        // Config events carry no user and come first
        assert!(GameEvent::config_reloaded(10, 2) < removed1);
    }
}
