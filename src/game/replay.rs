//! Replay Recording
//!
//! Every raw input the game receives is recorded with its tick, together
//! with a state hash checkpoint every N ticks. Feeding the same inputs to
//! a fresh game must reproduce every checkpoint; `first_divergence` finds
//! where two runs stopped agreeing.

use serde::{Deserialize, Serialize};

use crate::ability::{AbilityKey, Activation};
use crate::config::ParsedConfig;
use crate::core::hash::StateHash;
use crate::error::ReplayError;
use crate::platform::{UserId, WorldKey};
use crate::Tick;

/// Current log format version.
pub const REPLAY_VERSION: u32 = 2;

/// Default checkpoint interval (every 5 seconds at 20 Hz).
pub const CHECKPOINT_INTERVAL: Tick = 100;

/// One externally supplied input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ReplayInput {
    /// A raw activation attempt
    Action {
        /// Acting user
        user: UserId,
        /// Ability the attempt targeted
        ability: AbilityKey,
        /// Method used
        method: Activation,
    },
    /// Passive abilities recreated
    Passives {
        /// Affected user
        user: UserId,
    },
    /// Forced removal of one ability kind
    DestroyInstance {
        /// Owner
        user: UserId,
        /// Ability kind
        ability: AbilityKey,
    },
    /// User left
    Disconnect {
        /// Departed user
        user: UserId,
    },
    /// User moved worlds
    WorldChange {
        /// Moving user
        user: UserId,
        /// World left behind
        from: WorldKey,
    },
    /// Ability attributes swapped in
    Config {
        /// The applied document
        attributes: ParsedConfig,
    },
}

/// An input stamped with the tick it arrived in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordedInput {
    /// Tick of arrival
    pub tick: Tick,
    /// The input
    pub input: ReplayInput,
}

/// State digest at a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Tick number
    pub tick: Tick,
    /// Digest after that tick
    pub state_hash: StateHash,
    /// Live instance count, for quick triage
    pub instances: u32,
}

/// Complete record of one session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplayLog {
    /// Format version
    pub version: u32,
    /// Ticks between checkpoints
    pub checkpoint_interval: Tick,
    /// Inputs in arrival order
    pub inputs: Vec<RecordedInput>,
    /// Checkpoints in tick order
    pub checkpoints: Vec<Checkpoint>,
}

impl Default for ReplayLog {
    fn default() -> Self {
        Self::new(CHECKPOINT_INTERVAL)
    }
}

impl ReplayLog {
    /// Empty log checkpointing every `checkpoint_interval` ticks (0 disables).
    pub fn new(checkpoint_interval: Tick) -> Self {
        Self {
            version: REPLAY_VERSION,
            checkpoint_interval,
            inputs: Vec::new(),
            checkpoints: Vec::new(),
        }
    }

    /// Record an input.
    pub fn record(&mut self, tick: Tick, input: ReplayInput) {
        self.inputs.push(RecordedInput { tick, input });
    }

    /// Whether a checkpoint is due after `tick`.
    pub fn is_checkpoint_tick(&self, tick: Tick) -> bool {
        self.checkpoint_interval > 0 && tick % self.checkpoint_interval == 0
    }

    /// Record a checkpoint.
    pub fn add_checkpoint(&mut self, tick: Tick, state_hash: StateHash, instances: usize) {
        self.checkpoints.push(Checkpoint {
            tick,
            state_hash,
            instances: u32::try_from(instances).unwrap_or(u32::MAX),
        });
    }

    /// Inputs recorded for `tick`.
    pub fn inputs_at(&self, tick: Tick) -> impl Iterator<Item = &ReplayInput> {
        self.inputs
            .iter()
            .filter(move |r| r.tick == tick)
            .map(|r| &r.input)
    }

    /// Last tick with an input or checkpoint.
    pub fn last_tick(&self) -> Tick {
        let input = self.inputs.last().map_or(0, |r| r.tick);
        let checkpoint = self.checkpoints.last().map_or(0, |c| c.tick);
        input.max(checkpoint)
    }

    /// First tick whose checkpoint differs between the two logs. Ticks
    /// checkpointed by only one log are ignored.
    pub fn first_divergence(&self, other: &ReplayLog) -> Option<Tick> {
        let mut theirs = other.checkpoints.iter().peekable();
        for mine in &self.checkpoints {
            while theirs.peek().is_some_and(|c| c.tick < mine.tick) {
                theirs.next();
            }
            if let Some(candidate) = theirs.peek() {
                if candidate.tick == mine.tick && candidate != &mine {
                    return Some(mine.tick);
                }
            }
        }
        None
    }

    /// Encode with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ReplayError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode, rejecting other format versions.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ReplayError> {
        let log: ReplayLog = bincode::deserialize(data)?;
        if log.version != REPLAY_VERSION {
            return Err(ReplayError::Version {
                found: log.version,
                expected: REPLAY_VERSION,
            });
        }
        Ok(log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(byte: u8) -> ReplayInput {
        ReplayInput::Action {
            user: UserId::new([byte; 16]),
            ability: AbilityKey::new("blast").unwrap(),
            method: Activation::Attack,
        }
    }

    #[test]
    fn test_inputs_by_tick() {
        let mut log = ReplayLog::new(10);
        log.record(3, action(1));
        log.record(3, action(2));
        log.record(4, ReplayInput::Disconnect { user: UserId::new([1; 16]) });

        assert_eq!(log.inputs_at(3).count(), 2);
        assert_eq!(log.inputs_at(5).count(), 0);
        assert_eq!(log.last_tick(), 4);
    }

    #[test]
    fn test_checkpoint_schedule() {
        let log = ReplayLog::new(10);
        assert!(log.is_checkpoint_tick(20));
        assert!(!log.is_checkpoint_tick(21));
        assert!(!ReplayLog::new(0).is_checkpoint_tick(0));
    }

    #[test]
    fn test_first_divergence() {
        let mut a = ReplayLog::new(10);
        let mut b = ReplayLog::new(10);
        for tick in [10, 20, 30] {
            a.add_checkpoint(tick, [tick as u8; 32], 1);
            b.add_checkpoint(tick, [tick as u8; 32], 1);
        }
        assert_eq!(a.first_divergence(&b), None);

        b.checkpoints[1].state_hash = [0xff; 32];
        b.checkpoints[2].state_hash = [0xff; 32];
        assert_eq!(a.first_divergence(&b), Some(20));
    }

    #[test]
    fn test_encoded_log_decodes_and_checks_version() {
        let mut log = ReplayLog::new(10);
        log.record(1, action(7));
        log.add_checkpoint(10, [3; 32], 2);
        let bytes = log.to_bytes().unwrap();
        assert_eq!(ReplayLog::from_bytes(&bytes).unwrap(), log);

        log.version = 99;
        let bytes = log.to_bytes().unwrap();
        assert!(matches!(
            ReplayLog::from_bytes(&bytes),
            Err(ReplayError::Version { found: 99, .. })
        ));
        assert!(ReplayLog::from_bytes(&[1, 2, 3]).is_err());
    }
}
