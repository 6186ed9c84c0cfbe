//! Error Types
//!
//! Activation refusals are not errors: `Rejection` explains a `false`
//! return. Everything else that can fail reports through one of the
//! `thiserror` enums below.

use thiserror::Error;

use crate::ability::AbilityKey;

/// Fault raised by an ability's update step.
///
/// The manager logs it and force-destroys the instance.
#[derive(Debug, Clone, Error)]
pub enum AbilityError {
    /// Internal state no longer makes sense
    #[error("invalid ability state: {0}")]
    InvalidState(String),

    /// A collaborator lookup the ability depends on failed
    #[error("missing {0}")]
    Missing(&'static str),

    /// Anything else
    #[error("{0}")]
    Custom(String),
}

/// Configuration load or reload failure. The previous snapshot stays active.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    /// Document is not valid JSON of the expected shape
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Attribute value is not a finite number
    #[error("invalid attribute {ability}.{attribute}: {value}")]
    InvalidAttribute {
        /// Ability the attribute belongs to
        ability: String,
        /// Attribute name
        attribute: String,
        /// Offending value
        value: f64,
    },

    /// Section names an ability that is not registered
    #[error("unknown ability in config: {0}")]
    UnknownAbility(String),
}

/// Registration failure while wiring abilities, collisions or sequences.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Key already registered
    #[error("duplicate ability: {0}")]
    Duplicate(AbilityKey),

    /// Registry no longer accepts entries
    #[error("registry is locked")]
    Locked,

    /// Name is empty or not alphabetic
    #[error("invalid ability name: {0:?}")]
    InvalidName(String),

    /// Description lacks a required part
    #[error("invalid description for {key}: {reason}")]
    InvalidDescription {
        /// Ability key
        key: String,
        /// What is wrong
        reason: &'static str,
    },

    /// Combo definition is malformed
    #[error("invalid sequence {key}: {reason}")]
    InvalidSequence {
        /// Combo ability key
        key: AbilityKey,
        /// What is wrong
        reason: &'static str,
    },

    /// Referenced ability is not registered
    #[error("unknown ability: {0}")]
    UnknownAbility(AbilityKey),
}

/// Replay log encode/decode failure.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// bincode failure
    #[error("replay encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    /// Log written by an incompatible version
    #[error("unsupported replay version {found}, expected {expected}")]
    Version {
        /// Version in the log
        found: u32,
        /// Version this build writes
        expected: u32,
    },
}

/// Why an activation was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    /// Description does not list this activation method
    #[error("activation method not accepted")]
    WrongMethod,

    /// User lacks the element or permission
    #[error("user cannot bend this ability")]
    CannotBend,

    /// Ability is cooling down
    #[error("ability on cooldown")]
    OnCooldown,

    /// Uniqueness policy already satisfied
    #[error("instance limit reached")]
    InstanceLimit,

    /// User is not in this manager's world
    #[error("user is in another world")]
    WorldMismatch,

    /// User or world is not loaded
    #[error("user or world unavailable")]
    Unavailable,

    /// The ability's own activation check declined
    #[error("ability declined activation")]
    Declined,
}
