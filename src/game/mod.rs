//! Game Logic Module
//!
//! Everything that runs on the simulation thread.
//!
//! ## Module Structure
//!
//! - `manager`: per-world instance ownership and the tick pipeline
//! - `collision`: registrations, collision views and the two-phase engine
//! - `broad_phase`: candidate pair search
//! - `sequence`: combos, action histories and matching
//! - `cooldown`: per-user ability cooldowns
//! - `temporal`: expiring references to transient entities
//! - `events`: events returned in tick reports
//! - `deferred`: background work handed back at tick boundaries
//! - `replay`: recorded inputs and state checkpoints
//! - `world`: one manager per world
//! - `engine`: the `Game` entry point

pub mod broad_phase;
pub mod collision;
pub mod cooldown;
pub mod deferred;
pub mod engine;
pub mod events;
pub mod manager;
pub mod replay;
pub mod sequence;
pub mod temporal;
pub mod world;

// Re-export key types
pub use collision::{Collision, CollisionEngine, CollisionPair, CollisionRegistry, Participant};
pub use cooldown::CooldownTracker;
pub use deferred::{Deferred, DeferredQueue, DeferredSender};
pub use engine::{Game, GameBuilder, TickReport};
pub use events::{EventPriority, GameEvent, GameEventData, RemovalReason};
pub use manager::{AbilityManager, TickEnv};
pub use replay::{ReplayInput, ReplayLog};
pub use sequence::{ActionHistory, Sequence, SequenceManager, SequenceRegistry, SequenceStep};
pub use temporal::{ExpiringRef, ExpiringSet};
pub use world::WorldManager;
