//! # Bending Engine
//!
//! Tick-driven runtime for bending abilities: activation gating, per-tick
//! updates, pairwise collision resolution between live abilities and
//! combo recognition over users' recent actions.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      BENDING ENGINE                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  geometry/       - Collision volumes                         │
//! │  ├── aabb.rs     - Axis-aligned boxes                        │
//! │  ├── obb.rs      - Oriented boxes (separating axis test)     │
//! │  ├── sphere.rs   - Spheres                                   │
//! │  ├── ray.rs      - Bounded rays                              │
//! │  ├── disk.rs     - Slab capped by a sphere                   │
//! │  └── collider.rs - Tagged union and pairwise dispatch        │
//! │                                                              │
//! │  ability/        - Ability model                             │
//! │  ├── description - Registered kinds and activation methods   │
//! │  ├── instance.rs - Behavior trait and lifecycle              │
//! │  ├── context.rs  - Views handed to ability callbacks         │
//! │  └── policy.rs   - Per-tick removal conditions               │
//! │                                                              │
//! │  game/           - Simulation                                │
//! │  ├── manager.rs  - Per-world instances and the tick pipeline │
//! │  ├── collision.rs- Registrations and two-phase resolution    │
//! │  ├── sequence.rs - Action histories and combo matching       │
//! │  ├── world.rs    - One manager per world                     │
//! │  ├── replay.rs   - Input log and state checkpoints           │
//! │  └── engine.rs   - `Game` entry point                        │
//! │                                                              │
//! │  platform/       - Users and worlds supplied by the host     │
//! │  abilities/      - Built-in air abilities                    │
//! │  config.rs       - Engine settings and ability attributes    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! All simulation state is ordered (`BTreeMap`, instance ids in
//! activation order) and nothing reads the wall clock, so identical
//! inputs produce identical state hashes across runs.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod abilities;
pub mod ability;
pub mod config;
pub mod core;
pub mod error;
pub mod game;
pub mod geometry;
pub mod platform;

// Re-export commonly used types
pub use ability::{Ability, AbilityDescription, AbilityKey, Activation, Element, InstanceId};
pub use config::{ConfigStore, EngineConfig};
pub use error::{AbilityError, ConfigError, RegistryError, Rejection, ReplayError};
pub use game::{Game, GameBuilder, GameEvent, TickReport};
pub use geometry::Collider;
pub use platform::{Platform, User, UserId, World, WorldKey};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 20;

/// Milliseconds per tick
pub const TICK_MILLIS: u64 = 1000 / TICK_RATE as u64;

/// Simulation time in ticks.
pub type Tick = u64;
