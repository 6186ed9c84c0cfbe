//! Core primitives shared by every layer.
//!
//! State digests used for replay checkpoints and cross-run verification.

pub mod hash;

pub use hash::{compute_state_hash, StateHash, StateHasher};
