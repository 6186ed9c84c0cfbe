//! State Digests
//!
//! SHA-256 over the live simulation, used for replay checkpoints and for
//! checking that two runs fed the same inputs ended in the same state.
//!
//! Every value is written in a fixed little-endian layout and variable
//! length data is length-prefixed, so the digest depends only on the
//! sequence of writes.

use glam::DVec3;
use sha2::{Digest, Sha256};

use crate::geometry::Collider;

/// Hash output type (256 bits / 32 bytes)
pub type StateHash = [u8; 32];

/// Domain tag of full game digests.
const GAME_DOMAIN: &[u8] = b"BENDING_GAME_STATE_V1";

/// Incremental digest of simulation state.
pub struct StateHasher {
    inner: Sha256,
}

impl StateHasher {
    /// Start a digest tagged with `domain`.
    pub fn new(domain: &[u8]) -> Self {
        let mut inner = Sha256::new();
        inner.update((domain.len() as u64).to_le_bytes());
        inner.update(domain);
        Self { inner }
    }

    /// Single byte.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.inner.update([value]);
    }

    /// Little-endian u64.
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.inner.update(value.to_le_bytes());
    }

    /// Collection length, as a u64.
    #[inline]
    pub fn update_len(&mut self, len: usize) {
        self.update_u64(len as u64);
    }

    /// Boolean as one byte.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(u8::from(value));
    }

    /// Float by bit pattern, so `-0.0` and `0.0` differ.
    #[inline]
    pub fn update_f64(&mut self, value: f64) {
        self.update_u64(value.to_bits());
    }

    /// Components in x, y, z order.
    pub fn update_vec3(&mut self, value: DVec3) {
        for component in value.to_array() {
            self.update_f64(component);
        }
    }

    /// Length-prefixed UTF-8.
    pub fn update_str(&mut self, value: &str) {
        self.update_len(value.len());
        self.inner.update(value.as_bytes());
    }

    /// Fixed-width 128-bit identifier.
    #[inline]
    pub fn update_id(&mut self, id: &[u8; 16]) {
        self.inner.update(id);
    }

    /// Shape tag followed by the collider's bounds.
    pub fn update_collider(&mut self, collider: &Collider) {
        let bounds = collider.bounds();
        self.update_u8(collider.kind() as u8);
        self.update_vec3(bounds.min);
        self.update_vec3(bounds.max);
    }

    /// Finish the digest.
    pub fn finalize(self) -> StateHash {
        self.inner.finalize().into()
    }
}

/// Digest of the game at `tick`. The tick is written first; `add_state`
/// writes everything else.
pub fn compute_state_hash<F>(tick: u64, add_state: F) -> StateHash
where
    F: FnOnce(&mut StateHasher),
{
    let mut hasher = StateHasher::new(GAME_DOMAIN);
    hasher.update_u64(tick);
    add_state(&mut hasher);
    hasher.finalize()
}
