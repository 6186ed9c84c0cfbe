//! Collision Detection
//!
//! Deterministic ability-vs-ability collision for one world per tick.
//!
//! ## Phases
//!
//! 1. Broad phase: every instance with colliders contributes one bound
//!    (union of its collider bounds, grown by the safety margin). The
//!    broad phase returns overlapping index pairs in sorted order.
//! 2. Narrow phase: for each candidate pair with a registration, the first
//!    intersecting collider pair (A's colliders in order, then B's) builds
//!    one `Collision`. A's callback runs, then B's with roles inverted.
//!    Both views share the same removal flags.
//!
//! A pair without a registration never collides. Instances owned by the
//! same user only collide when the registration allows self-collision.

use std::collections::{BTreeMap, BTreeSet};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::error;

use super::broad_phase::{BroadPhase, SweepAndPrune};
use super::events::{EventPriority, GameEvent, GameEventData, RemovalReason};
use crate::ability::{AbilityDescription, AbilityInstance, AbilityKey, AbilityRegistry, InstanceId};
use crate::error::RegistryError;
use crate::geometry::{Aabb, Collider};
use crate::platform::UserId;
use crate::Tick;

// =============================================================================
// REGISTRATIONS
// =============================================================================

/// Declares that two ability kinds collide, and who is removed by default.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollisionPair {
    /// First kind
    pub first: AbilityKey,
    /// Second kind
    pub second: AbilityKey,
    /// Default removal of the `first` instance
    pub remove_first: bool,
    /// Default removal of the `second` instance
    pub remove_second: bool,
    /// Whether instances of the same user may collide
    pub self_collision: bool,
}

impl CollisionPair {
    /// Registration without self-collision.
    pub fn new(first: AbilityKey, second: AbilityKey, remove_first: bool, remove_second: bool) -> Self {
        Self {
            first,
            second,
            remove_first,
            remove_second,
            self_collision: false,
        }
    }

    /// Allow same-user collisions.
    pub fn with_self_collision(mut self, allowed: bool) -> Self {
        self.self_collision = allowed;
        self
    }
}

/// A registration oriented to the order of a lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Disposition {
    /// Default removal of the first looked-up kind
    pub remove_self: bool,
    /// Default removal of the second looked-up kind
    pub remove_other: bool,
    /// Same-user collisions allowed
    pub self_collision: bool,
}

/// Unordered table of collidable kind pairs.
#[derive(Clone, Debug, Default)]
pub struct CollisionRegistry {
    pairs: BTreeMap<(AbilityKey, AbilityKey), CollisionPair>,
}

impl CollisionRegistry {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a registration. Explicit registrations take
    /// precedence over layered ones whichever is registered first.
    pub fn register(&mut self, pair: CollisionPair) {
        self.pairs.insert(Self::key_of(&pair), pair);
    }

    /// Add a layer-generated registration unless the pair is already known.
    fn register_layered(&mut self, pair: CollisionPair) {
        self.pairs.entry(Self::key_of(&pair)).or_insert(pair);
    }

    fn key_of(pair: &CollisionPair) -> (AbilityKey, AbilityKey) {
        if pair.first <= pair.second {
            (pair.first.clone(), pair.second.clone())
        } else {
            (pair.second.clone(), pair.first.clone())
        }
    }

    /// Register layered cancellation.
    ///
    /// Abilities within one layer remove each other, including two
    /// instances of the same kind. Every ability in a lower layer is removed
    /// by every ability in a higher layer, which survives. Pairs that are
    /// already registered keep their disposition.
    pub fn register_layers(&mut self, layers: &[Vec<AbilityKey>]) {
        for (index, layer) in layers.iter().enumerate() {
            for (i, a) in layer.iter().enumerate() {
                for b in &layer[i..] {
                    self.register_layered(CollisionPair::new(a.clone(), b.clone(), true, true));
                }
            }
            for lower in &layers[..index] {
                for weak in lower {
                    for strong in layer {
                        self.register_layered(CollisionPair::new(weak.clone(), strong.clone(), true, false));
                    }
                }
            }
        }
    }

    /// Registration for `(a, b)`, oriented so `remove_self` refers to `a`.
    pub fn lookup(&self, a: &AbilityKey, b: &AbilityKey) -> Option<Disposition> {
        let key = if a <= b {
            (a.clone(), b.clone())
        } else {
            (b.clone(), a.clone())
        };
        let pair = self.pairs.get(&key)?;
        let (remove_self, remove_other) = if &pair.first == a {
            (pair.remove_first, pair.remove_second)
        } else {
            (pair.remove_second, pair.remove_first)
        };
        Some(Disposition {
            remove_self,
            remove_other,
            self_collision: pair.self_collision,
        })
    }

    /// Check that every registration names a known ability.
    pub fn validate(&self, abilities: &AbilityRegistry) -> Result<(), RegistryError> {
        for pair in self.pairs.values() {
            for key in [&pair.first, &pair.second] {
                if !abilities.contains(key) {
                    return Err(RegistryError::UnknownAbility(key.clone()));
                }
            }
        }
        Ok(())
    }

    /// Number of registrations.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether empty.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

// =============================================================================
// COLLISION VIEW
// =============================================================================

#[derive(Clone, Copy, Debug)]
struct Flag {
    value: bool,
    latched: bool,
}

impl Flag {
    fn seeded(value: bool) -> Self {
        Self {
            value,
            latched: false,
        }
    }

    fn set(&mut self, value: bool) {
        if self.latched {
            return;
        }
        self.value = value;
        self.latched = value;
    }
}

/// Removal flags shared by both sides of one collision.
///
/// Seeded from the registration. A callback may clear a seeded flag, but
/// once any callback sets a flag it stays set.
#[derive(Clone, Copy, Debug)]
pub struct RemovalFlags {
    first: Flag,
    second: Flag,
}

impl RemovalFlags {
    /// Flags seeded from a disposition.
    pub fn seeded(remove_first: bool, remove_second: bool) -> Self {
        Self {
            first: Flag::seeded(remove_first),
            second: Flag::seeded(remove_second),
        }
    }

    /// Final value for the first instance.
    pub fn remove_first(&self) -> bool {
        self.first.value
    }

    /// Final value for the second instance.
    pub fn remove_second(&self) -> bool {
        self.second.value
    }
}

/// One side of a collision.
#[derive(Clone, Copy, Debug)]
pub struct Participant<'a> {
    /// Instance id
    pub id: InstanceId,
    /// Owner
    pub user: UserId,
    /// Ability kind
    pub description: &'a AbilityDescription,
    /// The collider that intersected
    pub collider: Collider,
}

/// Collision as seen from one participant.
pub struct Collision<'a> {
    me: Participant<'a>,
    other: Participant<'a>,
    flags: &'a mut RemovalFlags,
    inverted: bool,
}

impl<'a> Collision<'a> {
    /// The receiving side.
    pub fn this(&self) -> &Participant<'a> {
        &self.me
    }

    /// The other side.
    pub fn other(&self) -> &Participant<'a> {
        &self.other
    }

    /// Kind of the other instance.
    pub fn collided_ability(&self) -> &AbilityDescription {
        self.other.description
    }

    /// This side's intersecting collider.
    pub fn collider_self(&self) -> &Collider {
        &self.me.collider
    }

    /// Other side's intersecting collider.
    pub fn collider_other(&self) -> &Collider {
        &self.other.collider
    }

    /// Whether this instance will be removed.
    pub fn remove_self(&self) -> bool {
        if self.inverted {
            self.flags.second.value
        } else {
            self.flags.first.value
        }
    }

    /// Whether the other instance will be removed.
    pub fn remove_other(&self) -> bool {
        if self.inverted {
            self.flags.first.value
        } else {
            self.flags.second.value
        }
    }

    /// Request or cancel this instance's removal.
    pub fn set_remove_self(&mut self, value: bool) {
        if self.inverted {
            self.flags.second.set(value);
        } else {
            self.flags.first.set(value);
        }
    }

    /// Request or cancel the other instance's removal.
    pub fn set_remove_other(&mut self, value: bool) {
        if self.inverted {
            self.flags.first.set(value);
        } else {
            self.flags.second.set(value);
        }
    }
}

// =============================================================================
// ENGINE
// =============================================================================

struct Candidate {
    id: InstanceId,
    user: UserId,
    description: Arc<AbilityDescription>,
    colliders: Vec<Collider>,
}

/// Per-world collision pass.
pub struct CollisionEngine {
    margin: f64,
    broad_phase: Box<dyn BroadPhase + Send + Sync>,
}

impl std::fmt::Debug for CollisionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollisionEngine")
            .field("margin", &self.margin)
            .finish()
    }
}

impl Default for CollisionEngine {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl CollisionEngine {
    /// Engine with sweep-and-prune and the given bound margin.
    pub fn new(margin: f64) -> Self {
        Self {
            margin: if margin.is_finite() { margin.abs() } else { 0.0 },
            broad_phase: Box::new(SweepAndPrune),
        }
    }

    /// Swap the broad phase implementation.
    pub fn with_broad_phase(mut self, broad_phase: impl BroadPhase + Send + Sync + 'static) -> Self {
        self.broad_phase = Box::new(broad_phase);
        self
    }

    /// Bound margin.
    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// Run both phases over `instances`, skipping ids in `skip`.
    ///
    /// Returns every instance flagged for removal, each once.
    pub fn run(
        &self,
        instances: &mut BTreeMap<InstanceId, AbilityInstance>,
        skip: &BTreeSet<InstanceId>,
        registry: &CollisionRegistry,
        now: Tick,
        events: &mut Vec<GameEvent>,
    ) -> BTreeMap<InstanceId, RemovalReason> {
        let mut removed = BTreeMap::new();
        if registry.is_empty() {
            return removed;
        }

        let candidates: Vec<Candidate> = instances
            .values()
            .filter(|inst| inst.is_active() && !skip.contains(&inst.id()))
            .filter(|inst| !inst.colliders().is_empty())
            .map(|inst| Candidate {
                id: inst.id(),
                user: inst.user(),
                description: Arc::clone(inst.description()),
                colliders: inst.colliders().to_vec(),
            })
            .collect();
        if candidates.len() < 2 {
            return removed;
        }

        let bounds: Vec<Aabb> = candidates
            .iter()
            .map(|c| {
                c.colliders
                    .iter()
                    .map(|collider| collider.bounds().expand(self.margin))
                    .reduce(|a, b| a.union(&b))
                    .unwrap_or_else(|| Aabb::point(glam::DVec3::ZERO))
            })
            .collect();

        for (i, j) in self.broad_phase.pairs(&bounds) {
            let a = &candidates[i];
            let b = &candidates[j];

            let Some(disposition) = registry.lookup(a.description.key(), b.description.key()) else {
                continue;
            };
            if a.user == b.user && !disposition.self_collision {
                continue;
            }
            let Some((collider_a, collider_b)) = first_contact(&a.colliders, &b.colliders) else {
                continue;
            };

            #[cfg(feature = "debug-tracing")]
            tracing::trace!(
                first = %a.id,
                second = %b.id,
                "narrow phase contact"
            );

            let mut flags = RemovalFlags::seeded(disposition.remove_self, disposition.remove_other);
            let side_a = Participant {
                id: a.id,
                user: a.user,
                description: &a.description,
                collider: collider_a,
            };
            let side_b = Participant {
                id: b.id,
                user: b.user,
                description: &b.description,
                collider: collider_b,
            };

            for (receiver, me, other, inverted) in
                [(a.id, side_a, side_b, false), (b.id, side_b, side_a, true)]
            {
                let Some(instance) = instances.get_mut(&receiver) else {
                    continue;
                };
                let Some(ability) = instance.ability_mut() else {
                    continue;
                };
                let mut collision = Collision {
                    me,
                    other,
                    flags: &mut flags,
                    inverted,
                };
                let outcome = catch_unwind(AssertUnwindSafe(|| ability.on_collision(&mut collision)));
                if outcome.is_err() {
                    error!(
                        instance = %receiver,
                        ability = %instance.description().key(),
                        "collision callback panicked"
                    );
                    removed.insert(receiver, RemovalReason::Fault);
                }
            }

            if flags.remove_first() {
                removed.entry(a.id).or_insert(RemovalReason::Collision);
            }
            if flags.remove_second() {
                removed.entry(b.id).or_insert(RemovalReason::Collision);
            }

            events.push(GameEvent::new(
                now,
                EventPriority::Collision,
                GameEventData::CollisionResolved {
                    first: a.id,
                    second: b.id,
                    first_ability: a.description.key().clone(),
                    second_ability: b.description.key().clone(),
                    remove_first: flags.remove_first(),
                    remove_second: flags.remove_second(),
                },
            ));
        }

        removed
    }
}

/// First intersecting pair, A's colliders outermost.
fn first_contact(a: &[Collider], b: &[Collider]) -> Option<(Collider, Collider)> {
    a.iter()
        .flat_map(|ca| b.iter().map(move |cb| (ca, cb)))
        .find(|(ca, cb)| ca.intersects(cb))
        .map(|(ca, cb)| (*ca, *cb))
}
