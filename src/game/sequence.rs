//! Sequences
//!
//! Combos recognized from a user's recent activation attempts. Every raw
//! attempt is appended to the user's `ActionHistory`; after each append the
//! tail of the history is compared against every registered `Sequence`.
//!
//! Matching rules:
//! - exact equality of (ability, method) for each step
//! - the longest matching sequence wins
//! - among matches of equal length, the most recently registered wins
//! - matched entries stay in the history, so combos can overlap

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::Arc;

use crate::ability::{AbilityDescription, AbilityKey, AbilityRegistry, Activation};
use crate::error::RegistryError;
use crate::platform::UserId;
use crate::Tick;

/// Label shown for a sneak press immediately released.
pub const TAP_SNEAK_LABEL: &str = "Tap Sneak";

// =============================================================================
// STEPS
// =============================================================================

/// One recorded or required action.
#[derive(Clone)]
pub struct SequenceStep {
    ability: Arc<AbilityDescription>,
    activation: Activation,
}

impl SequenceStep {
    /// Step for `ability` triggered by `activation`.
    pub fn new(ability: Arc<AbilityDescription>, activation: Activation) -> Self {
        Self {
            ability,
            activation,
        }
    }

    /// Ability of this step.
    pub fn ability(&self) -> &Arc<AbilityDescription> {
        &self.ability
    }

    /// Method of this step.
    pub fn activation(&self) -> Activation {
        self.activation
    }
}

impl PartialEq for SequenceStep {
    fn eq(&self, other: &Self) -> bool {
        self.activation == other.activation && self.ability.key() == other.ability.key()
    }
}

impl Eq for SequenceStep {}

impl fmt::Debug for SequenceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:?}", self.ability.key(), self.activation)
    }
}

// =============================================================================
// SEQUENCE
// =============================================================================

/// An immutable combo bound to its compound ability.
#[derive(Clone)]
pub struct Sequence {
    description: Arc<AbilityDescription>,
    steps: Vec<SequenceStep>,
}

impl Sequence {
    /// Fewest steps in a combo.
    pub const MIN_STEPS: usize = 2;
    /// Most steps in a combo.
    pub const MAX_STEPS: usize = 16;

    /// Bind `steps` to a description built with `build_sequence`.
    pub fn new(description: Arc<AbilityDescription>, steps: Vec<SequenceStep>) -> Result<Self, RegistryError> {
        let invalid = |reason| RegistryError::InvalidSequence {
            key: description.key().clone(),
            reason,
        };
        if !description.is_activated_by(Activation::Sequence) {
            return Err(invalid("description is not sequence-activated"));
        }
        if steps.len() < Self::MIN_STEPS {
            return Err(invalid("fewer than two steps"));
        }
        if steps.len() > Self::MAX_STEPS {
            return Err(invalid("more than sixteen steps"));
        }
        if steps.iter().any(|s| s.activation == Activation::Sequence) {
            return Err(invalid("step uses sequence activation"));
        }
        Ok(Self { description, steps })
    }

    /// Compound ability activated on match.
    pub fn description(&self) -> &Arc<AbilityDescription> {
        &self.description
    }

    /// Required steps in order.
    pub fn steps(&self) -> &[SequenceStep] {
        &self.steps
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false; a sequence has at least two steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Whether the tail of `history` equals this sequence.
    pub fn matches(&self, history: &ActionHistory) -> bool {
        if history.len() < self.steps.len() {
            return false;
        }
        history
            .entries
            .iter()
            .rev()
            .zip(self.steps.iter().rev())
            .all(|((recorded, _), required)| recorded == required)
    }

    /// Human-readable instructions, e.g. `Scooter (Left Click) > Wheel (Tap Sneak)`.
    ///
    /// A sneak step directly followed by a sneak release of the same ability
    /// renders as one tap step.
    pub fn instructions(&self) -> String {
        let mut parts = Vec::with_capacity(self.steps.len());
        let mut i = 0;
        while i < self.steps.len() {
            let step = &self.steps[i];
            let mut label = step.activation.label();
            if step.activation == Activation::Sneak {
                if let Some(next) = self.steps.get(i + 1) {
                    if next.activation == Activation::SneakRelease && next.ability.key() == step.ability.key() {
                        label = TAP_SNEAK_LABEL;
                        i += 1;
                    }
                }
            }
            parts.push(format!("{} ({})", step.ability.display_name(), label));
            i += 1;
        }
        parts.join(" > ")
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequence")
            .field("ability", self.description.key())
            .field("steps", &self.steps)
            .finish()
    }
}

/// Registered combos in registration order.
#[derive(Debug, Default, Clone)]
pub struct SequenceRegistry {
    sequences: Vec<Arc<Sequence>>,
}

impl SequenceRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a combo. Each compound ability may own only one sequence.
    pub fn register(&mut self, sequence: Sequence) -> Result<Arc<Sequence>, RegistryError> {
        let key = sequence.description.key();
        if self.sequences.iter().any(|s| s.description.key() == key) {
            return Err(RegistryError::Duplicate(key.clone()));
        }
        let sequence = Arc::new(sequence);
        self.sequences.push(Arc::clone(&sequence));
        Ok(sequence)
    }

    /// Check that every compound ability and step ability is registered.
    pub fn validate(&self, abilities: &AbilityRegistry) -> Result<(), RegistryError> {
        for sequence in &self.sequences {
            let keys = std::iter::once(sequence.description.key())
                .chain(sequence.steps.iter().map(|s| s.ability.key()));
            for key in keys {
                if !abilities.contains(key) {
                    return Err(RegistryError::UnknownAbility(key.clone()));
                }
            }
        }
        Ok(())
    }

    /// Combo owned by `key`.
    pub fn by_key(&self, key: &AbilityKey) -> Option<&Arc<Sequence>> {
        self.sequences.iter().find(|s| s.description.key() == key)
    }

    /// All combos in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Sequence>> {
        self.sequences.iter()
    }

    /// Longest combo length, at least 1.
    pub fn max_len(&self) -> usize {
        self.sequences.iter().map(|s| s.len()).max().unwrap_or(1)
    }

    /// Number of combos.
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    /// Whether empty.
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

// =============================================================================
// HISTORY
// =============================================================================

/// Bounded per-user log of recent steps with their tick.
#[derive(Debug, Clone)]
pub struct ActionHistory {
    entries: VecDeque<(SequenceStep, Tick)>,
    capacity: usize,
}

impl ActionHistory {
    /// History holding at most `capacity` steps (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append, evicting the oldest entry when full.
    pub fn push(&mut self, step: SequenceStep, now: Tick) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((step, now));
    }

    /// Drop entries more than `timeout` ticks old.
    pub fn prune(&mut self, now: Tick, timeout: Tick) {
        while let Some((_, at)) = self.entries.front() {
            if now.saturating_sub(*at) <= timeout {
                break;
            }
            self.entries.pop_front();
        }
    }

    /// Recorded steps, oldest first.
    pub fn steps(&self) -> impl Iterator<Item = &SequenceStep> {
        self.entries.iter().map(|(step, _)| step)
    }

    /// Most recent step.
    pub fn last(&self) -> Option<&SequenceStep> {
        self.entries.back().map(|(step, _)| step)
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Maximum length.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// MANAGER
// =============================================================================

/// Per-user histories plus matching.
#[derive(Debug)]
pub struct SequenceManager {
    registry: SequenceRegistry,
    histories: BTreeMap<UserId, ActionHistory>,
    timeout: Tick,
}

impl SequenceManager {
    /// Match against `registry`; entries older than `timeout` ticks are stale.
    pub fn new(registry: SequenceRegistry, timeout: Tick) -> Self {
        Self {
            registry,
            histories: BTreeMap::new(),
            timeout,
        }
    }

    /// Registered combos.
    pub fn registry(&self) -> &SequenceRegistry {
        &self.registry
    }

    /// Record a raw activation attempt and return the combo it completes.
    pub fn register_step(&mut self, user: UserId, step: SequenceStep, now: Tick) -> Option<Arc<Sequence>> {
        if self.registry.is_empty() {
            return None;
        }
        let capacity = self.registry.max_len();
        let history = self
            .histories
            .entry(user)
            .or_insert_with(|| ActionHistory::new(capacity));
        history.prune(now, self.timeout);
        history.push(step, now);

        let mut best: Option<&Arc<Sequence>> = None;
        for sequence in self.registry.iter() {
            if !sequence.matches(history) {
                continue;
            }
            // Later registrations replace earlier ones of equal length.
            if best.map_or(true, |b| sequence.len() >= b.len()) {
                best = Some(sequence);
            }
        }
        best.cloned()
    }

    /// History of `user`, if any step was recorded.
    pub fn history(&self, user: UserId) -> Option<&ActionHistory> {
        self.histories.get(&user)
    }

    /// Forget a user's history.
    pub fn clear(&mut self, user: UserId) {
        self.histories.remove(&user);
    }

    /// Number of users with a history.
    pub fn tracked_users(&self) -> usize {
        self.histories.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::testing::Inert;
    use crate::ability::Element;

    fn ability(name: &str) -> Arc<AbilityDescription> {
        AbilityDescription::builder(name, || Box::new(Inert))
            .element(Element::Air)
            .activation(&[Activation::Attack, Activation::Sneak, Activation::SneakRelease])
            .build()
            .unwrap()
    }

    fn combo(name: &str) -> Arc<AbilityDescription> {
        AbilityDescription::builder(name, || Box::new(Inert))
            .element(Element::Air)
            .build_sequence()
            .unwrap()
    }

    fn step(desc: &Arc<AbilityDescription>, activation: Activation) -> SequenceStep {
        SequenceStep::new(Arc::clone(desc), activation)
    }

    fn manager(sequences: Vec<Sequence>) -> SequenceManager {
        let mut registry = SequenceRegistry::new();
        for sequence in sequences {
            registry.register(sequence).unwrap();
        }
        SequenceManager::new(registry, 100)
    }

    #[test]
    fn test_combo_triggers_once_in_order_only() {
        let scooter = ability("Scooter");
        let wheel = ability("Wheel");
        let airwheel = combo("AirWheel");
        let seq = Sequence::new(
            Arc::clone(&airwheel),
            vec![step(&scooter, Activation::Attack), step(&wheel, Activation::Attack)],
        )
        .unwrap();
        let mut mgr = manager(vec![seq]);
        let user = UserId::new([1; 16]);

        let mut hits = 0;
        for (i, s) in [
            step(&wheel, Activation::Sneak),
            step(&scooter, Activation::Attack),
            step(&wheel, Activation::Attack),
        ]
        .into_iter()
        .enumerate()
        {
            if let Some(found) = mgr.register_step(user, s, i as Tick) {
                assert_eq!(found.description().key(), airwheel.key());
                hits += 1;
            }
        }
        assert_eq!(hits, 1);

        let other = UserId::new([2; 16]);
        assert!(mgr.register_step(other, step(&wheel, Activation::Attack), 0).is_none());
        assert!(mgr.register_step(other, step(&scooter, Activation::Attack), 1).is_none());
    }

    #[test]
    fn test_history_is_kept_after_match() {
        let blast = ability("Blast");
        let double = Sequence::new(
            combo("Double"),
            vec![step(&blast, Activation::Attack), step(&blast, Activation::Attack)],
        )
        .unwrap();
        let mut mgr = manager(vec![double]);
        let user = UserId::new([1; 16]);

        assert!(mgr.register_step(user, step(&blast, Activation::Attack), 0).is_none());
        assert!(mgr.register_step(user, step(&blast, Activation::Attack), 1).is_some());
        assert!(mgr.register_step(user, step(&blast, Activation::Attack), 2).is_some());
    }

    #[test]
    fn test_longest_then_latest_wins() {
        let a = ability("Alpha");
        let b = ability("Beta");
        let short_first = Sequence::new(
            combo("Short"),
            vec![step(&a, Activation::Attack), step(&b, Activation::Attack)],
        )
        .unwrap();
        let short_second = Sequence::new(
            combo("Shorter"),
            vec![step(&a, Activation::Attack), step(&b, Activation::Attack)],
        )
        .unwrap();
        let mut mgr = manager(vec![short_first.clone(), short_second.clone()]);
        let user = UserId::new([1; 16]);
        mgr.register_step(user, step(&a, Activation::Attack), 0);
        let found = mgr.register_step(user, step(&b, Activation::Attack), 1).unwrap();
        assert_eq!(found.description().key().as_str(), "shorter");

        let long = Sequence::new(
            combo("Long"),
            vec![
                step(&b, Activation::Sneak),
                step(&a, Activation::Attack),
                step(&b, Activation::Attack),
            ],
        )
        .unwrap();
        let mut mgr = manager(vec![long, short_first]);
        mgr.register_step(user, step(&b, Activation::Sneak), 0);
        mgr.register_step(user, step(&a, Activation::Attack), 1);
        let found = mgr.register_step(user, step(&b, Activation::Attack), 2).unwrap();
        assert_eq!(found.description().key().as_str(), "long");
    }

    #[test]
    fn test_stale_steps_do_not_match() {
        let a = ability("Alpha");
        let b = ability("Beta");
        let seq = Sequence::new(
            combo("Combo"),
            vec![step(&a, Activation::Attack), step(&b, Activation::Attack)],
        )
        .unwrap();
        let mut mgr = manager(vec![seq]);
        let user = UserId::new([1; 16]);

        mgr.register_step(user, step(&a, Activation::Attack), 0);
        assert!(mgr.register_step(user, step(&b, Activation::Attack), 101).is_none());
        assert_eq!(mgr.history(user).unwrap().len(), 1);
    }

    #[test]
    fn test_history_evicts_oldest() {
        let a = ability("Alpha");
        let mut history = ActionHistory::new(2);
        history.push(step(&a, Activation::Attack), 0);
        history.push(step(&a, Activation::Sneak), 1);
        history.push(step(&a, Activation::SneakRelease), 2);
        assert_eq!(history.len(), 2);
        let kinds: Vec<_> = history.steps().map(|s| s.activation()).collect();
        assert_eq!(kinds, vec![Activation::Sneak, Activation::SneakRelease]);
    }

    #[test]
    fn test_instructions_merge_sneak_tap() {
        let torrent = ability("Torrent");
        let shield = ability("Shield");
        let seq = Sequence::new(
            combo("Gimbal"),
            vec![
                step(&torrent, Activation::Sneak),
                step(&torrent, Activation::SneakRelease),
                step(&shield, Activation::Sneak),
                step(&torrent, Activation::SneakRelease),
                step(&torrent, Activation::Attack),
            ],
        )
        .unwrap();
        assert_eq!(
            seq.instructions(),
            "Torrent (Tap Sneak) > Shield (Hold Sneak) > Torrent (Release Sneak) > Torrent (Left Click)"
        );
    }

    #[test]
    fn test_invalid_sequences_rejected() {
        let a = ability("Alpha");
        let one = Sequence::new(combo("Solo"), vec![step(&a, Activation::Attack)]);
        assert!(matches!(one, Err(RegistryError::InvalidSequence { .. })));

        let plain = Sequence::new(
            Arc::clone(&a),
            vec![step(&a, Activation::Attack), step(&a, Activation::Attack)],
        );
        assert!(plain.is_err());

        let long = Sequence::new(combo("Long"), vec![step(&a, Activation::Attack); 17]);
        assert!(long.is_err());
    }

    #[test]
    fn test_registry_rejects_duplicates_and_validates() {
        let a = ability("Alpha");
        let c = combo("Combo");
        let steps = vec![step(&a, Activation::Attack), step(&a, Activation::Sneak)];
        let mut registry = SequenceRegistry::new();
        registry
            .register(Sequence::new(Arc::clone(&c), steps.clone()).unwrap())
            .unwrap();
        assert!(matches!(
            registry.register(Sequence::new(Arc::clone(&c), steps).unwrap()),
            Err(RegistryError::Duplicate(_))
        ));

        let mut abilities = AbilityRegistry::new();
        abilities.register(Arc::clone(&c)).unwrap();
        assert!(matches!(
            registry.validate(&abilities),
            Err(RegistryError::UnknownAbility(key)) if key.as_str() == "alpha"
        ));
        abilities.register(a).unwrap();
        assert!(registry.validate(&abilities).is_ok());
    }
}
