//! Ability Descriptions
//!
//! A description is the immutable, process-wide definition of one ability
//! kind: its key, elements, accepted activation methods, uniqueness policy
//! and the factory that creates fresh instances.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::Ability;
use crate::error::RegistryError;

// =============================================================================
// KEYS AND ENUMS
// =============================================================================

/// Lowercase alphabetic ability name; the identity of a description.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AbilityKey(String);

impl AbilityKey {
    /// Validate and normalize a name.
    pub fn new(name: &str) -> Result<Self, RegistryError> {
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(RegistryError::InvalidName(name.to_string()));
        }
        Ok(Self(name.to_ascii_lowercase()))
    }

    /// Key as string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AbilityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a user triggers an ability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Activation {
    /// Left click in the air
    Attack = 0,
    /// Left click on an entity
    AttackEntity = 1,
    /// Right click in the air
    Interact = 2,
    /// Right click on an entity
    InteractEntity = 3,
    /// Right click on a block
    InteractBlock = 4,
    /// Sneak pressed
    Sneak = 5,
    /// Sneak released
    SneakRelease = 6,
    /// Fall damage taken
    Fall = 7,
    /// Always on while bindable
    Passive = 8,
    /// Triggered by a combo
    Sequence = 9,
}

impl Activation {
    /// All methods in discriminant order.
    pub const ALL: [Activation; 10] = [
        Activation::Attack,
        Activation::AttackEntity,
        Activation::Interact,
        Activation::InteractEntity,
        Activation::InteractBlock,
        Activation::Sneak,
        Activation::SneakRelease,
        Activation::Fall,
        Activation::Passive,
        Activation::Sequence,
    ];

    /// Human-readable label used in instructions.
    pub fn label(&self) -> &'static str {
        match self {
            Activation::Attack => "Left Click",
            Activation::AttackEntity => "Left Click Entity",
            Activation::Interact => "Right Click",
            Activation::InteractEntity => "Right Click Entity",
            Activation::InteractBlock => "Right Click Block",
            Activation::Sneak => "Hold Sneak",
            Activation::SneakRelease => "Release Sneak",
            Activation::Fall => "Fall",
            Activation::Passive => "Passive",
            Activation::Sequence => "Sequence",
        }
    }
}

/// Bending element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Element {
    /// Air
    Air = 0,
    /// Water
    Water = 1,
    /// Earth
    Earth = 2,
    /// Fire
    Fire = 3,
    /// Avatar-only abilities
    Avatar = 4,
}

/// How many concurrent instances one user may own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstanceLimit {
    /// At most one
    One,
    /// At most `n`
    AtMost(u32),
    /// No limit
    Unbounded,
}

impl InstanceLimit {
    /// Whether another instance may be added to `current` live ones.
    pub fn allows(&self, current: usize) -> bool {
        match self {
            InstanceLimit::One => current == 0,
            InstanceLimit::AtMost(n) => current < *n as usize,
            InstanceLimit::Unbounded => true,
        }
    }
}

// =============================================================================
// DESCRIPTION
// =============================================================================

/// Creates a fresh, not yet activated, ability.
pub type AbilityFactory = Arc<dyn Fn() -> Box<dyn Ability> + Send + Sync>;

/// Immutable definition of one ability kind.
///
/// Equality and hashing use the key only.
pub struct AbilityDescription {
    key: AbilityKey,
    display_name: String,
    elements: BTreeSet<Element>,
    activations: BTreeSet<Activation>,
    limit: InstanceLimit,
    bypass_cooldown: bool,
    can_bind: bool,
    hidden: bool,
    factory: AbilityFactory,
}

impl AbilityDescription {
    /// Start describing an ability named `name`.
    pub fn builder<F>(name: &str, factory: F) -> DescriptionBuilder
    where
        F: Fn() -> Box<dyn Ability> + Send + Sync + 'static,
    {
        DescriptionBuilder {
            name: name.to_string(),
            display_name: None,
            elements: BTreeSet::new(),
            activations: BTreeSet::new(),
            limit: InstanceLimit::One,
            bypass_cooldown: false,
            can_bind: true,
            hidden: false,
            factory: Arc::new(factory),
        }
    }

    /// Registry key.
    pub fn key(&self) -> &AbilityKey {
        &self.key
    }

    /// Name shown to players.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Elements this ability belongs to.
    pub fn elements(&self) -> &BTreeSet<Element> {
        &self.elements
    }

    /// Accepted activation methods.
    pub fn activations(&self) -> &BTreeSet<Activation> {
        &self.activations
    }

    /// Whether `method` triggers this ability.
    pub fn is_activated_by(&self, method: Activation) -> bool {
        self.activations.contains(&method)
    }

    /// Uniqueness policy.
    pub fn limit(&self) -> InstanceLimit {
        self.limit
    }

    /// Skips the cooldown gate.
    pub fn bypass_cooldown(&self) -> bool {
        self.bypass_cooldown
    }

    /// Can be bound to a slot.
    pub fn can_bind(&self) -> bool {
        self.can_bind
    }

    /// Omitted from listings.
    pub fn hidden(&self) -> bool {
        self.hidden
    }

    /// Create a fresh instance body.
    pub fn create_ability(&self) -> Box<dyn Ability> {
        (self.factory)()
    }
}

impl fmt::Debug for AbilityDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbilityDescription")
            .field("key", &self.key)
            .field("elements", &self.elements)
            .field("activations", &self.activations)
            .field("limit", &self.limit)
            .field("bypass_cooldown", &self.bypass_cooldown)
            .finish()
    }
}

impl fmt::Display for AbilityDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name)
    }
}

impl PartialEq for AbilityDescription {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for AbilityDescription {}

impl std::hash::Hash for AbilityDescription {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

/// Builder for [`AbilityDescription`].
pub struct DescriptionBuilder {
    name: String,
    display_name: Option<String>,
    elements: BTreeSet<Element>,
    activations: BTreeSet<Activation>,
    limit: InstanceLimit,
    bypass_cooldown: bool,
    can_bind: bool,
    hidden: bool,
    factory: AbilityFactory,
}

impl DescriptionBuilder {
    /// Override the display name (defaults to the name as given).
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Add an element.
    pub fn element(mut self, element: Element) -> Self {
        self.elements.insert(element);
        self
    }

    /// Add activation methods.
    pub fn activation(mut self, methods: &[Activation]) -> Self {
        self.activations.extend(methods.iter().copied());
        self
    }

    /// Set the uniqueness policy.
    pub fn limit(mut self, limit: InstanceLimit) -> Self {
        self.limit = limit;
        self
    }

    /// Skip the cooldown gate.
    pub fn bypass_cooldown(mut self, bypass: bool) -> Self {
        self.bypass_cooldown = bypass;
        self
    }

    /// Allow or forbid slot binding.
    pub fn can_bind(mut self, can_bind: bool) -> Self {
        self.can_bind = can_bind;
        self
    }

    /// Hide from listings.
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Build a directly-activated ability.
    pub fn build(self) -> Result<Arc<AbilityDescription>, RegistryError> {
        if self.activations.contains(&Activation::Sequence) {
            return Err(RegistryError::InvalidDescription {
                key: self.name,
                reason: "sequence activation requires build_sequence",
            });
        }
        self.finish()
    }

    /// Build a combo ability: activated by `Sequence` and never bindable.
    pub fn build_sequence(mut self) -> Result<Arc<AbilityDescription>, RegistryError> {
        self.activations.insert(Activation::Sequence);
        self.can_bind = false;
        self.finish()
    }

    fn finish(self) -> Result<Arc<AbilityDescription>, RegistryError> {
        let key = AbilityKey::new(&self.name)?;
        if self.elements.is_empty() {
            return Err(RegistryError::InvalidDescription {
                key: self.name,
                reason: "no element",
            });
        }
        if self.activations.is_empty() {
            return Err(RegistryError::InvalidDescription {
                key: self.name,
                reason: "no activation method",
            });
        }
        Ok(Arc::new(AbilityDescription {
            key,
            display_name: self.display_name.unwrap_or(self.name),
            elements: self.elements,
            activations: self.activations,
            limit: self.limit,
            bypass_cooldown: self.bypass_cooldown,
            can_bind: self.can_bind,
            hidden: self.hidden,
            factory: self.factory,
        }))
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// All known descriptions, keyed and ordered by key.
#[derive(Debug, Default)]
pub struct AbilityRegistry {
    entries: BTreeMap<AbilityKey, Arc<AbilityDescription>>,
    locked: bool,
}

impl AbilityRegistry {
    /// Empty, unlocked registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a description.
    pub fn register(&mut self, description: Arc<AbilityDescription>) -> Result<(), RegistryError> {
        if self.locked {
            return Err(RegistryError::Locked);
        }
        if self.entries.contains_key(description.key()) {
            return Err(RegistryError::Duplicate(description.key().clone()));
        }
        self.entries.insert(description.key().clone(), description);
        Ok(())
    }

    /// Stop accepting registrations.
    pub fn lock(&mut self) {
        self.locked = true;
    }

    /// Whether `lock` was called.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<Arc<AbilityDescription>> {
        let key = AbilityKey::new(name).ok()?;
        self.entries.get(&key).cloned()
    }

    /// Lookup by key.
    pub fn by_key(&self, key: &AbilityKey) -> Option<Arc<AbilityDescription>> {
        self.entries.get(key).cloned()
    }

    /// Whether a key is registered.
    pub fn contains(&self, key: &AbilityKey) -> bool {
        self.entries.contains_key(key)
    }

    /// All descriptions in key order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<AbilityDescription>> {
        self.entries.values()
    }

    /// Descriptions activated passively.
    pub fn passives(&self) -> impl Iterator<Item = &Arc<AbilityDescription>> {
        self.entries
            .values()
            .filter(|d| d.is_activated_by(Activation::Passive))
    }

    /// Number of descriptions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
