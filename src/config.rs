//! Configuration
//!
//! Two layers:
//! - `EngineConfig`: process settings read from the environment.
//! - `ConfigStore`: per-ability numeric attributes loaded from JSON.
//!
//! Attribute reloads build a complete new snapshot before anything is
//! swapped, so a bad document leaves the previous values in effect. Live
//! instances keep the `Arc` they were given until their next update.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ability::{AbilityKey, AbilityRegistry};
use crate::error::ConfigError;
use crate::{Tick, TICK_MILLIS};

// =============================================================================
// ENGINE CONFIG
// =============================================================================

/// Process-level engine settings.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Fixed simulation interval
    pub tick_interval: Duration,
    /// Growth applied to collider bounds in the broad phase
    pub broad_phase_margin: f64,
    /// Ticks after which a recorded sequence step goes stale
    pub sequence_timeout: Tick,
    /// Ability attribute file, if any
    pub config_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(TICK_MILLIS),
            broad_phase_margin: 0.5,
            sequence_timeout: 100,
            config_path: None,
        }
    }
}

impl EngineConfig {
    /// Read overrides from the environment; unset or unparsable values keep
    /// their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            tick_interval: std::env::var("BENDING_TICK_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.tick_interval),
            broad_phase_margin: std::env::var("BENDING_BROAD_PHASE_MARGIN")
                .ok()
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|m| m.is_finite() && *m >= 0.0)
                .unwrap_or(defaults.broad_phase_margin),
            sequence_timeout: std::env::var("BENDING_SEQUENCE_TIMEOUT_TICKS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(defaults.sequence_timeout),
            config_path: std::env::var("BENDING_CONFIG_PATH").ok().map(PathBuf::from),
        }
    }
}

/// Whole ticks covering `millis`, rounded up.
pub fn millis_to_ticks(millis: f64) -> Tick {
    if !millis.is_finite() || millis <= 0.0 {
        return 0;
    }
    (millis / TICK_MILLIS as f64).ceil() as Tick
}

// =============================================================================
// ABILITY ATTRIBUTES
// =============================================================================

/// Named numeric settings for one ability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbilityAttributes {
    values: BTreeMap<String, f64>,
}

impl AbilityAttributes {
    /// Empty attribute set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value (builder style).
    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.values.insert(name.to_string(), value);
        self
    }

    /// Look up a value.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Look up a value, falling back to `default`.
    pub fn get_or(&self, name: &str, default: f64) -> f64 {
        self.get(name).unwrap_or(default)
    }

    /// Millisecond attribute as ticks.
    pub fn ticks_or(&self, name: &str, default_millis: f64) -> Tick {
        millis_to_ticks(self.get_or(name, default_millis))
    }

    /// All values in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Immutable view of every ability's attributes at one generation.
#[derive(Debug, Clone, Default)]
pub struct ConfigSnapshot {
    generation: u64,
    abilities: BTreeMap<AbilityKey, Arc<AbilityAttributes>>,
    empty: Arc<AbilityAttributes>,
}

impl ConfigSnapshot {
    /// Monotonic reload counter; 0 before the first load.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Attributes for `key`; empty when the ability has no section.
    pub fn attributes(&self, key: &AbilityKey) -> Arc<AbilityAttributes> {
        self.abilities
            .get(key)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.empty))
    }
}

#[derive(Debug, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    abilities: BTreeMap<String, BTreeMap<String, f64>>,
}

/// Parsed and value-checked document, not yet applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedConfig {
    abilities: BTreeMap<AbilityKey, AbilityAttributes>,
}

impl ParsedConfig {
    /// Parse JSON and reject non-finite values and malformed names.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let document: ConfigDocument = serde_json::from_str(text)?;
        let mut abilities = BTreeMap::new();
        for (name, values) in document.abilities {
            let key = AbilityKey::new(&name).map_err(|_| ConfigError::UnknownAbility(name.clone()))?;
            let mut attributes = AbilityAttributes::new();
            for (attribute, value) in values {
                if !value.is_finite() {
                    return Err(ConfigError::InvalidAttribute {
                        ability: name,
                        attribute,
                        value,
                    });
                }
                attributes.values.insert(attribute, value);
            }
            abilities.insert(key, attributes);
        }
        Ok(Self { abilities })
    }

    /// Read and parse a file. Blocking.
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }
}

/// Current attribute snapshot plus reload bookkeeping.
#[derive(Debug, Default)]
pub struct ConfigStore {
    current: Arc<ConfigSnapshot>,
}

impl ConfigStore {
    /// Store at generation 0 with no attributes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot in effect.
    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        Arc::clone(&self.current)
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.current.generation
    }

    /// Swap in a parsed document. Every section must name a registered
    /// ability, otherwise nothing changes.
    pub fn apply(
        &mut self,
        parsed: ParsedConfig,
        registry: &AbilityRegistry,
    ) -> Result<u64, ConfigError> {
        if let Some(unknown) = parsed.abilities.keys().find(|key| !registry.contains(key)) {
            return Err(ConfigError::UnknownAbility(unknown.to_string()));
        }
        let generation = self.current.generation + 1;
        let abilities = parsed
            .abilities
            .into_iter()
            .map(|(key, attributes)| (key, Arc::new(attributes)))
            .collect();
        self.current = Arc::new(ConfigSnapshot {
            generation,
            abilities,
            empty: Arc::new(AbilityAttributes::new()),
        });
        Ok(generation)
    }

    /// Parse and apply in one step.
    pub fn load_str(&mut self, text: &str, registry: &AbilityRegistry) -> Result<u64, ConfigError> {
        let parsed = ParsedConfig::parse(text)?;
        self.apply(parsed, registry)
    }
}
