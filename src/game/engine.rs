//! Game
//!
//! Top-level entry point. Owns the registries, every world partition, the
//! sequence matcher, cooldowns and the config store, and hands the
//! platform's users and worlds to them for the duration of one call.
//!
//! Inputs received between two ticks are applied immediately and stamped
//! with the last completed tick; their events are returned with the next
//! `TickReport`.

use std::mem;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::collision::{CollisionPair, CollisionRegistry};
use super::cooldown::CooldownTracker;
use super::deferred::{spawn_config_reload, Deferred, DeferredQueue, DeferredSender};
use super::events::GameEvent;
use super::manager::TickEnv;
use super::replay::{ReplayInput, ReplayLog};
use super::sequence::{Sequence, SequenceManager, SequenceRegistry, SequenceStep};
use super::world::WorldManager;
use crate::ability::{
    AbilityDescription, AbilityKey, AbilityRegistry, Activation, EntityCommand, PolicyConfig,
};
use crate::config::{ConfigStore, EngineConfig, ParsedConfig};
use crate::core::hash::{compute_state_hash, StateHash};
use crate::error::{ConfigError, RegistryError};
use crate::platform::{Platform, UserId, WorldKey};
use crate::Tick;

/// Output of one tick.
#[derive(Debug, Default)]
pub struct TickReport {
    /// Tick just completed
    pub tick: Tick,
    /// Events, ordered by (tick, priority, user)
    pub events: Vec<GameEvent>,
    /// Entity effects for the platform to apply
    pub commands: Vec<EntityCommand>,
}

// =============================================================================
// BUILDER
// =============================================================================

/// Collects registrations before the game starts.
pub struct GameBuilder {
    config: EngineConfig,
    abilities: AbilityRegistry,
    collisions: CollisionRegistry,
    sequences: SequenceRegistry,
    policies: PolicyConfig,
    replay_interval: Option<Tick>,
}

impl GameBuilder {
    /// Empty builder.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            abilities: AbilityRegistry::new(),
            collisions: CollisionRegistry::new(),
            sequences: SequenceRegistry::new(),
            policies: PolicyConfig::default(),
            replay_interval: None,
        }
    }

    /// Register an ability kind.
    pub fn ability(&mut self, description: Arc<AbilityDescription>) -> Result<&mut Self, RegistryError> {
        self.abilities.register(description)?;
        Ok(self)
    }

    /// Look up a registered kind by name.
    pub fn description(&self, name: &str) -> Result<Arc<AbilityDescription>, RegistryError> {
        let key = AbilityKey::new(name)?;
        self.abilities
            .by_key(&key)
            .ok_or(RegistryError::UnknownAbility(key))
    }

    /// Register a collision pair.
    pub fn collision(&mut self, pair: CollisionPair) -> &mut Self {
        self.collisions.register(pair);
        self
    }

    /// Register layered cancellation, weakest layer first.
    pub fn collision_layers(&mut self, layers: &[Vec<AbilityKey>]) -> &mut Self {
        self.collisions.register_layers(layers);
        self
    }

    /// Register a combo.
    pub fn sequence(&mut self, sequence: Sequence) -> Result<&mut Self, RegistryError> {
        self.sequences.register(sequence)?;
        Ok(self)
    }

    /// Replace the removal policy configuration.
    pub fn policies(&mut self, policies: PolicyConfig) -> &mut Self {
        self.policies = policies;
        self
    }

    /// Record inputs and checkpoint every `interval` ticks.
    pub fn record_replay(&mut self, interval: Tick) -> &mut Self {
        self.replay_interval = Some(interval);
        self
    }

    /// Validate cross references and lock the ability registry.
    pub fn build(mut self) -> Result<Game, RegistryError> {
        self.collisions.validate(&self.abilities)?;
        self.sequences.validate(&self.abilities)?;
        self.abilities.lock();

        let worlds = WorldManager::new(
            Arc::new(self.policies),
            Arc::new(self.collisions),
            self.config.broad_phase_margin,
        );
        info!(
            abilities = self.abilities.len(),
            sequences = self.sequences.len(),
            "game ready"
        );
        Ok(Game {
            sequences: SequenceManager::new(self.sequences, self.config.sequence_timeout),
            config: self.config,
            abilities: self.abilities,
            worlds,
            cooldowns: CooldownTracker::new(),
            store: ConfigStore::new(),
            deferred: DeferredQueue::new(),
            replay: self.replay_interval.map(ReplayLog::new),
            tick: 0,
            pending_events: Vec::new(),
            pending_commands: Vec::new(),
        })
    }
}

// =============================================================================
// GAME
// =============================================================================

/// The whole ability simulation.
pub struct Game {
    config: EngineConfig,
    abilities: AbilityRegistry,
    worlds: WorldManager,
    sequences: SequenceManager,
    cooldowns: CooldownTracker,
    store: ConfigStore,
    deferred: DeferredQueue,
    replay: Option<ReplayLog>,
    tick: Tick,
    pending_events: Vec<GameEvent>,
    pending_commands: Vec<EntityCommand>,
}

impl Game {
    /// Start registering abilities.
    pub fn builder(config: EngineConfig) -> GameBuilder {
        GameBuilder::new(config)
    }

    /// Last completed tick.
    pub fn now(&self) -> Tick {
        self.tick
    }

    /// Engine settings.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Registered ability kinds.
    pub fn abilities(&self) -> &AbilityRegistry {
        &self.abilities
    }

    /// Registered combos.
    pub fn sequences(&self) -> &SequenceRegistry {
        self.sequences.registry()
    }

    /// World partitions.
    pub fn worlds(&self) -> &WorldManager {
        &self.worlds
    }

    /// Cooldowns of every user.
    pub fn cooldowns(&self) -> &CooldownTracker {
        &self.cooldowns
    }

    /// Attribute store.
    pub fn config_store(&self) -> &ConfigStore {
        &self.store
    }

    /// Sender for background producers.
    pub fn deferred_sender(&self) -> DeferredSender {
        self.deferred.sender()
    }

    /// Replay log, when recording.
    pub fn replay(&self) -> Option<&ReplayLog> {
        self.replay.as_ref()
    }

    /// Stop recording and take the log.
    pub fn take_replay(&mut self) -> Option<ReplayLog> {
        self.replay.take()
    }

    // =========================================================================
    // CONFIG
    // =========================================================================

    /// Parse and apply attributes now.
    pub fn load_config_str(&mut self, text: &str) -> Result<u64, ConfigError> {
        let result = ParsedConfig::parse(text).and_then(|parsed| self.apply_parsed(parsed));
        self.report_config(result.as_ref().copied().map_err(ToString::to_string));
        result
    }

    /// Read the configured file on a background task. The result is applied
    /// at the start of a later tick.
    pub fn reload_config(&self) -> Option<JoinHandle<()>> {
        let path = self.config.config_path.clone()?;
        Some(spawn_config_reload(path, self.deferred.sender()))
    }

    fn apply_config(&mut self, loaded: Result<ParsedConfig, String>) {
        let result = loaded.and_then(|parsed| self.apply_parsed(parsed).map_err(|err| err.to_string()));
        self.report_config(result);
    }

    /// Record and apply a parsed document. Replays apply the same values
    /// at the same tick.
    fn apply_parsed(&mut self, parsed: ParsedConfig) -> Result<u64, ConfigError> {
        self.record(ReplayInput::Config {
            attributes: parsed.clone(),
        });
        self.store.apply(parsed, &self.abilities)
    }

    fn report_config(&mut self, result: Result<u64, String>) {
        let event = match result {
            Ok(generation) => {
                info!(generation, "ability config reloaded");
                GameEvent::config_reloaded(self.tick, generation)
            }
            Err(reason) => {
                warn!(%reason, "ability config reload failed, keeping previous values");
                GameEvent::config_reload_failed(self.tick, reason)
            }
        };
        self.pending_events.push(event);
    }

    // =========================================================================
    // INPUTS
    // =========================================================================

    /// Raw action with the user's selected ability.
    pub fn handle_action(&mut self, platform: &dyn Platform, user_id: UserId, method: Activation) -> bool {
        let Some(key) = platform.user(user_id).and_then(|user| user.selected_ability()) else {
            return false;
        };
        self.handle_ability_action(platform, user_id, &key, method)
    }

    /// Raw action targeting a specific ability.
    ///
    /// The attempt is recorded for combo matching whether or not it
    /// activates anything. A completed combo is activated first, then the
    /// attempt itself. Returns whether anything was activated.
    pub fn handle_ability_action(
        &mut self,
        platform: &dyn Platform,
        user_id: UserId,
        key: &AbilityKey,
        method: Activation,
    ) -> bool {
        let Some(description) = self.abilities.by_key(key) else {
            return false;
        };
        let Some(user) = platform.user(user_id) else {
            return false;
        };
        let world = user.world().clone();
        let now = self.tick;
        self.record(ReplayInput::Action {
            user: user_id,
            ability: key.clone(),
            method,
        });

        let combo = self
            .sequences
            .register_step(user_id, SequenceStep::new(Arc::clone(&description), method), now);

        let snapshot = self.store.snapshot();
        let mut env = TickEnv {
            platform,
            now,
            config: &snapshot,
            cooldowns: &mut self.cooldowns,
            events: &mut self.pending_events,
            commands: &mut self.pending_commands,
        };
        let manager = self.worlds.manager_mut(&world);

        let mut activated = false;
        if let Some(sequence) = combo {
            env.events
                .push(GameEvent::sequence_triggered(now, user_id, sequence.description().key().clone()));
            activated |= manager.activate(&mut env, user_id, sequence.description(), Activation::Sequence);
        }
        if method != Activation::Sequence {
            activated |= manager.activate(&mut env, user_id, &description, method);
        }
        activated
    }

    /// Recreate the user's passive abilities.
    pub fn create_passives(&mut self, platform: &dyn Platform, user_id: UserId) -> usize {
        let Some(user) = platform.user(user_id) else {
            return 0;
        };
        let world = user.world().clone();
        self.record(ReplayInput::Passives { user: user_id });

        let snapshot = self.store.snapshot();
        let mut env = TickEnv {
            platform,
            now: self.tick,
            config: &snapshot,
            cooldowns: &mut self.cooldowns,
            events: &mut self.pending_events,
            commands: &mut self.pending_commands,
        };
        self.worlds
            .manager_mut(&world)
            .create_passives(&mut env, user_id, &self.abilities)
    }

    /// Force-destroy the user's instances of `key` in every world.
    pub fn destroy_user_instance(&mut self, platform: &dyn Platform, user_id: UserId, key: &AbilityKey) -> bool {
        self.record(ReplayInput::DestroyInstance {
            user: user_id,
            ability: key.clone(),
        });
        let snapshot = self.store.snapshot();
        let mut env = TickEnv {
            platform,
            now: self.tick,
            config: &snapshot,
            cooldowns: &mut self.cooldowns,
            events: &mut self.pending_events,
            commands: &mut self.pending_commands,
        };
        let mut any = false;
        let worlds: Vec<WorldKey> = self.worlds.managers().map(|m| m.world().clone()).collect();
        for world in worlds {
            any |= self
                .worlds
                .manager_mut(&world)
                .destroy_user_instance(&mut env, user_id, key);
        }
        any
    }

    /// Force-destroy everything the user owns.
    pub fn destroy_all(&mut self, platform: &dyn Platform, user_id: UserId) -> usize {
        let snapshot = self.store.snapshot();
        let mut env = TickEnv {
            platform,
            now: self.tick,
            config: &snapshot,
            cooldowns: &mut self.cooldowns,
            events: &mut self.pending_events,
            commands: &mut self.pending_commands,
        };
        self.worlds.destroy_all(&mut env, user_id)
    }

    /// The user left: end their instances and forget their history.
    pub fn on_user_disconnect(&mut self, platform: &dyn Platform, user_id: UserId) -> usize {
        self.record(ReplayInput::Disconnect { user: user_id });
        self.sequences.clear(user_id);
        self.destroy_all(platform, user_id)
    }

    /// The user moved out of `from`.
    pub fn on_user_world_change(&mut self, platform: &dyn Platform, user_id: UserId, from: &WorldKey) -> usize {
        self.record(ReplayInput::WorldChange {
            user: user_id,
            from: from.clone(),
        });
        let snapshot = self.store.snapshot();
        let mut env = TickEnv {
            platform,
            now: self.tick,
            config: &snapshot,
            cooldowns: &mut self.cooldowns,
            events: &mut self.pending_events,
            commands: &mut self.pending_commands,
        };
        self.worlds.on_user_world_change(&mut env, user_id, from)
    }

    /// Re-apply a recorded input.
    pub fn apply_input(&mut self, platform: &dyn Platform, input: &ReplayInput) {
        match input {
            ReplayInput::Action { user, ability, method } => {
                self.handle_ability_action(platform, *user, ability, *method);
            }
            ReplayInput::Passives { user } => {
                self.create_passives(platform, *user);
            }
            ReplayInput::DestroyInstance { user, ability } => {
                self.destroy_user_instance(platform, *user, ability);
            }
            ReplayInput::Disconnect { user } => {
                self.on_user_disconnect(platform, *user);
            }
            ReplayInput::WorldChange { user, from } => {
                self.on_user_world_change(platform, *user, from);
            }
            ReplayInput::Config { attributes } => {
                let result = self.apply_parsed(attributes.clone());
                self.report_config(result.map_err(|err| err.to_string()));
            }
        }
    }

    fn record(&mut self, input: ReplayInput) {
        if let Some(replay) = self.replay.as_mut() {
            replay.record(self.tick, input);
        }
    }

    // =========================================================================
    // TICK
    // =========================================================================

    /// Run one fixed-rate step over every world.
    pub fn tick(&mut self, platform: &dyn Platform) -> TickReport {
        // 1. Background results posted since the last tick, applied as
        // inputs between ticks
        for item in self.deferred.drain() {
            match item {
                Deferred::ConfigLoaded(loaded) => self.apply_config(loaded),
                Deferred::UserDisconnected(user) => {
                    self.on_user_disconnect(platform, user);
                }
            }
        }

        self.tick += 1;
        let now = self.tick;

        // 2. Simulation
        let snapshot = self.store.snapshot();
        let mut env = TickEnv {
            platform,
            now,
            config: &snapshot,
            cooldowns: &mut self.cooldowns,
            events: &mut self.pending_events,
            commands: &mut self.pending_commands,
        };
        self.worlds.tick_all(&mut env);
        self.cooldowns.prune(now);

        let mut events = mem::take(&mut self.pending_events);
        events.sort();
        let commands = mem::take(&mut self.pending_commands);

        // 3. Checkpoint
        if self.replay.as_ref().is_some_and(|r| r.is_checkpoint_tick(now)) {
            let hash = self.state_hash();
            let instances = self.worlds.total_instances();
            if let Some(replay) = self.replay.as_mut() {
                replay.add_checkpoint(now, hash, instances);
            }
        }

        TickReport {
            tick: now,
            events,
            commands,
        }
    }

    /// End every instance, e.g. before the server stops.
    pub fn shutdown(&mut self, platform: &dyn Platform) -> usize {
        let snapshot = self.store.snapshot();
        let mut env = TickEnv {
            platform,
            now: self.tick,
            config: &snapshot,
            cooldowns: &mut self.cooldowns,
            events: &mut self.pending_events,
            commands: &mut self.pending_commands,
        };
        let count = self.worlds.destroy_all_instances(&mut env);
        info!(count, "all instances destroyed");
        count
    }

    /// Digest of every live instance at the current tick.
    pub fn state_hash(&self) -> StateHash {
        compute_state_hash(self.tick, |hasher| self.worlds.compute_hash(hasher))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::testing::{Probe, Script, ScriptedSpec};
    use crate::ability::Element;
    use crate::game::events::{GameEventData, RemovalReason};
    use crate::geometry::{Collider, Sphere};
    use crate::platform::memory::{MemoryPlatform, MemoryUser, MemoryWorld};
    use glam::DVec3;

    fn overworld() -> WorldKey {
        WorldKey::new("overworld")
    }

    fn alice() -> UserId {
        UserId::new([1; 16])
    }

    fn platform() -> MemoryPlatform {
        let mut platform = MemoryPlatform::new();
        platform.add_world(MemoryWorld::new(overworld()));
        platform.add_user(MemoryUser::new(alice(), overworld()).with_element(Element::Air));
        platform
    }

    fn game(probe: &Probe) -> Game {
        let mut builder = Game::builder(EngineConfig::default());
        builder
            .ability(ScriptedSpec::new("scooter").build(probe))
            .unwrap()
            .ability(ScriptedSpec::new("wheel").build(probe))
            .unwrap()
            .ability(ScriptedSpec::new("airwheel").build_sequence(probe))
            .unwrap();
        let sequence = Sequence::new(
            builder.description("airwheel").unwrap(),
            vec![
                SequenceStep::new(builder.description("scooter").unwrap(), Activation::Attack),
                SequenceStep::new(builder.description("wheel").unwrap(), Activation::Attack),
            ],
        )
        .unwrap();
        builder.sequence(sequence).unwrap().record_replay(1);
        builder.build().unwrap()
    }

    fn key(name: &str) -> AbilityKey {
        AbilityKey::new(name).unwrap()
    }

    #[test]
    fn test_combo_activates_compound_ability() {
        let probe = Probe::default();
        let mut game = game(&probe);
        let platform = platform();

        assert!(game.handle_ability_action(&platform, alice(), &key("scooter"), Activation::Attack));
        assert!(game.handle_ability_action(&platform, alice(), &key("wheel"), Activation::Attack));

        let world = game.worlds().manager(&overworld()).unwrap();
        assert!(world.has_ability(alice(), &key("airwheel")));
        assert_eq!(world.len(), 3);

        let report = game.tick(&platform);
        let triggered = report
            .events
            .iter()
            .filter(|e| matches!(e.data, GameEventData::SequenceTriggered { .. }))
            .count();
        assert_eq!(triggered, 1);
        assert!(report.events.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_selected_ability_drives_handle_action() {
        let probe = Probe::default();
        let mut game = game(&probe);
        let mut platform = platform();

        assert!(!game.handle_action(&platform, alice(), Activation::Attack));
        platform.update_user(alice(), |u| u.selected = Some(key("scooter")));
        assert!(game.handle_action(&platform, alice(), Activation::Attack));
        assert!(!game.handle_action(&platform, alice(), Activation::Attack));
    }

    #[test]
    fn test_disconnect_clears_instances_and_history() {
        let probe = Probe::default();
        let mut game = game(&probe);
        let platform = platform();

        game.handle_ability_action(&platform, alice(), &key("scooter"), Activation::Attack);
        assert_eq!(game.on_user_disconnect(&platform, alice()), 1);
        assert!(game.sequences.history(alice()).is_none());

        game.handle_ability_action(&platform, alice(), &key("wheel"), Activation::Attack);
        let world = game.worlds().manager(&overworld()).unwrap();
        assert!(!world.has_ability(alice(), &key("airwheel")));
    }

    #[test]
    fn test_deferred_disconnect_waits_for_tick() {
        let probe = Probe::default();
        let mut game = game(&probe);
        let platform = platform();
        game.handle_ability_action(&platform, alice(), &key("scooter"), Activation::Attack);

        game.deferred_sender()
            .send(Deferred::UserDisconnected(alice()))
            .unwrap();
        assert_eq!(game.worlds().total_instances(), 1);

        let report = game.tick(&platform);
        assert_eq!(game.worlds().total_instances(), 0);
        assert!(report.events.iter().any(|e| matches!(
            &e.data,
            GameEventData::AbilityRemoved { reason: RemovalReason::Forced, .. }
        )));
    }

    #[test]
    fn test_config_reload_failure_keeps_previous_values() {
        let probe = Probe::default();
        let mut game = game(&probe);
        let platform = platform();

        assert_eq!(game.load_config_str(r#"{"abilities": {"scooter": {"speed": 1.5}}}"#).unwrap(), 1);
        assert!(game.load_config_str(r#"{"abilities": {"unknown": {"speed": 1.5}}}"#).is_err());
        assert!(game.load_config_str("not json").is_err());
        game.deferred_sender()
            .send(Deferred::ConfigLoaded(Err("disk on fire".into())))
            .unwrap();
        assert_eq!(game.config_store().generation(), 1);

        let report = game.tick(&platform);
        let failures = report
            .events
            .iter()
            .filter(|e| matches!(e.data, GameEventData::ConfigReloadFailed { .. }))
            .count();
        assert_eq!(failures, 3);
        assert!(matches!(report.events[0].data, GameEventData::ConfigReloaded { generation: 1 }));
        assert_eq!(
            game.config_store().snapshot().attributes(&key("scooter")).get("speed"),
            Some(1.5)
        );
    }

    #[test]
    fn test_replayed_inputs_reproduce_checkpoints() {
        let script = |game: &mut Game, platform: &MemoryPlatform| {
            game.handle_ability_action(platform, alice(), &key("scooter"), Activation::Attack);
            game.tick(platform);
            game.handle_ability_action(platform, alice(), &key("wheel"), Activation::Attack);
            game.tick(platform);
            game.destroy_user_instance(platform, alice(), &key("scooter"));
            game.tick(platform);
        };

        let probe = Probe::default();
        let platform = platform();
        let mut original = game(&probe);
        script(&mut original, &platform);
        let log = original.take_replay().unwrap();
        assert_eq!(log.checkpoints.len(), 3);

        let mut replayed = game(&probe);
        for tick in 0..3 {
            let inputs: Vec<ReplayInput> = log.inputs_at(tick).cloned().collect();
            for input in &inputs {
                replayed.apply_input(&platform, input);
            }
            replayed.tick(&platform);
        }
        let second = replayed.take_replay().unwrap();
        assert_eq!(log.first_divergence(&second), None);
        assert_eq!(log.inputs, second.inputs);
    }

    #[test]
    fn test_replay_reproduces_background_inputs() {
        let probe = Probe::default();
        let platform = platform();
        let mut original = game(&probe);

        original.handle_ability_action(&platform, alice(), &key("scooter"), Activation::Attack);
        original.tick(&platform);
        let parsed = ParsedConfig::parse(r#"{"abilities": {"wheel": {"speed": 2.0}}}"#).unwrap();
        original.deferred_sender().send(Deferred::ConfigLoaded(Ok(parsed))).unwrap();
        original.deferred_sender().send(Deferred::UserDisconnected(alice())).unwrap();
        original.tick(&platform);
        original.tick(&platform);

        let log = original.take_replay().unwrap();
        assert_eq!(log.inputs.len(), 3);
        assert!(log.inputs[1..].iter().all(|r| r.tick == 1));
        let counts: Vec<u32> = log.checkpoints.iter().map(|c| c.instances).collect();
        assert_eq!(counts, vec![1, 0, 0]);

        let mut replayed = game(&probe);
        for tick in 0..3 {
            let inputs: Vec<ReplayInput> = log.inputs_at(tick).cloned().collect();
            for input in &inputs {
                replayed.apply_input(&platform, input);
            }
            replayed.tick(&platform);
        }
        let second = replayed.take_replay().unwrap();
        assert_eq!(log.first_divergence(&second), None);
        assert_eq!(log.checkpoints, second.checkpoints);
        assert_eq!(log.inputs, second.inputs);
        assert_eq!(replayed.config_store().generation(), 1);
        assert_eq!(
            replayed.config_store().snapshot().attributes(&key("wheel")).get("speed"),
            Some(2.0)
        );
    }

    #[test]
    fn test_entity_commands_and_shutdown() {
        let probe = Probe::default();
        let mut builder = Game::builder(EngineConfig::default());
        builder
            .ability(
                ScriptedSpec::new("orb")
                    .script(Script::Continue)
                    .collider(Collider::Sphere(Sphere::new(DVec3::ZERO, 1.0)))
                    .build(&probe),
            )
            .unwrap();
        let mut game = builder.build().unwrap();
        let platform = platform();

        game.handle_ability_action(&platform, alice(), &key("orb"), Activation::Attack);
        let report = game.tick(&platform);
        assert!(report.commands.is_empty());
        assert_ne!(game.state_hash(), [0; 32]);

        assert_eq!(game.shutdown(&platform), 1);
        assert_eq!(Probe::get(&probe.destroys), 1);
    }

    #[test]
    fn test_build_validates_references() {
        let probe = Probe::default();
        let mut builder = Game::builder(EngineConfig::default());
        builder.ability(ScriptedSpec::new("blast").build(&probe)).unwrap();
        builder.collision(CollisionPair::new(key("blast"), key("ghost"), true, true));
        assert!(matches!(builder.build(), Err(RegistryError::UnknownAbility(k)) if k == key("ghost")));
    }
}
