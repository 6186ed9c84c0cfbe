//! Ability Manager
//!
//! Owns every live instance of one world partition. Instances are stored
//! by monotonically increasing id, so tick iteration follows activation
//! order and replays of the same inputs visit instances identically.
//!
//! ## Tick pipeline
//!
//! 1. Owner lookup (missing owner ends the instance)
//! 2. Config snapshot swap when a newer generation exists
//! 3. Base policy, then the instance's own policy
//! 4. `update`, isolated per instance
//! 5. Collision phase over the instances still running
//! 6. Sweep: every flagged instance is torn down exactly once

use std::collections::{BTreeMap, BTreeSet};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, error, instrument, warn};

use super::collision::{CollisionEngine, CollisionRegistry};
use super::cooldown::CooldownTracker;
use super::events::{GameEvent, RemovalReason};
use crate::ability::{
    AbilityDescription, AbilityInstance, AbilityKey, AbilityRegistry, Activation, ActivationContext,
    DestroyContext, EntityCommand, InstanceId, PolicyConfig, RemovalPolicy, UpdateContext,
    UpdateResult,
};
use crate::config::ConfigSnapshot;
use crate::core::hash::StateHasher;
use crate::error::Rejection;
use crate::geometry::Collider;
use crate::platform::{Platform, UserId, WorldKey};
use crate::Tick;

/// Everything a manager borrows from its owner for one call.
pub struct TickEnv<'a> {
    /// User and world lookups
    pub platform: &'a dyn Platform,
    /// Current tick
    pub now: Tick,
    /// Config in effect
    pub config: &'a ConfigSnapshot,
    /// Shared cooldowns
    pub cooldowns: &'a mut CooldownTracker,
    /// Event sink
    pub events: &'a mut Vec<GameEvent>,
    /// Entity command sink
    pub commands: &'a mut Vec<EntityCommand>,
}

/// Live instances of one world.
#[derive(Debug)]
pub struct AbilityManager {
    world: WorldKey,
    instances: BTreeMap<InstanceId, AbilityInstance>,
    index: BTreeMap<(UserId, AbilityKey), Vec<InstanceId>>,
    next_id: u64,
    policies: Arc<PolicyConfig>,
    collisions: Arc<CollisionRegistry>,
    engine: CollisionEngine,
}

impl AbilityManager {
    /// Manager for `world`.
    pub fn new(
        world: WorldKey,
        policies: Arc<PolicyConfig>,
        collisions: Arc<CollisionRegistry>,
        margin: f64,
    ) -> Self {
        Self {
            world,
            instances: BTreeMap::new(),
            index: BTreeMap::new(),
            next_id: 1,
            policies,
            collisions,
            engine: CollisionEngine::new(margin),
        }
    }

    /// World this manager simulates.
    pub fn world(&self) -> &WorldKey {
        &self.world
    }

    // =========================================================================
    // ACTIVATION
    // =========================================================================

    /// Activate `description` for `user`. Returns whether an instance was
    /// created.
    pub fn activate(
        &mut self,
        env: &mut TickEnv<'_>,
        user: UserId,
        description: &Arc<AbilityDescription>,
        method: Activation,
    ) -> bool {
        self.try_activate(env, user, description, method).is_ok()
    }

    /// Activate, reporting why an attempt was refused.
    ///
    /// Nothing is stored unless every gate passes and the ability's own
    /// `activate` accepts.
    pub fn try_activate(
        &mut self,
        env: &mut TickEnv<'_>,
        user_id: UserId,
        description: &Arc<AbilityDescription>,
        method: Activation,
    ) -> Result<InstanceId, Rejection> {
        let result = self.gate_and_build(env, user_id, description, method);
        match &result {
            Ok(id) => debug!(
                user = %user_id,
                ability = %description.key(),
                instance = %id,
                ?method,
                "activation accepted"
            ),
            Err(reason) => debug!(
                user = %user_id,
                ability = %description.key(),
                ?method,
                %reason,
                "activation rejected"
            ),
        }
        result
    }

    fn gate_and_build(
        &mut self,
        env: &mut TickEnv<'_>,
        user_id: UserId,
        description: &Arc<AbilityDescription>,
        method: Activation,
    ) -> Result<InstanceId, Rejection> {
        if !description.is_activated_by(method) {
            return Err(Rejection::WrongMethod);
        }
        let platform = env.platform;
        let user = platform.user(user_id).ok_or(Rejection::Unavailable)?;
        if !user.is_valid() {
            return Err(Rejection::Unavailable);
        }
        if user.world() != &self.world {
            return Err(Rejection::WorldMismatch);
        }
        let world = platform.world(&self.world).ok_or(Rejection::Unavailable)?;
        if !user.can_bend(description) {
            return Err(Rejection::CannotBend);
        }
        let key = description.key();
        if !description.bypass_cooldown() && env.cooldowns.is_on_cooldown(user_id, key, env.now) {
            return Err(Rejection::OnCooldown);
        }
        let live = self.index.get(&(user_id, key.clone())).map_or(0, Vec::len);
        if !description.limit().allows(live) {
            return Err(Rejection::InstanceLimit);
        }

        let attributes = env.config.attributes(key);
        let mut ability = description.create_ability();
        let mut ctx = ActivationContext {
            user,
            world,
            now: env.now,
            description,
            attributes: &attributes,
            cooldowns: &mut *env.cooldowns,
            policy: RemovalPolicy::none(),
        };
        let accepted = match catch_unwind(AssertUnwindSafe(|| ability.activate(&mut ctx, method))) {
            Ok(accepted) => accepted,
            Err(_) => {
                error!(user = %user_id, ability = %key, "ability activation panicked");
                false
            }
        };
        if !accepted {
            return Err(Rejection::Declined);
        }
        let policy = ctx.policy;

        let id = InstanceId(self.next_id);
        self.next_id += 1;
        let instance = AbilityInstance::new(
            id,
            user_id,
            Arc::clone(description),
            ability,
            policy,
            attributes,
            env.config.generation(),
            env.now,
        );
        self.instances.insert(id, instance);
        self.index.entry((user_id, key.clone())).or_default().push(id);
        env.events
            .push(GameEvent::ability_activated(env.now, user_id, key.clone(), id, method));
        Ok(id)
    }

    /// Replace `user`'s passive instances with fresh ones for every
    /// passive ability they can bend. Returns how many were created.
    pub fn create_passives(&mut self, env: &mut TickEnv<'_>, user: UserId, registry: &AbilityRegistry) -> usize {
        let stale: Vec<InstanceId> = self
            .instances
            .values()
            .filter(|i| i.user() == user && i.description().is_activated_by(Activation::Passive))
            .map(AbilityInstance::id)
            .collect();
        for id in stale {
            self.teardown(env, id, RemovalReason::Forced);
        }

        registry
            .passives()
            .filter(|description| self.try_activate(env, user, description, Activation::Passive).is_ok())
            .count()
    }

    // =========================================================================
    // TICK
    // =========================================================================

    /// Advance every instance one tick.
    #[instrument(skip(self, env), fields(world = %self.world, tick = env.now, instances = self.instances.len()))]
    pub fn tick(&mut self, env: &mut TickEnv<'_>) {
        let platform = env.platform;
        let config = env.config;
        let now = env.now;

        let Some(world) = platform.world(&self.world) else {
            warn!("world missing, destroying all instances");
            self.destroy_all_instances(env, RemovalReason::WorldUnloaded);
            return;
        };

        let mut removals: BTreeMap<InstanceId, RemovalReason> = BTreeMap::new();
        let ids: Vec<InstanceId> = self.instances.keys().copied().collect();

        for id in ids {
            let Some(instance) = self.instances.get_mut(&id) else {
                continue;
            };
            let user_id = instance.user();

            // 1. Owner
            let Some(user) = platform.user(user_id) else {
                removals.insert(id, RemovalReason::UserMissing);
                continue;
            };

            // 2. Config
            if instance.generation() != config.generation() {
                let attributes = config.attributes(instance.description().key());
                instance.swap_attributes(Arc::clone(&attributes), config.generation());
                if let Some(ability) = instance.ability_mut() {
                    ability.on_config_reload(&attributes);
                }
            }

            // 3. Policies
            let base = self.policies.base_for(instance.description().key());
            if let Some(condition) = base
                .test(user, world, now)
                .or_else(|| instance.policy().test(user, world, now))
            {
                removals.insert(
                    id,
                    RemovalReason::Policy {
                        condition: condition.to_string(),
                    },
                );
                continue;
            }

            // 4. Update
            let description = Arc::clone(instance.description());
            let attributes = Arc::clone(instance.attributes());
            let (policy, ability) = instance.parts_mut();
            let Some(ability) = ability else {
                continue;
            };
            let mut ctx = UpdateContext {
                user,
                world,
                now,
                description: &description,
                attributes: &attributes,
                cooldowns: &mut *env.cooldowns,
                commands: &mut *env.commands,
                policy,
            };
            match catch_unwind(AssertUnwindSafe(|| ability.update(&mut ctx))) {
                Ok(Ok(UpdateResult::Continue)) => {}
                Ok(Ok(UpdateResult::Remove)) => {
                    removals.insert(id, RemovalReason::Completed);
                }
                Ok(Err(err)) => {
                    error!(
                        instance = %id,
                        ability = %description.key(),
                        user = %user_id,
                        error = %err,
                        "ability update failed"
                    );
                    removals.insert(id, RemovalReason::Fault);
                }
                Err(_) => {
                    error!(
                        instance = %id,
                        ability = %description.key(),
                        user = %user_id,
                        "ability update panicked"
                    );
                    removals.insert(id, RemovalReason::Fault);
                }
            }
        }

        // 5. Collisions
        let skip: BTreeSet<InstanceId> = removals.keys().copied().collect();
        let collided = self
            .engine
            .run(&mut self.instances, &skip, &self.collisions, now, env.events);
        for (id, reason) in collided {
            removals.entry(id).or_insert(reason);
        }

        // 6. Sweep
        for (id, reason) in removals {
            self.teardown(env, id, reason);
        }
    }

    // =========================================================================
    // REMOVAL
    // =========================================================================

    /// Force-destroy `user`'s instances of `key`. False when none existed.
    pub fn destroy_user_instance(&mut self, env: &mut TickEnv<'_>, user: UserId, key: &AbilityKey) -> bool {
        let Some(ids) = self.index.get(&(user, key.clone())).cloned() else {
            return false;
        };
        let mut any = false;
        for id in ids {
            any |= self.teardown(env, id, RemovalReason::Forced);
        }
        any
    }

    /// Force-destroy everything `user` owns. Returns the count.
    pub fn destroy_all(&mut self, env: &mut TickEnv<'_>, user: UserId) -> usize {
        let ids: Vec<InstanceId> = self
            .instances
            .values()
            .filter(|i| i.user() == user)
            .map(AbilityInstance::id)
            .collect();
        ids.into_iter()
            .filter(|id| self.teardown(env, *id, RemovalReason::Forced))
            .count()
    }

    /// Force-destroy one instance.
    pub fn destroy_instance(&mut self, env: &mut TickEnv<'_>, id: InstanceId) -> bool {
        self.teardown(env, id, RemovalReason::Forced)
    }

    /// Destroy every instance, e.g. on shutdown or world unload.
    pub fn destroy_all_instances(&mut self, env: &mut TickEnv<'_>, reason: RemovalReason) -> usize {
        let ids: Vec<InstanceId> = self.instances.keys().copied().collect();
        ids.into_iter()
            .filter(|id| self.teardown(env, *id, reason.clone()))
            .count()
    }

    fn teardown(&mut self, env: &mut TickEnv<'_>, id: InstanceId, reason: RemovalReason) -> bool {
        let Some(mut instance) = self.instances.remove(&id) else {
            return false;
        };
        self.unindex(instance.user(), instance.description().key(), id);
        let Some(mut ability) = instance.take_for_teardown() else {
            return false;
        };

        let user_id = instance.user();
        let mut ctx = DestroyContext {
            user_id,
            user: env.platform.user(user_id),
            now: env.now,
            description: instance.description(),
            attributes: instance.attributes(),
            cooldowns: &mut *env.cooldowns,
        };
        if catch_unwind(AssertUnwindSafe(|| ability.on_destroy(&mut ctx))).is_err() {
            error!(
                instance = %id,
                ability = %instance.description().key(),
                user = %user_id,
                "ability teardown panicked"
            );
        }

        debug!(instance = %id, ability = %instance.description().key(), ?reason, "instance removed");
        env.events.push(GameEvent::ability_removed(
            env.now,
            user_id,
            instance.description().key().clone(),
            id,
            reason,
        ));
        true
    }

    fn unindex(&mut self, user: UserId, key: &AbilityKey, id: InstanceId) {
        let slot = (user, key.clone());
        if let Some(ids) = self.index.get_mut(&slot) {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                self.index.remove(&slot);
            }
        }
    }

    // =========================================================================
    // OWNERSHIP AND QUERIES
    // =========================================================================

    /// Move an instance to another user of this world.
    pub fn change_owner(&mut self, platform: &dyn Platform, id: InstanceId, new_user: UserId) -> bool {
        let Some(user) = platform.user(new_user) else {
            return false;
        };
        if user.world() != &self.world {
            return false;
        }
        let Some(instance) = self.instances.get(&id) else {
            return false;
        };
        let old_user = instance.user();
        if old_user == new_user {
            return false;
        }
        let description = Arc::clone(instance.description());
        let live = self
            .index
            .get(&(new_user, description.key().clone()))
            .map_or(0, Vec::len);
        if !description.limit().allows(live) {
            return false;
        }

        self.unindex(old_user, description.key(), id);
        self.index
            .entry((new_user, description.key().clone()))
            .or_default()
            .push(id);
        if let Some(instance) = self.instances.get_mut(&id) {
            instance.set_user(new_user);
            if let Some(ability) = instance.ability_mut() {
                ability.on_user_change(new_user);
            }
        }
        true
    }

    /// Whether `user` owns a live instance of `key`.
    pub fn has_ability(&self, user: UserId, key: &AbilityKey) -> bool {
        self.index.contains_key(&(user, key.clone()))
    }

    /// Instances owned by `user`, in activation order.
    pub fn user_instances(&self, user: UserId) -> impl Iterator<Item = &AbilityInstance> {
        self.instances.values().filter(move |i| i.user() == user)
    }

    /// All instances, in activation order.
    pub fn instances(&self) -> impl Iterator<Item = &AbilityInstance> {
        self.instances.values()
    }

    /// One instance.
    pub fn instance(&self, id: InstanceId) -> Option<&AbilityInstance> {
        self.instances.get(&id)
    }

    /// Every collider of every instance, for debug rendering.
    pub fn colliders(&self) -> impl Iterator<Item = (InstanceId, &Collider)> {
        self.instances
            .values()
            .flat_map(|i| i.colliders().iter().map(move |c| (i.id(), c)))
    }

    /// Number of live instances.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether no instance is live.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Feed every instance into `hasher`.
    pub fn compute_hash(&self, hasher: &mut StateHasher) {
        hasher.update_str(self.world.as_str());
        hasher.update_len(self.instances.len());
        for instance in self.instances.values() {
            hasher.update_u64(instance.id().0);
            hasher.update_str(instance.description().key().as_str());
            hasher.update_id(instance.user().as_bytes());
            hasher.update_len(instance.colliders().len());
            for collider in instance.colliders() {
                hasher.update_collider(collider);
            }
        }
    }
}
