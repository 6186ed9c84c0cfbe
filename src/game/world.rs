//! World Partitions
//!
//! One `AbilityManager` per world key. Managers are created on first use
//! and dropped once their world is gone and nothing is left in them.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::collision::CollisionRegistry;
use super::events::RemovalReason;
use super::manager::{AbilityManager, TickEnv};
use crate::ability::PolicyConfig;
use crate::core::hash::StateHasher;
use crate::platform::{UserId, WorldKey};

/// Managers keyed by world, ticked in key order.
#[derive(Debug)]
pub struct WorldManager {
    managers: BTreeMap<WorldKey, AbilityManager>,
    policies: Arc<PolicyConfig>,
    collisions: Arc<CollisionRegistry>,
    margin: f64,
}

impl WorldManager {
    /// No partitions yet; new managers share these settings.
    pub fn new(policies: Arc<PolicyConfig>, collisions: Arc<CollisionRegistry>, margin: f64) -> Self {
        Self {
            managers: BTreeMap::new(),
            policies,
            collisions,
            margin,
        }
    }

    /// Manager for `world`, created if needed.
    pub fn manager_mut(&mut self, world: &WorldKey) -> &mut AbilityManager {
        self.managers.entry(world.clone()).or_insert_with(|| {
            AbilityManager::new(
                world.clone(),
                Arc::clone(&self.policies),
                Arc::clone(&self.collisions),
                self.margin,
            )
        })
    }

    /// Manager for `world`, if it exists.
    pub fn manager(&self, world: &WorldKey) -> Option<&AbilityManager> {
        self.managers.get(world)
    }

    /// All managers in key order.
    pub fn managers(&self) -> impl Iterator<Item = &AbilityManager> {
        self.managers.values()
    }

    /// Tick every partition, then drop partitions whose world is gone.
    pub fn tick_all(&mut self, env: &mut TickEnv<'_>) {
        for manager in self.managers.values_mut() {
            manager.tick(env);
        }
        let platform = env.platform;
        self.managers
            .retain(|key, manager| !manager.is_empty() || platform.world(key).is_some());
    }

    /// Force-destroy everything `user` owns in any world.
    pub fn destroy_all(&mut self, env: &mut TickEnv<'_>, user: UserId) -> usize {
        self.managers
            .values_mut()
            .map(|manager| manager.destroy_all(env, user))
            .sum()
    }

    /// The user left `from`; their instances there end.
    pub fn on_user_world_change(&mut self, env: &mut TickEnv<'_>, user: UserId, from: &WorldKey) -> usize {
        self.managers
            .get_mut(from)
            .map_or(0, |manager| manager.destroy_all(env, user))
    }

    /// Destroy every instance in every world.
    pub fn destroy_all_instances(&mut self, env: &mut TickEnv<'_>) -> usize {
        self.managers
            .values_mut()
            .map(|manager| manager.destroy_all_instances(env, RemovalReason::Forced))
            .sum()
    }

    /// Live instances across all worlds.
    pub fn total_instances(&self) -> usize {
        self.managers.values().map(AbilityManager::len).sum()
    }

    /// Number of partitions.
    pub fn len(&self) -> usize {
        self.managers.len()
    }

    /// Whether no partition exists.
    pub fn is_empty(&self) -> bool {
        self.managers.is_empty()
    }

    /// Feed every partition into `hasher`, in key order.
    pub fn compute_hash(&self, hasher: &mut StateHasher) {
        hasher.update_len(self.managers.len());
        for manager in self.managers.values() {
            manager.compute_hash(hasher);
        }
    }
}
