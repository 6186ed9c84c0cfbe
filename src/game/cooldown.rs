//! Cooldowns
//!
//! Per (user, ability) expiry ticks. Entries are pruned lazily as ticks
//! advance.

use std::collections::BTreeMap;

use crate::ability::AbilityKey;
use crate::platform::UserId;
use crate::Tick;

/// Cooldown expiry table.
#[derive(Debug, Clone, Default)]
pub struct CooldownTracker {
    until: BTreeMap<(UserId, AbilityKey), Tick>,
}

impl CooldownTracker {
    /// Empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `key` on cooldown for `user` until `until` (exclusive). An
    /// existing longer cooldown is kept.
    pub fn add(&mut self, user: UserId, key: AbilityKey, until: Tick) {
        let entry = self.until.entry((user, key)).or_insert(until);
        *entry = (*entry).max(until);
    }

    /// Whether `key` is still cooling down at `now`.
    pub fn is_on_cooldown(&self, user: UserId, key: &AbilityKey, now: Tick) -> bool {
        self.remaining(user, key, now) > 0
    }

    /// Ticks left, 0 when ready.
    pub fn remaining(&self, user: UserId, key: &AbilityKey, now: Tick) -> Tick {
        self.until
            .get(&(user, key.clone()))
            .map(|until| until.saturating_sub(now))
            .unwrap_or(0)
    }

    /// Clear one cooldown.
    pub fn reset(&mut self, user: UserId, key: &AbilityKey) {
        self.until.remove(&(user, key.clone()));
    }

    /// Clear every cooldown of a user.
    pub fn clear_user(&mut self, user: UserId) {
        self.until.retain(|(owner, _), _| *owner != user);
    }

    /// Drop entries that have expired by `now`.
    pub fn prune(&mut self, now: Tick) {
        self.until.retain(|_, until| *until > now);
    }

    /// Number of tracked entries.
    pub fn len(&self) -> usize {
        self.until.len()
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.until.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown_expires() {
        let mut tracker = CooldownTracker::new();
        let user = UserId::new([1; 16]);
        let key = AbilityKey::new("airblast").unwrap();

        tracker.add(user, key.clone(), 20);
        assert!(tracker.is_on_cooldown(user, &key, 19));
        assert_eq!(tracker.remaining(user, &key, 15), 5);
        assert!(!tracker.is_on_cooldown(user, &key, 20));
    }

    #[test]
    fn test_shorter_cooldown_does_not_shorten() {
        let mut tracker = CooldownTracker::new();
        let user = UserId::new([1; 16]);
        let key = AbilityKey::new("airblast").unwrap();

        tracker.add(user, key.clone(), 40);
        tracker.add(user, key.clone(), 10);
        assert!(tracker.is_on_cooldown(user, &key, 30));
    }

    #[test]
    fn test_prune_and_clear() {
        let mut tracker = CooldownTracker::new();
        let a = UserId::new([1; 16]);
        let b = UserId::new([2; 16]);
        let key = AbilityKey::new("airblast").unwrap();

        tracker.add(a, key.clone(), 5);
        tracker.add(b, key.clone(), 50);
        tracker.prune(10);
        assert_eq!(tracker.len(), 1);

        tracker.clear_user(b);
        assert!(tracker.is_empty());
    }
}
