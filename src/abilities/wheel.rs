//! Air Wheel
//!
//! Combo of the scooter: a spinning disk of air in front of the rider
//! that damages whatever it runs into. Each entity is hit at most once
//! every half second.

use std::sync::Arc;

use glam::DVec3;

use super::ride::{can_mount, Ride};
use super::scooter::{self, ride_policy, MAX_HEIGHT};
use crate::ability::{
    Ability, AbilityDescription, AbilityKey, Activation, ActivationContext, DestroyContext,
    Element, HitFilter, UpdateContext, UpdateResult,
};
use crate::config::{millis_to_ticks, AbilityAttributes};
use crate::error::{AbilityError, RegistryError};
use crate::game::temporal::ExpiringSet;
use crate::geometry::{Aabb, Collider, Disk, Obb, Sphere};
use crate::platform::EntityId;
use crate::Tick;

/// Display name.
pub const NAME: &str = "AirWheel";

/// Half extents of the wheel slab before rotation.
const SLAB: DVec3 = DVec3::new(0.4, 2.0, 2.0);

/// Description for registration.
pub fn description() -> Result<Arc<AbilityDescription>, RegistryError> {
    AbilityDescription::builder(NAME, || Box::new(AirWheel::default()))
        .element(Element::Air)
        .build_sequence()
}

#[derive(Debug, Clone, Copy)]
struct Settings {
    cooldown: Tick,
    damage: f64,
    speed: f64,
    duration: Tick,
}

impl Settings {
    fn load(attributes: &AbilityAttributes) -> Self {
        Self {
            cooldown: attributes.ticks_or("cooldown", 8000.0),
            damage: attributes.get_or("damage", 1.0),
            speed: attributes.get_or("speed", 0.7),
            duration: attributes.ticks_or("duration", 15000.0),
        }
    }
}

/// Disk in front of the rider, its plane containing the look direction.
fn wheel_collider(location: DVec3, direction: DVec3) -> Collider {
    let forward = direction.with_y(0.0).normalize_or_zero();
    let center = location + DVec3::new(0.0, 0.8, 0.0) + forward * 1.2;
    let yaw = forward.x.atan2(forward.z);
    let slab = Obb::rotated(&Aabb::from_center(center, SLAB), DVec3::Y, yaw);
    Collider::Disk(Disk::new(slab, Sphere::new(center, 2.0)))
}

/// Live wheel.
#[derive(Debug)]
pub struct AirWheel {
    settings: Option<Settings>,
    ride: Option<Ride>,
    collider: Option<Collider>,
    affected: ExpiringSet<EntityId>,
}

impl Default for AirWheel {
    fn default() -> Self {
        Self {
            settings: None,
            ride: None,
            collider: None,
            affected: ExpiringSet::new(millis_to_ticks(500.0)),
        }
    }
}

impl Ability for AirWheel {
    fn activate(&mut self, ctx: &mut ActivationContext<'_>, _method: Activation) -> bool {
        let on_scooter_cooldown = AbilityKey::new(scooter::NAME).is_ok_and(|key| ctx.on_cooldown(&key));
        if on_scooter_cooldown || !can_mount(ctx.world, ctx.user.location(), MAX_HEIGHT) {
            return false;
        }
        let settings = Settings::load(ctx.attributes);
        let policy = ride_policy(ctx.now, settings.duration);
        if policy.test(ctx.user, ctx.world, ctx.now).is_some() {
            return false;
        }
        ctx.set_removal_policy(policy);
        self.collider = Some(wheel_collider(ctx.user.location(), ctx.user.direction()));
        self.ride = Some(Ride::new(settings.speed, MAX_HEIGHT));
        self.settings = Some(settings);
        true
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) -> Result<UpdateResult, AbilityError> {
        let settings = self.settings.ok_or(AbilityError::Missing("wheel settings"))?;
        let ride = self.ride.ok_or(AbilityError::Missing("ride state"))?;

        let collider = wheel_collider(ctx.user.location(), ctx.user.direction());
        self.collider = Some(collider);

        self.affected.prune(ctx.now);
        for entity in ctx.hit_entities(&collider, HitFilter::default()) {
            if self.affected.contains(&entity.id, ctx.now) {
                continue;
            }
            self.affected.insert(entity.id, ctx.now);
            ctx.damage(entity.id, settings.damage);
        }
        Ok(ride.update(ctx))
    }

    fn colliders(&self) -> &[Collider] {
        self.collider.as_slice()
    }

    fn on_destroy(&mut self, ctx: &mut DestroyContext<'_>) {
        if let Some(settings) = self.settings {
            ctx.add_cooldown(settings.cooldown);
        }
    }

    fn on_config_reload(&mut self, attributes: &AbilityAttributes) {
        let fresh = Settings::load(attributes);
        if let Some(settings) = self.settings.as_mut() {
            settings.damage = fresh.damage;
            settings.cooldown = fresh.cooldown;
        }
        if let Some(ride) = self.ride.as_mut() {
            ride.speed = fresh.speed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::testkit::{self, alice, bob, overworld};
    use crate::abilities::{blast, scooter};
    use crate::ability::EntityCommand;
    use crate::game::events::GameEventData;

    fn key(name: &str) -> AbilityKey {
        AbilityKey::new(name).unwrap()
    }

    fn perform_combo(game: &mut crate::game::Game, platform: &crate::platform::memory::MemoryPlatform) {
        let scooter = key(scooter::NAME);
        for method in [
            Activation::Sneak,
            Activation::SneakRelease,
            Activation::Sneak,
            Activation::SneakRelease,
        ] {
            game.handle_ability_action(platform, alice(), &scooter, method);
        }
        game.handle_ability_action(platform, alice(), &key(blast::NAME), Activation::Attack);
    }

    #[test]
    fn test_collider_plane_follows_look_direction() {
        let Collider::Disk(disk) = wheel_collider(DVec3::ZERO, DVec3::X) else {
            panic!("wheel is a disk");
        };
        assert!(disk.contains(DVec3::new(2.5, 0.8, 0.0)));
        assert!(!disk.contains(DVec3::new(1.2, 0.8, 1.0)));
    }

    #[test]
    fn test_combo_spawns_wheel() {
        let mut game = testkit::game();
        let platform = testkit::platform(DVec3::new(0.5, 2.5, 0.5));
        perform_combo(&mut game, &platform);

        let report = game.tick(&platform);
        assert!(report.events.iter().any(|event| matches!(
            &event.data,
            GameEventData::SequenceTriggered { sequence, .. } if *sequence == key(NAME)
        )));
        let world = game.worlds().manager(&overworld()).unwrap();
        assert!(world.has_ability(alice(), &key(NAME)));
        assert!(!world.has_ability(alice(), &key(scooter::NAME)));
    }

    #[test]
    fn test_damages_each_entity_once_per_window() {
        let mut game = testkit::game();
        let mut platform = testkit::platform(DVec3::new(0.5, 2.5, 0.5));
        testkit::add_bob(&mut platform, DVec3::new(2.5, 2.5, 0.5));
        perform_combo(&mut game, &platform);

        let mut hits = 0;
        for _ in 0..12 {
            let report = game.tick(&platform);
            hits += report
                .commands
                .iter()
                .filter(|command| {
                    matches!(command, EntityCommand::Damage { target, .. } if *target == EntityId::from(bob()))
                })
                .count();
        }
        assert_eq!(hits, 2);
    }

    #[test]
    fn test_scooter_cooldown_blocks_wheel() {
        let mut game = testkit::game();
        let mut platform = testkit::platform(DVec3::new(0.5, 2.5, 0.5));
        assert!(game.handle_ability_action(&platform, alice(), &key(scooter::NAME), Activation::Attack));
        platform.update_user(alice(), |user| user.sneaking = true);
        game.tick(&platform);
        platform.update_user(alice(), |user| user.sneaking = false);

        perform_combo(&mut game, &platform);
        game.tick(&platform);
        assert!(!game.worlds().manager(&overworld()).unwrap().has_ability(alice(), &key(NAME)));
    }
}
