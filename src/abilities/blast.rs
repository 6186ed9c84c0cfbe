//! Air Blast
//!
//! A gust launched from the user's eyes. It travels `speed` blocks per
//! tick until it has covered `range` or its path is blocked by a solid
//! block, pushing every entity it passes through once.

use std::collections::BTreeSet;
use std::sync::Arc;

use glam::DVec3;

use crate::ability::{
    Ability, AbilityDescription, Activation, ActivationContext, Condition, Element, HitFilter,
    InstanceLimit, RemovalPolicy, UpdateContext, UpdateResult,
};
use crate::config::AbilityAttributes;
use crate::error::{AbilityError, RegistryError};
use crate::geometry::{Collider, Ray, Sphere, EPSILON};
use crate::platform::EntityId;
use crate::Tick;

/// Display name.
pub const NAME: &str = "AirBlast";

/// Description for registration.
pub fn description() -> Result<Arc<AbilityDescription>, RegistryError> {
    AbilityDescription::builder(NAME, || Box::new(AirBlast::default()))
        .element(Element::Air)
        .activation(&[Activation::Attack])
        .limit(InstanceLimit::AtMost(4))
        .build()
}

#[derive(Debug, Clone, Copy)]
struct Settings {
    cooldown: Tick,
    range: f64,
    speed: f64,
    power: f64,
    radius: f64,
}

impl Settings {
    fn load(attributes: &AbilityAttributes) -> Self {
        Self {
            cooldown: attributes.ticks_or("cooldown", 1250.0),
            range: attributes.get_or("range", 20.0),
            speed: attributes.get_or("speed", 1.2),
            power: attributes.get_or("power", 2.1),
            radius: attributes.get_or("collision_radius", 1.3),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Stream {
    location: DVec3,
    direction: DVec3,
    travelled: f64,
}

/// Live blast.
#[derive(Debug, Default)]
pub struct AirBlast {
    settings: Option<Settings>,
    stream: Option<Stream>,
    collider: Option<Collider>,
    affected: BTreeSet<EntityId>,
}

impl AirBlast {
    /// Push applied to an entity, fading with distance travelled. Vertical
    /// push is capped.
    fn push(settings: &Settings, stream: &Stream) -> DVec3 {
        let direction = stream.direction.with_y(stream.direction.y.clamp(-0.3, 0.3));
        let factor = settings.power * (1.0 - stream.travelled / (2.0 * settings.range));
        direction * factor.max(0.0)
    }
}

impl Ability for AirBlast {
    fn activate(&mut self, ctx: &mut ActivationContext<'_>, _method: Activation) -> bool {
        if ctx.user.eyes_in_water() || ctx.user.eyes_in_lava() {
            return false;
        }
        let direction = ctx.user.direction().normalize_or_zero();
        if direction == DVec3::ZERO {
            return false;
        }
        let settings = Settings::load(ctx.attributes);
        ctx.set_removal_policy(
            RemovalPolicy::none()
                .and(Condition::UnderWater)
                .and(Condition::UnderLava),
        );
        ctx.add_cooldown(settings.cooldown);
        self.stream = Some(Stream {
            location: ctx.user.eye_location(),
            direction,
            travelled: 0.0,
        });
        self.settings = Some(settings);
        true
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) -> Result<UpdateResult, AbilityError> {
        let settings = self.settings.ok_or(AbilityError::Missing("blast settings"))?;
        let stream = self.stream.as_mut().ok_or(AbilityError::Missing("blast stream"))?;

        let step = settings.speed.min(settings.range - stream.travelled);
        if step <= EPSILON {
            return Ok(UpdateResult::Remove);
        }
        let path = Ray::with_length(stream.location, stream.direction, step);
        let blocked = ctx
            .world
            .nearby_blocks(&path.outer(), &|block| block.is_solid())
            .iter()
            .any(|block| path.intersects_aabb(&block.bounds()));
        if blocked {
            return Ok(UpdateResult::Remove);
        }
        stream.location = path.end();
        stream.travelled += step;

        let sphere = Collider::Sphere(Sphere::new(stream.location, settings.radius));
        self.collider = Some(sphere);

        let stream = *stream;
        let filter = HitFilter {
            living_only: false,
            include_self: false,
        };
        for entity in ctx.hit_entities(&sphere, filter) {
            if self.affected.insert(entity.id) {
                ctx.knockback(entity.id, Self::push(&settings, &stream));
            }
        }
        Ok(UpdateResult::Continue)
    }

    fn colliders(&self) -> &[Collider] {
        self.collider.as_slice()
    }

    fn on_config_reload(&mut self, attributes: &AbilityAttributes) {
        let fresh = Settings::load(attributes);
        if let Some(settings) = self.settings.as_mut() {
            settings.power = fresh.power;
            settings.radius = fresh.radius;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::testkit::{self, alice, bob, overworld};
    use crate::ability::{AbilityKey, EntityCommand};
    use crate::game::events::{GameEventData, RemovalReason};
    use crate::platform::{Block, Material};
    use glam::IVec3;

    fn key() -> AbilityKey {
        AbilityKey::new(NAME).unwrap()
    }

    fn knockbacks(commands: &[EntityCommand], target: EntityId) -> Vec<DVec3> {
        commands
            .iter()
            .filter_map(|command| match command {
                EntityCommand::Knockback { target: t, velocity } if *t == target => Some(*velocity),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_push_fades_and_caps_vertical() {
        let settings = Settings {
            cooldown: 25,
            range: 20.0,
            speed: 1.2,
            power: 2.0,
            radius: 1.3,
        };
        let stream = Stream {
            location: DVec3::ZERO,
            direction: DVec3::new(0.0, 1.0, 0.0),
            travelled: 20.0,
        };
        let push = AirBlast::push(&settings, &stream);
        assert!((push.y - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_pushes_entity_once() {
        let mut game = testkit::game();
        let mut platform = testkit::platform(DVec3::new(0.5, 1.0, 0.5));
        testkit::add_bob(&mut platform, DVec3::new(4.5, 1.0, 0.5));
        assert!(game.handle_ability_action(&platform, alice(), &key(), Activation::Attack));
        assert!(game.cooldowns().is_on_cooldown(alice(), &key(), game.now()));

        let mut pushes = Vec::new();
        for _ in 0..10 {
            let report = game.tick(&platform);
            pushes.extend(knockbacks(&report.commands, EntityId::from(bob())));
        }
        assert_eq!(pushes.len(), 1);
        assert!(pushes[0].x > 1.0);
    }

    #[test]
    fn test_huge_cooldown_saturates() {
        let mut game = testkit::game();
        let platform = testkit::platform(DVec3::new(0.5, 1.0, 0.5));
        game.load_config_str(r#"{"abilities": {"airblast": {"cooldown": 1e300}}}"#)
            .unwrap();

        assert!(game.handle_ability_action(&platform, alice(), &key(), Activation::Attack));
        assert!(game.cooldowns().is_on_cooldown(alice(), &key(), Tick::MAX - 1));
        game.tick(&platform);
        assert!(!game.handle_ability_action(&platform, alice(), &key(), Activation::Attack));
    }

    #[test]
    fn test_wall_stops_blast() {
        let mut game = testkit::game();
        let mut platform = testkit::platform(DVec3::new(0.5, 1.0, 0.5));
        if let Some(world) = platform.world_mut(&overworld()) {
            for y in 0..4 {
                world.set_block(Block::new(IVec3::new(3, y, 0), Material::Solid));
            }
        }
        assert!(game.handle_ability_action(&platform, alice(), &key(), Activation::Attack));

        let mut removed_at = None;
        for _ in 0..5 {
            let report = game.tick(&platform);
            if report.events.iter().any(|event| {
                matches!(
                    event.data,
                    GameEventData::AbilityRemoved { reason: RemovalReason::Completed, .. }
                )
            }) {
                removed_at = Some(report.tick);
                break;
            }
        }
        // Path 2.9 to 4.1 is the first to reach the wall.
        assert_eq!(removed_at, Some(3));
    }

    #[test]
    fn test_blast_ends_at_range() {
        let mut game = testkit::game();
        let platform = testkit::platform(DVec3::new(0.5, 1.0, 0.5));
        assert!(game.handle_ability_action(&platform, alice(), &key(), Activation::Attack));

        // 20 blocks at 1.2 per tick: 17 moving ticks, removed on the 18th.
        for _ in 0..17 {
            game.tick(&platform);
        }
        assert!(game.worlds().manager(&overworld()).unwrap().has_ability(alice(), &key()));
        game.tick(&platform);
        assert!(!game.worlds().manager(&overworld()).unwrap().has_ability(alice(), &key()));
    }
}
