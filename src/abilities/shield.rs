//! Air Shield
//!
//! A sphere of wind around the user while sneaking. Entities inside are
//! pushed outward; registered projectiles that touch it are destroyed.

use std::sync::Arc;

use glam::DVec3;

use crate::ability::{
    Ability, AbilityDescription, Activation, ActivationContext, Condition, DestroyContext,
    Element, HitFilter, RemovalPolicy, UpdateContext, UpdateResult,
};
use crate::config::AbilityAttributes;
use crate::error::{AbilityError, RegistryError};
use crate::geometry::{Collider, Sphere};
use crate::Tick;

/// Display name.
pub const NAME: &str = "AirShield";

/// Description for registration.
pub fn description() -> Result<Arc<AbilityDescription>, RegistryError> {
    AbilityDescription::builder(NAME, || Box::new(AirShield::default()))
        .element(Element::Air)
        .activation(&[Activation::Sneak])
        .build()
}

#[derive(Debug, Clone, Copy)]
struct Settings {
    cooldown: Tick,
    duration: Tick,
    radius: f64,
    max_push: f64,
}

impl Settings {
    fn load(attributes: &AbilityAttributes) -> Self {
        Self {
            cooldown: attributes.ticks_or("cooldown", 4000.0),
            duration: attributes.ticks_or("duration", 10000.0),
            radius: attributes.get_or("radius", 4.0),
            max_push: attributes.get_or("max_push", 2.6),
        }
    }
}

/// Live shield.
#[derive(Debug, Default)]
pub struct AirShield {
    settings: Option<Settings>,
    started: Tick,
    collider: Option<Collider>,
}

impl AirShield {
    /// Cooldown scaled by how much of the duration was used.
    fn cooldown(settings: &Settings, started: Tick, now: Tick) -> Tick {
        if settings.duration == 0 {
            return settings.cooldown;
        }
        let used = now.saturating_sub(started).min(settings.duration);
        let scaled = u128::from(settings.cooldown) * u128::from(used) / u128::from(settings.duration);
        Tick::try_from(scaled).unwrap_or(Tick::MAX)
    }
}

impl Ability for AirShield {
    fn activate(&mut self, ctx: &mut ActivationContext<'_>, _method: Activation) -> bool {
        let settings = Settings::load(ctx.attributes);
        ctx.set_removal_policy(
            RemovalPolicy::none()
                .and(Condition::SwappedSlots(ctx.description.key().clone()))
                .and(Condition::NotSneaking)
                .and(Condition::expire_after(ctx.now, settings.duration)),
        );
        self.started = ctx.now;
        self.collider = Some(Collider::Sphere(Sphere::new(
            ctx.user.bounds().position(),
            settings.radius,
        )));
        self.settings = Some(settings);
        true
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) -> Result<UpdateResult, AbilityError> {
        let settings = self.settings.ok_or(AbilityError::Missing("shield settings"))?;
        let center = ctx.user.bounds().position();
        let sphere = Collider::Sphere(Sphere::new(center, settings.radius));
        self.collider = Some(sphere);

        let filter = HitFilter {
            living_only: false,
            include_self: false,
        };
        for entity in ctx.hit_entities(&sphere, filter) {
            let offset = entity.bounds.position() - center;
            let normal = offset.with_y(0.0).normalize_or_zero();
            if normal == DVec3::ZERO {
                continue;
            }
            let strength = ((settings.radius - offset.length()) / settings.radius * settings.max_push)
                .clamp(0.0, 1.0);
            ctx.knockback(entity.id, normal * strength);
        }
        Ok(UpdateResult::Continue)
    }

    fn colliders(&self) -> &[Collider] {
        self.collider.as_slice()
    }

    fn on_destroy(&mut self, ctx: &mut DestroyContext<'_>) {
        if let Some(settings) = self.settings {
            ctx.add_cooldown(Self::cooldown(&settings, self.started, ctx.now));
        }
    }

    fn on_config_reload(&mut self, attributes: &AbilityAttributes) {
        let fresh = Settings::load(attributes);
        if let Some(settings) = self.settings.as_mut() {
            settings.radius = fresh.radius;
            settings.max_push = fresh.max_push;
            settings.cooldown = fresh.cooldown;
        }
    }
}
