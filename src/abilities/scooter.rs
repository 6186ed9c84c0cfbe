//! Air Scooter
//!
//! Hovers the user forward along their look direction. Activated by a
//! left click while between 0.5 and 3.25 blocks above solid ground; ends
//! on sneak, submersion, expiry or once the ground falls out of reach.

use std::sync::Arc;

use super::ride::{can_mount, Ride};
use crate::ability::{
    Ability, AbilityDescription, Activation, ActivationContext, Condition, DestroyContext,
    Element, RemovalPolicy, UpdateContext, UpdateResult,
};
use crate::config::AbilityAttributes;
use crate::error::{AbilityError, RegistryError};
use crate::Tick;

/// Display name.
pub const NAME: &str = "AirScooter";

/// Highest mount point above the ground.
pub(crate) const MAX_HEIGHT: f64 = 3.25;

/// Description for registration.
pub fn description() -> Result<Arc<AbilityDescription>, RegistryError> {
    AbilityDescription::builder(NAME, || Box::new(AirScooter::default()))
        .element(Element::Air)
        .activation(&[Activation::Attack])
        .build()
}

/// Policy that ends a ride.
pub(crate) fn ride_policy(now: Tick, duration: Tick) -> RemovalPolicy {
    RemovalPolicy::none()
        .and(Condition::Sneaking)
        .and(Condition::UnderWater)
        .and(Condition::UnderLava)
        .and(Condition::expire_after(now, duration))
}

#[derive(Debug, Clone, Copy)]
struct Settings {
    speed: f64,
    cooldown: Tick,
    duration: Tick,
}

impl Settings {
    fn load(attributes: &AbilityAttributes) -> Self {
        Self {
            speed: attributes.get_or("speed", 0.7),
            cooldown: attributes.ticks_or("cooldown", 2000.0),
            duration: attributes.ticks_or("duration", 15000.0),
        }
    }
}

/// Live scooter.
#[derive(Debug, Default)]
pub struct AirScooter {
    settings: Option<Settings>,
    ride: Option<Ride>,
}

impl Ability for AirScooter {
    fn activate(&mut self, ctx: &mut ActivationContext<'_>, _method: Activation) -> bool {
        if !can_mount(ctx.world, ctx.user.location(), MAX_HEIGHT) {
            return false;
        }
        let settings = Settings::load(ctx.attributes);
        let policy = ride_policy(ctx.now, settings.duration);
        if policy.test(ctx.user, ctx.world, ctx.now).is_some() {
            return false;
        }
        ctx.set_removal_policy(policy);
        self.ride = Some(Ride::new(settings.speed, MAX_HEIGHT));
        self.settings = Some(settings);
        true
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) -> Result<UpdateResult, AbilityError> {
        let ride = self.ride.ok_or(AbilityError::Missing("ride state"))?;
        Ok(ride.update(ctx))
    }

    fn on_destroy(&mut self, ctx: &mut DestroyContext<'_>) {
        if let Some(settings) = self.settings {
            ctx.add_cooldown(settings.cooldown);
        }
    }

    fn on_config_reload(&mut self, attributes: &AbilityAttributes) {
        let settings = Settings::load(attributes);
        if let Some(ride) = self.ride.as_mut() {
            ride.speed = settings.speed;
        }
        // The expiry deadline stays as it was set at activation.
        if let Some(current) = self.settings.as_mut() {
            current.speed = settings.speed;
            current.cooldown = settings.cooldown;
        }
    }
}
