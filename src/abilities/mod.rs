//! Built-in Air Abilities
//!
//! A small playable set wired the same way any platform's own abilities
//! would be:
//!
//! - `blast`: projectile gust, pushes entities
//! - `shield`: sphere held while sneaking, destroys blasts
//! - `scooter`: hovering ride
//! - `wheel`: combo of the scooter, damages on contact
//!
//! `register_defaults` registers all four, their collision pairs and the
//! wheel combo on a `GameBuilder`.

pub mod blast;
pub(crate) mod ride;
pub mod scooter;
pub mod shield;
pub mod wheel;

use crate::ability::Activation;
use crate::error::RegistryError;
use crate::game::{CollisionPair, GameBuilder, Sequence, SequenceStep};

pub use blast::AirBlast;
pub use scooter::AirScooter;
pub use shield::AirShield;
pub use wheel::AirWheel;

/// Register the built-in abilities, collisions and combos.
pub fn register_defaults(builder: &mut GameBuilder) -> Result<(), RegistryError> {
    builder
        .ability(blast::description()?)?
        .ability(shield::description()?)?
        .ability(scooter::description()?)?
        .ability(wheel::description()?)?;

    let blast = builder.description(blast::NAME)?;
    let shield = builder.description(shield::NAME)?;
    let scooter = builder.description(scooter::NAME)?;
    let wheel = builder.description(wheel::NAME)?;

    builder
        .collision(CollisionPair::new(blast.key().clone(), blast.key().clone(), true, true))
        .collision(CollisionPair::new(blast.key().clone(), shield.key().clone(), true, false))
        .collision(CollisionPair::new(wheel.key().clone(), blast.key().clone(), false, true));

    let combo = Sequence::new(
        wheel,
        vec![
            SequenceStep::new(scooter.clone(), Activation::Sneak),
            SequenceStep::new(scooter.clone(), Activation::SneakRelease),
            SequenceStep::new(scooter.clone(), Activation::Sneak),
            SequenceStep::new(scooter, Activation::SneakRelease),
            SequenceStep::new(blast, Activation::Attack),
        ],
    )?;
    builder.sequence(combo)?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::testkit::{self, alice, overworld};
    use super::*;
    use crate::ability::AbilityKey;
    use crate::game::events::{GameEventData, RemovalReason};
    use glam::DVec3;

    #[test]
    fn test_defaults_register() {
        let game = testkit::game();
        assert_eq!(game.abilities().len(), 4);
        assert_eq!(game.sequences().len(), 1);

        let wheel = game.sequences().iter().next().unwrap();
        assert_eq!(
            wheel.instructions(),
            "AirScooter (Tap Sneak) > AirScooter (Tap Sneak) > AirBlast (Left Click)"
        );
    }

    #[test]
    fn test_shield_destroys_enemy_blast() {
        let mut game = testkit::game();
        let mut platform = testkit::platform(DVec3::new(0.5, 1.0, 0.5));
        testkit::add_bob(&mut platform, DVec3::new(3.5, 1.0, 0.5));
        platform.update_user(testkit::bob(), |user| {
            user.elements.insert(crate::ability::Element::Air);
            user.sneaking = true;
            user.selected = AbilityKey::new(shield::NAME).ok();
        });

        let shield = AbilityKey::new(shield::NAME).unwrap();
        let blast = AbilityKey::new(blast::NAME).unwrap();
        assert!(game.handle_ability_action(&platform, testkit::bob(), &shield, Activation::Sneak));
        assert!(game.handle_ability_action(&platform, alice(), &blast, Activation::Attack));

        let report = game.tick(&platform);
        assert!(report.events.iter().any(|event| matches!(
            &event.data,
            GameEventData::AbilityRemoved { user_id, ability, reason: RemovalReason::Collision, .. }
                if *user_id == alice() && *ability == blast
        )));
        let world = game.worlds().manager(&overworld()).unwrap();
        assert!(world.has_ability(testkit::bob(), &shield));
        assert!(!world.has_ability(alice(), &blast));
    }
}
