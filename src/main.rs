//! Bending Engine demo driver
//!
//! Runs the built-in air abilities against an in-memory world at the
//! fixed tick rate and logs what the engine reports.

use anyhow::Context;
use glam::DVec3;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use bending::abilities::{self, blast, scooter, shield};
use bending::ability::{AbilityKey, Element};
use bending::game::replay::CHECKPOINT_INTERVAL;
use bending::game::{GameEventData, TickReport};
use bending::platform::memory::{MemoryPlatform, MemoryUser, MemoryWorld};
use bending::{Activation, EngineConfig, Game, UserId, WorldKey, TICK_RATE, VERSION};

/// Length of the scripted demo.
const DEMO_TICKS: u64 = 200;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = EngineConfig::from_env();
    info!("Bending Engine v{}", VERSION);
    info!("Tick Rate: {} Hz ({:?} per tick)", TICK_RATE, config.tick_interval);

    let mut builder = Game::builder(config.clone());
    abilities::register_defaults(&mut builder).context("registering built-in abilities")?;
    builder.record_replay(CHECKPOINT_INTERVAL);
    let mut game = builder.build().context("building game")?;

    for sequence in game.sequences().iter() {
        info!("Combo {}: {}", sequence.description().display_name(), sequence.instructions());
    }

    if let Some(handle) = game.reload_config() {
        handle.await.context("config reload task")?;
    }

    demo(&mut game, config.tick_interval).await
}

/// Two air benders: one shields, the other blasts and then rides the wheel.
async fn demo(game: &mut Game, tick_interval: std::time::Duration) -> anyhow::Result<()> {
    info!("=== Starting Demo ===");

    let world = WorldKey::new("overworld");
    let caster = UserId::new([1; 16]);
    let defender = UserId::new([2; 16]);
    let mut platform = demo_platform(&world, caster, defender);

    let blast = AbilityKey::new(blast::NAME)?;
    let shield = AbilityKey::new(shield::NAME)?;
    let scooter = AbilityKey::new(scooter::NAME)?;

    let mut ticker = interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    for t in 1..=DEMO_TICKS {
        ticker.tick().await;

        match t {
            1 => {
                platform.update_user(defender, |user| user.sneaking = true);
                game.handle_ability_action(&platform, defender, &shield, Activation::Sneak);
            }
            5 => {
                game.handle_ability_action(&platform, caster, &blast, Activation::Attack);
            }
            40 => {
                platform.update_user(defender, |user| user.sneaking = false);
            }
            60 => {
                for method in [
                    Activation::Sneak,
                    Activation::SneakRelease,
                    Activation::Sneak,
                    Activation::SneakRelease,
                ] {
                    game.handle_ability_action(&platform, caster, &scooter, method);
                }
                game.handle_ability_action(&platform, caster, &blast, Activation::Attack);
            }
            150 => {
                platform.update_user(caster, |user| user.sneaking = true);
            }
            _ => {}
        }

        let report = game.tick(&platform);
        log_report(&report);

        if report.tick % CHECKPOINT_INTERVAL == 0 {
            info!(
                "Tick {}: {} instances, hash {}",
                report.tick,
                game.worlds().total_instances(),
                hex::encode(&game.state_hash()[..8])
            );
        }
    }

    // Print final results
    info!("=== Demo Results ===");
    let ended = game.shutdown(&platform);
    info!("Instances ended at shutdown: {}", ended);
    info!("Final State Hash: {}", hex::encode(game.state_hash()));
    if let Some(replay) = game.take_replay() {
        let bytes = replay.to_bytes().context("encoding replay")?;
        info!(
            "Replay: {} inputs, {} checkpoints, {} bytes",
            replay.inputs.len(),
            replay.checkpoints.len(),
            bytes.len()
        );
    }
    Ok(())
}

fn demo_platform(world: &WorldKey, caster: UserId, defender: UserId) -> MemoryPlatform {
    let mut overworld = MemoryWorld::new(world.clone());
    overworld.fill_floor(0, 32);

    let mut platform = MemoryPlatform::new();
    platform.add_world(overworld);

    let mut caster = MemoryUser::new(caster, world.clone())
        .with_element(Element::Air)
        .at(DVec3::new(0.5, 2.5, 0.5))
        .looking(DVec3::X);
    caster.selected = AbilityKey::new(blast::NAME).ok();
    platform.add_user(caster);

    let mut defender = MemoryUser::new(defender, world.clone())
        .with_element(Element::Air)
        .at(DVec3::new(6.5, 1.0, 0.5))
        .looking(DVec3::NEG_X);
    defender.selected = AbilityKey::new(shield::NAME).ok();
    platform.add_user(defender);

    platform
}

fn log_report(report: &TickReport) {
    for event in &report.events {
        match &event.data {
            GameEventData::AbilityActivated { user_id, ability, instance, method } => {
                info!(
                    "Tick {}: {} activated {} {} ({})",
                    report.tick,
                    hex::encode(&user_id.0[..4]),
                    ability,
                    instance,
                    method.label()
                );
            }
            GameEventData::AbilityRemoved { user_id, ability, reason, .. } => {
                info!(
                    "Tick {}: {} lost {} ({:?})",
                    report.tick,
                    hex::encode(&user_id.0[..4]),
                    ability,
                    reason
                );
            }
            GameEventData::SequenceTriggered { user_id, sequence } => {
                info!("Tick {}: {} performed {}", report.tick, hex::encode(&user_id.0[..4]), sequence);
            }
            GameEventData::CollisionResolved { first_ability, second_ability, .. } => {
                info!("Tick {}: {} collided with {}", report.tick, first_ability, second_ability);
            }
            _ => {}
        }
    }
    if !report.commands.is_empty() {
        debug!(tick = report.tick, commands = report.commands.len(), "entity commands");
    }
}
