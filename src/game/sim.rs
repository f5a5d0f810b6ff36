//! Simulation driver: the fixed-rate tick loop and subsystem ordering

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{interval, MissedTickBehavior};
use tracing::warn;

use crate::hub::HubHandle;
use crate::util::time::{tick_delta, TICK_DURATION_MICROS};

use super::collision::CollisionSystem;
use super::monster::MonsterSystem;
use super::player::PlayerSystem;
use super::snapshot;
use super::world::World;

/// Advance the world by one tick. Subsystem order is fixed and observable:
/// notifications and state changes happen player-first, then monsters, then
/// collision resolution.
pub fn tick(world: &mut World, dt: f64) {
    world.clock += dt;
    PlayerSystem::update(world, dt);
    MonsterSystem::update(world, dt);
    CollisionSystem::update(world);
}

/// Run the tick loop forever. Holds the world lock for the whole tick,
/// encodes the snapshot before unlocking, and only then hands it to the hub.
/// Overruns are not caught up; a late tick still advances by the nominal Δt.
pub async fn run(world: Arc<Mutex<World>>, hub: HubHandle) {
    let mut ticker = interval(Duration::from_micros(TICK_DURATION_MICROS));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let dt = tick_delta();

    loop {
        ticker.tick().await;

        let frame = {
            let mut world = world.lock().await;
            tick(&mut world, dt);
            snapshot::encode(&world)
        };

        match frame {
            Ok(encoded) => hub.broadcast(encoded).await,
            Err(e) => warn!(error = %e, "failed to encode game state, skipping broadcast"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entity::{ARENA_MAX_X, ARENA_MAX_Y, ARENA_MIN_X, ARENA_MIN_Y};
    use crate::game::player::WEAPON_ORBIT_RADIUS;
    use crate::game::world::EntityClass;
    use std::f64::consts::TAU;

    /// Drive a busy world and check the universal invariants every tick.
    #[test]
    fn invariants_hold_across_many_ticks() {
        let mut world = World::new(1234);
        for _ in 0..4 {
            world.add_player(None);
        }
        // Spread the players out with different headings.
        for (i, player) in world.players.iter_mut().enumerate() {
            player.movement.direction = i as f64 * 1.3;
        }

        let dt = 1.0 / 60.0;
        for _ in 0..600 {
            tick(&mut world, dt);

            for player in &world.players {
                let half_w = player.entity.width / 2.0;
                let half_h = player.entity.height / 2.0;
                assert!(player.entity.x - half_w >= ARENA_MIN_X);
                assert!(player.entity.x + half_w <= ARENA_MAX_X);
                assert!(player.entity.y - half_h >= ARENA_MIN_Y);
                assert!(player.entity.y + half_h <= ARENA_MAX_Y);

                assert!(player.health.health >= 0);
                assert!(player.health.health <= player.health.max_health);

                let count = player.weapons.len();
                for (i, weapon) in player.weapons.iter().enumerate() {
                    let angle = player.weapon_rotation_angle + i as f64 * TAU / count as f64;
                    let expected_x = player.entity.x + angle.cos() * WEAPON_ORBIT_RADIUS;
                    let expected_y = player.entity.y + angle.sin() * WEAPON_ORBIT_RADIUS;
                    assert!((weapon.entity.x - expected_x).abs() < 1e-6);
                    assert!((weapon.entity.y - expected_y).abs() < 1e-6);
                }
            }

            for monster in &world.monsters {
                let half = monster.entity.width / 2.0;
                assert!(monster.entity.x - half >= ARENA_MIN_X);
                assert!(monster.entity.x + half <= ARENA_MAX_X);
                assert!(monster.entity.y - half >= ARENA_MIN_Y);
                assert!(monster.entity.y + half <= ARENA_MAX_Y);
                assert!(monster.health.health >= 0);
                assert!(monster.health.health <= monster.health.max_health);
            }
        }
    }

    /// Ids are live exactly while their entity is
    #[test]
    fn id_sets_track_live_entities() {
        let mut world = World::new(99);
        world.add_player(None);
        let dt = 1.0 / 60.0;
        for _ in 0..1200 {
            tick(&mut world, dt);

            assert_eq!(
                world.ids.live_count(EntityClass::Player),
                world.players.len()
            );
            assert_eq!(
                world.ids.live_count(EntityClass::Monster),
                world.monsters.len()
            );
            assert_eq!(
                world.ids.live_count(EntityClass::Potion),
                world.potions.len()
            );
            assert_eq!(
                world.ids.live_count(EntityClass::Experience),
                world.experiences.len()
            );
            for player in &world.players {
                assert!(world.ids.is_live(EntityClass::Player, player.entity.id));
                for weapon in &player.weapons {
                    assert!(world.ids.is_live(EntityClass::Weapon, weapon.entity.id));
                }
            }
        }
    }
}
