//! Players, their orbiting weapons, and the per-tick player subsystem

use std::f64::consts::TAU;

use rand::Rng;
use tracing::info;

use crate::hub::ConnHandle;
use crate::ws::protocol::ServerMsg;

use super::entity::{
    AttackComponent, Entity, ExperienceComponent, HealthComponent, MovementComponent,
    ARENA_MAX_X, ARENA_MAX_Y, ARENA_MIN_X, ARENA_MIN_Y,
};
use super::send_to;
use super::world::World;

pub const PLAYER_SPAWN_X: f64 = 100.0;
pub const PLAYER_SPAWN_Y: f64 = 100.0;
pub const PLAYER_WIDTH: f64 = 10.0;
pub const PLAYER_HEIGHT: f64 = 20.0;
pub const PLAYER_MAX_HEALTH: i32 = 100;
pub const PLAYER_SPEED: f64 = 100.0;
pub const PLAYER_DAMAGE: i32 = 10;

pub const WEAPONS_PER_PLAYER: usize = 2;
pub const WEAPON_WIDTH: f64 = 10.0;
pub const WEAPON_HEIGHT: f64 = 20.0;
pub const WEAPON_ORBIT_RADIUS: f64 = 30.0;
pub const WEAPON_ROTATION_RATE: f64 = 1.0;

/// A user-controlled character
pub struct Player {
    pub entity: Entity,
    pub health: HealthComponent,
    pub movement: MovementComponent,
    pub experience: ExperienceComponent,
    pub attack: AttackComponent,
    pub weapon_rotation_angle: f64,
    pub weapon_rotation_rate: f64,
    pub weapons: Vec<Weapon>,
    /// Owning connection; None once the connection is gone
    pub conn: Option<ConnHandle>,
}

/// A weapon orbiting its owner; never independently steered
pub struct Weapon {
    pub entity: Entity,
    pub owner_id: u32,
}

impl Player {
    pub fn new(id: u32, conn: Option<ConnHandle>) -> Self {
        Self {
            entity: Entity::new(id, PLAYER_SPAWN_X, PLAYER_SPAWN_Y, PLAYER_WIDTH, PLAYER_HEIGHT),
            health: HealthComponent::new(PLAYER_MAX_HEALTH),
            movement: MovementComponent {
                speed: PLAYER_SPEED,
                direction: 0.0,
            },
            experience: ExperienceComponent {
                experience: 0,
                level: 1,
            },
            attack: AttackComponent {
                damage: PLAYER_DAMAGE,
            },
            weapon_rotation_angle: 0.0,
            weapon_rotation_rate: WEAPON_ROTATION_RATE,
            weapons: Vec::new(),
            conn,
        }
    }

    /// Straight-line motion clamped into the arena, then weapon placement
    pub fn advance(&mut self, dt: f64) {
        let new_x = self.entity.x + self.movement.direction.cos() * self.movement.speed * dt;
        let new_y = self.entity.y + self.movement.direction.sin() * self.movement.speed * dt;

        let half_width = self.entity.width / 2.0;
        let half_height = self.entity.height / 2.0;
        self.entity.x = new_x.clamp(ARENA_MIN_X + half_width, ARENA_MAX_X - half_width);
        self.entity.y = new_y.clamp(ARENA_MIN_Y + half_height, ARENA_MAX_Y - half_height);

        self.weapon_rotation_angle += self.weapon_rotation_rate * dt;

        let count = self.weapons.len();
        if count > 0 {
            let step = TAU / count as f64;
            for (i, weapon) in self.weapons.iter_mut().enumerate() {
                let angle = self.weapon_rotation_angle + i as f64 * step;
                weapon.entity.x = self.entity.x + angle.cos() * WEAPON_ORBIT_RADIUS;
                weapon.entity.y = self.entity.y + angle.sin() * WEAPON_ORBIT_RADIUS;
            }
        }
    }
}

/// Per-tick player subsystem: motion, weapon orbit, death cleanup
pub struct PlayerSystem;

impl PlayerSystem {
    pub fn update(world: &mut World, dt: f64) {
        for player in &mut world.players {
            player.advance(dt);
        }
        Self::remove_dead_players(world);
    }

    fn remove_dead_players(world: &mut World) {
        let dead: Vec<u32> = world
            .players
            .iter()
            .filter(|p| p.health.is_dead())
            .map(|p| p.entity.id)
            .collect();

        for player_id in dead {
            let Some(player) = world.remove_player(player_id) else {
                continue;
            };

            if let Some(conn) = &player.conn {
                send_to(conn, &ServerMsg::PlayerDeath { player_id });
            }

            // Half the player's experience scatters as orbs.
            if player.experience.experience > 0 {
                let amount = player.experience.experience / 2;
                let orbs = world.rng.gen_range(4..8);
                for _ in 0..orbs {
                    world.spawn_experience(player.entity.x, player.entity.y, amount / orbs);
                }
            }

            info!(player_id, "player died");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::world::EntityClass;

    #[test]
    fn player_moves_along_its_heading() {
        let mut player = Player::new(1, None);
        player.movement.direction = 0.0;
        player.advance(1.0);
        assert!((player.entity.x - (PLAYER_SPAWN_X + PLAYER_SPEED)).abs() < 1e-9);
        assert!((player.entity.y - PLAYER_SPAWN_Y).abs() < 1e-9);
    }

    #[test]
    fn player_clamps_at_the_wall_and_keeps_steering() {
        let mut player = Player::new(1, None);
        player.movement.direction = std::f64::consts::PI; // straight into the left wall
        for _ in 0..200 {
            player.advance(1.0 / 60.0);
        }
        assert_eq!(player.entity.x, PLAYER_WIDTH / 2.0);

        player.movement.direction = 0.0;
        player.advance(1.0);
        assert!(player.entity.x > PLAYER_WIDTH / 2.0);
    }

    #[test]
    fn weapons_sit_on_the_orbit_circle_evenly_phased() {
        let mut world = World::new(1);
        let id = world.add_player(None);
        let player = world.players.iter_mut().find(|p| p.entity.id == id).unwrap();
        player.movement.speed = 0.0;
        player.advance(0.25);

        let phase = player.weapon_rotation_angle;
        let count = player.weapons.len();
        for (i, weapon) in player.weapons.iter().enumerate() {
            let angle = phase + i as f64 * TAU / count as f64;
            let expected_x = player.entity.x + angle.cos() * WEAPON_ORBIT_RADIUS;
            let expected_y = player.entity.y + angle.sin() * WEAPON_ORBIT_RADIUS;
            assert!((weapon.entity.x - expected_x).abs() < 1e-9);
            assert!((weapon.entity.y - expected_y).abs() < 1e-9);
        }
    }

    #[test]
    fn dead_player_drops_orbs_and_frees_its_ids() {
        let mut world = World::new(7);
        let id = world.add_player(None);
        {
            let player = world.players.iter_mut().find(|p| p.entity.id == id).unwrap();
            player.experience.experience = 8;
            player.health.take_damage(1000);
        }

        PlayerSystem::update(&mut world, 1.0 / 60.0);

        assert!(world.player(id).is_none());
        assert!(!world.ids.is_live(EntityClass::Player, id));
        let orbs = world.experiences.len();
        assert!((4..=7).contains(&orbs), "expected 4-7 orbs, got {orbs}");
        for orb in &world.experiences {
            assert_eq!(orb.amount, 4 / orbs as i32);
        }
    }

    #[test]
    fn dead_player_without_experience_drops_nothing() {
        let mut world = World::new(7);
        let id = world.add_player(None);
        world
            .players
            .iter_mut()
            .find(|p| p.entity.id == id)
            .unwrap()
            .health
            .take_damage(1000);

        PlayerSystem::update(&mut world, 1.0 / 60.0);

        assert!(world.player(id).is_none());
        assert!(world.experiences.is_empty());
    }

    #[test]
    fn death_notification_reaches_the_owning_connection() {
        let (conn, mut rx) = crate::hub::ConnHandle::new(1);
        let mut world = World::new(7);
        let id = world.add_player(Some(conn));
        world
            .players
            .iter_mut()
            .find(|p| p.entity.id == id)
            .unwrap()
            .health
            .take_damage(1000);

        PlayerSystem::update(&mut world, 1.0 / 60.0);

        let text = rx.try_recv().unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["type"], "playerDeath");
        assert_eq!(value["playerID"], id);
    }
}
