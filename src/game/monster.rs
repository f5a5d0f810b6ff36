//! Monsters: wandering AI, population control, and death drops

use std::f64::consts::{PI, TAU};

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use super::entity::{
    AttackComponent, Entity, HealthComponent, MovementComponent, ARENA_MAX_X, ARENA_MAX_Y,
    ARENA_MIN_X, ARENA_MIN_Y,
};
use super::world::{EntityClass, World};

pub const MONSTER_SIZE: f64 = 20.0;
pub const MONSTER_MAX_HEALTH: i32 = 60;
pub const MONSTER_SPEED: f64 = 30.0;
pub const MONSTER_DAMAGE: i32 = 20;
pub const MONSTER_DROP_RATE: f64 = 0.75;
pub const MONSTER_SPAWN_MARGIN: f64 = 50.0;

/// Population target: min(2·players + base, cap)
pub const MONSTERS_PER_PLAYER: usize = 2;
pub const BASE_MONSTER_COUNT: usize = 10;
pub const MAX_MONSTER_COUNT: usize = 60;

/// Chance per tick that a monster rerolls its heading
const DIRECTION_REROLL_CHANCE: f64 = 0.01;

/// An enemy wandering the arena
pub struct Monster {
    pub entity: Entity,
    pub health: HealthComponent,
    pub movement: MovementComponent,
    pub attack: AttackComponent,
    /// Probability of dropping a potion on death
    pub drop_rate: f64,
}

impl Monster {
    pub fn new(id: u32, x: f64, y: f64, direction: f64) -> Self {
        Self {
            entity: Entity::new(id, x, y, MONSTER_SIZE, MONSTER_SIZE),
            health: HealthComponent::new(MONSTER_MAX_HEALTH),
            movement: MovementComponent {
                speed: MONSTER_SPEED,
                direction,
            },
            attack: AttackComponent {
                damage: MONSTER_DAMAGE,
            },
            drop_rate: MONSTER_DROP_RATE,
        }
    }

    /// Move, bounce off walls, occasionally wander onto a new heading
    pub fn advance(&mut self, dt: f64, rng: &mut ChaCha8Rng) {
        let mut new_x = self.entity.x + self.movement.direction.cos() * self.movement.speed * dt;
        let mut new_y = self.entity.y + self.movement.direction.sin() * self.movement.speed * dt;

        let half_width = self.entity.width / 2.0;
        let half_height = self.entity.height / 2.0;

        if new_x - half_width < ARENA_MIN_X {
            new_x = ARENA_MIN_X + half_width;
            self.movement.direction = PI - self.movement.direction;
        } else if new_x + half_width > ARENA_MAX_X {
            new_x = ARENA_MAX_X - half_width;
            self.movement.direction = PI - self.movement.direction;
        }

        if new_y - half_height < ARENA_MIN_Y {
            new_y = ARENA_MIN_Y + half_height;
            self.movement.direction = -self.movement.direction;
        } else if new_y + half_height > ARENA_MAX_Y {
            new_y = ARENA_MAX_Y - half_height;
            self.movement.direction = -self.movement.direction;
        }

        self.entity.x = new_x;
        self.entity.y = new_y;

        if rng.gen_bool(DIRECTION_REROLL_CHANCE) {
            self.movement.direction = rng.gen_range(0.0..TAU);
        }
    }
}

/// Per-tick monster subsystem: spawn to target, wander, reap the dead
pub struct MonsterSystem;

impl MonsterSystem {
    pub fn update(world: &mut World, dt: f64) {
        let target = (world.players.len() * MONSTERS_PER_PLAYER + BASE_MONSTER_COUNT)
            .min(MAX_MONSTER_COUNT);
        while world.monsters.len() < target {
            world.spawn_monster();
        }

        let World { monsters, rng, .. } = world;
        for monster in monsters.iter_mut() {
            monster.advance(dt, rng);
        }

        Self::remove_dead_monsters(world);
    }

    fn remove_dead_monsters(world: &mut World) {
        let mut i = 0;
        while i < world.monsters.len() {
            if !world.monsters[i].health.is_dead() {
                i += 1;
                continue;
            }
            let monster = world.monsters.swap_remove(i);

            if world.rng.gen_bool(monster.drop_rate) {
                world.spawn_potion(monster.entity.x, monster.entity.y);
            }

            let amount = 10 + world.rng.gen_range(0..10);
            let orbs = world.rng.gen_range(3..6);
            for _ in 0..orbs {
                world.spawn_experience(monster.entity.x, monster.entity.y, amount / orbs);
            }

            world.ids.release(EntityClass::Monster, monster.entity.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn population_tracks_player_count_up_to_the_cap() {
        let mut world = World::new(3);
        MonsterSystem::update(&mut world, 1.0 / 60.0);
        assert_eq!(world.monsters.len(), BASE_MONSTER_COUNT);

        for _ in 0..5 {
            world.add_player(None);
        }
        MonsterSystem::update(&mut world, 1.0 / 60.0);
        assert_eq!(world.monsters.len(), 20);

        for _ in 0..40 {
            world.add_player(None);
        }
        MonsterSystem::update(&mut world, 1.0 / 60.0);
        assert_eq!(world.monsters.len(), MAX_MONSTER_COUNT);
    }

    #[test]
    fn monster_bounces_off_the_left_wall() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut monster = Monster::new(1, 12.0, 400.0, PI); // heading straight left
        monster.movement.speed = 300.0;

        monster.advance(1.0, &mut rng);
        assert_eq!(monster.entity.x, MONSTER_SIZE / 2.0);
        // Reflected heading now points right.
        assert!(monster.movement.direction.cos() > 0.0);
    }

    #[test]
    fn monster_bounces_off_the_bottom_wall() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut monster = Monster::new(1, 600.0, 790.0, std::f64::consts::FRAC_PI_2);
        monster.movement.speed = 300.0;

        monster.advance(1.0, &mut rng);
        assert_eq!(monster.entity.y, ARENA_MAX_Y - MONSTER_SIZE / 2.0);
        assert!(monster.movement.direction.sin() < 0.0);
    }

    #[test]
    fn monsters_never_leave_the_arena() {
        let mut world = World::new(11);
        for _ in 0..3600 {
            MonsterSystem::update(&mut world, 1.0 / 60.0);
        }
        for monster in &world.monsters {
            let half = MONSTER_SIZE / 2.0;
            assert!(monster.entity.x - half >= ARENA_MIN_X);
            assert!(monster.entity.x + half <= ARENA_MAX_X);
            assert!(monster.entity.y - half >= ARENA_MIN_Y);
            assert!(monster.entity.y + half <= ARENA_MAX_Y);
        }
    }

    #[test]
    fn dead_monster_drops_orbs_near_its_corpse() {
        let mut world = World::new(5);
        let mut corpse = Monster::new(99, 600.0, 400.0, 0.0);
        corpse.movement.speed = 0.0;
        corpse.health.take_damage(1000);
        world.monsters.push(corpse);

        MonsterSystem::update(&mut world, 1.0 / 60.0);

        // Reaped, and replaced up to the population target.
        assert!(world.monsters.iter().all(|m| m.entity.id != 99));
        let orbs: Vec<_> = world.experiences.iter().collect();
        assert!((3..=5).contains(&orbs.len()), "expected 3-5 orbs, got {}", orbs.len());
        for orb in orbs {
            assert!((orb.entity.x - 600.0).abs() <= 15.0);
            assert!((orb.entity.y - 400.0).abs() <= 15.0);
            assert!(orb.amount >= 2 && orb.amount <= 6); // (10..=19) / (3..=5)
        }
        // Potion drop is probabilistic (0.75); position is exact when it lands.
        for potion in &world.potions {
            assert_eq!(potion.entity.x, 600.0);
            assert_eq!(potion.entity.y, 400.0);
        }
    }
}
