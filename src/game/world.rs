//! World state: the four entity collections, the id allocator, the seeded
//! RNG, and the simulation clock. The whole struct lives behind one mutex;
//! the simulation task holds it for a full tick, reader tasks hold it for
//! join/steer/leave.

use std::collections::HashSet;
use std::f64::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::hub::ConnHandle;

use super::item::{ExperienceOrb, HealingPotion, ORB_JITTER, ORB_SIZE, POTION_HEAL, POTION_SIZE};
use super::monster::{Monster, MONSTER_SPAWN_MARGIN};
use super::player::{Player, Weapon, WEAPONS_PER_PLAYER, WEAPON_HEIGHT, WEAPON_WIDTH};
use super::entity::{Entity, ARENA_MAX_X, ARENA_MAX_Y, ARENA_MIN_X, ARENA_MIN_Y};

/// Entity classes for id allocation; ids are unique within a class only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityClass {
    Player,
    Weapon,
    Monster,
    Potion,
    Experience,
}

#[derive(Debug, Default)]
struct IdSpace {
    next: u32,
    live: HashSet<u32>,
}

impl IdSpace {
    fn generate(&mut self) -> u32 {
        loop {
            let id = self.next;
            self.next = self.next.wrapping_add(1);
            if self.live.insert(id) {
                return id;
            }
        }
    }

    fn release(&mut self, id: u32) {
        self.live.remove(&id);
    }
}

/// Per-class id allocator owned by the world
#[derive(Debug, Default)]
pub struct IdAllocator {
    player: IdSpace,
    weapon: IdSpace,
    monster: IdSpace,
    potion: IdSpace,
    experience: IdSpace,
}

impl IdAllocator {
    fn space_mut(&mut self, class: EntityClass) -> &mut IdSpace {
        match class {
            EntityClass::Player => &mut self.player,
            EntityClass::Weapon => &mut self.weapon,
            EntityClass::Monster => &mut self.monster,
            EntityClass::Potion => &mut self.potion,
            EntityClass::Experience => &mut self.experience,
        }
    }

    fn space(&self, class: EntityClass) -> &IdSpace {
        match class {
            EntityClass::Player => &self.player,
            EntityClass::Weapon => &self.weapon,
            EntityClass::Monster => &self.monster,
            EntityClass::Potion => &self.potion,
            EntityClass::Experience => &self.experience,
        }
    }

    /// Return an id not currently live in this class and mark it live
    pub fn generate(&mut self, class: EntityClass) -> u32 {
        self.space_mut(class).generate()
    }

    /// Release an id when its entity is removed
    pub fn release(&mut self, class: EntityClass, id: u32) {
        self.space_mut(class).release(id);
    }

    pub fn is_live(&self, class: EntityClass, id: u32) -> bool {
        self.space(class).live.contains(&id)
    }

    pub fn live_count(&self, class: EntityClass) -> usize {
        self.space(class).live.len()
    }
}

/// The authoritative game world
pub struct World {
    pub players: Vec<Player>,
    pub monsters: Vec<Monster>,
    pub potions: Vec<HealingPotion>,
    pub experiences: Vec<ExperienceOrb>,
    pub ids: IdAllocator,
    pub rng: ChaCha8Rng,
    /// Simulation time in seconds, advanced by Δt each tick
    pub clock: f64,
}

impl World {
    pub fn new(seed: u64) -> Self {
        Self {
            players: Vec::new(),
            monsters: Vec::new(),
            potions: Vec::new(),
            experiences: Vec::new(),
            ids: IdAllocator::default(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            clock: 0.0,
        }
    }

    /// Create a player with its two orbiting weapons; returns the player id
    pub fn add_player(&mut self, conn: Option<ConnHandle>) -> u32 {
        let id = self.ids.generate(EntityClass::Player);
        let mut player = Player::new(id, conn);
        for _ in 0..WEAPONS_PER_PLAYER {
            let weapon_id = self.ids.generate(EntityClass::Weapon);
            player.weapons.push(Weapon {
                entity: Entity::new(
                    weapon_id,
                    player.entity.x,
                    player.entity.y,
                    WEAPON_WIDTH,
                    WEAPON_HEIGHT,
                ),
                owner_id: id,
            });
        }
        self.players.push(player);
        info!(player_id = id, "new player added to game");
        id
    }

    /// Remove a player and release its ids. Used both for deaths and for
    /// plain disconnects; drops are the caller's business.
    pub fn remove_player(&mut self, player_id: u32) -> Option<Player> {
        let idx = self
            .players
            .iter()
            .position(|p| p.entity.id == player_id)?;
        let player = self.players.swap_remove(idx);
        self.ids.release(EntityClass::Player, player.entity.id);
        for weapon in &player.weapons {
            self.ids.release(EntityClass::Weapon, weapon.entity.id);
        }
        info!(player_id, "player removed from game");
        Some(player)
    }

    pub fn player(&self, player_id: u32) -> Option<&Player> {
        self.players.iter().find(|p| p.entity.id == player_id)
    }

    /// Set a player's heading; returns false if the player is gone
    pub fn set_direction(&mut self, player_id: u32, direction: f64) -> bool {
        match self.players.iter_mut().find(|p| p.entity.id == player_id) {
            Some(player) => {
                player.movement.direction = direction;
                true
            }
            None => false,
        }
    }

    /// Spawn one monster at a uniformly random point inside the margin
    pub fn spawn_monster(&mut self) {
        let id = self.ids.generate(EntityClass::Monster);
        let x = self
            .rng
            .gen_range(ARENA_MIN_X + MONSTER_SPAWN_MARGIN..ARENA_MAX_X - MONSTER_SPAWN_MARGIN);
        let y = self
            .rng
            .gen_range(ARENA_MIN_Y + MONSTER_SPAWN_MARGIN..ARENA_MAX_Y - MONSTER_SPAWN_MARGIN);
        let direction = self.rng.gen_range(0.0..TAU);
        self.monsters.push(Monster::new(id, x, y, direction));
    }

    /// Spawn a healing potion at the given position
    pub fn spawn_potion(&mut self, x: f64, y: f64) {
        let id = self.ids.generate(EntityClass::Potion);
        self.potions.push(HealingPotion {
            entity: Entity::new(id, x, y, POTION_SIZE, POTION_SIZE),
            amount: POTION_HEAL,
        });
    }

    /// Spawn an experience orb near the given position, jittered on both axes
    pub fn spawn_experience(&mut self, x: f64, y: f64, amount: i32) {
        let id = self.ids.generate(EntityClass::Experience);
        let offset_x = self.rng.gen_range(-ORB_JITTER..ORB_JITTER);
        let offset_y = self.rng.gen_range(-ORB_JITTER..ORB_JITTER);
        self.experiences.push(ExperienceOrb {
            entity: Entity::new(id, x + offset_x, y + offset_y, ORB_SIZE, ORB_SIZE),
            amount,
        });
    }
}
