//! Geometry and entity primitives shared by every game object

use std::collections::HashMap;

/// Arena boundary constants
pub const ARENA_MIN_X: f64 = 0.0;
pub const ARENA_MIN_Y: f64 = 0.0;
pub const ARENA_MAX_X: f64 = 1200.0;
pub const ARENA_MAX_Y: f64 = 800.0;

/// Cooldown between hits from the same source, in seconds of simulation time
pub const HIT_COOLDOWN_SECS: f64 = 1.0;

/// Base struct for all game objects with position and size. Positions are
/// rectangle centers in world units.
#[derive(Debug, Clone, Copy)]
pub struct Entity {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Entity {
    pub fn new(id: u32, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id,
            x,
            y,
            width,
            height,
        }
    }

    /// Axis-aligned rectangle overlap, ignoring rotation
    pub fn overlaps(&self, other: &Entity) -> bool {
        (self.x - other.x).abs() < (self.width + other.width) / 2.0
            && (self.y - other.y).abs() < (self.height + other.height) / 2.0
    }
}

/// Health state for entities that can take damage.
///
/// `last_hit` maps a source id (weapon or monster) to the simulation-clock
/// time of the last hit that landed, which enforces the per-source cooldown.
#[derive(Debug, Clone)]
pub struct HealthComponent {
    pub health: i32,
    pub max_health: i32,
    last_hit: HashMap<u32, f64>,
}

impl HealthComponent {
    pub fn new(max_health: i32) -> Self {
        Self {
            health: max_health,
            max_health,
            last_hit: HashMap::new(),
        }
    }

    /// Reduce health by the given amount, clamped at zero
    pub fn take_damage(&mut self, damage: i32) {
        self.health = (self.health - damage).max(0);
    }

    /// Raise health toward the maximum; returns the amount actually applied
    pub fn heal(&mut self, amount: i32) -> i32 {
        let applied = amount.min(self.max_health - self.health);
        self.health += applied;
        applied
    }

    pub fn is_dead(&self) -> bool {
        self.health == 0
    }

    /// Returns true and records `now` iff this source is off cooldown
    pub fn check_hit_cooldown(&mut self, source_id: u32, now: f64) -> bool {
        match self.last_hit.get(&source_id) {
            Some(&last) if now - last < HIT_COOLDOWN_SECS => false,
            _ => {
                self.last_hit.insert(source_id, now);
                true
            }
        }
    }
}

/// Movement state for entities that move
#[derive(Debug, Clone, Copy)]
pub struct MovementComponent {
    /// World units per second
    pub speed: f64,
    /// Heading in radians
    pub direction: f64,
}

/// Attack state for entities that deal damage
#[derive(Debug, Clone, Copy)]
pub struct AttackComponent {
    pub damage: i32,
}

/// Experience progression state
#[derive(Debug, Clone, Copy)]
pub struct ExperienceComponent {
    pub experience: i32,
    pub level: i32,
}
