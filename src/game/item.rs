//! Collectible items and their on-collect effects

use crate::ws::protocol::ServerMsg;

use super::entity::Entity;
use super::player::Player;
use super::send_to;

pub const POTION_SIZE: f64 = 12.0;
pub const POTION_HEAL: i32 = 25;

pub const ORB_SIZE: f64 = 8.0;
/// Orbs scatter up to this far from the death position, per axis
pub const ORB_JITTER: f64 = 15.0;

/// Experience needed to clear a level is `level * 10`
const LEVEL_THRESHOLD_STEP: i32 = 10;
const LEVEL_UP_HEALTH_BONUS: i32 = 10;
const LEVEL_UP_DAMAGE_BONUS: i32 = 1;

/// A health recovery item dropped by monsters
pub struct HealingPotion {
    pub entity: Entity,
    pub amount: i32,
}

impl HealingPotion {
    /// Apply the heal and notify the collector
    pub fn collect(&self, player: &mut Player) {
        let healed = player.health.heal(self.amount);
        if let Some(conn) = &player.conn {
            send_to(
                conn,
                &ServerMsg::PotionCollected {
                    player_id: player.entity.id,
                    potion_id: self.entity.id,
                    amount: self.amount,
                    healed_amount: healed,
                    new_health: player.health.health,
                },
            );
        }
    }
}

/// Experience points scattered by deaths
pub struct ExperienceOrb {
    pub entity: Entity,
    pub amount: i32,
}

impl ExperienceOrb {
    /// Add the experience, resolve leveling, and notify the collector.
    /// Any levelUp goes out before the experienceCollected that caused it.
    pub fn collect(&self, player: &mut Player) {
        player.experience.experience += self.amount;

        while player.experience.experience >= player.experience.level * LEVEL_THRESHOLD_STEP {
            player.experience.level += 1;
            player.attack.damage += LEVEL_UP_DAMAGE_BONUS;
            player.health.max_health += LEVEL_UP_HEALTH_BONUS;
            player.health.health = player.health.max_health;
            player.experience.experience = 0;

            if let Some(conn) = &player.conn {
                send_to(
                    conn,
                    &ServerMsg::LevelUp {
                        player_id: player.entity.id,
                        level: player.experience.level,
                    },
                );
            }
        }

        if let Some(conn) = &player.conn {
            send_to(
                conn,
                &ServerMsg::ExperienceCollected {
                    player_id: player.entity.id,
                    experience_id: self.entity.id,
                    amount: self.amount,
                    total_experience: player.experience.experience,
                },
            );
        }
    }
}
