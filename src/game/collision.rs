//! Collision resolution, run once per tick in a fixed order:
//! weapon→player, weapon→monster, monster→player, player→potion,
//! player→orb. The nested loop order below is the definition of who hits
//! first when several pairs qualify in the same tick.

use crate::ws::protocol::{HitStatus, ServerMsg};

use super::send_to;
use super::world::{EntityClass, World};

pub struct CollisionSystem;

impl CollisionSystem {
    pub fn update(world: &mut World) {
        Self::weapon_collisions(world);
        Self::monster_player_collisions(world);
        Self::player_potion_collisions(world);
        Self::player_experience_collisions(world);
    }

    /// Weapon-to-player and weapon-to-monster resolution
    fn weapon_collisions(world: &mut World) {
        let now = world.clock;

        for attacker_idx in 0..world.players.len() {
            for weapon_idx in 0..world.players[attacker_idx].weapons.len() {
                let (weapon_box, weapon_id, owner_id, damage, attacker_conn) = {
                    let attacker = &world.players[attacker_idx];
                    let weapon = &attacker.weapons[weapon_idx];
                    (
                        weapon.entity,
                        weapon.entity.id,
                        attacker.entity.id,
                        attacker.attack.damage,
                        attacker.conn.clone(),
                    )
                };

                for victim_idx in 0..world.players.len() {
                    if victim_idx == attacker_idx {
                        continue; // a weapon cannot hit its owner
                    }
                    let victim = &mut world.players[victim_idx];
                    if !weapon_box.overlaps(&victim.entity) {
                        continue;
                    }
                    if !victim.health.check_hit_cooldown(weapon_id, now) {
                        continue;
                    }
                    victim.health.take_damage(damage);

                    let notification = ServerMsg::PlayerHit {
                        from: owner_id,
                        to: victim.entity.id,
                        damage,
                        remaining_health: victim.health.health,
                    };
                    if let Some(conn) = &attacker_conn {
                        send_to(conn, &notification);
                    }
                    if let Some(conn) = &victim.conn {
                        send_to(conn, &notification);
                    }
                }

                for monster in world.monsters.iter_mut() {
                    if monster.health.health <= 0 {
                        continue;
                    }
                    if !weapon_box.overlaps(&monster.entity) {
                        continue;
                    }
                    if !monster.health.check_hit_cooldown(weapon_id, now) {
                        continue;
                    }
                    monster.health.take_damage(damage);

                    if let Some(conn) = &attacker_conn {
                        let status = if monster.health.is_dead() {
                            HitStatus::Killed
                        } else {
                            HitStatus::Hit
                        };
                        send_to(
                            conn,
                            &ServerMsg::MonsterHit {
                                player_id: owner_id,
                                monster_id: monster.entity.id,
                                damage,
                                monster_health: monster.health.health,
                                status,
                            },
                        );
                    }
                }
            }
        }
    }

    /// Monster body contact damage, gated by the monster's id as the source
    fn monster_player_collisions(world: &mut World) {
        let now = world.clock;
        let World {
            players, monsters, ..
        } = world;

        for monster in monsters.iter() {
            if monster.health.health <= 0 {
                continue;
            }
            for player in players.iter_mut() {
                if !monster.entity.overlaps(&player.entity) {
                    continue;
                }
                if !player.health.check_hit_cooldown(monster.entity.id, now) {
                    continue;
                }
                player.health.take_damage(monster.attack.damage);

                if let Some(conn) = &player.conn {
                    send_to(
                        conn,
                        &ServerMsg::PlayerHit {
                            from: monster.entity.id,
                            to: player.entity.id,
                            damage: monster.attack.damage,
                            remaining_health: player.health.health,
                        },
                    );
                }
            }
        }
    }

    /// First player in collection order consumes each potion
    fn player_potion_collisions(world: &mut World) {
        let World {
            players,
            potions,
            ids,
            ..
        } = world;

        potions.retain(|potion| {
            for player in players.iter_mut() {
                if potion.entity.overlaps(&player.entity) {
                    potion.collect(player);
                    ids.release(EntityClass::Potion, potion.entity.id);
                    return false;
                }
            }
            true
        });
    }

    /// First player in collection order consumes each orb
    fn player_experience_collisions(world: &mut World) {
        let World {
            players,
            experiences,
            ids,
            ..
        } = world;

        experiences.retain(|orb| {
            for player in players.iter_mut() {
                if orb.entity.overlaps(&player.entity) {
                    orb.collect(player);
                    ids.release(EntityClass::Experience, orb.entity.id);
                    return false;
                }
            }
            true
        });
    }
}
