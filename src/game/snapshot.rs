//! Building the per-tick world snapshot for broadcast

use crate::ws::protocol::{
    ExperienceSnapshot, MonsterSnapshot, PlayerSnapshot, PotionSnapshot, ServerMsg, WeaponSnapshot,
};

use super::world::World;

/// Assemble the broadcast message from the live world.
/// Called under the world lock; everything is copied out.
pub fn build(world: &World) -> ServerMsg {
    let players = world
        .players
        .iter()
        .map(|p| PlayerSnapshot {
            id: p.entity.id,
            x: p.entity.x,
            y: p.entity.y,
            width: p.entity.width,
            height: p.entity.height,
            health: p.health.health,
            max_health: p.health.max_health,
            level: p.experience.level,
            experience: p.experience.experience,
            direction: p.movement.direction,
            weapons: p
                .weapons
                .iter()
                .map(|w| WeaponSnapshot {
                    id: w.entity.id,
                    x: w.entity.x,
                    y: w.entity.y,
                    width: w.entity.width,
                    height: w.entity.height,
                    owner_id: w.owner_id,
                })
                .collect(),
        })
        .collect();

    let monsters = world
        .monsters
        .iter()
        .map(|m| MonsterSnapshot {
            id: m.entity.id,
            x: m.entity.x,
            y: m.entity.y,
            width: m.entity.width,
            height: m.entity.height,
            health: m.health.health,
            max_health: m.health.max_health,
        })
        .collect();

    let potions = world
        .potions
        .iter()
        .map(|p| PotionSnapshot {
            id: p.entity.id,
            x: p.entity.x,
            y: p.entity.y,
            width: p.entity.width,
            height: p.entity.height,
            amount: p.amount,
        })
        .collect();

    let experiences = world
        .experiences
        .iter()
        .map(|e| ExperienceSnapshot {
            id: e.entity.id,
            x: e.entity.x,
            y: e.entity.y,
            width: e.entity.width,
            height: e.entity.height,
            amount: e.amount,
        })
        .collect();

    ServerMsg::GameState {
        players,
        monsters,
        potions,
        experiences,
    }
}

/// Encode the snapshot for the wire
pub fn encode(world: &World) -> Result<String, serde_json::Error> {
    serde_json::to_string(&build(world))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::monster::MonsterSystem;

    #[test]
    fn snapshot_mirrors_the_world() {
        let mut world = World::new(4);
        let id = world.add_player(None);
        MonsterSystem::update(&mut world, 1.0 / 60.0);

        let text = encode(&world).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["type"], "gameState");
        assert_eq!(value["players"].as_array().unwrap().len(), 1);
        assert_eq!(value["players"][0]["ID"], id);
        assert_eq!(value["players"][0]["Weapons"].as_array().unwrap().len(), 2);
        assert_eq!(
            value["monsters"].as_array().unwrap().len(),
            world.monsters.len()
        );
        assert_eq!(value["potions"].as_array().unwrap().len(), 0);
        assert_eq!(value["experiences"].as_array().unwrap().len(), 0);
    }
}
