//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMsg {
    /// Attach a new player to this connection if none is attached yet
    Join,

    /// Steer this connection's player
    Direction {
        /// Heading in radians
        direction: f64,
    },
}

/// Outcome of a weapon hit on a monster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HitStatus {
    Hit,
    Killed,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMsg {
    /// Join acknowledgment, unicast to the joining connection
    Joined {
        #[serde(rename = "playerID")]
        player_id: u32,
    },

    /// Full world snapshot, broadcast every tick
    GameState {
        players: Vec<PlayerSnapshot>,
        monsters: Vec<MonsterSnapshot>,
        potions: Vec<PotionSnapshot>,
        experiences: Vec<ExperienceSnapshot>,
    },

    /// A player took a hit, sent to both attacker and victim
    PlayerHit {
        from: u32,
        to: u32,
        damage: i32,
        remaining_health: i32,
    },

    /// A weapon connected with a monster, sent to the attacker
    MonsterHit {
        #[serde(rename = "playerID")]
        player_id: u32,
        #[serde(rename = "monsterID")]
        monster_id: u32,
        damage: i32,
        monster_health: i32,
        status: HitStatus,
    },

    /// Sent to the dying player
    PlayerDeath {
        #[serde(rename = "playerID")]
        player_id: u32,
    },

    /// Sent to the player who picked up a potion
    PotionCollected {
        #[serde(rename = "playerID")]
        player_id: u32,
        #[serde(rename = "potionID")]
        potion_id: u32,
        amount: i32,
        healed_amount: i32,
        new_health: i32,
    },

    /// Sent to the player who picked up an experience orb
    ExperienceCollected {
        #[serde(rename = "playerID")]
        player_id: u32,
        #[serde(rename = "experienceID")]
        experience_id: u32,
        amount: i32,
        total_experience: i32,
    },

    /// Sent to a leveling player, always before its experienceCollected
    LevelUp {
        #[serde(rename = "playerID")]
        player_id: u32,
        level: i32,
    },
}

/// Player state in a snapshot; weapons ride along under their owner
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlayerSnapshot {
    #[serde(rename = "ID")]
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub health: i32,
    pub max_health: i32,
    pub level: i32,
    pub experience: i32,
    pub direction: f64,
    pub weapons: Vec<WeaponSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WeaponSnapshot {
    #[serde(rename = "ID")]
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(rename = "OwnerID")]
    pub owner_id: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MonsterSnapshot {
    #[serde(rename = "ID")]
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub health: i32,
    pub max_health: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PotionSnapshot {
    #[serde(rename = "ID")]
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub amount: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExperienceSnapshot {
    #[serde(rename = "ID")]
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub amount: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn client_join_round_trips() {
        let msg: ClientMsg = serde_json::from_str(r#"{"type":"join"}"#).unwrap();
        assert!(matches!(msg, ClientMsg::Join));
    }

    #[test]
    fn client_direction_round_trips() {
        let msg: ClientMsg =
            serde_json::from_str(r#"{"type":"direction","direction":1.5}"#).unwrap();
        match msg {
            ClientMsg::Direction { direction } => assert_eq!(direction, 1.5),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn unknown_client_type_is_an_error() {
        assert!(serde_json::from_str::<ClientMsg>(r#"{"type":"teleport"}"#).is_err());
    }

    #[test]
    fn joined_wire_format() {
        let value = serde_json::to_value(ServerMsg::Joined { player_id: 7 }).unwrap();
        assert_eq!(value, json!({"type": "joined", "playerID": 7}));
    }

    #[test]
    fn player_hit_wire_format() {
        let value = serde_json::to_value(ServerMsg::PlayerHit {
            from: 1,
            to: 2,
            damage: 10,
            remaining_health: 90,
        })
        .unwrap();
        assert_eq!(
            value,
            json!({"type": "playerHit", "from": 1, "to": 2, "damage": 10, "remainingHealth": 90})
        );
    }

    #[test]
    fn monster_hit_wire_format() {
        let value = serde_json::to_value(ServerMsg::MonsterHit {
            player_id: 1,
            monster_id: 9,
            damage: 10,
            monster_health: 0,
            status: HitStatus::Killed,
        })
        .unwrap();
        assert_eq!(
            value,
            json!({
                "type": "monsterHit",
                "playerID": 1,
                "monsterID": 9,
                "damage": 10,
                "monsterHealth": 0,
                "status": "killed"
            })
        );
    }

    #[test]
    fn collection_notifications_wire_format() {
        let potion = serde_json::to_value(ServerMsg::PotionCollected {
            player_id: 3,
            potion_id: 11,
            amount: 25,
            healed_amount: 20,
            new_health: 100,
        })
        .unwrap();
        assert_eq!(
            potion,
            json!({
                "type": "potionCollected",
                "playerID": 3,
                "potionID": 11,
                "amount": 25,
                "healedAmount": 20,
                "newHealth": 100
            })
        );

        let exp = serde_json::to_value(ServerMsg::ExperienceCollected {
            player_id: 3,
            experience_id: 12,
            amount: 5,
            total_experience: 0,
        })
        .unwrap();
        assert_eq!(
            exp,
            json!({
                "type": "experienceCollected",
                "playerID": 3,
                "experienceID": 12,
                "amount": 5,
                "totalExperience": 0
            })
        );

        let level = serde_json::to_value(ServerMsg::LevelUp {
            player_id: 3,
            level: 2,
        })
        .unwrap();
        assert_eq!(level, json!({"type": "levelUp", "playerID": 3, "level": 2}));
    }

    #[test]
    fn game_state_uses_pascal_case_entity_fields() {
        let msg = ServerMsg::GameState {
            players: vec![PlayerSnapshot {
                id: 1,
                x: 100.0,
                y: 100.0,
                width: 10.0,
                height: 20.0,
                health: 100,
                max_health: 100,
                level: 1,
                experience: 0,
                direction: 0.0,
                weapons: vec![WeaponSnapshot {
                    id: 2,
                    x: 130.0,
                    y: 100.0,
                    width: 10.0,
                    height: 20.0,
                    owner_id: 1,
                }],
            }],
            monsters: vec![],
            potions: vec![],
            experiences: vec![],
        };

        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "gameState");
        let player: &Value = &value["players"][0];
        for key in ["ID", "X", "Y", "Width", "Height", "Health", "MaxHealth", "Level", "Experience"] {
            assert!(player.get(key).is_some(), "missing key {key}");
        }
        assert_eq!(player["Weapons"][0]["OwnerID"], 1);
    }
}
