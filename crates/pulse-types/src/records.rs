//! Exported record types.
//!
//! Each record is a flat JSON object. The `Type` tag is written first and
//! is fixed per record type; the remaining fields follow in declaration
//! order. Records are built fresh every poll cycle and dropped after the
//! export, so they own their strings.

use serde::{Deserialize, Serialize};

use crate::enums::RegionStatus;

/// One online player resolvable to an overworld position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "Type", rename = "Player")]
pub struct PlayerRecord {
    /// Character display name.
    #[serde(rename = "LocationName")]
    pub location_name: String,
    /// Heritage label.
    #[serde(rename = "Race")]
    pub race: String,
    /// Character level as a decimal string.
    #[serde(rename = "Level")]
    pub level: String,
    /// East-west position, e.g. `"16.9E"`.
    pub x: String,
    /// North-south position, e.g. `"22.9S"`.
    pub y: String,
    /// Precise host location string. Omitted from JSON when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<String>,
}

/// One loaded region (landblock).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "Type", rename = "Landblock")]
pub struct RegionRecord {
    /// Short hex identifier, e.g. `"0xA9B4"`.
    pub id: String,
    /// Activity status.
    #[serde(rename = "Status")]
    pub status: RegionStatus,
    /// Grid X as two lowercase hex digits.
    pub x: String,
    /// Grid Y as two lowercase hex digits.
    pub y: String,
    /// The region itself is a dungeon.
    #[serde(rename = "isDungeon")]
    pub is_dungeon: bool,
    /// The region contains a dungeon entrance.
    #[serde(rename = "hasDungeon")]
    pub has_dungeon: bool,
    /// Players currently inside the region.
    #[serde(rename = "playerCount")]
    pub player_count: u32,
    /// Creatures currently inside the region.
    #[serde(rename = "creatureCount")]
    pub creature_count: u32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn sample_player() -> PlayerRecord {
        PlayerRecord {
            location_name: "Asheron".to_owned(),
            race: "Aluvian".to_owned(),
            level: "275".to_owned(),
            x: "16.9E".to_owned(),
            y: "22.9S".to_owned(),
            loc: Some("0xA9B40021 [84.0 7.1 94.0]".to_owned()),
        }
    }

    #[test]
    fn player_fields_serialize_in_contract_order() {
        let json = serde_json::to_string(&sample_player()).unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"Type":"Player","LocationName":"Asheron","Race":"Aluvian","#,
                r#""Level":"275","x":"16.9E","y":"22.9S","#,
                r#""loc":"0xA9B40021 [84.0 7.1 94.0]"}"#
            )
        );
    }

    #[test]
    fn absent_loc_is_omitted_not_null() {
        let mut player = sample_player();
        player.loc = None;
        let value = serde_json::to_value(&player).unwrap();
        assert!(value.get("loc").is_none());
        assert!(!value.to_string().contains("null"));
    }

    #[test]
    fn region_fields_serialize_in_contract_order() {
        let region = RegionRecord {
            id: "0xA9B4".to_owned(),
            status: RegionStatus::Dormant,
            x: "a9".to_owned(),
            y: "b4".to_owned(),
            is_dungeon: false,
            has_dungeon: true,
            player_count: 2,
            creature_count: 41,
        };
        let json = serde_json::to_string(&region).unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"Type":"Landblock","id":"0xA9B4","Status":"Dormant","x":"a9","y":"b4","#,
                r#""isDungeon":false,"hasDungeon":true,"playerCount":2,"creatureCount":41}"#
            )
        );
    }

    #[test]
    fn tagged_player_parses_back() {
        let json = serde_json::to_string(&sample_player()).unwrap();
        let parsed: PlayerRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, sample_player());
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["Type"], "Player");
    }
}
