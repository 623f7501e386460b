use serde::{Deserialize, Serialize};

use crate::board::{STANDARD_PROPERTIES, SquareId};
use crate::game::players::{Player, PlayerId};
use crate::game::property::{OwnershipRecord, PropertyRecord, find_property, ownership_of};

pub type GameId = u64;

/// Everything an AI needs to see at decision time, as served by the game API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameSnapshot {
    #[serde(default)]
    pub game_id: Option<GameId>,
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default, alias = "game_properties")]
    pub ownerships: Vec<OwnershipRecord>,
    #[serde(default)]
    pub properties: Vec<PropertyRecord>,
}

impl GameSnapshot {
    pub fn new(
        players: Vec<Player>,
        ownerships: Vec<OwnershipRecord>,
        properties: Vec<PropertyRecord>,
    ) -> Self {
        Self {
            game_id: None,
            players,
            ownerships,
            properties,
        }
    }

    /// Falls back to the classic board when the snapshot carries no reference data.
    pub fn with_standard_board(mut self) -> Self {
        if self.properties.is_empty() {
            self.properties = STANDARD_PROPERTIES.clone();
        }
        self
    }

    pub fn player(&self, user_id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.user_id == user_id)
    }

    pub fn property(&self, id: SquareId) -> Option<&PropertyRecord> {
        find_property(&self.properties, id)
    }

    pub fn ownership(&self, id: SquareId) -> Option<&OwnershipRecord> {
        ownership_of(&self.ownerships, id)
    }

    pub fn holdings<'a>(&'a self, player: &'a Player) -> impl Iterator<Item = &'a OwnershipRecord> + 'a {
        self.ownerships.iter().filter(move |o| player.owns(o))
    }

    pub fn owned_ids(&self, player: &Player) -> Vec<SquareId> {
        self.holdings(player).map(|o| o.property_id).collect()
    }
}
