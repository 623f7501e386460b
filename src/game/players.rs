use serde::{Deserialize, Serialize};

use crate::board::SquareId;
use crate::game::property::OwnershipRecord;

pub type PlayerId = u64;

const AI_USERNAME_MARKERS: [&str; 3] = ["ai_", "bot", "computer"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub user_id: PlayerId,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub balance: i64,
    #[serde(default)]
    pub position: Option<SquareId>,
    #[serde(default)]
    pub turn_order: Option<u32>,
}

impl Player {
    pub fn new(user_id: PlayerId, username: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            user_id,
            address: address.into(),
            username: username.into(),
            balance: 0,
            position: None,
            turn_order: None,
        }
    }

    pub fn with_balance(mut self, balance: i64) -> Self {
        self.balance = balance;
        self
    }

    /// Automated players are recognised by their username alone.
    pub fn is_ai(&self) -> bool {
        let username = self.username.to_lowercase();
        AI_USERNAME_MARKERS
            .iter()
            .any(|marker| username.contains(marker))
    }

    pub fn owns(&self, record: &OwnershipRecord) -> bool {
        record.is_owned_by(&self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ai_flag_comes_from_username() {
        assert!(Player::new(1, "AI_2", "0xa").is_ai());
        assert!(Player::new(2, "HelperBot", "0xb").is_ai());
        assert!(Player::new(3, "computer-7", "0xc").is_ai());
        assert!(!Player::new(4, "alice", "0xd").is_ai());
        // "ai" alone is not a marker
        assert!(!Player::new(5, "kai", "0xe").is_ai());
    }
}
