use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::board::{self, SquareId};
use crate::game::{GameId, GameSnapshot, OwnershipRecord, Player, PropertyRecord, TradeOffer};
use crate::players::{BasePlayer, BuyScoreWeights, ScoringPlayer, TurnPlan};
use crate::types::SquareKind;

/// Input read by `monopoly-score`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreRequest {
    pub property_id: SquareId,
    pub player: Player,
    #[serde(default)]
    pub game_id: Option<GameId>,
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default, alias = "game_properties")]
    pub ownerships: Vec<OwnershipRecord>,
    /// Falls back to the classic board when absent.
    #[serde(default)]
    pub properties: Vec<PropertyRecord>,
}

impl ScoreRequest {
    /// The scored `player` replaces any entry with the same id in `players`.
    pub fn into_snapshot(self) -> (SquareId, Player, GameSnapshot) {
        let mut players = self.players;
        match players.iter_mut().find(|p| p.user_id == self.player.user_id) {
            Some(entry) => *entry = self.player.clone(),
            None => players.push(self.player.clone()),
        }
        let mut snapshot =
            GameSnapshot::new(players, self.ownerships, self.properties).with_standard_board();
        snapshot.game_id = self.game_id;
        (self.property_id, self.player, snapshot)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreReport {
    pub property_id: SquareId,
    pub name: Option<String>,
    pub square: Option<SquareKind>,
    pub score: i64,
    pub buy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<TurnPlan>,
}

/// Scores the requested square and, when `plan_seed` is given, plans the
/// player's next turn with a seeded RNG.
pub fn evaluate(request: ScoreRequest, threshold: Option<i64>, plan_seed: Option<u64>) -> ScoreReport {
    let (property_id, player, snapshot) = request.into_snapshot();
    let mut ai = ScoringPlayer::new(player.user_id, Some(BuyScoreWeights::default()));
    if let Some(threshold) = threshold {
        ai.buy_threshold = threshold;
    }

    let property = snapshot.property(property_id);
    let decision = property.map(|p| ai.decide_purchase(&snapshot, p));
    let plan = plan_seed.map(|seed| {
        let mut rng = StdRng::seed_from_u64(seed);
        ai.plan_turn(&snapshot, &mut rng)
    });

    ScoreReport {
        property_id,
        name: property.map(PropertyRecord::display_name),
        square: board::square_kind(property_id),
        score: decision.map_or(0, |d| d.score()),
        buy: decision.is_some_and(|d| d.is_buy()),
        plan,
    }
}

pub fn print_offer(offer: &TradeOffer) {
    println!("{:<8} {:<10} {:<10} {}", "TRADE", "FROM", "CASH", "PROPERTIES");
    println!("{}", "-".repeat(60));
    println!(
        "{:<8} {:<10} {:<10} give {:?} / want {:?}",
        offer.id, offer.player_id, offer.offer_amount, offer.offer_properties, offer.requested_properties
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(balance: i64) -> ScoreRequest {
        serde_json::from_value(json!({
            "property_id": 39,
            "player": {"user_id": 4, "address": "0xme", "username": "AI_4", "balance": balance},
            "ownerships": [{"property_id": 37, "address": "0xME"}]
        }))
        .unwrap()
    }

    #[test]
    fn report_uses_standard_board_when_properties_missing() {
        let report = evaluate(request(5_000), None, None);

        assert_eq!(report.name.as_deref(), Some("Boardwalk"));
        assert_eq!(report.square, Some(SquareKind::Land));
        assert_eq!(report.score, 98);
        assert!(report.buy);
        assert!(report.plan.is_none());
    }

    #[test]
    fn threshold_override_can_turn_a_buy_into_a_pass() {
        let report = evaluate(request(5_000), Some(99), None);
        assert_eq!(report.score, 98);
        assert!(!report.buy);
    }

    #[test]
    fn scored_player_overrides_stale_list_entry() {
        let mut request = request(5_000);
        request.players = vec![
            Player::new(4, "AI_4", "0xstale"),
            Player::new(5, "bob", "0xb0b").with_balance(900),
        ];

        let (_, _, snapshot) = request.clone().into_snapshot();
        assert_eq!(snapshot.players.len(), 2);
        assert_eq!(snapshot.player(4).map(|p| p.balance), Some(5_000));
        assert_eq!(snapshot.player(4).map(|p| p.address.as_str()), Some("0xme"));

        let report = evaluate(request, None, None);
        assert_eq!(report.score, 98);
        assert!(report.buy);
    }

    #[test]
    fn unknown_square_scores_zero() {
        let mut request = request(5_000);
        request.property_id = 30;
        let report = evaluate(request, None, Some(1));

        assert_eq!(report.score, 0);
        assert!(!report.buy);
        assert_eq!(report.square, Some(SquareKind::GoToJail));
        assert!(report.plan.is_some());
    }
}
