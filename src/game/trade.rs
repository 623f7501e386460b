use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::board::SquareId;
use crate::game::GameId;
use crate::game::players::PlayerId;
use crate::types::TradeStatus;

pub type TradeId = u64;

/// A trade as the trade service reports it. Everything except `id` and
/// `player_id` is decoded leniently: a field of the wrong shape falls back to
/// its default instead of failing the whole offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOffer {
    pub id: TradeId,
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: TradeStatus,
    /// Player who made the offer.
    pub player_id: PlayerId,
    #[serde(default, deserialize_with = "lenient_id")]
    pub target_player_id: Option<PlayerId>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub game_id: Option<GameId>,
    #[serde(default, deserialize_with = "lenient_squares")]
    pub offer_properties: Vec<SquareId>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub offer_amount: i64,
    #[serde(default, deserialize_with = "lenient_squares")]
    pub requested_properties: Vec<SquareId>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub requested_amount: i64,
    /// Anything else the trade service attaches, passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TradeOffer {
    pub fn new(id: TradeId, player_id: PlayerId, status: TradeStatus) -> Self {
        Self {
            id,
            status,
            player_id,
            target_player_id: None,
            game_id: None,
            offer_properties: Vec::new(),
            offer_amount: 0,
            requested_properties: Vec::new(),
            requested_amount: 0,
            extra: serde_json::Map::new(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == TradeStatus::Pending
    }
}

/// Body of `POST /game-trade-requests`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeProposal {
    pub game_id: GameId,
    pub player_id: PlayerId,
    pub target_player_id: PlayerId,
    pub offer_properties: Vec<SquareId>,
    pub offer_amount: i64,
    pub requested_properties: Vec<SquareId>,
    pub requested_amount: i64,
    pub status: TradeStatus,
}

fn lenient_status<'de, D>(deserializer: D) -> Result<TradeStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(id_from_value(&Value::deserialize(deserializer)?))
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(amount_from_value(&Value::deserialize(deserializer)?))
}

fn lenient_squares<'de, D>(deserializer: D) -> Result<Vec<SquareId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(squares_from_value(&Value::deserialize(deserializer)?))
}

fn id_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Whole units; fractions are truncated and non-numbers count as zero.
fn amount_from_value(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .unwrap_or_default(),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f as i64)
            .unwrap_or_default(),
        _ => 0,
    }
}

/// Accepts an array of square ids or a string holding one (`"[1,3]"`).
/// Entries that are not square ids are dropped.
fn squares_from_value(value: &Value) -> Vec<SquareId> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
            .filter_map(|id| SquareId::try_from(id).ok())
            .collect(),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(inner @ Value::Array(_)) => squares_from_value(&inner),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_service_payload_and_keeps_unknown_fields() {
        let raw = json!({
            "id": 42,
            "status": "pending",
            "player_id": 7,
            "target_player_id": 3,
            "offer_properties": [6, 8],
            "offer_amount": 140,
            "requested_properties": null,
            "requested_amount": 0,
            "created_at": "2025-01-02T10:00:00Z"
        });

        let offer: TradeOffer = serde_json::from_value(raw).unwrap();

        assert_eq!(offer.id, 42);
        assert!(offer.is_pending());
        assert_eq!(offer.offer_properties, vec![6, 8]);
        assert!(offer.requested_properties.is_empty());
        assert_eq!(offer.extra.get("created_at"), Some(&json!("2025-01-02T10:00:00Z")));
    }

    #[test]
    fn unknown_status_is_not_pending() {
        let offer: TradeOffer =
            serde_json::from_value(json!({"id": 1, "player_id": 2, "status": "countered"}))
                .unwrap();
        assert_eq!(offer.status, TradeStatus::Other);
        assert!(!offer.is_pending());
    }

    #[test]
    fn fractional_amounts_are_truncated() {
        let offer: TradeOffer = serde_json::from_value(json!({
            "id": 42,
            "status": "pending",
            "player_id": 2,
            "offer_amount": 150.5,
            "requested_amount": "75"
        }))
        .unwrap();
        assert_eq!(offer.offer_amount, 150);
        assert_eq!(offer.requested_amount, 75);
        assert!(offer.is_pending());
    }

    #[test]
    fn mismatched_fields_fall_back_to_defaults() {
        let offer: TradeOffer = serde_json::from_value(json!({
            "id": 43,
            "status": 5,
            "player_id": 2,
            "target_player_id": "1",
            "game_id": {"id": 9},
            "offer_properties": "[1,3]",
            "offer_amount": "lots",
            "requested_properties": [6, "8", null, -1],
            "requested_amount": [100]
        }))
        .unwrap();
        assert_eq!(offer.status, TradeStatus::Other);
        assert_eq!(offer.target_player_id, Some(1));
        assert_eq!(offer.game_id, None);
        assert_eq!(offer.offer_properties, vec![1, 3]);
        assert_eq!(offer.offer_amount, 0);
        assert_eq!(offer.requested_properties, vec![6, 8]);
        assert_eq!(offer.requested_amount, 0);
    }

    #[test]
    fn unparseable_property_string_is_empty() {
        let offer: TradeOffer = serde_json::from_value(
            json!({"id": 1, "player_id": 2, "offer_properties": "Park Place"}),
        )
        .unwrap();
        assert!(offer.offer_properties.is_empty());
    }
}
