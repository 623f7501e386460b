use crate::board::{self, SquareId};
use crate::game::players::{Player, PlayerId};
use crate::game::property::{OwnershipRecord, PropertyRecord, ownership_of};
use crate::game::state::GameSnapshot;
use crate::game::trade::TradeOffer;
use crate::players::BasePlayer;
use crate::players::auto::{TurnPlan, plan_turn};
use crate::players::trade::trade_favorability;
use crate::types::{PropertyKind, TradeResponse};

/// Additive weights for land purchases. Cash and ROI ratios are kept in
/// tenths and hundredths so band edges compare exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct BuyScoreWeights {
    pub baseline: i64,
    pub risky_cash_tenths: i64,
    pub risky_penalty: i64,
    pub rich_cash_tenths: i64,
    pub rich_bonus: i64,
    pub comfortable_cash_tenths: i64,
    pub comfortable_bonus: i64,
    pub completes_group: i64,
    pub partial_group: i64,
    pub rank_pivot: i64,
    pub strong_roi_percent: i64,
    pub strong_roi_bonus: i64,
    pub fair_roi_percent: i64,
    pub fair_roi_bonus: i64,
    pub block_max_group_size: usize,
    pub block_bonus: i64,
    pub min_score: i64,
    pub max_score: i64,
}

impl Default for BuyScoreWeights {
    fn default() -> Self {
        Self {
            baseline: 50,
            risky_cash_tenths: 13,
            risky_penalty: -70,
            rich_cash_tenths: 30,
            rich_bonus: 20,
            comfortable_cash_tenths: 20,
            comfortable_bonus: 10,
            completes_group: 90,
            partial_group: 35,
            rank_pivot: 30,
            strong_roi_percent: 12,
            strong_roi_bonus: 25,
            fair_roi_percent: 8,
            fair_roi_bonus: 12,
            block_max_group_size: 3,
            block_bonus: 30,
            min_score: 5,
            max_score: 98,
        }
    }
}

/// Desirability of buying `property` for `player`, in `5..=98`, or 0 when the
/// square is not a priced land property.
///
/// Railroads and utilities are never scored here. `all_properties` is part of
/// the purchase-flow signature; land scoring reads only the static board tables.
pub fn calculate_buy_score(
    property: &PropertyRecord,
    player: &Player,
    ownerships: &[OwnershipRecord],
    all_properties: &[PropertyRecord],
) -> i64 {
    score_with_weights(
        &BuyScoreWeights::default(),
        property,
        player,
        ownerships,
        all_properties,
    )
}

pub fn score_with_weights(
    weights: &BuyScoreWeights,
    property: &PropertyRecord,
    player: &Player,
    ownerships: &[OwnershipRecord],
    _all_properties: &[PropertyRecord],
) -> i64 {
    let Some(price) = property.listed_price() else {
        return 0;
    };
    if property.kind != PropertyKind::Property {
        return 0;
    }

    // Ratios are compared in i128 so extreme balances and weights cannot overflow.
    let price = i128::from(price);
    let cash = i128::from(player.balance) * 10;
    let mut score = weights.baseline;

    if cash < price * i128::from(weights.risky_cash_tenths) {
        score += weights.risky_penalty;
    } else if cash > price * i128::from(weights.rich_cash_tenths) {
        score += weights.rich_bonus;
    } else if cash > price * i128::from(weights.comfortable_cash_tenths) {
        score += weights.comfortable_bonus;
    }

    let group = board::group_of(property.id).map(board::group_members);

    if let Some(members) = group {
        let owned = owned_in_group(members, &player.address, ownerships);
        if owned + 1 == members.len() {
            score += weights.completes_group;
        } else if owned >= 1 {
            score += weights.partial_group;
        }
    }

    score += weights.rank_pivot - i64::from(board::landing_rank(property.id));

    let rent = i128::from(property.rent_site_only) * 100;
    if rent > price * i128::from(weights.strong_roi_percent) {
        score += weights.strong_roi_bonus;
    } else if rent > price * i128::from(weights.fair_roi_percent) {
        score += weights.fair_roi_bonus;
    }

    if let Some(members) = group {
        let opponent_holds = members.iter().any(|id| {
            ownership_of(ownerships, *id).is_some_and(|o| o.is_held_by_other(&player.address))
        });
        if opponent_holds && members.len() <= weights.block_max_group_size {
            score += weights.block_bonus;
        }
    }

    score.clamp(weights.min_score, weights.max_score)
}

fn owned_in_group(members: &[SquareId], address: &str, ownerships: &[OwnershipRecord]) -> usize {
    members
        .iter()
        .filter(|id| ownership_of(ownerships, **id).is_some_and(|o| o.is_owned_by(address)))
        .count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseDecision {
    Buy { score: i64 },
    Pass { score: i64 },
}

impl PurchaseDecision {
    pub fn score(&self) -> i64 {
        match self {
            PurchaseDecision::Buy { score } | PurchaseDecision::Pass { score } => *score,
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, PurchaseDecision::Buy { .. })
    }
}

/// AI that buys land scoring at least `buy_threshold` while keeping a cash cushion,
/// and accepts trades whose favorability reaches `accept_threshold`.
#[derive(Debug, Clone)]
pub struct ScoringPlayer {
    pub user_id: PlayerId,
    pub weights: BuyScoreWeights,
    pub buy_threshold: i64,
    pub min_cash_tenths: i64,
    pub accept_threshold: i64,
}

impl ScoringPlayer {
    pub fn new(user_id: PlayerId, weights: Option<BuyScoreWeights>) -> Self {
        Self {
            user_id,
            weights: weights.unwrap_or_default(),
            buy_threshold: 72,
            min_cash_tenths: 18,
            accept_threshold: 50,
        }
    }
}

impl BasePlayer for ScoringPlayer {
    fn user_id(&self) -> PlayerId {
        self.user_id
    }

    fn decide_purchase(&self, game: &GameSnapshot, property: &PropertyRecord) -> PurchaseDecision {
        let Some(player) = game.player(self.user_id) else {
            return PurchaseDecision::Pass { score: 0 };
        };

        let score = score_with_weights(
            &self.weights,
            property,
            player,
            &game.ownerships,
            &game.properties,
        );
        let price = i128::from(property.listed_price().unwrap_or(0));
        let cushioned =
            i128::from(player.balance) * 10 > price * i128::from(self.min_cash_tenths);

        if score >= self.buy_threshold && cushioned {
            tracing::debug!(
                player = self.user_id,
                property = property.id,
                score,
                "buying property"
            );
            PurchaseDecision::Buy { score }
        } else {
            PurchaseDecision::Pass { score }
        }
    }

    fn plan_turn(&self, game: &GameSnapshot, rng: &mut dyn rand::RngCore) -> TurnPlan {
        match game.player(self.user_id) {
            Some(player) => plan_turn(game, player, rng),
            None => TurnPlan::default(),
        }
    }

    fn respond_to_trade(&self, game: &GameSnapshot, offer: &TradeOffer) -> TradeResponse {
        let Some(player) = game.player(self.user_id) else {
            return TradeResponse::Decline;
        };
        if offer.requested_amount > player.balance {
            return TradeResponse::Decline;
        }

        let favorability =
            trade_favorability(offer, player, &game.ownerships, &game.properties);
        let response = if favorability >= self.accept_threshold {
            TradeResponse::Accept
        } else {
            TradeResponse::Decline
        };
        tracing::debug!(
            player = self.user_id,
            trade = offer.id,
            favorability,
            %response,
            "answering trade"
        );
        response
    }
}
