use std::cmp::Reverse;
use std::collections::HashSet;
use std::iter;

use itertools::Itertools;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::{self, SquareId};
use crate::game::players::Player;
use crate::game::property::{MAX_DEVELOPMENT, OwnershipRecord};
use crate::game::state::GameSnapshot;
use crate::game::trade::TradeProposal;
use crate::types::{ColorGroup, PropertyAction, TradeStatus};

const UNMORTGAGE_TRIGGER: i64 = 1200;
const BUILD_TRIGGER: i64 = 700;
const BUILD_FLOOR: i64 = 600;
const TRADE_FLOOR: i64 = 300;
const TRADE_PROBABILITY: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedAction {
    pub action: PropertyAction,
    pub property_id: SquareId,
}

impl PlannedAction {
    pub fn new(action: PropertyAction, property_id: SquareId) -> Self {
        Self {
            action,
            property_id,
        }
    }
}

/// Property actions an AI performs before rolling, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnPlan {
    pub steps: Vec<PlannedAction>,
    pub trade: Option<TradeProposal>,
}

impl TurnPlan {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty() && self.trade.is_none()
    }
}

pub fn plan_turn<R: Rng + ?Sized>(game: &GameSnapshot, ai: &Player, rng: &mut R) -> TurnPlan {
    let mut plan = TurnPlan::default();

    if ai.balance < 0 {
        plan.steps = liquidation_steps(game, ai);
        tracing::debug!(player = ai.user_id, steps = plan.steps.len(), "liquidating");
        return plan;
    }

    let mut balance = ai.balance;
    if balance > UNMORTGAGE_TRIGGER {
        if let Some((step, cost)) = unmortgage_step(game, ai, balance) {
            plan.steps.push(step);
            balance -= cost;
        }
    }

    let complete = complete_groups(game, ai);
    if !complete.is_empty() && balance > BUILD_TRIGGER {
        plan.steps.extend(build_steps(game, ai, &complete, balance));
        return plan;
    }

    if balance >= TRADE_FLOOR && rng.gen_bool(TRADE_PROBABILITY) {
        plan.trade = monopoly_trade(game, ai);
    }
    plan
}

/// Sell every house, richest hotel rent first, then mortgage by descending price.
fn liquidation_steps(game: &GameSnapshot, ai: &Player) -> Vec<PlannedAction> {
    let holdings: Vec<&OwnershipRecord> = game.holdings(ai).collect();
    let mut steps = Vec::new();
    let mut cleared = HashSet::new();

    let developed = holdings
        .iter()
        .filter(|o| o.development > 0)
        .sorted_by_key(|o| Reverse(game.property(o.property_id).map_or(0, |p| p.rent_hotel)));
    for record in developed {
        let sellable = game
            .property(record.property_id)
            .is_some_and(|p| p.cost_of_house > 0);
        if !sellable {
            continue;
        }
        steps.extend(
            iter::repeat(PlannedAction::new(PropertyAction::Downgrade, record.property_id))
                .take(usize::from(record.development)),
        );
        cleared.insert(record.property_id);
    }

    let mortgageable = holdings
        .iter()
        .filter(|o| !o.mortgaged && (o.development == 0 || cleared.contains(&o.property_id)))
        .filter_map(|o| {
            let price = game.property(o.property_id)?.listed_price()?;
            Some((o.property_id, price))
        })
        .sorted_by_key(|(_, price)| Reverse(*price));
    steps.extend(
        mortgageable.map(|(id, _)| PlannedAction::new(PropertyAction::Mortgage, id)),
    );

    steps
}

/// Redeem the mortgaged property with the best base rent; returns the step and its cost.
fn unmortgage_step(
    game: &GameSnapshot,
    ai: &Player,
    balance: i64,
) -> Option<(PlannedAction, i64)> {
    let target = game
        .holdings(ai)
        .filter(|o| o.mortgaged)
        .filter_map(|o| game.property(o.property_id))
        .filter(|p| p.rent_site_only > 0 && p.listed_price().is_some())
        .sorted_by_key(|p| Reverse(p.rent_site_only))
        .next()?;

    // half the price plus ten percent interest, rounded down
    let cost = i64::from(target.listed_price()?) * 11 / 20;
    if balance < cost {
        return None;
    }
    Some((PlannedAction::new(PropertyAction::Unmortgage, target.id), cost))
}

/// Groups the AI owns outright with no member mortgaged, in build priority order.
fn complete_groups(game: &GameSnapshot, ai: &Player) -> Vec<ColorGroup> {
    ColorGroup::BUILD_PRIORITY
        .into_iter()
        .filter(|group| {
            board::group_members(*group).iter().all(|id| {
                game.ownership(*id)
                    .is_some_and(|o| ai.owns(o) && !o.mortgaged)
            })
        })
        .collect()
}

/// One house on each least developed member of the first group that can be
/// built on evenly and afforded for every member.
fn build_steps(
    game: &GameSnapshot,
    ai: &Player,
    complete: &[ColorGroup],
    balance: i64,
) -> Vec<PlannedAction> {
    if balance < BUILD_FLOOR {
        return Vec::new();
    }

    for group in complete {
        let members = board::group_members(*group);
        let levels: Vec<(SquareId, u8)> = members
            .iter()
            .filter_map(|id| game.ownership(*id).map(|o| (*id, o.development)))
            .collect();
        let (Some(lowest), Some(highest)) = (
            levels.iter().map(|(_, dev)| *dev).min(),
            levels.iter().map(|(_, dev)| *dev).max(),
        ) else {
            continue;
        };
        if lowest >= MAX_DEVELOPMENT || highest > lowest + 1 {
            continue;
        }

        let house_cost = members
            .first()
            .and_then(|id| game.property(*id))
            .map_or(0, |p| i64::from(p.cost_of_house));
        if house_cost == 0 || balance / house_cost < members.len() as i64 {
            continue;
        }

        return levels
            .into_iter()
            .filter(|(_, dev)| *dev == lowest)
            .map(|(id, _)| PlannedAction::new(PropertyAction::Development, id))
            .collect();
    }
    Vec::new()
}

/// Offer the cheapest unrelated, undeveloped and unmortgaged holding plus cash for
/// the one square a human holds that would complete an AI group.
fn monopoly_trade(game: &GameSnapshot, ai: &Player) -> Option<TradeProposal> {
    let game_id = game.game_id?;
    let owned = game.owned_ids(ai);

    for group in ColorGroup::ALL {
        let members = board::group_members(group);
        let missing: Vec<SquareId> = members
            .iter()
            .copied()
            .filter(|id| !owned.contains(id))
            .collect();
        let &[missing] = missing.as_slice() else {
            continue;
        };

        let Some(holder) = game.ownership(missing).and_then(|record| {
            game.players
                .iter()
                .find(|p| p.user_id != ai.user_id && !p.is_ai() && p.owns(record))
        }) else {
            continue;
        };

        let Some(price) = game.property(missing).and_then(|p| p.listed_price()) else {
            continue;
        };
        let offered = game
            .holdings(ai)
            .filter(|o| !members.contains(&o.property_id) && o.development == 0 && !o.mortgaged)
            .min_by_key(|o| {
                game.property(o.property_id)
                    .and_then(|p| p.listed_price())
                    .unwrap_or(0)
            })?;

        tracing::debug!(
            player = ai.user_id,
            target = holder.user_id,
            %group,
            wanted = missing,
            "proposing monopoly trade"
        );
        return Some(TradeProposal {
            game_id,
            player_id: ai.user_id,
            target_player_id: holder.user_id,
            offer_properties: vec![offered.property_id],
            offer_amount: i64::from(price) * 7 / 10,
            requested_properties: vec![missing],
            requested_amount: 0,
            status: TradeStatus::Pending,
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::STANDARD_PROPERTIES;
    use rand::rngs::mock::StepRng;

    const AI: &str = "0xai";
    const HUMAN: &str = "0xhuman";

    fn always() -> StepRng {
        StepRng::new(0, 0)
    }

    fn never() -> StepRng {
        StepRng::new(u64::MAX, 0)
    }

    fn game(ai_balance: i64, ownerships: Vec<OwnershipRecord>) -> GameSnapshot {
        let mut snapshot = GameSnapshot::new(
            vec![
                Player::new(1, "AI_1", AI).with_balance(ai_balance),
                Player::new(2, "alice", HUMAN).with_balance(1_500),
            ],
            ownerships,
            STANDARD_PROPERTIES.clone(),
        );
        snapshot.game_id = Some(7);
        snapshot
    }

    fn plan(game: &GameSnapshot, rng: &mut StepRng) -> TurnPlan {
        let ai = game.player(1).unwrap().clone();
        plan_turn(game, &ai, rng)
    }

    #[test]
    fn debt_sells_houses_by_hotel_rent_then_mortgages_by_price() {
        let game = game(
            -300,
            vec![
                OwnershipRecord::new(16, AI).with_development(2),
                OwnershipRecord::new(21, AI).with_development(1),
                OwnershipRecord::new(6, AI),
                OwnershipRecord::new(39, AI).mortgaged(),
                OwnershipRecord::new(19, HUMAN),
            ],
        );

        let plan = plan(&game, &mut always());

        use PropertyAction::{Downgrade, Mortgage};
        let expected: Vec<_> = [
            (Downgrade, 21),
            (Downgrade, 16),
            (Downgrade, 16),
            (Mortgage, 21),
            (Mortgage, 16),
            (Mortgage, 6),
        ]
        .into_iter()
        .map(|(action, id)| PlannedAction::new(action, id))
        .collect();
        assert_eq!(plan.steps, expected);
        assert!(plan.trade.is_none());
    }

    #[test]
    fn rich_ai_redeems_best_rent_mortgage() {
        let game = game(
            1_500,
            vec![
                OwnershipRecord::new(6, AI).mortgaged(),
                OwnershipRecord::new(39, AI).mortgaged(),
            ],
        );

        let plan = plan(&game, &mut never());

        assert_eq!(
            plan.steps,
            vec![PlannedAction::new(PropertyAction::Unmortgage, 39)]
        );
    }

    fn developments(ids: &[SquareId]) -> Vec<PlannedAction> {
        ids.iter()
            .map(|id| PlannedAction::new(PropertyAction::Development, *id))
            .collect()
    }

    #[test]
    fn builds_on_least_developed_members_of_the_first_priority_group() {
        let game = game(
            1_000,
            vec![
                OwnershipRecord::new(1, AI),
                OwnershipRecord::new(3, AI),
                OwnershipRecord::new(6, AI).with_development(1),
                OwnershipRecord::new(8, AI),
                OwnershipRecord::new(9, AI),
            ],
        );

        let plan = plan(&game, &mut always());

        // Light blue ranks ahead of brown for building.
        assert_eq!(plan.steps, developments(&[8, 9]));
        assert!(plan.trade.is_none());
    }

    #[test]
    fn groups_with_a_mortgaged_member_are_not_built_on() {
        let game = game(
            1_000,
            vec![
                OwnershipRecord::new(16, AI).mortgaged(),
                OwnershipRecord::new(18, AI),
                OwnershipRecord::new(19, AI),
                OwnershipRecord::new(1, AI),
                OwnershipRecord::new(3, AI),
            ],
        );
        assert_eq!(plan(&game, &mut always()).steps, developments(&[1, 3]));

        let orange_only = self::game(
            1_000,
            vec![
                OwnershipRecord::new(16, AI).mortgaged(),
                OwnershipRecord::new(18, AI),
                OwnershipRecord::new(19, AI),
            ],
        );
        assert!(plan(&orange_only, &mut never()).is_empty());
    }

    #[test]
    fn uneven_groups_are_skipped() {
        let game = game(
            1_000,
            vec![
                OwnershipRecord::new(16, AI).with_development(3),
                OwnershipRecord::new(18, AI).with_development(1),
                OwnershipRecord::new(19, AI).with_development(1),
                OwnershipRecord::new(21, AI),
                OwnershipRecord::new(23, AI),
                OwnershipRecord::new(24, AI),
            ],
        );

        assert_eq!(plan(&game, &mut always()).steps, developments(&[21, 23, 24]));
    }

    #[test]
    fn hotels_everywhere_leave_nothing_to_build() {
        let game = game(
            1_000,
            vec![
                OwnershipRecord::new(1, AI).with_development(5),
                OwnershipRecord::new(3, AI).with_development(5),
            ],
        );

        let plan = plan(&game, &mut always());
        assert!(plan.is_empty());
    }

    #[test]
    fn a_house_for_every_member_must_be_affordable() {
        let mut game = game(
            1_000,
            vec![
                OwnershipRecord::new(21, AI),
                OwnershipRecord::new(23, AI),
                OwnershipRecord::new(24, AI),
            ],
        );
        assert_eq!(plan(&game, &mut always()).steps, developments(&[21, 23, 24]));

        // 1000 / 400 covers two houses, not three.
        if let Some(kentucky) = game.properties.iter_mut().find(|p| p.id == 21) {
            kentucky.cost_of_house = 400;
        }
        let plan = plan(&game, &mut always());
        assert!(plan.steps.is_empty());
        assert!(plan.trade.is_none());
    }

    #[test]
    fn proposes_trade_for_missing_group_member_held_by_human() {
        let game = game(
            500,
            vec![
                OwnershipRecord::new(16, AI),
                OwnershipRecord::new(18, AI),
                OwnershipRecord::new(1, AI),
                OwnershipRecord::new(19, HUMAN),
            ],
        );

        let plan = plan(&game, &mut always());

        let trade = plan.trade.expect("trade proposal");
        assert_eq!(trade.game_id, 7);
        assert_eq!(trade.player_id, 1);
        assert_eq!(trade.target_player_id, 2);
        assert_eq!(trade.offer_properties, vec![1]);
        assert_eq!(trade.offer_amount, 140);
        assert_eq!(trade.requested_properties, vec![19]);
        assert_eq!(trade.status, TradeStatus::Pending);
        assert!(plan.steps.is_empty());
    }

    #[test]
    fn trade_is_skipped_on_unlucky_roll_or_ai_holder() {
        let ownerships = vec![
            OwnershipRecord::new(16, AI),
            OwnershipRecord::new(18, AI),
            OwnershipRecord::new(1, AI),
            OwnershipRecord::new(19, HUMAN),
        ];
        assert!(plan(&game(500, ownerships.clone()), &mut never()).is_empty());

        let mut rival_ai = game(500, ownerships);
        rival_ai.players[1].username = "AI_3".to_string();
        assert!(plan(&rival_ai, &mut always()).is_empty());
    }

    #[test]
    fn trade_needs_something_to_offer_outside_the_group() {
        let game = game(
            500,
            vec![
                OwnershipRecord::new(16, AI),
                OwnershipRecord::new(18, AI),
                OwnershipRecord::new(19, HUMAN),
            ],
        );

        assert!(plan(&game, &mut always()).trade.is_none());
    }

    #[test]
    fn offered_square_must_be_undeveloped_and_unmortgaged() {
        let game = game(
            500,
            vec![
                OwnershipRecord::new(16, AI),
                OwnershipRecord::new(18, AI),
                OwnershipRecord::new(19, HUMAN),
                OwnershipRecord::new(1, AI).with_development(1),
                OwnershipRecord::new(3, AI).mortgaged(),
                OwnershipRecord::new(6, AI),
            ],
        );

        let trade = plan(&game, &mut always()).trade.expect("trade proposal");
        assert_eq!(trade.offer_properties, vec![6]);
        assert_eq!(trade.offer_amount, 140);
        assert_eq!(trade.requested_properties, vec![19]);
    }

    #[test]
    fn unpriced_missing_square_moves_on_to_the_next_group() {
        let mut game = game(
            500,
            vec![
                OwnershipRecord::new(6, AI),
                OwnershipRecord::new(8, AI),
                OwnershipRecord::new(9, HUMAN),
                OwnershipRecord::new(16, AI),
                OwnershipRecord::new(18, AI),
                OwnershipRecord::new(19, HUMAN),
                OwnershipRecord::new(1, AI),
            ],
        );
        if let Some(connecticut) = game.properties.iter_mut().find(|p| p.id == 9) {
            connecticut.price = None;
        }

        let trade = plan(&game, &mut always()).trade.expect("trade proposal");
        assert_eq!(trade.requested_properties, vec![19]);
        assert_eq!(trade.offer_properties, vec![1]);
    }
}
