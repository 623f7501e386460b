use crate::board::{self, SquareId};
use crate::game::players::Player;
use crate::game::property::{OwnershipRecord, PropertyRecord, find_property, ownership_of};
use crate::game::trade::TradeOffer;
use crate::types::PropertyKind;

/// Bonus for receiving the last missing member of a color group.
pub const COMPLETES_GROUP_BONUS: i64 = 300;
/// Bonus for receiving a member that leaves one more to go.
pub const NEAR_GROUP_BONUS: i64 = 120;
/// Properties given up count at 1.3x their price.
const GIVE_UP_TENTHS: i64 = 13;

/// How good `trade` is for `receiver`, who gets `offer_properties` and
/// `offer_amount` and hands over `requested_properties` and `requested_amount`.
///
/// Received land counts at its price plus a group bonus based on how many other
/// members the receiver already holds. Railroads and utilities get no bonus.
/// Squares missing from `properties` are ignored.
pub fn trade_favorability(
    trade: &TradeOffer,
    receiver: &Player,
    ownerships: &[OwnershipRecord],
    properties: &[PropertyRecord],
) -> i64 {
    let mut score = trade.offer_amount.saturating_sub(trade.requested_amount);

    for id in &trade.offer_properties {
        let Some(property) = find_property(properties, *id) else {
            continue;
        };
        score = score.saturating_add(price_of(property));
        if property.kind == PropertyKind::Property {
            score = score.saturating_add(group_bonus(*id, &receiver.address, ownerships));
        }
    }

    for id in &trade.requested_properties {
        let Some(property) = find_property(properties, *id) else {
            continue;
        };
        score = score.saturating_sub(price_of(property) * GIVE_UP_TENTHS / 10);
    }

    score
}

fn price_of(property: &PropertyRecord) -> i64 {
    i64::from(property.listed_price().unwrap_or(0))
}

fn group_bonus(id: SquareId, address: &str, ownerships: &[OwnershipRecord]) -> i64 {
    let Some(members) = board::group_of(id).map(board::group_members) else {
        return 0;
    };
    let held = members
        .iter()
        .filter(|member| **member != id)
        .filter(|member| ownership_of(ownerships, **member).is_some_and(|o| o.is_owned_by(address)))
        .count();
    if held + 1 == members.len() {
        COMPLETES_GROUP_BONUS
    } else if held + 2 == members.len() {
        NEAR_GROUP_BONUS
    } else {
        0
    }
}
