use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ColorGroup {
    Brown,
    #[serde(alias = "light_blue")]
    LightBlue,
    Pink,
    Orange,
    Red,
    Yellow,
    Green,
    #[serde(alias = "dark_blue")]
    DarkBlue,
}

impl ColorGroup {
    pub const ALL: [ColorGroup; 8] = [
        ColorGroup::Brown,
        ColorGroup::LightBlue,
        ColorGroup::Pink,
        ColorGroup::Orange,
        ColorGroup::Red,
        ColorGroup::Yellow,
        ColorGroup::Green,
        ColorGroup::DarkBlue,
    ];

    /// Order in which an AI prefers to develop complete groups.
    pub const BUILD_PRIORITY: [ColorGroup; 8] = [
        ColorGroup::Orange,
        ColorGroup::Red,
        ColorGroup::Yellow,
        ColorGroup::Pink,
        ColorGroup::LightBlue,
        ColorGroup::Green,
        ColorGroup::Brown,
        ColorGroup::DarkBlue,
    ];
}

/// Kind of a purchasable square as reported by the property service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PropertyKind {
    Property,
    #[serde(alias = "railway")]
    Railroad,
    Utility,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TradeStatus {
    Pending,
    Accepted,
    Rejected,
    #[default]
    #[serde(other)]
    Other,
}

/// One-shot property mutation understood by `POST /game-properties/{action}`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PropertyAction {
    Development,
    Downgrade,
    Mortgage,
    Unmortgage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TradeResponse {
    Accept,
    Decline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SquareKind {
    Start,
    Land,
    Railway,
    Utility,
    CommunityChest,
    Chance,
    IncomeTax,
    LuxuryTax,
    VisitingJail,
    FreeParking,
    GoToJail,
}
