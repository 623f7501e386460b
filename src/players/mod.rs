pub mod auto;
pub mod base;
pub mod trade;
pub mod value;

pub use auto::{PlannedAction, TurnPlan, plan_turn};
pub use base::BasePlayer;
pub use trade::trade_favorability;
pub use value::{
    BuyScoreWeights, PurchaseDecision, ScoringPlayer, calculate_buy_score, score_with_weights,
};
