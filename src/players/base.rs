use crate::game::players::PlayerId;
use crate::game::property::PropertyRecord;
use crate::game::state::GameSnapshot;
use crate::game::trade::TradeOffer;
use crate::players::auto::TurnPlan;
use crate::players::value::PurchaseDecision;
use crate::types::TradeResponse;

pub trait BasePlayer {
    fn user_id(&self) -> PlayerId;

    fn decide_purchase(&self, game: &GameSnapshot, property: &PropertyRecord) -> PurchaseDecision;

    fn plan_turn(&self, game: &GameSnapshot, rng: &mut dyn rand::RngCore) -> TurnPlan;

    /// Answer to a trade addressed to this player.
    fn respond_to_trade(&self, game: &GameSnapshot, offer: &TradeOffer) -> TradeResponse;
}
