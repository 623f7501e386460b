pub mod players;
pub mod property;
pub mod state;
pub mod trade;

pub use players::{Player, PlayerId};
pub use property::{MAX_DEVELOPMENT, OwnershipRecord, PropertyRecord};
pub use state::{GameId, GameSnapshot};
pub use trade::{TradeId, TradeOffer, TradeProposal};
