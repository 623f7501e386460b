#![warn(clippy::all)]
#![deny(rust_2018_idioms)]

pub mod api;
pub mod board;
pub mod cli;
pub mod config;
pub mod game;
pub mod players;
pub mod sync;
pub mod types;

pub use api::{ApiClient, ApiError, TradeSource};
pub use board::{STANDARD_PROPERTIES, SquareId};
pub use config::ClientConfig;
pub use game::{GameSnapshot, OwnershipRecord, Player, PropertyRecord, TradeOffer};
pub use players::{BasePlayer, ScoringPlayer, TurnPlan, calculate_buy_score};
pub use sync::{SyncPhase, TradePoller, TradeSync};
pub use types::{ColorGroup, PropertyAction, PropertyKind, TradeStatus};
