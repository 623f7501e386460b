//! Trade synchronization: tracks a player's trade lists and surfaces each pending
//! AI-originated offer exactly once per game.

pub mod task;

use std::collections::HashSet;

use serde::Serialize;
use strum::Display;

use crate::api::ApiError;
use crate::game::{GameId, Player, PlayerId, TradeId, TradeOffer};

pub use task::{PollSettings, TradePoller};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SyncPhase {
    #[default]
    Idle,
    Polling,
    PopupPending,
}

/// Both lists returned by one refresh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeLists {
    pub mine: Vec<TradeOffer>,
    pub incoming: Vec<TradeOffer>,
}

/// Identifies one refresh request; results are applied against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    pub generation: u64,
    pub game_id: GameId,
    pub player_id: PlayerId,
}

/// Read-only view published to observers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TradeSnapshot {
    pub phase: SyncPhase,
    pub game_id: Option<GameId>,
    pub player_id: Option<PlayerId>,
    pub my_trades: Vec<TradeOffer>,
    pub incoming_trades: Vec<TradeOffer>,
    pub popup: Option<TradeOffer>,
}

#[derive(Debug, Default)]
pub struct TradeSync {
    game_id: Option<GameId>,
    player_id: Option<PlayerId>,
    players: Vec<Player>,
    processed: HashSet<TradeId>,
    lists: TradeLists,
    popup: Option<TradeOffer>,
    issued: u64,
    last_applied: u64,
    // Tickets below this were issued for a previous game or player.
    valid_from: u64,
    disposed: bool,
}

impl TradeSync {
    pub fn new(game_id: Option<GameId>, player_id: Option<PlayerId>, players: Vec<Player>) -> Self {
        Self {
            game_id,
            player_id,
            players,
            ..Self::default()
        }
    }

    pub fn is_active(&self) -> bool {
        !self.disposed && self.game_id.is_some() && self.player_id.is_some()
    }

    pub fn phase(&self) -> SyncPhase {
        if !self.is_active() {
            SyncPhase::Idle
        } else if self.popup.is_some() {
            SyncPhase::PopupPending
        } else {
            SyncPhase::Polling
        }
    }

    pub fn game_id(&self) -> Option<GameId> {
        self.game_id
    }

    pub fn player_id(&self) -> Option<PlayerId> {
        self.player_id
    }

    pub fn my_trades(&self) -> &[TradeOffer] {
        &self.lists.mine
    }

    pub fn incoming_trades(&self) -> &[TradeOffer] {
        &self.lists.incoming
    }

    pub fn popup(&self) -> Option<&TradeOffer> {
        self.popup.as_ref()
    }

    pub fn is_processed(&self, id: TradeId) -> bool {
        self.processed.contains(&id)
    }

    /// Starts a refresh, or returns `None` when either id is missing.
    pub fn begin_refresh(&mut self) -> Option<RefreshTicket> {
        if !self.is_active() {
            return None;
        }
        self.issued += 1;
        Some(RefreshTicket {
            generation: self.issued,
            game_id: self.game_id?,
            player_id: self.player_id?,
        })
    }

    /// Applies a finished refresh. Returns the offer newly surfaced as popup.
    pub fn apply(
        &mut self,
        ticket: RefreshTicket,
        result: Result<TradeLists, ApiError>,
    ) -> Option<&TradeOffer> {
        if self.disposed
            || ticket.generation <= self.last_applied
            || ticket.generation < self.valid_from
        {
            tracing::debug!(generation = ticket.generation, "discarding stale trade refresh");
            return None;
        }

        let lists = match result {
            Ok(lists) => lists,
            Err(err) => {
                tracing::warn!(
                    game = ticket.game_id,
                    player = ticket.player_id,
                    %err,
                    "trade refresh failed"
                );
                return None;
            }
        };
        self.last_applied = ticket.generation;
        self.lists = lists;

        let offer = self
            .lists
            .incoming
            .iter()
            .find(|offer| {
                offer.is_pending()
                    && !self.processed.contains(&offer.id)
                    && self.offered_by_ai(offer)
            })?
            .clone();

        tracing::info!(trade = offer.id, from = offer.player_id, "new AI trade offer");
        self.processed.insert(offer.id);
        self.popup = Some(offer);
        self.popup.as_ref()
    }

    fn offered_by_ai(&self, offer: &TradeOffer) -> bool {
        self.players
            .iter()
            .find(|p| p.user_id == offer.player_id)
            .is_some_and(Player::is_ai)
    }

    pub fn dismiss_popup(&mut self) {
        self.popup = None;
    }

    /// Switching games forgets which offers were already shown.
    pub fn set_game(&mut self, game_id: Option<GameId>) {
        if game_id == self.game_id {
            return;
        }
        self.processed.clear();
        self.game_id = game_id;
        self.invalidate();
    }

    pub fn set_player(&mut self, player_id: Option<PlayerId>) {
        if player_id == self.player_id {
            return;
        }
        self.player_id = player_id;
        self.invalidate();
    }

    pub fn set_players(&mut self, players: Vec<Player>) {
        self.players = players;
    }

    fn invalidate(&mut self) {
        self.valid_from = self.issued + 1;
        self.lists = TradeLists::default();
        self.popup = None;
    }

    /// Stops accepting results; everything still in flight becomes a no-op.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.popup = None;
    }

    pub fn snapshot(&self) -> TradeSnapshot {
        TradeSnapshot {
            phase: self.phase(),
            game_id: self.game_id,
            player_id: self.player_id,
            my_trades: self.lists.mine.clone(),
            incoming_trades: self.lists.incoming.clone(),
            popup: self.popup.clone(),
        }
    }
}
