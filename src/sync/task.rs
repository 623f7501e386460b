use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, MissedTickBehavior};
use tracing::Instrument;
use uuid::Uuid;

use crate::api::{ApiError, TradeSource};
use crate::config::DEFAULT_POLL_INTERVAL;
use crate::game::{GameId, Player, PlayerId, TradeOffer};
use crate::sync::{RefreshTicket, TradeLists, TradeSnapshot, TradeSync};

#[derive(Debug, Clone)]
pub struct PollSettings {
    pub game_id: Option<GameId>,
    pub player_id: Option<PlayerId>,
    pub players: Vec<Player>,
    pub interval: Duration,
}

impl PollSettings {
    pub fn new(game_id: Option<GameId>, player_id: Option<PlayerId>, players: Vec<Player>) -> Self {
        Self {
            game_id,
            player_id,
            players,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

#[derive(Debug)]
enum Command {
    ForceRefresh,
    Dismiss,
    SetGame(Option<GameId>),
    SetPlayer(Option<PlayerId>),
    SetPlayers(Vec<Player>),
    Shutdown,
}

/// Handle to a background task polling one player's trades.
///
/// Dropping the handle cancels the task; responses still in flight are discarded.
pub struct TradePoller {
    session: Uuid,
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<TradeSnapshot>,
    offers: mpsc::UnboundedReceiver<TradeOffer>,
    cancel: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl TradePoller {
    /// Must be called from within a tokio runtime.
    pub fn spawn<S>(source: S, settings: PollSettings) -> Self
    where
        S: TradeSource + Send + Sync + 'static,
    {
        let session = Uuid::new_v4();
        let core = TradeSync::new(settings.game_id, settings.player_id, settings.players);
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshots) = watch::channel(core.snapshot());
        let (surfaced, offers) = mpsc::unbounded_channel();
        let (cancel, cancel_rx) = watch::channel(false);

        let span = tracing::info_span!("trade_sync", %session);
        let worker = Worker {
            source: Arc::new(source),
            core,
            interval: settings.interval,
            in_flight: JoinSet::new(),
            snapshots: snapshot_tx,
            surfaced,
        };
        let task = tokio::spawn(worker.run(command_rx, cancel_rx).instrument(span));

        Self {
            session,
            commands,
            snapshots,
            offers,
            cancel,
            task: Some(task),
        }
    }

    pub fn session(&self) -> Uuid {
        self.session
    }

    pub fn force_refresh(&self) {
        self.send(Command::ForceRefresh);
    }

    pub fn dismiss_popup(&self) {
        self.send(Command::Dismiss);
    }

    pub fn set_game(&self, game_id: Option<GameId>) {
        self.send(Command::SetGame(game_id));
    }

    pub fn set_player(&self, player_id: Option<PlayerId>) {
        self.send(Command::SetPlayer(player_id));
    }

    pub fn set_players(&self, players: Vec<Player>) {
        self.send(Command::SetPlayers(players));
    }

    pub fn snapshot(&self) -> TradeSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TradeSnapshot> {
        self.snapshots.clone()
    }

    /// Waits for the next offer to surface. Each offer is yielded once, however
    /// long its popup stays up. `None` once the task has stopped.
    pub async fn next_offer(&mut self) -> Option<TradeOffer> {
        self.offers.recv().await
    }

    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// Stops polling and waits for the task to finish.
    pub async fn shutdown(mut self) {
        self.send(Command::Shutdown);
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                tracing::warn!(session = %self.session, %err, "trade sync task ended abnormally");
            }
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::debug!(session = %self.session, "trade sync task already stopped");
        }
    }
}

impl Drop for TradePoller {
    fn drop(&mut self) {
        self.cancel.send_replace(true);
    }
}

struct Worker<S> {
    source: Arc<S>,
    core: TradeSync,
    interval: Duration,
    in_flight: JoinSet<(RefreshTicket, Result<TradeLists, ApiError>)>,
    snapshots: watch::Sender<TradeSnapshot>,
    surfaced: mpsc::UnboundedSender<TradeOffer>,
}

impl<S> Worker<S>
where
    S: TradeSource + Send + Sync + 'static,
{
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut cancel: watch::Receiver<bool>,
    ) {
        // The first tick completes immediately.
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::debug!(phase = %self.core.phase(), "trade sync started");

        loop {
            tokio::select! {
                biased;
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        break;
                    }
                }
                command = commands.recv() => match command {
                    None | Some(Command::Shutdown) => break,
                    Some(command) => {
                        if self.handle(command) {
                            ticker.reset_immediately();
                        }
                    }
                },
                Some(joined) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
                    match joined {
                        Ok((ticket, result)) => {
                            if let Some(offer) = self.core.apply(ticket, result) {
                                // The handle may be gone already; the snapshot still records it.
                                let _ = self.surfaced.send(offer.clone());
                            }
                        }
                        Err(err) => tracing::warn!(%err, "trade refresh task failed"),
                    }
                }
                _ = ticker.tick(), if self.core.is_active() => self.start_refresh(),
            }
            self.publish();
        }

        self.in_flight.abort_all();
        self.core.dispose();
        self.publish();
        tracing::debug!("trade sync stopped");
    }

    /// Returns true when polling should restart with an immediate refresh.
    fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::ForceRefresh => {
                self.start_refresh();
                false
            }
            Command::Dismiss => {
                self.core.dismiss_popup();
                false
            }
            Command::SetGame(game_id) => {
                let switched = game_id != self.core.game_id();
                self.core.set_game(game_id);
                switched && self.core.is_active()
            }
            Command::SetPlayer(player_id) => {
                let switched = player_id != self.core.player_id();
                self.core.set_player(player_id);
                switched && self.core.is_active()
            }
            Command::SetPlayers(players) => {
                self.core.set_players(players);
                false
            }
            Command::Shutdown => false,
        }
    }

    fn start_refresh(&mut self) {
        let Some(ticket) = self.core.begin_refresh() else {
            return;
        };
        let source = Arc::clone(&self.source);
        self.in_flight.spawn(async move {
            let result = fetch(source.as_ref(), ticket).await;
            (ticket, result)
        });
    }

    fn publish(&self) {
        let next = self.core.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

async fn fetch<S: TradeSource>(
    source: &S,
    ticket: RefreshTicket,
) -> Result<TradeLists, ApiError> {
    let (mine, incoming) = tokio::try_join!(
        source.my_trades(ticket.game_id, ticket.player_id),
        source.incoming_trades(ticket.game_id, ticket.player_id),
    )?;
    Ok(TradeLists { mine, incoming })
}
