use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use monopoly_rs::api::ApiClient;
use monopoly_rs::cli;
use monopoly_rs::config::{ClientConfig, ConfigError};
use monopoly_rs::game::{GameSnapshot, Player, TradeOffer};
use monopoly_rs::players::{BasePlayer, ScoringPlayer};
use monopoly_rs::sync::{PollSettings, TradePoller};
use monopoly_rs::types::TradeResponse;

#[derive(Debug, Parser)]
#[command(name = "monopoly-trades")]
#[command(about = "Watch a player's trades and report new offers from AI opponents")]
struct Args {
    #[arg(long)]
    game_id: u64,

    #[arg(long)]
    player_id: u64,

    /// AI opponents as USER_ID:USERNAME, comma-separated (e.g. 2:AI_2,3:bot_3)
    #[arg(long, value_delimiter = ',')]
    players: Vec<String>,

    /// Overrides MONOPOLY_API_URL
    #[arg(long)]
    api_url: Option<String>,

    /// Overrides MONOPOLY_POLL_INTERVAL_SECS
    #[arg(long)]
    interval: Option<u64>,

    /// Accept or decline each surfaced offer by its favorability for the player
    #[arg(long, requires = "snapshot")]
    auto_respond: bool,

    /// Game snapshot JSON (players, game_properties, properties), re-read for each offer
    #[arg(long)]
    snapshot: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

fn decide(player: &ScoringPlayer, snapshot: &Path, offer: &TradeOffer) -> Result<TradeResponse> {
    let raw = fs::read_to_string(snapshot)
        .with_context(|| format!("failed to read {}", snapshot.display()))?;
    let game: GameSnapshot = serde_json::from_str(&raw).context("invalid game snapshot")?;
    Ok(player.respond_to_trade(&game.with_standard_board(), offer))
}

fn parse_player(raw: &str) -> Result<Player> {
    let (id, username) = raw
        .split_once(':')
        .with_context(|| format!("player {raw:?} is not USER_ID:USERNAME"))?;
    let id = id
        .trim()
        .parse()
        .with_context(|| format!("invalid user id in {raw:?}"))?;
    Ok(Player::new(id, username.trim(), ""))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    cli::init_tracing(args.verbose);

    let mut config = match (ClientConfig::from_env(), args.api_url) {
        (Ok(mut config), Some(url)) => {
            config.api_url = url;
            config
        }
        (Ok(config), None) => config,
        (Err(ConfigError::Missing(_)), Some(url)) => ClientConfig::new(url),
        (Err(err), _) => return Err(err.into()),
    };
    if let Some(secs) = args.interval.filter(|secs| *secs > 0) {
        config.poll_interval = Duration::from_secs(secs);
    }

    let players = args
        .players
        .iter()
        .map(String::as_str)
        .map(parse_player)
        .collect::<Result<Vec<_>>>()?;

    let client = ApiClient::from_config(&config)?;
    let settings = PollSettings::new(Some(args.game_id), Some(args.player_id), players)
        .with_interval(config.poll_interval);
    let mut poller = TradePoller::spawn(client.clone(), settings);
    tracing::info!(
        session = %poller.session(),
        api = client.base_url(),
        game = args.game_id,
        player = args.player_id,
        "watching trades"
    );

    let responder = ScoringPlayer::new(args.player_id, None);
    loop {
        let offer = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            offer = poller.next_offer() => match offer {
                Some(offer) => offer,
                None => break,
            },
        };
        cli::print_offer(&offer);

        if let (true, Some(snapshot)) = (args.auto_respond, args.snapshot.as_deref()) {
            match decide(&responder, snapshot, &offer) {
                Ok(response) => {
                    println!("{response} trade {}", offer.id);
                    if let Err(err) = client.respond_to_trade(offer.id, response).await {
                        tracing::warn!(trade = offer.id, %err, "could not answer trade");
                    }
                    poller.force_refresh();
                }
                Err(err) => tracing::warn!(trade = offer.id, err = %format!("{err:#}"), "no answer sent"),
            }
        }
        poller.dismiss_popup();
    }

    poller.shutdown().await;
    Ok(())
}
