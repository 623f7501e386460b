use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use monopoly_rs::api::{ApiClient, execute_plan};
use monopoly_rs::cli::{self, ScoreReport, ScoreRequest};
use monopoly_rs::config::ClientConfig;
use monopoly_rs::game::{GameId, PlayerId};

#[derive(Debug, Parser)]
#[command(name = "monopoly-score")]
#[command(about = "Score a property purchase for one player from a JSON game snapshot")]
struct Args {
    /// Snapshot file; reads stdin when omitted or "-"
    input: Option<PathBuf>,

    /// Minimum score needed to buy
    #[arg(long)]
    threshold: Option<i64>,

    /// Also plan the player's next turn using this RNG seed
    #[arg(long)]
    plan_seed: Option<u64>,

    /// Send the planned actions and the purchase to the game API
    #[arg(long)]
    submit: bool,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    cli::init_tracing(args.verbose);

    let raw = match args.input.as_deref() {
        Some(path) if path.as_os_str() != "-" => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read snapshot from stdin")?;
            buf
        }
    };

    let request: ScoreRequest = serde_json::from_str(&raw).context("invalid score snapshot")?;
    let game_id = request.game_id;
    let user_id = request.player.user_id;
    let report = cli::evaluate(request, args.threshold, args.plan_seed);

    let out = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{out}");

    if args.submit {
        let game_id = game_id.context("--submit needs a game_id in the snapshot")?;
        let client = ApiClient::from_config(&ClientConfig::from_env()?)?;
        submit(&client, game_id, user_id, &report).await?;
    }
    Ok(())
}

async fn submit(
    client: &ApiClient,
    game_id: GameId,
    user_id: PlayerId,
    report: &ScoreReport,
) -> Result<()> {
    if let Some(plan) = &report.plan {
        let outcome = execute_plan(client, game_id, user_id, &plan.steps).await;
        tracing::info!(
            applied = outcome.applied.len(),
            failed = outcome.failed.len(),
            skipped = outcome.skipped.len(),
            "turn plan submitted"
        );
        if let Some(proposal) = &plan.trade {
            client.propose_trade(proposal).await?;
        }
    }

    if report.buy {
        let outcome = client
            .buy_property(game_id, user_id, report.property_id)
            .await
            .context("purchase failed")?;
        tracing::info!(
            property = report.property_id,
            success = outcome.success,
            message = ?outcome.message,
            "purchase submitted"
        );
    }
    Ok(())
}
