//! HTTP client for the game service plus the narrow traits the rest of the crate
//! talks to, so polling and plan execution can run against fakes.

pub mod error;

use std::future::Future;
use std::time::Duration;

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use strum::Display;

pub use error::ApiError;

use crate::board::SquareId;
use crate::config::ClientConfig;
use crate::game::{GameId, PlayerId, TradeId, TradeOffer, TradeProposal};
use crate::players::PlannedAction;
use crate::types::{PropertyAction, TradeResponse};

pub type Result<T> = std::result::Result<T, ApiError>;

/// Which side of a player's trades to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TradeList {
    #[strum(serialize = "my")]
    Mine,
    #[strum(serialize = "incoming")]
    Incoming,
}

/// Source of a player's trade lists.
pub trait TradeSource {
    fn my_trades(
        &self,
        game_id: GameId,
        player_id: PlayerId,
    ) -> impl Future<Output = Result<Vec<TradeOffer>>> + Send;

    fn incoming_trades(
        &self,
        game_id: GameId,
        player_id: PlayerId,
    ) -> impl Future<Output = Result<Vec<TradeOffer>>> + Send;
}

/// Applies one property mutation on behalf of a player.
pub trait PropertyActions {
    fn apply(
        &self,
        game_id: GameId,
        user_id: PlayerId,
        step: PlannedAction,
    ) -> impl Future<Output = Result<ActionOutcome>> + Send;
}

#[derive(Debug, Clone, Serialize)]
struct PropertyRequest {
    game_id: GameId,
    user_id: PlayerId,
    property_id: SquareId,
}

#[derive(Debug, Clone, Serialize)]
struct TradeIdRequest {
    id: TradeId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ActionOutcome {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct Created {
    id: TradeId,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url,
            token,
            http,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(&config.api_url, config.token.clone(), config.http_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send_raw(&self, builder: RequestBuilder) -> Result<Vec<u8>> {
        let res = builder.send().await?;
        let status = res.status();
        let body = res.bytes().await?;
        if !status.is_success() {
            return Err(ApiError::from_status(status, &body));
        }
        Ok(body.to_vec())
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let body = self.send_raw(builder).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn list_trades(
        &self,
        list: TradeList,
        game_id: GameId,
        player_id: PlayerId,
    ) -> Result<Vec<TradeOffer>> {
        let path = format!("game-trade-requests/{list}/{game_id}/player/{player_id}");
        let body = self.send_raw(self.request(Method::GET, &path)).await?;
        Ok(parse_trade_list(&body))
    }

    pub async fn property_action(
        &self,
        action: PropertyAction,
        game_id: GameId,
        user_id: PlayerId,
        property_id: SquareId,
    ) -> Result<ActionOutcome> {
        let path = format!("game-properties/{action}");
        let body = PropertyRequest {
            game_id,
            user_id,
            property_id,
        };
        self.send_json(self.request(Method::POST, &path).json(&body))
            .await
    }

    pub async fn buy_property(
        &self,
        game_id: GameId,
        user_id: PlayerId,
        property_id: SquareId,
    ) -> Result<ActionOutcome> {
        let body = PropertyRequest {
            game_id,
            user_id,
            property_id,
        };
        self.send_json(self.request(Method::POST, "game-properties/buy").json(&body))
            .await
    }

    pub async fn respond_to_trade(&self, id: TradeId, response: TradeResponse) -> Result<()> {
        let path = format!("game-trade-requests/{response}");
        self.send_raw(self.request(Method::POST, &path).json(&TradeIdRequest { id }))
            .await?;
        tracing::info!(trade = id, %response, "answered trade");
        Ok(())
    }

    /// Returns the id the service assigned, when it reports one.
    pub async fn propose_trade(&self, proposal: &TradeProposal) -> Result<Option<TradeId>> {
        let body = self
            .send_raw(self.request(Method::POST, "game-trade-requests").json(proposal))
            .await?;
        let created = serde_json::from_slice::<Envelope<Created>>(&body)
            .ok()
            .and_then(|envelope| envelope.data)
            .map(|created| created.id);
        tracing::info!(
            from = proposal.player_id,
            to = proposal.target_player_id,
            trade = ?created,
            "proposed trade"
        );
        Ok(created)
    }
}

impl TradeSource for ApiClient {
    fn my_trades(
        &self,
        game_id: GameId,
        player_id: PlayerId,
    ) -> impl Future<Output = Result<Vec<TradeOffer>>> + Send {
        self.list_trades(TradeList::Mine, game_id, player_id)
    }

    fn incoming_trades(
        &self,
        game_id: GameId,
        player_id: PlayerId,
    ) -> impl Future<Output = Result<Vec<TradeOffer>>> + Send {
        self.list_trades(TradeList::Incoming, game_id, player_id)
    }
}

impl PropertyActions for ApiClient {
    fn apply(
        &self,
        game_id: GameId,
        user_id: PlayerId,
        step: PlannedAction,
    ) -> impl Future<Output = Result<ActionOutcome>> + Send {
        self.property_action(step.action, game_id, user_id, step.property_id)
    }
}

/// Reads the `{ data: [...] }` envelope; anything else is an empty list.
/// Elements that do not decode as trades are skipped one by one.
pub fn parse_trade_list(body: &[u8]) -> Vec<TradeOffer> {
    let envelope = match serde_json::from_slice::<Envelope<serde_json::Value>>(body) {
        Ok(envelope) => envelope,
        Err(err) => {
            tracing::warn!(%err, "trade list is not a JSON envelope");
            return Vec::new();
        }
    };
    match envelope.data {
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| {
                serde_json::from_value(item)
                    .inspect_err(|err| tracing::warn!(index, %err, "skipping malformed trade"))
                    .ok()
            })
            .collect(),
        Some(serde_json::Value::Null) | None => Vec::new(),
        Some(other) => {
            tracing::warn!(kind = json_kind(&other), "trade list data is not an array");
            Vec::new()
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// What happened to each step of a [`crate::players::TurnPlan`].
#[derive(Debug, Default)]
pub struct PlanReport {
    pub applied: Vec<PlannedAction>,
    pub failed: Vec<(PlannedAction, String)>,
    pub skipped: Vec<PlannedAction>,
}

impl PlanReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

/// Runs steps in order. After a failure the remaining steps on the same square
/// are skipped; other squares still go ahead.
pub async fn execute_plan<A>(
    actions: &A,
    game_id: GameId,
    user_id: PlayerId,
    steps: &[PlannedAction],
) -> PlanReport
where
    A: PropertyActions,
{
    let mut report = PlanReport::default();
    let mut blocked: Vec<SquareId> = Vec::new();

    for step in steps.iter().copied() {
        if blocked.contains(&step.property_id) {
            report.skipped.push(step);
            continue;
        }

        let reason = match actions.apply(game_id, user_id, step).await {
            Ok(outcome) if outcome.success => {
                report.applied.push(step);
                continue;
            }
            Ok(outcome) => outcome
                .message
                .unwrap_or_else(|| "rejected by server".to_string()),
            Err(err) => err.to_string(),
        };

        tracing::warn!(
            player = user_id,
            property = step.property_id,
            action = %step.action,
            %reason,
            "property action failed"
        );
        blocked.push(step.property_id);
        report.failed.push((step, reason));
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn trade_list_reads_data_array() {
        let body = br#"{"success":true,"data":[
            {"id":1,"status":"pending","player_id":4},
            {"id":2,"status":"accepted","player_id":5,"offer_amount":null}
        ]}"#;
        let trades = parse_trade_list(body);
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].id, 1);
        assert!(trades[0].is_pending());
        assert_eq!(trades[1].offer_amount, 0);
    }

    #[test]
    fn malformed_trade_lists_are_empty() {
        assert!(parse_trade_list(b"<html>").is_empty());
        assert!(parse_trade_list(br#"{"success":true}"#).is_empty());
        assert!(parse_trade_list(br#"{"data":null}"#).is_empty());
        assert!(parse_trade_list(br#"{"data":{"id":1}}"#).is_empty());
        assert!(parse_trade_list(br#"{"data":[{"id":"x"}]}"#).is_empty());
    }

    #[test]
    fn bad_elements_are_skipped_without_losing_the_list() {
        let body = br#"{"data":[
            {"id":42,"status":"pending","player_id":2,"offer_amount":150.5},
            {"id":43,"status":"pending","player_id":2,"offer_properties":"[1,3]"},
            {"status":"pending","player_id":2},
            "not a trade"
        ]}"#;
        let trades = parse_trade_list(body);
        assert_eq!(trades.iter().map(|t| t.id).collect::<Vec<_>>(), vec![42, 43]);
        assert_eq!(trades[0].offer_amount, 150);
        assert_eq!(trades[1].offer_properties, vec![1, 3]);

        let single = br#"{"data":[{"id":42,"status":"pending","player_id":2,"offer_amount":150.5}]}"#;
        assert_eq!(parse_trade_list(single).len(), 1);
    }

    #[test]
    fn urls_join_without_double_slashes() {
        let client = ApiClient::new("http://localhost:3000/api/", None, Duration::from_secs(1))
            .unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000/api");
        assert_eq!(
            client.url("/game-trade-requests/accept"),
            "http://localhost:3000/api/game-trade-requests/accept"
        );
        assert_eq!(TradeList::Mine.to_string(), "my");
        assert_eq!(PropertyAction::Unmortgage.to_string(), "unmortgage");
        assert_eq!(TradeResponse::Decline.to_string(), "decline");
    }

    struct ScriptedActions {
        calls: Mutex<Vec<PlannedAction>>,
        reject: SquareId,
    }

    impl PropertyActions for ScriptedActions {
        fn apply(
            &self,
            _game_id: GameId,
            _user_id: PlayerId,
            step: PlannedAction,
        ) -> impl Future<Output = Result<ActionOutcome>> + Send {
            self.calls.lock().unwrap().push(step);
            let outcome = if step.property_id == self.reject {
                Err(ApiError::Status {
                    status: 400,
                    message: "no houses to sell".to_string(),
                })
            } else {
                Ok(ActionOutcome {
                    success: true,
                    message: None,
                })
            };
            std::future::ready(outcome)
        }
    }

    #[tokio::test]
    async fn failed_step_skips_later_steps_on_same_square() {
        use PropertyAction::{Downgrade, Mortgage};
        let steps = [
            PlannedAction::new(Downgrade, 16),
            PlannedAction::new(Downgrade, 16),
            PlannedAction::new(Mortgage, 6),
            PlannedAction::new(Mortgage, 16),
        ];
        let actions = ScriptedActions {
            calls: Mutex::new(Vec::new()),
            reject: 16,
        };

        let report = execute_plan(&actions, 1, 2, &steps).await;

        assert_eq!(report.applied, vec![steps[2]]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, steps[0]);
        assert!(report.failed[0].1.contains("no houses to sell"));
        assert_eq!(report.skipped, vec![steps[1], steps[3]]);
        assert_eq!(actions.calls.lock().unwrap().len(), 2);
        assert!(!report.is_clean());
    }

    #[tokio::test]
    async fn unsuccessful_outcome_counts_as_failure() {
        struct Refuses;
        impl PropertyActions for Refuses {
            fn apply(
                &self,
                _game_id: GameId,
                _user_id: PlayerId,
                _step: PlannedAction,
            ) -> impl Future<Output = Result<ActionOutcome>> + Send {
                std::future::ready(Ok(ActionOutcome {
                    success: false,
                    message: Some("Insufficient balance".to_string()),
                }))
            }
        }

        let step = PlannedAction::new(PropertyAction::Development, 39);
        let report = execute_plan(&Refuses, 1, 2, &[step]).await;

        assert_eq!(report.failed, vec![(step, "Insufficient balance".to_string())]);
        assert!(report.applied.is_empty());
    }
}
