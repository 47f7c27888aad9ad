//! The Odds API adapter.
//!
//! Betting odds from <https://the-odds-api.com>: sports catalog, per-sport
//! odds across selectable markets (`h2h`, `totals`, `spreads`), and account
//! usage counters carried in response headers. The API key travels as the
//! `apiKey` query parameter, not a header.
//!
//! This variant is odds-only: it has no team, player, or stats data, and
//! says so with `ProviderError::Unsupported` instead of returning empty
//! collections. Games are adapted from odds events, with team display names
//! standing in for team ids, since odds providers do not share id space with
//! sports providers.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, warn};

use crate::api::errors::ProviderError;
use crate::api::executor::{base_headers, RequestExecutor};
use crate::api::provider::SportsProvider;
use crate::api::rate_limiter::RateLimiter;
use crate::data::models::{
    parse_iso_utc, parse_iso_utc_or_now, BettingOdds, Game, GameWithOdds, Player, SportInfo,
    StatMap, Team, UsageInfo,
};

pub const BASE_URL: &str = "https://api.the-odds-api.com/v4";
const PROVIDER_NAME: &str = "odds_api";

pub const DEFAULT_SPORT: &str = "basketball_nba";
const DEFAULT_SEASON: &str = "2024-25";
pub const DEFAULT_REGIONS: &str = "us";
pub const DEFAULT_MARKETS: &str = "h2h,spreads,totals";

pub struct OddsProvider {
    executor: RequestExecutor,
    api_key: String,
}

impl OddsProvider {
    pub fn new(
        base_url: &str,
        api_key: &str,
        timeout: Duration,
        max_retries: u32,
        rate_limit: usize,
    ) -> Result<Self, ProviderError> {
        if api_key.is_empty() {
            return Err(ProviderError::Config(
                "odds API key must not be empty".to_string(),
            ));
        }
        let rate_limiter = RateLimiter::per_minute(rate_limit)?;
        Ok(Self {
            executor: RequestExecutor::new(
                base_url,
                base_headers(),
                timeout,
                max_retries,
                rate_limiter,
            ),
            api_key: api_key.to_string(),
        })
    }

    /// Conservative rate limit sized for the free tier.
    pub fn with_defaults(api_key: &str) -> Result<Self, ProviderError> {
        Self::new(BASE_URL, api_key, Duration::from_secs(10), 3, 20)
    }

    /// Available sports catalog (outside the common provider contract).
    pub async fn get_sports(&self) -> Result<Vec<SportInfo>, ProviderError> {
        let params = [("apiKey", self.api_key.as_str())];
        let response = self.executor.get("sports", Some(&params)).await?;

        let sports: Vec<SportInfo> = serde_json::from_value(response.data)
            .map_err(|e| ProviderError::Api(format!("unexpected sports payload: {e}")))?;
        info!(count = sports.len(), "Retrieved available sports");
        Ok(sports)
    }

    /// Current odds for one sport, one `GameWithOdds` per event.
    pub async fn get_odds(
        &self,
        sport: &str,
        regions: &str,
        markets: &str,
    ) -> Result<Vec<GameWithOdds>, ProviderError> {
        let params = [
            ("apiKey", self.api_key.as_str()),
            ("regions", regions),
            ("markets", markets),
            ("dateFormat", "iso"),
            ("oddsFormat", "decimal"),
        ];
        let response = self
            .executor
            .get(&format!("sports/{sport}/odds"), Some(&params))
            .await?;

        let events: Vec<OddsEvent> = serde_json::from_value(response.data)
            .map_err(|e| ProviderError::Api(format!("unexpected odds payload: {e}")))?;
        let games: Vec<GameWithOdds> = events.iter().map(parse_event_odds).collect();
        info!(count = games.len(), sport, "Retrieved odds");
        Ok(games)
    }

    /// Historical odds (paid plan; a 401 surfaces as an authentication
    /// error through normal classification).
    pub async fn get_historical_odds(
        &self,
        sport: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<GameWithOdds>, ProviderError> {
        let date_from = start_date.map(|d| d.to_string());
        let date_to = end_date.map(|d| d.to_string());

        let mut params = vec![
            ("apiKey", self.api_key.as_str()),
            ("regions", DEFAULT_REGIONS),
            ("markets", DEFAULT_MARKETS),
        ];
        if let Some(ref from) = date_from {
            params.push(("dateFrom", from));
        }
        if let Some(ref to) = date_to {
            params.push(("dateTo", to));
        }

        let response = self
            .executor
            .get(&format!("historical/sports/{sport}/odds"), Some(&params))
            .await?;

        let events: Vec<OddsEvent> = serde_json::from_value(response.data)
            .map_err(|e| ProviderError::Api(format!("unexpected odds payload: {e}")))?;
        Ok(events.iter().map(parse_event_odds).collect())
    }

    /// Account quota counters from the usage headers on a cheap read.
    pub async fn usage_info(&self) -> Result<UsageInfo, ProviderError> {
        let params = [("apiKey", self.api_key.as_str())];
        let response = self.executor.get("sports", Some(&params)).await?;

        Ok(UsageInfo {
            requests_remaining: response.header_u64("x-requests-remaining"),
            requests_used: response.header_u64("x-requests-used"),
            requests_last: response.header_u64("x-requests-last"),
        })
    }
}

#[async_trait]
impl SportsProvider for OddsProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn get_teams(&self, _league: Option<&str>) -> Result<Vec<Team>, ProviderError> {
        Err(ProviderError::unsupported(PROVIDER_NAME, "get_teams"))
    }

    async fn get_team(&self, _team_id: &str) -> Result<Team, ProviderError> {
        Err(ProviderError::unsupported(PROVIDER_NAME, "get_team"))
    }

    async fn get_players(&self, _team_id: Option<&str>) -> Result<Vec<Player>, ProviderError> {
        Err(ProviderError::unsupported(PROVIDER_NAME, "get_players"))
    }

    async fn get_player(&self, _player_id: &str) -> Result<Player, ProviderError> {
        Err(ProviderError::unsupported(PROVIDER_NAME, "get_player"))
    }

    /// Games adapted from current odds events.
    async fn get_games(
        &self,
        _start_date: Option<NaiveDate>,
        _end_date: Option<NaiveDate>,
        _team_id: Option<&str>,
    ) -> Result<Vec<Game>, ProviderError> {
        let games_with_odds = self
            .get_odds(DEFAULT_SPORT, DEFAULT_REGIONS, DEFAULT_MARKETS)
            .await?;

        Ok(games_with_odds.into_iter().map(game_from_odds).collect())
    }

    async fn get_game(&self, game_id: &str) -> Result<Game, ProviderError> {
        let games = self.get_games(None, None, None).await?;
        games
            .into_iter()
            .find(|g| g.id == game_id)
            .ok_or_else(|| ProviderError::NotFound(format!("game {game_id} not found")))
    }

    async fn get_team_stats(
        &self,
        _team_id: &str,
        _season: Option<&str>,
    ) -> Result<StatMap, ProviderError> {
        Err(ProviderError::unsupported(PROVIDER_NAME, "get_team_stats"))
    }

    async fn get_player_stats(
        &self,
        _player_id: &str,
        _season: Option<&str>,
    ) -> Result<StatMap, ProviderError> {
        Err(ProviderError::unsupported(PROVIDER_NAME, "get_player_stats"))
    }
}

// =============================================================================
// Wire shapes
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct OddsEvent {
    #[serde(default)]
    id: String,
    #[serde(default)]
    sport_key: String,
    #[serde(default)]
    commence_time: String,
    #[serde(default)]
    home_team: String,
    #[serde(default)]
    away_team: String,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    scores: Option<Vec<ScoreEntry>>,
    #[serde(default)]
    bookmakers: Vec<Bookmaker>,
}

#[derive(Debug, Deserialize)]
struct ScoreEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    score: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Bookmaker {
    #[serde(default)]
    title: String,
    #[serde(default)]
    last_update: String,
    #[serde(default)]
    markets: Vec<BookmakerMarket>,
}

#[derive(Debug, Deserialize)]
struct BookmakerMarket {
    #[serde(default)]
    key: String,
    #[serde(default)]
    outcomes: Vec<Outcome>,
}

#[derive(Debug, Deserialize)]
struct Outcome {
    #[serde(default)]
    name: String,
    /// Decimal odds (1.90 means a 1 unit stake returns 1.90).
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    point: Option<f64>,
}

// =============================================================================
// Conversion
// =============================================================================

/// Convert one odds event into a normalized `GameWithOdds`, one
/// `BettingOdds` per bookmaker. Missing markets leave their fields unset;
/// unknown market keys are ignored.
pub(crate) fn parse_event_odds(event: &OddsEvent) -> GameWithOdds {
    let (home_score, away_score) = parse_scores(event);

    let odds = event
        .bookmakers
        .iter()
        .map(|bookmaker| parse_bookmaker_odds(event, bookmaker))
        .collect();

    GameWithOdds {
        game_id: event.id.clone(),
        home_team: event.home_team.clone(),
        away_team: event.away_team.clone(),
        sport: event.sport_key.clone(),
        commence_time: parse_iso_utc_or_now(&event.commence_time),
        home_score,
        away_score,
        completed: event.completed,
        odds,
    }
}

fn parse_bookmaker_odds(event: &OddsEvent, bookmaker: &Bookmaker) -> BettingOdds {
    let mut odds = BettingOdds::new(
        &event.id,
        &bookmaker.title,
        &event.home_team,
        &event.away_team,
    );
    odds.last_update = parse_iso_utc(&bookmaker.last_update);

    for market in &bookmaker.markets {
        match market.key.as_str() {
            // Head-to-head (moneyline): outcomes named after the teams,
            // anything else is a draw for sports that have one.
            "h2h" => {
                for outcome in &market.outcomes {
                    if outcome.name == event.home_team {
                        odds.home_odds = outcome.price;
                    } else if outcome.name == event.away_team {
                        odds.away_odds = outcome.price;
                    } else {
                        odds.draw_odds = outcome.price;
                    }
                }
            }
            "totals" => {
                for outcome in &market.outcomes {
                    match outcome.name.as_str() {
                        "Over" => {
                            odds.over_odds = outcome.price;
                            odds.over_under_line = outcome.point.or(odds.over_under_line);
                        }
                        "Under" => {
                            odds.under_odds = outcome.price;
                            if odds.over_under_line.is_none() {
                                odds.over_under_line = outcome.point;
                            }
                        }
                        _ => {}
                    }
                }
            }
            "spreads" => {
                for outcome in &market.outcomes {
                    if outcome.name == event.home_team {
                        odds.home_spread = outcome.point;
                        odds.home_spread_odds = outcome.price;
                    } else if outcome.name == event.away_team {
                        odds.away_spread = outcome.point;
                        odds.away_spread_odds = outcome.price;
                    }
                }
            }
            other => {
                warn!(market = other, "Ignoring unknown odds market");
            }
        }
    }

    odds
}

/// Scores arrive as a parallel name/score list; match entries back to the
/// home and away display names.
fn parse_scores(event: &OddsEvent) -> (Option<i64>, Option<i64>) {
    let Some(scores) = &event.scores else {
        return (None, None);
    };

    let mut home = None;
    let mut away = None;
    for entry in scores {
        let value = entry.score.as_ref().and_then(|v| match v {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.parse().ok(),
            _ => None,
        });
        if entry.name == event.home_team {
            home = value;
        } else if entry.name == event.away_team {
            away = value;
        }
    }
    (home, away)
}

fn game_from_odds(game: GameWithOdds) -> Game {
    Game {
        id: game.game_id,
        // Display names stand in for ids in the odds identifier space.
        home_team_id: game.home_team,
        away_team_id: game.away_team,
        scheduled_at: game.commence_time,
        status: if game.completed {
            "finished".to_string()
        } else {
            "scheduled".to_string()
        },
        // Odds events carry no season; assume the current one.
        season: DEFAULT_SEASON.to_string(),
        home_score: game.home_score,
        away_score: game.away_score,
        venue: None,
        attendance: None,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event_fixture() -> OddsEvent {
        serde_json::from_value(json!({
            "id": "e4c5d9b8",
            "sport_key": "basketball_nba",
            "commence_time": "2025-01-15T00:30:00Z",
            "home_team": "Boston Celtics",
            "away_team": "Miami Heat",
            "completed": false,
            "bookmakers": [{
                "key": "draftkings",
                "title": "DraftKings",
                "last_update": "2025-01-14T23:55:00Z",
                "markets": [
                    {"key": "h2h", "outcomes": [
                        {"name": "Boston Celtics", "price": 1.90},
                        {"name": "Miami Heat", "price": 1.95}
                    ]},
                    {"key": "totals", "outcomes": [
                        {"name": "Over", "price": 1.85, "point": 220.5},
                        {"name": "Under", "price": 1.95, "point": 220.5}
                    ]}
                ]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_h2h_and_totals_round_trip() {
        let game = parse_event_odds(&event_fixture());
        assert_eq!(game.game_id, "e4c5d9b8");
        assert_eq!(game.odds.len(), 1);

        let odds = &game.odds[0];
        assert_eq!(odds.bookmaker, "DraftKings");
        assert_eq!(odds.home_odds, Some(1.90));
        assert_eq!(odds.away_odds, Some(1.95));
        assert_eq!(odds.over_odds, Some(1.85));
        assert_eq!(odds.under_odds, Some(1.95));
        assert_eq!(odds.over_under_line, Some(220.5));
        assert_eq!(odds.draw_odds, None);

        // No spreads market in the payload: all spread fields stay unset.
        assert_eq!(odds.home_spread, None);
        assert_eq!(odds.home_spread_odds, None);
        assert_eq!(odds.away_spread, None);
        assert_eq!(odds.away_spread_odds, None);

        assert!(odds.last_update.is_some());
    }

    #[test]
    fn test_spreads_market_assigned_per_team() {
        let event: OddsEvent = serde_json::from_value(json!({
            "id": "e1",
            "home_team": "Boston Celtics",
            "away_team": "Miami Heat",
            "commence_time": "2025-01-15T00:30:00Z",
            "bookmakers": [{
                "title": "FanDuel",
                "markets": [{"key": "spreads", "outcomes": [
                    {"name": "Boston Celtics", "price": 1.91, "point": -6.5},
                    {"name": "Miami Heat", "price": 1.91, "point": 6.5}
                ]}]
            }]
        }))
        .unwrap();

        let odds = &parse_event_odds(&event).odds[0];
        assert_eq!(odds.home_spread, Some(-6.5));
        assert_eq!(odds.away_spread, Some(6.5));
        assert_eq!(odds.home_spread_odds, Some(1.91));
        assert_eq!(odds.home_odds, None);
    }

    #[test]
    fn test_scores_matched_by_display_name() {
        let event: OddsEvent = serde_json::from_value(json!({
            "id": "e2",
            "home_team": "Boston Celtics",
            "away_team": "Miami Heat",
            "commence_time": "2025-01-15T00:30:00Z",
            "completed": true,
            "scores": [
                {"name": "Miami Heat", "score": "112"},
                {"name": "Boston Celtics", "score": 118}
            ]
        }))
        .unwrap();

        let game = parse_event_odds(&event);
        assert!(game.completed);
        assert_eq!(game.home_score, Some(118));
        assert_eq!(game.away_score, Some(112));
        assert!(game.odds.is_empty());
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let event = event_fixture();
        assert_eq!(parse_event_odds(&event), parse_event_odds(&event));
    }

    #[test]
    fn test_games_adapted_from_odds_use_display_names_as_ids() {
        let game = game_from_odds(parse_event_odds(&event_fixture()));
        assert_eq!(game.home_team_id, "Boston Celtics");
        assert_eq!(game.away_team_id, "Miami Heat");
        assert_eq!(game.status, "scheduled");
    }

    #[test]
    fn test_empty_api_key_is_a_config_error() {
        assert!(matches!(
            OddsProvider::with_defaults(""),
            Err(ProviderError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_roster_capabilities_are_unsupported() {
        let provider = OddsProvider::with_defaults("test-key").unwrap();
        assert!(provider.get_teams(None).await.unwrap_err().is_unsupported());
        assert!(provider.get_team("1").await.unwrap_err().is_unsupported());
        assert!(provider
            .get_players(None)
            .await
            .unwrap_err()
            .is_unsupported());
        assert!(provider
            .get_team_stats("1", None)
            .await
            .unwrap_err()
            .is_unsupported());
    }
}
