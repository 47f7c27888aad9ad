//! ESPN public API adapter.
//!
//! Teams, rosters, schedules, and game summaries from the ESPN site API.
//! No API key is required; one is attached as `X-API-Key` when configured.
//! ESPN payloads are deeply nested and irregular, so parsing walks raw
//! `serde_json::Value` trees with defensive defaults instead of rigid
//! deserialize structs.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, info};

use crate::api::errors::ProviderError;
use crate::api::executor::{base_headers, RequestExecutor};
use crate::api::provider::SportsProvider;
use crate::api::rate_limiter::RateLimiter;
use crate::data::models::{parse_iso_utc, parse_iso_utc_or_now, Game, Player, StatMap, Team};

pub const BASE_URL: &str = "https://site.api.espn.com/apis/site/v2/sports";
const PROVIDER_NAME: &str = "espn";

/// Smallest logo resolution considered dashboard-quality.
const MIN_LOGO_WIDTH: u64 = 500;

pub struct EspnProvider {
    executor: RequestExecutor,
}

impl EspnProvider {
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        timeout: Duration,
        max_retries: u32,
        rate_limit: usize,
    ) -> Result<Self, ProviderError> {
        let mut headers = base_headers();
        if let Some(key) = api_key {
            headers.insert(
                "X-API-Key",
                key.parse()
                    .map_err(|_| ProviderError::Config("invalid ESPN API key".to_string()))?,
            );
        }
        let rate_limiter = RateLimiter::per_minute(rate_limit)?;
        Ok(Self {
            executor: RequestExecutor::new(base_url, headers, timeout, max_retries, rate_limiter),
        })
    }

    pub fn with_defaults(api_key: Option<&str>) -> Result<Self, ProviderError> {
        Self::new(BASE_URL, api_key, Duration::from_secs(10), 3, 100)
    }

    fn league_path(league: Option<&str>) -> (String, String) {
        let sport = league.unwrap_or("basketball").to_lowercase();
        let league_name = if sport == "basketball" {
            "nba".to_string()
        } else {
            sport.clone()
        };
        (sport, league_name)
    }
}

#[async_trait]
impl SportsProvider for EspnProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn get_teams(&self, league: Option<&str>) -> Result<Vec<Team>, ProviderError> {
        let (sport, league_name) = Self::league_path(league);
        let response = self
            .executor
            .get(&format!("{sport}/{league_name}/teams"), None)
            .await?;

        let teams = parse_teams(&response.data, &league_name.to_uppercase());
        info!(count = teams.len(), league = %league_name, "Retrieved ESPN teams");
        Ok(teams)
    }

    async fn get_team(&self, team_id: &str) -> Result<Team, ProviderError> {
        let response = self
            .executor
            .get(&format!("basketball/nba/teams/{team_id}"), None)
            .await?;

        let team_info = response.data.get("team").filter(|v| v.is_object());
        match team_info {
            Some(info) => Ok(parse_team(info, "NBA")),
            None => Err(ProviderError::NotFound(format!("team {team_id} not found"))),
        }
    }

    async fn get_players(&self, team_id: Option<&str>) -> Result<Vec<Player>, ProviderError> {
        let team_id = match team_id {
            Some(id) => id,
            None => {
                // No league-wide roster endpoint; fan out across all teams.
                // The shared rate limiter keeps the burst within budget.
                let teams = self.get_teams(Some("basketball")).await?;
                let rosters = futures::future::join_all(
                    teams.iter().map(|team| self.get_players(Some(&team.id))),
                )
                .await;
                let mut all_players = Vec::new();
                for roster in rosters {
                    all_players.extend(roster?);
                }
                return Ok(all_players);
            }
        };

        let response = self
            .executor
            .get(&format!("basketball/nba/teams/{team_id}/roster"), None)
            .await?;

        let players = parse_roster(&response.data, team_id);
        debug!(count = players.len(), team_id, "Retrieved ESPN roster");
        Ok(players)
    }

    async fn get_player(&self, player_id: &str) -> Result<Player, ProviderError> {
        let response = self
            .executor
            .get(&format!("basketball/nba/athletes/{player_id}"), None)
            .await?;

        let athlete = response
            .data
            .get("athlete")
            .filter(|v| v.is_object())
            .ok_or_else(|| ProviderError::NotFound(format!("player {player_id} not found")))?;

        let team_id = athlete
            .get("team")
            .map(|t| id_string(t, "id"))
            .unwrap_or_default();

        parse_athlete(athlete, &team_id)
            .ok_or_else(|| ProviderError::NotFound(format!("player {player_id} not found")))
    }

    async fn get_games(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        team_id: Option<&str>,
    ) -> Result<Vec<Game>, ProviderError> {
        let mut dates = start_date
            .map(|d| d.format("%Y%m%d").to_string())
            .unwrap_or_default();
        if let (Some(_), Some(end)) = (start_date, end_date) {
            dates = format!("{dates}-{}", end.format("%Y%m%d"));
        }

        let endpoint = match team_id {
            Some(id) => format!("basketball/nba/teams/{id}/schedule"),
            None => "basketball/nba/scoreboard".to_string(),
        };
        let params: Vec<(&str, &str)> = if dates.is_empty() {
            Vec::new()
        } else {
            vec![("dates", dates.as_str())]
        };

        let response = self
            .executor
            .get(&endpoint, if params.is_empty() { None } else { Some(&params) })
            .await?;

        let games = parse_events(&response.data);
        info!(count = games.len(), "Retrieved ESPN games");
        Ok(games)
    }

    async fn get_game(&self, game_id: &str) -> Result<Game, ProviderError> {
        let params = [("event", game_id)];
        let response = self
            .executor
            .get("basketball/nba/summary", Some(&params))
            .await?;

        parse_summary(game_id, &response.data)
            .ok_or_else(|| ProviderError::NotFound(format!("game {game_id} not found")))
    }

    async fn get_team_stats(
        &self,
        team_id: &str,
        season: Option<&str>,
    ) -> Result<StatMap, ProviderError> {
        let params: Vec<(&str, &str)> = season.map(|s| vec![("season", s)]).unwrap_or_default();
        let response = self
            .executor
            .get(
                &format!("basketball/nba/teams/{team_id}/statistics"),
                if params.is_empty() { None } else { Some(&params) },
            )
            .await?;

        Ok(stats_object(&response.data))
    }

    async fn get_player_stats(
        &self,
        player_id: &str,
        season: Option<&str>,
    ) -> Result<StatMap, ProviderError> {
        let params: Vec<(&str, &str)> = season.map(|s| vec![("season", s)]).unwrap_or_default();
        let response = self
            .executor
            .get(
                &format!("basketball/nba/athletes/{player_id}/statistics"),
                if params.is_empty() { None } else { Some(&params) },
            )
            .await?;

        Ok(stats_object(&response.data))
    }
}

// =============================================================================
// Pure payload parsers
// =============================================================================

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Ids arrive as either JSON strings or numbers depending on the endpoint.
fn id_string(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Teams payload: `sports[0].leagues[0].teams[].team`.
fn parse_teams(data: &Value, league: &str) -> Vec<Team> {
    data.get("sports")
        .and_then(|s| s.get(0))
        .and_then(|s| s.get("leagues"))
        .and_then(|l| l.get(0))
        .and_then(|l| l.get("teams"))
        .and_then(Value::as_array)
        .map(|teams| {
            teams
                .iter()
                .filter_map(|entry| entry.get("team"))
                .map(|info| parse_team(info, league))
                .collect()
        })
        .unwrap_or_default()
}

fn parse_team(info: &Value, league: &str) -> Team {
    Team {
        id: id_string(info, "id"),
        name: str_field(info, "displayName"),
        short_name: str_field(info, "abbreviation"),
        city: str_field(info, "location"),
        league: league.to_string(),
        conference: None,
        division: None,
        logo_url: pick_logo_url(info.get("logos")),
        primary_color: info
            .get("color")
            .and_then(Value::as_str)
            .map(str::to_string),
        secondary_color: info
            .get("alternateColor")
            .and_then(Value::as_str)
            .map(str::to_string),
        venue: venue_name(info.get("venue")),
    }
}

/// Pick the best logo asset: first entry at or above the minimum width,
/// otherwise the first entry at all.
fn pick_logo_url(logos: Option<&Value>) -> Option<String> {
    let logos = logos.and_then(Value::as_array)?;
    let href = |logo: &Value| logo.get("href").and_then(Value::as_str).map(str::to_string);

    logos
        .iter()
        .find(|logo| logo.get("width").and_then(Value::as_u64).unwrap_or(0) >= MIN_LOGO_WIDTH)
        .and_then(href)
        .or_else(|| logos.first().and_then(href))
}

fn venue_name(venue: Option<&Value>) -> Option<String> {
    let venue = venue?;
    venue
        .get("fullName")
        .or_else(|| venue.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn parse_roster(data: &Value, team_id: &str) -> Vec<Player> {
    data.get("athletes")
        .and_then(Value::as_array)
        .map(|athletes| {
            athletes
                .iter()
                .map(|entry| entry.get("athlete").filter(|v| v.is_object()).unwrap_or(entry))
                .filter_map(|info| parse_athlete(info, team_id))
                .collect()
        })
        .unwrap_or_default()
}

/// Returns `None` when no name data exists at all; such records are
/// discarded rather than surfaced as errors.
fn parse_athlete(info: &Value, team_id: &str) -> Option<Player> {
    let mut first_name = str_field(info, "firstName");
    let mut last_name = str_field(info, "lastName");

    if first_name.is_empty() && last_name.is_empty() {
        let display_name = str_field(info, "displayName");
        (first_name, last_name) = split_display_name(&display_name);
    }
    if first_name.is_empty() && last_name.is_empty() {
        return None;
    }

    Some(Player {
        id: id_string(info, "id"),
        first_name,
        last_name,
        team_id: team_id.to_string(),
        position: info
            .get("position")
            .map(|p| str_field(p, "abbreviation"))
            .unwrap_or_default(),
        jersey_number: info
            .get("jersey")
            .and_then(|j| j.as_str().and_then(|s| s.parse().ok()).or(j.as_u64().map(|n| n as u32))),
        height: info.get("height").map(json_scalar_string),
        weight: info.get("weight").and_then(Value::as_u64).map(|w| w as u32),
        date_of_birth: info
            .get("dateOfBirth")
            .and_then(Value::as_str)
            .and_then(|s| parse_iso_utc(s).map(|dt| dt.date_naive()).or_else(|| s.parse().ok())),
        nationality: info
            .get("citizenship")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

fn split_display_name(display_name: &str) -> (String, String) {
    match display_name.split_once(' ') {
        Some((first, rest)) => (first.to_string(), rest.to_string()),
        None => (display_name.to_string(), String::new()),
    }
}

fn json_scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Scoreboard / schedule payload: `events[].competitions[0].competitors`.
fn parse_events(data: &Value) -> Vec<Game> {
    data.get("events")
        .and_then(Value::as_array)
        .map(|events| events.iter().filter_map(parse_event).collect())
        .unwrap_or_default()
}

fn parse_event(event: &Value) -> Option<Game> {
    let competition = event.get("competitions").and_then(|c| c.get(0))?;
    let competitors = competition.get("competitors").and_then(Value::as_array)?;

    let side = |home_away: &str| {
        competitors
            .iter()
            .find(|c| c.get("homeAway").and_then(Value::as_str) == Some(home_away))
    };
    let home = side("home");
    let away = side("away");

    let team_id = |competitor: Option<&Value>| {
        competitor
            .and_then(|c| c.get("team"))
            .map(|t| id_string(t, "id"))
            .unwrap_or_default()
    };
    let score = |competitor: Option<&Value>| {
        competitor.and_then(|c| c.get("score")).and_then(|s| match s {
            Value::String(raw) => raw.parse().ok(),
            Value::Number(n) => n.as_i64(),
            _ => None,
        })
    };

    Some(Game {
        id: id_string(event, "id"),
        home_team_id: team_id(home),
        away_team_id: team_id(away),
        scheduled_at: parse_iso_utc_or_now(&str_field(event, "date")),
        status: event
            .get("status")
            .and_then(|s| s.get("type"))
            .map(|t| str_field(t, "description"))
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| "scheduled".to_string()),
        season: event
            .get("season")
            .map(|s| id_string(s, "year"))
            .unwrap_or_default(),
        home_score: score(home),
        away_score: score(away),
        venue: venue_name(competition.get("venue")),
        attendance: competition.get("attendance").and_then(Value::as_u64),
    })
}

/// Game summary payload: `header.competition.competitors`.
fn parse_summary(game_id: &str, data: &Value) -> Option<Game> {
    let header = data.get("header")?;
    let competition = header.get("competition")?;
    let competitors = competition.get("competitors").and_then(Value::as_array)?;
    if competitors.is_empty() {
        return None;
    }

    // Summary competitors carry the same shape as scoreboard events; reuse
    // the event parser by synthesizing the event envelope around them.
    let synthetic = serde_json::json!({
        "id": game_id,
        "date": header.get("date").cloned().unwrap_or_default(),
        "status": competition.get("status").cloned()
            .or_else(|| header.get("status").cloned())
            .unwrap_or_default(),
        "season": header.get("season").cloned().unwrap_or_default(),
        "competitions": [competition.clone()],
    });
    parse_event(&synthetic)
}

fn stats_object(data: &Value) -> StatMap {
    data.get("stats")
        .and_then(Value::as_object)
        .map(|obj| obj.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default()
}

// =============================================================================
// Tests
// =============================================================================
