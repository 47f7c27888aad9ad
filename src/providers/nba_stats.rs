//! stats.nba.com adapter.
//!
//! No API key, but the upstream rejects requests that do not look like
//! browser traffic, so every call carries a fixed browser-origin header set.
//! Every payload is a tabular result set: `resultSets[0]` holds parallel
//! `headers` and `rowSet` arrays that must be zipped back into records.
//! Team listings degrade to a static fallback table when the upstream is
//! unreachable or returns an empty shape.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use tracing::{info, warn};

use crate::api::errors::ProviderError;
use crate::api::executor::{base_headers, RequestExecutor};
use crate::api::provider::SportsProvider;
use crate::api::rate_limiter::RateLimiter;
use crate::data::models::{parse_iso_utc, Game, Player, StatMap, Team};

use super::fallback;

pub const BASE_URL: &str = "https://stats.nba.com/stats";
const PROVIDER_NAME: &str = "nba_stats";

/// Headers the stats upstream expects from a browser session.
const BROWSER_HEADERS: &[(&str, &str)] = &[
    ("Host", "stats.nba.com"),
    ("Referer", "https://www.nba.com/"),
    ("Origin", "https://www.nba.com"),
    ("x-nba-stats-origin", "stats"),
    ("x-nba-stats-token", "true"),
    ("Accept-Language", "en-US,en;q=0.9"),
    ("Cache-Control", "no-cache"),
    ("Pragma", "no-cache"),
    ("Sec-Fetch-Dest", "empty"),
    ("Sec-Fetch-Mode", "cors"),
    ("Sec-Fetch-Site", "same-site"),
];

pub struct NbaStatsProvider {
    executor: RequestExecutor,
}

impl NbaStatsProvider {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        max_retries: u32,
        rate_limit: usize,
    ) -> Result<Self, ProviderError> {
        let mut headers = base_headers();
        for (name, value) in BROWSER_HEADERS {
            headers.insert(
                *name,
                value
                    .parse()
                    .map_err(|_| ProviderError::Config(format!("invalid header {name}")))?,
            );
        }
        let rate_limiter = RateLimiter::per_minute(rate_limit)?;
        Ok(Self {
            executor: RequestExecutor::new(base_url, headers, timeout, max_retries, rate_limiter),
        })
    }

    /// Longer timeout and a conservative rate limit; the stats upstream is
    /// slow and quick to throttle.
    pub fn with_defaults() -> Result<Self, ProviderError> {
        Self::new(BASE_URL, Duration::from_secs(15), 3, 30)
    }

    /// Raw franchise listing without the static-table fallback. Health
    /// checks use this to tell a down upstream apart from the substitute.
    pub async fn fetch_live_teams(&self) -> Result<Vec<Team>, ProviderError> {
        let params = [("LeagueID", "00")];
        let response = self.executor.get("commonteamyears", Some(&params)).await?;
        Ok(teams_from_team_years(&response.data))
    }
}

#[async_trait]
impl SportsProvider for NbaStatsProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    /// Live listing with value-level fallback: an unreachable upstream or a
    /// structurally empty result substitutes the static table instead of
    /// failing the caller.
    async fn get_teams(&self, _league: Option<&str>) -> Result<Vec<Team>, ProviderError> {
        match self.fetch_live_teams().await {
            Ok(teams) if !teams.is_empty() => {
                info!(count = teams.len(), "Retrieved NBA teams");
                Ok(teams)
            }
            Ok(_) => {
                warn!("NBA stats returned zero teams, using fallback table");
                Ok(fallback::nba_teams())
            }
            Err(e) => {
                warn!(error = %e, "NBA stats unreachable, using fallback table");
                Ok(fallback::nba_teams())
            }
        }
    }

    async fn get_team(&self, team_id: &str) -> Result<Team, ProviderError> {
        let params = [("TeamID", team_id)];
        let response = self.executor.get("teaminfocommon", Some(&params)).await?;

        let row = first_row(&response.data)
            .ok_or_else(|| ProviderError::NotFound(format!("team {team_id} not found")))?;

        Ok(Team {
            id: row_string(&row, "TEAM_ID"),
            name: row_string(&row, "TEAM_NAME"),
            short_name: row_string(&row, "TEAM_ABBREVIATION"),
            city: row_string(&row, "TEAM_CITY"),
            league: "NBA".to_string(),
            conference: row_opt_string(&row, "TEAM_CONFERENCE"),
            division: row_opt_string(&row, "TEAM_DIVISION"),
            logo_url: None,
            primary_color: None,
            secondary_color: None,
            venue: None,
        })
    }

    async fn get_players(&self, team_id: Option<&str>) -> Result<Vec<Player>, ProviderError> {
        let mut params = vec![("IsOnlyCurrentSeason", "1")];
        if let Some(id) = team_id {
            params.push(("TeamID", id));
        }
        let response = self.executor.get("commonallplayers", Some(&params)).await?;

        let players: Vec<Player> = result_set_rows(&response.data)
            .iter()
            .filter_map(player_from_listing_row)
            .collect();

        info!(count = players.len(), "Retrieved NBA players");
        Ok(players)
    }

    async fn get_player(&self, player_id: &str) -> Result<Player, ProviderError> {
        let params = [("PlayerID", player_id)];
        let response = self.executor.get("commonplayerinfo", Some(&params)).await?;

        let row = first_row(&response.data)
            .ok_or_else(|| ProviderError::NotFound(format!("player {player_id} not found")))?;

        Ok(Player {
            id: row_string(&row, "PERSON_ID"),
            first_name: row_string(&row, "FIRST_NAME"),
            last_name: row_string(&row, "LAST_NAME"),
            team_id: row_string(&row, "TEAM_ID"),
            position: row_string(&row, "POSITION"),
            jersey_number: row_u64(&row, "JERSEY").map(|n| n as u32),
            height: row_opt_string(&row, "HEIGHT"),
            weight: row_u64(&row, "WEIGHT").map(|w| w as u32),
            date_of_birth: row
                .get("BIRTHDATE")
                .and_then(Value::as_str)
                .and_then(|s| parse_iso_utc(s).map(|dt| dt.date_naive())),
            nationality: row_opt_string(&row, "COUNTRY"),
        })
    }

    async fn get_games(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        team_id: Option<&str>,
    ) -> Result<Vec<Game>, ProviderError> {
        let date_from = start_date.map(|d| d.format("%m/%d/%Y").to_string());
        let date_to = end_date.map(|d| d.format("%m/%d/%Y").to_string());

        let mut params: Vec<(&str, &str)> = Vec::new();
        if let Some(ref from) = date_from {
            params.push(("DateFrom", from));
        }
        if let Some(ref to) = date_to {
            params.push(("DateTo", to));
        }
        if let Some(id) = team_id {
            params.push(("TeamID", id));
        }

        let response = self
            .executor
            .get(
                "leaguegamefinder",
                if params.is_empty() { None } else { Some(&params) },
            )
            .await?;

        let games = games_from_finder_rows(&response.data);
        info!(count = games.len(), "Retrieved NBA games");
        Ok(games)
    }

    async fn get_game(&self, game_id: &str) -> Result<Game, ProviderError> {
        let params = [("GameID", game_id)];
        let response = self.executor.get("boxscoresummaryv2", Some(&params)).await?;

        let row = first_row(&response.data)
            .ok_or_else(|| ProviderError::NotFound(format!("game {game_id} not found")))?;

        Ok(Game {
            id: game_id.to_string(),
            home_team_id: row_string(&row, "HOME_TEAM_ID"),
            away_team_id: row_string(&row, "VISITOR_TEAM_ID"),
            scheduled_at: parse_game_date(row.get("GAME_DATE_EST").and_then(Value::as_str)),
            status: row_opt_string(&row, "GAME_STATUS_TEXT")
                .unwrap_or_else(|| "finished".to_string()),
            season: row_string(&row, "SEASON"),
            home_score: row_i64(&row, "HOME_TEAM_PTS"),
            away_score: row_i64(&row, "VISITOR_TEAM_PTS"),
            venue: None,
            attendance: row_u64(&row, "ATTENDANCE"),
        })
    }

    async fn get_team_stats(
        &self,
        team_id: &str,
        season: Option<&str>,
    ) -> Result<StatMap, ProviderError> {
        let mut params = vec![("TeamID", team_id)];
        if let Some(s) = season {
            params.push(("Season", s));
        }
        let response = self
            .executor
            .get("teamdashboardbygeneralsplits", Some(&params))
            .await?;
        Ok(first_row(&response.data).unwrap_or_default())
    }

    async fn get_player_stats(
        &self,
        player_id: &str,
        season: Option<&str>,
    ) -> Result<StatMap, ProviderError> {
        let mut params = vec![("PlayerID", player_id)];
        if let Some(s) = season {
            params.push(("Season", s));
        }
        let response = self
            .executor
            .get("playerdashboardbygeneralsplits", Some(&params))
            .await?;
        Ok(first_row(&response.data).unwrap_or_default())
    }
}

// =============================================================================
// Result-set reconstruction
// =============================================================================

/// Zip `resultSets[0].headers` with each `rowSet` row into record maps.
pub(crate) fn result_set_rows(data: &Value) -> Vec<StatMap> {
    let result_set = data.get("resultSets").and_then(|r| r.get(0));

    let headers: Vec<String> = result_set
        .and_then(|r| r.get("headers"))
        .and_then(Value::as_array)
        .map(|h| {
            h.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    result_set
        .and_then(|r| r.get("rowSet"))
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .filter_map(Value::as_array)
                .map(|row| headers.iter().cloned().zip(row.iter().cloned()).collect())
                .collect()
        })
        .unwrap_or_default()
}

fn first_row(data: &Value) -> Option<StatMap> {
    result_set_rows(data).into_iter().next()
}

fn row_string(row: &StatMap, key: &str) -> String {
    match row.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn row_opt_string(row: &StatMap, key: &str) -> Option<String> {
    Some(row_string(row, key)).filter(|s| !s.is_empty())
}

fn row_i64(row: &StatMap, key: &str) -> Option<i64> {
    match row.get(key) {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    }
}

fn row_u64(row: &StatMap, key: &str) -> Option<u64> {
    match row.get(key) {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    }
}

/// Current team rows from `commonteamyears`: the listing spans defunct
/// franchises, so keep only rows whose MAX_YEAR matches the latest year.
pub(crate) fn teams_from_team_years(data: &Value) -> Vec<Team> {
    let rows = result_set_rows(data);
    let current_year = rows
        .iter()
        .filter_map(|row| row_string(row, "MAX_YEAR").parse::<i64>().ok())
        .max();
    let Some(current_year) = current_year else {
        return Vec::new();
    };

    rows.iter()
        .filter(|row| {
            row_string(row, "MAX_YEAR").parse::<i64>().ok() == Some(current_year)
        })
        .map(|row| Team {
            id: row_string(row, "TEAM_ID"),
            name: row_string(row, "TEAM_NAME"),
            short_name: row_string(row, "ABBREVIATION"),
            city: row_string(row, "TEAM_CITY"),
            league: "NBA".to_string(),
            conference: row_opt_string(row, "CONFERENCE"),
            division: row_opt_string(row, "DIVISION"),
            logo_url: None,
            primary_color: None,
            secondary_color: None,
            venue: None,
        })
        .filter(|team| !team.id.is_empty())
        .collect()
}

/// The game finder returns one row per participating side; keep the first
/// row seen for each game id.
pub(crate) fn games_from_finder_rows(data: &Value) -> Vec<Game> {
    let mut seen = std::collections::HashSet::new();
    result_set_rows(data)
        .iter()
        .filter_map(|row| {
            let game_id = row_string(row, "GAME_ID");
            if game_id.is_empty() || !seen.insert(game_id.clone()) {
                return None;
            }
            Some(Game {
                id: game_id,
                // The tabular finder only carries the reporting side's team
                // id; the opponent requires a per-game lookup.
                home_team_id: row_string(row, "TEAM_ID"),
                away_team_id: String::new(),
                scheduled_at: parse_game_date(row.get("GAME_DATE").and_then(Value::as_str)),
                status: if row.get("WL").map(|v| !v.is_null()).unwrap_or(false) {
                    "finished".to_string()
                } else {
                    "scheduled".to_string()
                },
                season: row_string(row, "SEASON_ID"),
                home_score: row_i64(row, "PTS"),
                away_score: row_i64(row, "OPP_PTS"),
                venue: None,
                attendance: None,
            })
        })
        .collect()
}

fn parse_game_date(raw: Option<&str>) -> chrono::DateTime<chrono::Utc> {
    let Some(raw) = raw else {
        return chrono::Utc::now();
    };
    parse_iso_utc(raw)
        .or_else(|| {
            raw.parse::<NaiveDate>()
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        })
        .unwrap_or_else(chrono::Utc::now)
}

// =============================================================================
// Row conversion
// =============================================================================

/// `commonallplayers` rows carry only a combined display name; rows with no
/// name data at all are discarded.
fn player_from_listing_row(row: &StatMap) -> Option<Player> {
    let full_name = row_string(row, "DISPLAY_FIRST_LAST");
    let (first_name, last_name) = match full_name.split_once(' ') {
        Some((first, rest)) => (first.to_string(), rest.to_string()),
        None => (full_name.clone(), String::new()),
    };
    if first_name.is_empty() && last_name.is_empty() {
        return None;
    }

    Some(Player {
        id: row_string(row, "PERSON_ID"),
        first_name,
        last_name,
        team_id: row_string(row, "TEAM_ID"),
        // Position is not part of the listing result set.
        position: String::new(),
        jersey_number: None,
        height: None,
        weight: None,
        date_of_birth: None,
        nationality: None,
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn team_years_fixture() -> Value {
        json!({
            "resultSets": [{
                "headers": ["LEAGUE_ID", "TEAM_ID", "MIN_YEAR", "MAX_YEAR", "ABBREVIATION"],
                "rowSet": [
                    ["00", 1610612738, "1946", "2025", "BOS"],
                    ["00", 1610612748, "1988", "2025", "MIA"],
                    ["00", 1610610024, "1946", "1949", "WAT"]
                ]
            }]
        })
    }

    #[test]
    fn test_result_set_zip_reconstruction() {
        let rows = result_set_rows(&team_years_fixture());
        assert_eq!(rows.len(), 3);
        assert_eq!(row_string(&rows[0], "ABBREVIATION"), "BOS");
        assert_eq!(row_string(&rows[0], "TEAM_ID"), "1610612738");
        assert_eq!(row_string(&rows[2], "MAX_YEAR"), "1949");
    }

    #[test]
    fn test_team_years_filters_defunct_franchises() {
        let teams = teams_from_team_years(&team_years_fixture());
        assert_eq!(teams.len(), 2);
        assert!(teams.iter().all(|t| t.league == "NBA"));
        assert!(teams.iter().any(|t| t.short_name == "BOS"));
        assert!(!teams.iter().any(|t| t.short_name == "WAT"));
    }

    #[test]
    fn test_empty_result_set_yields_no_teams() {
        let empty = json!({"resultSets": [{"headers": [], "rowSet": []}]});
        assert!(teams_from_team_years(&empty).is_empty());
        assert!(result_set_rows(&json!({})).is_empty());
    }

    #[test]
    fn test_game_finder_dedupes_both_sides() {
        let fixture = json!({
            "resultSets": [{
                "headers": ["GAME_ID", "TEAM_ID", "GAME_DATE", "WL", "PTS", "SEASON_ID"],
                "rowSet": [
                    ["0022400501", 1610612738, "2025-01-15", "W", 118, "22024"],
                    ["0022400501", 1610612748, "2025-01-15", "L", 112, "22024"],
                    ["0022400502", 1610612747, "2025-01-16", null, null, "22024"]
                ]
            }]
        });
        let games = games_from_finder_rows(&fixture);
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].id, "0022400501");
        assert_eq!(games[0].status, "finished");
        assert_eq!(games[0].home_score, Some(118));
        assert_eq!(games[1].status, "scheduled");
        assert_eq!(
            games[0].scheduled_at.to_rfc3339(),
            "2025-01-15T00:00:00+00:00"
        );
    }

    #[test]
    fn test_listing_row_discards_nameless_players() {
        let named = json!({
            "resultSets": [{
                "headers": ["PERSON_ID", "DISPLAY_FIRST_LAST", "TEAM_ID"],
                "rowSet": [
                    [203999, "Nikola Jokic", 1610612743],
                    [204000, "", 1610612743]
                ]
            }]
        });
        let players: Vec<Player> = result_set_rows(&named)
            .iter()
            .filter_map(player_from_listing_row)
            .collect();
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].first_name, "Nikola");
        assert_eq!(players[0].last_name, "Jokic");
        assert_eq!(players[0].team_id, "1610612743");
    }

    #[tokio::test]
    async fn test_unreachable_upstream_substitutes_fallback_teams() {
        // Nothing listens on this port; the transport error must degrade to
        // the static table, not an error.
        let provider = NbaStatsProvider::new(
            "http://127.0.0.1:9",
            Duration::from_millis(250),
            0,
            30,
        )
        .unwrap();
        let teams = provider.get_teams(None).await.unwrap();
        assert_eq!(teams.len(), 30);
    }
}
