//! Normalized entity model.
//!
//! Provider-agnostic shapes every adapter parses its upstream payloads
//! into. All entities are transient: built fresh per request, serialized
//! straight to JSON by the presentation layer, never persisted here.
//!
//! Identifiers are provider-scoped opaque strings. A team id from one
//! provider means nothing to another, and odds providers key games by team
//! display name instead of any id at all; the aggregation layer joins those
//! spaces by fuzzy name match rather than pretending they are one scheme.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Stat-name to value mapping returned by the stats operations.
pub type StatMap = HashMap<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub short_name: String,
    pub city: String,
    pub league: String,
    #[serde(default)]
    pub conference: Option<String>,
    #[serde(default)]
    pub division: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub primary_color: Option<String>,
    #[serde(default)]
    pub secondary_color: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    /// Weak reference by id; existence is not enforced.
    pub team_id: String,
    pub position: String,
    #[serde(default)]
    pub jersey_number: Option<u32>,
    #[serde(default)]
    pub height: Option<String>,
    #[serde(default)]
    pub weight: Option<u32>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub nationality: Option<String>,
}

impl Player {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: String,
    pub home_team_id: String,
    pub away_team_id: String,
    /// Provider-local timezone semantics preserved as given; defaults to
    /// "now" when the upstream date is unparsable.
    pub scheduled_at: DateTime<Utc>,
    /// Free-form provider status, not a closed enum at this layer.
    pub status: String,
    pub season: String,
    #[serde(default)]
    pub home_score: Option<i64>,
    #[serde(default)]
    pub away_score: Option<i64>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub attendance: Option<u64>,
}

/// One bookmaker's odds for one game. Teams are referenced by display name
/// because odds providers do not share id space with sports providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BettingOdds {
    pub game_id: String,
    pub bookmaker: String,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub home_odds: Option<f64>,
    #[serde(default)]
    pub away_odds: Option<f64>,
    #[serde(default)]
    pub draw_odds: Option<f64>,
    #[serde(default)]
    pub over_under_line: Option<f64>,
    #[serde(default)]
    pub over_odds: Option<f64>,
    #[serde(default)]
    pub under_odds: Option<f64>,
    #[serde(default)]
    pub home_spread: Option<f64>,
    #[serde(default)]
    pub home_spread_odds: Option<f64>,
    #[serde(default)]
    pub away_spread: Option<f64>,
    #[serde(default)]
    pub away_spread_odds: Option<f64>,
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
}

impl BettingOdds {
    pub fn new(game_id: &str, bookmaker: &str, home_team: &str, away_team: &str) -> Self {
        Self {
            game_id: game_id.to_string(),
            bookmaker: bookmaker.to_string(),
            home_team: home_team.to_string(),
            away_team: away_team.to_string(),
            home_odds: None,
            away_odds: None,
            draw_odds: None,
            over_under_line: None,
            over_odds: None,
            under_odds: None,
            home_spread: None,
            home_spread_odds: None,
            away_spread: None,
            away_spread_odds: None,
            last_update: None,
        }
    }
}

/// Game record from the odds provider, owning one `BettingOdds` per
/// bookmaker. The odds list is empty, never absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameWithOdds {
    pub game_id: String,
    pub home_team: String,
    pub away_team: String,
    pub sport: String,
    pub commence_time: DateTime<Utc>,
    #[serde(default)]
    pub home_score: Option<i64>,
    #[serde(default)]
    pub away_score: Option<i64>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub odds: Vec<BettingOdds>,
}

/// Entry in the odds provider's sports catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SportInfo {
    pub key: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub active: bool,
}

/// Odds provider account quota counters, read from response headers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageInfo {
    pub requests_remaining: Option<u64>,
    pub requests_used: Option<u64>,
    pub requests_last: Option<u64>,
}

/// Parse an ISO-8601 / RFC-3339 timestamp, tolerating a date-only form.
pub fn parse_iso_utc(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    // Some endpoints emit naive timestamps without an offset.
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

/// Parse a timestamp, defaulting to "now" when unparsable. Documented
/// fallback for provider payloads with missing or mangled dates.
pub fn parse_iso_utc_or_now(raw: &str) -> DateTime<Utc> {
    parse_iso_utc(raw).unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_iso_with_zulu_offset() {
        let dt = parse_iso_utc("2025-01-15T19:30:00Z").unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-01-15T19:30:00+00:00");
    }

    #[test]
    fn test_parse_iso_naive_timestamp() {
        let dt = parse_iso_utc("2025-01-15T19:30:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-01-15T19:30:00+00:00");
    }

    #[test]
    fn test_unparsable_date_falls_back_to_now() {
        let before = Utc::now();
        let dt = parse_iso_utc_or_now("not a date");
        assert!(dt >= before);
    }

    #[test]
    fn test_game_with_odds_defaults_to_empty_odds() {
        let game: GameWithOdds = serde_json::from_str(
            r#"{
                "game_id": "g1",
                "home_team": "Boston Celtics",
                "away_team": "Miami Heat",
                "sport": "basketball_nba",
                "commence_time": "2025-01-15T19:30:00Z"
            }"#,
        )
        .unwrap();
        assert!(game.odds.is_empty());
        assert!(!game.completed);
    }
}
