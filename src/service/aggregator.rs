//! Cross-provider aggregation.
//!
//! `DataService` fans out to the sports and odds providers concurrently and
//! folds the results into dashboard-ready views. Every provider contribution
//! is best-effort: a failed or unconfigured provider degrades its slice of
//! the view (empty odds, fallback team names, placeholder matches) and is
//! logged, but never fails the caller.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::api::errors::ProviderError;
use crate::api::provider::SportsProvider;
use crate::config::Settings;
use crate::data::models::{BettingOdds, Game, GameWithOdds, Player, StatMap, Team};
use crate::providers::espn::{self, EspnProvider};
use crate::providers::nba_stats::{self, NbaStatsProvider};
use crate::providers::odds_api::{self, OddsProvider, DEFAULT_MARKETS, DEFAULT_REGIONS, DEFAULT_SPORT};

/// Dashboard shows at most this many matches.
const MAX_DASHBOARD_MATCHES: usize = 10;
/// Placeholder matches synthesized when no live games are available.
const PLACEHOLDER_MATCHES: usize = 3;
/// Roster size cap per side in the match detail view.
const MAX_ROSTER_PLAYERS: usize = 15;

// =============================================================================
// View types
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct DashboardMatch {
    pub id: String,
    pub home_team: String,
    pub away_team: String,
    pub scheduled_at: DateTime<Utc>,
    /// upcoming, live, or completed.
    pub status: String,
    /// American-odds display string for the home side, when odds matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub odds_display: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub away_score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchDetail {
    pub game: Game,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_team: Option<Team>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub away_team: Option<Team>,
    pub home_roster: Vec<Player>,
    pub away_roster: Vec<Player>,
    pub home_stats: StatMap,
    pub away_stats: StatMap,
    pub odds: Vec<BettingOdds>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamStatsSummary {
    pub total_teams: usize,
    pub by_conference: HashMap<String, usize>,
    pub by_division: HashMap<String, usize>,
    /// Provider name to whether it contributed live data.
    pub sources: HashMap<String, bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    /// Upstream answered but returned zero records.
    Degraded,
    Down,
    /// Optional credential missing, provider never constructed.
    NotConfigured,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub espn: HealthStatus,
    pub nba_stats: HealthStatus,
    pub odds: HealthStatus,
    pub checked_at: DateTime<Utc>,
}

impl HealthReport {
    /// True when every configured provider is at least reachable.
    pub fn is_operational(&self) -> bool {
        [self.espn, self.nba_stats, self.odds]
            .iter()
            .all(|s| *s != HealthStatus::Down)
    }
}

// =============================================================================
// Service
// =============================================================================

pub struct DataService {
    espn: EspnProvider,
    nba: NbaStatsProvider,
    odds: Option<OddsProvider>,
}

impl DataService {
    pub fn new(settings: &Settings) -> Result<Self, ProviderError> {
        let timeout = std::time::Duration::from_secs(settings.request_timeout_secs);

        let espn_key = if settings.espn_api_key.is_empty() {
            None
        } else {
            Some(settings.espn_api_key.as_str())
        };
        let espn = EspnProvider::new(
            espn::BASE_URL,
            espn_key,
            timeout,
            settings.max_retries,
            settings.espn_rate_limit,
        )?;
        let nba = NbaStatsProvider::new(
            nba_stats::BASE_URL,
            timeout,
            settings.max_retries,
            settings.nba_rate_limit,
        )?;
        let odds = if settings.odds_configured() {
            Some(OddsProvider::new(
                odds_api::BASE_URL,
                &settings.odds_api_key,
                timeout,
                settings.max_retries,
                settings.odds_rate_limit,
            )?)
        } else {
            info!("ODDS_API_KEY not set, odds provider disabled");
            None
        };

        Ok(Self { espn, nba, odds })
    }

    /// Assemble from pre-built providers, e.g. ones pointed at a non-default
    /// base URL.
    pub fn with_providers(
        espn: EspnProvider,
        nba: NbaStatsProvider,
        odds: Option<OddsProvider>,
    ) -> Self {
        Self { espn, nba, odds }
    }

    /// Today's matches enriched with betting odds, capped at ten. Never
    /// empty: with no live games, placeholder upcoming matchups are
    /// synthesized from known teams.
    pub async fn get_dashboard_matches(&self) -> Vec<DashboardMatch> {
        let today = Utc::now().date_naive();
        let (games, teams, odds) = tokio::join!(
            self.espn.get_games(Some(today), None, None),
            self.get_dashboard_teams(),
            self.fetch_odds(),
        );

        let games = match games {
            Ok(games) => games,
            Err(e) => {
                warn!(error = %e, "Games fetch failed, dashboard degrades to placeholders");
                Vec::new()
            }
        };

        if games.is_empty() {
            return placeholder_matches(&teams);
        }

        let matches: Vec<DashboardMatch> = games
            .iter()
            .take(MAX_DASHBOARD_MATCHES)
            .map(|game| {
                let home_name = team_display_name(&teams, &game.home_team_id);
                let away_name = team_display_name(&teams, &game.away_team_id);
                let odds_display = find_game_odds(&odds, &home_name, &away_name)
                    .and_then(average_home_odds)
                    .map(american_odds_display);
                DashboardMatch {
                    id: game.id.clone(),
                    home_team: home_name,
                    away_team: away_name,
                    scheduled_at: game.scheduled_at,
                    status: dashboard_status(&game.status).to_string(),
                    odds_display,
                    home_score: game.home_score,
                    away_score: game.away_score,
                    venue: game.venue.clone(),
                }
            })
            .collect();

        info!(count = matches.len(), "Built dashboard matches view");
        matches
    }

    /// League teams, preferring ESPN and degrading to the stats provider
    /// (which itself degrades to the static table).
    pub async fn get_dashboard_teams(&self) -> Vec<Team> {
        match self.espn.get_teams(None).await {
            Ok(teams) if !teams.is_empty() => teams,
            Ok(_) => {
                warn!("ESPN returned no teams, using stats provider");
                self.nba.get_teams(None).await.unwrap_or_default()
            }
            Err(e) => {
                warn!(error = %e, "ESPN teams fetch failed, using stats provider");
                self.nba.get_teams(None).await.unwrap_or_default()
            }
        }
    }

    /// Team counts by conference and division, with a per-source live map.
    pub async fn get_team_stats_summary(&self) -> TeamStatsSummary {
        let (espn_teams, nba_teams) = tokio::join!(
            self.espn.get_teams(None),
            self.nba.fetch_live_teams(),
        );

        let mut sources = HashMap::new();
        sources.insert(
            "espn".to_string(),
            matches!(&espn_teams, Ok(t) if !t.is_empty()),
        );
        sources.insert(
            "nba_stats".to_string(),
            matches!(&nba_teams, Ok(t) if !t.is_empty()),
        );
        sources.insert("odds_api".to_string(), self.odds.is_some());

        let teams = match espn_teams {
            Ok(t) if !t.is_empty() => t,
            _ => self.nba.get_teams(None).await.unwrap_or_default(),
        };

        let mut by_conference: HashMap<String, usize> = HashMap::new();
        let mut by_division: HashMap<String, usize> = HashMap::new();
        for team in &teams {
            if let Some(conference) = &team.conference {
                *by_conference.entry(conference.clone()).or_default() += 1;
            }
            if let Some(division) = &team.division {
                *by_division.entry(division.clone()).or_default() += 1;
            }
        }

        TeamStatsSummary {
            total_teams: teams.len(),
            by_conference,
            by_division,
            sources,
        }
    }

    /// One match with rosters, team stats, and betting odds. Every
    /// enrichment is best-effort; only a missing game yields `None`.
    pub async fn get_match_detail(&self, match_id: &str) -> Option<MatchDetail> {
        let game = match self.espn.get_game(match_id).await {
            Ok(game) => game,
            Err(e) => {
                if !e.is_not_found() {
                    warn!(error = %e, match_id, "Match detail lookup failed");
                }
                return None;
            }
        };

        let (home_team, away_team, home_roster, away_roster) = tokio::join!(
            self.espn.get_team(&game.home_team_id),
            self.espn.get_team(&game.away_team_id),
            self.espn.get_players(Some(&game.home_team_id)),
            self.espn.get_players(Some(&game.away_team_id)),
        );
        let (home_stats, away_stats, odds) = tokio::join!(
            self.espn.get_team_stats(&game.home_team_id, None),
            self.espn.get_team_stats(&game.away_team_id, None),
            self.fetch_odds(),
        );

        let home_team = home_team.ok();
        let away_team = away_team.ok();
        let home_name = home_team
            .as_ref()
            .map(|t| t.name.clone())
            .unwrap_or_else(|| game.home_team_id.clone());
        let away_name = away_team
            .as_ref()
            .map(|t| t.name.clone())
            .unwrap_or_else(|| game.away_team_id.clone());
        let game_odds = find_game_odds(&odds, &home_name, &away_name)
            .map(|g| g.odds.clone())
            .unwrap_or_default();

        Some(MatchDetail {
            game,
            home_team,
            away_team,
            home_roster: truncate_roster(home_roster.unwrap_or_default()),
            away_roster: truncate_roster(away_roster.unwrap_or_default()),
            home_stats: home_stats.unwrap_or_default(),
            away_stats: away_stats.unwrap_or_default(),
            odds: game_odds,
        })
    }

    /// Concurrent cheap reads against every provider.
    pub async fn health_check(&self) -> HealthReport {
        let odds_check = async {
            match &self.odds {
                Some(provider) => Some(provider.get_sports().await.map(|s| s.len())),
                None => None,
            }
        };
        let (espn, nba, odds) = tokio::join!(
            async { self.espn.get_teams(None).await.map(|t| t.len()) },
            async { self.nba.fetch_live_teams().await.map(|t| t.len()) },
            odds_check,
        );

        let report = HealthReport {
            espn: status_from_count(espn),
            nba_stats: status_from_count(nba),
            odds: odds.map_or(HealthStatus::NotConfigured, status_from_count),
            checked_at: Utc::now(),
        };
        info!(
            espn = ?report.espn,
            nba_stats = ?report.nba_stats,
            odds = ?report.odds,
            "Provider health check"
        );
        report
    }

    async fn fetch_odds(&self) -> Vec<GameWithOdds> {
        let Some(provider) = &self.odds else {
            return Vec::new();
        };
        match provider
            .get_odds(DEFAULT_SPORT, DEFAULT_REGIONS, DEFAULT_MARKETS)
            .await
        {
            Ok(games) => games,
            Err(e) => {
                warn!(error = %e, "Odds fetch failed, matches render without odds");
                Vec::new()
            }
        }
    }
}

// =============================================================================
// Pure helpers
// =============================================================================

fn status_from_count(result: Result<usize, ProviderError>) -> HealthStatus {
    match result {
        Ok(0) => HealthStatus::Degraded,
        Ok(_) => HealthStatus::Healthy,
        Err(_) => HealthStatus::Down,
    }
}

/// Resolve a provider-scoped team id to a display name, degrading to a
/// generic label when the team listing did not cover it.
fn team_display_name(teams: &[Team], team_id: &str) -> String {
    teams
        .iter()
        .find(|t| t.id == team_id)
        .map(|t| t.name.clone())
        .unwrap_or_else(|| format!("Team {team_id}"))
}

/// Join the odds and sports identifier spaces by display name. Odds
/// providers key games by team name, so matching is a best-effort
/// case-insensitive substring test in both directions.
fn find_game_odds<'a>(
    odds: &'a [GameWithOdds],
    home_name: &str,
    away_name: &str,
) -> Option<&'a GameWithOdds> {
    odds.iter().find(|game| {
        names_match(&game.home_team, home_name) && names_match(&game.away_team, away_name)
    })
}

fn names_match(odds_name: &str, team_name: &str) -> bool {
    if odds_name.is_empty() || team_name.is_empty() {
        return false;
    }
    let a = odds_name.to_lowercase();
    let b = team_name.to_lowercase();
    a.contains(&b) || b.contains(&a)
}

/// Average decimal home odds across bookmakers, when any quoted them.
fn average_home_odds(game: &GameWithOdds) -> Option<f64> {
    let quotes: Vec<f64> = game.odds.iter().filter_map(|o| o.home_odds).collect();
    if quotes.is_empty() {
        return None;
    }
    Some(quotes.iter().sum::<f64>() / quotes.len() as f64)
}

/// Render decimal odds in the American convention: 2.50 -> "+150",
/// 1.50 -> "-200". Even money renders as "+100".
fn american_odds_display(decimal: f64) -> String {
    if decimal >= 2.0 {
        format!("+{}", ((decimal - 1.0) * 100.0).round() as i64)
    } else if decimal > 1.0 {
        format!("-{}", (100.0 / (decimal - 1.0)).round() as i64)
    } else {
        // Degenerate quote at or below 1.0 carries no payout information.
        "EVEN".to_string()
    }
}

fn dashboard_status(provider_status: &str) -> &'static str {
    let status = provider_status.to_lowercase();
    if status.contains("final") || status.contains("finished") || status.contains("completed") {
        "completed"
    } else if status.contains("progress") || status.contains("live") || status.contains("halftime")
    {
        "live"
    } else {
        "upcoming"
    }
}

/// Synthesize placeholder upcoming matchups from known teams so the
/// dashboard is never empty.
fn placeholder_matches(teams: &[Team]) -> Vec<DashboardMatch> {
    (0..PLACEHOLDER_MATCHES)
        .map(|i| {
            let home = teams.get(i * 2).map(|t| t.name.clone());
            let away = teams.get(i * 2 + 1).map(|t| t.name.clone());
            DashboardMatch {
                id: format!("upcoming_{i}"),
                home_team: home.unwrap_or_else(|| "TBD".to_string()),
                away_team: away.unwrap_or_else(|| "TBD".to_string()),
                scheduled_at: Utc::now() + chrono::Duration::days(i as i64 + 1),
                status: "upcoming".to_string(),
                odds_display: None,
                home_score: None,
                away_score: None,
                venue: None,
            }
        })
        .collect()
}

fn truncate_roster(mut roster: Vec<Player>) -> Vec<Player> {
    roster.truncate(MAX_ROSTER_PLAYERS);
    roster
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::fallback;

    fn odds_game(home: &str, away: &str, home_quotes: &[f64]) -> GameWithOdds {
        let odds = home_quotes
            .iter()
            .map(|q| {
                let mut o = BettingOdds::new("g1", "book", home, away);
                o.home_odds = Some(*q);
                o
            })
            .collect();
        GameWithOdds {
            game_id: "g1".to_string(),
            home_team: home.to_string(),
            away_team: away.to_string(),
            sport: "basketball_nba".to_string(),
            commence_time: Utc::now(),
            home_score: None,
            away_score: None,
            completed: false,
            odds,
        }
    }

    #[test]
    fn test_fuzzy_name_match_is_case_insensitive_substring() {
        assert!(names_match("Boston Celtics", "celtics"));
        assert!(names_match("Heat", "Miami Heat"));
        assert!(!names_match("Boston Celtics", "Miami Heat"));
        assert!(!names_match("", "Miami Heat"));
    }

    #[test]
    fn test_odds_joined_by_both_team_names() {
        let odds = vec![
            odds_game("Boston Celtics", "Miami Heat", &[1.90]),
            odds_game("Denver Nuggets", "Utah Jazz", &[2.40]),
        ];
        let found = find_game_odds(&odds, "Nuggets", "Jazz").unwrap();
        assert_eq!(found.home_team, "Denver Nuggets");
        assert!(find_game_odds(&odds, "Nuggets", "Heat").is_none());
    }

    #[test]
    fn test_average_home_odds_across_bookmakers() {
        let game = odds_game("Boston Celtics", "Miami Heat", &[1.80, 2.00]);
        assert_eq!(average_home_odds(&game), Some(1.9));
        let quoteless = odds_game("Boston Celtics", "Miami Heat", &[]);
        assert_eq!(average_home_odds(&quoteless), None);
    }

    #[test]
    fn test_american_odds_rendering() {
        assert_eq!(american_odds_display(2.50), "+150");
        assert_eq!(american_odds_display(2.00), "+100");
        assert_eq!(american_odds_display(1.50), "-200");
        assert_eq!(american_odds_display(1.91), "-110");
        assert_eq!(american_odds_display(1.0), "EVEN");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(dashboard_status("Final"), "completed");
        assert_eq!(dashboard_status("finished"), "completed");
        assert_eq!(dashboard_status("In Progress"), "live");
        assert_eq!(dashboard_status("Halftime"), "live");
        assert_eq!(dashboard_status("Scheduled"), "upcoming");
        assert_eq!(dashboard_status(""), "upcoming");
    }

    #[test]
    fn test_placeholders_synthesized_from_known_teams() {
        let teams = fallback::nba_teams();
        let matches = placeholder_matches(&teams);
        assert_eq!(matches.len(), 3);
        assert_eq!(matches[0].id, "upcoming_0");
        assert_eq!(matches[0].home_team, teams[0].name);
        assert_eq!(matches[0].away_team, teams[1].name);
        assert!(matches.iter().all(|m| m.status == "upcoming"));
        assert!(matches.iter().all(|m| m.odds_display.is_none()));
    }

    #[test]
    fn test_placeholders_without_teams_fall_back_to_tbd() {
        let matches = placeholder_matches(&[]);
        assert_eq!(matches.len(), 3);
        assert!(matches.iter().all(|m| m.home_team == "TBD"));
    }

    #[test]
    fn test_unknown_team_id_renders_generic_label() {
        let teams = fallback::nba_teams();
        assert_eq!(team_display_name(&teams, "999"), "Team 999");
        assert_eq!(team_display_name(&teams, &teams[0].id), teams[0].name);
    }

    #[test]
    fn test_health_status_from_cheap_read() {
        assert_eq!(status_from_count(Ok(30)), HealthStatus::Healthy);
        assert_eq!(status_from_count(Ok(0)), HealthStatus::Degraded);
        assert_eq!(
            status_from_count(Err(ProviderError::Api("boom".to_string()))),
            HealthStatus::Down
        );
    }

    #[test]
    fn test_report_operational_unless_a_provider_is_down() {
        let report = HealthReport {
            espn: HealthStatus::Healthy,
            nba_stats: HealthStatus::Degraded,
            odds: HealthStatus::NotConfigured,
            checked_at: Utc::now(),
        };
        assert!(report.is_operational());
        let down = HealthReport {
            espn: HealthStatus::Down,
            ..report
        };
        assert!(!down.is_operational());
    }
}
