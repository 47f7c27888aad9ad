//! Common capability contract every sports-data provider implements.
//!
//! The variant set is flat: each adapter implements the trait directly on
//! top of its own `RequestExecutor`. Adapters that structurally cannot
//! support an operation (an odds-only provider has no rosters) fail with
//! `ProviderError::Unsupported` so callers can tell "not supported" apart
//! from "supported but currently empty".

use async_trait::async_trait;
use chrono::NaiveDate;

use super::errors::ProviderError;
use crate::data::models::{Game, Player, StatMap, Team};

#[async_trait]
pub trait SportsProvider: Send + Sync {
    /// Stable provider name used in logs and health reports.
    fn name(&self) -> &'static str;

    async fn get_teams(&self, league: Option<&str>) -> Result<Vec<Team>, ProviderError>;

    async fn get_team(&self, team_id: &str) -> Result<Team, ProviderError>;

    async fn get_players(&self, team_id: Option<&str>) -> Result<Vec<Player>, ProviderError>;

    async fn get_player(&self, player_id: &str) -> Result<Player, ProviderError>;

    async fn get_games(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        team_id: Option<&str>,
    ) -> Result<Vec<Game>, ProviderError>;

    async fn get_game(&self, game_id: &str) -> Result<Game, ProviderError>;

    async fn get_team_stats(
        &self,
        team_id: &str,
        season: Option<&str>,
    ) -> Result<StatMap, ProviderError>;

    async fn get_player_stats(
        &self,
        player_id: &str,
        season: Option<&str>,
    ) -> Result<StatMap, ProviderError>;
}
