pub mod espn;
pub mod fallback;
pub mod nba_stats;
pub mod odds_api;
