//! Configuration management.
//!
//! Loads settings from environment variables and .env file.

/// Application configuration loaded from environment.
#[derive(Debug, Clone)]
pub struct Settings {
    // Provider credentials
    pub odds_api_key: String,
    pub espn_api_key: String,

    // HTTP behavior
    pub request_timeout_secs: u64,
    pub max_retries: u32,

    // Per-minute rate limit windows
    pub espn_rate_limit: usize,
    pub nba_rate_limit: usize,
    pub odds_rate_limit: usize,

    // Dashboard refresh
    pub refresh_interval_secs: u64,

    // Logging
    pub log_level: String,
    pub log_json: bool,
}

impl Settings {
    /// Load settings from environment variables (and .env file).
    pub fn from_env() -> Self {
        // Try to load .env file (ignore if not found).
        let _ = dotenvy::dotenv();

        Self {
            odds_api_key: env_str("ODDS_API_KEY", ""),
            espn_api_key: env_str("ESPN_API_KEY", ""),

            request_timeout_secs: env_u64("REQUEST_TIMEOUT_SECS", 10),
            max_retries: env_u32("MAX_RETRIES", 3),

            espn_rate_limit: env_usize("ESPN_RATE_LIMIT", 100),
            nba_rate_limit: env_usize("NBA_RATE_LIMIT", 30),
            odds_rate_limit: env_usize("ODDS_RATE_LIMIT", 20),

            refresh_interval_secs: env_u64("REFRESH_INTERVAL_SECS", 300),

            log_level: env_str("LOG_LEVEL", "info"),
            log_json: env_bool("LOG_JSON", false),
        }
    }

    /// Validate configuration for critical requirements.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.request_timeout_secs == 0 {
            errors.push("REQUEST_TIMEOUT_SECS must be positive".to_string());
        }
        if self.espn_rate_limit == 0 {
            errors.push("ESPN_RATE_LIMIT must be positive".to_string());
        }
        if self.nba_rate_limit == 0 {
            errors.push("NBA_RATE_LIMIT must be positive".to_string());
        }
        if self.odds_rate_limit == 0 {
            errors.push("ODDS_RATE_LIMIT must be positive".to_string());
        }
        if self.refresh_interval_secs == 0 {
            errors.push("REFRESH_INTERVAL_SECS must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Whether the optional odds provider should be constructed at all.
    pub fn odds_configured(&self) -> bool {
        !self.odds_api_key.is_empty()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            odds_api_key: String::new(),
            espn_api_key: String::new(),
            request_timeout_secs: 10,
            max_retries: 3,
            espn_rate_limit: 100,
            nba_rate_limit: 30,
            odds_rate_limit: 20,
            refresh_interval_secs: 300,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

// =============================================================================
// Environment helpers
// =============================================================================

fn env_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_zero_rate_limit_rejected() {
        let settings = Settings {
            nba_rate_limit: 0,
            ..Settings::default()
        };
        let errors = settings.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("NBA_RATE_LIMIT")));
    }

    #[test]
    fn test_odds_provider_disabled_without_key() {
        assert!(!Settings::default().odds_configured());
        let settings = Settings {
            odds_api_key: "k".to_string(),
            ..Settings::default()
        };
        assert!(settings.odds_configured());
    }
}
