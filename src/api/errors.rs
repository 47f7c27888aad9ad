//! Classified error taxonomy shared by all provider adapters.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("data not found: {0}")]
    NotFound(String),

    #[error("provider rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("{provider} does not support {capability}")]
    Unsupported {
        provider: &'static str,
        capability: &'static str,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("API error: {0}")]
    Api(String),
}

impl ProviderError {
    /// Classify an HTTP error response by status code.
    ///
    /// Only called for status >= 400; 2xx/3xx never reach here.
    pub fn from_status(status_code: u16, body: &str) -> Self {
        let detail = format!("HTTP {status_code}: {}", truncate(body, 200));
        match status_code {
            401 => Self::Authentication(detail),
            404 => Self::NotFound(detail),
            429 => Self::RateLimited(detail),
            _ => Self::Api(detail),
        }
    }

    pub fn unsupported(provider: &'static str, capability: &'static str) -> Self {
        Self::Unsupported {
            provider,
            capability,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            ProviderError::from_status(401, "bad key"),
            ProviderError::Authentication(_)
        ));
        assert!(matches!(
            ProviderError::from_status(404, "no such team"),
            ProviderError::NotFound(_)
        ));
        assert!(matches!(
            ProviderError::from_status(429, "slow down"),
            ProviderError::RateLimited(_)
        ));
        assert!(matches!(
            ProviderError::from_status(500, "oops"),
            ProviderError::Api(_)
        ));
        assert!(matches!(
            ProviderError::from_status(403, "forbidden"),
            ProviderError::Api(_)
        ));
    }

    #[test]
    fn test_unsupported_message_names_provider_and_capability() {
        let err = ProviderError::unsupported("odds_api", "get_players");
        assert_eq!(err.to_string(), "odds_api does not support get_players");
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_long_bodies_are_truncated() {
        let body = "x".repeat(5000);
        let err = ProviderError::from_status(500, &body);
        assert!(err.to_string().len() < 300);
    }
}
