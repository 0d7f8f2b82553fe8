//! Configuration module for the YeniWatch scraper
//!
//! Handles loading environment variables and application configuration.

use std::env;
use std::str::FromStr;

/// Default origin of the scraped site
pub const DEFAULT_BASE_URL: &str = "https://yeniwatch.net.tr";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Origin every relative link is anchored at (no trailing slash)
    pub base_url: String,
    /// Per-request timeout applied by the HTTP client
    pub request_timeout_secs: u64,
    /// How many servers of one episode are resolved at the same time
    pub max_concurrent_servers: usize,
    /// Number assigned to episodes whose label carries no number
    pub episode_number_fallback: EpisodeNumberFallback,
    /// Upper bound for paginated crawls
    pub max_list_pages: u32,
    /// Minimum random delay between outgoing requests
    pub min_delay_ms: u64,
    /// Maximum random delay between outgoing requests
    pub max_delay_ms: u64,
    /// Retries on 429 / 5xx responses
    pub max_retries: u32,
}

/// What an episode number defaults to when the label has no numeric token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EpisodeNumberFallback {
    /// Always `0`
    #[default]
    Zero,
    /// 1-based position of the episode link in page order
    Position,
}

impl FromStr for EpisodeNumberFallback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "zero" | "0" => Ok(Self::Zero),
            "position" | "index" => Ok(Self::Position),
            other => Err(format!("unknown episode number fallback: {}", other)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 20,
            max_concurrent_servers: 4,
            episode_number_fallback: EpisodeNumberFallback::Zero,
            max_list_pages: 50,
            min_delay_ms: 100,
            max_delay_ms: 400,
            max_retries: 3,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset or unparsable values fall back to [`Config::default`].
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env_parse("PORT").unwrap_or(defaults.port),
            base_url: env::var("BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS")
                .unwrap_or(defaults.request_timeout_secs),
            max_concurrent_servers: env_parse::<usize>("MAX_CONCURRENT_SERVERS")
                .unwrap_or(defaults.max_concurrent_servers)
                .max(1),
            episode_number_fallback: env_parse("EPISODE_NUMBER_FALLBACK")
                .unwrap_or(defaults.episode_number_fallback),
            max_list_pages: env_parse("MAX_LIST_PAGES").unwrap_or(defaults.max_list_pages),
            min_delay_ms: env_parse("MIN_DELAY_MS").unwrap_or(defaults.min_delay_ms),
            max_delay_ms: env_parse("MAX_DELAY_MS").unwrap_or(defaults.max_delay_ms),
            max_retries: env_parse("MAX_RETRIES").unwrap_or(defaults.max_retries),
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid value for {}: {}", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.base_url, "https://yeniwatch.net.tr");
        assert_eq!(config.max_concurrent_servers, 4);
        assert_eq!(config.episode_number_fallback, EpisodeNumberFallback::Zero);
        assert!(config.min_delay_ms <= config.max_delay_ms);
    }

    #[test]
    fn test_episode_number_fallback_from_str() {
        assert_eq!("zero".parse(), Ok(EpisodeNumberFallback::Zero));
        assert_eq!("Position".parse(), Ok(EpisodeNumberFallback::Position));
        assert_eq!(" index ".parse(), Ok(EpisodeNumberFallback::Position));
        assert!("first".parse::<EpisodeNumberFallback>().is_err());
    }
}
