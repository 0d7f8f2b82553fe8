//! Scraper module for fetching pages from the target site
//!
//! This module provides the [`Transport`] seam used by the resolution pipeline
//! and its HTTP implementation with browser-like headers, retries and
//! request pacing.

use async_trait::async_trait;
use rand::Rng;
use reqwest::{Client, RequestBuilder, StatusCode};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

use crate::config::Config;

/// Errors that can occur during transport operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScraperError {
    /// Network-related errors (connection timeout, DNS failure, etc.)
    #[error("Failed to connect to server: {0}")]
    NetworkError(String),

    /// HTTP non-200 status code errors
    #[error("Server returned status {0}")]
    HttpError(u16),

    /// Error reading response body
    #[error("Failed to read response body: {0}")]
    ResponseError(String),

    /// Rate limited by server
    #[error("Rate limited, retry after delay")]
    RateLimited,
}

/// Page fetching as seen by the parsers and the pipeline
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET a page and return its body as text
    async fn get_text(&self, url: &str) -> Result<String, ScraperError>;

    /// POST a url-encoded form as an XHR issued from `referer`
    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
        referer: &str,
    ) -> Result<String, ScraperError>;
}

/// Configuration for the HTTP client and anti-detection features
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Minimum delay between requests in milliseconds
    pub min_delay_ms: u64,
    /// Maximum delay between requests in milliseconds
    pub max_delay_ms: u64,
    /// Whether to rotate user agents
    pub rotate_user_agent: bool,
    /// Maximum attempts per request
    pub max_retries: u32,
    /// Base delay for exponential backoff in milliseconds
    pub backoff_base_ms: u64,
    /// Whole-request timeout
    pub timeout_secs: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 100,
            max_delay_ms: 400,
            rotate_user_agent: true,
            max_retries: 3,
            backoff_base_ms: 1000,
            timeout_secs: 20,
        }
    }
}

impl From<&Config> for ScraperConfig {
    fn from(config: &Config) -> Self {
        Self {
            min_delay_ms: config.min_delay_ms.min(config.max_delay_ms),
            max_delay_ms: config.max_delay_ms.max(config.min_delay_ms),
            max_retries: config.max_retries.max(1),
            timeout_secs: config.request_timeout_secs,
            ..Self::default()
        }
    }
}

/// Longest single backoff sleep
const MAX_BACKOFF_MS: u64 = 30_000;

/// List of realistic user agents for rotation
const USER_AGENTS: &[&str] = &[
    // Chrome on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Chrome on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Firefox on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    // Safari on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

/// HTTP client for scraping web pages
pub struct Scraper {
    client: Client,
    config: ScraperConfig,
    request_count: AtomicUsize,
}

impl Scraper {
    /// Create a new Scraper with custom configuration
    pub fn with_config(config: ScraperConfig) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ScraperError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            config,
            request_count: AtomicUsize::new(0),
        })
    }

    /// Get a random user agent from the list
    fn get_user_agent(&self) -> &'static str {
        if self.config.rotate_user_agent {
            let idx = rand::thread_rng().gen_range(0..USER_AGENTS.len());
            USER_AGENTS[idx]
        } else {
            USER_AGENTS[0]
        }
    }

    /// Apply random delay between requests
    async fn apply_delay(&self) {
        if self.config.max_delay_ms == 0 {
            return;
        }
        let delay =
            rand::thread_rng().gen_range(self.config.min_delay_ms..=self.config.max_delay_ms);
        sleep(Duration::from_millis(delay)).await;
    }

    /// Exponential backoff before retry `attempt`, without jitter
    fn backoff_delay_ms(&self, attempt: u32) -> u64 {
        self.config
            .backoff_base_ms
            .saturating_mul(2u64.saturating_pow(attempt))
            .min(MAX_BACKOFF_MS)
    }

    /// Apply exponential backoff delay
    async fn apply_backoff(&self, attempt: u32) {
        let jitter = rand::thread_rng().gen_range(0..500);
        sleep(Duration::from_millis(self.backoff_delay_ms(attempt) + jitter)).await;
    }

    /// Fetch a page from the given URL
    pub async fn fetch_page(&self, url: &str) -> Result<String, ScraperError> {
        self.send_with_retries(|user_agent| {
            self.client
                .get(url)
                .header("User-Agent", user_agent)
                .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8")
                .header("Accept-Language", "tr-TR,tr;q=0.9,en-US;q=0.8,en;q=0.7")
                .header("Cache-Control", "no-cache")
                .header("Sec-Fetch-Dest", "document")
                .header("Sec-Fetch-Mode", "navigate")
                .header("Upgrade-Insecure-Requests", "1")
        })
        .await
    }

    /// Post a url-encoded form the way the site's player script does
    pub async fn submit_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
        referer: &str,
    ) -> Result<String, ScraperError> {
        self.send_with_retries(|user_agent| {
            self.client
                .post(url)
                .header("User-Agent", user_agent)
                .header("Accept", "application/json, text/javascript, */*; q=0.01")
                .header("Content-Type", "application/x-www-form-urlencoded; charset=UTF-8")
                .header("X-Requested-With", "XMLHttpRequest")
                .header("Referer", referer)
                .form(form)
        })
        .await
    }

    /// Pace, send and retry a request built by `build`
    async fn send_with_retries<F>(&self, build: F) -> Result<String, ScraperError>
    where
        F: Fn(&'static str) -> RequestBuilder,
    {
        // Apply delay before request (except for first request)
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        if count > 0 {
            self.apply_delay().await;
        }

        let mut last_error = None;

        for attempt in 0..self.config.max_retries {
            if attempt > 0 {
                self.apply_backoff(attempt).await;
            }

            match self.do_send(build(self.get_user_agent())).await {
                Ok(body) => return Ok(body),
                Err(ScraperError::RateLimited) => {
                    tracing::warn!("Rate limited on attempt {}, backing off...", attempt + 1);
                    last_error = Some(ScraperError::RateLimited);
                }
                Err(ScraperError::HttpError(status)) if status >= 500 => {
                    tracing::warn!("HTTP {} on attempt {}, retrying...", status, attempt + 1);
                    last_error = Some(ScraperError::HttpError(status));
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(ScraperError::NetworkError(
            "Max retries exceeded".to_string(),
        )))
    }

    async fn do_send(&self, request: RequestBuilder) -> Result<String, ScraperError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ScraperError::NetworkError("Connection timeout".to_string())
            } else if e.is_connect() {
                ScraperError::NetworkError("Failed to connect to server".to_string())
            } else {
                ScraperError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ScraperError::RateLimited);
        }

        if status != StatusCode::OK {
            return Err(ScraperError::HttpError(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| ScraperError::ResponseError(e.to_string()))
    }

    /// Get current request count
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for Scraper {
    async fn get_text(&self, url: &str) -> Result<String, ScraperError> {
        tracing::debug!("GET {}", url);
        self.fetch_page(url).await
    }

    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
        referer: &str,
    ) -> Result<String, ScraperError> {
        tracing::debug!("POST {} (referer {})", url, referer);
        self.submit_form(url, form, referer).await
    }
}
