//! Parser module for extracting structured data from HTML
//!
//! This module turns pages fetched from the site into catalog records:
//! listing tiles ([`listing`]), entry details ([`detail`]) and the server
//! list of an episode page ([`servers`]). All parsing is synchronous and
//! works on owned page text, so no document outlives a fetch.

pub mod detail;
pub mod listing;
pub mod selectors;
pub mod servers;

pub use listing::SectionSpec;
pub use selectors::{SelectorChain, SiteSelectors};

use crate::config::EpisodeNumberFallback;
use crate::normalizer::UrlNormalizer;

/// Site-aware page parser
#[derive(Debug, Clone)]
pub struct Parser {
    selectors: SiteSelectors,
    normalizer: UrlNormalizer,
    episode_fallback: EpisodeNumberFallback,
}

impl Parser {
    pub fn new(normalizer: UrlNormalizer, episode_fallback: EpisodeNumberFallback) -> Self {
        Self::with_selectors(SiteSelectors::default(), normalizer, episode_fallback)
    }

    pub fn with_selectors(
        selectors: SiteSelectors,
        normalizer: UrlNormalizer,
        episode_fallback: EpisodeNumberFallback,
    ) -> Self {
        Self {
            selectors,
            normalizer,
            episode_fallback,
        }
    }

    pub fn normalizer(&self) -> &UrlNormalizer {
        &self.normalizer
    }
}

#[cfg(test)]
pub(crate) fn test_parser() -> Parser {
    Parser::new(
        UrlNormalizer::new("https://yeniwatch.net.tr"),
        EpisodeNumberFallback::Zero,
    )
}
