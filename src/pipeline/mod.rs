//! Request orchestration
//!
//! [`Pipeline`] sequences fetches, parsers and the player resolver for each
//! kind of request. Only a failure to fetch the request's primary page is
//! returned as an error; everything downstream of it degrades the result
//! instead.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::constants::endpoints;
use crate::error::ExtractError;
use crate::models::{
    CatalogEntry, CatalogTile, ChapterResolution, HomeSection, ServerRef, TilePage,
};
use crate::normalizer::UrlNormalizer;
use crate::parser::detail::EpisodeOrder;
use crate::parser::{Parser, SectionSpec};
use crate::player::PlayerResolver;
use crate::scraper::Transport;

/// Entry point for every scrape the crate performs
#[derive(Clone)]
pub struct Pipeline {
    transport: Arc<dyn Transport>,
    parser: Parser,
    resolver: PlayerResolver,
    home_sections: Vec<SectionSpec>,
    max_concurrent_servers: usize,
    max_list_pages: u32,
}

impl Pipeline {
    pub fn new(config: &Config, transport: Arc<dyn Transport>) -> Self {
        let normalizer = UrlNormalizer::new(config.base_url.clone());

        Self {
            parser: Parser::new(normalizer.clone(), config.episode_number_fallback),
            resolver: PlayerResolver::new(transport.clone(), normalizer),
            transport,
            home_sections: SectionSpec::home_defaults(),
            max_concurrent_servers: config.max_concurrent_servers.max(1),
            max_list_pages: config.max_list_pages.max(1),
        }
    }

    fn normalizer(&self) -> &UrlNormalizer {
        self.parser.normalizer()
    }

    /// Sections of the home page
    pub async fn home(&self) -> Result<Vec<HomeSection>, ExtractError> {
        let html = self
            .transport
            .get_text(&endpoints::home(self.normalizer().base()))
            .await?;

        let sections = self.parser.parse_home(&html, &self.home_sections);
        info!(
            "Parsed {} home sections ({} tiles)",
            sections.len(),
            sections.iter().map(|s| s.items.len()).sum::<usize>()
        );
        Ok(sections)
    }

    /// One page of the catalog list
    pub async fn list(&self, page: u32) -> Result<TilePage, ExtractError> {
        let page = page.max(1);
        let html = self
            .transport
            .get_text(&endpoints::anime_list(self.normalizer().base(), page))
            .await?;

        let result = self.parser.parse_tile_page(&html, page);
        info!("Parsed {} list items on page {}", result.items.len(), page);
        Ok(result)
    }

    /// One page of search results
    pub async fn search(&self, query: &str, page: u32) -> Result<TilePage, ExtractError> {
        let page = page.max(1);
        let html = self
            .transport
            .get_text(&endpoints::search(self.normalizer().base(), query, page))
            .await?;

        let result = self.parser.parse_tile_page(&html, page);
        info!(
            "Search {:?} page {}: {} results",
            query,
            page,
            result.items.len()
        );
        Ok(result)
    }

    /// Walk the catalog list until an empty page or the page cap
    ///
    /// The site gives no end-of-list signal, so the cap is what guarantees
    /// termination. A failing first page is an error; a failing later page
    /// ends the walk with what was collected.
    pub async fn crawl_list(&self, max_pages: Option<u32>) -> Result<Vec<CatalogTile>, ExtractError> {
        let cap = max_pages
            .unwrap_or(self.max_list_pages)
            .clamp(1, self.max_list_pages);
        let mut tiles = Vec::new();

        for page in 1..=cap {
            let result = match self.list(page).await {
                Ok(result) => result,
                Err(e) if page == 1 => return Err(e),
                Err(e) => {
                    warn!("Stopping crawl at page {}: {}", page, e);
                    break;
                }
            };

            let has_next = result.has_next_page;
            tiles.extend(result.items);

            if !has_next {
                info!("No more items on page {}, stopping crawl", page);
                break;
            }
            if page == cap {
                info!("Reached page limit ({}), stopping crawl", cap);
            }
        }

        Ok(tiles)
    }

    /// Detail page of a catalog entry
    ///
    /// `order` is the display order of the episodes; the parser always
    /// produces ascending order and `Desc` re-sorts it here.
    pub async fn entry(&self, id: &str, order: EpisodeOrder) -> Result<CatalogEntry, ExtractError> {
        let path = self.normalizer().path_of(id)?;
        let html = self.transport.get_text(&self.normalizer().normalize(&path)).await?;

        let mut entry = self.parser.parse_entry(&html, &path);
        order.apply(&mut entry.episodes);

        info!(
            "Parsed entry {:?}: {} genres, {} episodes",
            entry.title,
            entry.genres.len(),
            entry.episodes.len()
        );
        Ok(entry)
    }

    /// Servers listed on an episode page
    pub async fn servers(&self, episode_id: &str) -> Result<Vec<ServerRef>, ExtractError> {
        let path = self.normalizer().path_of(episode_id)?;
        let html = self.transport.get_text(&self.normalizer().normalize(&path)).await?;
        Ok(self.parser.parse_servers(&html))
    }

    /// Resolve an episode to playable sources
    ///
    /// Servers are resolved concurrently (bounded) but aggregated in the
    /// order they appear on the page. A server that fails at any step adds
    /// a diagnostic and no sources.
    pub async fn resolve_chapter(&self, episode_id: &str) -> Result<ChapterResolution, ExtractError> {
        let path = self.normalizer().path_of(episode_id)?;
        let episode_url = self.normalizer().normalize(&path);

        let html = self.transport.get_text(&episode_url).await?;
        let servers = self.parser.parse_servers(&html);
        debug!("Episode {} lists {} servers", path, servers.len());

        let resolver = &self.resolver;
        let referer = episode_url.as_str();

        let outcomes: Vec<_> = stream::iter(servers)
            .map(|server| async move {
                let outcome = resolver.resolve_server(&server, referer).await;
                (server, outcome)
            })
            .buffered(self.max_concurrent_servers)
            .collect()
            .await;

        let mut sources = Vec::new();
        let mut diagnostics = Vec::new();

        for (server, outcome) in outcomes {
            match outcome {
                Ok(found) if found.is_empty() => {
                    warn!("Server {:?} on {} listed no sources", server.name, path);
                    diagnostics.push(format!("{}: no sources in player page", server.name));
                }
                Ok(found) => {
                    debug!("Server {:?}: {} sources", server.name, found.len());
                    sources.extend(found);
                }
                Err(e) => {
                    warn!("Server {:?} on {} failed: {}", server.name, path, e);
                    diagnostics.push(format!("{}: {}", server.name, e));
                }
            }
        }

        info!(
            "Resolved {} sources for {} ({} servers failed)",
            sources.len(),
            path,
            diagnostics.len()
        );

        Ok(ChapterResolution {
            episode_id: path,
            sources,
            diagnostics,
        })
    }
}
