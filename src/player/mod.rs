//! Player resolution
//!
//! Two independently fallible steps take a [`ServerRef`] to playable
//! sources:
//!
//! 1. obfuscated servers are exchanged for a player URL through the site's
//!    AJAX endpoint;
//! 2. the player page is fetched and the `var video = [...]` literal in its
//!    inline script is read with patterns. The literal is not JSON and is
//!    never evaluated. Pages without the literal may still embed a plain
//!    `<video>` element, which is read instead.

use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;

use crate::classify::classify_format;
use crate::constants::{ajax, endpoints};
use crate::error::ExtractError;
use crate::models::{PlayerSource, ServerRef, ServerResolution};
use crate::normalizer::UrlNormalizer;
use crate::scraper::Transport;

/// Quality label used when a source object carries none
pub const DEFAULT_QUALITY: &str = "Default";

/// Quality label of a source read from a `<video>` element
pub const VIDEO_ELEMENT_QUALITY: &str = "HD";

lazy_static! {
    static ref VIDEO_BLOCK: Regex = Regex::new(r"(?s)var\s+video\s*=\s*(\[.*?\])\s*;").unwrap();
    static ref SOURCE_OBJECT: Regex = Regex::new(r"\{[^{}]*\}").unwrap();
    static ref FILE_FIELD: Regex =
        Regex::new(r#"[{,]\s*["']?file["']?\s*:\s*["']([^"']*)["']"#).unwrap();
    static ref LABEL_FIELD: Regex =
        Regex::new(r#"[{,]\s*["']?label["']?\s*:\s*["']([^"']*)["']"#).unwrap();
    static ref TYPE_FIELD: Regex =
        Regex::new(r#"[{,]\s*["']?type["']?\s*:\s*["']([^"']*)["']"#).unwrap();
    static ref VIDEO_ELEMENT: Selector = Selector::parse("video").unwrap();
    static ref SOURCE_ELEMENT: Selector = Selector::parse("source").unwrap();
}

/// Body of the AJAX player endpoint
#[derive(Debug, Deserialize)]
struct AjaxPlayerResponse {
    status: Option<String>,
    player_url: Option<String>,
}

/// Read the player URL out of an AJAX response body
pub fn parse_ajax_response(
    body: &str,
    normalizer: &UrlNormalizer,
) -> Result<String, ExtractError> {
    let response: AjaxPlayerResponse = serde_json::from_str(body)
        .map_err(|e| ExtractError::malformed(format!("player response is not JSON: {}", e)))?;

    match response.status.as_deref() {
        Some(ajax::STATUS_OK) => {}
        Some(other) => {
            return Err(ExtractError::malformed(format!(
                "player response status {:?}",
                other
            )))
        }
        None => return Err(ExtractError::malformed("player response without status")),
    }

    response
        .player_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(|url| normalizer.normalize(url))
        .ok_or_else(|| ExtractError::malformed("player response without player_url"))
}

/// Extract the sources of a player page
///
/// The `var video = [...]` block is read object by object; keys may come in
/// any order and an object without a `file` is skipped. Without the block,
/// a `<video>` element (or its first `<source>`) yields a single source.
/// A page with neither is a [`ExtractError::ParseMiss`].
pub fn extract_sources(
    page: &str,
    normalizer: &UrlNormalizer,
) -> Result<Vec<PlayerSource>, ExtractError> {
    let Some(block) = VIDEO_BLOCK
        .captures(page)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
    else {
        return video_element_source(page, normalizer)
            .map(|source| vec![source])
            .ok_or_else(|| ExtractError::parse_miss("no video block or element in player page"));
    };

    Ok(SOURCE_OBJECT
        .find_iter(block)
        .filter_map(|object| {
            let object = object.as_str();
            let file = object_field(&FILE_FIELD, object)?;
            let label = object_field(&LABEL_FIELD, object).unwrap_or(DEFAULT_QUALITY);
            build_source(file, label, object_field(&TYPE_FIELD, object), normalizer)
        })
        .collect())
}

fn object_field<'a>(field: &Regex, object: &'a str) -> Option<&'a str> {
    field
        .captures(object)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn video_element_source(page: &str, normalizer: &UrlNormalizer) -> Option<PlayerSource> {
    let document = Html::parse_document(page);
    let video = document.select(&VIDEO_ELEMENT).next()?;

    let src = video
        .value()
        .attr("src")
        .map(str::trim)
        .filter(|src| !src.is_empty())
        .or_else(|| {
            video
                .select(&SOURCE_ELEMENT)
                .next()
                .and_then(|source| source.value().attr("src"))
                .map(str::trim)
                .filter(|src| !src.is_empty())
        })?;

    build_source(src, VIDEO_ELEMENT_QUALITY, None, normalizer)
}

fn build_source(
    file: &str,
    label: &str,
    type_hint: Option<&str>,
    normalizer: &UrlNormalizer,
) -> Option<PlayerSource> {
    let url = normalizer.normalize(&file.replace("\\/", "/"));
    if url.is_empty() {
        return None;
    }

    let quality = Some(label.trim())
        .filter(|label| !label.is_empty())
        .unwrap_or(DEFAULT_QUALITY)
        .to_string();

    Some(PlayerSource {
        format: classify_format(type_hint, &url),
        url,
        quality,
    })
}

/// Resolves servers to embed URLs and embed URLs to sources
#[derive(Clone)]
pub struct PlayerResolver {
    transport: Arc<dyn Transport>,
    normalizer: UrlNormalizer,
}

impl PlayerResolver {
    pub fn new(transport: Arc<dyn Transport>, normalizer: UrlNormalizer) -> Self {
        Self {
            transport,
            normalizer,
        }
    }

    /// Player page URL of a server; `referer` is the episode page
    pub async fn resolve_embed(
        &self,
        server: &ServerRef,
        referer: &str,
    ) -> Result<String, ExtractError> {
        match &server.resolution {
            ServerResolution::DirectEmbed { url } => Ok(url.clone()),
            ServerResolution::Obfuscated { id, type_tag } => {
                let endpoint = endpoints::ajax_player(self.normalizer.base());
                let form = [
                    (ajax::ID_FIELD, id.as_str()),
                    (ajax::TYPE_FIELD, type_tag.as_str()),
                ];
                let body = self.transport.post_form(&endpoint, &form, referer).await?;
                parse_ajax_response(&body, &self.normalizer)
            }
        }
    }

    /// Fetch a player page and extract its sources
    pub async fn fetch_sources(&self, embed_url: &str) -> Result<Vec<PlayerSource>, ExtractError> {
        let page = self.transport.get_text(embed_url).await?;
        extract_sources(&page, &self.normalizer)
    }

    /// Both steps for one server
    pub async fn resolve_server(
        &self,
        server: &ServerRef,
        referer: &str,
    ) -> Result<Vec<PlayerSource>, ExtractError> {
        let embed_url = self.resolve_embed(server, referer).await?;
        tracing::debug!("Server {:?} plays from {}", server.name, embed_url);
        self.fetch_sources(&embed_url).await
    }
}
