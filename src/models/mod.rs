//! Data models for the YeniWatch scraper
//!
//! Value records produced by the parsers and the resolution pipeline, plus
//! the API response envelopes.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Publication state of a catalog entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum EntryStatus {
    Ongoing,
    Completed,
    #[default]
    Unknown,
}

/// Delivery format of a playable source
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum StreamFormat {
    /// Segmented HLS playlist (`.m3u8`)
    Hls,
    /// Single progressive file
    Progressive,
}

/// Role of a home page section, decides what the card subtitle means
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum SectionKind {
    /// Cards link to episodes and carry an episode label
    LatestEpisodes,
    /// Cards link to catalog entries
    Entries,
}

/// Minimal catalog summary used in listings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogTile {
    /// Path of the canonical link (e.g. "/anime/one-piece/")
    pub id: String,
    pub title: String,
    pub image_url: String,
    /// Episode label or similar card caption
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
}

/// One titled block of tiles on the home page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HomeSection {
    pub title: String,
    pub kind: SectionKind,
    pub items: Vec<CatalogTile>,
}

/// One page of list or search results
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TilePage {
    pub items: Vec<CatalogTile>,
    pub page: u32,
    /// Heuristic: the page returned at least one item
    pub has_next_page: bool,
}

/// Reference to a single episode of an entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeRef {
    /// Path of the episode page
    pub id: String,
    pub name: String,
    pub number: f64,
}

/// Full catalog entry from a detail page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: String,
    pub title: String,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unique, in page order
    pub genres: Vec<String>,
    pub status: EntryStatus,
    pub episodes: Vec<EpisodeRef>,
}

/// How the player of a server is reached
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ServerResolution {
    /// The anchor already names the player page
    DirectEmbed { url: String },
    /// The player page has to be requested from the AJAX endpoint
    Obfuscated {
        id: String,
        #[serde(rename = "type")]
        type_tag: String,
    },
}

/// A named alternative video source of one episode
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServerRef {
    pub name: String,
    pub resolution: ServerResolution,
}

/// A directly playable video URL
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSource {
    pub url: String,
    pub quality: String,
    pub format: StreamFormat,
}

/// Every source found for one episode, in server-then-source order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChapterResolution {
    pub episode_id: String,
    pub sources: Vec<PlayerSource>,
    /// Servers that contributed nothing, with the reason
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

/// Generic API response wrapper for successful responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// Whether the operation was successful (always true for this type)
    pub success: bool,
    /// The response payload
    pub data: T,
    /// ISO timestamp of when data was fetched
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    /// Create a new successful API response with the current timestamp
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Whether the operation was successful (always false for errors)
    pub success: bool,
    /// Error message describing what went wrong
    pub error: String,
    /// ISO timestamp of when the error occurred
    pub timestamp: String,
}

impl ApiError {
    /// Create a new API error response with the current timestamp
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}
