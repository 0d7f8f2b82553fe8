//! YeniWatch Scraper Library
//!
//! This library scrapes catalog, episode and playable source metadata from
//! yeniwatch.net.tr and exposes it through REST API endpoints.

pub mod classify;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod normalizer;
pub mod parser;
pub mod pipeline;
pub mod player;
pub mod routes;
pub mod scraper;
