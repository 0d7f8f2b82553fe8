//! API Routes module for the YeniWatch scraper
//!
//! This module contains all HTTP route handlers for the public API endpoints.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{error, info};
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::error::{AppError, AppResult};
use crate::models::{
    ApiError, ApiResponse, CatalogEntry, CatalogTile, ChapterResolution, EntryStatus,
    EpisodeRef, HomeSection, PlayerSource, SectionKind, ServerRef, ServerResolution,
    StreamFormat, TilePage,
};
use crate::parser::detail::EpisodeOrder;
use crate::pipeline::Pipeline;

/// Application state shared across handlers
pub struct AppState {
    pub pipeline: Pipeline,
}

/// Log and convert a pipeline failure
fn upstream_failure(what: &str, e: impl Into<AppError>) -> AppError {
    let e = e.into();
    error!("Failed to fetch {}: {}", what, e);
    e
}

/// GET /api/home - Sections of the home page
#[utoipa::path(
    get,
    path = "/api/home",
    tag = "catalog",
    responses(
        (status = 200, description = "Home page sections", body = Vec<HomeSection>),
        (status = 502, description = "Site unreachable", body = ApiError)
    )
)]
pub async fn get_home(data: web::Data<AppState>) -> AppResult<HttpResponse> {
    let sections = data
        .pipeline
        .home()
        .await
        .map_err(|e| upstream_failure("home page", e))?;

    Ok(HttpResponse::Ok().json(ApiResponse::new(sections)))
}

/// Query parameters for the list endpoint
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListQuery {
    /// Page number (default: 1)
    pub page: Option<u32>,
}

/// GET /api/list - One page of the catalog
#[utoipa::path(
    get,
    path = "/api/list",
    tag = "catalog",
    params(ListQuery),
    responses(
        (status = 200, description = "Catalog page", body = TilePage),
        (status = 502, description = "Site unreachable", body = ApiError)
    )
)]
pub async fn get_list(
    data: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> AppResult<HttpResponse> {
    let page = query.page.unwrap_or(1);
    info!("Fetching catalog page {}", page);

    let result = data
        .pipeline
        .list(page)
        .await
        .map_err(|e| upstream_failure("catalog list", e))?;

    Ok(HttpResponse::Ok().json(ApiResponse::new(result)))
}

/// Query parameters for the full catalog crawl
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase")]
pub struct CrawlQuery {
    /// Upper bound on pages fetched, clamped to the configured cap
    pub max_pages: Option<u32>,
}

/// GET /api/list/all - Every catalog page until the listing runs out
#[utoipa::path(
    get,
    path = "/api/list/all",
    tag = "catalog",
    params(CrawlQuery),
    responses(
        (status = 200, description = "All catalog tiles in page order", body = Vec<CatalogTile>),
        (status = 502, description = "Site unreachable", body = ApiError)
    )
)]
pub async fn get_full_list(
    data: web::Data<AppState>,
    query: web::Query<CrawlQuery>,
) -> AppResult<HttpResponse> {
    let tiles = data
        .pipeline
        .crawl_list(query.max_pages)
        .await
        .map_err(|e| upstream_failure("catalog list", e))?;

    info!("Crawled {} catalog tiles", tiles.len());
    Ok(HttpResponse::Ok().json(ApiResponse::new(tiles)))
}

/// Query parameters for the search endpoint
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct SearchQuery {
    /// Search keyword
    pub q: Option<String>,
    /// Page number (default: 1)
    pub page: Option<u32>,
}

/// GET /api/search - Search the catalog
#[utoipa::path(
    get,
    path = "/api/search",
    tag = "catalog",
    params(SearchQuery),
    responses(
        (status = 200, description = "Search results", body = TilePage),
        (status = 400, description = "Search query is required", body = ApiError),
        (status = 502, description = "Site unreachable", body = ApiError)
    )
)]
pub async fn search(
    data: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> AppResult<HttpResponse> {
    let keyword = match &query.q {
        Some(q) if !q.trim().is_empty() => q.trim(),
        _ => return Err(AppError::validation("Search query is required")),
    };
    let page = query.page.unwrap_or(1);

    info!("Searching for {:?} (page {})", keyword, page);
    let result = data
        .pipeline
        .search(keyword, page)
        .await
        .map_err(|e| upstream_failure("search results", e))?;

    Ok(HttpResponse::Ok().json(ApiResponse::new(result)))
}

/// Query parameters identifying a page by its path
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct IdQuery {
    /// Path of the page (e.g. "/anime/one-piece/")
    pub id: Option<String>,
}

/// Trimmed `id` query parameter, rejecting a missing or blank one
fn required_id(id: Option<&str>) -> AppResult<&str> {
    match id.map(str::trim) {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(AppError::validation("Query parameter `id` is required")),
    }
}

/// Query parameters for the entry endpoint
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct EntryQuery {
    /// Path of the entry page (e.g. "/anime/one-piece/")
    pub id: Option<String>,
    /// Episode order, `asc` (default) or `desc`
    pub order: Option<EpisodeOrder>,
}

/// GET /api/entry - Catalog entry with its episodes
#[utoipa::path(
    get,
    path = "/api/entry",
    tag = "catalog",
    params(EntryQuery),
    responses(
        (status = 200, description = "Catalog entry", body = CatalogEntry),
        (status = 400, description = "Missing or invalid id", body = ApiError),
        (status = 404, description = "Entry not found", body = ApiError),
        (status = 502, description = "Site unreachable", body = ApiError)
    )
)]
pub async fn get_entry(
    data: web::Data<AppState>,
    query: web::Query<EntryQuery>,
) -> AppResult<HttpResponse> {
    let id = required_id(query.id.as_deref())?;

    let entry = data
        .pipeline
        .entry(id, query.order.unwrap_or_default())
        .await
        .map_err(|e| upstream_failure("entry page", e))?;

    if entry.title.is_empty() {
        return Err(AppError::not_found("Entry not found"));
    }

    Ok(HttpResponse::Ok().json(ApiResponse::new(entry)))
}

/// GET /api/episode/servers - Servers offered for an episode
#[utoipa::path(
    get,
    path = "/api/episode/servers",
    tag = "episode",
    params(IdQuery),
    responses(
        (status = 200, description = "Servers in page order", body = Vec<ServerRef>),
        (status = 400, description = "Missing or invalid id", body = ApiError),
        (status = 502, description = "Site unreachable", body = ApiError)
    )
)]
pub async fn get_episode_servers(
    data: web::Data<AppState>,
    query: web::Query<IdQuery>,
) -> AppResult<HttpResponse> {
    let servers = data
        .pipeline
        .servers(required_id(query.id.as_deref())?)
        .await
        .map_err(|e| upstream_failure("episode page", e))?;

    Ok(HttpResponse::Ok().json(ApiResponse::new(servers)))
}

/// GET /api/episode/sources - Playable sources of an episode
///
/// Servers that fail to resolve are left out; an episode without any
/// working server returns an empty source list.
#[utoipa::path(
    get,
    path = "/api/episode/sources",
    tag = "episode",
    params(IdQuery),
    responses(
        (status = 200, description = "Resolved sources", body = ChapterResolution),
        (status = 400, description = "Missing or invalid id", body = ApiError),
        (status = 502, description = "Site unreachable", body = ApiError)
    )
)]
pub async fn get_episode_sources(
    data: web::Data<AppState>,
    query: web::Query<IdQuery>,
) -> AppResult<HttpResponse> {
    let resolution = data
        .pipeline
        .resolve_chapter(required_id(query.id.as_deref())?)
        .await
        .map_err(|e| upstream_failure("episode page", e))?;

    Ok(HttpResponse::Ok().json(ApiResponse::new(resolution)))
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "YeniWatch Scraper API",
        version = "0.1.0",
        description = "Catalog and playable source metadata scraped from yeniwatch.net.tr",
        license(name = "MIT")
    ),
    paths(
        get_home,
        get_list,
        get_full_list,
        search,
        get_entry,
        get_episode_servers,
        get_episode_sources
    ),
    components(
        schemas(
            CatalogTile,
            HomeSection,
            SectionKind,
            TilePage,
            CatalogEntry,
            EntryStatus,
            EpisodeRef,
            EpisodeOrder,
            ServerRef,
            ServerResolution,
            PlayerSource,
            StreamFormat,
            ChapterResolution,
            ApiError,
            ListQuery,
            CrawlQuery,
            SearchQuery,
            IdQuery,
            EntryQuery
        )
    ),
    tags(
        (name = "catalog", description = "Home, list, search and entry pages"),
        (name = "episode", description = "Server discovery and source resolution")
    )
)]
pub struct ApiDoc;

/// Configure API routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/home", web::get().to(get_home))
            .route("/list", web::get().to(get_list))
            .route("/list/all", web::get().to(get_full_list))
            .route("/search", web::get().to(search))
            .route("/entry", web::get().to(get_entry))
            .route("/episode/servers", web::get().to(get_episode_servers))
            .route("/episode/sources", web::get().to(get_episode_sources)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::pipeline::fake::FakeSite;
    use actix_web::{http::StatusCode, test, App};
    use std::sync::Arc;

    fn state(site: FakeSite) -> web::Data<AppState> {
        let config = Config::default();
        web::Data::new(AppState {
            pipeline: Pipeline::new(&config, Arc::new(site)),
        })
    }

    #[actix_rt::test]
    async fn test_search_requires_query() {
        let app = test::init_service(
            App::new()
                .app_data(state(FakeSite::default()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/search?q=%20").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: ApiError = test::read_body_json(resp).await;
        assert!(!body.success);
        assert_eq!(body.error, "Search query is required");
    }

    #[::core::prelude::v1::test]
    fn test_required_id() {
        assert_eq!(required_id(Some("  /anime/x/ ")).unwrap(), "/anime/x/");
        assert!(matches!(required_id(Some("   ")), Err(AppError::Validation(_))));
        assert!(matches!(required_id(None), Err(AppError::Validation(_))));
    }

    #[actix_rt::test]
    async fn test_entry_requires_id() {
        let app = test::init_service(
            App::new()
                .app_data(state(FakeSite::default()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/entry?id=&order=desc").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_rt::test]
    async fn test_episode_sources_requires_id() {
        let app = test::init_service(
            App::new()
                .app_data(state(FakeSite::default()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/episode/sources").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_rt::test]
    async fn test_episode_sources_resolves() {
        let site = FakeSite::default()
            .page(
                "https://yeniwatch.net.tr/x-1-bolum/",
                r#"<div class="server-list"><a data-embed="/embed/1">Ana</a></div>"#,
            )
            .page(
                "https://yeniwatch.net.tr/embed/1",
                r#"var video = [{file:"//cdn.example.com/1.m3u8",label:"1080p"}];"#,
            );
        let app = test::init_service(
            App::new().app_data(state(site)).configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/episode/sources?id=/x-1-bolum/")
            .to_request();
        let body: ApiResponse<ChapterResolution> = test::call_and_read_body_json(&app, req).await;

        assert!(body.success);
        assert_eq!(body.data.episode_id, "/x-1-bolum/");
        assert_eq!(body.data.sources.len(), 1);
        assert_eq!(body.data.sources[0].url, "https://cdn.example.com/1.m3u8");
        assert_eq!(body.data.sources[0].format, StreamFormat::Hls);
    }

    #[actix_rt::test]
    async fn test_entry_not_found_upstream() {
        let app = test::init_service(
            App::new()
                .app_data(state(FakeSite::default()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/entry?id=/anime/yok/")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn test_entry_empty_page_is_not_found() {
        let site = FakeSite::default().page(
            "https://yeniwatch.net.tr/anime/bos/",
            "<html><body></body></html>",
        );
        let app = test::init_service(
            App::new().app_data(state(site)).configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/entry?id=/anime/bos/&order=desc")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
