//! Constants module for the YeniWatch scraper
//!
//! Contains endpoint URL builders that use the base URL from configuration.

/// URL builder functions for all endpoints
pub mod endpoints {
    /// Home page URL
    pub fn home(base_url: &str) -> String {
        format!("{}/", base_url)
    }

    /// Paginated catalog list URL
    pub fn anime_list(base_url: &str, page: u32) -> String {
        format!("{}/anime-listesi/page/{}/", base_url, page.max(1))
    }

    /// Search URL with query and page parameters
    pub fn search(base_url: &str, query: &str, page: u32) -> String {
        format!(
            "{}/page/{}/?s={}",
            base_url,
            page.max(1),
            urlencoding::encode(query)
        )
    }

    /// Endpoint that turns an obfuscated server id/type pair into a player URL
    pub fn ajax_player(base_url: &str) -> String {
        format!("{}/ajax/player", base_url)
    }
}

/// Fixed values of the AJAX player exchange
pub mod ajax {
    /// Form field carrying the server's internal id
    pub const ID_FIELD: &str = "id";
    /// Form field carrying the server's type tag
    pub const TYPE_FIELD: &str = "type";
    /// `status` value of a successful response
    pub const STATUS_OK: &str = "ok";
}
