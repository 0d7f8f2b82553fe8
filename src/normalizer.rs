//! URL normalization against the configured site origin
//!
//! Pages on the site mix protocol-relative, root-relative and bare-relative
//! links. Everything the parsers emit goes through [`UrlNormalizer`] first.

use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

use crate::error::ExtractError;

lazy_static! {
    static ref SCHEME_PREFIX: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").unwrap();
}

/// Turns site links into absolute URLs and path ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlNormalizer {
    base: String,
}

impl UrlNormalizer {
    /// `base` is an origin such as `https://yeniwatch.net.tr`; a trailing
    /// slash is dropped.
    pub fn new(base: impl Into<String>) -> Self {
        let base: String = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Anchor `raw` at the base origin
    ///
    /// Never fails; garbage in stays garbage out and is caught when the
    /// result is parsed as a URL.
    pub fn normalize(&self, raw: &str) -> String {
        let raw = raw.trim();

        if raw.is_empty() {
            String::new()
        } else if raw.starts_with("//") {
            format!("https:{}", raw)
        } else if raw.starts_with('/') {
            format!("{}{}", self.base, raw)
        } else if !SCHEME_PREFIX.is_match(raw) {
            format!("{}/{}", self.base, raw.trim_start_matches('/'))
        } else {
            raw.to_string()
        }
    }

    /// Path component of the normalized link, without query or fragment
    pub fn path_of(&self, raw: &str) -> Result<String, ExtractError> {
        let absolute = self.normalize(raw);
        let parsed = Url::parse(&absolute)
            .map_err(|e| ExtractError::InvalidReference(format!("{} ({})", raw, e)))?;

        if parsed.cannot_be_a_base() {
            return Err(ExtractError::InvalidReference(raw.to_string()));
        }

        Ok(parsed.path().to_string())
    }
}
