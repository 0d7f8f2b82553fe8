//! Catalog entry detail pages

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use utoipa::ToSchema;

use super::selectors::{element_text, first_attr_of, IMAGE_ATTRS};
use super::Parser;
use crate::classify::{classify_status, fold_turkish};
use crate::config::EpisodeNumberFallback;
use crate::models::{CatalogEntry, EntryStatus, EpisodeRef};

lazy_static! {
    static ref EPISODE_NUMBER: Regex =
        Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*\.?\s*(?:bölüm|bolum|episode|ep\b)").unwrap();
    static ref STATUS_LABEL: Regex = Regex::new(r"(?i)^\s*durum\s*:?\s*").unwrap();
    static ref ROW_ANCHOR: Selector = Selector::parse("a").unwrap();
}

/// Info box labels that introduce the genre row
const GENRE_LABELS: &[&str] = &[
    "tür",
    "türler",
    "tur",
    "turler",
    "kategori",
    "kategoriler",
    "genre",
    "genres",
];

/// Info box label prefix of the status row
const STATUS_LABEL_PREFIX: &str = "durum";

/// Presentation order of an entry's episodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeOrder {
    /// Lowest number first, as parsed
    #[default]
    Asc,
    /// Newest first, for display
    Desc,
}

impl EpisodeOrder {
    /// Stable sort by number; equal numbers keep page order
    pub fn apply(self, episodes: &mut [EpisodeRef]) {
        match self {
            EpisodeOrder::Asc => episodes.sort_by(|a, b| a.number.total_cmp(&b.number)),
            EpisodeOrder::Desc => episodes.sort_by(|a, b| b.number.total_cmp(&a.number)),
        }
    }
}

/// Number in front of the "Bölüm" unit word of an episode label
pub fn parse_episode_number(label: &str) -> Option<f64> {
    EPISODE_NUMBER
        .captures(label)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().replace(',', ".").parse().ok())
}

impl Parser {
    /// Parse a catalog entry page
    ///
    /// `id` is the entry's path and is copied to the result as-is. Episodes
    /// come back in ascending number order.
    pub fn parse_entry(&self, html: &str, id: &str) -> CatalogEntry {
        let document = Html::parse_document(html);
        let root = document.root_element();

        let title = self.selectors.detail_title.first_text(root).unwrap_or_default();

        let image_url = self
            .selectors
            .detail_image
            .first_attr(root, IMAGE_ATTRS)
            .map(|src| self.normalizer.normalize(&src))
            .unwrap_or_default();

        let description = self.selectors.detail_description.first_text(root);

        let rows = self.selectors.info_row.all(root);

        let mut genres: Vec<String> = Vec::new();
        for row in rows.iter().filter(|row| self.is_genre_row(row)) {
            for genre in row.select(&ROW_ANCHOR).map(|a| element_text(&a)) {
                if !genre.is_empty() && !genres.contains(&genre) {
                    genres.push(genre);
                }
            }
        }

        let status = rows
            .iter()
            .find(|row| self.row_label(row).starts_with(STATUS_LABEL_PREFIX))
            .map(|row| {
                let text = element_text(row);
                classify_status(STATUS_LABEL.replace(&text, "").trim())
            })
            .unwrap_or(EntryStatus::Unknown);

        let mut episodes = self.episodes(root);
        EpisodeOrder::Asc.apply(&mut episodes);

        CatalogEntry {
            id: id.to_string(),
            title,
            image_url,
            description,
            genres,
            status,
            episodes,
        }
    }

    fn episodes(&self, root: ElementRef<'_>) -> Vec<EpisodeRef> {
        self.selectors
            .episode_link
            .all(root)
            .into_iter()
            .enumerate()
            .filter_map(|(index, anchor)| {
                let href = anchor.value().attr("href").unwrap_or_default();
                let id = match self.normalizer.path_of(href) {
                    Ok(id) => id,
                    Err(e) => {
                        tracing::debug!("Skipping episode link: {}", e);
                        return None;
                    }
                };

                let name = first_attr_of(&anchor, &["title"])
                    .unwrap_or_else(|| element_text(&anchor));

                let number = parse_episode_number(&name).unwrap_or_else(|| {
                    let fallback = match self.episode_fallback {
                        EpisodeNumberFallback::Zero => 0.0,
                        EpisodeNumberFallback::Position => (index + 1) as f64,
                    };
                    tracing::debug!("No episode number in {:?}, using {}", name, fallback);
                    fallback
                });

                Some(EpisodeRef { id, name, number })
            })
            .collect()
    }

    /// Normalized label of an info row: label element text, else the text
    /// before the first colon
    fn row_label(&self, row: &ElementRef<'_>) -> String {
        let raw = self
            .selectors
            .info_label
            .first_text(*row)
            .unwrap_or_else(|| {
                element_text(row)
                    .split(':')
                    .next()
                    .unwrap_or_default()
                    .to_string()
            });

        fold_turkish(raw.trim().trim_end_matches(':').trim())
    }

    fn is_genre_row(&self, row: &ElementRef<'_>) -> bool {
        let label = self.row_label(row);
        GENRE_LABELS
            .iter()
            .any(|candidate| fold_turkish(candidate) == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::UrlNormalizer;
    use crate::parser::test_parser;

    const DETAIL: &str = r#"
    <html><body>
        <div class="anime-info">
            <h1>Kimetsu no Yaiba</h1>
            <div class="anime-cover"><img src="/uploads/kny.jpg"></div>
            <div class="anime-desc">
                Tanjiro ailesini kaybeder.
            </div>
            <ul class="anime-info">
                <li><span class="label">Türler:</span> <a href="/tur/aksiyon/">Aksiyon</a>, <a href="/tur/fantastik/">Fantastik</a>, <a href="/tur/aksiyon/">Aksiyon</a></li>
                <li><span class="label">Durum:</span> Devam Ediyor</li>
                <li><span class="label">Stüdyo:</span> <a href="/studio/ufotable/">ufotable</a></li>
            </ul>
        </div>
        <ul class="episodes-list">
            <li><a href="/kny-3-bolum/">3. Bölüm</a></li>
            <li><a href="/kny-1-bolum/">1. Bölüm</a></li>
            <li><a href="/kny-2-bolum/" title="2. Bölüm - Sabito">Sabito</a></li>
            <li><a href="/kny-ozel/">Özel</a></li>
        </ul>
    </body></html>
    "#;

    #[test]
    fn test_parse_entry_full() {
        let parser = test_parser();
        let entry = parser.parse_entry(DETAIL, "/anime/kimetsu-no-yaiba/");

        assert_eq!(entry.id, "/anime/kimetsu-no-yaiba/");
        assert_eq!(entry.title, "Kimetsu no Yaiba");
        assert_eq!(entry.image_url, "https://yeniwatch.net.tr/uploads/kny.jpg");
        assert_eq!(entry.description.as_deref(), Some("Tanjiro ailesini kaybeder."));
        assert_eq!(entry.genres, vec!["Aksiyon", "Fantastik"]);
        assert_eq!(entry.status, EntryStatus::Ongoing);

        let numbers: Vec<f64> = entry.episodes.iter().map(|e| e.number).collect();
        assert_eq!(numbers, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(entry.episodes[0].id, "/kny-ozel/");
        assert_eq!(entry.episodes[2].name, "2. Bölüm - Sabito");
    }

    #[test]
    fn test_parse_entry_empty_html() {
        let parser = test_parser();
        let entry = parser.parse_entry("<html><body></body></html>", "/anime/x/");

        assert_eq!(entry.id, "/anime/x/");
        assert!(entry.title.is_empty());
        assert!(entry.image_url.is_empty());
        assert_eq!(entry.description, None);
        assert!(entry.genres.is_empty());
        assert_eq!(entry.status, EntryStatus::Unknown);
        assert!(entry.episodes.is_empty());
    }

    #[test]
    fn test_parse_entry_legacy_template() {
        let parser = test_parser();
        let html = r#"
        <h1 class="entry-title">Bleach</h1>
        <div class="thumb"><img data-src="//img.yeniwatch.net.tr/bleach.jpg"></div>
        <div class="desc">Ichigo.</div>
        <div class="spe">
            <span>DURUM: Tamamlandı</span>
            <span>KATEGORİLER: <a>Aksiyon</a> <a>Doğaüstü</a></span>
        </div>
        <div class="eplister"><ul>
            <li><a href="https://yeniwatch.net.tr/bleach-2-bolum/">2. Bölüm</a></li>
            <li><a href="https://yeniwatch.net.tr/bleach-1-bolum/">1. Bölüm</a></li>
        </ul></div>
        "#;

        let entry = parser.parse_entry(html, "/anime/bleach/");
        assert_eq!(entry.title, "Bleach");
        assert_eq!(entry.image_url, "https://img.yeniwatch.net.tr/bleach.jpg");
        assert_eq!(entry.status, EntryStatus::Completed);
        assert_eq!(entry.genres, vec!["Aksiyon", "Doğaüstü"]);
        assert_eq!(entry.episodes[0].id, "/bleach-1-bolum/");
        assert_eq!(entry.episodes[1].id, "/bleach-2-bolum/");
    }

    #[test]
    fn test_duplicate_episodes_preserved_in_order() {
        let parser = test_parser();
        let html = r#"
        <ul class="episodes-list">
            <li><a href="/b-2-bolum/">2. Bölüm</a></li>
            <li><a href="/a-1-bolum/">1. Bölüm</a></li>
            <li><a href="/c-2-bolum/">2. Bölüm</a></li>
        </ul>
        "#;

        let entry = parser.parse_entry(html, "/anime/dup/");
        let ids: Vec<&str> = entry.episodes.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["/a-1-bolum/", "/b-2-bolum/", "/c-2-bolum/"]);
    }

    #[test]
    fn test_position_fallback() {
        let parser = Parser::new(
            UrlNormalizer::new("https://yeniwatch.net.tr"),
            EpisodeNumberFallback::Position,
        );
        let html = r#"
        <ul class="episodes-list">
            <li><a href="/x-final/">Final</a></li>
            <li><a href="/x-1-bolum/">1. Bölüm</a></li>
            <li><a href="/x-film/">Film</a></li>
        </ul>
        "#;

        let entry = parser.parse_entry(html, "/anime/x/");
        let numbers: Vec<f64> = entry.episodes.iter().map(|e| e.number).collect();
        assert_eq!(numbers, vec![1.0, 1.0, 3.0]);
        assert_eq!(entry.episodes[0].id, "/x-final/");
    }

    #[test]
    fn test_parse_episode_number() {
        assert_eq!(parse_episode_number("3. Bölüm"), Some(3.0));
        assert_eq!(parse_episode_number("One Piece 1100.Bölüm"), Some(1100.0));
        assert_eq!(parse_episode_number("12,5 bölüm"), Some(12.5));
        assert_eq!(parse_episode_number("7 BÖLÜM izle"), Some(7.0));
        assert_eq!(parse_episode_number("Episode 4"), None);
        assert_eq!(parse_episode_number("Özel"), None);
        assert_eq!(parse_episode_number(""), None);
    }

    #[test]
    fn test_episode_order_desc() {
        let mut episodes = vec![
            EpisodeRef { id: "/a/".into(), name: "1".into(), number: 1.0 },
            EpisodeRef { id: "/b/".into(), name: "3".into(), number: 3.0 },
            EpisodeRef { id: "/c/".into(), name: "2".into(), number: 2.0 },
        ];
        EpisodeOrder::Desc.apply(&mut episodes);
        let ids: Vec<&str> = episodes.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["/b/", "/c/", "/a/"]);
    }
}
