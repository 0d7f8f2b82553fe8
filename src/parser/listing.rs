//! Home page sections and list/search result pages

use scraper::{ElementRef, Html};

use super::selectors::{element_text, first_attr_of, IMAGE_ATTRS};
use super::Parser;
use crate::models::{CatalogTile, HomeSection, SectionKind, TilePage};

/// A titled home page block to look for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSpec {
    /// Exact heading text, compared after trimming
    pub title: String,
    pub kind: SectionKind,
}

impl SectionSpec {
    pub fn new(title: impl Into<String>, kind: SectionKind) -> Self {
        Self {
            title: title.into(),
            kind,
        }
    }

    /// Sections the home page is known to carry
    pub fn home_defaults() -> Vec<SectionSpec> {
        vec![
            SectionSpec::new("Son Eklenen Bölümler", SectionKind::LatestEpisodes),
            SectionSpec::new("Popüler Animeler", SectionKind::Entries),
            SectionSpec::new("Yeni Eklenen Animeler", SectionKind::Entries),
        ]
    }
}

impl Parser {
    /// Parse every known section of the home page
    ///
    /// Sections that are missing from the page come back with no items.
    pub fn parse_home(&self, html: &str, sections: &[SectionSpec]) -> Vec<HomeSection> {
        let document = Html::parse_document(html);

        sections
            .iter()
            .map(|spec| {
                let items = self.section_tiles(&document, spec);
                tracing::debug!("Section {:?}: {} items", spec.title, items.len());
                HomeSection {
                    title: spec.title.clone(),
                    kind: spec.kind,
                    items,
                }
            })
            .collect()
    }

    /// Parse a single home page section
    pub fn parse_section(&self, html: &str, spec: &SectionSpec) -> Vec<CatalogTile> {
        let document = Html::parse_document(html);
        self.section_tiles(&document, spec)
    }

    /// Parse a list or search result page
    ///
    /// There is no end-of-list marker on the site; a page with items is
    /// assumed to have a successor.
    pub fn parse_tile_page(&self, html: &str, page: u32) -> TilePage {
        let document = Html::parse_document(html);

        let items: Vec<CatalogTile> = self
            .selectors
            .page_card
            .all(document.root_element())
            .into_iter()
            .filter_map(|card| self.parse_card(card))
            .collect();

        TilePage {
            has_next_page: !items.is_empty(),
            items,
            page,
        }
    }

    fn section_tiles(&self, document: &Html, spec: &SectionSpec) -> Vec<CatalogTile> {
        let Some(heading) = self
            .selectors
            .section_heading
            .find(document.root_element(), |el| element_text(el) == spec.title.trim())
        else {
            tracing::debug!("Section heading {:?} not on page", spec.title);
            return Vec::new();
        };

        let Some(container) = self.section_container(heading) else {
            tracing::debug!("Section {:?} has no item container", spec.title);
            return Vec::new();
        };

        self.selectors
            .section_card
            .all(container)
            .into_iter()
            .filter_map(|card| self.parse_card(card))
            .collect()
    }

    /// Following sibling of the heading, or of its header wrapper
    fn section_container<'a>(&self, heading: ElementRef<'a>) -> Option<ElementRef<'a>> {
        let sibling_container = |el: ElementRef<'a>| {
            el.next_siblings()
                .filter_map(ElementRef::wrap)
                .find(|sibling| self.selectors.section_container.matches(sibling))
        };

        sibling_container(heading).or_else(|| {
            heading
                .parent()
                .and_then(ElementRef::wrap)
                .and_then(sibling_container)
        })
    }

    /// A card needs both a link and an image; anything else is skipped
    fn parse_card(&self, card: ElementRef<'_>) -> Option<CatalogTile> {
        let anchor = self.selectors.card_anchor.first(card)?;
        let image = self.selectors.card_image.first(card)?;

        let href = anchor.value().attr("href").unwrap_or_default();
        let id = match self.normalizer.path_of(href) {
            Ok(id) => id,
            Err(e) => {
                tracing::debug!("Skipping card: {}", e);
                return None;
            }
        };

        let title = first_attr_of(&anchor, &["title"])
            .or_else(|| Some(element_text(&anchor)).filter(|text| !text.is_empty()))
            .or_else(|| first_attr_of(&image, &["alt"]))
            .unwrap_or_default();

        let image_url = first_attr_of(&image, IMAGE_ATTRS)
            .map(|src| self.normalizer.normalize(&src))
            .unwrap_or_default();

        let subtitle = self.selectors.card_subtitle.first_text(card);

        Some(CatalogTile {
            id,
            title,
            image_url,
            subtitle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::test_parser;

    const HOME: &str = r#"
    <html><body>
        <div class="section">
            <h2>Son Eklenen Bölümler</h2>
            <div class="items">
                <div class="item">
                    <a href="/one-piece-1100-bolum/" title="One Piece">One Piece 1100</a>
                    <img data-src="//cdn.yeniwatch.net.tr/op.jpg" src="/placeholder.gif">
                    <span class="episode">1100. Bölüm</span>
                </div>
                <div class="item">
                    <a href="/bleach-5-bolum/">Bleach</a>
                </div>
            </div>
        </div>
        <div class="section">
            <div class="section-header"><h2>Popüler Animeler</h2></div>
            <div class="list-items">
                <div class="item">
                    <a href="https://yeniwatch.net.tr/anime/naruto/?from=home">Naruto</a>
                    <img src="/img/naruto.jpg">
                </div>
            </div>
        </div>
        <div class="section">
            <h2>Yeni Eklenen Animeler</h2>
            <div class="items"></div>
        </div>
    </body></html>
    "#;

    #[test]
    fn test_parse_section_with_cards() {
        let parser = test_parser();
        let spec = SectionSpec::new("Son Eklenen Bölümler", SectionKind::LatestEpisodes);
        let tiles = parser.parse_section(HOME, &spec);

        // The Bleach card has no image
        assert_eq!(tiles.len(), 1);
        let tile = &tiles[0];
        assert_eq!(tile.id, "/one-piece-1100-bolum/");
        assert_eq!(tile.title, "One Piece");
        assert_eq!(tile.image_url, "https://cdn.yeniwatch.net.tr/op.jpg");
        assert_eq!(tile.subtitle.as_deref(), Some("1100. Bölüm"));
    }

    #[test]
    fn test_parse_section_wrapped_heading() {
        let parser = test_parser();
        let spec = SectionSpec::new("Popüler Animeler", SectionKind::Entries);
        let tiles = parser.parse_section(HOME, &spec);

        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].id, "/anime/naruto/");
        assert_eq!(tiles[0].title, "Naruto");
        assert_eq!(tiles[0].image_url, "https://yeniwatch.net.tr/img/naruto.jpg");
        assert_eq!(tiles[0].subtitle, None);
    }

    #[test]
    fn test_parse_section_empty_container() {
        let parser = test_parser();
        let spec = SectionSpec::new("Yeni Eklenen Animeler", SectionKind::Entries);
        assert!(parser.parse_section(HOME, &spec).is_empty());
    }

    #[test]
    fn test_parse_section_missing_heading() {
        let parser = test_parser();
        let spec = SectionSpec::new("Haftanın Animeleri", SectionKind::Entries);
        assert!(parser.parse_section(HOME, &spec).is_empty());
    }

    #[test]
    fn test_parse_section_heading_without_container() {
        let parser = test_parser();
        let html = "<html><body><h2>Popüler Animeler</h2><p>Yakında</p></body></html>";
        let spec = SectionSpec::new("Popüler Animeler", SectionKind::Entries);
        assert!(parser.parse_section(html, &spec).is_empty());
    }

    #[test]
    fn test_parse_home_keeps_section_order() {
        let parser = test_parser();
        let sections = parser.parse_home(HOME, &SectionSpec::home_defaults());

        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].title, "Son Eklenen Bölümler");
        assert_eq!(sections[0].kind, SectionKind::LatestEpisodes);
        assert_eq!(sections[0].items.len(), 1);
        assert_eq!(sections[1].items.len(), 1);
        assert!(sections[2].items.is_empty());
    }

    #[test]
    fn test_parse_tile_page() {
        let parser = test_parser();
        let html = r#"
        <div class="listupd">
            <article class="bs">
                <a href="/anime/bleach/" title="Bleach"><h2>Bleach TYBW</h2></a>
                <img src="bleach.jpg">
                <span class="epx">Tamamlandı</span>
            </article>
            <article class="bs">
                <a href="javascript:void(0)">Broken</a>
                <img src="x.jpg">
            </article>
        </div>
        "#;

        let page = parser.parse_tile_page(html, 2);
        assert_eq!(page.page, 2);
        assert!(page.has_next_page);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].title, "Bleach");
        assert_eq!(page.items[0].image_url, "https://yeniwatch.net.tr/bleach.jpg");
        assert_eq!(page.items[0].subtitle.as_deref(), Some("Tamamlandı"));
    }

    #[test]
    fn test_parse_tile_page_empty() {
        let parser = test_parser();
        let page = parser.parse_tile_page("<html><body></body></html>", 7);
        assert!(page.items.is_empty());
        assert!(!page.has_next_page);
    }

    #[test]
    fn test_title_falls_back_to_text_then_alt() {
        let parser = test_parser();
        let html = r#"
        <div class="items">
            <div class="item"><a href="/anime/a/">  Text Title </a><img src="a.jpg" alt="Alt A"></div>
            <div class="item"><a href="/anime/b/"><img src="b.jpg" alt="Alt B"></a></div>
        </div>
        "#;
        let page = parser.parse_tile_page(html, 1);
        assert_eq!(page.items[0].title, "Text Title");
        assert_eq!(page.items[1].title, "Alt B");
    }
}
