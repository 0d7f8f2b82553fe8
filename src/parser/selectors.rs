//! Selector fallback chains
//!
//! The site has gone through several templates and still serves pages from
//! all of them. Each field is described by an ordered list of candidate CSS
//! selectors and the first candidate that yields something wins.

use scraper::{ElementRef, Selector};

/// Ordered candidate selectors for one field
#[derive(Debug, Clone)]
pub struct SelectorChain {
    candidates: Vec<Selector>,
}

impl SelectorChain {
    /// Build a chain; selectors that fail to parse are logged and left out
    pub fn new(sources: &[&str]) -> Self {
        let candidates = sources
            .iter()
            .filter_map(|source| match Selector::parse(source) {
                Ok(selector) => Some(selector),
                Err(e) => {
                    tracing::warn!("Skipping invalid selector {:?}: {:?}", source, e);
                    None
                }
            })
            .collect();

        Self { candidates }
    }

    /// First element of the first candidate that matches anything
    pub fn first<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.candidates
            .iter()
            .find_map(|selector| scope.select(selector).next())
    }

    /// Every element of the first candidate that matches anything
    pub fn all<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        self.candidates
            .iter()
            .map(|selector| scope.select(selector).collect::<Vec<_>>())
            .find(|found| !found.is_empty())
            .unwrap_or_default()
    }

    /// First non-empty trimmed text across all candidates
    pub fn first_text(&self, scope: ElementRef<'_>) -> Option<String> {
        self.candidates.iter().find_map(|selector| {
            scope
                .select(selector)
                .map(|el| element_text(&el))
                .find(|text| !text.is_empty())
        })
    }

    /// First non-empty value of any of `attrs` (in order) across all candidates
    pub fn first_attr(&self, scope: ElementRef<'_>, attrs: &[&str]) -> Option<String> {
        self.candidates.iter().find_map(|selector| {
            scope
                .select(selector)
                .find_map(|el| first_attr_of(&el, attrs))
        })
    }

    /// First element across all candidates accepted by `predicate`
    pub fn find<'a, P>(&self, scope: ElementRef<'a>, mut predicate: P) -> Option<ElementRef<'a>>
    where
        P: FnMut(&ElementRef<'a>) -> bool,
    {
        self.candidates
            .iter()
            .find_map(|selector| scope.select(selector).find(|el| predicate(el)))
    }

    /// Whether `element` itself matches any candidate
    pub fn matches(&self, element: &ElementRef<'_>) -> bool {
        self.candidates
            .iter()
            .any(|selector| selector.matches(element))
    }
}

/// Text content with runs of whitespace collapsed
pub fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// First present, non-blank attribute value
pub fn first_attr_of(element: &ElementRef<'_>, attrs: &[&str]) -> Option<String> {
    attrs.iter().find_map(|attr| {
        element
            .value()
            .attr(attr)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    })
}

/// Lazy-loading attribute first, then the plain one
pub const IMAGE_ATTRS: &[&str] = &["data-src", "data-lazy-src", "src"];

/// Attributes that carry a ready-to-use player URL on a server anchor
pub const EMBED_ATTRS: &[&str] = &["data-embed", "data-frame", "data-video"];

/// Every selector chain the parsers use, one per field
#[derive(Debug, Clone)]
pub struct SiteSelectors {
    /// Home page section headings
    pub section_heading: SelectorChain,
    /// Element following a heading that holds the cards
    pub section_container: SelectorChain,
    /// Cards inside a section container
    pub section_card: SelectorChain,
    /// Cards on list and search pages
    pub page_card: SelectorChain,
    pub card_anchor: SelectorChain,
    pub card_image: SelectorChain,
    /// Episode caption on a card
    pub card_subtitle: SelectorChain,
    pub detail_title: SelectorChain,
    pub detail_image: SelectorChain,
    pub detail_description: SelectorChain,
    /// Label/value rows of the info box
    pub info_row: SelectorChain,
    /// Label part of an info row
    pub info_label: SelectorChain,
    pub episode_link: SelectorChain,
    pub server_link: SelectorChain,
}

impl Default for SiteSelectors {
    fn default() -> Self {
        Self {
            section_heading: SelectorChain::new(&[
                "div.section-header h2",
                "h2.section-title",
                "h3.widget-title",
                "div.releases h2",
                "h2",
                "h3",
            ]),
            section_container: SelectorChain::new(&[
                "div.items",
                "div.list-items",
                "ul.anime-list",
                "div.listupd",
            ]),
            section_card: SelectorChain::new(&["div.item", "article.bs", "li.anime-item"]),
            page_card: SelectorChain::new(&[
                "div.listupd article.bs",
                "div.items div.item",
                "ul.anime-list li.anime-item",
            ]),
            card_anchor: SelectorChain::new(&["a[href]"]),
            card_image: SelectorChain::new(&["img"]),
            card_subtitle: SelectorChain::new(&[
                "span.episode",
                "span.epx",
                "div.epin",
                "span.ep-label",
            ]),
            detail_title: SelectorChain::new(&[
                "h1.anime-title",
                "div.anime-info h1",
                "h1.entry-title",
            ]),
            detail_image: SelectorChain::new(&[
                "div.anime-cover img",
                "div.thumb img",
                "div.poster img",
            ]),
            detail_description: SelectorChain::new(&[
                "div.anime-desc",
                "div.entry-content[itemprop=\"description\"]",
                "div.desc",
                "div.synopsis p",
            ]),
            info_row: SelectorChain::new(&[
                "ul.anime-info li",
                "div.info-list li",
                "div.spe span",
            ]),
            info_label: SelectorChain::new(&["span.label", "b", "strong"]),
            episode_link: SelectorChain::new(&[
                "ul.episodes-list li a",
                "div.eplister ul li a",
                "div.episode-list a",
                "a.episode-link",
            ]),
            server_link: SelectorChain::new(&[
                "div.server-list a",
                "ul.servers li a",
                "div#alternatif a",
                "div.player-servers a",
            ]),
        }
    }
}
