//! Server discovery on episode pages

use lazy_static::lazy_static;
use regex::Regex;
use scraper::Html;

use super::selectors::{element_text, first_attr_of, EMBED_ATTRS};
use super::Parser;
use crate::models::{ServerRef, ServerResolution};

lazy_static! {
    /// `loadVideo('123', 'fembed')` style handlers
    static ref ONCLICK_CALL: Regex =
        Regex::new(r"\w+\(\s*'([^']*)'\s*,\s*'([^']*)'\s*\)").unwrap();
}

impl Parser {
    /// List the servers offered on an episode page, in page order
    ///
    /// Anchors that carry neither an embed URL nor a recognizable click
    /// handler are dropped.
    pub fn parse_servers(&self, html: &str) -> Vec<ServerRef> {
        let document = Html::parse_document(html);

        self.selectors
            .server_link
            .all(document.root_element())
            .into_iter()
            .enumerate()
            .filter_map(|(index, anchor)| {
                let name = Some(element_text(&anchor))
                    .filter(|text| !text.is_empty())
                    .or_else(|| first_attr_of(&anchor, &["title"]))
                    .unwrap_or_else(|| format!("Server {}", index + 1));

                if let Some(embed) = first_attr_of(&anchor, EMBED_ATTRS) {
                    return Some(ServerRef {
                        name,
                        resolution: ServerResolution::DirectEmbed {
                            url: self.normalizer.normalize(&embed),
                        },
                    });
                }

                let onclick = anchor.value().attr("onclick").unwrap_or_default();
                match ONCLICK_CALL.captures(onclick) {
                    Some(caps) => Some(ServerRef {
                        name,
                        resolution: ServerResolution::Obfuscated {
                            id: caps[1].to_string(),
                            type_tag: caps[2].to_string(),
                        },
                    }),
                    None => {
                        tracing::debug!("Server anchor {:?} has nothing to resolve", name);
                        None
                    }
                }
            })
            .collect()
    }
}
