use scraper::{Html, Selector};
use std::collections::BTreeSet;
use tracing::debug;
use url::Url;

/// Pulls outbound article links out of fetched page content.
///
/// Returned links are absolute, resolved against `origin`. Content that
/// cannot be parsed yields an empty set rather than an error.
pub trait LinkExtractor: Send + Sync {
    fn extract_links(&self, content: &str, origin: &Url) -> BTreeSet<String>;
}

/// Keeps internal article references: hrefs under `/wiki/` with no
/// namespace colon (`File:`, `Special:`, `Talk:` and friends are skipped).
pub struct WikiLinkExtractor {
    link_selector: Selector,
}

impl WikiLinkExtractor {
    pub const ARTICLE_PREFIX: &'static str = "/wiki/";

    pub fn new() -> Self {
        Self {
            link_selector: Selector::parse("a[href]").expect("static selector is valid"),
        }
    }

    fn is_article_href(href: &str) -> bool {
        href.starts_with(Self::ARTICLE_PREFIX) && !href.contains(':')
    }
}

impl Default for WikiLinkExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkExtractor for WikiLinkExtractor {
    fn extract_links(&self, content: &str, origin: &Url) -> BTreeSet<String> {
        let document = Html::parse_document(content);
        let mut links = BTreeSet::new();

        for element in document.select(&self.link_selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            if !Self::is_article_href(href) {
                continue;
            }
            match origin.join(href) {
                Ok(absolute) => {
                    links.insert(absolute.to_string());
                }
                Err(e) => debug!("Skipping unresolvable href {}: {}", href, e),
            }
        }

        debug!("Extracted {} article links", links.len());
        links
    }
}
