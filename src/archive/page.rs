//! Open Graph metadata scraping.

use super::MetadataFetcher;
use crate::error::{LedgerError, Result};
use crate::types::PageMeta;
use reqwest::blocking::Client;
use scraper::{Html, Selector};

/// Fetches a page and reads its `og:title` / `og:image` meta tags.
pub struct OgMetaFetcher {
    client: Client,
}

impl OgMetaFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl MetadataFetcher for OgMetaFetcher {
    fn fetch(&self, url: &str) -> Result<PageMeta> {
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(LedgerError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(parse_page_meta(&response.text()?))
    }
}

struct MetaSelectors {
    title: Selector,
    image: Selector,
}

impl MetaSelectors {
    fn new() -> Self {
        Self {
            title: Selector::parse(r#"meta[property="og:title"]"#).expect("og:title selector"),
            image: Selector::parse(r#"meta[property="og:image"]"#).expect("og:image selector"),
        }
    }
}

/// Extract page metadata from HTML.
///
/// The description is the part of `og:title` after the first `|` (the
/// part before it is a generic site label). A title without `|`, or a
/// missing tag, gives an empty description.
pub fn parse_page_meta(html: &str) -> PageMeta {
    let document = Html::parse_document(html);
    let selectors = MetaSelectors::new();

    let content = |selector: &Selector| {
        document
            .select(selector)
            .next()
            .and_then(|el| el.value().attr("content"))
            .unwrap_or("")
            .to_string()
    };

    let title = content(&selectors.title);
    let description = title
        .split_once('|')
        .map(|(_, prompt)| prompt.trim().to_string())
        .unwrap_or_default();

    PageMeta {
        description,
        image_url: content(&selectors.image),
    }
}
