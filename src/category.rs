//! Link extraction for MediaWiki category pages.
//!
//! A category page lists its members inside `<div id="mw-pages">`, one `<li>`
//! per member. The first anchor of each item carries the member's title.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use thiserror::Error;

static MW_PAGES: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div#mw-pages").expect("valid selector"));
static LIST_ITEM: Lazy<Selector> = Lazy::new(|| Selector::parse("li").expect("valid selector"));
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("valid selector"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CategoryError {
    #[error("Could not find root node for the anime titles.")]
    MissingRoot,
    #[error("No page links were found.")]
    NoLinks,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkItem {
    pub title: String,
    pub href: Option<String>,
}

impl From<ElementRef<'_>> for LinkItem {
    fn from(anchor: ElementRef<'_>) -> Self {
        let attrs = anchor.value();
        LinkItem {
            title: attrs.attr("title").unwrap_or_default().to_string(),
            href: attrs.attr("href").map(str::to_string),
        }
    }
}

/// Returns the first link of every list item under `#mw-pages`, in document order.
///
/// An empty result is never returned: a page without the container or
/// without any linked item is reported as an error.
pub fn page_titles(html: &str) -> Result<Vec<LinkItem>, CategoryError> {
    let document = Html::parse_document(html);
    let root = document
        .select(&MW_PAGES)
        .next()
        .ok_or(CategoryError::MissingRoot)?;

    let links: Vec<LinkItem> = root
        .select(&LIST_ITEM)
        .filter_map(|li| li.select(&ANCHOR).next())
        .map(LinkItem::from)
        .collect();

    if links.is_empty() {
        return Err(CategoryError::NoLinks);
    }

    Ok(links)
}
