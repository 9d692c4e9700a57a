//! In-brief gloss extraction from the lookup site's rendered search page.

use std::sync::LazyLock;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, error};

use super::browser::BrowserFetcher;
use super::http_client::HeaderPool;
use super::GlossFetcher;

/// Placeholder returned when the page carries no usable gloss.
pub const DEFINITION_NOT_FOUND: &str = "Definition not found.";

static INBRIEF_CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.ol_inbrief").expect("valid container selector"));
static INBRIEF_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.ol_inbrief_title").expect("valid title selector"));

/// Search page URL for `word` on the lookup host.
pub fn search_url(base: &str, word: &str) -> String {
    format!(
        "{}/?w={}&ls=a",
        base.trim_end_matches('/'),
        urlencoding::encode(word.trim())
    )
}

/// Append `fragment`, separated by one space unless `out` already ends in
/// whitespace.
fn push_fragment(out: &mut String, fragment: &str) {
    if fragment.is_empty() {
        return;
    }
    if !out.is_empty() && !out.ends_with(char::is_whitespace) {
        out.push(' ');
    }
    out.push_str(fragment);
}

/// Extract the "usually means" gloss from a rendered search page.
///
/// Everything after the title span inside the in-brief container is joined:
/// text nodes trimmed, elements flattened to their trimmed text. Returns
/// [`DEFINITION_NOT_FOUND`] when the container or span is missing or the
/// result is empty.
pub fn extract_inbrief(html: &str) -> String {
    let document = Html::parse_document(html);

    let Some(container) = document.select(&INBRIEF_CONTAINER).next() else {
        return DEFINITION_NOT_FOUND.to_string();
    };
    let Some(title) = container.select(&INBRIEF_TITLE).next() else {
        return DEFINITION_NOT_FOUND.to_string();
    };

    let mut definition = String::new();
    for sibling in title.next_siblings() {
        match sibling.value() {
            Node::Text(text) => push_fragment(&mut definition, text.trim()),
            Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(sibling) {
                    let text: String = element
                        .text()
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .collect();
                    push_fragment(&mut definition, &text);
                }
            }
            _ => {}
        }
    }

    let definition = definition.trim();
    if definition.is_empty() {
        DEFINITION_NOT_FOUND.to_string()
    } else {
        definition.to_string()
    }
}

/// Gloss lookup that renders the search page in a headless browser.
pub struct BrowserGlossFetcher {
    browser: BrowserFetcher,
    lookup_base: String,
    headers: HeaderPool,
}

impl BrowserGlossFetcher {
    pub fn new(browser: BrowserFetcher, lookup_base: &str, headers: HeaderPool) -> Self {
        Self {
            browser,
            lookup_base: lookup_base.to_string(),
            headers,
        }
    }
}

#[async_trait]
impl GlossFetcher for BrowserGlossFetcher {
    async fn fetch(&self, word: &str) -> Option<String> {
        let url = search_url(&self.lookup_base, word);
        let user_agent = self.headers.user_agent(&mut rand::thread_rng()).to_string();

        match self.browser.render(&url, &user_agent).await {
            Ok(html) => {
                let gloss = extract_inbrief(&html);
                debug!("Gloss for '{}': {}", word, gloss);
                Some(gloss)
            }
            Err(e) => {
                error!("Error fetching gloss for '{}': {:#}", word, e);
                None
            }
        }
    }
}
