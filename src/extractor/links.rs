//! Link relevance filter
//!
//! Selects same-domain anchors whose visible text or raw `href` mentions a
//! keyword. Candidates are returned in discovery order, deduplicated by exact
//! URL.

use std::collections::HashSet;

use tracing::debug;
use url::Url;

use crate::extractor::document::{DomDocument, DomNode};
use crate::extractor::text::normalize_whitespace;

/// Two URLs share a domain when host and explicit port are identical
pub fn same_domain(a: &Url, b: &Url) -> bool {
    a.host_str() == b.host_str() && a.port() == b.port()
}

/// Collect keyword-relevant, same-domain links from `document`.
///
/// Relative hrefs are resolved against `base`. Cross-domain links are never
/// returned, however relevant their anchor text is.
pub fn find_relevant_links<D: DomDocument>(
    base: &Url,
    document: &D,
    keywords: &[String],
) -> Vec<Url> {
    let lowered: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in document.elements_named("a") {
        let Some(href) = anchor.attr("href") else {
            continue;
        };

        let Ok(resolved) = base.join(href) else {
            debug!("Skipping unresolvable href {:?}", href);
            continue;
        };
        if !same_domain(base, &resolved) {
            continue;
        }

        let text = normalize_whitespace(&anchor.joined_text()).to_lowercase();
        let href = href.to_lowercase();
        let relevant = lowered
            .iter()
            .any(|keyword| text.contains(keyword.as_str()) || href.contains(keyword.as_str()));

        if relevant && seen.insert(resolved.as_str().to_string()) {
            links.push(resolved);
        }
    }

    debug!("Found {} relevant links on {}", links.len(), base);
    links
}
