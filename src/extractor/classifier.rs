//! # Context Classifier
//!
//! Locates every text-node occurrence of a keyword and classifies the
//! surrounding structure into one of four context types. The first rule that
//! applies wins:
//!
//! 1. `TableRow`: the match sits in a table row; every cell is joined with
//!    `" | "`.
//! 2. `SectionHeader`: the match's containing element is a heading,
//!    definition term or bold element; the snippet pairs it with the next
//!    sibling element as `"<header>: <value>"`, falling back to the header's
//!    parent text when there is no value.
//! 3. `ListItem`: the match sits in a list item; the item's text is used.
//! 4. `TextBlock`: the nearest paragraph, div or article (never above
//!    `<body>`), truncated around the keyword when it is long.
//!
//! Snippets shorter than three characters or mentioning "copyright" are
//! dropped, as are exact repeats for the same keyword on the same page.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::extractor::config::SnippetLimits;
use crate::extractor::document::{DomDocument, DomNode};
use crate::extractor::text::{contains_ignore_case, keyword_window, normalize_whitespace};

const ROW_TAGS: &[&str] = &["tr"];
const CELL_TAGS: &[&str] = &["td", "th"];
const HEADER_TAGS: &[&str] = &["dt", "b", "strong", "h1", "h2", "h3", "h4", "h5", "h6"];
const LIST_ITEM_TAGS: &[&str] = &["li"];
const BLOCK_TAGS: &[&str] = &["p", "div", "article"];
const BODY_TAGS: &[&str] = &["body"];

const MIN_SNIPPET_CHARS: usize = 3;
const BLOCKED_TOKEN: &str = "copyright";

/// The structural feature a keyword match was found inside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextType {
    #[serde(rename = "Table Row")]
    TableRow,
    #[serde(rename = "Section Header")]
    SectionHeader,
    #[serde(rename = "List Item")]
    ListItem,
    #[serde(rename = "Text Block")]
    TextBlock,
}

impl ContextType {
    /// Label written to the export sink
    pub fn label(self) -> &'static str {
        match self {
            ContextType::TableRow => "Table Row",
            ContextType::SectionHeader => "Section Header",
            ContextType::ListItem => "List Item",
            ContextType::TextBlock => "Text Block",
        }
    }
}

impl fmt::Display for ContextType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One piece of evidence: a snippet, the keyword that surfaced it, and the
/// page it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    /// Keyword that triggered the match
    pub keyword: String,

    /// Normalized, possibly truncated snippet text
    pub context: String,

    /// Structural classification of the match
    #[serde(rename = "type")]
    pub context_type: ContextType,

    /// Page the record was found on
    pub url: String,
}

/// Classify the neighborhood of one matching text node.
///
/// Returns `None` only when the node has no enclosing element.
pub fn classify_match<N: DomNode>(
    text_node: N,
    keyword: &str,
    limits: &SnippetLimits,
) -> Option<(ContextType, String)> {
    let element = text_node.parent_element()?;

    if let Some(row) = element.closest(|n| n.is_named(ROW_TAGS)) {
        let cells: Vec<String> = row
            .descendants_named(CELL_TAGS)
            .iter()
            .map(|cell| normalize_whitespace(&cell.text_content()))
            .collect();
        return Some((ContextType::TableRow, cells.join(" | ")));
    }

    if element.is_named(HEADER_TAGS) {
        return Some((ContextType::SectionHeader, header_snippet(element)));
    }

    if let Some(item) = element.closest(|n| n.is_named(LIST_ITEM_TAGS)) {
        return Some((
            ContextType::ListItem,
            normalize_whitespace(&item.joined_text()),
        ));
    }

    Some((
        ContextType::TextBlock,
        text_block_snippet(element, keyword, limits),
    ))
}

fn header_snippet<N: DomNode>(header: N) -> String {
    let title = normalize_whitespace(&header.text_content());
    let value = header
        .next_element_sibling()
        .map(|sibling| normalize_whitespace(&sibling.text_content()))
        .unwrap_or_default();

    if !value.is_empty() {
        return format!("{title}: {value}");
    }

    header
        .parent_element()
        .map(|parent| normalize_whitespace(&parent.text_content()))
        .unwrap_or(title)
}

fn text_block_snippet<N: DomNode>(element: N, keyword: &str, limits: &SnippetLimits) -> String {
    let mut container = element;
    while !container.is_named(BLOCK_TAGS) {
        match container.parent_element() {
            Some(parent) => {
                container = parent;
                if container.is_named(BODY_TAGS) {
                    break;
                }
            }
            None => break,
        }
    }

    let block = normalize_whitespace(&container.joined_text());
    if block.chars().count() > limits.max_block_chars {
        keyword_window(&block, keyword, limits.window_before, limits.window_after)
    } else {
        block
    }
}

fn is_admissible(snippet: &str) -> bool {
    snippet.chars().count() >= MIN_SNIPPET_CHARS && !contains_ignore_case(snippet, BLOCKED_TOKEN)
}

/// Produce the records for one keyword on one page, in document order.
///
/// Duplicate snippets are suppressed only within this keyword; the same
/// snippet surfaced by another keyword is kept as its own record.
pub fn extract_keyword_records<D: DomDocument>(
    document: &D,
    keyword: &str,
    url: &str,
    limits: &SnippetLimits,
) -> Vec<ExtractionRecord> {
    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for text_node in document.text_nodes_containing(keyword) {
        let Some((context_type, context)) = classify_match(text_node, keyword, limits) else {
            continue;
        };

        if !is_admissible(&context) || !seen.insert(context.clone()) {
            continue;
        }

        records.push(ExtractionRecord {
            keyword: keyword.to_string(),
            context,
            context_type,
            url: url.to_string(),
        });
    }

    records
}

/// Run the classifier for every keyword, concatenating results in keyword
/// order.
#[instrument(skip(document, keywords, limits))]
pub fn extract_records<D: DomDocument>(
    document: &D,
    keywords: &[String],
    url: &str,
    limits: &SnippetLimits,
) -> Vec<ExtractionRecord> {
    let records: Vec<ExtractionRecord> = keywords
        .iter()
        .flat_map(|keyword| extract_keyword_records(document, keyword, url, limits))
        .collect();
    debug!("Extracted {} records", records.len());
    records
}
