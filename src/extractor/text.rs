//! Text normalization helpers shared by the classifier and the link filter

/// Collapse every run of whitespace into a single space and trim both ends.
///
/// Normalizing already-normalized text returns it unchanged.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Case-insensitive substring test
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Split an operator-supplied, comma-separated keyword list.
///
/// Entries are trimmed and empty entries dropped; input order is kept.
pub fn split_keywords(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect()
}

fn chars_eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

/// Find the first case-insensitive occurrence of `needle` in `haystack`.
///
/// The returned position counts characters, not bytes.
pub fn find_ignore_case(haystack: &[char], needle: &str) -> Option<usize> {
    let needle: Vec<char> = needle.chars().collect();
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > haystack.len() {
        return None;
    }

    (0..=haystack.len() - needle.len()).find(|&start| {
        needle
            .iter()
            .zip(&haystack[start..])
            .all(|(n, h)| chars_eq_ignore_case(*n, *h))
    })
}

/// Cut a window around the first occurrence of `keyword` and wrap it in
/// ellipsis markers.
///
/// The window spans up to `before` characters ahead of the keyword and ends
/// `after` characters past the keyword's first character. When the keyword
/// cannot be located the window starts at the beginning of the text.
pub fn keyword_window(text: &str, keyword: &str, before: usize, after: usize) -> String {
    let chars: Vec<char> = text.chars().collect();

    let (start, end) = match find_ignore_case(&chars, keyword) {
        Some(pos) => (pos.saturating_sub(before), (pos + after).min(chars.len())),
        // Mirrors an unmatched position of -1: window is [0, after - 1)
        None => (0, after.saturating_sub(1).min(chars.len())),
    };

    let slice: String = chars[start..end].iter().collect();
    format!("...{slice}...")
}
