//! Page aggregation

use std::collections::BTreeMap;

use crate::ocr::PageText;

/// Boundary line placed before each page's text
pub fn page_marker(page: usize) -> String {
    format!("--- Page {} ---", page)
}

/// Combine per-page text into one string, in ascending page order
///
/// Each page is its marker line followed by the trimmed text; pages are
/// separated by a blank line. No pages gives an empty string.
pub fn merge_page_texts(pages: &BTreeMap<usize, PageText>) -> String {
    pages
        .iter()
        .map(|(page, text)| format!("{}\n{}", page_marker(*page), text.text.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}
