//! Light OCR text clean-up
//!
//! Does not try to parse sections or extract meaning. The transform is
//! idempotent: normalizing already-normalized text changes nothing.

use std::sync::LazyLock;

use regex::Regex;

/// Characters kept in a response preview
pub const PREVIEW_CHARS: usize = 500;

static PAGE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-{2,}\s*Page\s*\d+\s*-{2,}").expect("valid regex"));
static BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[•*=]\s*").expect("valid regex"));
static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));
static HORIZONTAL_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").expect("valid regex"));

/// Normalize merged OCR text
///
/// 1. Strip page markers
/// 2. Rewrite `•`, `*` and `=` bullets as `"\n- "`
/// 3. Collapse three or more newlines to two
/// 4. Collapse runs of spaces and tabs, then trim
pub fn normalize_ocr_text(text: &str) -> String {
    let mut text = text.to_string();

    // Removing one marker can splice the halves of another together
    while PAGE_MARKER.is_match(&text) {
        text = PAGE_MARKER.replace_all(&text, "").into_owned();
    }

    let text = BULLET.replace_all(&text, "\n- ");
    let text = BLANK_LINES.replace_all(&text, "\n\n");
    let text = HORIZONTAL_SPACE.replace_all(&text, " ");

    text.trim().to_string()
}

/// The first [`PREVIEW_CHARS`] characters of `text`
pub fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}
