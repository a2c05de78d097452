//! Cached regex patterns for chapter cleanup.
//!
//! Compiled once on first use and shared by every chapter.

use regex_lite::Regex;
use std::sync::LazyLock;

// === Title patterns ===

/// "p. 123. Chapter Name": page number, then chapter number, then the name.
pub static TITLE_PAGE_AND_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"p. \d*. (.*)").unwrap());

/// "p. 123Chapter": page number glued to the name.
pub static TITLE_PAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"p. \d+([a-zA-Z]+)").unwrap());

// === Body patterns ===

/// Source-site navigation list, from the opening tag to the last `</ul>` on
/// the same line. `.` does not cross line breaks.
pub static NAV_LIST_GREEDY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<ul class="div1-nav">.*</ul>"#).unwrap());

/// Source-site navigation list, up to its nearest `</ul>` on the same line.
pub static NAV_LIST_LAZY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<ul class="div1-nav">.*?</ul>"#).unwrap());

/// Printed page marker, e.g. `<span id="p12" class="printPage">p. 12</span>`.
pub static PAGE_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<span id="\w*" class="printPage">p\. \d*</span>"#).unwrap()
});

/// Page-break pilcrow. Some scraped pages carry the arrow double-encoded.
pub static PAGE_MARK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<span title="\w*" class="printPageMark">(?:↵|â†µ)</span>"#).unwrap()
});
