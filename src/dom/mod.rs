//! HTML document model for chapter files.
//!
//! Chapters are parsed with html5ever into an [`ArenaDom`], queried with CSS
//! selectors and serialized back to markup.
//!
//! ```
//! use vsi::dom::{inner_html, parse_html, select};
//!
//! let dom = parse_html(r#"<div class="chunkBody"><p>Hello</p></div>"#);
//! let body = select(&dom, dom.document(), ".chunkBody").unwrap()[0];
//! assert_eq!(inner_html(&dom, body), "<p>Hello</p>");
//! ```

mod arena;
mod element_ref;
mod serialize;
mod tree_sink;

pub use arena::{ArenaDom, ArenaNode, ArenaNodeData, ArenaNodeId, Attribute};
pub use element_ref::{DomSelectors, ElementRef, parse_selector};
pub use serialize::{escape_attr, escape_text, inner_html, outer_html};

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use selectors::context::SelectorCaches;

use crate::error::Result;
use tree_sink::ArenaSink;

/// Parse an HTML document into an arena DOM.
///
/// Parsing never fails; malformed markup is recovered the way browsers do.
pub fn parse_html(html: &str) -> ArenaDom {
    let sink = ArenaSink::new();
    parse_document(sink, ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes())
        .into_dom()
}

/// Find all elements under `root` (excluding `root` itself) that match a CSS
/// selector, in document order.
pub fn select(dom: &ArenaDom, root: ArenaNodeId, selector: &str) -> Result<Vec<ArenaNodeId>> {
    let selector = parse_selector(selector)?;
    let mut caches = SelectorCaches::default();

    Ok(dom
        .descendants(root)
        .skip(1)
        .filter(|&id| dom.is_element(id))
        .filter(|&id| ElementRef::new(dom, id).matches(&selector, &mut caches))
        .collect())
}
