//! XHTML-flavoured serialization of ArenaDom subtrees.
//!
//! Output is what ends up inside a section's `<body>`, so void elements are
//! self-closed and text is escaped for XML. Attributes keep their source
//! order, which the markup cleanup patterns rely on.

use std::fmt::Write;

use super::arena::{ArenaDom, ArenaNodeData, ArenaNodeId};
use crate::util::escape_xml;

/// HTML void elements, emitted as `<name .../>`.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose text content is emitted without escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Serialize the children of a node (the node's own tag is not included).
pub fn inner_html(dom: &ArenaDom, id: ArenaNodeId) -> String {
    let mut out = String::new();
    for child in dom.children(id) {
        write_node(dom, child, &mut out, false);
    }
    out
}

/// Serialize a node including its own tag.
pub fn outer_html(dom: &ArenaDom, id: ArenaNodeId) -> String {
    let mut out = String::new();
    write_node(dom, id, &mut out, false);
    out
}

fn write_node(dom: &ArenaDom, id: ArenaNodeId, out: &mut String, raw_text: bool) {
    let Some(node) = dom.get(id) else {
        return;
    };

    match &node.data {
        ArenaNodeData::Document => {
            for child in dom.children(id) {
                write_node(dom, child, out, false);
            }
        }
        ArenaNodeData::Element { name, attrs, .. } => {
            let tag = name.local.as_ref();
            out.push('<');
            out.push_str(tag);
            for attr in attrs {
                let _ = write!(
                    out,
                    " {}=\"{}\"",
                    attr.name.local.as_ref(),
                    escape_attr(&attr.value)
                );
            }

            if VOID_ELEMENTS.contains(&tag) {
                out.push_str("/>");
                return;
            }
            out.push('>');

            let raw = RAW_TEXT_ELEMENTS.contains(&tag);
            for child in dom.children(id) {
                write_node(dom, child, out, raw);
            }

            let _ = write!(out, "</{tag}>");
        }
        ArenaNodeData::Text(text) => {
            if raw_text {
                out.push_str(text);
            } else {
                out.push_str(&escape_text(text));
            }
        }
        ArenaNodeData::Comment(text) => {
            let _ = write!(out, "<!--{text}-->");
        }
        ArenaNodeData::Doctype { .. } => {}
    }
}

/// Escape text content. Quotes are left alone so prose stays readable.
pub fn escape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '\u{a0}' => result.push_str("&#160;"),
            _ => result.push(c),
        }
    }
    result
}

/// Escape an attribute value for a double-quoted attribute.
pub fn escape_attr(s: &str) -> String {
    escape_xml(s).replace("&apos;", "'")
}

#[cfg(test)]
mod tests {
    use super::super::parse_html;
    use super::*;

    #[test]
    fn test_void_elements_self_close() {
        let dom = parse_html(r#"<div><img src="pic.png" alt="x"><br><p>Hello</p></div>"#);
        let div = dom.find_by_tag("div").unwrap();

        assert_eq!(
            inner_html(&dom, div),
            r#"<img src="pic.png" alt="x"/><br/><p>Hello</p>"#
        );
    }

    #[test]
    fn test_attribute_order_preserved() {
        let html = r#"<p><span id="page12" class="printPage">p. 12</span></p>"#;
        let dom = parse_html(html);
        let p = dom.find_by_tag("p").unwrap();

        assert_eq!(outer_html(&dom, p), html);
    }

    #[test]
    fn test_text_and_attributes_escaped() {
        let dom = parse_html(r#"<p title="a &quot;b&quot;">x &lt; y &amp; z</p>"#);
        let p = dom.find_by_tag("p").unwrap();

        assert_eq!(
            outer_html(&dom, p),
            r#"<p title="a &quot;b&quot;">x &lt; y &amp; z</p>"#
        );
    }

    #[test]
    fn test_non_breaking_space_is_numeric_reference() {
        let dom = parse_html("<p>a&nbsp;b</p>");
        let p = dom.find_by_tag("p").unwrap();

        assert_eq!(inner_html(&dom, p), "a&#160;b");
    }

    #[test]
    fn test_non_ascii_text_passes_through() {
        let dom = parse_html(r#"<span title="m1" class="printPageMark">↵</span>"#);
        let span = dom.find_by_tag("span").unwrap();

        assert_eq!(
            outer_html(&dom, span),
            r#"<span title="m1" class="printPageMark">↵</span>"#
        );
    }
}
