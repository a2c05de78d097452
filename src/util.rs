//! Small helpers shared by the book model, the DOM and the EPUB writer.

use std::borrow::Cow;

/// Get a time-based seed value for pseudo-random number generation.
pub fn time_seed_nanos() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(12345)
}

/// Decode bytes to a string, handling various encodings.
///
/// Tries UTF-8 first (BOM aware), then the hint encoding from a
/// `<meta charset>` or XML declaration, and finally Windows-1252, which is
/// what older scraped pages tend to be in.
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Extract a declared charset from the head of an HTML or XML document.
///
/// Looks at the first 1024 bytes for `encoding="..."` (XML declaration) or
/// `charset=...` (meta tag).
pub fn extract_declared_encoding(bytes: &[u8]) -> Option<&str> {
    let prefix = &bytes[..bytes.len().min(1024)];

    for key in [&b"encoding="[..], &b"charset="[..]] {
        let Some(pos) = prefix
            .windows(key.len())
            .position(|w| w.eq_ignore_ascii_case(key))
        else {
            continue;
        };
        let after = &prefix[pos + key.len()..];
        let after = match after.first() {
            Some(b'"') | Some(b'\'') => &after[1..],
            _ => after,
        };
        let end = after
            .iter()
            .position(|&b| matches!(b, b'"' | b'\'' | b';' | b'>' | b' ' | b'/'))
            .unwrap_or(after.len());
        if end > 0 {
            return std::str::from_utf8(&after[..end]).ok();
        }
    }

    None
}

/// Detected image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFormat {
    Jpeg,
    Png,
    Gif,
    Svg,
    WebP,
    /// Unknown/binary format
    Binary,
}

impl MediaFormat {
    /// Get the MIME type string for this format.
    pub fn mime_type(self) -> &'static str {
        match self {
            MediaFormat::Jpeg => "image/jpeg",
            MediaFormat::Png => "image/png",
            MediaFormat::Gif => "image/gif",
            MediaFormat::Svg => "image/svg+xml",
            MediaFormat::WebP => "image/webp",
            MediaFormat::Binary => "application/octet-stream",
        }
    }

    /// Canonical file extension, used when an image has to be renamed.
    pub fn extension(self) -> &'static str {
        match self {
            MediaFormat::Jpeg => "jpg",
            MediaFormat::Png => "png",
            MediaFormat::Gif => "gif",
            MediaFormat::Svg => "svg",
            MediaFormat::WebP => "webp",
            MediaFormat::Binary => "bin",
        }
    }
}

/// Detect image format from file name and/or raw bytes.
///
/// Extension wins; magic bytes are only consulted when the extension is
/// missing or unknown.
pub fn detect_media_format(name: &str, data: &[u8]) -> MediaFormat {
    let lower = name.to_lowercase();

    if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        return MediaFormat::Jpeg;
    }
    if lower.ends_with(".png") {
        return MediaFormat::Png;
    }
    if lower.ends_with(".gif") {
        return MediaFormat::Gif;
    }
    if lower.ends_with(".svg") {
        return MediaFormat::Svg;
    }
    if lower.ends_with(".webp") {
        return MediaFormat::WebP;
    }

    if data.len() >= 4 {
        if data[0] == 0xFF && data[1] == 0xD8 {
            return MediaFormat::Jpeg;
        }
        if data[..4] == [0x89, b'P', b'N', b'G'] {
            return MediaFormat::Png;
        }
        if data[..3] == *b"GIF" {
            return MediaFormat::Gif;
        }
        if data.len() >= 12 && data[..4] == *b"RIFF" && data[8..12] == *b"WEBP" {
            return MediaFormat::WebP;
        }
    }

    MediaFormat::Binary
}

/// Escape special XML characters in text and attribute values.
pub fn escape_xml(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&apos;"),
            _ => result.push(c),
        }
    }
    result
}
