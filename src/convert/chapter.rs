//! Per-chapter transformation.
//!
//! A scraped chapter is an HTML page with the chapter name in a
//! `.chapTitle` element and the text in a `.chunkBody` element, next to a
//! `<name>_files/` folder holding its stylesheets and images. Everything a
//! chapter needs is read before the book is touched, so a chapter that fails
//! leaves no half-registered assets behind.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use quick_xml::escape::{resolve_html5_entity, unescape_with};
use regex_lite::{Captures, Regex};
use tracing::{debug, info, warn};

use super::patterns::{
    NAV_LIST_GREEDY_RE, NAV_LIST_LAZY_RE, PAGE_MARK_RE, PAGE_REF_RE, TITLE_PAGE_AND_NUMBER_RE,
    TITLE_PAGE_RE,
};
use super::{ConvertOptions, NavStrip};
use crate::book::{Book, SECTION_EXTENSION};
use crate::dom::{ArenaDom, ArenaNodeId, escape_attr, inner_html, parse_html, select};
use crate::error::{Error, Result};
use crate::util::{decode_text, extract_declared_encoding};

const TITLE_SELECTOR: &str = ".chapTitle";
const BODY_SELECTOR: &str = ".chunkBody";
const IMAGE_SELECTOR: &str = "img[src]";

/// An image `src` and the asset reference that replaced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// The `src` value as it appeared in the chapter.
    pub original: String,
    /// Reference returned by the book's image registry.
    pub asset: String,
}

/// What a chapter contributed to the book.
#[derive(Debug, Clone, Default)]
pub struct ChapterReport {
    /// Cleaned chapter title; empty when the chapter has no `.chapTitle`.
    pub title: String,
    /// Section file name, or `None` when the chapter had no `.chunkBody`.
    pub section: Option<String>,
    pub images: Vec<ImageReference>,
}

/// Image read from disk, waiting to be registered.
struct StagedImage {
    original: String,
    file_name: String,
    data: Vec<u8>,
}

/// Transform one chapter file and register its content with the book.
pub fn transform_chapter(
    book: &mut Book,
    chapter: &Path,
    options: &ConvertOptions,
) -> Result<ChapterReport> {
    info!(chapter = %chapter.display(), "Formatting chapter");

    let stylesheet = read_stylesheets(&asset_dir_for(chapter))?;

    let bytes = std::fs::read(chapter).map_err(|source| Error::ReadFile {
        path: chapter.to_path_buf(),
        source,
    })?;
    let html = decode_text(&bytes, extract_declared_encoding(&bytes));
    let mut dom = parse_html(&html);

    let title = extract_title(&dom)?;
    if title.is_empty() {
        warn!(chapter = %chapter.display(), "No chapter title found");
    }

    let bodies = select(&dom, dom.document(), BODY_SELECTOR)?;
    let Some(&body) = bodies.first() else {
        book.add_stylesheet(&stylesheet);
        warn!(chapter = %chapter.display(), "No chapter body found, skipping section");
        return Ok(ChapterReport {
            title,
            ..Default::default()
        });
    };
    if bodies.len() > 1 {
        warn!(
            chapter = %chapter.display(),
            count = bodies.len(),
            "Several chapter bodies found, using the first"
        );
    }

    let heading = dom.create_html_element("h1");
    dom.append_text(heading, &title);
    dom.prepend(body, heading);

    let staged = stage_images(&dom, body, chapter)?;

    let filename = unique_section_filename(book, &title);

    let css_ref = book.add_stylesheet(&stylesheet);
    let images: Vec<ImageReference> = staged
        .into_iter()
        .map(|image| ImageReference {
            asset: book.add_image_data(&image.file_name, image.data),
            original: image.original,
        })
        .collect();

    let content = inner_html(&dom, body);
    let content = substitute_images(&content, &images)?;
    let content = strip_markup(&content, options.nav_strip);

    book.add_section(content, title.clone(), filename.clone(), Some(&css_ref))?;

    Ok(ChapterReport {
        title,
        section: Some(filename),
        images,
    })
}

/// Asset folder of a chapter: `ch1.html` -> `ch1_files/`.
pub fn asset_dir_for(chapter: &Path) -> PathBuf {
    let name = chapter
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name.strip_suffix(".html").unwrap_or(&name);
    chapter.with_file_name(format!("{stem}_files"))
}

/// Concatenate every `*.css` file directly inside `dir`, in name order.
///
/// A missing folder yields an empty stylesheet.
pub fn read_stylesheets(dir: &Path) -> Result<String> {
    let mut files = list_files_with_extension(dir, ".css")?;
    files.sort();

    let mut joined = String::new();
    for file in files {
        let data = std::fs::read(&file).map_err(|source| Error::ReadFile {
            path: file.clone(),
            source,
        })?;
        debug!(stylesheet = %file.display(), bytes = data.len(), "Read stylesheet");
        joined.push_str(&decode_text(&data, None));
    }
    Ok(joined)
}

/// List regular files directly inside `dir` whose name ends in `suffix`.
pub(crate) fn list_files_with_extension(dir: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(Error::InputFolder {
                path: dir.to_path_buf(),
                source,
            });
        }
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| Error::InputFolder {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(suffix));
        if matches && path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}

/// Text of the last `.chapTitle` element, cleaned; empty if there is none.
fn extract_title(dom: &ArenaDom) -> Result<String> {
    let titles = select(dom, dom.document(), TITLE_SELECTOR)?;
    Ok(titles
        .last()
        .map(|&id| clean_title(&dom.text(id)))
        .unwrap_or_default())
}

/// Strip leading page and chapter numbering from a chapter title.
///
/// ```
/// use vsi::convert::clean_title;
///
/// assert_eq!(clean_title("p. 123. Some Name"), "Some Name");
/// assert_eq!(clean_title("p. 45Chapter"), "Chapter");
/// ```
pub fn clean_title(raw: &str) -> String {
    let title = TITLE_PAGE_AND_NUMBER_RE.replace_all(raw.trim(), "$1");
    TITLE_PAGE_RE.replace_all(&title, "$1").into_owned()
}

/// Section file name for a chapter title.
///
/// `?` is dropped and path separators become `_`, so every section stays
/// directly inside the section folder.
pub fn section_filename(title: &str) -> String {
    let stem: String = title
        .chars()
        .filter(|&c| c != '?')
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!("{stem}{SECTION_EXTENSION}")
}

/// Section file name for a title that is not yet used in `book`.
///
/// A repeated name gets a numeric suffix: `Notes.xhtml`, `Notes-2.xhtml`, ...
pub fn unique_section_filename(book: &Book, title: &str) -> String {
    let filename = section_filename(title);
    if !book.has_section(&filename) {
        return filename;
    }

    let stem = &filename[..filename.len() - SECTION_EXTENSION.len()];
    let mut n = 2;
    loop {
        let candidate = format!("{stem}-{n}{SECTION_EXTENSION}");
        if !book.has_section(&candidate) {
            warn!(title, section = %candidate, "Section name already used, renaming");
            return candidate;
        }
        n += 1;
    }
}

/// Resolve an image `src` against the chapter's folder.
///
/// HTML entities (named and numeric) are decoded and `%20` is read as a
/// space; nothing else is percent-decoded. A value with a malformed or
/// unknown entity is used as written.
pub fn resolve_image_path(chapter: &Path, src: &str) -> PathBuf {
    let unescaped = match unescape_with(src, resolve_html5_entity) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            debug!(src, error = %e, "Image source left undecoded");
            src.to_string()
        }
    };
    let relative = unescaped.replace("%20", " ");
    chapter
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(relative)
}

/// Read every distinct image referenced under `body`.
fn stage_images(dom: &ArenaDom, body: ArenaNodeId, chapter: &Path) -> Result<Vec<StagedImage>> {
    let mut staged: Vec<StagedImage> = Vec::new();

    for img in select(dom, body, IMAGE_SELECTOR)? {
        let Some(src) = dom.get_attr(img, "src") else {
            continue;
        };
        if staged.iter().any(|s| s.original == src) {
            continue;
        }

        let (path, data) = read_image(chapter, src)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        staged.push(StagedImage {
            original: src.to_string(),
            file_name,
            data,
        });
    }

    Ok(staged)
}

/// Read an image relative to the chapter, falling back to a file of the same
/// name in the chapter's asset folder.
fn read_image(chapter: &Path, src: &str) -> Result<(PathBuf, Vec<u8>)> {
    let path = resolve_image_path(chapter, src);
    match std::fs::read(&path) {
        Ok(data) => Ok((path, data)),
        Err(source) => {
            let fallback = asset_dir_for(chapter).join(path.file_name().unwrap_or_default());
            if fallback != path
                && let Ok(data) = std::fs::read(&fallback)
            {
                return Ok((fallback, data));
            }
            Err(Error::MissingImage { path, source })
        }
    }
}

/// Replace every original image `src` in serialized markup with its asset
/// reference.
///
/// All sources are replaced in one pass, longest first, so a reference that
/// happens to contain another image's `src` is never rewritten twice.
pub fn substitute_images(html: &str, images: &[ImageReference]) -> Result<String> {
    if images.is_empty() {
        return Ok(html.to_string());
    }

    let mut replacements: HashMap<String, String> = HashMap::new();
    for image in images {
        if image.original.is_empty() {
            continue;
        }
        replacements.insert(image.original.clone(), image.asset.clone());
        // Serialized attribute values are escaped
        replacements.insert(escape_attr(&image.original), escape_attr(&image.asset));
    }
    if replacements.is_empty() {
        return Ok(html.to_string());
    }

    let mut keys: Vec<&String> = replacements.keys().collect();
    keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    let pattern = keys
        .iter()
        .map(|k| regex_lite::escape(k))
        .collect::<Vec<_>>()
        .join("|");

    let re = Regex::new(&pattern)?;
    Ok(re
        .replace_all(html, |caps: &Captures<'_>| {
            replacements
                .get(&caps[0])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned())
}

/// Remove source-site navigation, page markers and page-break pilcrows.
pub fn strip_markup(html: &str, nav_strip: NavStrip) -> String {
    let nav = match nav_strip {
        NavStrip::Greedy => &NAV_LIST_GREEDY_RE,
        NavStrip::Lazy => &NAV_LIST_LAZY_RE,
    };
    let html = nav.replace_all(html, "");
    let html = PAGE_REF_RE.replace_all(&html, "");
    PAGE_MARK_RE.replace_all(&html, "").into_owned()
}
