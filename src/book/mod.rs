//! In-memory representation of the book being assembled.
//!
//! A [`Book`] owns its metadata, an asset registry (stylesheets and images)
//! and an ordered list of sections. Registration methods hand back the
//! reference a chapter body should use for the asset, relative to the
//! section documents.

use std::collections::HashSet;
use std::path::Path;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use tracing::debug;

use crate::error::{Error, Result};
use crate::util::detect_media_format;

/// Archive directory (under the package root) holding section documents.
pub const XHTML_DIR: &str = "xhtml";
/// Archive directory holding registered images.
pub const IMAGES_DIR: &str = "images";
/// Archive directory holding registered stylesheets.
pub const CSS_DIR: &str = "css";
/// Extension given to every section document.
pub const SECTION_EXTENSION: &str = ".xhtml";

/// Characters escaped when an archive path is used as a URL.
pub(crate) const HREF_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// The output book.
#[derive(Debug, Clone, Default)]
pub struct Book {
    pub metadata: Metadata,
    /// Sections in reading order.
    pub sections: Vec<Section>,
    /// Images and stylesheets in registration order.
    pub resources: Vec<Resource>,
    used_names: HashSet<String>,
    image_count: usize,
    stylesheet_count: usize,
}

/// Book metadata (Dublin Core subset).
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub title: String,
    pub authors: Vec<String>,
    pub language: String,
    pub identifier: String,
}

/// A registered image or stylesheet.
#[derive(Debug, Clone)]
pub struct Resource {
    /// Path inside the package directory, e.g. `images/pic.png`.
    pub href: String,
    pub data: Vec<u8>,
    pub media_type: String,
}

/// One chapter's registered content.
#[derive(Debug, Clone)]
pub struct Section {
    /// Table of contents label.
    pub title: String,
    /// File name inside the section directory, e.g. `Intro.xhtml`.
    pub filename: String,
    /// Body markup, inserted verbatim into the section document.
    pub body: String,
    /// Stylesheet reference as returned by [`Book::add_stylesheet`].
    pub stylesheet: Option<String>,
}

impl Section {
    /// Path of the section document inside the package directory.
    pub fn href(&self) -> String {
        format!("{XHTML_DIR}/{}", self.filename)
    }
}

impl Book {
    /// Create an empty book with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            metadata: Metadata::new(title),
            ..Default::default()
        }
    }

    /// Add an author to the book metadata.
    pub fn set_author(&mut self, author: impl Into<String>) {
        self.metadata.authors.push(author.into());
    }

    /// Register a stylesheet and return the reference sections should link to.
    ///
    /// Each call registers a new `cssNNNN.css` resource, even for empty or
    /// identical contents.
    pub fn add_stylesheet(&mut self, css: &str) -> String {
        let mut name;
        loop {
            self.stylesheet_count += 1;
            name = format!("{CSS_DIR}/css{:04}.css", self.stylesheet_count);
            if !self.used_names.contains(&name) {
                break;
            }
        }

        debug!(href = %name, bytes = css.len(), "Registered stylesheet");
        self.insert_resource(name.clone(), css.as_bytes().to_vec(), "text/css");
        reference(&name)
    }

    /// Read an image from disk and register it.
    ///
    /// Returns the reference chapter bodies should use in place of the
    /// image's original `src`.
    pub fn add_image(&mut self, path: &Path) -> Result<String> {
        let data = std::fs::read(path).map_err(|source| Error::MissingImage {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(self.add_image_data(&file_name, data))
    }

    /// Register image bytes under the given file name.
    ///
    /// The file name is kept when it is free; otherwise a generated
    /// `imageNNNN.<ext>` name is used so that two chapters shipping a
    /// `figure1.png` each get their own copy.
    pub fn add_image_data(&mut self, file_name: &str, data: Vec<u8>) -> String {
        let format = detect_media_format(file_name, &data);
        self.image_count += 1;

        let mut name = format!("{IMAGES_DIR}/{file_name}");
        if file_name.is_empty() || self.used_names.contains(&name) {
            let mut n = self.image_count;
            loop {
                name = format!("{IMAGES_DIR}/image{n:04}.{}", format.extension());
                if !self.used_names.contains(&name) {
                    break;
                }
                n += 1;
            }
        }

        debug!(href = %name, source = file_name, "Registered image");
        self.insert_resource(name.clone(), data, format.mime_type());
        reference(&name)
    }

    /// Append a section to the reading order.
    ///
    /// Fails if another section already uses `filename`.
    pub fn add_section(
        &mut self,
        body: impl Into<String>,
        title: impl Into<String>,
        filename: impl Into<String>,
        stylesheet: Option<&str>,
    ) -> Result<String> {
        let filename = filename.into();
        if self.has_section(&filename) {
            return Err(Error::DuplicateSection(filename));
        }

        self.sections.push(Section {
            title: title.into(),
            filename: filename.clone(),
            body: body.into(),
            stylesheet: stylesheet.map(str::to_string),
        });
        Ok(filename)
    }

    /// Check whether a section file name is already taken.
    pub fn has_section(&self, filename: &str) -> bool {
        self.sections.iter().any(|s| s.filename == filename)
    }

    /// Get a resource by its package path.
    pub fn get_resource(&self, href: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.href == href)
    }

    /// Serialize the book as an EPUB file.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        crate::epub::write_epub(self, path)
    }

    fn insert_resource(&mut self, href: String, data: Vec<u8>, media_type: &str) {
        self.used_names.insert(href.clone());
        self.resources.push(Resource {
            href,
            data,
            media_type: media_type.to_string(),
        });
    }
}

impl Metadata {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.authors.push(author.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }
}

/// Reference to a package resource as seen from a section document.
fn reference(href: &str) -> String {
    format!("../{}", utf8_percent_encode(href, HREF_ENCODE_SET))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_book_has_title() {
        let mut book = Book::new("Dreams: A Very Short Introduction");
        book.set_author("J. Allan Hobson");

        assert_eq!(book.metadata.title, "Dreams: A Very Short Introduction");
        assert_eq!(book.metadata.authors, vec!["J. Allan Hobson"]);
        assert!(book.sections.is_empty());
        assert!(book.resources.is_empty());
    }

    #[test]
    fn test_stylesheets_are_numbered() {
        let mut book = Book::new("T");
        assert_eq!(book.add_stylesheet("p {}"), "../css/css0001.css");
        assert_eq!(book.add_stylesheet(""), "../css/css0002.css");

        let css = book.get_resource("css/css0001.css").unwrap();
        assert_eq!(css.data, b"p {}");
        assert_eq!(css.media_type, "text/css");
    }

    #[test]
    fn test_image_keeps_file_name() {
        let mut book = Book::new("T");
        let href = book.add_image_data("pic.png", vec![1, 2, 3]);
        assert_eq!(href, "../images/pic.png");
        assert_eq!(
            book.get_resource("images/pic.png").unwrap().media_type,
            "image/png"
        );
    }

    #[test]
    fn test_image_name_collision_gets_generated_name() {
        let mut book = Book::new("T");
        let first = book.add_image_data("pic.png", vec![1]);
        let second = book.add_image_data("pic.png", vec![2]);

        assert_eq!(first, "../images/pic.png");
        assert_eq!(second, "../images/image0002.png");
        assert_eq!(book.get_resource("images/image0002.png").unwrap().data, vec![2]);
    }

    #[test]
    fn test_image_reference_is_percent_encoded() {
        let mut book = Book::new("T");
        let href = book.add_image_data("fig 1.jpg", vec![]);
        assert_eq!(href, "../images/fig%201.jpg");
        assert!(book.get_resource("images/fig 1.jpg").is_some());
    }

    #[test]
    fn test_add_image_missing_file() {
        let mut book = Book::new("T");
        let err = book
            .add_image(Path::new("/nonexistent/dir/pic.png"))
            .unwrap_err();
        assert!(matches!(err, Error::MissingImage { .. }));
        assert!(book.resources.is_empty());
    }

    #[test]
    fn test_duplicate_section_rejected() {
        let mut book = Book::new("T");
        book.add_section("<p>a</p>", "Intro", "Intro.xhtml", None)
            .unwrap();
        let err = book
            .add_section("<p>b</p>", "Intro", "Intro.xhtml", None)
            .unwrap_err();

        assert!(matches!(err, Error::DuplicateSection(ref f) if f == "Intro.xhtml"));
        assert_eq!(book.sections.len(), 1);
        assert_eq!(book.sections[0].href(), "xhtml/Intro.xhtml");
    }
}
