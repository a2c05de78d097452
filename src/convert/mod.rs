//! Folder-to-EPUB conversion.
//!
//! [`convert_folder`] discovers the `*.html` chapters of an input folder,
//! runs each through [`transform_chapter`] and writes the resulting book.
//!
//! ```no_run
//! use vsi::convert::{ConvertOptions, convert_folder};
//!
//! let report = convert_folder(
//!     "scraped/dreams",
//!     "dreams.epub",
//!     "Dreams",
//!     "J. Allan Hobson",
//!     &ConvertOptions::default(),
//! )?;
//! println!("{} chapters", report.chapters.len());
//! # Ok::<(), vsi::Error>(())
//! ```

mod chapter;
mod patterns;

pub use chapter::{
    ChapterReport, ImageReference, asset_dir_for, clean_title, read_stylesheets,
    resolve_image_path, section_filename, strip_markup, substitute_images, transform_chapter,
    unique_section_filename,
};

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::book::Book;
use crate::error::{Error, Result};

/// Subtitle appended to every book title.
pub const DEFAULT_SUBTITLE: &str = ": A Very Short Introduction";

/// What happens when a chapter cannot be converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Abort the run; no output file is written.
    #[default]
    FailFast,
    /// Log the failure, leave the chapter out and carry on.
    BestEffort,
}

/// How much markup the navigation-list cleanup removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavStrip {
    /// From a `<ul class="div1-nav">` to the last `</ul>` on the same line.
    #[default]
    Greedy,
    /// Each navigation list up to its nearest `</ul>` on the same line.
    Lazy,
}

/// Options for a conversion run.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub strictness: Strictness,
    pub nav_strip: NavStrip,
    pub subtitle: String,
    pub language: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            strictness: Strictness::FailFast,
            nav_strip: NavStrip::Greedy,
            subtitle: DEFAULT_SUBTITLE.to_string(),
            language: "en".to_string(),
        }
    }
}

impl ConvertOptions {
    pub fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    pub fn with_nav_strip(mut self, nav_strip: NavStrip) -> Self {
        self.nav_strip = nav_strip;
        self
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = subtitle.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

/// Outcome of a conversion run.
#[derive(Debug, Default)]
pub struct ConversionReport {
    /// Chapters that made it into the book, in reading order.
    pub chapters: Vec<ChapterReport>,
    /// Chapters left out in best-effort mode, with the reason.
    pub skipped: Vec<(PathBuf, Error)>,
}

/// List the chapter files directly inside `folder`, sorted by name.
pub fn discover_chapters(folder: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(folder).map_err(|source| Error::InputFolder {
        path: folder.to_path_buf(),
        source,
    })?;

    let mut chapters = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| Error::InputFolder {
            path: folder.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let is_chapter = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".html"));
        if is_chapter && path.is_file() {
            chapters.push(path);
        }
    }

    chapters.sort();
    Ok(chapters)
}

/// Build a book from every chapter in `folder` without writing it.
pub fn assemble_book(
    folder: &Path,
    title: &str,
    author: &str,
    options: &ConvertOptions,
) -> Result<(Book, ConversionReport)> {
    let chapters = discover_chapters(folder)?;
    if chapters.is_empty() {
        warn!(folder = %folder.display(), "No chapters found");
    }

    let mut book = Book::new(format!("{title}{}", options.subtitle));
    book.set_author(author);
    book.metadata.language = options.language.clone();

    let mut report = ConversionReport::default();
    for chapter in chapters {
        match transform_chapter(&mut book, &chapter, options) {
            Ok(chapter_report) => report.chapters.push(chapter_report),
            Err(e) => match options.strictness {
                Strictness::FailFast => return Err(e.in_chapter(chapter)),
                Strictness::BestEffort => {
                    warn!(chapter = %chapter.display(), error = %e, "Skipping chapter");
                    report.skipped.push((chapter, e));
                }
            },
        }
    }

    Ok((book, report))
}

/// Convert a folder of scraped chapters into an EPUB file at `output`.
///
/// Nothing is written unless every chapter was handled (or, in best-effort
/// mode, skipped).
pub fn convert_folder(
    folder: impl AsRef<Path>,
    output: impl AsRef<Path>,
    title: &str,
    author: &str,
    options: &ConvertOptions,
) -> Result<ConversionReport> {
    let (book, report) = assemble_book(folder.as_ref(), title, author, options)?;

    book.write(output.as_ref())?;
    info!(
        output = %output.as_ref().display(),
        sections = book.sections.len(),
        skipped = report.skipped.len(),
        "Wrote book"
    );

    Ok(report)
}
