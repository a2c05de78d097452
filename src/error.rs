//! Error types for vsi operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while assembling or writing a book.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Invalid EPUB: {0}")]
    InvalidEpub(String),

    #[error("could not build pattern: {0}")]
    Pattern(#[from] regex_lite::Error),

    #[error("Invalid selector {0:?}")]
    Selector(String),

    #[error("could not list chapters in {}: {source}", path.display())]
    InputFolder {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not read file {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not add image {}: {source}", path.display())]
    MissingImage {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("section filename already used: {0}")]
    DuplicateSection(String),

    #[error("failed to format chapter {}: {source}", path.display())]
    Chapter {
        path: PathBuf,
        source: Box<Error>,
    },
}

impl Error {
    /// Attach the chapter being formatted to an error.
    pub(crate) fn in_chapter(self, path: impl Into<PathBuf>) -> Self {
        Error::Chapter {
            path: path.into(),
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
