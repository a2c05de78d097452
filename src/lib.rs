//! # vsi
//!
//! Turn a folder of scraped "Very Short Introduction" chapter pages into a
//! single EPUB book.
//!
//! Each chapter is an HTML file whose title sits in a `.chapTitle` element and
//! whose text sits in a `.chunkBody` element. Its stylesheets and images live
//! in a sibling `<chapter>_files/` folder.
//!
//! ## Quick Start
//!
//! ```no_run
//! use vsi::{ConvertOptions, convert_folder};
//!
//! convert_folder("scraped/memory", "memory.epub", "Memory", "Jonathan K. Foster",
//!     &ConvertOptions::default())?;
//! # Ok::<(), vsi::Error>(())
//! ```
//!
//! ## Building a book by hand
//!
//! The [`Book`] registry can also be driven directly:
//!
//! ```
//! use vsi::Book;
//!
//! let mut book = Book::new("Memory: A Very Short Introduction");
//! book.set_author("Jonathan K. Foster");
//!
//! let css = book.add_stylesheet("h1 { font-size: 2em }");
//! let img = book.add_image_data("brain.png", vec![0x89, b'P', b'N', b'G']);
//! book.add_section(
//!     format!(r#"<h1>What is memory?</h1><img src="{img}"/>"#),
//!     "What is memory?",
//!     "What is memory.xhtml",
//!     Some(&css),
//! )?;
//!
//! assert_eq!(img, "../images/brain.png");
//! # Ok::<(), vsi::Error>(())
//! ```

pub mod book;
pub mod convert;
pub mod dom;
pub mod epub;
pub mod error;
pub(crate) mod util;

pub use book::{Book, Metadata, Resource, Section};
pub use convert::{
    ChapterReport, ConversionReport, ConvertOptions, NavStrip, Strictness, convert_folder,
    transform_chapter,
};
pub use epub::{Package, read_package, write_epub};
pub use error::{Error, Result};
