//! Book API tests.
//!
//! Tests for the Book struct and its methods - creating books programmatically,
//! registering stylesheets and images, adding sections, and writing them out.

use std::path::Path;

use tempfile::TempDir;
use vsi::epub::EpubArchive;
use vsi::{Book, Error, Metadata};

// ============================================================================
// Book Construction Tests
// ============================================================================

#[test]
fn test_create_empty_book() {
    let book = Book::new("Empty: A Very Short Introduction");

    assert_eq!(book.metadata.title, "Empty: A Very Short Introduction");
    assert!(book.metadata.authors.is_empty());
    assert!(book.sections.is_empty());
    assert!(book.resources.is_empty());
}

#[test]
fn test_metadata_builder() {
    let metadata = Metadata::new("Test Title")
        .with_author("Author One")
        .with_author("Author Two")
        .with_language("en")
        .with_identifier("urn:uuid:12345");

    assert_eq!(metadata.title, "Test Title");
    assert_eq!(metadata.authors, vec!["Author One", "Author Two"]);
    assert_eq!(metadata.language, "en");
    assert_eq!(metadata.identifier, "urn:uuid:12345");
}

#[test]
fn test_add_image_from_disk() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let image_path = temp_dir.path().join("brain scan.png");
    std::fs::write(&image_path, [0x89, b'P', b'N', b'G']).unwrap();

    let mut book = Book::new("T");
    let href = book.add_image(&image_path).expect("Failed to add image");

    assert_eq!(href, "../images/brain%20scan.png");
    let resource = book.get_resource("images/brain scan.png").unwrap();
    assert_eq!(resource.media_type, "image/png");
    assert_eq!(resource.data, vec![0x89, b'P', b'N', b'G']);
}

#[test]
fn test_add_image_missing_file_leaves_book_untouched() {
    let mut book = Book::new("T");
    let err = book
        .add_image(Path::new("/nonexistent/vsi/figure.jpg"))
        .unwrap_err();

    assert!(matches!(err, Error::MissingImage { .. }));
    assert!(book.resources.is_empty());
}

#[test]
fn test_same_image_name_twice() {
    let mut book = Book::new("T");
    let first = book.add_image_data("figure1.jpg", vec![0xFF, 0xD8, 0xFF, 1]);
    let second = book.add_image_data("figure1.jpg", vec![0xFF, 0xD8, 0xFF, 2]);

    assert_ne!(first, second);
    assert_eq!(book.resources.len(), 2);
    assert!(second.starts_with("../images/image"));
    assert!(second.ends_with(".jpg"));
}

#[test]
fn test_every_stylesheet_is_registered() {
    let mut book = Book::new("T");
    let a = book.add_stylesheet("p { margin: 0 }");
    let b = book.add_stylesheet("p { margin: 0 }");

    assert_eq!(a, "../css/css0001.css");
    assert_eq!(b, "../css/css0002.css");
}

#[test]
fn test_sections_keep_insertion_order() {
    let mut book = Book::new("T");
    book.add_section("<h1>B</h1>", "B", "B.xhtml", None).unwrap();
    book.add_section("<h1>A</h1>", "A", "A.xhtml", None).unwrap();

    let titles: Vec<_> = book.sections.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["B", "A"]);
}

// ============================================================================
// Write Tests
// ============================================================================

#[test]
fn test_write_and_read_back() {
    let mut book = Book::new("Memory: A Very Short Introduction");
    book.set_author("Jonathan K. Foster");
    let css = book.add_stylesheet("h1 { color: navy; }");
    book.add_section("<h1>Intro</h1><p>Hi</p>", "Intro", "Intro.xhtml", Some(&css))
        .unwrap();
    book.add_section("<h1>Forgetting</h1>", "Forgetting", "Forgetting.xhtml", Some(&css))
        .unwrap();

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let epub_path = temp_dir.path().join("memory.epub");
    book.write(&epub_path).expect("Failed to write EPUB");

    let package = vsi::read_package(&epub_path).expect("Failed to read EPUB");
    assert_eq!(package.title, "Memory: A Very Short Introduction");
    assert_eq!(package.authors, vec!["Jonathan K. Foster"]);
    assert_eq!(package.spine, vec!["xhtml/Intro.xhtml", "xhtml/Forgetting.xhtml"]);

    let labels: Vec<_> = package.toc.iter().map(|e| e.label.as_str()).collect();
    assert_eq!(labels, vec!["Intro", "Forgetting"]);

    let css_item = package
        .manifest
        .iter()
        .find(|m| m.href == "css/css0001.css")
        .expect("stylesheet in manifest");
    assert_eq!(css_item.media_type, "text/css");
}

#[test]
fn test_written_archive_layout() {
    let mut book = Book::new("T");
    let img = book.add_image_data("pic.gif", b"GIF89a".to_vec());
    book.add_section(format!(r#"<img src="{img}"/>"#), "One", "One.xhtml", None)
        .unwrap();

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let epub_path = temp_dir.path().join("layout.epub");
    vsi::write_epub(&book, &epub_path).expect("Failed to write EPUB");

    let file = std::fs::File::open(&epub_path).unwrap();
    let mut epub = EpubArchive::new(file).expect("Failed to open EPUB");
    let names = epub.entry_names();

    assert_eq!(names[0], "mimetype");
    assert!(names.contains(&"META-INF/container.xml".to_string()));
    assert!(names.contains(&"OEBPS/content.opf".to_string()));
    assert!(names.contains(&"OEBPS/toc.ncx".to_string()));
    assert!(names.contains(&"OEBPS/xhtml/One.xhtml".to_string()));
    assert!(names.contains(&"OEBPS/images/pic.gif".to_string()));

    let section = epub.read_string("xhtml/One.xhtml").unwrap();
    assert!(section.starts_with("<?xml"));
    assert!(section.contains(r#"<img src="../images/pic.gif"/>"#));
}

#[test]
fn test_write_to_missing_directory_fails() {
    let book = Book::new("T");
    let result = vsi::write_epub(&book, "/nonexistent/vsi/out.epub");
    assert!(matches!(result, Err(Error::Io(_))));
}
