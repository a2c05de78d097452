use std::fmt::Write as _;
use std::io::{Seek, Write};
use std::path::Path;

use percent_encoding::utf8_percent_encode;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::book::{Book, HREF_ENCODE_SET, Section};
use crate::error::Result;
use crate::util::{escape_xml, time_seed_nanos};

/// Directory inside the archive holding the package document.
const PACKAGE_DIR: &str = "OEBPS";

/// Write a [`Book`] to an EPUB file on disk.
///
/// Creates an EPUB 2 file with OPF package document, NCX table of contents,
/// one XHTML document per section and every registered image and stylesheet.
/// An existing file at `path` is overwritten.
///
/// # Example
///
/// ```no_run
/// use vsi::{Book, write_epub};
///
/// let mut book = Book::new("Dreams: A Very Short Introduction");
/// book.set_author("J. Allan Hobson");
/// write_epub(&book, "dreams.epub")?;
/// # Ok::<(), vsi::Error>(())
/// ```
pub fn write_epub<P: AsRef<Path>>(book: &Book, path: P) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_epub_to_writer(book, file)
}

/// Write a [`Book`] to any [`Write`] + [`Seek`] destination.
pub fn write_epub_to_writer<W: Write + Seek>(book: &Book, writer: W) -> Result<()> {
    let mut zip = ZipWriter::new(writer);

    // mimetype must be first and uncompressed
    let options_stored =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    let options_deflate =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    zip.start_file("mimetype", options_stored)?;
    zip.write_all(b"application/epub+zip")?;

    zip.start_file("META-INF/container.xml", options_deflate)?;
    zip.write_all(CONTAINER_XML.as_bytes())?;

    // Generated once so OPF and NCX agree
    let identifier = if book.metadata.identifier.is_empty() {
        format!("urn:uuid:{}", uuid_v4())
    } else {
        book.metadata.identifier.clone()
    };

    zip.start_file(format!("{PACKAGE_DIR}/content.opf"), options_deflate)?;
    zip.write_all(generate_opf(book, &identifier).as_bytes())?;

    zip.start_file(format!("{PACKAGE_DIR}/toc.ncx"), options_deflate)?;
    zip.write_all(generate_ncx(book, &identifier).as_bytes())?;

    for section in &book.sections {
        zip.start_file(
            format!("{PACKAGE_DIR}/{}", section.href()),
            options_deflate,
        )?;
        zip.write_all(section_document(section).as_bytes())?;
    }

    for resource in &book.resources {
        zip.start_file(
            format!("{PACKAGE_DIR}/{}", resource.href),
            options_deflate,
        )?;
        zip.write_all(&resource.data)?;
    }

    zip.finish()?;
    Ok(())
}

const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

fn generate_opf(book: &Book, identifier: &str) -> String {
    let mut opf = String::new();

    opf.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="BookId">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
"#,
    );

    let _ = writeln!(
        opf,
        "    <dc:title>{}</dc:title>",
        escape_xml(&book.metadata.title)
    );
    let _ = writeln!(
        opf,
        "    <dc:identifier id=\"BookId\">{}</dc:identifier>",
        escape_xml(identifier)
    );

    let language = if book.metadata.language.is_empty() {
        "en"
    } else {
        &book.metadata.language
    };
    let _ = writeln!(opf, "    <dc:language>{}</dc:language>", escape_xml(language));

    for author in &book.metadata.authors {
        let _ = writeln!(
            opf,
            "    <dc:creator opf:role=\"aut\">{}</dc:creator>",
            escape_xml(author)
        );
    }

    opf.push_str("  </metadata>\n  <manifest>\n");
    opf.push_str(
        "    <item id=\"ncx\" href=\"toc.ncx\" media-type=\"application/x-dtbncx+xml\"/>\n",
    );

    for (i, section) in book.sections.iter().enumerate() {
        let _ = writeln!(
            opf,
            "    <item id=\"{}\" href=\"{}\" media-type=\"application/xhtml+xml\"/>",
            section_id(i),
            escape_xml(&encode_href(&section.href()))
        );
    }

    for (i, resource) in book.resources.iter().enumerate() {
        let _ = writeln!(
            opf,
            "    <item id=\"res{:04}\" href=\"{}\" media-type=\"{}\"/>",
            i + 1,
            escape_xml(&encode_href(&resource.href)),
            escape_xml(&resource.media_type)
        );
    }

    opf.push_str("  </manifest>\n  <spine toc=\"ncx\">\n");
    for i in 0..book.sections.len() {
        let _ = writeln!(opf, "    <itemref idref=\"{}\"/>", section_id(i));
    }
    opf.push_str("  </spine>\n</package>\n");
    opf
}

fn generate_ncx(book: &Book, identifier: &str) -> String {
    let mut ncx = String::new();

    ncx.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE ncx PUBLIC "-//NISO//DTD ncx 2005-1//EN" "http://www.daisy.org/z3986/2005/ncx-2005-1.dtd">
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
"#,
    );
    let _ = writeln!(
        ncx,
        "    <meta name=\"dtb:uid\" content=\"{}\"/>",
        escape_xml(identifier)
    );
    ncx.push_str(
        r#"    <meta name="dtb:depth" content="1"/>
    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
"#,
    );
    let _ = writeln!(
        ncx,
        "  <docTitle>\n    <text>{}</text>\n  </docTitle>",
        escape_xml(&book.metadata.title)
    );
    ncx.push_str("  <navMap>\n");

    for (i, section) in book.sections.iter().enumerate() {
        let order = i + 1;
        let _ = write!(
            ncx,
            "    <navPoint id=\"navpoint-{order}\" playOrder=\"{order}\">\n      \
             <navLabel>\n        <text>{}</text>\n      </navLabel>\n      \
             <content src=\"{}\"/>\n    </navPoint>\n",
            escape_xml(&section.title),
            escape_xml(&encode_href(&section.href()))
        );
    }

    ncx.push_str("  </navMap>\n</ncx>\n");
    ncx
}

/// Wrap a section body in a complete XHTML document.
fn section_document(section: &Section) -> String {
    let mut doc = String::new();

    doc.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN" "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd">
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
  <meta http-equiv="Content-Type" content="application/xhtml+xml; charset=utf-8"/>
  <title>"#,
    );
    doc.push_str(&escape_xml(&section.title));
    doc.push_str("</title>\n");

    if let Some(href) = &section.stylesheet {
        let _ = writeln!(
            doc,
            "  <link rel=\"stylesheet\" type=\"text/css\" href=\"{}\"/>",
            escape_xml(href)
        );
    }

    doc.push_str("</head>\n<body>\n");
    doc.push_str(&section.body);
    doc.push_str("\n</body>\n</html>\n");
    doc
}

fn section_id(index: usize) -> String {
    format!("section{:04}", index + 1)
}

fn encode_href(href: &str) -> String {
    utf8_percent_encode(href, HREF_ENCODE_SET).to_string()
}

/// Generate a simple UUID v4 (random)
fn uuid_v4() -> String {
    let mut state = time_seed_nanos();
    let mut bytes = [0u8; 16];
    for byte in &mut bytes {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        *byte = (state >> 33) as u8;
    }

    // Set version (4) and variant (2)
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}
