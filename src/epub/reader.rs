use std::io::{Read, Seek};
use std::path::Path;

use percent_encoding::percent_decode_str;
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use zip::ZipArchive;

use crate::error::{Error, Result};

/// What a written EPUB declares about itself.
///
/// Produced by re-reading the container, package document and NCX of an
/// archive; used to check that a conversion came out as intended.
#[derive(Debug, Clone, Default)]
pub struct Package {
    pub title: String,
    pub authors: Vec<String>,
    pub language: String,
    pub manifest: Vec<ManifestItem>,
    /// Spine hrefs in reading order, relative to the package document.
    pub spine: Vec<String>,
    /// NCX entries in play order.
    pub toc: Vec<NavEntry>,
}

/// One manifest item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub id: String,
    /// Decoded href, relative to the package document.
    pub href: String,
    pub media_type: String,
}

/// One NCX navigation point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub label: String,
    /// Decoded content src, relative to the package document.
    pub src: String,
}

/// Open an EPUB archive and read its package metadata.
pub struct EpubArchive<R: Read + Seek> {
    archive: ZipArchive<R>,
    opf_dir: String,
    package: Package,
}

/// Read the package summary of an EPUB file on disk.
pub fn read_package<P: AsRef<Path>>(path: P) -> Result<Package> {
    let file = std::fs::File::open(path)?;
    Ok(EpubArchive::new(file)?.package)
}

impl<R: Read + Seek> EpubArchive<R> {
    pub fn new(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;

        let opf_path = find_opf_path(&mut archive)?;
        let opf_dir = Path::new(&opf_path)
            .parent()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();

        let opf = read_archive_file(&mut archive, &opf_path)?;
        let (mut package, ncx_href) = parse_opf(&opf)?;

        if let Some(ncx_href) = ncx_href {
            let ncx = read_archive_file(&mut archive, &join(&opf_dir, &ncx_href))?;
            package.toc = parse_ncx(&ncx)?;
        }

        Ok(Self {
            archive,
            opf_dir,
            package,
        })
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Read a file by its href relative to the package document.
    pub fn read_bytes(&mut self, href: &str) -> Result<Vec<u8>> {
        let path = join(&self.opf_dir, href);
        read_archive_file_bytes(&mut self.archive, &path)
    }

    /// Read a text file by its href relative to the package document.
    pub fn read_string(&mut self, href: &str) -> Result<String> {
        Ok(String::from_utf8(self.read_bytes(href)?)?)
    }

    /// Raw archive entry names, in archive order.
    pub fn entry_names(&self) -> Vec<String> {
        (0..self.archive.len())
            .filter_map(|i| self.archive.name_for_index(i).map(str::to_string))
            .collect()
    }
}

fn find_opf_path<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<String> {
    let container = read_archive_file(archive, "META-INF/container.xml")?;

    let mut reader = Reader::from_str(&container);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"rootfile" => {
                if let Some(path) = attr(&e, b"full-path")? {
                    return Ok(path);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }

    Err(Error::InvalidEpub(
        "No rootfile found in container.xml".into(),
    ))
}

fn parse_opf(content: &str) -> Result<(Package, Option<String>)> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut package = Package::default();
    let mut toc_id: Option<String> = None;
    let mut spine_ids: Vec<String> = Vec::new();
    let mut current: Option<Vec<u8>> = None;
    let mut buf_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());
                match local {
                    b"title" | b"creator" | b"language" => {
                        current = Some(local.to_vec());
                        buf_text.clear();
                    }
                    b"spine" => toc_id = attr(&e, b"toc")?,
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"item" => {
                        let id = attr(&e, b"id")?.unwrap_or_default();
                        let href = attr(&e, b"href")?.unwrap_or_default();
                        let media_type = attr(&e, b"media-type")?.unwrap_or_default();
                        package.manifest.push(ManifestItem {
                            id,
                            href: decode_href(&href),
                            media_type,
                        });
                    }
                    b"itemref" => {
                        if let Some(idref) = attr(&e, b"idref")? {
                            spine_ids.push(idref);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(e)) => {
                if current.is_some() {
                    buf_text.push_str(&unescape_lossy(&String::from_utf8_lossy(e.as_ref())));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if current.is_some() {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    buf_text.push_str(&unescape_lossy(&format!("&{entity};")));
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name();
                if let Some(elem) = &current
                    && local_name(name.as_ref()) == elem.as_slice()
                {
                    match elem.as_slice() {
                        b"title" => package.title = buf_text.clone(),
                        b"creator" => package.authors.push(buf_text.clone()),
                        b"language" => package.language = buf_text.clone(),
                        _ => {}
                    }
                    current = None;
                    buf_text.clear();
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }

    for id in spine_ids {
        if let Some(item) = package.manifest.iter().find(|m| m.id == id) {
            package.spine.push(item.href.clone());
        }
    }

    let ncx_href = toc_id.and_then(|id| {
        package
            .manifest
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.href.clone())
    });

    Ok((package, ncx_href))
}

fn parse_ncx(content: &str) -> Result<Vec<NavEntry>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut in_nav_point = false;
    let mut in_text = false;
    let mut label = String::new();
    let mut src = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"navPoint" => {
                    in_nav_point = true;
                    label.clear();
                    src.clear();
                }
                b"text" => in_text = in_nav_point,
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if in_nav_point
                    && local_name(e.name().as_ref()) == b"content"
                    && let Some(value) = attr(&e, b"src")?
                {
                    src = decode_href(&value);
                }
            }
            Ok(Event::Text(e)) => {
                if in_text {
                    label.push_str(&unescape_lossy(&String::from_utf8_lossy(e.as_ref())));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if in_text {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    label.push_str(&unescape_lossy(&format!("&{entity};")));
                }
            }
            Ok(Event::End(e)) => match local_name(e.name().as_ref()) {
                b"text" => in_text = false,
                b"navPoint" => {
                    entries.push(NavEntry {
                        label: label.clone(),
                        src: src.clone(),
                    });
                    in_nav_point = false;
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }

    Ok(entries)
}

// ----------------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------------

fn read_archive_file<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<String> {
    Ok(String::from_utf8(read_archive_file_bytes(archive, path)?)?)
}

fn read_archive_file_bytes<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> Result<Vec<u8>> {
    let mut file = archive.by_name(path)?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents)?;
    Ok(contents)
}

/// Read an attribute value, unescaped.
fn attr(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for a in e.attributes().flatten() {
        if a.key.as_ref() == key {
            let raw = String::from_utf8(a.value.to_vec())?;
            return Ok(Some(unescape_lossy(&raw)));
        }
    }
    Ok(None)
}

fn unescape_lossy(s: &str) -> String {
    unescape(s)
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| s.to_string())
}

fn decode_href(href: &str) -> String {
    percent_decode_str(href).decode_utf8_lossy().into_owned()
}

/// Extract local name from namespaced XML name (e.g., "dc:title" -> "title").
fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

fn join(dir: &str, href: &str) -> String {
    if dir.is_empty() {
        href.to_string()
    } else {
        format!("{dir}/{href}")
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::book::Book;
    use crate::epub::write_epub_to_writer;

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"dc:title"), b"title");
        assert_eq!(local_name(b"item"), b"item");
    }

    #[test]
    fn test_parse_ncx_entries() {
        let ncx = r#"<?xml version="1.0"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <docTitle><text>Book</text></docTitle>
  <navMap>
    <navPoint id="n1" playOrder="1">
      <navLabel><text>Tom &amp; Jerry</text></navLabel>
      <content src="xhtml/Tom%20&amp;%20Jerry.xhtml"/>
    </navPoint>
  </navMap>
</ncx>"#;

        let entries = parse_ncx(ncx).unwrap();
        assert_eq!(
            entries,
            vec![NavEntry {
                label: "Tom & Jerry".into(),
                src: "xhtml/Tom & Jerry.xhtml".into(),
            }]
        );
    }

    #[test]
    fn test_written_book_reads_back() {
        let mut book = Book::new("Memory: A Very Short Introduction");
        book.set_author("Jonathan K. Foster");
        let css = book.add_stylesheet("p { margin: 0 }");
        let img = book.add_image_data("fig 1.png", vec![0x89, b'P', b'N', b'G']);
        book.add_section(
            format!(r#"<h1>What is memory?</h1><img src="{img}"/>"#),
            "What is memory?",
            "What is memory.xhtml",
            Some(&css),
        )
        .unwrap();

        let mut buffer = Cursor::new(Vec::new());
        write_epub_to_writer(&book, &mut buffer).unwrap();
        buffer.set_position(0);

        let mut epub = EpubArchive::new(buffer).unwrap();
        let package = epub.package().clone();

        assert_eq!(package.title, "Memory: A Very Short Introduction");
        assert_eq!(package.authors, vec!["Jonathan K. Foster"]);
        assert_eq!(package.language, "en");
        assert_eq!(package.spine, vec!["xhtml/What is memory.xhtml"]);
        assert_eq!(package.toc[0].label, "What is memory?");
        assert!(
            package
                .manifest
                .iter()
                .any(|m| m.href == "images/fig 1.png" && m.media_type == "image/png")
        );

        assert_eq!(epub.entry_names()[0], "mimetype");
        let section = epub.read_string("xhtml/What is memory.xhtml").unwrap();
        assert!(section.contains(r#"<img src="../images/fig%201.png"/>"#));
        assert_eq!(epub.read_bytes("images/fig 1.png").unwrap(), vec![0x89, b'P', b'N', b'G']);
    }
}
