mod reader;
mod writer;

pub use reader::{EpubArchive, ManifestItem, NavEntry, Package, read_package};
pub use writer::{write_epub, write_epub_to_writer};
