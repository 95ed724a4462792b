//! EPUB archive access: container.xml, the package document, and content
//! documents by spine idref.

mod reader;

pub use reader::{Epub, ManifestItem};
