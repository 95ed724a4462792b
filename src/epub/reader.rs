use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::debug;
use zip::ZipArchive;

use crate::dom::{ArenaDom, parse_document, parse_xml};
use crate::error::{Error, Result};
use crate::util::{decode_text, extract_xml_encoding};

/// Manifest entry of the package document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub href: String,
    pub media_type: String,
}

/// An EPUB archive opened for CFI generation.
///
/// The package document is parsed eagerly. Content documents are read and
/// parsed on request.
///
/// # Example
///
/// ```no_run
/// use cfigen::{Epub, Generator};
///
/// let mut epub = Epub::open("book.epub")?;
/// let chapter = epub.content_document("chap01")?;
/// let p = chapter.node(chapter.get_by_id("para12").unwrap()).unwrap();
///
/// let cfi = Generator::new().element_cfi("chap01", epub.package(), p)?;
/// println!("{cfi}");
/// # Ok::<(), cfigen::Error>(())
/// ```
pub struct Epub<R = File> {
    archive: ZipArchive<R>,
    opf_path: String,
    opf_dir: String,
    package: ArenaDom,
    manifest: HashMap<String, ManifestItem>,
    spine: Vec<String>,
}

impl Epub<File> {
    /// Open an EPUB file from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }
}

impl<R: Read + Seek> Epub<R> {
    /// Open an EPUB from any [`Read`] + [`Seek`] source.
    pub fn from_reader(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;

        let opf_path = find_opf_path(&mut archive)?;
        let opf_dir = Path::new(&opf_path)
            .parent()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();
        debug!(opf = %opf_path, "found package document");

        let opf_bytes = read_archive_file_bytes(&mut archive, &opf_path)?;
        let opf = decode_text(&opf_bytes, extract_xml_encoding(&opf_bytes));
        let package = parse_xml(&opf)?;
        if package
            .root_element()
            .and_then(|root| package.element_name(root))
            .is_none_or(|name| name.as_ref() != "package")
        {
            return Err(Error::InvalidEpub(format!(
                "{opf_path} has no <package> root element"
            )));
        }

        let manifest = read_manifest(&package);
        let spine = package
            .descendants(package.document())
            .into_iter()
            .filter(|&id| package.element_name(id).is_some_and(|n| n.as_ref() == "itemref"))
            .filter_map(|id| package.get_attr(id, "idref").map(str::to_string))
            .collect::<Vec<_>>();
        debug!(
            manifest = manifest.len(),
            spine = spine.len(),
            "parsed package document"
        );

        Ok(Self {
            archive,
            opf_path,
            opf_dir,
            package,
            manifest,
            spine,
        })
    }

    /// The parsed package document.
    pub fn package(&self) -> &ArenaDom {
        &self.package
    }

    /// Path of the package document inside the archive.
    pub fn opf_path(&self) -> &str {
        &self.opf_path
    }

    /// Spine idrefs in reading order.
    pub fn spine(&self) -> &[String] {
        &self.spine
    }

    /// Manifest entry for a manifest id.
    pub fn manifest_item(&self, idref: &str) -> Option<&ManifestItem> {
        self.manifest.get(idref)
    }

    /// Read and parse the content document a spine idref points to.
    pub fn content_document(&mut self, idref: &str) -> Result<ArenaDom> {
        let href = self
            .manifest
            .get(idref)
            .map(|item| item.href.clone())
            .ok_or_else(|| Error::InvalidEpub(format!("no manifest item with id {idref:?}")))?;
        let full_path = resolve_path(&self.opf_dir, &href);
        debug!(idref, path = %full_path, "loading content document");

        let bytes = read_archive_file_bytes(&mut self.archive, &full_path)?;
        let content = decode_text(&bytes, extract_xml_encoding(&bytes));
        Ok(parse_document(&content))
    }
}

fn find_opf_path<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<String> {
    let bytes = read_archive_file_bytes(archive, "META-INF/container.xml")?;
    let container = decode_text(&bytes, None);

    let mut reader = Reader::from_str(&container);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.local_name().as_ref() == b"rootfile" => {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"full-path" {
                        return Ok(String::from_utf8_lossy(&attr.value).into_owned());
                    }
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

fn read_manifest(package: &ArenaDom) -> HashMap<String, ManifestItem> {
    package
        .descendants(package.document())
        .into_iter()
        .filter(|&id| package.element_name(id).is_some_and(|n| n.as_ref() == "item"))
        .filter_map(|id| {
            let key = package.get_attr(id, "id")?;
            let href = package.get_attr(id, "href")?;
            Some((
                key.to_string(),
                ManifestItem {
                    href: href.to_string(),
                    media_type: package.get_attr(id, "media-type").unwrap_or_default().to_string(),
                },
            ))
        })
        .collect()
}

fn read_archive_file_bytes<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> Result<Vec<u8>> {
    match archive.by_name(path) {
        Ok(mut file) => {
            let mut contents = Vec::new();
            file.read_to_end(&mut contents)?;
            return Ok(contents);
        }
        Err(zip::result::ZipError::FileNotFound) => {}
        Err(e) => return Err(e.into()),
    }

    // Manifest hrefs are URLs: try the percent-decoded form
    let decoded = percent_encoding::percent_decode_str(path)
        .decode_utf8()
        .map_err(|_| Error::InvalidEpub(format!("Invalid UTF-8 in path: {path}")))?;

    let mut file = archive.by_name(&decoded)?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents)?;
    Ok(contents)
}

/// Resolve a manifest href against the package document directory.
fn resolve_path(base: &str, href: &str) -> String {
    let href = href.split('#').next().unwrap_or(href);
    let mut parts: Vec<&str> = base.split('/').filter(|p| !p.is_empty()).collect();
    for segment in href.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            _ => parts.push(segment),
        }
    }
    parts.join("/")
}
