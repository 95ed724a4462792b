//! Document model consumed by CFI generation.
//!
//! The generator never touches a concrete tree type. It reads documents
//! through [`DocumentNode`] and resolves spine references through
//! [`ContainerDocument`]. [`ArenaDom`] implements both, and can be built from
//! XML (quick-xml) or tag-soup HTML (html5ever).

mod arena;
mod tree_sink;
mod xml;

pub use arena::{ArenaDom, ArenaNode, ArenaNodeData, ArenaNodeId, Attribute, DomNode};
pub use tree_sink::parse_html;
pub use xml::parse_xml;

use tracing::debug;

/// What a node is, with only the fields each kind needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind<'a> {
    Element {
        /// Local tag name.
        tag: &'a str,
        /// Value of the `id` attribute.
        id: Option<&'a str>,
        /// Class names from the `class` attribute.
        classes: &'a [String],
    },
    Text(&'a str),
}

/// Read-only access to a node of a document tree.
///
/// Equality must be node identity: two handles are equal iff they refer to
/// the same node of the same document.
pub trait DocumentNode: Sized + PartialEq {
    fn kind(&self) -> NodeKind<'_>;

    /// The parent element. `None` for the top-level element.
    fn parent(&self) -> Option<Self>;

    /// Element and text children, in document order.
    fn children(&self) -> impl Iterator<Item = Self>;

    /// Short human-readable description used in error messages.
    fn describe(&self) -> String {
        match self.kind() {
            NodeKind::Element { tag, id: Some(id), .. } => format!("<{tag}#{id}>"),
            NodeKind::Element { tag, id: None, .. } => format!("<{tag}>"),
            NodeKind::Text(_) => "#text".to_string(),
        }
    }

    fn tag_name(&self) -> Option<&str> {
        match self.kind() {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }
}

/// A document whose entries reference other documents (the EPUB package).
pub trait ContainerDocument {
    type Node<'a>: DocumentNode
    where
        Self: 'a;

    /// Entries whose `idref` equals `key`, in document order.
    fn references(&self, key: &str) -> Vec<Self::Node<'_>>;

    /// The entry at a zero-based ordinal position in the spine.
    fn reference_at(&self, position: usize) -> Option<Self::Node<'_>>;
}

/// Length of a text in UTF-16 code units, the unit of CFI character offsets.
pub fn text_length(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Parse a content or package document.
///
/// Documents are parsed as XML first so that the node structure matches what
/// a reading system sees. Documents that are not well-formed fall back to the
/// HTML parser.
pub fn parse_document(content: &str) -> ArenaDom {
    match parse_xml(content) {
        Ok(dom) => dom,
        Err(e) => {
            debug!("document is not well-formed XML ({e}), parsing as HTML");
            parse_html(content)
        }
    }
}
