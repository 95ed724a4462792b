//! Arena-based document tree.
//!
//! Both loaders (XML via quick-xml, HTML via html5ever) build into this arena.
//! Links between nodes are indices into one vector, so sibling scans during
//! CFI generation never chase pointers.

use std::collections::HashMap;

use html5ever::{LocalName, QualName};

use super::{ContainerDocument, DocumentNode, NodeKind, text_length};

/// Index of a node in an [`ArenaDom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArenaNodeId(u32);

impl ArenaNodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Payload of an arena node.
#[derive(Debug, Clone)]
pub enum ArenaNodeData {
    Document,
    Element {
        name: QualName,
        attrs: Vec<Attribute>,
        /// Value of the `id` attribute, extracted at creation.
        id: Option<String>,
        /// Whitespace-separated `class` values, extracted at creation.
        classes: Vec<String>,
    },
    Text(String),
    /// Comment or processing instruction. Never addressed by a CFI.
    Comment(String),
}

#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: QualName,
    pub value: String,
}

/// A node and its links.
#[derive(Debug)]
pub struct ArenaNode {
    pub data: ArenaNodeData,
    pub(crate) parent: Option<ArenaNodeId>,
    first_child: Option<ArenaNodeId>,
    last_child: Option<ArenaNodeId>,
    prev_sibling: Option<ArenaNodeId>,
    next_sibling: Option<ArenaNodeId>,
}

impl ArenaNode {
    fn new(data: ArenaNodeData) -> Self {
        Self {
            data,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
        }
    }
}

/// Owned document tree.
///
/// Node ids are only meaningful for the arena that created them; the linking
/// methods panic when handed an id from another arena.
pub struct ArenaDom {
    nodes: Vec<ArenaNode>,
    document: ArenaNodeId,
    /// First element carrying each id value.
    id_map: HashMap<String, ArenaNodeId>,
}

impl ArenaDom {
    pub fn new() -> Self {
        Self {
            nodes: vec![ArenaNode::new(ArenaNodeData::Document)],
            document: ArenaNodeId(0),
            id_map: HashMap::new(),
        }
    }

    fn alloc(&mut self, data: ArenaNodeData) -> ArenaNodeId {
        let id = ArenaNodeId(self.nodes.len() as u32);
        self.nodes.push(ArenaNode::new(data));
        id
    }

    /// The document node, parent of the root element.
    pub fn document(&self) -> ArenaNodeId {
        self.document
    }

    pub fn get(&self, id: ArenaNodeId) -> Option<&ArenaNode> {
        self.nodes.get(id.index())
    }

    pub(crate) fn get_mut(&mut self, id: ArenaNodeId) -> Option<&mut ArenaNode> {
        self.nodes.get_mut(id.index())
    }

    /// Create a detached element. Its `id` is registered unless an earlier
    /// element already claimed the value.
    pub fn create_element(&mut self, name: QualName, attrs: Vec<Attribute>) -> ArenaNodeId {
        let attr = |key: &str| {
            attrs
                .iter()
                .find(|a| a.name.local.as_ref() == key)
                .map(|a| a.value.as_str())
        };
        let id = attr("id").map(str::to_string);
        let classes = attr("class")
            .map(|value| value.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        let node = self.alloc(ArenaNodeData::Element {
            name,
            attrs,
            id: id.clone(),
            classes,
        });
        if let Some(id) = id {
            self.id_map.entry(id).or_insert(node);
        }
        node
    }

    /// Create an un-namespaced element from a local name and attribute pairs.
    pub fn create_element_local(&mut self, local: &str, attrs: &[(&str, &str)]) -> ArenaNodeId {
        let attrs = attrs
            .iter()
            .map(|&(name, value)| Attribute {
                name: local_qname(name),
                value: value.to_string(),
            })
            .collect();
        self.create_element(local_qname(local), attrs)
    }

    pub fn create_text(&mut self, text: String) -> ArenaNodeId {
        self.alloc(ArenaNodeData::Text(text))
    }

    pub fn create_comment(&mut self, text: String) -> ArenaNodeId {
        self.alloc(ArenaNodeData::Comment(text))
    }

    /// Make `child` the last child of `parent`.
    pub fn append(&mut self, parent: ArenaNodeId, child: ArenaNodeId) {
        let prev = self.nodes[parent.index()].last_child;

        let node = &mut self.nodes[child.index()];
        node.parent = Some(parent);
        node.prev_sibling = prev;
        node.next_sibling = None;

        match prev {
            Some(prev) => self.nodes[prev.index()].next_sibling = Some(child),
            None => self.nodes[parent.index()].first_child = Some(child),
        }
        self.nodes[parent.index()].last_child = Some(child);
    }

    /// Link `node` in as the previous sibling of `sibling`.
    pub fn insert_before(&mut self, sibling: ArenaNodeId, node: ArenaNodeId) {
        let (parent, prev) = {
            let s = &self.nodes[sibling.index()];
            (s.parent, s.prev_sibling)
        };

        let new = &mut self.nodes[node.index()];
        new.parent = parent;
        new.prev_sibling = prev;
        new.next_sibling = Some(sibling);
        self.nodes[sibling.index()].prev_sibling = Some(node);

        match (prev, parent) {
            (Some(prev), _) => self.nodes[prev.index()].next_sibling = Some(node),
            (None, Some(parent)) => self.nodes[parent.index()].first_child = Some(node),
            (None, None) => {}
        }
    }

    /// Unlink `node` from its parent and siblings. Its own subtree stays.
    pub(crate) fn detach(&mut self, node: ArenaNodeId) {
        let target = &mut self.nodes[node.index()];
        let parent = target.parent.take();
        let prev = target.prev_sibling.take();
        let next = target.next_sibling.take();

        match (prev, parent) {
            (Some(prev), _) => self.nodes[prev.index()].next_sibling = next,
            (None, Some(parent)) => self.nodes[parent.index()].first_child = next,
            (None, None) => {}
        }
        match (next, parent) {
            (Some(next), _) => self.nodes[next.index()].prev_sibling = prev,
            (None, Some(parent)) => self.nodes[parent.index()].last_child = prev,
            (None, None) => {}
        }
    }

    /// Append text to `parent`, extending its last child if that is text.
    pub fn append_text(&mut self, parent: ArenaNodeId, text: &str) {
        if let Some(last) = self.nodes[parent.index()].last_child
            && let ArenaNodeData::Text(existing) = &mut self.nodes[last.index()].data
        {
            existing.push_str(text);
            return;
        }
        self.append_split_text(parent, text);
    }

    /// Append a separate text node, even when the last child is already text.
    ///
    /// This is how a DOM represents a CDATA section or a normalization
    /// boundary: logically adjacent text split over sibling nodes.
    pub fn append_split_text(&mut self, parent: ArenaNodeId, text: &str) -> ArenaNodeId {
        let node = self.create_text(text.to_string());
        self.append(parent, node);
        node
    }

    pub fn get_by_id(&self, id: &str) -> Option<ArenaNodeId> {
        self.id_map.get(id).copied()
    }

    pub fn children(&self, parent: ArenaNodeId) -> Children<'_> {
        Children {
            dom: self,
            next: self.get(parent).and_then(|n| n.first_child),
        }
    }

    /// Nodes below `root` in document order, `root` excluded.
    pub fn descendants(&self, root: ArenaNodeId) -> Descendants<'_> {
        let mut stack: Vec<_> = self.children(root).collect();
        stack.reverse();
        Descendants { dom: self, stack }
    }

    /// First element with this local name, in document order.
    pub fn find_by_tag(&self, tag: &str) -> Option<ArenaNodeId> {
        self.descendants(self.document)
            .find(|&id| self.element_name(id).is_some_and(|n| n.as_ref() == tag))
    }

    /// The top-level element of the document.
    pub fn root_element(&self) -> Option<ArenaNodeId> {
        self.children(self.document).find(|&id| self.is_element(id))
    }

    /// Borrow a node through the [`DocumentNode`] capability.
    ///
    /// Returns `None` for ids that are not elements or text nodes.
    pub fn node(&self, id: ArenaNodeId) -> Option<DomNode<'_>> {
        (self.is_element(id) || self.is_text(id)).then_some(DomNode { dom: self, id })
    }

    /// Resolve a character offset counted over the descendant text of `element`.
    ///
    /// Returns the text node that contains the offset and the offset local to
    /// that node, both in UTF-16 code units. An offset equal to the total text
    /// length resolves to the end of the last text node.
    pub fn text_position(&self, element: ArenaNodeId, offset: usize) -> Option<(ArenaNodeId, usize)> {
        let mut remaining = offset;
        let mut last = None;
        for id in self.descendants(element) {
            let Some(text) = self.text_content(id) else {
                continue;
            };
            let len = text_length(text);
            if remaining < len {
                return Some((id, remaining));
            }
            remaining -= len;
            last = Some((id, len));
        }
        match last {
            Some(end) if remaining == 0 => Some(end),
            _ => None,
        }
    }

    fn element(&self, id: ArenaNodeId) -> Option<(&QualName, &[Attribute], Option<&str>, &[String])> {
        match &self.get(id)?.data {
            ArenaNodeData::Element {
                name,
                attrs,
                id,
                classes,
            } => Some((name, attrs.as_slice(), id.as_deref(), classes.as_slice())),
            _ => None,
        }
    }

    pub fn element_name(&self, id: ArenaNodeId) -> Option<&LocalName> {
        self.element(id).map(|(name, ..)| &name.local)
    }

    /// Attribute value by local name.
    pub fn get_attr(&self, id: ArenaNodeId, attr_name: &str) -> Option<&str> {
        let (_, attrs, ..) = self.element(id)?;
        attrs
            .iter()
            .find(|a| a.name.local.as_ref() == attr_name)
            .map(|a| a.value.as_str())
    }

    pub fn element_id(&self, id: ArenaNodeId) -> Option<&str> {
        self.element(id).and_then(|(_, _, id, _)| id)
    }

    pub fn element_classes(&self, id: ArenaNodeId) -> &[String] {
        self.element(id)
            .map(|(.., classes)| classes)
            .unwrap_or_default()
    }

    pub fn is_element(&self, id: ArenaNodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn is_text(&self, id: ArenaNodeId) -> bool {
        self.text_content(id).is_some()
    }

    pub fn text_content(&self, id: ArenaNodeId) -> Option<&str> {
        match &self.get(id)?.data {
            ArenaNodeData::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }
}

impl Default for ArenaDom {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ArenaDom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArenaDom")
            .field("nodes", &self.nodes.len())
            .field("ids", &self.id_map.len())
            .finish()
    }
}

/// Build an un-namespaced qualified name.
pub(crate) fn local_qname(local: &str) -> QualName {
    QualName::new(None, html5ever::ns!(), LocalName::from(local))
}

/// Children of a node, in order.
pub struct Children<'a> {
    dom: &'a ArenaDom,
    next: Option<ArenaNodeId>,
}

impl Iterator for Children<'_> {
    type Item = ArenaNodeId;

    fn next(&mut self) -> Option<ArenaNodeId> {
        let id = self.next?;
        self.next = self.dom.nodes[id.index()].next_sibling;
        Some(id)
    }
}

/// Preorder walk below a node.
pub struct Descendants<'a> {
    dom: &'a ArenaDom,
    stack: Vec<ArenaNodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = ArenaNodeId;

    fn next(&mut self) -> Option<ArenaNodeId> {
        let id = self.stack.pop()?;
        let start = self.stack.len();
        self.stack.extend(self.dom.children(id));
        self.stack[start..].reverse();
        Some(id)
    }
}

/// A borrowed element or text node of an [`ArenaDom`].
#[derive(Debug, Clone, Copy)]
pub struct DomNode<'a> {
    dom: &'a ArenaDom,
    id: ArenaNodeId,
}

impl DomNode<'_> {
    pub fn id(&self) -> ArenaNodeId {
        self.id
    }
}

impl PartialEq for DomNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.dom, other.dom) && self.id == other.id
    }
}

impl Eq for DomNode<'_> {}

impl DocumentNode for DomNode<'_> {
    fn kind(&self) -> NodeKind<'_> {
        match &self.dom.nodes[self.id.index()].data {
            ArenaNodeData::Element { name, id, classes, .. } => NodeKind::Element {
                tag: name.local.as_ref(),
                id: id.as_deref(),
                classes,
            },
            ArenaNodeData::Text(text) => NodeKind::Text(text),
            // `ArenaDom::node` only hands out elements and text nodes
            _ => unreachable!("DomNode {:?} is neither an element nor text", self.id),
        }
    }

    fn parent(&self) -> Option<Self> {
        let parent = self.dom.nodes[self.id.index()].parent?;
        self.dom.is_element(parent).then_some(DomNode {
            dom: self.dom,
            id: parent,
        })
    }

    fn children(&self) -> impl Iterator<Item = Self> {
        let dom = self.dom;
        dom.children(self.id).filter_map(move |c| dom.node(c))
    }
}

impl ContainerDocument for ArenaDom {
    type Node<'a> = DomNode<'a>;

    fn references(&self, key: &str) -> Vec<DomNode<'_>> {
        self.itemrefs()
            .filter(|&id| self.get_attr(id, "idref") == Some(key))
            .filter_map(|id| self.node(id))
            .collect()
    }

    fn reference_at(&self, position: usize) -> Option<DomNode<'_>> {
        self.itemrefs().nth(position).and_then(|id| self.node(id))
    }
}

impl ArenaDom {
    /// Spine `itemref` elements in document order.
    fn itemrefs(&self) -> impl Iterator<Item = ArenaNodeId> + '_ {
        self.descendants(self.document)
            .filter(|&id| self.element_name(id).is_some_and(|n| n.as_ref() == "itemref"))
    }
}
