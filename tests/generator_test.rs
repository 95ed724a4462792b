//! End-to-end CFI generation against parsed package and content documents.

use cfigen::dom::{
    ArenaDom, DocumentNode, DomNode, NodeKind, parse_document, parse_html, parse_xml,
};
use cfigen::{CfiError, Exclusions, Generator, compose};

const PACKAGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>Moby-Dick</dc:title>
  </metadata>
  <manifest>
    <item id="cover" href="cover.xhtml" media-type="application/xhtml+xml"/>
    <item id="chap01" href="chapter_001.xhtml" media-type="application/xhtml+xml"/>
  </manifest>
  <spine>
    <itemref idref="cover"/>
    <itemref id="chap01ref" idref="chap01"/>
  </spine>
</package>"#;

const CHAPTER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>Loomings</title></head>
<body>
<section id="chapter">
<h1>Loomings</h1>
<p>Call me Ishmael.</p>
<p id="para2">Some years ago<span class="highlight">never mind</span> how long precisely</p>
</section>
</body>
</html>"#;

fn by_id<'a>(dom: &'a ArenaDom, id: &str) -> DomNode<'a> {
    dom.node(dom.get_by_id(id).expect("id present")).expect("element")
}

#[test]
fn test_package_component_skips_whitespace_text() {
    let package = parse_xml(PACKAGE).unwrap();
    let component = Generator::new().package_component("chap01", &package).unwrap();
    assert_eq!(component, "/6/4[chap01ref]!");
}

#[test]
fn test_element_cfi() {
    let package = parse_xml(PACKAGE).unwrap();
    let chapter = parse_xml(CHAPTER).unwrap();

    let cfi = Generator::new()
        .element_cfi("chap01", &package, by_id(&chapter, "para2"))
        .unwrap();
    assert_eq!(cfi, "epubcfi(/6/4[chap01ref]!/4/2[chapter]/6[para2])");
}

#[test]
fn test_character_offset_cfi_with_exclusions() {
    let package = parse_xml(PACKAGE).unwrap();
    let chapter = parse_xml(CHAPTER).unwrap();
    let para = by_id(&chapter, "para2");
    let tail = para.children().last().unwrap();
    assert_eq!(tail.kind(), NodeKind::Text(" how long precisely"));

    let plain = Generator::new()
        .character_offset_cfi("chap01", &package, &tail, 4)
        .unwrap();
    assert_eq!(plain, "epubcfi(/6/4[chap01ref]!/4/2[chapter]/6[para2]/3:4)");

    // Without the highlight span both text nodes form one run
    let generator = Generator::with_exclusions(Exclusions::new().exclude_class("highlight"));
    let filtered = generator
        .character_offset_cfi("chap01", &package, &tail, 4)
        .unwrap();
    assert_eq!(filtered, "epubcfi(/6/4[chap01ref]!/4/2[chapter]/6[para2]/1:18)");
}

#[test]
fn test_generation_is_idempotent() {
    let package = parse_xml(PACKAGE).unwrap();
    let chapter = parse_xml(CHAPTER).unwrap();
    let generator = Generator::with_exclusions(Exclusions::new().exclude_element("span"));
    let text = by_id(&chapter, "para2").children().next().unwrap();

    let first = generator.character_offset_cfi("chap01", &package, &text, 5).unwrap();
    let second = generator.character_offset_cfi("chap01", &package, &text, 5).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_components_compose() {
    let package = parse_xml(PACKAGE).unwrap();
    let chapter = parse_xml(CHAPTER).unwrap();
    let generator = Generator::new();

    let container = generator.package_component("chap01", &package).unwrap();
    let content = generator.element_component(by_id(&chapter, "chapter")).unwrap();
    assert!(container.ends_with('!'));
    assert!(!content.starts_with('!'));
    assert_eq!(compose(&container, &content), "epubcfi(/6/4[chap01ref]!/4/2[chapter])");
}

#[test]
fn test_unknown_idref() {
    let package = parse_xml(PACKAGE).unwrap();
    let chapter = parse_xml(CHAPTER).unwrap();

    let err = Generator::new()
        .element_cfi("chap99", &package, by_id(&chapter, "para2"))
        .unwrap_err();
    assert_eq!(
        err,
        CfiError::ReferenceNotFound {
            key: "chap99".to_string()
        }
    );
    assert!(err.to_string().contains("chap99"));
}

#[test]
fn test_html_parsed_content_document() {
    // html5ever inserts <head>, so <body> is still the second element of <html>
    let chapter = parse_html(r#"<p id="first">one<p id="second">two"#);
    let second = by_id(&chapter, "second");
    let text = second.children().next().unwrap();

    let component = Generator::new().character_offset_component(&text, 2).unwrap();
    assert_eq!(component, "/4/4[second]/1:2");
}

#[test]
fn test_crlf_offsets_match_normalized_text() {
    let chapter = parse_xml("<html><body><p>ab\r\ncd</p></body></html>").unwrap();
    let p = chapter.node(chapter.find_by_tag("p").unwrap()).unwrap();
    let text = p.children().next().unwrap();
    assert_eq!(text.kind(), NodeKind::Text("ab\ncd"));

    let generator = Generator::new();
    assert_eq!(
        generator.character_offset_component(&text, 5).unwrap(),
        "/2/2/1:5"
    );
    assert!(matches!(
        generator.character_offset_component(&text, 6),
        Err(CfiError::OutOfRange { value: 6, bound: 5, .. })
    ));
}

#[test]
fn test_html_entity_counts_as_one_character() {
    let chapter = parse_document("<html><body><p>a&mdash;b</p></body></html>");
    let p = chapter.node(chapter.find_by_tag("p").unwrap()).unwrap();
    let text = p.children().next().unwrap();
    assert_eq!(text.kind(), NodeKind::Text("a\u{2014}b"));

    let generator = Generator::new();
    assert_eq!(
        generator.character_offset_component(&text, 3).unwrap(),
        "/2/2/1:3"
    );
    assert!(matches!(
        generator.character_offset_component(&text, 4),
        Err(CfiError::OutOfRange { value: 4, bound: 3, .. })
    ));
}

/// A minimal index-based tree, to exercise the generator through the trait
/// alone.
mod tree {
    use cfigen::dom::{DocumentNode, NodeKind};

    pub enum Data {
        Element { tag: &'static str, id: Option<&'static str>, classes: Vec<String> },
        Text(&'static str),
    }

    pub struct Tree {
        pub data: Vec<Data>,
        pub parent: Vec<Option<usize>>,
        pub children: Vec<Vec<usize>>,
    }

    impl Tree {
        pub fn new() -> Self {
            Self {
                data: Vec::new(),
                parent: Vec::new(),
                children: Vec::new(),
            }
        }

        pub fn add(&mut self, parent: Option<usize>, data: Data) -> usize {
            let index = self.data.len();
            self.data.push(data);
            self.parent.push(parent);
            self.children.push(Vec::new());
            if let Some(parent) = parent {
                self.children[parent].push(index);
            }
            index
        }

        pub fn element(&mut self, parent: Option<usize>, tag: &'static str) -> usize {
            self.add(parent, Data::Element { tag, id: None, classes: Vec::new() })
        }

        pub fn text(&mut self, parent: usize, text: &'static str) -> usize {
            self.add(Some(parent), Data::Text(text))
        }

        pub fn node(&self, index: usize) -> Node<'_> {
            Node { tree: self, index }
        }
    }

    #[derive(Clone, Copy)]
    pub struct Node<'a> {
        tree: &'a Tree,
        index: usize,
    }

    impl PartialEq for Node<'_> {
        fn eq(&self, other: &Self) -> bool {
            std::ptr::eq(self.tree, other.tree) && self.index == other.index
        }
    }

    impl DocumentNode for Node<'_> {
        fn kind(&self) -> NodeKind<'_> {
            match &self.tree.data[self.index] {
                Data::Element { tag, id, classes } => NodeKind::Element {
                    tag: *tag,
                    id: *id,
                    classes: classes.as_slice(),
                },
                Data::Text(text) => NodeKind::Text(*text),
            }
        }

        fn parent(&self) -> Option<Self> {
            self.tree.parent[self.index].map(|index| self.tree.node(index))
        }

        fn children(&self) -> impl Iterator<Item = Self> {
            let tree = self.tree;
            tree.children[self.index].iter().map(move |&i| tree.node(i))
        }
    }
}

#[test]
fn test_split_text_run_through_trait() {
    use tree::{Data, Tree};

    // <html><body><p>[elem, "ab", "cd", elem]</p></body></html>
    let mut t = Tree::new();
    let html = t.element(None, "html");
    t.element(Some(html), "head");
    let body = t.element(Some(html), "body");
    let p = t.add(
        Some(body),
        Data::Element {
            tag: "p",
            id: Some("p1"),
            classes: Vec::new(),
        },
    );
    t.element(Some(p), "b");
    t.text(p, "ab");
    let cd = t.text(p, "cd");
    t.element(Some(p), "i");

    let component = Generator::new()
        .character_offset_component(&t.node(cd), 1)
        .unwrap();
    assert_eq!(component, "/4/2[p1]/1:3");
}

#[test]
fn test_offset_bounds_through_trait() {
    use tree::Tree;

    let mut t = Tree::new();
    let html = t.element(None, "html");
    let body = t.element(Some(html), "body");
    let text = t.text(body, "abc");
    let generator = Generator::new();

    assert!(matches!(
        generator.character_offset_component(&t.node(text), -1),
        Err(CfiError::OutOfRange { value: -1, .. })
    ));
    assert!(matches!(
        generator.character_offset_component(&t.node(text), 4),
        Err(CfiError::OutOfRange { value: 4, bound: 3, .. })
    ));
    assert!(matches!(
        generator.character_offset_component(&t.node(body), 0),
        Err(CfiError::NodeType { .. })
    ));
    assert_eq!(
        generator.character_offset_component(&t.node(text), 3).unwrap(),
        "/2/1:3"
    );
}

#[test]
fn test_generator_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Generator>();
}
