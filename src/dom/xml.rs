//! quick-xml loader for package and XHTML content documents.
//!
//! Unlike the HTML parser, this keeps the exact node structure of the source:
//! whitespace text is preserved, nothing is inserted, and a CDATA section
//! becomes its own text node the way it does in a browser DOM.

use quick_xml::Reader;
use quick_xml::errors::IllFormedError;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};

use super::arena::{ArenaDom, ArenaNodeId, Attribute, local_qname};
use crate::error::Result;

/// Parse a well-formed XML document into an [`ArenaDom`].
pub fn parse_xml(content: &str) -> Result<ArenaDom> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);

    let mut dom = ArenaDom::new();
    let mut stack: Vec<ArenaNodeId> = Vec::new();
    // Text following a CDATA section starts a new node, as in a DOM.
    let mut split_next_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let element = create_element(&mut dom, &e);
                let parent = stack.last().copied().unwrap_or(dom.document());
                dom.append(parent, element);
                stack.push(element);
                split_next_text = false;
            }
            Event::Empty(e) => {
                let element = create_element(&mut dom, &e);
                let parent = stack.last().copied().unwrap_or(dom.document());
                dom.append(parent, element);
                split_next_text = false;
            }
            Event::End(_) => {
                stack.pop();
                split_next_text = false;
            }
            Event::Text(e) => {
                if let Some(&parent) = stack.last() {
                    let text = e.xml10_content().map_err(quick_xml::Error::from)?;
                    push_text(&mut dom, parent, &text, &mut split_next_text);
                }
            }
            Event::GeneralRef(e) => {
                if let Some(&parent) = stack.last() {
                    let text = match e.resolve_char_ref()? {
                        Some(c) => c.to_string(),
                        None => {
                            let name = e.decode().map_err(quick_xml::Error::from)?;
                            match resolve_predefined_entity(&name) {
                                Some(resolved) => resolved.to_string(),
                                None => format!("&{name};"),
                            }
                        }
                    };
                    push_text(&mut dom, parent, &text, &mut split_next_text);
                }
            }
            Event::CData(e) => {
                if let Some(&parent) = stack.last() {
                    let text = e.xml10_content().map_err(quick_xml::Error::from)?;
                    dom.append_split_text(parent, &text);
                    split_next_text = true;
                }
            }
            Event::Comment(e) => {
                let parent = stack.last().copied().unwrap_or(dom.document());
                let comment = dom.create_comment(String::from_utf8_lossy(e.as_ref()).into_owned());
                dom.append(parent, comment);
            }
            Event::PI(e) => {
                let parent = stack.last().copied().unwrap_or(dom.document());
                let pi = dom.create_comment(String::from_utf8_lossy(e.as_ref()).into_owned());
                dom.append(parent, pi);
            }
            Event::DocType(_) | Event::Decl(_) => {}
            Event::Eof => break,
        }
    }

    if let Some(&open) = stack.last() {
        let name = dom
            .element_name(open)
            .map(|n| n.to_string())
            .unwrap_or_default();
        return Err(quick_xml::Error::IllFormed(IllFormedError::MissingEndTag(name)).into());
    }

    Ok(dom)
}

fn push_text(dom: &mut ArenaDom, parent: ArenaNodeId, text: &str, split: &mut bool) {
    if *split {
        dom.append_split_text(parent, text);
        *split = false;
    } else {
        dom.append_text(parent, text);
    }
}

fn create_element(dom: &mut ArenaDom, e: &BytesStart<'_>) -> ArenaNodeId {
    let local = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
    let attrs = e
        .attributes()
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let raw = String::from_utf8_lossy(&attr.value).into_owned();
            let value = match quick_xml::escape::unescape(&raw) {
                Ok(unescaped) => unescaped.into_owned(),
                Err(_) => raw,
            };
            Attribute {
                name: local_qname(&key),
                value,
            }
        })
        .collect();
    dom.create_element(local_qname(&local), attrs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preserves_whitespace_text() {
        let dom = parse_xml("<html>\n  <body><p>a</p></body>\n</html>").unwrap();
        let html = dom.root_element().unwrap();
        let children: Vec<_> = dom.children(html).collect();
        assert_eq!(children.len(), 3);
        assert_eq!(dom.text_content(children[0]), Some("\n  "));
    }

    #[test]
    fn test_entities_merge_into_one_text_node() {
        let dom = parse_xml("<p>fish &amp; chips &#233;</p>").unwrap();
        let p = dom.find_by_tag("p").unwrap();
        let children: Vec<_> = dom.children(p).collect();
        assert_eq!(children.len(), 1);
        assert_eq!(dom.text_content(children[0]), Some("fish & chips é"));
    }

    #[test]
    fn test_cdata_splits_text() {
        let dom = parse_xml("<p>ab<![CDATA[cd]]>ef</p>").unwrap();
        let p = dom.find_by_tag("p").unwrap();
        let texts: Vec<_> = dom
            .children(p)
            .filter_map(|c| dom.text_content(c))
            .collect();
        assert_eq!(texts, vec!["ab", "cd", "ef"]);
    }

    #[test]
    fn test_prefixed_names_and_attributes() {
        let dom = parse_xml(
            r#"<opf:package xmlns:opf="http://www.idpf.org/2007/opf"><opf:spine><opf:itemref idref="c1" linear="yes"/></opf:spine></opf:package>"#,
        )
        .unwrap();
        let itemref = dom.find_by_tag("itemref").unwrap();
        assert_eq!(dom.get_attr(itemref, "idref"), Some("c1"));
        assert!(dom.find_by_tag("package").is_some());
    }

    #[test]
    fn test_attribute_values_unescaped() {
        let dom = parse_xml(r#"<p id="a&amp;b" class="x y"/>"#).unwrap();
        let p = dom.find_by_tag("p").unwrap();
        assert_eq!(dom.element_id(p), Some("a&b"));
        assert_eq!(dom.element_classes(p), ["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_rejects_unclosed_elements() {
        assert!(parse_xml("<html><body>").is_err());
        assert!(parse_xml("<p>a<br></p>").is_err());
    }

    #[test]
    fn test_line_endings_are_normalized() {
        let dom = parse_xml("<p>ab\r\ncd\ref<![CDATA[g\r\nh]]></p>").unwrap();
        let p = dom.find_by_tag("p").unwrap();
        let texts: Vec<_> = dom
            .children(p)
            .filter_map(|c| dom.text_content(c))
            .collect();
        assert_eq!(texts, vec!["ab\ncd\nef", "g\nh"]);
    }

    #[test]
    fn test_html_named_entities() {
        let dom = parse_xml("<p>a&mdash;b&rsquo;s&hellip;&#x41;&bogus;</p>").unwrap();
        let p = dom.find_by_tag("p").unwrap();
        let text = dom.children(p).next().unwrap();
        assert_eq!(
            dom.text_content(text),
            Some("a\u{2014}b\u{2019}s\u{2026}A&bogus;")
        );
    }
}
