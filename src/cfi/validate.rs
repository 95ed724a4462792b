//! Preconditions for the public generation entry points.

use crate::dom::{ContainerDocument, DocumentNode, NodeKind, text_length};
use crate::error::CfiError;

/// Check that `node` is a text node and `offset` lies within `[0, length]`.
///
/// Returns the offset as an index on success.
pub fn validate_start_text_node<N: DocumentNode>(
    node: Option<&N>,
    offset: i64,
) -> Result<usize, CfiError> {
    const MESSAGE: &str =
        "Cannot generate a character offset from a starting point that is not a text node";

    let Some(node) = node else {
        return Err(CfiError::NodeType {
            node: "(none)".to_string(),
            message: MESSAGE.to_string(),
        });
    };
    let NodeKind::Text(text) = node.kind() else {
        return Err(CfiError::NodeType {
            node: node.describe(),
            message: MESSAGE.to_string(),
        });
    };

    let length = text_length(text) as i64;
    if offset < 0 {
        return Err(CfiError::OutOfRange {
            value: offset,
            bound: 0,
            message: "Character offset cannot be less than 0".to_string(),
        });
    }
    if offset > length {
        return Err(CfiError::OutOfRange {
            value: offset,
            bound: length,
            message: "Character offset cannot be greater than the length of the text node"
                .to_string(),
        });
    }
    Ok(offset as usize)
}

/// Check that `node` is an element.
pub fn validate_start_element<N: DocumentNode>(node: Option<&N>) -> Result<(), CfiError> {
    match node.map(|n| (n.kind(), n)) {
        None => Err(CfiError::NodeType {
            node: "(none)".to_string(),
            message: "CFI target element is undefined".to_string(),
        }),
        Some((NodeKind::Text(_), n)) => Err(CfiError::NodeType {
            node: n.describe(),
            message: "CFI target element is not an element".to_string(),
        }),
        Some((NodeKind::Element { .. }, _)) => Ok(()),
    }
}

/// Check that the idref of the content document was supplied.
pub fn validate_container_document_key(key: &str) -> Result<(), CfiError> {
    if key.is_empty() {
        return Err(CfiError::Precondition(
            "The idref for the content document, as found in the spine, must be supplied"
                .to_string(),
        ));
    }
    Ok(())
}

/// Check that a package document was supplied and references `key`.
///
/// Returns the first matching `itemref`.
pub fn validate_container_document<'d, C: ContainerDocument>(
    document: Option<&'d C>,
    key: &str,
) -> Result<C::Node<'d>, CfiError> {
    let document = document.ok_or_else(|| {
        CfiError::Precondition("A package document must be supplied to generate a CFI".to_string())
    })?;
    document
        .references(key)
        .into_iter()
        .next()
        .ok_or_else(|| CfiError::ReferenceNotFound {
            key: key.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ArenaDom, DomNode, parse_xml};

    fn paragraph(dom: &ArenaDom) -> DomNode<'_> {
        dom.node(dom.find_by_tag("p").unwrap()).unwrap()
    }

    #[test]
    fn test_text_node_offsets() {
        let dom = parse_xml("<p>abcd</p>").unwrap();
        let text = paragraph(&dom).children().next().unwrap();

        assert_eq!(validate_start_text_node(Some(&text), 0), Ok(0));
        assert_eq!(validate_start_text_node(Some(&text), 4), Ok(4));
        assert!(matches!(
            validate_start_text_node(Some(&text), -1),
            Err(CfiError::OutOfRange { value: -1, bound: 0, .. })
        ));
        assert!(matches!(
            validate_start_text_node(Some(&text), 5),
            Err(CfiError::OutOfRange { value: 5, bound: 4, .. })
        ));
    }

    #[test]
    fn test_offsets_use_utf16_length() {
        let dom = parse_xml("<p>a😀</p>").unwrap();
        let text = paragraph(&dom).children().next().unwrap();
        assert_eq!(validate_start_text_node(Some(&text), 3), Ok(3));
        assert!(validate_start_text_node(Some(&text), 4).is_err());
    }

    #[test]
    fn test_text_node_kind() {
        let dom = parse_xml("<p>abcd</p>").unwrap();
        let p = paragraph(&dom);

        assert!(matches!(
            validate_start_text_node(Some(&p), 0),
            Err(CfiError::NodeType { node, .. }) if node == "<p>"
        ));
        assert!(matches!(
            validate_start_text_node::<DomNode<'_>>(None, 0),
            Err(CfiError::NodeType { .. })
        ));
    }

    #[test]
    fn test_start_element() {
        let dom = parse_xml("<p>abcd</p>").unwrap();
        let p = paragraph(&dom);
        let text = p.children().next().unwrap();

        assert_eq!(validate_start_element(Some(&p)), Ok(()));
        assert!(validate_start_element(Some(&text)).is_err());
        assert!(validate_start_element::<DomNode<'_>>(None).is_err());
    }

    #[test]
    fn test_container_document() {
        let package =
            parse_xml(r#"<package><spine><itemref idref="c1"/></spine></package>"#).unwrap();

        assert!(validate_container_document_key("").is_err());
        assert!(validate_container_document_key("c1").is_ok());

        let itemref = validate_container_document(Some(&package), "c1").unwrap();
        assert_eq!(itemref.tag_name(), Some("itemref"));

        assert_eq!(
            validate_container_document(Some(&package), "c2").unwrap_err(),
            CfiError::ReferenceNotFound {
                key: "c2".to_string()
            }
        );
        assert!(matches!(
            validate_container_document::<ArenaDom>(None, "c1"),
            Err(CfiError::Precondition(_))
        ));
    }
}
