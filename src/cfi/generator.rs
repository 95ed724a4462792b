//! CFI component generation and assembly.

use super::filter::Exclusions;
use super::path::{Boundary, element_path, text_step};
use super::validate::{
    validate_container_document, validate_container_document_key, validate_start_element,
    validate_start_text_node,
};
use crate::dom::{ContainerDocument, DocumentNode};
use crate::error::CfiError;

/// Generates CFI components under a fixed exclusion policy.
///
/// # Example
///
/// ```
/// use cfigen::dom::{parse_xml, DocumentNode};
/// use cfigen::Generator;
///
/// let package = parse_xml(
///     r#"<package><metadata/><manifest/><spine><itemref idref="c1"/></spine></package>"#,
/// )?;
/// let chapter = parse_xml("<html><head/><body><p>Hello</p></body></html>")?;
///
/// let p = chapter.node(chapter.find_by_tag("p").unwrap()).unwrap();
/// let text = p.children().next().unwrap();
///
/// let cfi = Generator::new().character_offset_cfi("c1", &package, &text, 2)?;
/// assert_eq!(cfi, "epubcfi(/6/2!/4/2/1:2)");
/// # Ok::<(), cfigen::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Generator {
    exclusions: Exclusions,
}

impl Generator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exclusions(exclusions: Exclusions) -> Self {
        Self { exclusions }
    }

    pub fn exclusions(&self) -> &Exclusions {
        &self.exclusions
    }

    /// Content-document component for a character offset within a text node.
    ///
    /// The result has no leading indirection marker, e.g. `/4/10/2/1:3`.
    ///
    /// # Panics
    ///
    /// Panics if the text node is not inside an `<html>` element.
    pub fn character_offset_component<N: DocumentNode>(
        &self,
        text_node: &N,
        offset: i64,
    ) -> Result<String, CfiError> {
        let offset = validate_start_text_node(Some(text_node), offset)?;

        let parent = text_node.parent().ok_or_else(|| CfiError::NodeType {
            node: text_node.describe(),
            message: "text node has no parent element".to_string(),
        })?;
        let text = text_step(text_node, offset, &self.exclusions)?;
        let path = element_path(parent, Boundary::Content, &self.exclusions)?;

        Ok(format!("{}{text}", path.steps_string()))
    }

    /// Content-document component for an element, without the leading marker.
    ///
    /// # Panics
    ///
    /// Panics if the element is not inside an `<html>` element.
    pub fn element_component<N: DocumentNode>(&self, element: N) -> Result<String, CfiError> {
        validate_start_element(Some(&element))?;
        let path = element_path(element, Boundary::Content, &self.exclusions)?;
        Ok(path.steps_string())
    }

    /// Package-document component for the spine item referencing `key`.
    ///
    /// The result ends with the indirection marker, e.g. `/6/4[chap01ref]!`.
    pub fn package_component<C: ContainerDocument>(
        &self,
        key: &str,
        package: &C,
    ) -> Result<String, CfiError> {
        validate_container_document_key(key)?;
        let itemref = validate_container_document(Some(package), key)?;
        self.package_component_for(itemref)
    }

    /// Package-document component for the spine item at a zero-based position.
    ///
    /// An out-of-range position is a [`CfiError::ReferenceNotFound`].
    pub fn package_component_at<C: ContainerDocument>(
        &self,
        position: usize,
        package: &C,
    ) -> Result<String, CfiError> {
        let itemref = package
            .reference_at(position)
            .ok_or_else(|| CfiError::ReferenceNotFound {
                key: format!("#{position}"),
            })?;
        self.package_component_for(itemref)
    }

    fn package_component_for<N: DocumentNode>(&self, itemref: N) -> Result<String, CfiError> {
        let path = element_path(itemref, Boundary::Container, &self.exclusions)?;
        Ok(format!("{path}!"))
    }

    /// Complete CFI for a character offset in the content document `key`.
    pub fn character_offset_cfi<C: ContainerDocument, N: DocumentNode>(
        &self,
        key: &str,
        package: &C,
        text_node: &N,
        offset: i64,
    ) -> Result<String, CfiError> {
        let container = self.package_component(key, package)?;
        let content = self.character_offset_component(text_node, offset)?;
        Ok(compose(&container, &content))
    }

    /// Complete CFI for an element in the content document `key`.
    pub fn element_cfi<C: ContainerDocument, N: DocumentNode>(
        &self,
        key: &str,
        package: &C,
        element: N,
    ) -> Result<String, CfiError> {
        let container = self.package_component(key, package)?;
        let content = self.element_component(element)?;
        Ok(compose(&container, &content))
    }
}

/// Join a package component (ending in `!`) and a content component.
pub fn compose(container: &str, content: &str) -> String {
    format!("epubcfi({container}{content})")
}
