//! Element ascent and terminal text steps.

use std::fmt;

use super::filter::{Exclusions, apply_exclusions};
use super::step::Step;
use super::text_run::TextRunAccumulator;
use crate::dom::{DocumentNode, NodeKind, text_length};
use crate::error::CfiError;

/// The top-level element an ascent stops at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// The package document (`<package>`). Paths carry no indirection marker.
    Container,
    /// A content document (`<html>`). Paths start with the `!` marker.
    Content,
}

impl Boundary {
    pub fn tag_name(self) -> &'static str {
        match self {
            Boundary::Container => "package",
            Boundary::Content => "html",
        }
    }

    pub fn has_indirection(self) -> bool {
        match self {
            Boundary::Container => false,
            Boundary::Content => true,
        }
    }
}

/// Steps from just below a boundary down to a target element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementPath {
    boundary: Boundary,
    steps: Vec<Step>,
}

impl ElementPath {
    pub fn boundary(&self) -> Boundary {
        self.boundary
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// The steps without the indirection marker.
    pub fn steps_string(&self) -> String {
        self.steps.iter().map(|s| s.to_string()).collect()
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.boundary.has_indirection() {
            f.write_str("!")?;
        }
        for step in &self.steps {
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

/// Build the element steps from `node` up to `boundary`, ancestors first.
///
/// The ascent ends at the node whose parent is the boundary element, or at the
/// boundary element itself when `node` is that element.
///
/// # Errors
///
/// Returns [`CfiError::NodeType`] if `node` or one of its ancestors is removed
/// by the exclusion policy, since such an element has no position.
///
/// # Panics
///
/// Panics if the ascent reaches the top of the tree without meeting the
/// boundary element. The caller must only start from nodes inside a document
/// of the right kind.
pub fn element_path<N: DocumentNode>(
    node: N,
    boundary: Boundary,
    exclusions: &Exclusions,
) -> Result<ElementPath, CfiError> {
    let top = boundary.tag_name();
    let mut steps = Vec::new();
    let mut current = node;

    loop {
        let parent = current.parent();
        steps.push(element_step(&current, parent.as_ref(), exclusions)?);

        let at_boundary = current.tag_name() == Some(top)
            || parent.as_ref().and_then(|p| p.tag_name()) == Some(top);
        if at_boundary {
            break;
        }

        current = match parent {
            Some(parent) => parent,
            None => panic!(
                "reached the top of the document from {} without meeting a <{top}> element",
                current.describe()
            ),
        };
    }

    steps.reverse();
    Ok(ElementPath { boundary, steps })
}

/// Step of `element` among the filtered element children of its parent.
fn element_step<N: DocumentNode>(
    element: &N,
    parent: Option<&N>,
    exclusions: &Exclusions,
) -> Result<Step, CfiError> {
    let position = match parent {
        Some(parent) => {
            let elements = parent
                .children()
                .filter(|c| matches!(c.kind(), NodeKind::Element { .. }));
            apply_exclusions(elements, exclusions)
                .iter()
                .position(|sibling| sibling == element)
        }
        // The top-level element is the only element at its level.
        None => (!exclusions.excludes(&element.kind())).then_some(0),
    };

    let position = position.ok_or_else(|| CfiError::NodeType {
        node: element.describe(),
        message: "element is removed by the exclusion policy and has no position".to_string(),
    })?;

    let id = match element.kind() {
        NodeKind::Element { id, .. } => id,
        NodeKind::Text(_) => None,
    };
    Ok(Step::element(position, id))
}

/// Build the terminal step for `offset` within `text_node`.
///
/// Adjacent text siblings count as one run: the step addresses the run and
/// the offset is shifted by the length of the run members before `text_node`.
pub fn text_step<N: DocumentNode>(
    text_node: &N,
    offset: usize,
    exclusions: &Exclusions,
) -> Result<Step, CfiError> {
    let parent = text_node.parent().ok_or_else(|| CfiError::NodeType {
        node: text_node.describe(),
        message: "text node has no parent element".to_string(),
    })?;

    let mut runs = TextRunAccumulator::new();
    for sibling in apply_exclusions(parent.children(), exclusions) {
        match sibling.kind() {
            NodeKind::Text(_) if sibling == *text_node => {
                let position = runs.target();
                return Ok(Step::text(
                    position.run_index,
                    position.chars_before + offset,
                ));
            }
            NodeKind::Text(text) => runs.text(text_length(text)),
            NodeKind::Element { .. } => runs.element(),
        }
    }

    Err(CfiError::NodeType {
        node: text_node.describe(),
        message: "text node is not among the children of its parent".to_string(),
    })
}
