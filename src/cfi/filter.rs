//! Exclusion policy applied to sibling lists before positions are computed.
//!
//! Reading systems inject their own elements into content documents (highlight
//! wrappers, page markers, injected `<span>`s). Listing those here removes them
//! from the counting base so generated CFIs address the publisher's markup.

use std::collections::HashSet;

use crate::dom::{DocumentNode, NodeKind};

/// Elements to leave out when computing sibling positions.
///
/// An element is excluded if any one of its classes, its tag name, or its id
/// appears in the corresponding set. Text nodes are never excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "cli", serde(default))]
pub struct Exclusions {
    /// Excluded class names.
    pub classes: HashSet<String>,
    /// Excluded tag names.
    pub elements: HashSet<String>,
    /// Excluded id values.
    pub ids: HashSet<String>,
}

impl Exclusions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exclude_class(mut self, class: impl Into<String>) -> Self {
        self.classes.insert(class.into());
        self
    }

    pub fn exclude_element(mut self, tag: impl Into<String>) -> Self {
        self.elements.insert(tag.into());
        self
    }

    pub fn exclude_id(mut self, id: impl Into<String>) -> Self {
        self.ids.insert(id.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.elements.is_empty() && self.ids.is_empty()
    }

    /// Add every entry of `other` to this policy.
    pub fn extend(&mut self, other: Exclusions) {
        self.classes.extend(other.classes);
        self.elements.extend(other.elements);
        self.ids.extend(other.ids);
    }

    /// Whether a node of this kind is removed by the policy.
    pub fn excludes(&self, kind: &NodeKind<'_>) -> bool {
        match kind {
            NodeKind::Element { tag, id, classes } => {
                self.elements.contains(*tag)
                    || id.is_some_and(|id| self.ids.contains(id))
                    || classes.iter().any(|c| self.classes.contains(c))
            }
            NodeKind::Text(_) => false,
        }
    }
}

/// Remove excluded elements from a sibling list, preserving order.
pub fn apply_exclusions<N, I>(siblings: I, exclusions: &Exclusions) -> Vec<N>
where
    N: DocumentNode,
    I: IntoIterator<Item = N>,
{
    if exclusions.is_empty() {
        return siblings.into_iter().collect();
    }
    siblings
        .into_iter()
        .filter(|node| !exclusions.excludes(&node.kind()))
        .collect()
}
