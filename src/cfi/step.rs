//! Path steps and their index parity scheme.
//!
//! Element steps are always even: the `p`-th element child (zero-based) is
//! `/(p + 1) * 2`. Text steps are always odd: the `p`-th text run is
//! `/p * 2 + 1`. The odd slots are the positions between elements.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Element step with an optional `[id]` assertion. The id is stored
    /// raw and escaped on display.
    Element { index: usize, id: Option<String> },
    /// Terminal text step with its character offset.
    Text { index: usize, offset: usize },
}

impl Step {
    /// Step for the element at `position` among its filtered element siblings.
    ///
    /// The id assertion is kept only when the id is non-empty.
    pub fn element(position: usize, id: Option<&str>) -> Self {
        Step::Element {
            index: (position + 1) * 2,
            id: id.filter(|id| !id.is_empty()).map(str::to_string),
        }
    }

    /// Step for the text run at `run_position`, with an offset into that run.
    pub fn text(run_position: usize, offset: usize) -> Self {
        Step::Text {
            index: run_position * 2 + 1,
            offset,
        }
    }

    /// The numeric step value.
    pub fn index(&self) -> usize {
        match self {
            Step::Element { index, .. } | Step::Text { index, .. } => *index,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Element { index, id: Some(id) } => {
                write!(f, "/{index}[")?;
                write_escaped(f, id)?;
                f.write_str("]")
            }
            Step::Element { index, id: None } => write!(f, "/{index}"),
            Step::Text { index, offset } => write!(f, "/{index}:{offset}"),
        }
    }
}

/// Writes an assertion value with the CFI special characters prefixed by `^`.
fn write_escaped(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    for c in value.chars() {
        if matches!(c, '^' | '[' | ']' | '(' | ')' | ',' | ';' | '=') {
            f.write_str("^")?;
        }
        write!(f, "{c}")?;
    }
    Ok(())
}
