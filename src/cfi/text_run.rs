//! Folding of split text nodes into logical runs.
//!
//! A DOM may hold one logical run of text as several adjacent text nodes
//! (CDATA sections, text around a removed element, incremental parsing).
//! CFI positions count a run once, and offsets are measured from the start of
//! the run, not from the start of the node.

/// Scan state between two siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    /// The previous sibling was an element, or nothing has been seen yet.
    #[default]
    Outside,
    /// Inside a run of text nodes.
    Inside {
        /// Run position of the first node in this run.
        first_index: usize,
        /// Characters in the run before the next text node.
        chars_before: usize,
    },
}

/// Where a text node falls within the runs of its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunPosition {
    /// Zero-based position of the run among the text runs.
    pub run_index: usize,
    /// Characters of the run that precede the node.
    pub chars_before: usize,
}

/// Left-to-right accumulator over a filtered sibling list.
///
/// Feed it every sibling that precedes the target (`element` or `text`), then
/// ask for the target's [`RunPosition`].
#[derive(Debug, Clone, Default)]
pub struct TextRunAccumulator {
    state: RunState,
    runs_seen: usize,
}

impl TextRunAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// An element sibling ends the current run.
    pub fn element(&mut self) {
        self.state = RunState::Outside;
    }

    /// A text sibling of `len` characters that is not the target.
    pub fn text(&mut self, len: usize) {
        self.state = match self.state {
            RunState::Outside => {
                let first_index = self.runs_seen;
                self.runs_seen += 1;
                RunState::Inside {
                    first_index,
                    chars_before: len,
                }
            }
            RunState::Inside {
                first_index,
                chars_before,
            } => RunState::Inside {
                first_index,
                chars_before: chars_before + len,
            },
        };
    }

    /// Position of the target text node, given everything fed so far.
    pub fn target(&self) -> RunPosition {
        match self.state {
            RunState::Outside => RunPosition {
                run_index: self.runs_seen,
                chars_before: 0,
            },
            RunState::Inside {
                first_index,
                chars_before,
            } => RunPosition {
                run_index: first_index,
                chars_before,
            },
        }
    }
}
