//! EPUB Canonical Fragment Identifier generation.
//!
//! A CFI names a position inside a publication in two parts joined by the
//! indirection marker `!`:
//!
//! ```text
//! epubcfi(/6/4[chap01ref]!/4/10/2/1:3)
//!         \____________/ \__________/
//!          package path   content path (text step /1 at offset 3)
//! ```
//!
//! The package path walks from the `<package>` element down to the spine
//! `itemref` of the content document. The content path walks from `<html>`
//! down to the target element, optionally ending in a text step with a
//! character offset.

mod filter;
mod generator;
mod path;
mod step;
mod text_run;
mod validate;

pub use filter::{Exclusions, apply_exclusions};
pub use generator::{Generator, compose};
pub use path::{Boundary, ElementPath, element_path, text_step};
pub use step::Step;
pub use text_run::{RunPosition, RunState, TextRunAccumulator};
pub use validate::{
    validate_container_document, validate_container_document_key, validate_start_element,
    validate_start_text_node,
};
