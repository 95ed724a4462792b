//! # cfigen
//!
//! Generates EPUB Canonical Fragment Identifiers (CFIs) for elements and text
//! positions inside a publication.
//!
//! ## Features
//!
//! - Element and character-offset CFIs, e.g. `epubcfi(/6/4[chap01ref]!/4/10/2/1:3)`
//! - Exclusion policy for reading-system markup (by class, tag name, or id)
//! - Split text nodes folded into one logical run for offset arithmetic
//! - Works on any tree through the [`dom::DocumentNode`] trait, with a
//!   built-in arena DOM loaded from XML (quick-xml) or HTML (html5ever)
//! - EPUB archive reading to resolve spine idrefs to content documents
//!
//! ## Quick Start
//!
//! ```no_run
//! use cfigen::{Epub, Exclusions, Generator};
//! use cfigen::dom::DocumentNode;
//!
//! let mut epub = Epub::open("book.epub")?;
//! let idref = epub.spine()[2].clone();
//! let chapter = epub.content_document(&idref)?;
//!
//! // Text node inside the element with id "p12", at character 40
//! let p = chapter.node(chapter.get_by_id("p12").unwrap()).unwrap();
//! let text = p.children().next().unwrap();
//!
//! let generator = Generator::with_exclusions(Exclusions::new().exclude_class("highlight"));
//! let cfi = generator.character_offset_cfi(&idref, epub.package(), &text, 40)?;
//! println!("{cfi}");
//! # Ok::<(), cfigen::Error>(())
//! ```
//!
//! ## Components
//!
//! Package and content components can also be generated separately and
//! joined with [`compose`]:
//!
//! ```
//! assert_eq!(
//!     cfigen::compose("/6/4[chap01ref]!", "/4/10/2:3"),
//!     "epubcfi(/6/4[chap01ref]!/4/10/2:3)"
//! );
//! ```

pub mod cfi;
pub mod dom;
pub mod epub;
pub mod error;
pub(crate) mod util;

pub use cfi::{Boundary, Exclusions, Generator, Step, compose};
pub use epub::Epub;
pub use error::{CfiError, Error, Result};
