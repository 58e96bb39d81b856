//! # XML Tree Module
//!
//! A small mutable element tree over `quick-xml`, with just enough
//! navigation for interchange files: `/`-separated paths with `*`
//! wildcards, text read/write, and serialization that leaves untouched
//! markup as it was read.
//!
//! ## Usage
//!
//! ```rust
//! use timecode_sync::xml::{Document, ElementPath};
//!
//! let mut doc = Document::parse("<xmeml><sequence><name>Main</name></sequence></xmeml>")?;
//! let name: ElementPath = "sequence/name".parse()?;
//!
//! doc.root_mut().first_mut(&name).unwrap().set_text("Edit");
//! assert_eq!(
//!     doc.to_xml_string()?,
//!     "<xmeml><sequence><name>Edit</name></sequence></xmeml>"
//! );
//! # Ok::<(), timecode_sync::error::XmlError>(())
//! ```

pub mod document;
pub mod path;

pub use document::{Document, Element, Node};
pub use path::{ElementPath, Segment};
