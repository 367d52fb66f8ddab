//! DOCX target document access.
//!
//! The target manual is an existing styled DOCX whose body is mutated in
//! place. This module provides the container ([`DocxPackage`]), the parsed
//! document wrapper ([`DocxDocument`]), element-level paragraph and table
//! helpers, the numbering allocator, and image header sniffing.

pub mod document;
pub mod image;
mod numbering;
mod package;
pub mod xml;

pub use document::{DocParts, DocxDocument};
pub use image::{detect_image_format, image_dimensions, make_inline_drawing, ImageFormat};
pub use numbering::{ListKind, Numbering};
pub use package::DocxPackage;
pub use xml::{XmlChild, XmlNode};
