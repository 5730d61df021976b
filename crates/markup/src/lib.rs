//! SVG import.
//!
//! [`VectorMarkupImporter`] turns an SVG document into Folio nodes: it walks
//! the element tree, resolves each element's style through [`StyleResolver`],
//! composes nested transforms, and fits the result into a target box.

mod importer;
mod path_data;
mod style;

pub use importer::{import, ImportError, ImportOptions, ImportedContent, VectorMarkupImporter};
pub use path_data::parse_path_data;
pub use style::{parse_length, StyleResolver, DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE};
