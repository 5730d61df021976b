//! Node types for Folio documents.
//!
//! A document is a tree of [`Node`]s. Leaves carry geometry (paths, rects,
//! circles, text, images); groups carry ordered children. Every node has a
//! resolved [`Style`], an affine transform into its parent's space, and the
//! persisted [`InteractionFlags`].
//!
//! The set of node kinds is closed: every consumer matches exhaustively, so a
//! new kind cannot be silently ignored by the importer or the codec.

mod node;
mod node_id;
mod path;
mod style;

pub use node::{Node, NodeKind, NodeVariant, TextAlign};
pub use node_id::NodeId;
pub use path::PathCommand;
pub use style::{InteractionFlags, Style};
