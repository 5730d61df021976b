//! # Core geometry and color types for Folio
//!
//! This crate provides the leaf types shared by every other crate in the
//! workspace: the 2x3 affine transform used for placing nodes, axis-aligned
//! bounds, and straight-alpha RGBA colors.

pub mod bounds;
pub mod color;
pub mod transform;

pub use bounds::Bounds;
pub use color::Color;
pub use transform::{AffineTransform, Decomposed};
