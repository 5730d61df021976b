//! Editing session for Folio documents.
//!
//! [`Editor`] owns one scene graph plus the [`InteractionController`] that
//! turns pointer input into selection and movement. Rendering and asset
//! loading are delegated to the host through [`RenderSurface`] and
//! [`AssetFetcher`].

mod config;
mod controller;
mod editor;
mod surface;

pub use config::EditorConfig;
pub use controller::{EphemeralState, InteractionController, InteractionError, InteractionState};
pub use editor::{Editor, EditorError, EditorEvent, ShapeTool};
pub use surface::{AssetFetcher, FetchError, FileFetcher, RenderError, RenderSurface};
