use crate::{
    AssetFetcher, EditorConfig, FetchError, InteractionController, InteractionError, RenderError,
    RenderSurface,
};
use folio_core::{AffineTransform, Bounds};
use glam::DVec2;
use interchange::{CodecError, StructuredDocument};
use markup::{ImportError, ImportedContent, VectorMarkupImporter};
use node::{Node, NodeId, NodeKind, Style, TextAlign};
use scene_graph::{SceneError, SceneGraph};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

/// Side length of shapes created from the toolbar.
const DEFAULT_SHAPE_SIZE: f64 = 100.0;

/// Share of the font size between the text baseline and the visual center
/// of its box.
const TEXT_CENTER_OFFSET: f64 = 0.3;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Interaction(#[from] InteractionError),
    #[error("no node with id {0}")]
    UnknownNode(NodeId),
    #[error("could not read image `{reference}`")]
    ImageDecode {
        reference: String,
        #[source]
        source: image::ImageError,
    },
}

/// Shapes the toolbar can create.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ShapeTool {
    Rect,
    Circle,
}

/// Events emitted by the editor. Hosts drain them after each action.
#[derive(Clone, Debug, PartialEq)]
pub enum EditorEvent {
    NodeAdded(NodeId),
    NodeRemoved(NodeId),
    SelectionChanged(Option<NodeId>),
    ContentChanged,
    DocumentLoaded,
}

/// One open document: the scene graph, the interaction controller that
/// edits it, and the session settings.
///
/// Every action either completes or leaves the graph untouched.
pub struct Editor {
    graph: SceneGraph,
    controller: InteractionController,
    config: EditorConfig,
    importer: VectorMarkupImporter,
    events: Vec<EditorEvent>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            graph: SceneGraph::new(),
            controller: InteractionController::new(),
            importer: VectorMarkupImporter::new(config.import_options()),
            config,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn selection(&self) -> Option<&NodeId> {
        self.controller.selection()
    }

    /// Takes the events emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }

    // === Tool actions ===

    /// Adds a node (with its subtree) at the top of the paint order, or as
    /// the last child of `parent`.
    pub fn add_node(&mut self, parent: Option<&NodeId>, node: Node) -> Result<NodeId, EditorError> {
        let id = self.graph.add_node(parent, node)?;
        self.events.push(EditorEvent::NodeAdded(id.clone()));
        self.events.push(EditorEvent::ContentChanged);
        Ok(id)
    }

    /// Adds a default-sized shape centered on the page.
    pub fn add_shape(&mut self, tool: ShapeTool) -> Result<NodeId, EditorError> {
        let center = self.config.canvas_bounds().center();
        let half = DEFAULT_SHAPE_SIZE / 2.0;
        let node = match tool {
            ShapeTool::Rect => Node::rect(
                center.x - half,
                center.y - half,
                DEFAULT_SHAPE_SIZE,
                DEFAULT_SHAPE_SIZE,
            ),
            ShapeTool::Circle => Node::circle(center.x, center.y, half),
        }
        .with_id(self.graph.allocate_id())
        .with_style(self.default_style());

        self.add_node(None, node)
    }

    /// Adds a line of text centered on the page.
    pub fn add_text(&mut self, content: &str) -> Result<NodeId, EditorError> {
        let center = self.config.canvas_bounds().center();
        let font_size = self.config.default_font_size;
        let node = Node::new(NodeKind::Text {
            x: center.x,
            y: center.y + font_size * TEXT_CENTER_OFFSET,
            content: content.to_string(),
            font_size,
            font_family: self.config.default_font_family.clone(),
            align: TextAlign::Center,
        })
        .with_id(self.graph.allocate_id())
        .with_style(Style::filled(self.config.default_text_color));

        self.add_node(None, node)
    }

    /// Fetches an image, reads its natural size, and places it centered on
    /// the page, scaled down if it would not fit.
    pub fn add_image(
        &mut self,
        fetcher: &dyn AssetFetcher,
        reference: &str,
    ) -> Result<NodeId, EditorError> {
        let bytes = fetcher.fetch(reference).inspect_err(|err| {
            log::warn!("image fetch failed: {err}");
        })?;
        let (width, height) =
            probe_image_size(&bytes).map_err(|source| EditorError::ImageDecode {
                reference: reference.to_string(),
                source,
            })?;
        let size = DVec2::new(width as f64, height as f64);

        let page = self.config.canvas_bounds();
        let fit = (page.size() * self.config.fit_margin / size).min_element();
        let scale = if fit.is_finite() { fit.min(1.0) } else { 1.0 };
        let origin = page.center() - size * scale / 2.0;
        let transform = AffineTransform::translate(origin.x, origin.y)
            .compose(&AffineTransform::scale(scale, scale));

        let node = Node::image(reference, size.x, size.y)
            .with_id(self.graph.allocate_id())
            .with_transform(transform);
        self.add_node(None, node)
    }

    /// Converts markup into nodes without touching the document.
    ///
    /// Pair with [`commit_import`](Self::commit_import); dropping the result
    /// instead cancels the import.
    pub fn prepare_import(&self, markup: &str) -> Result<ImportedContent, ImportError> {
        self.importer.import(markup, self.config.canvas_bounds())
    }

    pub fn commit_import(&mut self, content: ImportedContent) -> Result<NodeId, EditorError> {
        log::debug!("committing import at scale {:.3}", content.scale);
        self.add_node(None, content.node)
    }

    pub fn import_markup(&mut self, markup: &str) -> Result<NodeId, EditorError> {
        let content = self.prepare_import(markup).inspect_err(|err| {
            log::warn!("markup import failed: {err}");
        })?;
        self.commit_import(content)
    }

    pub fn import_markup_from(
        &mut self,
        fetcher: &dyn AssetFetcher,
        reference: &str,
    ) -> Result<NodeId, EditorError> {
        let bytes = fetcher.fetch(reference).inspect_err(|err| {
            log::warn!("markup fetch failed: {err}");
        })?;
        let markup = String::from_utf8(bytes).map_err(|_| {
            ImportError::MalformedMarkup(format!("`{reference}` is not valid UTF-8"))
        })?;
        self.import_markup(&markup)
    }

    // === Selection and pointer ===

    pub fn select(&mut self, id: &NodeId) -> Result<(), EditorError> {
        if !self.controller.select(&self.graph, id) {
            return Err(EditorError::UnknownNode(id.clone()));
        }
        self.events
            .push(EditorEvent::SelectionChanged(Some(id.clone())));
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        if self.controller.selection().is_some() {
            self.controller.clear_selection();
            self.events.push(EditorEvent::SelectionChanged(None));
        }
    }

    pub fn pointer_down(&mut self, point: DVec2) -> Option<NodeId> {
        let before = self.controller.selection().cloned();
        let hit = self.controller.pointer_down(&self.graph, point);
        if hit != before {
            self.events.push(EditorEvent::SelectionChanged(hit.clone()));
        }
        hit
    }

    pub fn pointer_move(&mut self, point: DVec2) -> bool {
        let moved = self.controller.pointer_move(&mut self.graph, point);
        if moved {
            self.events.push(EditorEvent::ContentChanged);
        }
        moved
    }

    pub fn pointer_up(&mut self) {
        self.controller.pointer_up();
    }

    // === Editing ===

    /// Adds `delta` to the node's local translation, in its parent's space.
    pub fn move_node(&mut self, id: &NodeId, delta: DVec2) -> Result<(), EditorError> {
        if !self.graph.translate_node(id, delta) {
            return Err(EditorError::UnknownNode(id.clone()));
        }
        self.events.push(EditorEvent::ContentChanged);
        Ok(())
    }

    pub fn update_style(
        &mut self,
        id: &NodeId,
        update: impl FnOnce(&mut Style),
    ) -> Result<(), EditorError> {
        let mut style = *self
            .graph
            .find_node(id)
            .ok_or_else(|| EditorError::UnknownNode(id.clone()))?
            .style();
        update(&mut style);
        self.graph.set_style(id, style);
        self.events.push(EditorEvent::ContentChanged);
        Ok(())
    }

    /// Removes a node and its subtree, returning it.
    pub fn remove_node(&mut self, id: &NodeId) -> Result<Node, EditorError> {
        let had_selection = self.controller.selection().is_some();
        let removed = self
            .graph
            .remove_node(id)
            .ok_or_else(|| EditorError::UnknownNode(id.clone()))?;
        self.controller.notify_removed(&removed);
        self.after_removal(&removed, had_selection);
        Ok(removed)
    }

    pub fn delete_selected(&mut self) -> Result<NodeId, EditorError> {
        let removed = self.controller.delete_selected(&mut self.graph)?;
        self.after_removal(&removed, true);
        Ok(removed.id)
    }

    fn after_removal(&mut self, removed: &Node, had_selection: bool) {
        self.events.push(EditorEvent::NodeRemoved(removed.id.clone()));
        self.events.push(EditorEvent::ContentChanged);
        if had_selection && self.controller.selection().is_none() {
            self.events.push(EditorEvent::SelectionChanged(None));
        }
    }

    // === Persistence ===

    /// Replaces the document. On error the current document is kept.
    pub fn load(&mut self, document: &StructuredDocument) -> Result<(), EditorError> {
        let graph = interchange::deserialize(document, self.config.unknown_variant_policy)?;
        log::info!("loaded document with {} node(s)", graph.len());
        self.graph = graph;
        self.controller.reset();
        self.events.push(EditorEvent::DocumentLoaded);
        self.events.push(EditorEvent::SelectionChanged(None));
        Ok(())
    }

    pub fn save(&self) -> StructuredDocument {
        interchange::serialize(&self.graph)
    }

    /// Empties the document. Like [`load`](Self::load), this always reports
    /// the selection as cleared.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.controller.reset();
        self.events.push(EditorEvent::ContentChanged);
        self.events.push(EditorEvent::SelectionChanged(None));
    }

    // === Rendering ===

    pub fn paint(&self, surface: &mut dyn RenderSurface) {
        surface.paint(&self.graph.to_flat_list());
    }

    pub fn export_raster(
        &self,
        surface: &mut dyn RenderSurface,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, EditorError> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidSize { width, height }.into());
        }
        Ok(surface.export_raster(&self.graph.to_flat_list(), width, height)?)
    }

    /// Bounds of everything on the page, if it has any content.
    pub fn content_bounds(&self) -> Option<Bounds> {
        self.graph.content_bounds()
    }

    fn default_style(&self) -> Style {
        Style::filled(self.config.default_fill)
            .with_stroke(self.config.default_stroke, self.config.default_stroke_width)
    }
}

fn probe_image_size(bytes: &[u8]) -> image::ImageResult<(u32, u32)> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_dimensions()
}
