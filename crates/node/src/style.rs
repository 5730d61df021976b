use folio_core::Color;
use serde::{Deserialize, Serialize};

/// Resolved paint for a node.
///
/// `fill` and `stroke` of `none` are stored as [`Color::TRANSPARENT`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub fill: Color,
    pub stroke: Color,
    pub stroke_width: f64,
    pub opacity: f64,
    pub fill_opacity: f64,
}

impl Style {
    pub fn filled(fill: Color) -> Self {
        Self {
            fill,
            ..Self::default()
        }
    }

    pub fn with_stroke(mut self, stroke: Color, width: f64) -> Self {
        self.stroke = stroke;
        self.stroke_width = width.max(0.0);
        self
    }

    /// Fill color with `opacity` and `fill_opacity` folded into alpha.
    pub fn effective_fill(&self) -> Color {
        self.fill.with_alpha_factor(self.opacity * self.fill_opacity)
    }

    /// Stroke color with `opacity` folded into alpha.
    pub fn effective_stroke(&self) -> Color {
        self.stroke.with_alpha_factor(self.opacity)
    }
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill: Color::TRANSPARENT,
            stroke: Color::TRANSPARENT,
            stroke_width: 0.0,
            opacity: 1.0,
            fill_opacity: 1.0,
        }
    }
}

/// Interaction flags persisted with every node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionFlags {
    /// Whether a pointer-down can select the node.
    pub selectable: bool,
    /// Whether the node takes part in hit-testing at all.
    pub evented: bool,
    /// Locked nodes can be selected but not dragged.
    pub locked: bool,
}

impl Default for InteractionFlags {
    fn default() -> Self {
        Self {
            selectable: true,
            evented: true,
            locked: false,
        }
    }
}
