use crate::{InteractionFlags, NodeId, PathCommand, Style};
use folio_core::{AffineTransform, Bounds};
use glam::DVec2;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Average glyph advance as a fraction of the font size. Used for text
/// bounds, since the core has no font metrics.
const TEXT_ADVANCE_RATIO: f64 = 0.6;
const TEXT_ASCENT_RATIO: f64 = 0.8;
const TEXT_DESCENT_RATIO: f64 = 0.2;

/// Horizontal anchoring of a text node relative to its `x`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Variant tag of a [`NodeKind`], as written in documents.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NodeVariant {
    Path,
    Rect,
    Circle,
    Text,
    Image,
    Group,
}

/// Geometry of a node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Path {
        commands: Vec<PathCommand>,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        rx: f64,
        ry: f64,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
    },
    Text {
        x: f64,
        y: f64,
        content: String,
        font_size: f64,
        font_family: String,
        align: TextAlign,
    },
    Image {
        source_ref: String,
        natural_width: f64,
        natural_height: f64,
    },
    Group {
        children: Vec<Node>,
    },
}

impl NodeKind {
    pub fn variant(&self) -> NodeVariant {
        match self {
            Self::Path { .. } => NodeVariant::Path,
            Self::Rect { .. } => NodeVariant::Rect,
            Self::Circle { .. } => NodeVariant::Circle,
            Self::Text { .. } => NodeVariant::Text,
            Self::Image { .. } => NodeVariant::Image,
            Self::Group { .. } => NodeVariant::Group,
        }
    }

    /// Bounds of the geometry in the node's own coordinate space.
    ///
    /// Groups have no geometry of their own and return `None`; their bounds
    /// are the union of their children's transformed bounds. An empty path
    /// also returns `None`.
    pub fn local_bounds(&self) -> Option<Bounds> {
        match self {
            Self::Path { commands } => {
                Bounds::from_points(commands.iter().flat_map(|c| c.points()))
            }
            Self::Rect {
                x,
                y,
                width,
                height,
                ..
            } => Some(Bounds::from_origin_size(
                DVec2::new(*x, *y),
                DVec2::new(*width, *height),
            )),
            Self::Circle { cx, cy, r } => Some(Bounds::from_center_size(
                DVec2::new(*cx, *cy),
                DVec2::splat(r.abs() * 2.0),
            )),
            Self::Text {
                x,
                y,
                content,
                font_size,
                align,
                ..
            } => {
                let width = content.chars().count() as f64 * font_size * TEXT_ADVANCE_RATIO;
                let left = match align {
                    TextAlign::Left => *x,
                    TextAlign::Center => x - width / 2.0,
                    TextAlign::Right => x - width,
                };
                Some(Bounds::new(
                    DVec2::new(left, y - font_size * TEXT_ASCENT_RATIO),
                    DVec2::new(left + width, y + font_size * TEXT_DESCENT_RATIO),
                ))
            }
            Self::Image {
                natural_width,
                natural_height,
                ..
            } => Some(Bounds::from_origin_size(
                DVec2::ZERO,
                DVec2::new(*natural_width, *natural_height),
            )),
            Self::Group { .. } => None,
        }
    }
}

/// One entry in the scene tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub style: Style,
    pub transform: AffineTransform,
    pub flags: InteractionFlags,
    pub kind: NodeKind,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            id: NodeId::random(),
            style: Style::default(),
            transform: AffineTransform::IDENTITY,
            flags: InteractionFlags::default(),
            kind,
        }
    }

    pub fn rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(NodeKind::Rect {
            x,
            y,
            width,
            height,
            rx: 0.0,
            ry: 0.0,
        })
    }

    pub fn circle(cx: f64, cy: f64, r: f64) -> Self {
        Self::new(NodeKind::Circle { cx, cy, r })
    }

    pub fn path(commands: Vec<PathCommand>) -> Self {
        Self::new(NodeKind::Path { commands })
    }

    pub fn text(
        x: f64,
        y: f64,
        content: impl Into<String>,
        font_size: f64,
        font_family: impl Into<String>,
    ) -> Self {
        Self::new(NodeKind::Text {
            x,
            y,
            content: content.into(),
            font_size,
            font_family: font_family.into(),
            align: TextAlign::Left,
        })
    }

    pub fn image(source_ref: impl Into<String>, natural_width: f64, natural_height: f64) -> Self {
        Self::new(NodeKind::Image {
            source_ref: source_ref.into(),
            natural_width,
            natural_height,
        })
    }

    pub fn group(children: Vec<Node>) -> Self {
        Self::new(NodeKind::Group { children })
    }

    pub fn with_id(mut self, id: impl Into<NodeId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn with_transform(mut self, transform: AffineTransform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_flags(mut self, flags: InteractionFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn variant(&self) -> NodeVariant {
        self.kind.variant()
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group { .. })
    }

    pub fn children(&self) -> &[Node] {
        match &self.kind {
            NodeKind::Group { children } => children,
            _ => &[],
        }
    }

    /// Bounds of this node and its subtree in the parent's space, i.e. with
    /// this node's own transform applied.
    pub fn bounds_in_parent(&self) -> Option<Bounds> {
        let local = match &self.kind {
            NodeKind::Group { children } => children
                .iter()
                .filter_map(Node::bounds_in_parent)
                .reduce(|acc, b| acc.union(&b))?,
            kind => kind.local_bounds()?,
        };
        Some(self.transform.apply_bounds(&local))
    }

    /// Visits this node and every descendant in document order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    /// Number of nodes in this subtree, including this one.
    pub fn subtree_len(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |_| count += 1);
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_rect_bounds() {
        let bounds = Node::rect(10.0, 20.0, 100.0, 50.0).bounds_in_parent().unwrap();
        assert_eq!(bounds.min, DVec2::new(10.0, 20.0));
        assert_eq!(bounds.max, DVec2::new(110.0, 70.0));
    }

    #[test]
    fn test_transformed_circle_bounds() {
        let circle = Node::circle(0.0, 0.0, 5.0)
            .with_transform(AffineTransform::translate(10.0, 10.0));
        let bounds = circle.bounds_in_parent().unwrap();
        assert_eq!(bounds.min, DVec2::new(5.0, 5.0));
        assert_eq!(bounds.max, DVec2::new(15.0, 15.0));
    }

    #[test]
    fn test_group_bounds_union_children() {
        let group = Node::group(vec![
            Node::rect(0.0, 0.0, 10.0, 10.0),
            Node::circle(30.0, 30.0, 5.0),
        ])
        .with_transform(AffineTransform::scale(2.0, 2.0));
        let bounds = group.bounds_in_parent().unwrap();
        assert_eq!(bounds.min, DVec2::new(0.0, 0.0));
        assert_eq!(bounds.max, DVec2::new(70.0, 70.0));
        assert!(Node::group(Vec::new()).bounds_in_parent().is_none());
    }

    #[test]
    fn test_text_bounds_follow_alignment() {
        let mut text = Node::text(100.0, 50.0, "abcd", 10.0, "sans-serif");
        let left = text.bounds_in_parent().unwrap();
        assert_eq!(left.min.x, 100.0);
        assert_eq!(left.width(), 24.0);

        if let NodeKind::Text { align, .. } = &mut text.kind {
            *align = TextAlign::Right;
        }
        let right = text.bounds_in_parent().unwrap();
        assert_eq!(right.max.x, 100.0);
    }

    #[test]
    fn test_variant_tags() {
        assert_eq!(NodeVariant::Rect.to_string(), "rect");
        assert_eq!(NodeVariant::from_str("group"), Ok(NodeVariant::Group));
        assert!(NodeVariant::from_str("star").is_err());
        assert_eq!(Node::image("a.png", 1.0, 1.0).variant(), NodeVariant::Image);
    }

    #[test]
    fn test_subtree_len() {
        let tree = Node::group(vec![
            Node::rect(0.0, 0.0, 1.0, 1.0),
            Node::group(vec![Node::circle(0.0, 0.0, 1.0)]),
        ]);
        assert_eq!(tree.subtree_len(), 4);
    }
}
