use crate::{CodecError, FORMAT_VERSION};
use folio_core::AffineTransform;
use node::{InteractionFlags, Node, NodeKind, NodeVariant, PathCommand, Style, TextAlign};
use scene_graph::{SceneError, SceneGraph};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use strum_macros::{Display, EnumString};

/// What to do with a record whose `kind` this build does not know.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UnknownVariantPolicy {
    /// Drop the record (and its subtree) and log a warning.
    #[default]
    Skip,
    /// Fail the whole load.
    Abort,
}

/// Scalar geometry value of a record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl PropValue {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::Text(_) => "string",
        }
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Persisted form of one node.
///
/// `kind` is kept as a plain string so that documents written by a newer
/// build still load; see [`UnknownVariantPolicy`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocumentNode {
    pub kind: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub props: BTreeMap<String, PropValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<PathCommand>,
    #[serde(default)]
    pub style: Style,
    #[serde(default)]
    pub transform: AffineTransform,
    #[serde(default)]
    pub flags: InteractionFlags,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DocumentNode>,
}

impl DocumentNode {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
            props: BTreeMap::new(),
            commands: Vec::new(),
            style: Style::default(),
            transform: AffineTransform::IDENTITY,
            flags: InteractionFlags::default(),
            children: Vec::new(),
        }
    }

    pub fn with_prop(mut self, name: &str, value: impl Into<PropValue>) -> Self {
        self.props.insert(name.to_string(), value.into());
        self
    }

    fn number(&self, name: &str) -> Result<f64, CodecError> {
        self.optional_number(name)?
            .ok_or_else(|| self.missing(name))
    }

    fn optional_number(&self, name: &str) -> Result<Option<f64>, CodecError> {
        match self.props.get(name) {
            None => Ok(None),
            Some(PropValue::Number(v)) => Ok(Some(*v)),
            Some(other) => Err(self.invalid(name, format!("expected number, got {}", other.type_name()))),
        }
    }

    fn text(&self, name: &str) -> Result<String, CodecError> {
        self.optional_text(name)?.ok_or_else(|| self.missing(name))
    }

    fn optional_text(&self, name: &str) -> Result<Option<String>, CodecError> {
        match self.props.get(name) {
            None => Ok(None),
            Some(PropValue::Text(v)) => Ok(Some(v.clone())),
            Some(other) => Err(self.invalid(name, format!("expected string, got {}", other.type_name()))),
        }
    }

    fn missing(&self, field: &str) -> CodecError {
        CodecError::MissingField {
            id: self.id.clone(),
            field: field.to_string(),
        }
    }

    fn invalid(&self, field: &str, reason: String) -> CodecError {
        CodecError::InvalidValue {
            id: self.id.clone(),
            field: field.to_string(),
            reason,
        }
    }
}

/// A whole persisted document: a format version and the top-level records
/// in paint order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructuredDocument {
    pub version: String,
    pub nodes: Vec<DocumentNode>,
}

impl Default for StructuredDocument {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl StructuredDocument {
    pub fn new(nodes: Vec<DocumentNode>) -> Self {
        Self {
            version: FORMAT_VERSION.to_string(),
            nodes,
        }
    }

    pub fn to_json(&self) -> Result<String, CodecError> {
        serde_json::to_string_pretty(self).map_err(|e| CodecError::Parse(e.to_string()))
    }

    pub fn from_json(input: &str) -> Result<Self, CodecError> {
        serde_json::from_str(input).map_err(|e| CodecError::Parse(e.to_string()))
    }
}

/// Captures the full tree, including the persisted interaction flags.
pub fn serialize(graph: &SceneGraph) -> StructuredDocument {
    let nodes: Vec<_> = graph.to_tree().iter().map(encode_node).collect();
    log::debug!("serialized {} top-level node(s)", nodes.len());
    StructuredDocument::new(nodes)
}

/// Rebuilds a graph from a document.
///
/// Records of an unknown kind are handled per `policy`; every other
/// problem (missing or mistyped fields, duplicate ids) fails the load
/// without producing a partial graph.
pub fn deserialize(
    document: &StructuredDocument,
    policy: UnknownVariantPolicy,
) -> Result<SceneGraph, CodecError> {
    if document.version != FORMAT_VERSION {
        log::warn!(
            "document format version {} differs from {}",
            document.version,
            FORMAT_VERSION
        );
    }

    let mut nodes = Vec::with_capacity(document.nodes.len());
    for record in &document.nodes {
        if let Some(node) = decode_node(record, policy)? {
            nodes.push(node);
        }
    }

    SceneGraph::from_nodes(nodes).map_err(|err| match err {
        SceneError::DuplicateId(id) => CodecError::DuplicateId(id),
        other => CodecError::Parse(other.to_string()),
    })
}

fn encode_node(node: &Node) -> DocumentNode {
    let mut record = DocumentNode::new(node.variant().to_string(), node.id.as_str());
    record.style = node.style;
    record.transform = node.transform;
    record.flags = node.flags;

    match &node.kind {
        NodeKind::Path { commands } => record.commands = commands.clone(),
        NodeKind::Rect {
            x,
            y,
            width,
            height,
            rx,
            ry,
        } => {
            record = record
                .with_prop("x", *x)
                .with_prop("y", *y)
                .with_prop("width", *width)
                .with_prop("height", *height)
                .with_prop("rx", *rx)
                .with_prop("ry", *ry);
        }
        NodeKind::Circle { cx, cy, r } => {
            record = record
                .with_prop("cx", *cx)
                .with_prop("cy", *cy)
                .with_prop("r", *r);
        }
        NodeKind::Text {
            x,
            y,
            content,
            font_size,
            font_family,
            align,
        } => {
            record = record
                .with_prop("x", *x)
                .with_prop("y", *y)
                .with_prop("content", content.as_str())
                .with_prop("font_size", *font_size)
                .with_prop("font_family", font_family.as_str())
                .with_prop("align", align.to_string().as_str());
        }
        NodeKind::Image {
            source_ref,
            natural_width,
            natural_height,
        } => {
            record = record
                .with_prop("source_ref", source_ref.as_str())
                .with_prop("natural_width", *natural_width)
                .with_prop("natural_height", *natural_height);
        }
        NodeKind::Group { children } => {
            record.children = children.iter().map(encode_node).collect();
        }
    }

    record
}

fn decode_node(
    record: &DocumentNode,
    policy: UnknownVariantPolicy,
) -> Result<Option<Node>, CodecError> {
    let Ok(variant) = NodeVariant::from_str(&record.kind) else {
        return match policy {
            UnknownVariantPolicy::Skip => {
                log::warn!(
                    "skipping node {} of unknown kind `{}`",
                    record.id,
                    record.kind
                );
                Ok(None)
            }
            UnknownVariantPolicy::Abort => Err(CodecError::UnknownNodeVariant {
                id: record.id.clone(),
                kind: record.kind.clone(),
            }),
        };
    };

    if record.id.is_empty() {
        return Err(record.missing("id"));
    }

    let kind = match variant {
        NodeVariant::Path => NodeKind::Path {
            commands: record.commands.clone(),
        },
        NodeVariant::Rect => NodeKind::Rect {
            x: record.number("x")?,
            y: record.number("y")?,
            width: record.number("width")?,
            height: record.number("height")?,
            rx: record.optional_number("rx")?.unwrap_or(0.0),
            ry: record.optional_number("ry")?.unwrap_or(0.0),
        },
        NodeVariant::Circle => NodeKind::Circle {
            cx: record.number("cx")?,
            cy: record.number("cy")?,
            r: record.number("r")?,
        },
        NodeVariant::Text => {
            let align = match record.optional_text("align")? {
                Some(align) => TextAlign::from_str(&align)
                    .map_err(|_| record.invalid("align", format!("unknown alignment `{align}`")))?,
                None => TextAlign::default(),
            };
            NodeKind::Text {
                x: record.number("x")?,
                y: record.number("y")?,
                content: record.text("content")?,
                font_size: record.number("font_size")?,
                font_family: record.text("font_family")?,
                align,
            }
        }
        NodeVariant::Image => NodeKind::Image {
            source_ref: record.text("source_ref")?,
            natural_width: record.number("natural_width")?,
            natural_height: record.number("natural_height")?,
        },
        NodeVariant::Group => {
            let mut children = Vec::with_capacity(record.children.len());
            for child in &record.children {
                if let Some(node) = decode_node(child, policy)? {
                    children.push(node);
                }
            }
            NodeKind::Group { children }
        }
    };

    if variant != NodeVariant::Group && !record.children.is_empty() {
        return Err(record.invalid(
            "children",
            format!("a {variant} node cannot have children"),
        ));
    }

    Ok(Some(
        Node::new(kind)
            .with_id(record.id.as_str())
            .with_style(record.style)
            .with_transform(record.transform)
            .with_flags(record.flags),
    ))
}
