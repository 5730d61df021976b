//! Folio Interchange Format
//!
//! Persisted form of a Folio scene graph. A [`StructuredDocument`] is the
//! in-memory record tree; it is written either as KDL (the default on disk)
//! or as JSON via serde.
//!
//! # Document Format
//!
//! ```kdl
//! document version="1" {
//!   rect "2f1c0d9e-..." x=10.0 y=20.0 width=100.0 height=50.0 rx=0.0 ry=0.0 {
//!     fill r=0.2 g=0.4 b=0.6 a=1.0
//!     stroke r=0.0 g=0.0 b=0.0 a=1.0
//!     style stroke-width=1.5 opacity=1.0 fill-opacity=1.0
//!     flags selectable=#true evented=#true locked=#true
//!   }
//!   group "a7e4..." {
//!     transform 0.5 0.0 0.0 0.5 300.0 0.0
//!     path "b81f..." {
//!       d {
//!         M 0.0 0.0
//!         L 10.0 10.0
//!         Z
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! `transform`, `fill`, `stroke`, `style` and `flags` children are omitted
//! when they hold default values; `d` holds path segments. Any other child
//! node of a record is a nested record.

mod document;

pub use document::{
    deserialize, serialize, DocumentNode, PropValue, StructuredDocument, UnknownVariantPolicy,
};

use folio_core::{AffineTransform, Color};
use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use node::{InteractionFlags, NodeId, PathCommand, Style};
use thiserror::Error;

pub const FORMAT_VERSION: &str = "1";

#[derive(Debug, Error, PartialEq)]
pub enum CodecError {
    #[error("unknown node variant `{kind}` on node {id}")]
    UnknownNodeVariant { id: String, kind: String },
    #[error("node {id} is missing field `{field}`")]
    MissingField { id: String, field: String },
    #[error("invalid value for `{field}` on node {id}: {reason}")]
    InvalidValue {
        id: String,
        field: String,
        reason: String,
    },
    #[error("parse error: {0}")]
    Parse(String),
    #[error("duplicate node id {0}")]
    DuplicateId(NodeId),
}

impl StructuredDocument {
    /// Serialize the document to a KDL string.
    pub fn to_kdl(&self) -> String {
        let mut doc = KdlDocument::new();

        let mut doc_node = KdlNode::new("document");
        doc_node.push(KdlEntry::new_prop("version", self.version.clone()));

        let children = doc_node.children_mut().get_or_insert_with(KdlDocument::new);
        for record in &self.nodes {
            children.nodes_mut().push(record_to_kdl(record));
        }

        doc.nodes_mut().push(doc_node);
        doc.to_string()
    }

    /// Parse a document from a KDL string.
    pub fn from_kdl(input: &str) -> Result<Self, CodecError> {
        let doc: KdlDocument = input
            .parse()
            .map_err(|e| CodecError::Parse(format!("{}", e)))?;

        let doc_node = doc
            .get("document")
            .ok_or_else(|| CodecError::Parse("missing `document` node".into()))?;

        let version = doc_node
            .get("version")
            .and_then(|v| v.as_string())
            .map(|s| s.to_string())
            .unwrap_or_else(|| FORMAT_VERSION.to_string());

        let mut nodes = Vec::new();
        if let Some(children) = doc_node.children() {
            for node in children.nodes() {
                nodes.push(record_from_kdl(node)?);
            }
        }

        Ok(Self { version, nodes })
    }
}

fn record_to_kdl(record: &DocumentNode) -> KdlNode {
    let mut node = KdlNode::new(record.kind.as_str());

    // Full id as the first argument for round-trip fidelity.
    node.push(KdlEntry::new(record.id.clone()));

    for (name, value) in &record.props {
        let value = match value {
            PropValue::Bool(b) => KdlValue::from(*b),
            PropValue::Number(n) => KdlValue::from(*n),
            PropValue::Text(s) => KdlValue::from(s.clone()),
        };
        node.push(KdlEntry::new_prop(name.as_str(), value));
    }

    let mut has_children = false;
    let children = node.children_mut().get_or_insert_with(KdlDocument::new);

    if !record.transform.is_identity() {
        let mut transform_node = KdlNode::new("transform");
        for coefficient in record.transform.to_array() {
            transform_node.push(KdlEntry::new(coefficient));
        }
        children.nodes_mut().push(transform_node);
        has_children = true;
    }

    let defaults = Style::default();
    if record.style.fill != defaults.fill {
        children.nodes_mut().push(color_to_kdl("fill", record.style.fill));
        has_children = true;
    }
    if record.style.stroke != defaults.stroke {
        children.nodes_mut().push(color_to_kdl("stroke", record.style.stroke));
        has_children = true;
    }
    if record.style.stroke_width != defaults.stroke_width
        || record.style.opacity != defaults.opacity
        || record.style.fill_opacity != defaults.fill_opacity
    {
        let mut style_node = KdlNode::new("style");
        style_node.push(KdlEntry::new_prop("stroke-width", record.style.stroke_width));
        style_node.push(KdlEntry::new_prop("opacity", record.style.opacity));
        style_node.push(KdlEntry::new_prop("fill-opacity", record.style.fill_opacity));
        children.nodes_mut().push(style_node);
        has_children = true;
    }

    if record.flags != InteractionFlags::default() {
        let mut flags_node = KdlNode::new("flags");
        flags_node.push(KdlEntry::new_prop("selectable", record.flags.selectable));
        flags_node.push(KdlEntry::new_prop("evented", record.flags.evented));
        flags_node.push(KdlEntry::new_prop("locked", record.flags.locked));
        children.nodes_mut().push(flags_node);
        has_children = true;
    }

    if !record.commands.is_empty() {
        let mut path_node = KdlNode::new("d");
        let segments = path_node.children_mut().get_or_insert_with(KdlDocument::new);
        for command in &record.commands {
            let mut segment = KdlNode::new(command.letter());
            for arg in command.args() {
                segment.push(KdlEntry::new(arg));
            }
            segments.nodes_mut().push(segment);
        }
        children.nodes_mut().push(path_node);
        has_children = true;
    }

    for child in &record.children {
        children.nodes_mut().push(record_to_kdl(child));
        has_children = true;
    }

    if !has_children {
        *node.children_mut() = None;
    }

    node
}

fn color_to_kdl(name: &str, color: Color) -> KdlNode {
    let mut node = KdlNode::new(name);
    node.push(KdlEntry::new_prop("r", color.r));
    node.push(KdlEntry::new_prop("g", color.g));
    node.push(KdlEntry::new_prop("b", color.b));
    node.push(KdlEntry::new_prop("a", color.a));
    node
}

fn record_from_kdl(node: &KdlNode) -> Result<DocumentNode, CodecError> {
    let kind = node.name().value().to_string();
    let id = node
        .entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .ok_or_else(|| CodecError::MissingField {
            id: format!("<{kind}>"),
            field: "id".into(),
        })?
        .to_string();

    let mut record = DocumentNode::new(kind, id);

    for entry in node.entries() {
        let Some(name) = entry.name() else {
            continue;
        };
        let value = match entry.value() {
            KdlValue::Bool(b) => PropValue::Bool(*b),
            KdlValue::String(s) => PropValue::Text(s.clone()),
            other => match as_number(other) {
                Some(n) => PropValue::Number(n),
                None => {
                    return Err(CodecError::InvalidValue {
                        id: record.id.clone(),
                        field: name.value().to_string(),
                        reason: format!("unsupported value {other}"),
                    })
                }
            },
        };
        record.props.insert(name.value().to_string(), value);
    }

    let Some(children) = node.children() else {
        return Ok(record);
    };

    for child in children.nodes() {
        match child.name().value() {
            "fill" => record.style.fill = color_from_kdl(child),
            "stroke" => record.style.stroke = color_from_kdl(child),
            "style" => {
                let defaults = Style::default();
                record.style.stroke_width =
                    get_f64_prop(child, "stroke-width").unwrap_or(defaults.stroke_width);
                record.style.opacity = get_f64_prop(child, "opacity").unwrap_or(defaults.opacity);
                record.style.fill_opacity =
                    get_f64_prop(child, "fill-opacity").unwrap_or(defaults.fill_opacity);
            }
            "transform" => {
                let values: Vec<f64> = child
                    .entries()
                    .iter()
                    .filter(|e| e.name().is_none())
                    .filter_map(|e| as_number(e.value()))
                    .collect();
                let coefficients: [f64; 6] =
                    values
                        .try_into()
                        .map_err(|_| CodecError::InvalidValue {
                            id: record.id.clone(),
                            field: "transform".into(),
                            reason: "expected six coefficients".into(),
                        })?;
                record.transform = AffineTransform::from_array(coefficients);
            }
            // Only the three persisted flags are read; anything else on the
            // node is ignored.
            "flags" => {
                let defaults = InteractionFlags::default();
                record.flags = InteractionFlags {
                    selectable: get_bool_prop(child, "selectable").unwrap_or(defaults.selectable),
                    evented: get_bool_prop(child, "evented").unwrap_or(defaults.evented),
                    locked: get_bool_prop(child, "locked").unwrap_or(defaults.locked),
                };
            }
            "d" => {
                for segment in child.children().map(|d| d.nodes()).unwrap_or_default() {
                    let letter = segment.name().value();
                    let args: Vec<f64> = segment
                        .entries()
                        .iter()
                        .filter_map(|e| as_number(e.value()))
                        .collect();
                    let command = PathCommand::from_letter_args(letter, &args).ok_or_else(|| {
                        CodecError::InvalidValue {
                            id: record.id.clone(),
                            field: "path".into(),
                            reason: format!("bad segment `{letter}` with {} argument(s)", args.len()),
                        }
                    })?;
                    record.commands.push(command);
                }
            }
            _ => record.children.push(record_from_kdl(child)?),
        }
    }

    Ok(record)
}

fn color_from_kdl(node: &KdlNode) -> Color {
    Color::rgba(
        get_f64_prop(node, "r").unwrap_or(0.0),
        get_f64_prop(node, "g").unwrap_or(0.0),
        get_f64_prop(node, "b").unwrap_or(0.0),
        get_f64_prop(node, "a").unwrap_or(1.0),
    )
}

/// Integers are accepted wherever a number is expected, so hand-written
/// documents may use `x=10`.
fn as_number(value: &KdlValue) -> Option<f64> {
    value
        .as_float()
        .or_else(|| value.as_integer().map(|i| i as f64))
}

fn get_f64_prop(node: &KdlNode, name: &str) -> Option<f64> {
    node.get(name).and_then(as_number)
}

fn get_bool_prop(node: &KdlNode, name: &str) -> Option<bool> {
    node.get(name).and_then(|v| v.as_bool())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::tests::sample_graph;

    #[test]
    fn test_kdl_roundtrip() {
        let graph = sample_graph();
        let kdl = serialize(&graph).to_kdl();

        println!("Generated KDL:\n{}", kdl);

        let parsed = StructuredDocument::from_kdl(&kdl).expect("Failed to parse");
        assert_eq!(parsed, serialize(&graph));
        let restored = deserialize(&parsed, UnknownVariantPolicy::Abort).unwrap();
        assert_eq!(restored, graph);
    }

    #[test]
    fn test_hand_written_document() {
        let input = r#"
document version="1" {
    rect "r1" x=10 y=20 width=30 height=40 {
        fill r=1 g=0 b=0 a=1
        flags selectable=#false
        transform 1 0 0 1 5 5
    }
    star "s1" points=5
}
"#;
        let document = StructuredDocument::from_kdl(input).unwrap();
        assert_eq!(document.nodes.len(), 2);
        assert_eq!(document.nodes[1].kind, "star");

        let graph = deserialize(&document, UnknownVariantPolicy::Skip).unwrap();
        assert_eq!(graph.len(), 1);
        let rect = graph.find_node(&NodeId::from("r1")).unwrap();
        assert!(!rect.flags().selectable);
        assert!(rect.flags().evented);
        assert_eq!(rect.style().fill, Color::rgba(1.0, 0.0, 0.0, 1.0));
        assert_eq!(rect.transform().translation(), glam::DVec2::new(5.0, 5.0));
    }

    #[test]
    fn test_malformed_kdl() {
        assert!(matches!(
            StructuredDocument::from_kdl("document {"),
            Err(CodecError::Parse(_))
        ));
        assert!(matches!(
            StructuredDocument::from_kdl("page"),
            Err(CodecError::Parse(_))
        ));
        let bad_path = r#"document { path "p" { d { M 1 } } }"#;
        assert!(matches!(
            StructuredDocument::from_kdl(bad_path),
            Err(CodecError::InvalidValue { .. })
        ));
    }
}
