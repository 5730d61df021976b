//! Folio queries - read-only access to editor state.
//!
//! Queries let scripts inspect a document before issuing commands.

use crate::Target;
use folio_core::Bounds;
use glam::DVec2;
use node::{NodeId, NodeVariant};
use scene_graph::NodeRef;
use serde::{Deserialize, Serialize};

/// A query for editor state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Query {
    GetSelection,

    /// Nodes matching a target.
    GetNodes {
        #[serde(default = "all_nodes")]
        target: Target,
    },

    GetNode { id: NodeId },

    /// World bounds of one node, or of all content when `id` is absent.
    GetBounds {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<NodeId>,
    },

    GetNodeCount,
}

fn all_nodes() -> Target {
    Target::All
}

/// Response to a query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryResult {
    Selection { id: Option<NodeId> },
    Nodes { nodes: Vec<NodeInfo> },
    Node { node: Option<NodeInfo> },
    Bounds { min: Option<DVec2>, max: Option<DVec2> },
    Count { count: usize },
    Error { message: String },
}

impl QueryResult {
    pub(crate) fn bounds(bounds: Option<Bounds>) -> Self {
        Self::Bounds {
            min: bounds.map(|b| b.min),
            max: bounds.map(|b| b.max),
        }
    }
}

/// Serializable summary of a node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub id: NodeId,
    pub kind: NodeVariant,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,
    /// World-space bounds as `[min, max]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<[DVec2; 2]>,
    /// Colors as `#rrggbbaa`.
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
    pub locked: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeId>,
}

impl From<NodeRef<'_>> for NodeInfo {
    fn from(node: NodeRef<'_>) -> Self {
        let style = node.style();
        Self {
            id: node.id().clone(),
            kind: node.variant(),
            parent: node.parent_id(),
            bounds: node.bounds().map(|b| [b.min, b.max]),
            fill: style.fill.to_hex(),
            stroke: style.stroke.to_hex(),
            stroke_width: style.stroke_width,
            locked: node.flags().locked,
            children: node.children().map(|child| child.id().clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_nodes_defaults_to_all() {
        let query: Query = serde_json::from_str(r#"{ "type": "get_nodes" }"#).unwrap();
        assert_eq!(query, Query::GetNodes { target: Target::All });
    }

    #[test]
    fn get_bounds_without_id() {
        let query: Query = serde_json::from_str(r#"{ "type": "get_bounds" }"#).unwrap();
        assert_eq!(query, Query::GetBounds { id: None });
        let json = serde_json::to_value(QueryResult::bounds(None)).unwrap();
        assert_eq!(json["type"], "bounds");
        assert!(json["min"].is_null());
    }
}
