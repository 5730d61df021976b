//! Which nodes a command acts on.
//!
//! Commands name the nodes they act on through a [`Target`]: the current
//! selection, explicit ids, every top-level node, or nodes of one kind.

use canvas::Editor;
use node::{NodeId, NodeVariant};
use serde::{Deserialize, Serialize};

/// Specifies which nodes a command targets.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// The current selection (most common for user actions).
    #[default]
    Selection,

    /// One node by id.
    Node(NodeId),

    /// Several nodes by id.
    Nodes(Vec<NodeId>),

    /// Every top-level node.
    All,

    /// Every node of a kind, at any depth.
    Kind(NodeVariant),
}

impl From<NodeId> for Target {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

impl From<Vec<NodeId>> for Target {
    fn from(ids: Vec<NodeId>) -> Self {
        Self::Nodes(ids)
    }
}

impl Target {
    /// Ids this target refers to right now, in document order where the
    /// editor decides the order. Unknown ids are passed through so the
    /// caller can report them.
    pub fn resolve(&self, editor: &Editor) -> Vec<NodeId> {
        match self {
            Target::Selection => editor.selection().cloned().into_iter().collect(),
            Target::Node(id) => vec![id.clone()],
            Target::Nodes(ids) => ids.clone(),
            Target::All => editor.graph().root_ids(),
            Target::Kind(variant) => editor
                .graph()
                .to_flat_list()
                .into_iter()
                .filter(|node| node.variant() == *variant)
                .map(|node| node.id().clone())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas::ShapeTool;

    #[test]
    fn test_targets_serialize_snake_case() {
        assert_eq!(serde_json::to_value(Target::Selection).unwrap(), "selection");
        let target: Target = serde_json::from_str(r#"{ "kind": "circle" }"#).unwrap();
        assert_eq!(target, Target::Kind(NodeVariant::Circle));
        let target: Target = serde_json::from_str(r#"{ "node": "abc" }"#).unwrap();
        assert_eq!(target, Target::Node(NodeId::from("abc")));
    }

    #[test]
    fn test_resolve() {
        let mut editor = Editor::default();
        let rect = editor.add_shape(ShapeTool::Rect).unwrap();
        let circle = editor.add_shape(ShapeTool::Circle).unwrap();

        assert!(Target::Selection.resolve(&editor).is_empty());
        editor.select(&circle).unwrap();
        assert_eq!(Target::Selection.resolve(&editor), vec![circle.clone()]);
        assert_eq!(Target::All.resolve(&editor), vec![rect.clone(), circle]);
        assert_eq!(Target::Kind(NodeVariant::Rect).resolve(&editor), vec![rect]);
    }
}
