use crate::{SceneGraph, SceneNodeId};
use folio_core::{AffineTransform, Bounds};
use node::{InteractionFlags, Node, NodeId, NodeKind, NodeVariant, Style};

/// Borrowed view of one node in a [`SceneGraph`].
///
/// This is what the rendering collaborator and the hit-tester consume: it
/// exposes the node's own fields plus values derived from its position in
/// the tree (world transform, world bounds).
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    graph: &'a SceneGraph,
    key: SceneNodeId,
}

impl<'a> NodeRef<'a> {
    pub(crate) fn new(graph: &'a SceneGraph, key: SceneNodeId) -> Self {
        Self { graph, key }
    }

    pub fn id(&self) -> &'a NodeId {
        &self.graph.entry(self.key).id
    }

    pub fn style(&self) -> &'a Style {
        &self.graph.entry(self.key).style
    }

    /// Transform relative to the parent.
    pub fn transform(&self) -> AffineTransform {
        self.graph.entry(self.key).transform
    }

    pub fn flags(&self) -> InteractionFlags {
        self.graph.entry(self.key).flags
    }

    /// Geometry. For groups this is `NodeKind::Group` with an empty child
    /// list; use [`children`](Self::children) to walk them.
    pub fn kind(&self) -> &'a NodeKind {
        &self.graph.entry(self.key).kind
    }

    pub fn variant(&self) -> NodeVariant {
        self.kind().variant()
    }

    /// Composition of every ancestor's transform with this node's own.
    pub fn world_transform(&self) -> AffineTransform {
        self.graph.world_transform(self.key)
    }

    /// World-space bounding box.
    pub fn bounds(&self) -> Option<Bounds> {
        self.graph.world_bounds(self.key)
    }

    /// Parent id, or `None` for top-level nodes.
    pub fn parent_id(&self) -> Option<NodeId> {
        let parent = self.graph.entry(self.key).parent?;
        if self.graph.is_root(parent) {
            None
        } else {
            Some(self.graph.entry(parent).id.clone())
        }
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let graph = self.graph;
        graph
            .entry(self.key)
            .children
            .iter()
            .map(move |&key| NodeRef::new(graph, key))
    }

    /// Nesting depth; top-level nodes are at depth 0.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.graph.entry(self.key).parent;
        while let Some(key) = current {
            if self.graph.is_root(key) {
                break;
            }
            depth += 1;
            current = self.graph.entry(key).parent;
        }
        depth
    }

    /// Owned copy of this node and its subtree.
    pub fn to_node(&self) -> Node {
        self.graph.build_node(self.key)
    }
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", self.id())
            .field("variant", &self.variant())
            .finish()
    }
}
