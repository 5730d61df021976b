//! # Scene Graph
//!
//! The scene graph is the in-memory document: an ordered tree of nodes rooted
//! at a single implicit group. Nodes live in a slot-map arena with
//! parent/children links, and a side index maps each [`NodeId`] to its arena
//! slot so lookups by id are O(1).
//!
//! ## Key Concepts
//!
//! - **Arena storage**: group children are stored as arena keys; the owned
//!   [`Node`] tree is only materialized on the way in (`add_node`) and out
//!   (`to_tree`, `remove_node`).
//! - **World transforms**: a node's effective transform is the composition of
//!   every ancestor's transform with its own.
//! - **Document order**: `to_flat_list` is a pre-order walk, groups before
//!   their children, back to front.
//!
//! Every mutation patches the index before returning; there is no window in
//! which the index and the tree disagree.

mod node_ref;

pub use node_ref::NodeRef;

use folio_core::{AffineTransform, Bounds};
use glam::DVec2;
use node::{InteractionFlags, Node, NodeId, NodeKind, Style};
use slotmap::SlotMap;
use std::collections::{HashMap, HashSet};
use std::fmt;

slotmap::new_key_type! {
    /// Arena slot of a node within one scene graph.
    pub struct SceneNodeId;
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SceneError {
    /// Inserting would give two nodes the same id. Indicates corrupted input
    /// or a caller bug, never ordinary user action.
    #[error("duplicate node id: {0}")]
    DuplicateId(NodeId),
    #[error("unknown parent node: {0}")]
    UnknownParent(NodeId),
    #[error("node {0} is not a group and cannot have children")]
    NotAGroup(NodeId),
}

/// Arena entry.
///
/// For groups `kind` is `NodeKind::Group` with an empty `children` list; the
/// arena's `children` keys are authoritative.
#[derive(Debug, Clone)]
pub(crate) struct SceneNode {
    pub(crate) parent: Option<SceneNodeId>,
    pub(crate) children: Vec<SceneNodeId>,
    pub(crate) id: NodeId,
    pub(crate) style: Style,
    pub(crate) transform: AffineTransform,
    pub(crate) flags: InteractionFlags,
    pub(crate) kind: NodeKind,
}

impl SceneNode {
    fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group { .. })
    }
}

/// The document tree for one editing session.
#[derive(Clone)]
pub struct SceneGraph {
    root: SceneNodeId,
    nodes: SlotMap<SceneNodeId, SceneNode>,
    index: HashMap<NodeId, SceneNodeId>,
}

impl SceneGraph {
    /// Creates a new, empty scene graph with a root group.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(SceneNode {
            parent: None,
            children: Vec::new(),
            id: NodeId::from("root"),
            style: Style::default(),
            transform: AffineTransform::IDENTITY,
            flags: InteractionFlags::default(),
            kind: NodeKind::Group {
                children: Vec::new(),
            },
        });

        Self {
            root,
            nodes,
            index: HashMap::new(),
        }
    }

    /// Builds a graph whose root holds `nodes` in order.
    pub fn from_nodes(nodes: Vec<Node>) -> Result<Self, SceneError> {
        let mut graph = Self::new();
        for node in nodes {
            graph.add_node(None, node)?;
        }
        Ok(graph)
    }

    /// Number of nodes in the document, not counting the root.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    /// Returns a fresh id that is not used in this document.
    pub fn allocate_id(&self) -> NodeId {
        loop {
            let id = NodeId::random();
            if !self.index.contains_key(&id) {
                return id;
            }
        }
    }

    /// Appends `node` (and its subtree) as the last child of `parent`, or of
    /// the root when `parent` is `None`.
    ///
    /// Nothing is inserted if any id in the subtree is already in use or the
    /// parent is not a group.
    pub fn add_node(&mut self, parent: Option<&NodeId>, node: Node) -> Result<NodeId, SceneError> {
        let parent_key = match parent {
            None => self.root,
            Some(parent_id) => {
                let key = *self
                    .index
                    .get(parent_id)
                    .ok_or_else(|| SceneError::UnknownParent(parent_id.clone()))?;
                if !self.nodes[key].is_group() {
                    return Err(SceneError::NotAGroup(parent_id.clone()));
                }
                key
            }
        };

        let mut seen = HashSet::new();
        let mut duplicate = None;
        node.walk(&mut |n| {
            if duplicate.is_none() && (self.index.contains_key(&n.id) || !seen.insert(&n.id)) {
                duplicate = Some(n.id.clone());
            }
        });
        if let Some(id) = duplicate {
            return Err(SceneError::DuplicateId(id));
        }

        let id = node.id.clone();
        let key = self.insert_subtree(parent_key, node);
        self.nodes[parent_key].children.push(key);
        log::debug!("added node {} ({} total)", id.short(), self.len());
        Ok(id)
    }

    fn insert_subtree(&mut self, parent: SceneNodeId, node: Node) -> SceneNodeId {
        let Node {
            id,
            style,
            transform,
            flags,
            kind,
        } = node;

        let (kind, children) = match kind {
            NodeKind::Group { children } => (
                NodeKind::Group {
                    children: Vec::new(),
                },
                children,
            ),
            leaf => (leaf, Vec::new()),
        };

        let key = self.nodes.insert(SceneNode {
            parent: Some(parent),
            children: Vec::new(),
            id: id.clone(),
            style,
            transform,
            flags,
            kind,
        });
        self.index.insert(id, key);

        let child_keys: Vec<_> = children
            .into_iter()
            .map(|child| self.insert_subtree(key, child))
            .collect();
        self.nodes[key].children = child_keys;
        key
    }

    /// Removes a node and its whole subtree, returning it as an owned tree.
    ///
    /// Returns `None` when the id is unknown. Callers that track a selection
    /// can walk the returned tree to see whether it was inside.
    pub fn remove_node(&mut self, id: &NodeId) -> Option<Node> {
        let key = *self.index.get(id)?;
        let removed = self.build_node(key);

        if let Some(parent) = self.nodes[key].parent {
            self.nodes[parent].children.retain(|&child| child != key);
        }

        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            if let Some(entry) = self.nodes.remove(current) {
                self.index.remove(&entry.id);
                stack.extend(entry.children);
            }
        }

        log::debug!(
            "removed node {} with {} descendants",
            id.short(),
            removed.subtree_len() - 1
        );
        Some(removed)
    }

    /// Removes every node, keeping the root.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// True if `target` is `ancestor` or lies anywhere below it.
    pub fn contains_in_subtree(&self, ancestor: &NodeId, target: &NodeId) -> bool {
        let (Some(&ancestor_key), Some(&target_key)) =
            (self.index.get(ancestor), self.index.get(target))
        else {
            return false;
        };

        let mut current = Some(target_key);
        while let Some(key) = current {
            if key == ancestor_key {
                return true;
            }
            current = self.nodes.get(key).and_then(|n| n.parent);
        }
        false
    }

    pub fn find_node(&self, id: &NodeId) -> Option<NodeRef<'_>> {
        self.index.get(id).map(|&key| NodeRef::new(self, key))
    }

    /// World-space bounding box. Groups union their children's bounds;
    /// returns `None` for unknown ids and for groups with nothing drawable.
    pub fn bounding_box(&self, id: &NodeId) -> Option<Bounds> {
        let key = *self.index.get(id)?;
        self.world_bounds(key)
    }

    /// Bounding box of everything in the document.
    pub fn content_bounds(&self) -> Option<Bounds> {
        self.union_children_bounds(self.root)
    }

    /// Every node in pre-order document order (back to front), groups before
    /// their children. The root is not included.
    pub fn to_flat_list(&self) -> Vec<NodeRef<'_>> {
        let mut out = Vec::with_capacity(self.len());
        let mut stack: Vec<SceneNodeId> = self.nodes[self.root].children.iter().rev().copied().collect();
        while let Some(key) = stack.pop() {
            out.push(NodeRef::new(self, key));
            stack.extend(self.nodes[key].children.iter().rev().copied());
        }
        out
    }

    /// Top-level nodes as owned trees.
    pub fn to_tree(&self) -> Vec<Node> {
        self.nodes[self.root]
            .children
            .iter()
            .map(|&key| self.build_node(key))
            .collect()
    }

    /// Top-level node ids, back to front.
    pub fn root_ids(&self) -> Vec<NodeId> {
        self.nodes[self.root]
            .children
            .iter()
            .map(|&key| self.nodes[key].id.clone())
            .collect()
    }

    /// Adds `delta` to the node's translation terms.
    pub fn translate_node(&mut self, id: &NodeId, delta: DVec2) -> bool {
        match self.entry_mut(id) {
            Some(entry) => {
                entry.transform.pre_translate(delta);
                true
            }
            None => false,
        }
    }

    pub fn set_transform(&mut self, id: &NodeId, transform: AffineTransform) -> bool {
        match self.entry_mut(id) {
            Some(entry) => {
                entry.transform = transform;
                true
            }
            None => false,
        }
    }

    pub fn set_style(&mut self, id: &NodeId, style: Style) -> bool {
        match self.entry_mut(id) {
            Some(entry) => {
                entry.style = style;
                true
            }
            None => false,
        }
    }

    pub fn set_flags(&mut self, id: &NodeId, flags: InteractionFlags) -> bool {
        match self.entry_mut(id) {
            Some(entry) => {
                entry.flags = flags;
                true
            }
            None => false,
        }
    }

    fn entry_mut(&mut self, id: &NodeId) -> Option<&mut SceneNode> {
        let key = *self.index.get(id)?;
        self.nodes.get_mut(key)
    }

    pub(crate) fn entry(&self, key: SceneNodeId) -> &SceneNode {
        &self.nodes[key]
    }

    pub(crate) fn is_root(&self, key: SceneNodeId) -> bool {
        key == self.root
    }

    pub(crate) fn world_transform(&self, key: SceneNodeId) -> AffineTransform {
        let mut chain = Vec::new();
        let mut current = Some(key);
        while let Some(k) = current {
            let entry = &self.nodes[k];
            chain.push(entry.transform);
            current = entry.parent;
        }
        chain
            .iter()
            .rev()
            .fold(AffineTransform::IDENTITY, |acc, t| acc.compose(t))
    }

    pub(crate) fn world_bounds(&self, key: SceneNodeId) -> Option<Bounds> {
        let entry = &self.nodes[key];
        if entry.is_group() {
            self.union_children_bounds(key)
        } else {
            let local = entry.kind.local_bounds()?;
            Some(self.world_transform(key).apply_bounds(&local))
        }
    }

    fn union_children_bounds(&self, key: SceneNodeId) -> Option<Bounds> {
        self.nodes[key]
            .children
            .iter()
            .filter_map(|&child| self.world_bounds(child))
            .reduce(|acc, b| acc.union(&b))
    }

    pub(crate) fn build_node(&self, key: SceneNodeId) -> Node {
        let entry = &self.nodes[key];
        let kind = if entry.is_group() {
            NodeKind::Group {
                children: entry
                    .children
                    .iter()
                    .map(|&child| self.build_node(child))
                    .collect(),
            }
        } else {
            entry.kind.clone()
        };

        Node {
            id: entry.id.clone(),
            style: entry.style,
            transform: entry.transform,
            flags: entry.flags,
            kind,
        }
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Structural equality: same trees, same order, same fields.
impl PartialEq for SceneGraph {
    fn eq(&self, other: &Self) -> bool {
        self.to_tree() == other.to_tree()
    }
}

impl fmt::Debug for SceneGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneGraph")
            .field("nodes", &self.to_tree())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every arena entry except the root is indexed exactly once, under its
    /// own id, and linked from its parent.
    fn assert_index_consistent(graph: &SceneGraph) {
        assert_eq!(graph.index.len(), graph.nodes.len() - 1);
        for (id, &key) in &graph.index {
            let entry = &graph.nodes[key];
            assert_eq!(&entry.id, id);
            let parent = entry.parent.expect("non-root node without parent");
            assert_eq!(
                graph.nodes[parent].children.iter().filter(|&&k| k == key).count(),
                1
            );
        }
    }

    fn sample_graph() -> SceneGraph {
        SceneGraph::from_nodes(vec![
            Node::rect(0.0, 0.0, 10.0, 10.0).with_id("a"),
            Node::group(vec![
                Node::circle(50.0, 50.0, 5.0).with_id("c"),
                Node::rect(60.0, 60.0, 10.0, 10.0).with_id("d"),
            ])
            .with_id("g"),
        ])
        .unwrap()
    }

    #[test]
    fn test_new_graph_is_empty() {
        let graph = SceneGraph::new();
        assert!(graph.is_empty());
        assert!(graph.to_flat_list().is_empty());
        assert!(graph.content_bounds().is_none());
    }

    #[test]
    fn test_add_and_find() {
        let graph = sample_graph();
        assert_eq!(graph.len(), 4);
        assert_index_consistent(&graph);

        let c = graph.find_node(&NodeId::from("c")).unwrap();
        assert_eq!(c.parent_id(), Some(NodeId::from("g")));
        assert!(graph.find_node(&NodeId::from("missing")).is_none());
    }

    #[test]
    fn test_flat_list_is_document_order() {
        let graph = sample_graph();
        let ids: Vec<_> = graph
            .to_flat_list()
            .iter()
            .map(|n| n.id().as_str().to_string())
            .collect();
        assert_eq!(ids, vec!["a", "g", "c", "d"]);
    }

    #[test]
    fn test_add_to_group() {
        let mut graph = sample_graph();
        graph
            .add_node(Some(&NodeId::from("g")), Node::rect(0.0, 0.0, 1.0, 1.0).with_id("e"))
            .unwrap();
        let g = graph.find_node(&NodeId::from("g")).unwrap();
        let children: Vec<_> = g.children().map(|c| c.id().clone()).collect();
        assert_eq!(children.last(), Some(&NodeId::from("e")));
        assert_index_consistent(&graph);
    }

    #[test]
    fn test_add_rejects_bad_parents() {
        let mut graph = sample_graph();
        assert_eq!(
            graph.add_node(Some(&NodeId::from("a")), Node::circle(0.0, 0.0, 1.0)),
            Err(SceneError::NotAGroup(NodeId::from("a")))
        );
        assert_eq!(
            graph.add_node(Some(&NodeId::from("zz")), Node::circle(0.0, 0.0, 1.0)),
            Err(SceneError::UnknownParent(NodeId::from("zz")))
        );
        assert_eq!(graph.len(), 4);
    }

    #[test]
    fn test_duplicate_ids_are_rejected_atomically() {
        let mut graph = sample_graph();
        let subtree = Node::group(vec![
            Node::rect(0.0, 0.0, 1.0, 1.0).with_id("fresh"),
            Node::rect(0.0, 0.0, 1.0, 1.0).with_id("c"),
        ]);
        assert_eq!(
            graph.add_node(None, subtree),
            Err(SceneError::DuplicateId(NodeId::from("c")))
        );
        assert!(!graph.contains(&NodeId::from("fresh")));
        assert_index_consistent(&graph);

        let self_dup = Node::group(vec![
            Node::rect(0.0, 0.0, 1.0, 1.0).with_id("x"),
            Node::rect(0.0, 0.0, 1.0, 1.0).with_id("x"),
        ]);
        assert!(matches!(
            graph.add_node(None, self_dup),
            Err(SceneError::DuplicateId(_))
        ));
    }

    #[test]
    fn test_remove_subtree() {
        let mut graph = sample_graph();
        let removed = graph.remove_node(&NodeId::from("g")).unwrap();
        assert_eq!(removed.children().len(), 2);
        assert_eq!(graph.len(), 1);
        assert!(!graph.contains(&NodeId::from("c")));
        assert!(!graph.contains(&NodeId::from("d")));
        assert_index_consistent(&graph);
        assert!(graph.remove_node(&NodeId::from("g")).is_none());
    }

    #[test]
    fn test_contains_in_subtree() {
        let graph = sample_graph();
        let g = NodeId::from("g");
        assert!(graph.contains_in_subtree(&g, &NodeId::from("d")));
        assert!(graph.contains_in_subtree(&g, &g));
        assert!(!graph.contains_in_subtree(&g, &NodeId::from("a")));
    }

    #[test]
    fn test_group_bounding_box_uses_transforms() {
        let mut graph = sample_graph();
        let g = NodeId::from("g");
        let bounds = graph.bounding_box(&g).unwrap();
        assert_eq!(bounds.min, DVec2::new(45.0, 45.0));
        assert_eq!(bounds.max, DVec2::new(70.0, 70.0));

        graph.set_transform(&g, AffineTransform::translate(100.0, 0.0));
        let moved = graph.bounding_box(&NodeId::from("c")).unwrap();
        assert_eq!(moved.min, DVec2::new(145.0, 45.0));
    }

    #[test]
    fn test_translate_node() {
        let mut graph = sample_graph();
        let a = NodeId::from("a");
        assert!(graph.translate_node(&a, DVec2::new(3.0, 4.0)));
        assert_eq!(
            graph.find_node(&a).unwrap().transform().translation(),
            DVec2::new(3.0, 4.0)
        );
        assert!(!graph.translate_node(&NodeId::from("nope"), DVec2::ONE));
    }

    #[test]
    fn test_tree_roundtrip_and_equality() {
        let graph = sample_graph();
        let rebuilt = SceneGraph::from_nodes(graph.to_tree()).unwrap();
        assert_eq!(graph, rebuilt);

        let mut changed = rebuilt.clone();
        changed.translate_node(&NodeId::from("d"), DVec2::X);
        assert_ne!(graph, changed);
    }

    #[test]
    fn test_clear_and_allocate() {
        let mut graph = sample_graph();
        let id = graph.allocate_id();
        assert!(!graph.contains(&id));
        graph.clear();
        assert!(graph.is_empty());
        graph.add_node(None, Node::rect(0.0, 0.0, 1.0, 1.0).with_id("a")).unwrap();
        assert_index_consistent(&graph);
    }
}
