use glam::DVec2;
use node::{Node, NodeId};
use scene_graph::SceneGraph;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InteractionError {
    #[error("nothing is selected")]
    NothingSelected,
}

/// Pointer interaction state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum InteractionState {
    #[default]
    Idle,
    /// Moving the selected node; `last_point` is the previous pointer
    /// position in document space.
    Dragging { last_point: DVec2 },
}

/// Per-node UI state that is never persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EphemeralState {
    pub hovered: bool,
}

/// Turns pointer events into selection changes and node translations.
///
/// The controller owns the selection (at most one node) and a side table of
/// ephemeral per-node state keyed by id. It never holds references into the
/// graph; every call takes the graph it should act on.
#[derive(Clone, Debug, Default)]
pub struct InteractionController {
    state: InteractionState,
    selection: Option<NodeId>,
    ephemeral: HashMap<NodeId, EphemeralState>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, InteractionState::Dragging { .. })
    }

    pub fn selection(&self) -> Option<&NodeId> {
        self.selection.as_ref()
    }

    pub fn ephemeral(&self, id: &NodeId) -> EphemeralState {
        self.ephemeral.get(id).copied().unwrap_or_default()
    }

    pub fn hovered(&self) -> Option<&NodeId> {
        self.ephemeral
            .iter()
            .find(|(_, state)| state.hovered)
            .map(|(id, _)| id)
    }

    /// Find the topmost node at a document point.
    ///
    /// Walks the flat list back to front; the first node that is both
    /// selectable and evented and whose world bounds contain the point wins.
    pub fn hit_test(graph: &SceneGraph, point: DVec2) -> Option<NodeId> {
        graph
            .to_flat_list()
            .into_iter()
            .rev()
            .find(|node| {
                let flags = node.flags();
                flags.selectable
                    && flags.evented
                    && node.bounds().is_some_and(|b| b.contains_point(point))
            })
            .map(|node| node.id().clone())
    }

    /// Returns the node that was hit, if any.
    pub fn pointer_down(&mut self, graph: &SceneGraph, point: DVec2) -> Option<NodeId> {
        if self.is_dragging() {
            self.pointer_up();
        }

        match Self::hit_test(graph, point) {
            Some(id) => {
                log::debug!("pointer down on {:?}", id);
                self.selection = Some(id.clone());
                self.state = InteractionState::Dragging { last_point: point };
                Some(id)
            }
            None => {
                self.selection = None;
                self.state = InteractionState::Idle;
                None
            }
        }
    }

    /// Returns true if the selected node moved.
    ///
    /// The pointer delta is taken back through the parent's world transform
    /// so the node follows the pointer inside scaled or rotated groups. Under
    /// a singular parent the delta is applied as is. While idle this only
    /// refreshes hover state.
    pub fn pointer_move(&mut self, graph: &mut SceneGraph, point: DVec2) -> bool {
        let InteractionState::Dragging { last_point } = self.state else {
            self.update_hover(graph, point);
            return false;
        };
        self.state = InteractionState::Dragging { last_point: point };

        let Some(id) = self.selection.as_ref() else {
            return false;
        };
        let Some(node) = graph.find_node(id) else {
            return false;
        };
        if node.flags().locked {
            return false;
        }
        let delta = point - last_point;
        let local_delta = node
            .parent_id()
            .and_then(|parent| graph.find_node(&parent))
            .and_then(|parent| parent.world_transform().inverse())
            .map_or(delta, |to_parent| to_parent.apply_vector(delta));
        graph.translate_node(id, local_delta)
    }

    /// Ends a drag. The selection is kept.
    pub fn pointer_up(&mut self) {
        self.state = InteractionState::Idle;
    }

    /// Returns false if `id` is not in the graph.
    pub fn select(&mut self, graph: &SceneGraph, id: &NodeId) -> bool {
        if !graph.contains(id) {
            return false;
        }
        self.selection = Some(id.clone());
        true
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
        self.state = InteractionState::Idle;
    }

    /// Removes the selected node and its subtree.
    pub fn delete_selected(&mut self, graph: &mut SceneGraph) -> Result<Node, InteractionError> {
        let id = self
            .selection
            .clone()
            .ok_or(InteractionError::NothingSelected)?;
        let Some(removed) = graph.remove_node(&id) else {
            // Selection pointed at a node that is already gone.
            self.clear_selection();
            return Err(InteractionError::NothingSelected);
        };
        self.notify_removed(&removed);
        Ok(removed)
    }

    /// Drops selection and ephemeral state that referred to a removed
    /// subtree. Call after any removal made outside the controller.
    pub fn notify_removed(&mut self, removed: &Node) {
        removed.walk(&mut |node| {
            self.ephemeral.remove(&node.id);
            if self.selection.as_ref() == Some(&node.id) {
                self.selection = None;
                self.state = InteractionState::Idle;
            }
        });
    }

    /// Forgets everything; used when the document is replaced.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn update_hover(&mut self, graph: &SceneGraph, point: DVec2) {
        let hit = Self::hit_test(graph, point);
        self.ephemeral.retain(|id, state| {
            state.hovered = hit.as_ref() == Some(id);
            *state != EphemeralState::default()
        });
        if let Some(id) = hit {
            self.ephemeral.entry(id).or_default().hovered = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::AffineTransform;
    use node::InteractionFlags;

    fn graph() -> SceneGraph {
        SceneGraph::from_nodes(vec![
            Node::rect(0.0, 0.0, 100.0, 100.0).with_id("a"),
            Node::rect(50.0, 50.0, 100.0, 100.0).with_id("b"),
        ])
        .unwrap()
    }

    fn translation(graph: &SceneGraph, id: &str) -> DVec2 {
        graph
            .find_node(&NodeId::from(id))
            .unwrap()
            .transform()
            .translation()
    }

    #[test]
    fn test_hit_test_prefers_topmost() {
        let graph = graph();
        let hit = InteractionController::hit_test(&graph, DVec2::new(75.0, 75.0));
        assert_eq!(hit, Some(NodeId::from("b")));
        let hit = InteractionController::hit_test(&graph, DVec2::new(10.0, 10.0));
        assert_eq!(hit, Some(NodeId::from("a")));
    }

    #[test]
    fn test_hit_test_skips_non_selectable_and_non_evented() {
        let mut flags = InteractionFlags::default();
        flags.evented = false;
        let graph = SceneGraph::from_nodes(vec![
            Node::rect(0.0, 0.0, 10.0, 10.0).with_id("under"),
            Node::rect(0.0, 0.0, 10.0, 10.0)
                .with_id("ghost")
                .with_flags(flags),
        ])
        .unwrap();
        let hit = InteractionController::hit_test(&graph, DVec2::new(5.0, 5.0));
        assert_eq!(hit, Some(NodeId::from("under")));
    }

    #[test]
    fn test_miss_then_move_changes_nothing() {
        let mut graph = graph();
        let before = graph.clone();
        let mut controller = InteractionController::new();

        assert!(controller.pointer_down(&graph, DVec2::new(500.0, 500.0)).is_none());
        assert!(!controller.pointer_move(&mut graph, DVec2::new(520.0, 540.0)));
        assert_eq!(graph, before);
        assert!(controller.selection().is_none());
        assert_eq!(controller.state(), InteractionState::Idle);
    }

    #[test]
    fn test_drag_moves_only_selected_node() {
        let mut graph = graph();
        let mut controller = InteractionController::new();

        controller.pointer_down(&graph, DVec2::new(10.0, 10.0));
        assert!(controller.pointer_move(&mut graph, DVec2::new(15.0, 12.0)));
        assert!(controller.pointer_move(&mut graph, DVec2::new(20.0, 30.0)));
        controller.pointer_up();

        assert_eq!(translation(&graph, "a"), DVec2::new(10.0, 20.0));
        assert_eq!(translation(&graph, "b"), DVec2::ZERO);
        assert_eq!(controller.selection(), Some(&NodeId::from("a")));
        assert!(!controller.is_dragging());
    }

    #[test]
    fn test_drag_preserves_rotation_and_scale() {
        let transform = AffineTransform::rotate(30.0).compose(&AffineTransform::scale(2.0, 3.0));
        let mut graph = SceneGraph::from_nodes(vec![Node::circle(0.0, 0.0, 10.0)
            .with_id("c")
            .with_transform(transform)])
        .unwrap();
        let mut controller = InteractionController::new();

        controller.pointer_down(&graph, DVec2::ZERO);
        controller.pointer_move(&mut graph, DVec2::new(7.0, -3.0));

        let moved = graph.find_node(&NodeId::from("c")).unwrap().transform();
        let expected = transform.to_array();
        let actual = moved.to_array();
        assert_eq!(actual[..4], expected[..4]);
        assert_eq!(moved.translation(), DVec2::new(7.0, -3.0));
    }

    #[test]
    fn test_drag_inside_transformed_group_follows_pointer() {
        let mut group_flags = InteractionFlags::default();
        group_flags.selectable = false;
        let group = |transform| {
            Node::group(vec![Node::rect(0.0, 0.0, 10.0, 10.0).with_id("child")])
                .with_id("group")
                .with_flags(group_flags)
                .with_transform(transform)
        };

        let scaled =
            AffineTransform::translate(100.0, 0.0).compose(&AffineTransform::scale(2.0, 2.0));
        let mut graph = SceneGraph::from_nodes(vec![group(scaled)]).unwrap();
        let mut controller = InteractionController::new();

        let hit = controller.pointer_down(&graph, DVec2::new(110.0, 10.0));
        assert_eq!(hit, Some(NodeId::from("child")));
        assert!(controller.pointer_move(&mut graph, DVec2::new(116.0, 4.0)));
        assert_eq!(translation(&graph, "child"), DVec2::new(3.0, -3.0));
        let bounds = graph.bounding_box(&NodeId::from("child")).unwrap();
        assert_eq!(bounds.min, DVec2::new(106.0, -6.0));

        let rotated = AffineTransform::rotate(90.0);
        let mut graph = SceneGraph::from_nodes(vec![group(rotated)]).unwrap();
        let mut controller = InteractionController::new();
        controller.pointer_down(&graph, DVec2::new(-5.0, 5.0));
        controller.pointer_move(&mut graph, DVec2::new(-5.0, 9.0));
        let bounds = graph.bounding_box(&NodeId::from("child")).unwrap();
        assert!((bounds.min - DVec2::new(-10.0, 4.0)).length() < 1e-9);
    }

    #[test]
    fn test_locked_node_is_selected_but_not_moved() {
        let mut flags = InteractionFlags::default();
        flags.locked = true;
        let mut graph =
            SceneGraph::from_nodes(vec![Node::rect(0.0, 0.0, 10.0, 10.0)
                .with_id("locked")
                .with_flags(flags)])
            .unwrap();
        let mut controller = InteractionController::new();

        assert!(controller.pointer_down(&graph, DVec2::new(5.0, 5.0)).is_some());
        assert!(!controller.pointer_move(&mut graph, DVec2::new(50.0, 50.0)));
        assert_eq!(translation(&graph, "locked"), DVec2::ZERO);
    }

    #[test]
    fn test_pointer_down_while_dragging_ends_previous_drag() {
        let mut graph = graph();
        let mut controller = InteractionController::new();

        controller.pointer_down(&graph, DVec2::new(10.0, 10.0));
        controller.pointer_down(&graph, DVec2::new(140.0, 140.0));
        assert_eq!(controller.selection(), Some(&NodeId::from("b")));
        assert_eq!(
            controller.state(),
            InteractionState::Dragging {
                last_point: DVec2::new(140.0, 140.0)
            }
        );
        controller.pointer_move(&mut graph, DVec2::new(141.0, 141.0));
        assert_eq!(translation(&graph, "a"), DVec2::ZERO);
        assert_eq!(translation(&graph, "b"), DVec2::ONE);
    }

    #[test]
    fn test_removal_clears_selection_only_when_selected() {
        let mut graph = SceneGraph::from_nodes(vec![
            Node::group(vec![Node::rect(0.0, 0.0, 10.0, 10.0).with_id("child")]).with_id("g"),
            Node::rect(100.0, 100.0, 10.0, 10.0).with_id("other"),
        ])
        .unwrap();
        let mut controller = InteractionController::new();
        assert!(controller.select(&graph, &NodeId::from("child")));

        let removed = graph.remove_node(&NodeId::from("other")).unwrap();
        controller.notify_removed(&removed);
        assert_eq!(controller.selection(), Some(&NodeId::from("child")));

        let removed = graph.remove_node(&NodeId::from("g")).unwrap();
        controller.notify_removed(&removed);
        assert!(controller.selection().is_none());
    }

    #[test]
    fn test_delete_selected() {
        let mut graph = graph();
        let mut controller = InteractionController::new();
        assert_eq!(
            controller.delete_selected(&mut graph).unwrap_err(),
            InteractionError::NothingSelected
        );

        controller.pointer_down(&graph, DVec2::new(10.0, 10.0));
        let removed = controller.delete_selected(&mut graph).unwrap();
        assert_eq!(removed.id, NodeId::from("a"));
        assert_eq!(graph.len(), 1);
        assert!(controller.selection().is_none());
        assert!(!controller.is_dragging());
    }

    #[test]
    fn test_hover_lives_in_side_table() {
        let mut graph = graph();
        let before = graph.clone();
        let mut controller = InteractionController::new();

        controller.pointer_move(&mut graph, DVec2::new(10.0, 10.0));
        assert_eq!(controller.hovered(), Some(&NodeId::from("a")));
        assert!(controller.ephemeral(&NodeId::from("a")).hovered);

        controller.pointer_move(&mut graph, DVec2::new(140.0, 140.0));
        assert_eq!(controller.hovered(), Some(&NodeId::from("b")));
        assert!(!controller.ephemeral(&NodeId::from("a")).hovered);

        controller.pointer_move(&mut graph, DVec2::new(900.0, 900.0));
        assert!(controller.hovered().is_none());
        assert_eq!(graph, before);
    }
}
