//! Gesture state machine: node dragging and background panning.

use tracing::{debug, trace};

use crate::domain::arena::Forest;
use crate::domain::error::DomainResult;
use crate::domain::viewport::Viewport;
use crate::domain::{DocumentId, Position, PositionMap};

/// Captured state of an active node drag.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub node: DocumentId,
    /// Pointer position in world coordinates when the drag began
    pub anchor: Position,
    /// Effective positions of the node and its descendants at drag start
    pub start_positions: PositionMap,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Panning {
        last: Position,
    },
    Dragging(DragSession),
}

/// Result of a pointer move.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    /// No gesture active
    Ignored,
    /// Viewport translated
    Panned,
    /// New custom-position map with the dragged subtree moved
    Dragged(PositionMap),
}

/// Owns the active gesture. Drag and pan are mutually exclusive: while one
/// is active the other cannot begin until release.
#[derive(Debug, Clone, Default)]
pub struct DragController {
    gesture: Gesture,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.gesture, Gesture::Idle)
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, Gesture::Dragging(_))
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.gesture, Gesture::Panning { .. })
    }

    /// Ids moved by the active drag, if any.
    pub fn dragged_ids(&self) -> Vec<DocumentId> {
        match &self.gesture {
            Gesture::Dragging(session) => session.start_positions.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Start dragging `node` and its whole subtree.
    ///
    /// Returns `Ok(false)` when another gesture is already active.
    pub fn begin_drag(
        &mut self,
        forest: &Forest,
        node: &DocumentId,
        pointer: Position,
        viewport: &Viewport,
        computed: &PositionMap,
        custom: &PositionMap,
    ) -> DomainResult<bool> {
        let members = forest.subtree(node)?;
        if !self.is_idle() {
            trace!("begin_drag ignored, gesture active");
            return Ok(false);
        }

        let start_positions = members
            .into_iter()
            .map(|id| {
                let start = custom
                    .get(&id)
                    .or_else(|| computed.get(&id))
                    .copied()
                    .unwrap_or(Position::ORIGIN);
                (id, start)
            })
            .collect::<PositionMap>();

        debug!("drag {} with {} members", node, start_positions.len());
        self.gesture = Gesture::Dragging(DragSession {
            node: node.clone(),
            anchor: viewport.screen_to_world(pointer),
            start_positions,
        });
        Ok(true)
    }

    /// Start panning. Returns `false` when another gesture is already active.
    pub fn begin_pan(&mut self, pointer: Position) -> bool {
        if !self.is_idle() {
            return false;
        }
        self.gesture = Gesture::Panning { last: pointer };
        true
    }

    /// Apply a pointer move to the active gesture.
    ///
    /// Panning mutates `viewport` in place. Dragging leaves `custom`
    /// untouched and returns the replacement map. A pointer that maps to a
    /// non-finite offset is ignored.
    pub fn pointer_move(&mut self, pointer: Position, viewport: &mut Viewport, custom: &PositionMap) -> MoveOutcome {
        match &mut self.gesture {
            Gesture::Idle => MoveOutcome::Ignored,
            Gesture::Panning { last } => {
                if !pointer.is_finite() {
                    return MoveOutcome::Ignored;
                }
                viewport.pan(pointer.x - last.x, pointer.y - last.y);
                *last = pointer;
                MoveOutcome::Panned
            }
            Gesture::Dragging(session) => {
                let world = viewport.screen_to_world(pointer);
                let dx = world.x - session.anchor.x;
                let dy = world.y - session.anchor.y;
                if !(dx.is_finite() && dy.is_finite()) {
                    debug!("drag move with non-finite offset ignored");
                    return MoveOutcome::Ignored;
                }
                let mut next = custom.clone();
                for (id, start) in &session.start_positions {
                    next.insert(id.clone(), start.offset(dx, dy));
                }
                MoveOutcome::Dragged(next)
            }
        }
    }

    /// Pointer released or left the surface: end whatever is active.
    pub fn release(&mut self) {
        if !self.is_idle() {
            trace!("gesture released");
        }
        self.gesture = Gesture::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DocumentNode, TreeBuilder};

    fn forest() -> Forest {
        TreeBuilder::new().build(vec![
            DocumentNode::new("r", "R"),
            DocumentNode::new("a", "A").with_parent("r"),
            DocumentNode::new("b", "B"),
        ])
    }

    #[test]
    fn given_active_pan_when_beginning_drag_then_refused() {
        let forest = forest();
        let mut ctl = DragController::new();
        assert!(ctl.begin_pan(Position::ORIGIN));

        let started = ctl
            .begin_drag(&forest, &"r".into(), Position::ORIGIN, &Viewport::default(), &PositionMap::new(), &PositionMap::new())
            .unwrap();

        assert!(!started);
        assert!(ctl.is_panning());
    }

    #[test]
    fn given_drag_when_moving_then_only_subtree_moves() {
        let forest = forest();
        let mut computed = PositionMap::new();
        computed.insert("r".into(), Position::new(0.0, 0.0));
        computed.insert("a".into(), Position::new(0.0, 180.0));
        computed.insert("b".into(), Position::new(300.0, 0.0));
        let mut vp = Viewport::new(0.0, 0.0, 2.0);
        let mut ctl = DragController::new();

        ctl.begin_drag(&forest, &"r".into(), Position::new(10.0, 10.0), &vp, &computed, &PositionMap::new())
            .unwrap();
        let outcome = ctl.pointer_move(Position::new(30.0, 50.0), &mut vp, &PositionMap::new());

        let MoveOutcome::Dragged(custom) = outcome else {
            panic!("expected drag outcome");
        };
        assert_eq!(custom[&DocumentId::from("r")], Position::new(10.0, 20.0));
        assert_eq!(custom[&DocumentId::from("a")], Position::new(10.0, 200.0));
        assert!(!custom.contains_key(&DocumentId::from("b")));
    }

    #[test]
    fn given_drag_when_pointer_not_finite_then_ignored() {
        let forest = forest();
        let mut vp = Viewport::default();
        let mut ctl = DragController::new();
        ctl.begin_drag(&forest, &"r".into(), Position::ORIGIN, &vp, &PositionMap::new(), &PositionMap::new())
            .unwrap();

        let outcome = ctl.pointer_move(Position::new(f64::NAN, 3.0), &mut vp, &PositionMap::new());

        assert_eq!(outcome, MoveOutcome::Ignored);
        assert!(ctl.is_dragging());
    }

    #[test]
    fn given_released_gesture_when_moving_then_ignored() {
        let mut ctl = DragController::new();
        let mut vp = Viewport::default();
        ctl.begin_pan(Position::ORIGIN);
        ctl.release();

        let outcome = ctl.pointer_move(Position::new(5.0, 5.0), &mut vp, &PositionMap::new());

        assert_eq!(outcome, MoveOutcome::Ignored);
        assert_eq!(vp, Viewport::default());
    }
}
