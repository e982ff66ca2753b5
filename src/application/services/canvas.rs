//! Canvas session service
//!
//! Owns one user's canvas: the forest, computed layout, view-state snapshot,
//! viewport, active gesture, selection and the queue of outgoing events.
//! Every input event is handled synchronously; every mutation of the
//! snapshot is persisted before the call returns.

use tracing::{debug, instrument, warn};

use crate::application::services::PersistenceAdapter;
use crate::application::ApplicationResult;
use crate::config::{Settings, ViewportConfig};
use crate::domain::{
    effective_positions, toggle_expanded, CanvasEvent, CanvasSnapshot, Connection, ContainerSize,
    DocumentId, DocumentNode, DomainError, DragController, ExpandedSet, FitToView, Forest,
    LayoutEngine, MoveOutcome, Position, PositionMap, TreeBuilder, Viewport, VisibleNode,
};

pub struct CanvasService {
    layout: LayoutEngine,
    fitter: FitToView,
    zoom: ViewportConfig,
    persistence: PersistenceAdapter,

    forest: Forest,
    computed: PositionMap,
    snapshot: CanvasSnapshot,
    viewport: Viewport,
    container: ContainerSize,
    gestures: DragController,
    selected: Option<DocumentId>,
    view_initialized: bool,
    events: Vec<CanvasEvent>,
}

impl CanvasService {
    /// Create a session and restore the user's persisted view state.
    pub fn new(settings: &Settings, persistence: PersistenceAdapter) -> Self {
        let snapshot = persistence.load();
        let container = ContainerSize::from(settings.container);
        Self {
            layout: LayoutEngine::new(settings.layout),
            fitter: FitToView::new(settings.fit),
            zoom: settings.viewport,
            persistence,
            forest: Forest::new(),
            computed: PositionMap::new(),
            snapshot,
            viewport: Viewport::centered(container),
            container,
            gestures: DragController::new(),
            selected: None,
            view_initialized: false,
            events: Vec::new(),
        }
    }

    // ------------------------------------------------------------
    // document list
    // ------------------------------------------------------------

    /// Replace the document list, rebuild the forest and lay it out.
    /// The first non-empty layout of a session also fits the view.
    #[instrument(level = "debug", skip_all, fields(count = documents.len()))]
    pub fn set_documents(&mut self, documents: Vec<DocumentNode>) {
        self.gestures.release();
        self.forest = TreeBuilder::new().build(documents);
        if let Some(selected) = &self.selected {
            if !self.forest.contains(selected) {
                self.selected = None;
            }
        }
        self.relayout();
        if !self.view_initialized && !self.computed.is_empty() {
            self.reset_view();
            self.view_initialized = true;
        }
    }

    fn relayout(&mut self) {
        self.computed = self.layout.compute(&self.forest, &self.snapshot.expanded);
    }

    // ------------------------------------------------------------
    // structure
    // ------------------------------------------------------------

    /// Expand or collapse `id` with downward cascade. Any manual layout is
    /// discarded since it no longer matches the structure.
    #[instrument(level = "debug", skip(self))]
    pub fn toggle(&mut self, id: &DocumentId) -> ApplicationResult<()> {
        let expanded = toggle_expanded(&self.forest, &self.snapshot.expanded, id)?;
        self.events.push(CanvasEvent::Toggled { id: id.clone() });
        self.replace_snapshot(CanvasSnapshot::new(PositionMap::new(), expanded));
        self.relayout();
        Ok(())
    }

    // ------------------------------------------------------------
    // pointer input (screen coordinates relative to the container)
    // ------------------------------------------------------------

    /// Press on a node: select it and start dragging its subtree.
    pub fn pointer_down_on_node(&mut self, id: &DocumentId, pointer: Position) -> ApplicationResult<bool> {
        if !self.forest.contains(id) {
            return Err(DomainError::UnknownDocument(id.clone()).into());
        }
        self.select(Some(id.clone()));
        let started = self.gestures.begin_drag(
            &self.forest,
            id,
            pointer,
            &self.viewport,
            &self.computed,
            &self.snapshot.custom_positions,
        )?;
        Ok(started)
    }

    /// Press on empty background: clear selection and start panning.
    pub fn pointer_down_on_background(&mut self, pointer: Position) -> bool {
        self.select(None);
        self.gestures.begin_pan(pointer)
    }

    pub fn pointer_move(&mut self, pointer: Position) {
        match self.gestures.pointer_move(pointer, &mut self.viewport, &self.snapshot.custom_positions) {
            MoveOutcome::Ignored | MoveOutcome::Panned => {}
            MoveOutcome::Dragged(custom) => {
                let next = self.snapshot.with_custom_positions(custom);
                self.replace_snapshot(next);
            }
        }
    }

    pub fn pointer_up(&mut self) {
        self.gestures.release();
    }

    /// Leaving the surface ends any gesture, same as a release.
    pub fn pointer_leave(&mut self) {
        self.gestures.release();
    }

    /// Move the subtree of `id` by a world-space delta as one complete
    /// press/move/release gesture. A hidden node starts where a drag
    /// would capture it: custom, else computed, else the origin.
    pub fn drag_node_by(&mut self, id: &DocumentId, dx: f64, dy: f64) -> ApplicationResult<()> {
        if !(dx.is_finite() && dy.is_finite()) {
            return Err(DomainError::NonFiniteOffset { dx, dy }.into());
        }
        if !self.forest.contains(id) {
            return Err(DomainError::UnknownDocument(id.clone()).into());
        }
        let start = self.effective_position(id).unwrap_or(Position::ORIGIN);
        let from = self.viewport.world_to_screen(start);
        let to = self.viewport.world_to_screen(start.offset(dx, dy));

        self.gestures.release();
        self.pointer_down_on_node(id, from)?;
        self.pointer_move(to);
        self.pointer_up();
        Ok(())
    }

    // ------------------------------------------------------------
    // viewport
    // ------------------------------------------------------------

    pub fn wheel(&mut self, pointer: Position, delta_y: f64) {
        self.viewport
            .wheel(pointer, delta_y, self.zoom.wheel_zoom_factor);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_by(self.zoom.button_zoom_factor);
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_by(1.0 / self.zoom.button_zoom_factor);
    }

    /// Fit the visible tree into the container. Positions of hidden or
    /// vanished documents do not count.
    pub fn reset_view(&mut self) {
        let positions = self.visible_positions();
        self.viewport = self.fitter.fit(positions.values(), self.container);
        debug!("view reset to {:?}", self.viewport);
    }

    /// Drop all manual positions, then fit.
    pub fn reset_layout(&mut self) {
        let next = self.snapshot.with_custom_positions(PositionMap::new());
        self.replace_snapshot(next);
        self.reset_view();
    }

    /// Container geometry changed: remember it and refit.
    pub fn resize(&mut self, container: ContainerSize) {
        self.container = container;
        self.reset_view();
    }

    // ------------------------------------------------------------
    // collaborator requests
    // ------------------------------------------------------------

    pub fn request_delete(&mut self, id: &DocumentId) -> ApplicationResult<()> {
        let title = self
            .forest
            .document(id)
            .map(|doc| doc.title.clone())
            .ok_or_else(|| DomainError::UnknownDocument(id.clone()))?;
        self.events.push(CanvasEvent::DeleteRequested {
            id: id.clone(),
            title,
        });
        Ok(())
    }

    pub fn request_add_child(&mut self, parent: &DocumentId) -> ApplicationResult<()> {
        if !self.forest.contains(parent) {
            return Err(DomainError::UnknownDocument(parent.clone()).into());
        }
        self.events.push(CanvasEvent::AddChildRequested {
            parent_id: parent.clone(),
        });
        Ok(())
    }

    /// Take all events raised since the last call.
    pub fn drain_events(&mut self) -> Vec<CanvasEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------
    // queries
    // ------------------------------------------------------------

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn is_empty(&self) -> bool {
        self.forest.is_empty()
    }

    pub fn snapshot(&self) -> &CanvasSnapshot {
        &self.snapshot
    }

    pub fn expanded(&self) -> &ExpandedSet {
        &self.snapshot.expanded
    }

    pub fn computed_positions(&self) -> &PositionMap {
        &self.computed
    }

    pub fn custom_positions(&self) -> &PositionMap {
        &self.snapshot.custom_positions
    }

    /// Computed positions overlaid with custom ones.
    pub fn effective_positions(&self) -> PositionMap {
        effective_positions(&self.computed, &self.snapshot.custom_positions)
    }

    /// Effective positions of the nodes the layout currently shows.
    pub fn visible_positions(&self) -> PositionMap {
        self.computed
            .iter()
            .map(|(id, computed)| {
                let pos = self.snapshot.custom_positions.get(id).unwrap_or(computed);
                (id.clone(), *pos)
            })
            .collect()
    }

    pub fn effective_position(&self, id: &DocumentId) -> Option<Position> {
        self.snapshot
            .custom_positions
            .get(id)
            .or_else(|| self.computed.get(id))
            .copied()
    }

    pub fn visible_nodes(&self) -> Vec<VisibleNode> {
        self.layout
            .visible_nodes(&self.forest, &self.snapshot.expanded)
    }

    pub fn connections(&self) -> Vec<Connection> {
        self.layout.connections(
            &self.forest,
            &self.snapshot.expanded,
            &self.effective_positions(),
        )
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn container(&self) -> ContainerSize {
        self.container
    }

    pub fn selected(&self) -> Option<&DocumentId> {
        self.selected.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.gestures.is_dragging()
    }

    pub fn is_panning(&self) -> bool {
        self.gestures.is_panning()
    }

    // ------------------------------------------------------------
    // internals
    // ------------------------------------------------------------

    fn select(&mut self, id: Option<DocumentId>) {
        if let Some(id) = &id {
            self.events.push(CanvasEvent::NodeSelected { id: id.clone() });
        }
        self.selected = id;
    }

    /// Swap in a new snapshot and persist it. A failed write is logged and
    /// the in-memory state kept.
    fn replace_snapshot(&mut self, snapshot: CanvasSnapshot) {
        self.snapshot = snapshot;
        if let Err(e) = self.persistence.save(&self.snapshot) {
            warn!("cannot persist view state: {}", e);
        }
    }
}
