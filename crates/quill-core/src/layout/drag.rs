// Drag controller: Idle -> Dragging -> Idle.
//
// One controller serves every panel in a workspace. Pointer events arrive
// through a single dispatch entry and are routed to whichever panel the
// active session targets, so nothing is registered per panel.

use tracing::{debug, trace};

use super::store::PanelStore;
use crate::geometry::{Point, Rect, Size};

/// Pointer input relevant to dragging, in container coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up(Point),
}

/// An in-progress drag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    pub panel_id: String,
    /// Pointer position minus the panel's top-left corner at pointer-down.
    pub offset: Point,
}

/// Emitted when a drag finishes; carries the panel's final geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragEnd {
    pub panel_id: String,
    pub rect: Rect,
}

/// What a pointer event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragSignal {
    Ignored,
    Started { panel_id: String },
    Moved { panel_id: String, rect: Rect },
    Finished(DragEnd),
}

#[derive(Debug, Default)]
pub struct DragController {
    session: Option<DragSession>,
}

impl DragController {
    pub fn new() -> Self {
        DragController::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// Route a pointer event to the matching transition.
    pub fn handle_pointer(
        &mut self,
        store: &mut PanelStore,
        bounds: Size,
        event: PointerEvent,
    ) -> DragSignal {
        match event {
            PointerEvent::Down(p) => match self.pointer_down(store, p) {
                Some(panel_id) => DragSignal::Started { panel_id },
                None => DragSignal::Ignored,
            },
            PointerEvent::Move(p) => match self.pointer_move(store, bounds, p) {
                Some(rect) => DragSignal::Moved {
                    panel_id: self
                        .session
                        .as_ref()
                        .map(|s| s.panel_id.clone())
                        .unwrap_or_default(),
                    rect,
                },
                None => DragSignal::Ignored,
            },
            PointerEvent::Up(_) => match self.pointer_up(store) {
                Some(end) => DragSignal::Finished(end),
                None => DragSignal::Ignored,
            },
        }
    }

    /// Start dragging the topmost panel whose header is under `point`.
    ///
    /// Ignored while another drag is active. The grabbed panel is raised
    /// above every other panel. Returns the grabbed panel's id.
    pub fn pointer_down(&mut self, store: &mut PanelStore, point: Point) -> Option<String> {
        if let Some(active) = &self.session {
            debug!(
                "Ignoring pointer-down while '{}' is being dragged",
                active.panel_id
            );
            return None;
        }

        let panel = store.header_at(point)?;
        let rect = panel.rect();
        let panel_id = panel.id().to_string();

        store.raise(&panel_id);
        self.session = Some(DragSession {
            panel_id: panel_id.clone(),
            offset: Point::new(point.x - rect.x, point.y - rect.y),
        });
        debug!("Drag started on '{}'", panel_id);
        Some(panel_id)
    }

    /// Follow the pointer, keeping the whole panel inside `bounds`.
    ///
    /// Every call applies immediately. Returns the new geometry, or `None`
    /// when no drag is active.
    pub fn pointer_move(
        &mut self,
        store: &mut PanelStore,
        bounds: Size,
        point: Point,
    ) -> Option<Rect> {
        let session = self.session.as_ref()?;
        let x = point.x - session.offset.x;
        let y = point.y - session.offset.y;

        if !store.move_to(&session.panel_id, x, y, bounds).applied() {
            debug!("Dragged panel '{}' disappeared, ending drag", session.panel_id);
            self.session = None;
            return None;
        }
        let rect = store.get(&session.panel_id).map(|p| p.rect());
        trace!("Drag move -> {:?}", rect);
        rect
    }

    /// End the drag wherever the pointer is and fire the panel's
    /// completion hook.
    pub fn pointer_up(&mut self, store: &PanelStore) -> Option<DragEnd> {
        let session = self.session.take()?;
        let panel = store.get(&session.panel_id)?;
        let end = DragEnd {
            panel_id: session.panel_id,
            rect: panel.rect(),
        };
        debug!("Drag finished on '{}' at {:?}", end.panel_id, end.rect);
        if let Some(hook) = panel.drag_end_hook() {
            hook(&end);
        }
        Some(end)
    }

    /// Drop the active session without firing any hook.
    pub fn cancel(&mut self) {
        if let Some(session) = self.session.take() {
            debug!("Drag on '{}' cancelled", session.panel_id);
        }
    }
}
