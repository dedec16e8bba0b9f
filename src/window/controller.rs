//! Pointer-driven move and resize behavior for floating windows.
//!
//! A `WindowController` holds at most one pointer capture at a time. A capture
//! starts on a press in a title bar (drag) or on an attached resize handle
//! (resize), and only the pointer-up that matches it ends it. While a capture
//! is held, presses elsewhere are ignored rather than stealing it.

use super::{HitRegion, Interaction, WindowId};
use crate::constants::{MIN_WINDOW_HEIGHT, MIN_WINDOW_WIDTH};
use crate::host::WindowHost;
use crate::stack::StackOrder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Move,
    Up,
}

/// A pointer event in desktop pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub x: i32,
    pub y: i32,
}

impl PointerEvent {
    pub fn down(x: i32, y: i32) -> Self {
        Self {
            kind: PointerKind::Down,
            x,
            y,
        }
    }

    pub fn moved(x: i32, y: i32) -> Self {
        Self {
            kind: PointerKind::Move,
            x,
            y,
        }
    }

    pub fn up(x: i32, y: i32) -> Self {
        Self {
            kind: PointerKind::Up,
            x,
            y,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Capture {
    Drag {
        id: WindowId,
        last_x: i32,
        last_y: i32,
    },
    Resize {
        id: WindowId,
        start_x: i32,
        start_y: i32,
        start_width: i32,
        start_height: i32,
    },
}

impl Capture {
    fn id(&self) -> &WindowId {
        match self {
            Capture::Drag { id, .. } | Capture::Resize { id, .. } => id,
        }
    }
}

#[derive(Debug)]
pub struct WindowController {
    capture: Option<Capture>,
    /// Window whose hot-corner hint is currently lit.
    hinted: Option<WindowId>,
    min_width: i32,
    min_height: i32,
}

impl Default for WindowController {
    fn default() -> Self {
        Self::new(MIN_WINDOW_WIDTH, MIN_WINDOW_HEIGHT)
    }
}

/// New top/left after one drag step. `pos1`/`pos2` are the previous pointer
/// position minus the current one, so subtracting them makes the window
/// follow the pointer.
pub fn drag_step(top: i32, left: i32, pos1: i32, pos2: i32) -> (i32, i32) {
    (top - pos2, left - pos1)
}

/// Dimensions after resizing from `start` by the pointer delta, floored at
/// the minimums.
pub fn resize_to(
    start_width: i32,
    start_height: i32,
    dx: i32,
    dy: i32,
    min_width: i32,
    min_height: i32,
) -> (i32, i32) {
    (
        min_width.max(start_width.saturating_add(dx)),
        min_height.max(start_height.saturating_add(dy)),
    )
}

impl WindowController {
    pub fn new(min_width: i32, min_height: i32) -> Self {
        Self {
            capture: None,
            hinted: None,
            min_width,
            min_height,
        }
    }

    pub fn min_size(&self) -> (i32, i32) {
        (self.min_width, self.min_height)
    }

    /// Whether a move listener is currently installed.
    pub fn is_capturing(&self) -> bool {
        self.capture.is_some()
    }

    pub fn captured_window(&self) -> Option<&WindowId> {
        self.capture.as_ref().map(Capture::id)
    }

    /// Wire a window into pointer handling by giving it a resize handle.
    /// Attaching twice is a no-op; returns whether a handle was added.
    pub fn attach<H: WindowHost + ?Sized>(&mut self, id: &WindowId, host: &mut H) -> bool {
        host.attach_resize_handle(id)
    }

    /// Release any capture that belongs to a window being torn down.
    pub fn detach(&mut self, id: &WindowId) {
        if self.captured_window() == Some(id) {
            self.capture = None;
        }
        if self.hinted.as_ref() == Some(id) {
            self.hinted = None;
        }
    }

    /// Route a pointer event. Returns `true` when the controller consumed it;
    /// presses on close and selection controls are left for the caller.
    pub fn handle_pointer<H: WindowHost + ?Sized>(
        &mut self,
        event: PointerEvent,
        host: &mut H,
        stack: &mut StackOrder,
    ) -> bool {
        match event.kind {
            PointerKind::Down => self.pointer_down(event, host, stack),
            PointerKind::Move => self.pointer_move(event, host),
            PointerKind::Up => self.pointer_up(host),
        }
    }

    fn pointer_down<H: WindowHost + ?Sized>(
        &mut self,
        event: PointerEvent,
        host: &mut H,
        stack: &mut StackOrder,
    ) -> bool {
        if self.capture.is_some() {
            return true;
        }
        let Some(hit) = host.hit_test(event.x, event.y) else {
            return false;
        };
        if hit.hot_corner {
            self.set_hint(Some(hit.id.clone()), host);
        }
        match hit.region {
            HitRegion::Close | HitRegion::Select => false,
            HitRegion::Title => {
                stack.activate(&hit.id, host);
                host.set_interaction(&hit.id, Interaction::Dragging);
                tracing::debug!(window = %hit.id, x = event.x, y = event.y, "drag start");
                self.capture = Some(Capture::Drag {
                    id: hit.id,
                    last_x: event.x,
                    last_y: event.y,
                });
                true
            }
            HitRegion::ResizeHandle => {
                let Some(rect) = host.window(&hit.id).map(|w| w.rect) else {
                    return false;
                };
                stack.activate(&hit.id, host);
                host.set_interaction(&hit.id, Interaction::Resizing);
                tracing::debug!(window = %hit.id, width = rect.width, height = rect.height, "resize start");
                self.capture = Some(Capture::Resize {
                    id: hit.id,
                    start_x: event.x,
                    start_y: event.y,
                    start_width: rect.width,
                    start_height: rect.height,
                });
                true
            }
            HitRegion::Body => {
                stack.activate(&hit.id, host);
                true
            }
        }
    }

    fn pointer_move<H: WindowHost + ?Sized>(&mut self, event: PointerEvent, host: &mut H) -> bool {
        let (min_width, min_height) = (self.min_width, self.min_height);
        match self.capture.as_mut() {
            Some(Capture::Drag { id, last_x, last_y }) => {
                let pos1 = *last_x - event.x;
                let pos2 = *last_y - event.y;
                *last_x = event.x;
                *last_y = event.y;
                if let Some(rect) = host.window(id).map(|w| w.rect) {
                    let (top, left) = drag_step(rect.top, rect.left, pos1, pos2);
                    host.set_position(id, top, left);
                }
                true
            }
            Some(Capture::Resize {
                id,
                start_x,
                start_y,
                start_width,
                start_height,
            }) => {
                let (width, height) = resize_to(
                    *start_width,
                    *start_height,
                    event.x - *start_x,
                    event.y - *start_y,
                    min_width,
                    min_height,
                );
                host.set_size(id, width, height);
                true
            }
            None => false,
        }
    }

    fn pointer_up<H: WindowHost + ?Sized>(&mut self, host: &mut H) -> bool {
        self.set_hint(None, host);
        let Some(capture) = self.capture.take() else {
            return false;
        };
        host.set_interaction(capture.id(), Interaction::Idle);
        tracing::debug!(window = %capture.id(), "pointer released");
        true
    }

    fn set_hint<H: WindowHost + ?Sized>(&mut self, id: Option<WindowId>, host: &mut H) {
        if let Some(previous) = self.hinted.take() {
            host.set_resize_hint(&previous, false);
        }
        if let Some(id) = id {
            host.set_resize_hint(&id, true);
            self.hinted = Some(id);
        }
    }
}
