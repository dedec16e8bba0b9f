//! The surface windows live on.
//!
//! Reconciliation, the creation queue and the pointer controller only talk to
//! a [`WindowHost`]. [`Desktop`] is the in-memory host the terminal renderer
//! paints from, and the one the tests drive directly.

use std::collections::BTreeMap;

use crate::constants::{CASCADE_SLOTS, CASCADE_STEP_PX};
use crate::error::{DeskError, DeskResult};
use crate::stack::ZIndex;
use crate::window::chrome::{hit_region, in_hot_corner};
use crate::window::{FloatRect, Hit, Interaction, WindowHandle, WindowId, WindowSpec};

/// Operations a rendering backend exposes to the window core.
///
/// Mutators return `false` when the target window is gone; callers treat that
/// as a no-op rather than an error.
pub trait WindowHost {
    fn contains(&self, id: &WindowId) -> bool;
    fn window(&self, id: &WindowId) -> Option<&WindowHandle>;
    fn ids(&self) -> Vec<WindowId>;

    fn create(&mut self, spec: WindowSpec) -> DeskResult<()>;
    fn destroy(&mut self, id: &WindowId) -> bool;

    fn set_position(&mut self, id: &WindowId, top: i32, left: i32) -> bool;
    fn set_size(&mut self, id: &WindowId, width: i32, height: i32) -> bool;
    fn set_stacking(&mut self, id: &WindowId, z: ZIndex) -> bool;
    fn set_active(&mut self, id: &WindowId, active: bool) -> bool;
    fn set_interaction(&mut self, id: &WindowId, interaction: Interaction) -> bool;
    fn set_resize_hint(&mut self, id: &WindowId, hint: bool) -> bool;
    /// Add the dedicated resize handle; `false` if already present or missing.
    fn attach_resize_handle(&mut self, id: &WindowId) -> bool;

    /// Topmost visible window under the point, with the region that was hit.
    fn hit_test(&self, x: i32, y: i32) -> Option<Hit>;

    /// Where the next new window should appear.
    fn next_placement(&mut self, width: i32, height: i32) -> FloatRect;
}

#[derive(Debug, Default)]
pub struct Desktop {
    windows: BTreeMap<WindowId, WindowHandle>,
    placed: i32,
}

impl Desktop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Windows from bottom to top. Windows that were never activated sit
    /// below every stacked one.
    pub fn draw_order(&self) -> Vec<&WindowHandle> {
        let mut order: Vec<&WindowHandle> = self.windows.values().filter(|w| w.visible).collect();
        order.sort_by_key(|w| w.z_index);
        order
    }

    fn with_window<F>(&mut self, id: &WindowId, f: F) -> bool
    where
        F: FnOnce(&mut WindowHandle),
    {
        match self.windows.get_mut(id) {
            Some(window) => {
                f(window);
                true
            }
            None => false,
        }
    }
}

impl WindowHost for Desktop {
    fn contains(&self, id: &WindowId) -> bool {
        self.windows.contains_key(id)
    }

    fn window(&self, id: &WindowId) -> Option<&WindowHandle> {
        self.windows.get(id)
    }

    fn ids(&self) -> Vec<WindowId> {
        self.windows.keys().cloned().collect()
    }

    fn create(&mut self, spec: WindowSpec) -> DeskResult<()> {
        if self.windows.contains_key(&spec.id) {
            return Err(DeskError::DuplicateWindow(spec.id));
        }
        tracing::debug!(window = %spec.id, "window created");
        self.windows.insert(spec.id.clone(), WindowHandle::new(spec));
        Ok(())
    }

    fn destroy(&mut self, id: &WindowId) -> bool {
        let removed = self.windows.remove(id).is_some();
        if removed {
            tracing::debug!(window = %id, "window destroyed");
        }
        removed
    }

    fn set_position(&mut self, id: &WindowId, top: i32, left: i32) -> bool {
        self.with_window(id, |w| {
            w.rect.top = top;
            w.rect.left = left;
        })
    }

    fn set_size(&mut self, id: &WindowId, width: i32, height: i32) -> bool {
        self.with_window(id, |w| {
            w.rect.width = width;
            w.rect.height = height;
        })
    }

    fn set_stacking(&mut self, id: &WindowId, z: ZIndex) -> bool {
        self.with_window(id, |w| w.z_index = Some(z))
    }

    fn set_active(&mut self, id: &WindowId, active: bool) -> bool {
        self.with_window(id, |w| w.active = active)
    }

    fn set_interaction(&mut self, id: &WindowId, interaction: Interaction) -> bool {
        self.with_window(id, |w| w.interaction = interaction)
    }

    fn set_resize_hint(&mut self, id: &WindowId, hint: bool) -> bool {
        self.with_window(id, |w| w.resize_hint = hint)
    }

    fn attach_resize_handle(&mut self, id: &WindowId) -> bool {
        match self.windows.get_mut(id) {
            Some(window) if !window.resize_handle => {
                window.resize_handle = true;
                true
            }
            _ => false,
        }
    }

    fn hit_test(&self, x: i32, y: i32) -> Option<Hit> {
        self.draw_order().into_iter().rev().find_map(|window| {
            hit_region(window, x, y).map(|region| Hit {
                id: window.id.clone(),
                region,
                hot_corner: in_hot_corner(window.rect, x, y),
            })
        })
    }

    fn next_placement(&mut self, width: i32, height: i32) -> FloatRect {
        let slot = self.placed % CASCADE_SLOTS;
        self.placed += 1;
        let offset = CASCADE_STEP_PX * (slot + 1);
        FloatRect::new(offset, offset + 240, width, height)
    }
}
