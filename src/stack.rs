//! Stacking order for floating windows.
//!
//! `StackOrder` is the only place a z-index is produced. Hosts receive a
//! [`ZIndex`] token they cannot construct themselves, so every raise goes
//! through [`StackOrder::activate`] and the values handed out stay strictly
//! increasing for the lifetime of the desk.

use std::fmt;

use crate::constants::BASE_Z_INDEX;
use crate::host::WindowHost;
use crate::window::WindowId;

/// Stacking value assigned to a window. Larger values draw on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ZIndex(u64);

impl ZIndex {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ZIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
pub struct StackOrder {
    next: u64,
    active: Option<WindowId>,
}

impl Default for StackOrder {
    fn default() -> Self {
        Self::new()
    }
}

impl StackOrder {
    pub fn new() -> Self {
        Self {
            next: BASE_Z_INDEX,
            active: None,
        }
    }

    pub fn active(&self) -> Option<&WindowId> {
        self.active.as_ref()
    }

    /// Raise `id` above everything else and make it the active window.
    ///
    /// Returns `None` without consuming a value when the host has no such
    /// window.
    pub fn activate<H: WindowHost + ?Sized>(&mut self, id: &WindowId, host: &mut H) -> Option<ZIndex> {
        if !host.contains(id) {
            return None;
        }
        let z = ZIndex(self.next);
        self.next += 1;
        host.set_stacking(id, z);
        if let Some(previous) = self.active.take()
            && previous != *id
        {
            host.set_active(&previous, false);
        }
        host.set_active(id, true);
        self.active = Some(id.clone());
        tracing::debug!(window = %id, z = z.get(), "activated window");
        Some(z)
    }

    /// Call after `id` left the host. When it was the active window, the
    /// highest remaining window is raised in its place so keyboard actions
    /// keep a target. The counter is never rewound.
    pub fn forget<H: WindowHost + ?Sized>(&mut self, id: &WindowId, host: &mut H) -> Option<WindowId> {
        if self.active.as_ref() != Some(id) {
            return None;
        }
        self.active = None;
        let next = host
            .ids()
            .into_iter()
            .filter(|other| other != id)
            .filter_map(|other| host.window(&other).map(|w| (w.z_index, other)))
            .max_by(|a, b| a.0.cmp(&b.0))
            .map(|(_, other)| other)?;
        self.activate(&next, host)?;
        Some(next)
    }
}
