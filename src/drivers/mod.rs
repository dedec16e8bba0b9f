//! Terminal I/O behind two small traits, so the app loop can run against a
//! real console or a scripted one in tests.
pub mod console;
pub mod keyboard;

use std::io;
use std::time::Duration;

use crossterm::event::Event;

use crate::ui::UiFrame;

/// Source of keyboard, mouse and resize events.
pub trait InputDriver {
    /// Wait up to `timeout` for an event. `true` means the next
    /// [`read`](Self::read) will not block.
    fn poll(&mut self, timeout: Duration) -> io::Result<bool>;

    fn read(&mut self) -> io::Result<Event>;

    /// Window dragging needs button and motion reports. Drivers without a
    /// pointer can ignore this.
    fn set_mouse_capture(&mut self, enabled: bool) -> io::Result<()> {
        let _ = enabled;
        Ok(())
    }
}

impl<T: InputDriver + ?Sized> InputDriver for &mut T {
    fn poll(&mut self, timeout: Duration) -> io::Result<bool> {
        T::poll(self, timeout)
    }

    fn read(&mut self) -> io::Result<Event> {
        T::read(self)
    }

    fn set_mouse_capture(&mut self, enabled: bool) -> io::Result<()> {
        T::set_mouse_capture(self, enabled)
    }
}

/// Screen the desk is drawn on.
pub trait OutputDriver {
    /// Take over the screen. Calling it twice is harmless.
    fn enter(&mut self) -> io::Result<()>;
    /// Give the screen back to the shell.
    fn exit(&mut self) -> io::Result<()>;
    /// Draw one full frame.
    fn draw<F>(&mut self, f: F) -> io::Result<()>
    where
        F: FnOnce(UiFrame<'_>);
}
