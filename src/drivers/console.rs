use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::event::{DisableMouseCapture, EnableMouseCapture, Event, MouseEventKind};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use super::keyboard::KeyboardNormalizer;
use super::{InputDriver, OutputDriver};
use crate::ui::UiFrame;

/// Pointer reports that only say "still here". Terminals send one per motion
/// sample even when the cell has not changed; at cell resolution these carry
/// no movement and are dropped.
fn is_motion(kind: MouseEventKind) -> bool {
    matches!(kind, MouseEventKind::Moved | MouseEventKind::Drag(_))
}

/// Reads crossterm events from the controlling terminal.
#[derive(Debug, Default)]
pub struct ConsoleInputDriver {
    normalizer: KeyboardNormalizer,
    pending: Option<Event>,
    last_motion: Option<(MouseEventKind, u16, u16)>,
}

impl ConsoleInputDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalized event, or `None` when it was swallowed.
    fn accept(&mut self, event: Event) -> Option<Event> {
        let event = self.normalizer.normalize(event)?;
        if let Event::Mouse(mouse) = &event {
            if is_motion(mouse.kind) {
                let sample = (mouse.kind, mouse.column, mouse.row);
                if self.last_motion == Some(sample) {
                    return None;
                }
                self.last_motion = Some(sample);
            } else {
                self.last_motion = None;
            }
        }
        Some(event)
    }
}

impl InputDriver for ConsoleInputDriver {
    fn poll(&mut self, timeout: Duration) -> io::Result<bool> {
        if self.pending.is_some() {
            return Ok(true);
        }
        // Swallowed events must not report readiness, or the loop would
        // block in `read` with nothing to return.
        let mut remaining = Some(timeout);
        while crossterm::event::poll(remaining.take().unwrap_or(Duration::ZERO))? {
            if let Some(event) = self.accept(crossterm::event::read()?) {
                self.pending = Some(event);
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn read(&mut self) -> io::Result<Event> {
        if let Some(event) = self.pending.take() {
            return Ok(event);
        }
        loop {
            if let Some(event) = self.accept(crossterm::event::read()?) {
                return Ok(event);
            }
        }
    }

    fn set_mouse_capture(&mut self, enabled: bool) -> io::Result<()> {
        self.last_motion = None;
        if enabled {
            execute!(io::stdout(), EnableMouseCapture)
        } else {
            execute!(io::stdout(), DisableMouseCapture)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Normal,
    Alternate,
}

/// Full-screen ratatui terminal on stdout. Leaving the alternate screen
/// also happens on drop, so an early return still restores the shell.
pub struct ConsoleOutputDriver {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    screen: Screen,
}

impl ConsoleOutputDriver {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            terminal: Terminal::new(CrosstermBackend::new(io::stdout()))?,
            screen: Screen::Normal,
        })
    }
}

impl OutputDriver for ConsoleOutputDriver {
    fn enter(&mut self) -> io::Result<()> {
        if self.screen == Screen::Alternate {
            return Ok(());
        }
        terminal::enable_raw_mode()?;
        execute!(self.terminal.backend_mut(), EnterAlternateScreen)?;
        self.terminal.hide_cursor()?;
        self.terminal.clear()?;
        self.screen = Screen::Alternate;
        Ok(())
    }

    fn exit(&mut self) -> io::Result<()> {
        if self.screen == Screen::Normal {
            return Ok(());
        }
        self.screen = Screen::Normal;
        execute!(
            self.terminal.backend_mut(),
            DisableMouseCapture,
            LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()?;
        self.terminal.show_cursor()
    }

    fn draw<F>(&mut self, f: F) -> io::Result<()>
    where
        F: FnOnce(UiFrame<'_>),
    {
        self.terminal.draw(|frame| f(UiFrame::new(frame)))?;
        Ok(())
    }
}

impl Drop for ConsoleOutputDriver {
    fn drop(&mut self) {
        let _ = self.exit();
    }
}
