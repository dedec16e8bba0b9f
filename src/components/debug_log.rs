use std::collections::VecDeque;
use std::io::{self, Write};
use std::panic::PanicHookInfo;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use crossterm::event::Event;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::components::{Component, ComponentContext, TextPanel};
use crate::ui::UiFrame;

const DEFAULT_CAPACITY: usize = 2000;

static SHARED: OnceLock<DebugLogHandle> = OnceLock::new();
static HOOKED: OnceLock<()> = OnceLock::new();
static PANICKED: AtomicBool = AtomicBool::new(false);

/// Make `handle` the process-wide log. Only the first call wins.
pub fn set_global_debug_log(handle: DebugLogHandle) -> bool {
    SHARED.set(handle).is_ok()
}

pub fn global_debug_log() -> Option<DebugLogHandle> {
    SHARED.get().cloned()
}

fn panic_report(info: &PanicHookInfo<'_>) -> Vec<String> {
    let thread = std::thread::current();
    let mut report = vec![
        String::new(),
        format!("=== PANIC in {} ===", thread.name().unwrap_or("<unnamed>")),
    ];
    if let Some(at) = info.location() {
        report.push(format!("{}:{}:{}", at.file(), at.line(), at.column()));
    }
    let payload = info.payload();
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic>");
    report.push(format!("message: {message}"));
    let trace = std::backtrace::Backtrace::force_capture().to_string();
    report.extend(trace.lines().map(str::to_string));
    report.push("============".to_string());
    report
}

/// Copy panic reports into the shared log and flag them for the app. Worker
/// and poller threads would otherwise die unseen behind the alternate screen.
pub fn install_panic_hook() {
    if HOOKED.set(()).is_err() {
        return;
    }
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if let Some(log) = SHARED.get() {
            log.extend(panic_report(info));
        }
        PANICKED.store(true, Ordering::SeqCst);
        previous(info);
    }));
}

/// True once after any thread panicked; the app raises the log window.
pub fn take_panic_pending() -> bool {
    PANICKED.swap(false, Ordering::SeqCst)
}

/// Bounded line store. `revision` moves on every append so readers can skip
/// rebuilding when nothing changed.
#[derive(Debug)]
struct LogRing {
    lines: VecDeque<String>,
    capacity: usize,
    revision: u64,
}

impl LogRing {
    fn append(&mut self, line: String) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
        self.revision += 1;
    }
}

/// Cloneable handle on the shared log, written by tracing and the panic hook.
#[derive(Clone, Debug)]
pub struct DebugLogHandle {
    ring: Arc<Mutex<LogRing>>,
}

impl DebugLogHandle {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ring: Arc::new(Mutex::new(LogRing {
                lines: VecDeque::with_capacity(capacity.min(256)),
                capacity,
                revision: 0,
            })),
        }
    }

    pub fn push(&self, line: impl Into<String>) {
        self.extend([line.into()]);
    }

    fn extend(&self, lines: impl IntoIterator<Item = String>) {
        if let Ok(mut ring) = self.ring.lock() {
            for line in lines {
                ring.append(line);
            }
        }
    }

    pub fn writer(&self) -> DebugLogWriter {
        DebugLogWriter::new(self.clone())
    }

    pub fn lines(&self) -> Vec<String> {
        match self.ring.lock() {
            Ok(ring) => ring.lines.iter().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    fn revision(&self) -> u64 {
        self.ring.lock().map(|r| r.revision).unwrap_or_default()
    }
}

/// `io::Write` into the log, one entry per line. A trailing partial line is
/// held back until its newline arrives, a flush, or drop.
#[derive(Debug)]
pub struct DebugLogWriter {
    handle: DebugLogHandle,
    partial: Vec<u8>,
}

impl DebugLogWriter {
    pub fn new(handle: DebugLogHandle) -> Self {
        Self {
            handle,
            partial: Vec::new(),
        }
    }

    fn emit(&mut self, bytes: &[u8]) {
        self.partial.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(newline) = self.partial.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.partial.drain(..=newline).collect();
            let text = String::from_utf8_lossy(&line[..newline]).into_owned();
            if !text.is_empty() {
                lines.push(text);
            }
        }
        self.handle.extend(lines);
    }

    fn finish_partial(&mut self) {
        if self.partial.is_empty() {
            return;
        }
        let rest = std::mem::take(&mut self.partial);
        self.handle.push(String::from_utf8_lossy(&rest).into_owned());
    }
}

impl Write for DebugLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.emit(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.finish_partial();
        Ok(())
    }
}

impl Drop for DebugLogWriter {
    fn drop(&mut self) {
        self.finish_partial();
    }
}

fn level_style(line: &str) -> Style {
    if line.contains(" ERROR ") || line.starts_with("=== PANIC") {
        Style::default().fg(Color::Red)
    } else if line.contains(" WARN ") {
        Style::default().fg(Color::Yellow)
    } else if line.contains(" DEBUG ") || line.contains(" TRACE ") {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    }
}

/// Log window content. Follows the tail until the user scrolls up.
#[derive(Debug)]
pub struct DebugLogComponent {
    handle: DebugLogHandle,
    panel: TextPanel,
    seen_revision: Option<u64>,
}

impl DebugLogComponent {
    pub fn new(capacity: usize) -> (Self, DebugLogHandle) {
        Self::with_handle(DebugLogHandle::new(capacity))
    }

    pub fn new_default() -> (Self, DebugLogHandle) {
        Self::new(DEFAULT_CAPACITY)
    }

    pub fn with_handle(handle: DebugLogHandle) -> (Self, DebugLogHandle) {
        let mut panel = TextPanel::new();
        panel.set_wrap(false);
        panel.set_follow_tail(true);
        (
            Self {
                handle: handle.clone(),
                panel,
                seen_revision: None,
            },
            handle,
        )
    }

    fn refresh(&mut self) {
        let revision = self.handle.revision();
        if self.seen_revision == Some(revision) {
            return;
        }
        self.seen_revision = Some(revision);
        let lines = self
            .handle
            .lines()
            .into_iter()
            .map(|l| {
                let style = level_style(&l);
                Line::from(Span::styled(l, style))
            })
            .collect();
        self.panel.set_lines(lines);
    }
}

impl Component for DebugLogComponent {
    fn render(&mut self, frame: &mut UiFrame<'_>, area: Rect, ctx: &ComponentContext) {
        self.refresh();
        self.panel.render(frame, area, ctx);
    }

    fn handle_event(&mut self, event: &Event, ctx: &ComponentContext) -> bool {
        self.panel.handle_event(event, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::buffer::Buffer;

    #[test]
    fn buffer_is_capped() {
        let (_comp, handle) = DebugLogComponent::new(3);
        for line in ["one", "two", "three", "four"] {
            handle.push(line);
        }
        assert_eq!(handle.lines(), ["two", "three", "four"]);
    }

    #[test]
    fn writer_splits_lines_and_flushes_partial() {
        let (_comp, handle) = DebugLogComponent::new(10);
        let mut writer = handle.writer();
        writer.write_all(b"first line\nsecond line\npartial").unwrap();
        assert_eq!(handle.lines(), ["first line", "second line"]);
        writer.flush().unwrap();
        assert_eq!(handle.lines().last().map(String::as_str), Some("partial"));
    }

    #[test]
    fn dropping_writer_keeps_partial_line() {
        let handle = DebugLogHandle::new(10);
        {
            let mut writer = handle.writer();
            writer.write_all(b"no newline").unwrap();
        }
        assert_eq!(handle.lines(), ["no newline"]);
    }

    #[test]
    fn component_scrolls_away_from_tail() {
        let (mut comp, handle) = DebugLogComponent::new(50);
        for i in 0..20 {
            handle.push(format!("line{i}"));
        }
        let area = Rect::new(0, 0, 12, 5);
        let mut buffer = Buffer::empty(area);
        let ctx = ComponentContext::new(true);
        {
            let mut frame = UiFrame::from_parts(area, &mut buffer);
            comp.render(&mut frame, area, &ctx);
        }
        assert_eq!(comp.panel.offset(), 15);
        let page_up = Event::Key(KeyEvent::new(KeyCode::PageUp, KeyModifiers::NONE));
        assert!(comp.handle_event(&page_up, &ctx));
        assert_eq!(comp.panel.offset(), 10);

        handle.push("line20");
        let mut frame = UiFrame::from_parts(area, &mut buffer);
        comp.render(&mut frame, area, &ctx);
        assert_eq!(comp.panel.offset(), 10);
    }

    #[test]
    fn warnings_are_highlighted() {
        assert_eq!(level_style("2026 WARN desk: x").fg, Some(Color::Yellow));
        assert_eq!(level_style("plain").fg, None);
    }
}
