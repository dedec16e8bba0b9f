use crossterm::event::{Event, KeyCode, MouseEventKind};
use ratatui::layout::Rect;
use ratatui::text::{Line, Text};
use ratatui::widgets::{Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap};

use crate::components::{Component, ComponentContext};
use crate::ui::UiFrame;

/// Scrollable block of styled text. Every read-only panel renders through
/// one of these.
#[derive(Debug)]
pub struct TextPanel {
    text: Text<'static>,
    wrap: bool,
    offset: usize,
    follow_tail: bool,
    last_total: usize,
    last_view: usize,
}

impl Default for TextPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl TextPanel {
    pub fn new() -> Self {
        Self {
            text: Text::from(vec![Line::from(String::new())]),
            wrap: true,
            offset: 0,
            follow_tail: false,
            last_total: 0,
            last_view: 0,
        }
    }

    pub fn set_text(&mut self, text: Text<'static>) {
        self.text = text;
    }

    pub fn set_lines(&mut self, lines: Vec<Line<'static>>) {
        self.text = Text::from(lines);
    }

    pub fn set_wrap(&mut self, wrap: bool) {
        self.wrap = wrap;
    }

    /// Keep the view pinned to the last line while nobody scrolls up.
    pub fn set_follow_tail(&mut self, follow: bool) {
        self.follow_tail = follow;
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn set_offset(&mut self, offset: usize) {
        self.offset = offset;
    }

    fn max_offset(&self) -> usize {
        self.last_total.saturating_sub(self.last_view)
    }

    pub fn is_at_bottom(&self) -> bool {
        self.last_view == 0 || self.offset >= self.max_offset()
    }

    pub fn scroll_by(&mut self, delta: isize) {
        let next = self.offset.saturating_add_signed(delta);
        self.offset = next.min(self.max_offset());
    }

    pub fn page(&self) -> isize {
        self.last_view.max(1) as isize
    }

    pub fn rendered_lines(&self) -> Vec<String> {
        self.text
            .lines
            .iter()
            .map(|line| {
                line.spans
                    .iter()
                    .map(|span| span.content.to_string())
                    .collect::<String>()
            })
            .collect()
    }
}

impl Component for TextPanel {
    fn render(&mut self, frame: &mut UiFrame<'_>, area: Rect, _ctx: &ComponentContext) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let view = area.height as usize;
        let mut content_width = area.width;
        let mut total = if self.wrap {
            compute_display_lines(&self.text, content_width)
        } else {
            self.text.lines.len().max(1)
        };
        let scrollbar = total > view && content_width > 1;
        if scrollbar {
            content_width = content_width.saturating_sub(1);
            if self.wrap {
                total = compute_display_lines(&self.text, content_width);
            }
        }
        self.last_total = total;
        self.last_view = view;
        if self.follow_tail {
            self.offset = self.max_offset();
        } else {
            self.offset = self.offset.min(self.max_offset());
        }

        let mut paragraph = Paragraph::new(self.text.clone());
        if self.wrap {
            paragraph = paragraph.wrap(Wrap { trim: false });
        }
        let scroll_y = self.offset.min(u16::MAX as usize) as u16;
        paragraph = paragraph.scroll((scroll_y, 0));
        frame.render_widget(
            paragraph,
            Rect {
                width: content_width,
                ..area
            },
        );
        if scrollbar {
            let mut state = ScrollbarState::new(self.max_offset()).position(self.offset);
            frame.render_stateful_widget(
                Scrollbar::new(ScrollbarOrientation::VerticalRight),
                area,
                &mut state,
            );
        }
    }

    fn handle_event(&mut self, event: &Event, ctx: &ComponentContext) -> bool {
        let delta = match event {
            Event::Key(key) => match key.code {
                KeyCode::Up => -1,
                KeyCode::Down => 1,
                KeyCode::PageUp => -self.page(),
                KeyCode::PageDown => self.page(),
                KeyCode::Home => -(self.offset as isize),
                KeyCode::End => self.max_offset() as isize,
                _ => return false,
            },
            Event::Mouse(mouse) if !ctx.capturing() => match mouse.kind {
                MouseEventKind::ScrollUp => -3,
                MouseEventKind::ScrollDown => 3,
                _ => return false,
            },
            _ => return false,
        };
        self.scroll_by(delta);
        if self.follow_tail || delta > 0 {
            self.follow_tail = self.is_at_bottom();
        }
        true
    }
}

fn compute_display_lines(text: &Text<'_>, width: u16) -> usize {
    let usable = width.max(1) as usize;
    text.lines
        .iter()
        .map(|line| {
            let w = line.width();
            if w == 0 { 1 } else { w.div_ceil(usable) }
        })
        .sum::<usize>()
        .max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, KeyModifiers};
    use ratatui::buffer::Buffer;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn draw(panel: &mut TextPanel, area: Rect) -> Buffer {
        let mut buffer = Buffer::empty(area);
        let mut frame = UiFrame::from_parts(area, &mut buffer);
        panel.render(&mut frame, area, &ComponentContext::default());
        buffer
    }

    #[test]
    fn wrapped_lines_count_toward_scroll_range() {
        let text = Text::from(vec![Line::from("abcdefghij"), Line::from("")]);
        assert_eq!(compute_display_lines(&text, 4), 4);
        assert_eq!(compute_display_lines(&text, 20), 2);
    }

    #[test]
    fn scrolling_is_clamped_to_content() {
        let mut panel = TextPanel::new();
        panel.set_lines((0..20).map(|i| Line::from(format!("line{i}"))).collect());
        let area = Rect::new(0, 0, 12, 5);
        draw(&mut panel, area);
        let ctx = ComponentContext::default();
        assert!(panel.handle_event(&key(KeyCode::PageDown), &ctx));
        assert_eq!(panel.offset(), 5);
        panel.handle_event(&key(KeyCode::End), &ctx);
        assert_eq!(panel.offset(), 15);
        panel.handle_event(&key(KeyCode::Down), &ctx);
        assert_eq!(panel.offset(), 15);
        panel.handle_event(&key(KeyCode::Home), &ctx);
        assert_eq!(panel.offset(), 0);
        assert!(!panel.handle_event(&key(KeyCode::Char('x')), &ctx));
    }

    #[test]
    fn follow_tail_pins_new_lines() {
        let mut panel = TextPanel::new();
        panel.set_wrap(false);
        panel.set_follow_tail(true);
        panel.set_lines((0..10).map(|i| Line::from(format!("l{i}"))).collect());
        let area = Rect::new(0, 0, 8, 3);
        let buf = draw(&mut panel, area);
        assert_eq!(buf.cell((0, 2)).unwrap().symbol(), "l");
        assert_eq!(buf.cell((1, 2)).unwrap().symbol(), "9");

        panel.handle_event(&key(KeyCode::Up), &ComponentContext::default());
        assert!(!panel.is_at_bottom());
        panel.set_lines((0..12).map(|i| Line::from(format!("l{i}"))).collect());
        draw(&mut panel, area);
        assert_eq!(panel.offset(), 6);
    }
}
