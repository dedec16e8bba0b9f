//! Drawing surface handed to panels.
//!
//! Windows can be dragged partly off the desk, so the rectangles panels get
//! often reach past the terminal buffer. `Buffer` panics on out-of-range
//! cells; everything here clips to the visible area first.
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::{StatefulWidget, Widget};

pub struct UiFrame<'a> {
    area: Rect,
    buffer: &'a mut Buffer,
}

impl<'a> UiFrame<'a> {
    pub fn new(frame: &'a mut Frame<'_>) -> Self {
        let area = frame.area();
        Self::from_parts(area, frame.buffer_mut())
    }

    /// Wrap a bare buffer. Used by tests and off-screen rendering.
    pub fn from_parts(area: Rect, buffer: &'a mut Buffer) -> Self {
        let area = area.intersection(buffer.area);
        Self { area, buffer }
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn buffer_mut(&mut self) -> &mut Buffer {
        self.buffer
    }

    fn visible(&self, rect: Rect) -> Option<Rect> {
        Some(rect.intersection(self.area)).filter(|r| !r.is_empty())
    }

    pub fn render_widget<W: Widget>(&mut self, widget: W, area: Rect) {
        if let Some(area) = self.visible(area) {
            widget.render(area, self.buffer);
        }
    }

    pub fn render_stateful_widget<W: StatefulWidget>(
        &mut self,
        widget: W,
        area: Rect,
        state: &mut W::State,
    ) {
        if let Some(area) = self.visible(area) {
            widget.render(area, self.buffer, state);
        }
    }

    /// Paint `area` blank so a window covers whatever is under it.
    pub fn fill(&mut self, area: Rect, style: Style) {
        let Some(area) = self.visible(area) else {
            return;
        };
        for position in area.positions() {
            if let Some(cell) = self.buffer.cell_mut(position) {
                cell.reset();
                cell.set_style(style);
            }
        }
    }
}

/// Write `text` at `(x, y)`, cut at the right edge of `bounds`. Nothing is
/// written when the start lies outside `bounds` or the buffer.
pub(crate) fn safe_set_string(
    buffer: &mut Buffer,
    bounds: Rect,
    x: u16,
    y: u16,
    text: &str,
    style: Style,
) {
    let bounds = bounds.intersection(buffer.area);
    if bounds.is_empty() || !bounds.contains((x, y).into()) {
        return;
    }
    let room = usize::from(bounds.right() - x);
    buffer.set_stringn(x, y, text, room, style);
}

/// First `width` characters of `value`.
pub(crate) fn truncate_to_width(value: &str, width: usize) -> String {
    match value.char_indices().nth(width) {
        Some((end, _)) => value[..end].to_string(),
        None => value.to_string(),
    }
}

/// Like [`truncate_to_width`] but marks the cut with a trailing ellipsis.
pub(crate) fn ellipsize(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = truncate_to_width(value, width - 1);
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Color;

    fn row(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf.cell((x, y)).unwrap().symbol().to_string())
            .collect()
    }

    #[test]
    fn truncation_counts_characters() {
        assert_eq!(truncate_to_width("MSFT", 10), "MSFT");
        assert_eq!(truncate_to_width("▲ AAPL", 3), "▲ A");
        assert_eq!(ellipsize("Vol Surface", 6), "Vol S…");
        assert_eq!(ellipsize("Chat", 4), "Chat");
        assert_eq!(ellipsize("Chat", 0), "");
    }

    #[test]
    fn strings_stop_at_the_bounds() {
        let area = Rect::new(0, 0, 8, 2);
        let mut buf = Buffer::empty(area);
        safe_set_string(&mut buf, Rect::new(2, 0, 4, 2), 3, 1, "NVDA 1D", Style::default());
        assert_eq!(row(&buf, 1), "   NVD  ");
        safe_set_string(&mut buf, area, 20, 0, "offscreen", Style::default());
        safe_set_string(&mut buf, area, 0, 9, "offscreen", Style::default());
        assert_eq!(row(&buf, 0), "        ");
    }

    #[test]
    fn widgets_are_clipped_to_the_frame() {
        struct Hatch;
        impl Widget for Hatch {
            fn render(self, area: Rect, buf: &mut Buffer) {
                for position in area.positions() {
                    buf[position].set_symbol("#");
                }
            }
        }

        let area = Rect::new(0, 0, 5, 3);
        let mut buf = Buffer::empty(area);
        let mut ui = UiFrame::from_parts(area, &mut buf);
        ui.render_widget(Hatch, Rect::new(3, 1, 9, 9));
        ui.render_widget(Hatch, Rect::new(7, 7, 2, 2));
        assert_eq!(row(&buf, 0), "     ");
        assert_eq!(row(&buf, 1), "   ##");
        assert_eq!(row(&buf, 2), "   ##");
    }

    #[test]
    fn fill_blanks_only_the_visible_part() {
        let area = Rect::new(0, 0, 4, 2);
        let mut buf = Buffer::empty(area);
        safe_set_string(&mut buf, area, 0, 0, "ABCD", Style::default());
        let mut ui = UiFrame::from_parts(area, &mut buf);
        ui.fill(Rect::new(2, 0, 10, 10), Style::default().bg(Color::Black));
        assert_eq!(row(&buf, 0), "AB  ");
        assert_eq!(buf.cell((3, 1)).unwrap().bg, Color::Black);
        assert_eq!(buf.cell((1, 1)).unwrap().bg, Color::Reset);
    }
}
