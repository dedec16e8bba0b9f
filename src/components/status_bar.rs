use ratatui::layout::Rect;
use ratatui::style::{Color, Style};

use crate::components::{Component, ComponentContext};
use crate::ui::{UiFrame, safe_set_string, truncate_to_width};

/// One-row bar along the bottom of the desktop. The right side yields to the
/// left when both do not fit.
#[derive(Debug)]
pub struct StatusBar {
    left: String,
    right: String,
    style: Style,
}

impl StatusBar {
    pub fn new() -> Self {
        Self {
            left: String::new(),
            right: String::new(),
            style: Style::default().bg(Color::Rgb(20, 20, 28)).fg(Color::Gray),
        }
    }

    pub fn set_left<T: Into<String>>(&mut self, value: T) {
        self.left = value.into();
    }

    pub fn set_right<T: Into<String>>(&mut self, value: T) {
        self.right = value.into();
    }

    pub fn set_style(&mut self, style: Style) {
        self.style = style;
    }
}

impl Default for StatusBar {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for StatusBar {
    fn render(&mut self, frame: &mut UiFrame<'_>, area: Rect, _ctx: &ComponentContext) {
        if area.height == 0 || area.width == 0 {
            return;
        }
        let row = Rect { height: 1, ..area };
        frame.fill(row, self.style);
        let bounds = row.intersection(frame.area());
        if bounds.width == 0 {
            return;
        }
        let width = area.width as usize;
        let left = truncate_to_width(&self.left, width);
        let left_width = left.chars().count();
        safe_set_string(frame.buffer_mut(), bounds, area.x, area.y, &left, self.style);

        let right_width = self.right.chars().count();
        if right_width > 0 && left_width + right_width < width {
            let start_x = area.x.saturating_add((width - right_width) as u16);
            safe_set_string(
                frame.buffer_mut(),
                bounds,
                start_x,
                area.y,
                &self.right,
                self.style,
            );
        }
    }
}
