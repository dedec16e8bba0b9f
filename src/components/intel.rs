use crossterm::event::Event;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::api::StoredMessage;
use crate::components::markdown::markdown_lines;
use crate::components::{Component, ComponentContext, TextPanel};
use crate::ui::UiFrame;

/// Scraped intelligence feed, newest item first.
#[derive(Debug)]
pub struct IntelPanel {
    panel: TextPanel,
    items: usize,
    loaded: bool,
}

impl Default for IntelPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl IntelPanel {
    pub fn new() -> Self {
        let mut panel = TextPanel::new();
        panel.set_lines(vec![Line::from(Span::styled(
            "waiting for the first intel poll…",
            Style::default().fg(Color::DarkGray),
        ))]);
        Self {
            panel,
            items: 0,
            loaded: false,
        }
    }

    pub fn set_items(&mut self, messages: &[StoredMessage]) {
        let rule = Line::from(Span::styled("────", Style::default().fg(Color::DarkGray)));
        let mut lines = Vec::new();
        for message in messages.iter().rev() {
            if !lines.is_empty() {
                lines.push(rule.clone());
            }
            lines.extend(markdown_lines(&message.content, Style::default()));
        }
        if lines.is_empty() {
            lines.push(Line::from(Span::styled(
                "no intel yet",
                Style::default().fg(Color::DarkGray),
            )));
        }
        let grew = messages.len() > self.items;
        self.items = messages.len();
        self.loaded = true;
        self.panel.set_lines(lines);
        if grew {
            self.panel.set_offset(0);
        }
    }

    pub fn item_count(&self) -> usize {
        self.items
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}

impl Component for IntelPanel {
    fn render(&mut self, frame: &mut UiFrame<'_>, area: Rect, ctx: &ComponentContext) {
        self.panel.render(frame, area, ctx);
    }

    fn handle_event(&mut self, event: &Event, ctx: &ComponentContext) -> bool {
        self.panel.handle_event(event, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intel(text: &str) -> StoredMessage {
        StoredMessage {
            role: "system".into(),
            content: text.into(),
        }
    }

    #[test]
    fn newest_item_comes_first() {
        let mut panel = IntelPanel::new();
        panel.set_items(&[intel("old news"), intel("**fresh** news")]);
        let lines = panel.panel.rendered_lines();
        assert_eq!(lines, ["fresh news", "────", "old news"]);
        assert_eq!(panel.item_count(), 2);
    }

    #[test]
    fn empty_feed_says_so() {
        let mut panel = IntelPanel::new();
        assert!(!panel.is_loaded());
        panel.set_items(&[]);
        assert!(panel.is_loaded());
        assert_eq!(panel.panel.rendered_lines(), ["no intel yet"]);
    }
}
