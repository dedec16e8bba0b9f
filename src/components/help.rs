use std::str;

use crossterm::event::Event;
use ratatui::layout::Rect;
use ratatui::style::Style;

use crate::components::markdown::markdown_lines;
use crate::components::{Component, ComponentContext, TextPanel};
use crate::keybindings::KeyBindings;
use crate::ui::UiFrame;

const HELP_CONTENT_BYTES: &[u8] =
    include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/help.md"));

/// Fill the help template with package details and the live key table.
pub fn help_markdown(bindings: &KeyBindings) -> String {
    let raw = str::from_utf8(HELP_CONTENT_BYTES).unwrap_or_default();
    let keys = bindings
        .help_entries()
        .into_iter()
        .map(|(action, combos)| format!("- `{}` {action}", combos.join("` / `")))
        .collect::<Vec<_>>()
        .join("\n");
    raw.replace("%PACKAGE%", env!("CARGO_PKG_NAME"))
        .replace("%VERSION%", env!("CARGO_PKG_VERSION"))
        .replace("%KEYS%", &keys)
}

#[derive(Debug)]
pub struct HelpPanel {
    panel: TextPanel,
}

impl HelpPanel {
    pub fn new(bindings: &KeyBindings) -> Self {
        let mut panel = TextPanel::new();
        panel.set_lines(markdown_lines(&help_markdown(bindings), Style::default()));
        Self { panel }
    }
}

impl Component for HelpPanel {
    fn render(&mut self, frame: &mut UiFrame<'_>, area: Rect, ctx: &ComponentContext) {
        self.panel.render(frame, area, ctx);
    }

    fn handle_event(&mut self, event: &Event, ctx: &ComponentContext) -> bool {
        self.panel.handle_event(event, ctx)
    }
}
