use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};

use crate::ui::{UiFrame, safe_set_string};

/// Single-line text entry drawn at the bottom of a panel.
#[derive(Debug, Default)]
pub struct LineInput {
    value: String,
    prompt: &'static str,
}

pub enum InputOutcome {
    Ignored,
    Edited,
    Submitted(String),
}

impl LineInput {
    pub fn new(prompt: &'static str) -> Self {
        Self {
            value: String::new(),
            prompt,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn clear(&mut self) {
        self.value.clear();
    }

    /// Enter hands back the trimmed value and clears the field; blank input
    /// is not submitted.
    pub fn handle_key(&mut self, key: &KeyEvent) -> InputOutcome {
        if key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
        {
            return InputOutcome::Ignored;
        }
        match key.code {
            KeyCode::Char(c) => {
                self.value.push(c);
                InputOutcome::Edited
            }
            KeyCode::Backspace => {
                self.value.pop();
                InputOutcome::Edited
            }
            KeyCode::Esc if !self.value.is_empty() => {
                self.value.clear();
                InputOutcome::Edited
            }
            KeyCode::Enter => {
                let submitted = self.value.trim().to_string();
                if submitted.is_empty() {
                    return InputOutcome::Ignored;
                }
                self.value.clear();
                InputOutcome::Submitted(submitted)
            }
            _ => InputOutcome::Ignored,
        }
    }

    /// Draw on the first row of `area`, keeping the tail of long input
    /// visible.
    pub fn render(&self, frame: &mut UiFrame<'_>, area: Rect, focused: bool) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let style = if focused {
            Style::default().fg(Color::White).bg(Color::Rgb(30, 30, 46))
        } else {
            Style::default().fg(Color::Gray).bg(Color::Rgb(24, 24, 32))
        };
        let row = Rect { height: 1, ..area };
        frame.fill(row, style);
        let cursor = if focused { "▏" } else { "" };
        let room = (area.width as usize).saturating_sub(self.prompt.chars().count() + 1);
        let count = self.value.chars().count();
        let visible: String = self.value.chars().skip(count.saturating_sub(room)).collect();
        let line = format!("{}{visible}{cursor}", self.prompt);
        let bounds = row.intersection(frame.area());
        safe_set_string(frame.buffer_mut(), bounds, area.x, area.y, &line, style);
    }
}
