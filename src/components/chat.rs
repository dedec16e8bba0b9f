use crossterm::event::{Event, KeyCode};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::chat::{Block, Role, Transcript};
use crate::components::input::InputOutcome;
use crate::components::markdown::markdown_lines;
use crate::components::{ChartCard, Component, ComponentContext, Intent, LineInput, TextPanel};
use crate::ui::UiFrame;

/// Transcript view with a question box underneath.
#[derive(Debug)]
pub struct ChatPanel {
    log: TextPanel,
    input: LineInput,
    waiting: bool,
    session_label: String,
    intent: Option<Intent>,
}

impl Default for ChatPanel {
    fn default() -> Self {
        Self::new()
    }
}

fn role_style(role: Role) -> Style {
    let color = match role {
        Role::User => Color::Cyan,
        Role::Assistant => Color::Green,
        Role::System => Color::DarkGray,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Flatten a transcript into display lines. Widget placeholders become
/// one-line chart cards.
pub fn transcript_lines(transcript: &Transcript) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for message in transcript.messages() {
        if !lines.is_empty() {
            lines.push(Line::default());
        }
        lines.push(Line::from(Span::styled(
            message.role.label(),
            role_style(message.role),
        )));
        let base = match message.role {
            Role::System => Style::default().fg(Color::DarkGray),
            Role::User | Role::Assistant => Style::default(),
        };
        for block in &message.blocks {
            match block {
                Block::Markdown(text) => lines.extend(markdown_lines(text, base)),
                Block::Widget(placeholder) => {
                    let card = ChartCard::new(None, &placeholder.mount).compact(true);
                    for line in card.lines() {
                        let mut spans = vec![Span::styled("┃ ", Style::default().fg(Color::Blue))];
                        spans.extend(line.spans);
                        lines.push(Line::from(spans));
                    }
                }
            }
        }
    }
    lines
}

impl ChatPanel {
    pub fn new() -> Self {
        let mut log = TextPanel::new();
        log.set_follow_tail(true);
        Self {
            log,
            input: LineInput::new("? "),
            waiting: false,
            session_label: String::new(),
            intent: None,
        }
    }

    pub fn sync(&mut self, transcript: &Transcript) {
        let mut lines = transcript_lines(transcript);
        if lines.is_empty() {
            lines.push(Line::from(Span::styled(
                "Ask about a ticker, a market or the news.",
                Style::default().fg(Color::DarkGray),
            )));
        }
        if self.waiting {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                "desk is thinking…",
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )));
        }
        self.log.set_lines(lines);
        self.log.set_follow_tail(true);
    }

    /// Show or hide the pending-answer line; takes effect on the next sync.
    pub fn set_waiting(&mut self, waiting: bool) {
        self.waiting = waiting;
    }

    pub fn is_waiting(&self) -> bool {
        self.waiting
    }

    pub fn set_session_label(&mut self, label: impl Into<String>) {
        self.session_label = label.into();
    }

    pub fn session_label(&self) -> &str {
        &self.session_label
    }
}

impl Component for ChatPanel {
    fn render(&mut self, frame: &mut UiFrame<'_>, area: Rect, ctx: &ComponentContext) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let log_area = Rect {
            height: area.height.saturating_sub(1),
            ..area
        };
        self.log.render(frame, log_area, ctx);
        let input_row = Rect::new(area.x, area.bottom().saturating_sub(1), area.width, 1);
        self.input.render(frame, input_row, ctx.focused());
    }

    fn handle_event(&mut self, event: &Event, ctx: &ComponentContext) -> bool {
        if let Event::Key(key) = event {
            if matches!(
                key.code,
                KeyCode::Up | KeyCode::Down | KeyCode::PageUp | KeyCode::PageDown
            ) {
                return self.log.handle_event(event, ctx);
            }
            return match self.input.handle_key(key) {
                InputOutcome::Ignored => false,
                InputOutcome::Edited => true,
                InputOutcome::Submitted(text) => {
                    if self.waiting {
                        tracing::debug!("question dropped while an answer is pending");
                    } else {
                        self.intent = Some(Intent::SendQuery(text));
                    }
                    true
                }
            };
        }
        self.log.handle_event(event, ctx)
    }

    fn take_intent(&mut self) -> Option<Intent> {
        self.intent.take()
    }
}
