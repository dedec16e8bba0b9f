use crossterm::event::{Event, KeyCode};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{List, ListItem, ListState};

use crate::api::ChatSession;
use crate::components::{Component, ComponentContext, Intent};
use crate::constants::INTEL_SESSION_ID;
use crate::ui::{UiFrame, safe_set_string};

/// Stored conversations. The intel stream is a session on the backend too,
/// but it has its own window and is hidden here.
#[derive(Debug, Default)]
pub struct SessionsPanel {
    sessions: Vec<ChatSession>,
    current: Option<String>,
    state: ListState,
    intent: Option<Intent>,
}

impl SessionsPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_sessions(&mut self, sessions: Vec<ChatSession>) {
        let selected = self.selected().map(|s| s.id.clone());
        self.sessions = sessions
            .into_iter()
            .filter(|s| s.id != INTEL_SESSION_ID)
            .collect();
        let index = selected
            .and_then(|id| self.sessions.iter().position(|s| s.id == id))
            .or(if self.sessions.is_empty() { None } else { Some(0) });
        self.state.select(index);
    }

    pub fn set_current(&mut self, session_id: &str) {
        self.current = Some(session_id.to_string());
    }

    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    fn selected(&self) -> Option<&ChatSession> {
        self.state.selected().and_then(|i| self.sessions.get(i))
    }

    fn move_selection(&mut self, delta: isize) {
        if self.sessions.is_empty() {
            return;
        }
        let current = self.state.selected().unwrap_or(0);
        let next = current
            .saturating_add_signed(delta)
            .min(self.sessions.len() - 1);
        self.state.select(Some(next));
    }
}

impl Component for SessionsPanel {
    fn render(&mut self, frame: &mut UiFrame<'_>, area: Rect, _ctx: &ComponentContext) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        if self.sessions.is_empty() {
            let bounds = area.intersection(frame.area());
            safe_set_string(
                frame.buffer_mut(),
                bounds,
                area.x,
                area.y,
                "no saved conversations",
                Style::default().fg(Color::DarkGray),
            );
            return;
        }
        let items: Vec<ListItem> = self
            .sessions
            .iter()
            .map(|s| {
                let marker = if self.current.as_deref() == Some(s.id.as_str()) {
                    Span::styled("● ", Style::default().fg(Color::Green))
                } else {
                    Span::raw("  ")
                };
                let when = s.created_at.as_deref().unwrap_or("");
                ListItem::new(Line::from(vec![
                    marker,
                    Span::raw(s.label().to_string()),
                    Span::styled(format!("  {when}"), Style::default().fg(Color::DarkGray)),
                ]))
            })
            .collect();
        let list =
            List::new(items).highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        frame.render_stateful_widget(list, area, &mut self.state);
    }

    fn handle_event(&mut self, event: &Event, _ctx: &ComponentContext) -> bool {
        let Event::Key(key) = event else {
            return false;
        };
        match key.code {
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::Enter => {
                if let Some(id) = self.selected().map(|s| s.id.clone()) {
                    self.intent = Some(Intent::OpenSession(id));
                }
            }
            KeyCode::Delete => {
                if let Some(id) = self.selected().map(|s| s.id.clone()) {
                    self.intent = Some(Intent::DeleteSession(id));
                }
            }
            _ => return false,
        }
        true
    }

    fn take_intent(&mut self) -> Option<Intent> {
        self.intent.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, KeyModifiers};

    fn session(id: &str, title: Option<&str>) -> ChatSession {
        ChatSession {
            id: id.into(),
            title: title.map(str::to_string),
            created_at: None,
        }
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn intel_stream_is_hidden() {
        let mut panel = SessionsPanel::new();
        panel.set_sessions(vec![
            session(INTEL_SESSION_ID, None),
            session("session-1", Some("Apple")),
        ]);
        assert_eq!(panel.sessions().len(), 1);
    }

    #[test]
    fn enter_and_delete_target_selection() {
        let mut panel = SessionsPanel::new();
        panel.set_sessions(vec![session("a", None), session("b", Some("B"))]);
        let ctx = ComponentContext::new(true);
        panel.handle_event(&key(KeyCode::Down), &ctx);
        panel.handle_event(&key(KeyCode::Enter), &ctx);
        assert_eq!(panel.take_intent(), Some(Intent::OpenSession("b".into())));
        panel.handle_event(&key(KeyCode::Delete), &ctx);
        assert_eq!(panel.take_intent(), Some(Intent::DeleteSession("b".into())));
        assert!(!panel.handle_event(&key(KeyCode::Char('x')), &ctx));
    }
}
