use crossterm::event::{Event, KeyCode};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{List, ListItem, ListState};

use crate::components::input::InputOutcome;
use crate::components::{Component, ComponentContext, Intent, LineInput};
use crate::ui::{UiFrame, safe_set_string};
use crate::window::Ticker;

/// Where a watchlist entry is on its way to becoming a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Waiting its turn in the creation queue.
    Queued,
    Open,
    /// Window exists but the chart could not be embedded.
    ChartFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchRow {
    pub ticker: Ticker,
    pub state: WatchState,
}

#[derive(Debug)]
pub struct WatchlistPanel {
    rows: Vec<WatchRow>,
    state: ListState,
    input: LineInput,
    error: Option<String>,
    intent: Option<Intent>,
}

impl Default for WatchlistPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchlistPanel {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            state: ListState::default(),
            input: LineInput::new("+ "),
            error: None,
            intent: None,
        }
    }

    pub fn sync(&mut self, rows: Vec<WatchRow>) {
        let selected = self
            .state
            .selected()
            .and_then(|i| self.rows.get(i))
            .map(|r| r.ticker.clone());
        self.rows = rows;
        let index = selected
            .and_then(|t| self.rows.iter().position(|r| r.ticker == t))
            .or(if self.rows.is_empty() { None } else { Some(0) });
        self.state.select(index);
    }

    pub fn selected(&self) -> Option<&Ticker> {
        self.state
            .selected()
            .and_then(|i| self.rows.get(i))
            .map(|r| &r.ticker)
    }

    fn move_selection(&mut self, delta: isize) {
        if self.rows.is_empty() {
            return;
        }
        let current = self.state.selected().unwrap_or(0);
        let next = current
            .saturating_add_signed(delta)
            .min(self.rows.len() - 1);
        self.state.select(Some(next));
    }

    fn row_item(row: &WatchRow) -> ListItem<'static> {
        let (badge, color) = match row.state {
            WatchState::Queued => ("queued", Color::DarkGray),
            WatchState::Open => ("open", Color::Green),
            WatchState::ChartFailed => ("no chart", Color::Red),
        };
        ListItem::new(Line::from(vec![
            Span::styled(format!("{:<10}", row.ticker.as_str()), Style::default()),
            Span::styled(badge, Style::default().fg(color)),
        ]))
    }
}

impl Component for WatchlistPanel {
    fn render(&mut self, frame: &mut UiFrame<'_>, area: Rect, ctx: &ComponentContext) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let footer = if self.error.is_some() { 2 } else { 1 };
        let list_area = Rect {
            height: area.height.saturating_sub(footer),
            ..area
        };
        if self.rows.is_empty() {
            let bounds = list_area.intersection(frame.area());
            safe_set_string(
                frame.buffer_mut(),
                bounds,
                area.x,
                area.y,
                "watchlist is empty",
                Style::default().fg(Color::DarkGray),
            );
        } else {
            let items: Vec<ListItem> = self.rows.iter().map(Self::row_item).collect();
            let list = List::new(items)
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
            frame.render_stateful_widget(list, list_area, &mut self.state);
        }
        let mut y = area.bottom().saturating_sub(footer);
        if let Some(error) = &self.error {
            let row = Rect::new(area.x, y, area.width, 1).intersection(frame.area());
            safe_set_string(
                frame.buffer_mut(),
                row,
                area.x,
                y,
                error,
                Style::default().fg(Color::Red),
            );
            y = y.saturating_add(1);
        }
        self.input
            .render(frame, Rect::new(area.x, y, area.width, 1), ctx.focused());
    }

    fn handle_event(&mut self, event: &Event, _ctx: &ComponentContext) -> bool {
        let Event::Key(key) = event else {
            return false;
        };
        match key.code {
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::Delete => {
                if let Some(ticker) = self.selected().cloned() {
                    self.intent = Some(Intent::RemoveFavorite(ticker));
                }
            }
            _ => match self.input.handle_key(key) {
                InputOutcome::Ignored => return false,
                InputOutcome::Edited => self.error = None,
                InputOutcome::Submitted(raw) => match Ticker::parse(&raw) {
                    Ok(ticker) => {
                        self.error = None;
                        self.intent = Some(Intent::AddFavorite(ticker));
                    }
                    Err(error) => self.error = Some(error.to_string()),
                },
            },
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

    fn t(s: &str) -> Ticker {
        Ticker::parse(s).unwrap()
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn rows(names: &[&str]) -> Vec<WatchRow> {
        names
            .iter()
            .map(|n| WatchRow {
                ticker: t(n),
                state: WatchState::Open,
            })
            .collect()
    }

    #[test]
    fn typing_a_ticker_raises_add_intent() {
        let mut panel = WatchlistPanel::new();
        let ctx = ComponentContext::new(true);
        for c in "nvda".chars() {
            panel.handle_event(&key(KeyCode::Char(c)), &ctx);
        }
        panel.handle_event(&key(KeyCode::Enter), &ctx);
        assert_eq!(panel.take_intent(), Some(Intent::AddFavorite(t("NVDA"))));
        assert_eq!(panel.take_intent(), None);
    }

    #[test]
    fn invalid_ticker_shows_error_instead() {
        let mut panel = WatchlistPanel::new();
        let ctx = ComponentContext::new(true);
        for c in "a/b".chars() {
            panel.handle_event(&key(KeyCode::Char(c)), &ctx);
        }
        panel.handle_event(&key(KeyCode::Enter), &ctx);
        assert_eq!(panel.take_intent(), None);
        assert!(panel.error.is_some());
    }

    #[test]
    fn delete_removes_selected_row() {
        let mut panel = WatchlistPanel::new();
        panel.sync(rows(&["AAPL", "MSFT", "SPY"]));
        let ctx = ComponentContext::new(true);
        panel.handle_event(&key(KeyCode::Down), &ctx);
        panel.handle_event(&key(KeyCode::Delete), &ctx);
        assert_eq!(panel.take_intent(), Some(Intent::RemoveFavorite(t("MSFT"))));
    }

    #[test]
    fn selection_follows_ticker_across_sync() {
        let mut panel = WatchlistPanel::new();
        panel.sync(rows(&["AAPL", "MSFT"]));
        panel.move_selection(1);
        panel.sync(rows(&["SPY", "AAPL", "MSFT"]));
        assert_eq!(panel.selected(), Some(&t("MSFT")));
        panel.sync(rows(&["SPY"]));
        assert_eq!(panel.selected(), Some(&t("SPY")));
        panel.sync(Vec::new());
        assert_eq!(panel.selected(), None);
    }
}
