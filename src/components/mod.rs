use crossterm::event::Event;
use ratatui::layout::Rect;

use crate::ui::UiFrame;
use crate::window::Ticker;

pub mod chart_card;
pub mod chat;
pub mod debug_log;
pub mod help;
pub mod input;
pub mod intel;
pub mod markdown;
pub mod pizza;
pub mod quant;
pub mod sessions;
pub mod status_bar;
pub mod text_panel;
pub mod watchlist;

pub use chart_card::ChartCard;
pub use chat::ChatPanel;
pub use debug_log::DebugLogComponent;
pub use help::HelpPanel;
pub use input::LineInput;
pub use intel::IntelPanel;
pub use pizza::PizzaPanel;
pub use quant::QuantPanel;
pub use sessions::SessionsPanel;
pub use status_bar::StatusBar;
pub use text_panel::TextPanel;
pub use watchlist::{WatchRow, WatchState, WatchlistPanel};

pub use crate::component_context::ComponentContext;

/// Something a panel wants done outside itself: a backend call, a watchlist
/// edit. The app collects these after routing input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    AddFavorite(Ticker),
    RemoveFavorite(Ticker),
    SendQuery(String),
    OpenSession(String),
    DeleteSession(String),
    LoadSurface(Ticker),
}

pub trait Component {
    fn resize(&mut self, _area: Rect, _ctx: &ComponentContext) {}

    fn render(&mut self, frame: &mut UiFrame<'_>, area: Rect, ctx: &ComponentContext);

    fn handle_event(&mut self, _event: &Event, _ctx: &ComponentContext) -> bool {
        false
    }

    /// Pop the request raised by the last handled event, if any.
    fn take_intent(&mut self) -> Option<Intent> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    struct DummyComp;
    impl Component for DummyComp {
        fn render(&mut self, _frame: &mut UiFrame<'_>, _area: Rect, _ctx: &ComponentContext) {}
    }

    #[test]
    fn defaults_ignore_events_and_raise_nothing() {
        let mut d = DummyComp;
        assert!(!d.handle_event(
            &Event::Key(KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE)),
            &ComponentContext::default()
        ));
        assert_eq!(d.take_intent(), None);
    }
}
