pub mod chrome;
pub mod controller;

use std::fmt;

use crate::error::{DeskError, DeskResult};
use crate::stack::ZIndex;

pub use chrome::{Hit, HitRegion};
pub use controller::{PointerEvent, PointerKind, WindowController};

/// Market symbol used as the key of a ticker window.
///
/// Symbols are trimmed and upper-cased on construction, so `" aapl"` and
/// `"AAPL"` name the same window.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticker(String);

impl Ticker {
    pub fn parse(raw: &str) -> DeskResult<Self> {
        let symbol = raw.trim().to_ascii_uppercase();
        let valid = !symbol.is_empty()
            && symbol.len() <= 24
            && symbol
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '=' | '^' | ':'));
        if !valid {
            return Err(DeskError::InvalidTicker(raw.to_string()));
        }
        Ok(Self(symbol))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fixed utility windows that are not driven by the favorites list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UtilityKind {
    Favorites,
    Chat,
    Sessions,
    Intel,
    Pizza,
    Quant,
    DebugLog,
    Help,
}

impl UtilityKind {
    pub const ALL: [UtilityKind; 8] = [
        UtilityKind::Favorites,
        UtilityKind::Chat,
        UtilityKind::Sessions,
        UtilityKind::Intel,
        UtilityKind::Pizza,
        UtilityKind::Quant,
        UtilityKind::DebugLog,
        UtilityKind::Help,
    ];

    pub fn title(self) -> &'static str {
        match self {
            UtilityKind::Favorites => "Watchlist",
            UtilityKind::Chat => "Chat",
            UtilityKind::Sessions => "Sessions",
            UtilityKind::Intel => "Intel",
            UtilityKind::Pizza => "Pizza Index",
            UtilityKind::Quant => "Vol Surface",
            UtilityKind::DebugLog => "Debug Log",
            UtilityKind::Help => "Help",
        }
    }

    /// Initial placement in pixels when the window is first opened.
    pub fn default_rect(self) -> FloatRect {
        let (left, top, width, height) = match self {
            UtilityKind::Favorites => (16, 32, 224, 320),
            UtilityKind::Chat => (520, 32, 432, 448),
            UtilityKind::Sessions => (520, 496, 320, 192),
            UtilityKind::Intel => (16, 368, 384, 256),
            UtilityKind::Pizza => (416, 368, 352, 256),
            UtilityKind::Quant => (248, 96, 400, 320),
            UtilityKind::DebugLog => (96, 400, 560, 224),
            UtilityKind::Help => (160, 64, 448, 352),
        };
        FloatRect::new(top, left, width, height)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WindowId {
    Ticker(Ticker),
    Utility(UtilityKind),
}

impl WindowId {
    pub fn as_ticker(&self) -> Option<&Ticker> {
        match self {
            WindowId::Ticker(ticker) => Some(ticker),
            WindowId::Utility(_) => None,
        }
    }

    pub fn title(&self) -> String {
        match self {
            WindowId::Ticker(ticker) => ticker.to_string(),
            WindowId::Utility(kind) => kind.title().to_string(),
        }
    }
}

impl From<Ticker> for WindowId {
    fn from(ticker: Ticker) -> Self {
        WindowId::Ticker(ticker)
    }
}

impl From<UtilityKind> for WindowId {
    fn from(kind: UtilityKind) -> Self {
        WindowId::Utility(kind)
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowId::Ticker(ticker) => write!(f, "ticker:{ticker}"),
            WindowId::Utility(kind) => write!(f, "utility:{kind:?}"),
        }
    }
}

/// Screen placement of a window in pixels. The origin may be negative when a
/// window is dragged partly off the desktop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloatRect {
    pub top: i32,
    pub left: i32,
    pub width: i32,
    pub height: i32,
}

impl FloatRect {
    pub const fn new(top: i32, left: i32, width: i32, height: i32) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.top + self.height
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right() && y >= self.top && y < self.bottom()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interaction {
    #[default]
    Idle,
    Dragging,
    Resizing,
}

/// Everything needed to put a new window on the desktop.
#[derive(Debug, Clone)]
pub struct WindowSpec {
    pub id: WindowId,
    pub title: String,
    pub rect: FloatRect,
}

impl WindowSpec {
    pub fn new(id: WindowId, rect: FloatRect) -> Self {
        Self {
            title: id.title(),
            id,
            rect,
        }
    }
}

/// One floating window as tracked by a host.
#[derive(Debug, Clone)]
pub struct WindowHandle {
    pub id: WindowId,
    pub title: String,
    pub rect: FloatRect,
    pub visible: bool,
    pub z_index: Option<ZIndex>,
    pub active: bool,
    pub interaction: Interaction,
    pub resize_handle: bool,
    /// Presentation-only flag raised by a press in the bottom-right hot corner.
    pub resize_hint: bool,
}

impl WindowHandle {
    pub fn new(spec: WindowSpec) -> Self {
        Self {
            id: spec.id,
            title: spec.title,
            rect: spec.rect,
            visible: true,
            z_index: None,
            active: false,
            interaction: Interaction::Idle,
            resize_handle: false,
            resize_hint: false,
        }
    }

    /// Ticker windows carry the interval selector in their title bar.
    pub fn has_select_control(&self) -> bool {
        matches!(self.id, WindowId::Ticker(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticker_is_normalized() {
        let t = Ticker::parse("  brk.b ").unwrap();
        assert_eq!(t.as_str(), "BRK.B");
        assert_eq!(Ticker::parse("btc-usd").unwrap().as_str(), "BTC-USD");
    }

    #[test]
    fn ticker_rejects_garbage() {
        assert!(Ticker::parse("").is_err());
        assert!(Ticker::parse("   ").is_err());
        assert!(Ticker::parse("AA PL").is_err());
        assert!(Ticker::parse("../etc").is_err());
    }

    #[test]
    fn rect_contains_is_half_open() {
        let r = FloatRect::new(10, 20, 100, 50);
        assert!(r.contains(20, 10));
        assert!(r.contains(119, 59));
        assert!(!r.contains(120, 30));
        assert!(!r.contains(50, 60));
    }

    #[test]
    fn only_ticker_windows_have_select_control() {
        let t = WindowHandle::new(WindowSpec::new(
            Ticker::parse("AAPL").unwrap().into(),
            FloatRect::new(0, 0, 200, 150),
        ));
        let u = WindowHandle::new(WindowSpec::new(
            UtilityKind::Chat.into(),
            UtilityKind::Chat.default_rect(),
        ));
        assert!(t.has_select_control());
        assert!(!u.has_select_control());
    }
}
