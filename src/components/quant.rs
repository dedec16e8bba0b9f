use crossterm::event::Event;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};

use crate::api::VolSurface;
use crate::components::input::InputOutcome;
use crate::components::{Component, ComponentContext, Intent, LineInput};
use crate::ui::{UiFrame, safe_set_string};
use crate::window::Ticker;

const SHADES: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

#[derive(Debug, Clone, PartialEq)]
enum SurfaceView {
    Idle,
    Loading(Ticker),
    Loaded { ticker: Ticker, surface: VolSurface },
    Error(String),
}

/// Implied-volatility surface drawn as a shaded grid: rows are expiries,
/// columns strikes.
#[derive(Debug)]
pub struct QuantPanel {
    view: SurfaceView,
    input: LineInput,
    intent: Option<Intent>,
}

impl Default for QuantPanel {
    fn default() -> Self {
        Self::new()
    }
}

/// Min and max over the finite values of `z`.
fn value_range(z: &[Vec<f64>]) -> Option<(f64, f64)> {
    z.iter()
        .flatten()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Shade and color for `value` within `[lo, hi]`.
fn shade(value: f64, lo: f64, hi: f64) -> (char, Color) {
    if !value.is_finite() {
        return (' ', Color::Reset);
    }
    let t = if hi > lo { (value - lo) / (hi - lo) } else { 0.5 };
    let idx = (t * (SHADES.len() - 1) as f64).round() as usize;
    let idx = idx.min(SHADES.len() - 1);
    let red = (t * 255.0) as u8;
    (SHADES[idx], Color::Rgb(red, 80, 255 - red))
}

/// Pick `count` evenly spaced indices out of `len`.
fn sample(len: usize, count: usize) -> Vec<usize> {
    if len == 0 || count == 0 {
        return Vec::new();
    }
    if count >= len {
        return (0..len).collect();
    }
    (0..count).map(|i| i * (len - 1) / (count - 1).max(1)).collect()
}

impl QuantPanel {
    pub fn new() -> Self {
        Self {
            view: SurfaceView::Idle,
            input: LineInput::new("ticker: "),
            intent: None,
        }
    }

    pub fn set_surface(&mut self, ticker: Ticker, surface: VolSurface) {
        self.view = SurfaceView::Loaded { ticker, surface };
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.view = SurfaceView::Error(message.into());
    }

    pub fn loading(&self) -> Option<&Ticker> {
        match &self.view {
            SurfaceView::Loading(t) => Some(t),
            _ => None,
        }
    }

    fn render_grid(frame: &mut UiFrame<'_>, area: Rect, z: &[Vec<f64>], x: &[f64], y: &[f64]) {
        let Some((lo, hi)) = value_range(z) else {
            return;
        };
        let bounds = area.intersection(frame.area());
        let label_width = 6u16;
        let rows = sample(z.len(), area.height.saturating_sub(1) as usize);
        let cols_len = z.iter().map(Vec::len).max().unwrap_or(0);
        let cols = sample(cols_len, area.width.saturating_sub(label_width) as usize);
        for (row_idx, &zi) in rows.iter().enumerate() {
            let screen_y = area.y + row_idx as u16;
            if let Some(expiry) = y.get(zi) {
                safe_set_string(
                    frame.buffer_mut(),
                    bounds,
                    area.x,
                    screen_y,
                    &format!("{expiry:>5.0}"),
                    Style::default().fg(Color::DarkGray),
                );
            }
            for (col_idx, &xi) in cols.iter().enumerate() {
                let value = z[zi].get(xi).copied().unwrap_or(f64::NAN);
                let (ch, color) = shade(value, lo, hi);
                let screen_x = area.x + label_width + col_idx as u16;
                safe_set_string(
                    frame.buffer_mut(),
                    bounds,
                    screen_x,
                    screen_y,
                    &ch.to_string(),
                    Style::default().fg(color),
                );
            }
        }
        let strikes = match (x.first(), x.last()) {
            (Some(a), Some(b)) => format!("strike {a:.0}…{b:.0}  "),
            _ => String::new(),
        };
        let legend = format!("{strikes}iv {lo:.2}…{hi:.2}");
        safe_set_string(
            frame.buffer_mut(),
            bounds,
            area.x + label_width,
            area.y + rows.len() as u16,
            &legend,
            Style::default().fg(Color::DarkGray),
        );
    }
}

impl Component for QuantPanel {
    fn render(&mut self, frame: &mut UiFrame<'_>, area: Rect, ctx: &ComponentContext) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let body = Rect {
            height: area.height.saturating_sub(1),
            ..area
        };
        let bounds = body.intersection(frame.area());
        let muted = Style::default().fg(Color::DarkGray);
        match &self.view {
            SurfaceView::Idle => safe_set_string(
                frame.buffer_mut(),
                bounds,
                body.x,
                body.y,
                "enter a ticker to load its volatility surface",
                muted,
            ),
            SurfaceView::Loading(ticker) => safe_set_string(
                frame.buffer_mut(),
                bounds,
                body.x,
                body.y,
                &format!("loading {ticker}…"),
                muted,
            ),
            SurfaceView::Error(message) => safe_set_string(
                frame.buffer_mut(),
                bounds,
                body.x,
                body.y,
                message,
                Style::default().fg(Color::Red),
            ),
            SurfaceView::Loaded { ticker, surface } => {
                safe_set_string(
                    frame.buffer_mut(),
                    bounds,
                    body.x,
                    body.y,
                    ticker.as_str(),
                    Style::default().fg(Color::Cyan),
                );
                let grid_area = Rect {
                    y: body.y.saturating_add(1),
                    height: body.height.saturating_sub(1),
                    ..body
                };
                match surface {
                    VolSurface::Grid { z, x, y } => Self::render_grid(frame, grid_area, z, x, y),
                    VolSurface::Message(message) => safe_set_string(
                        frame.buffer_mut(),
                        bounds,
                        grid_area.x,
                        grid_area.y,
                        message,
                        muted,
                    ),
                }
            }
        }
        let input_row = Rect::new(area.x, area.bottom().saturating_sub(1), area.width, 1);
        self.input.render(frame, input_row, ctx.focused());
    }

    fn handle_event(&mut self, event: &Event, _ctx: &ComponentContext) -> bool {
        let Event::Key(key) = event else {
            return false;
        };
        match self.input.handle_key(key) {
            InputOutcome::Ignored => false,
            InputOutcome::Edited => true,
            InputOutcome::Submitted(raw) => {
                match Ticker::parse(&raw) {
                    Ok(ticker) => {
                        self.intent = Some(Intent::LoadSurface(ticker.clone()));
                        self.view = SurfaceView::Loading(ticker);
                    }
                    Err(error) => self.view = SurfaceView::Error(error.to_string()),
                }
                true
            }
        }
    }

    fn take_intent(&mut self) -> Option<Intent> {
        self.intent.take()
    }
}
