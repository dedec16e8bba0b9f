use crossterm::event::{Event, KeyCode, MouseEventKind};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::Sparkline;

use crate::api::PizzaReading;
use crate::components::{Component, ComponentContext};
use crate::ui::{UiFrame, safe_set_string};

const ROWS_PER_READING: u16 = 3;

/// Status labels from the pizza service, from calmest to busiest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PizzaStatus {
    Quiet,
    Nominal,
    Busy,
    Spike,
}

impl PizzaStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "SPIKE" => PizzaStatus::Spike,
            "BUSY" => PizzaStatus::Busy,
            "QUIET" => PizzaStatus::Quiet,
            _ => PizzaStatus::Nominal,
        }
    }

    pub fn color(self) -> Color {
        match self {
            PizzaStatus::Quiet => Color::Blue,
            PizzaStatus::Nominal => Color::Green,
            PizzaStatus::Busy => Color::Yellow,
            PizzaStatus::Spike => Color::Red,
        }
    }
}

#[derive(Debug, Default)]
pub struct PizzaPanel {
    readings: Vec<PizzaReading>,
    offset: usize,
}

impl PizzaPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_readings(&mut self, readings: Vec<PizzaReading>) {
        self.readings = readings;
        self.offset = self.offset.min(self.readings.len().saturating_sub(1));
    }

    /// Busiest status across all targets.
    pub fn worst(&self) -> Option<PizzaStatus> {
        self.readings
            .iter()
            .map(|r| PizzaStatus::parse(&r.status))
            .max()
    }

    fn render_reading(frame: &mut UiFrame<'_>, reading: &PizzaReading, area: Rect) {
        let bounds = area.intersection(frame.area());
        let status = PizzaStatus::parse(&reading.status);
        let name_style = Style::default().add_modifier(Modifier::BOLD);
        safe_set_string(frame.buffer_mut(), bounds, area.x, area.y, &reading.name, name_style);
        let badge = format!(" {} ", reading.status);
        let badge_x = area
            .right()
            .saturating_sub(badge.chars().count() as u16)
            .max(area.x);
        safe_set_string(
            frame.buffer_mut(),
            bounds,
            badge_x,
            area.y,
            &badge,
            Style::default().bg(status.color()).fg(Color::Black),
        );
        let detail = format!(
            "{:+}% vs usual · live {:.0}",
            reading.spike_pct, reading.live_value
        );
        safe_set_string(
            frame.buffer_mut(),
            bounds,
            area.x,
            area.y.saturating_add(1),
            &detail,
            Style::default().fg(status.color()),
        );
        if area.height > 2 && !reading.historical.is_empty() {
            let data: Vec<u64> = reading
                .historical
                .iter()
                .map(|v| v.max(0.0).round() as u64)
                .collect();
            let spark_area = Rect::new(
                area.x,
                area.y.saturating_add(2),
                area.width.min(data.len() as u16),
                1,
            );
            frame.render_widget(
                Sparkline::default()
                    .data(data)
                    .style(Style::default().fg(Color::DarkGray)),
                spark_area,
            );
            let hour = reading.current_hour as u16;
            if hour < spark_area.width
                && let Some(cell) = frame
                    .buffer_mut()
                    .cell_mut((spark_area.x + hour, spark_area.y))
            {
                cell.set_fg(status.color());
            }
        }
    }
}

impl Component for PizzaPanel {
    fn render(&mut self, frame: &mut UiFrame<'_>, area: Rect, _ctx: &ComponentContext) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        if self.readings.is_empty() {
            let bounds = area.intersection(frame.area());
            safe_set_string(
                frame.buffer_mut(),
                bounds,
                area.x,
                area.y,
                "no readings yet",
                Style::default().fg(Color::DarkGray),
            );
            return;
        }
        let mut y = area.y;
        for reading in self.readings.iter().skip(self.offset) {
            if y >= area.bottom() {
                break;
            }
            let height = ROWS_PER_READING.min(area.bottom() - y);
            Self::render_reading(frame, reading, Rect::new(area.x, y, area.width, height));
            y = y.saturating_add(ROWS_PER_READING + 1);
        }
    }

    fn handle_event(&mut self, event: &Event, ctx: &ComponentContext) -> bool {
        let up = match event {
            Event::Key(key) => match key.code {
                KeyCode::Up | KeyCode::PageUp => true,
                KeyCode::Down | KeyCode::PageDown => false,
                _ => return false,
            },
            Event::Mouse(mouse) if !ctx.capturing() => match mouse.kind {
                MouseEventKind::ScrollUp => true,
                MouseEventKind::ScrollDown => false,
                _ => return false,
            },
            _ => return false,
        };
        self.offset = if up {
            self.offset.saturating_sub(1)
        } else {
            (self.offset + 1).min(self.readings.len().saturating_sub(1))
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::buffer::Buffer;

    fn reading(name: &str, status: &str, spike: i64) -> PizzaReading {
        PizzaReading {
            name: name.into(),
            status: status.into(),
            spike_pct: spike,
            live_value: 40.0,
            historical: vec![10.0, 20.0, 30.0, 40.0],
            current_hour: 3,
        }
    }

    #[test]
    fn worst_status_wins() {
        let mut panel = PizzaPanel::new();
        assert_eq!(panel.worst(), None);
        panel.set_readings(vec![
            reading("A", "QUIET", -30),
            reading("B", "SPIKE", 300),
            reading("C", "NOMINAL", 0),
        ]);
        assert_eq!(panel.worst(), Some(PizzaStatus::Spike));
        assert_eq!(PizzaStatus::parse("busy"), PizzaStatus::Busy);
        assert_eq!(PizzaStatus::parse("???"), PizzaStatus::Nominal);
    }

    #[test]
    fn reading_rows_show_name_spike_and_history() {
        let mut panel = PizzaPanel::new();
        panel.set_readings(vec![reading("DOMINO'S", "BUSY", 25)]);
        let area = Rect::new(0, 0, 30, 4);
        let mut buf = Buffer::empty(area);
        let mut frame = UiFrame::from_parts(area, &mut buf);
        panel.render(&mut frame, area, &ComponentContext::default());
        let row = |y: u16| -> String {
            (0..30)
                .map(|x| buf.cell((x, y)).map(|c| c.symbol()).unwrap_or(" "))
                .collect()
        };
        assert!(row(0).starts_with("DOMINO'S"));
        assert!(row(0).trim_end().ends_with("BUSY"));
        assert!(row(1).starts_with("+25% vs usual · live 40"));
        assert_eq!(buf.cell((3, 2)).unwrap().fg, Color::Yellow);
        assert_ne!(buf.cell((3, 2)).unwrap().symbol(), " ");
    }
}
