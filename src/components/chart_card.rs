//! In-terminal stand-in for an embedded chart.
//!
//! A terminal cannot host the chart widget itself, so a card shows what was
//! mounted: symbol, interval, theme and the URL a browser would load.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget, Wrap};

use crate::chat::Mount;
use crate::embed::EmbedOptions;

pub struct ChartCard<'a> {
    options: Option<&'a EmbedOptions>,
    mount: &'a Mount,
    compact: bool,
}

impl<'a> ChartCard<'a> {
    pub fn new(options: Option<&'a EmbedOptions>, mount: &'a Mount) -> Self {
        Self {
            options,
            mount,
            compact: false,
        }
    }

    /// Inline chat cards get one line of text.
    pub fn compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    pub fn lines(&self) -> Vec<Line<'static>> {
        let label = Style::default().fg(Color::DarkGray);
        match self.mount {
            Mount::Empty => vec![Line::from(Span::styled("◌ chart pending", label))],
            Mount::Failed(reason) => vec![Line::from(vec![
                Span::styled("✕ chart unavailable: ", Style::default().fg(Color::Red)),
                Span::raw(reason.clone()),
            ])],
            Mount::Mounted(embed) => {
                let options = self.options.unwrap_or(&embed.options);
                let head = Line::from(vec![
                    Span::styled(
                        format!("▲ {}", options.symbol),
                        Style::default()
                            .fg(Color::Green)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("  {} · {}", options.interval.label(), options.theme.as_str()),
                        label,
                    ),
                ]);
                if self.compact {
                    return vec![head];
                }
                vec![
                    head,
                    Line::default(),
                    Line::from(Span::styled(options.chart_url(), label)),
                    Line::from(Span::styled(
                        format!("{} (mount #{})", embed.container, embed.generation),
                        label,
                    )),
                ]
            }
        }
    }
}

impl Widget for ChartCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(self.lines())
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::{ChartEmbed, ContainerId, Interval};
    use crate::window::Ticker;

    fn mounted() -> Mount {
        let options = EmbedOptions::new(Ticker::parse("AAPL").unwrap()).with_interval(Interval::Hour1);
        Mount::Mounted(ChartEmbed {
            container: ContainerId::new("widget-AAPL"),
            options,
            generation: 2,
        })
    }

    fn text(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn mounted_card_names_symbol_and_interval() {
        let mount = mounted();
        let lines = text(&ChartCard::new(None, &mount).lines());
        assert_eq!(lines[0], "▲ AAPL  1H · dark");
        assert!(lines[3].contains("widget-AAPL"));
        assert_eq!(ChartCard::new(None, &mount).compact(true).lines().len(), 1);
    }

    #[test]
    fn failed_card_carries_reason() {
        let mount = Mount::Failed("boom".into());
        let lines = text(&ChartCard::new(None, &mount).lines());
        assert_eq!(lines, ["✕ chart unavailable: boom"]);
    }
}
