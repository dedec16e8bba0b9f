//! The chart-embed capability.
//!
//! The window core never draws charts itself. It hands a container id and a
//! symbol to a [`ChartEmbedder`] and keeps whatever comes back so the chart can
//! be re-embedded (interval change) or released (window teardown).

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{DeskError, DeskResult};
use crate::window::Ticker;

/// Identifier of the region a chart is mounted into.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContainerId(String);

impl ContainerId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Container that lives inside a ticker window.
    pub fn for_ticker(ticker: &Ticker) -> Self {
        Self(format!("widget-{ticker}"))
    }

    /// Container for the `slot`-th inline chart of chat message `message`.
    pub fn for_chat(message: usize, slot: usize) -> Self {
        Self(format!("chat-widget-{message}-{slot}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interval {
    Min1,
    Min5,
    Min15,
    Hour1,
    Hour4,
    #[default]
    Day1,
    Week1,
}

impl Interval {
    pub const ALL: [Interval; 7] = [
        Interval::Min1,
        Interval::Min5,
        Interval::Min15,
        Interval::Hour1,
        Interval::Hour4,
        Interval::Day1,
        Interval::Week1,
    ];

    /// Label shown in the title-bar selector.
    pub fn label(self) -> &'static str {
        match self {
            Interval::Min1 => "1m",
            Interval::Min5 => "5m",
            Interval::Min15 => "15m",
            Interval::Hour1 => "1H",
            Interval::Hour4 => "4H",
            Interval::Day1 => "1D",
            Interval::Week1 => "1W",
        }
    }

    /// Resolution code understood by the chart widget.
    pub fn code(self) -> &'static str {
        match self {
            Interval::Min1 => "1",
            Interval::Min5 => "5",
            Interval::Min15 => "15",
            Interval::Hour1 => "60",
            Interval::Hour4 => "240",
            Interval::Day1 => "D",
            Interval::Week1 => "W",
        }
    }

    /// The selector wraps around after the weekly interval.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|i| *i == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartTheme {
    #[default]
    Dark,
    Light,
}

impl ChartTheme {
    pub fn as_str(self) -> &'static str {
        match self {
            ChartTheme::Dark => "dark",
            ChartTheme::Light => "light",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedOptions {
    pub symbol: Ticker,
    pub interval: Interval,
    pub theme: ChartTheme,
}

impl EmbedOptions {
    pub fn new(symbol: Ticker) -> Self {
        Self {
            symbol,
            interval: Interval::default(),
            theme: ChartTheme::default(),
        }
    }

    pub fn with_interval(mut self, interval: Interval) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_theme(mut self, theme: ChartTheme) -> Self {
        self.theme = theme;
        self
    }

    /// Full chart page for the same symbol and resolution.
    pub fn chart_url(&self) -> String {
        format!(
            "https://www.tradingview.com/chart/?symbol={}&interval={}&theme={}",
            self.symbol,
            self.interval.code(),
            self.theme.as_str()
        )
    }
}

/// A chart that has been mounted into a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartEmbed {
    pub container: ContainerId,
    pub options: EmbedOptions,
    /// Bumped every time the same container is embedded again.
    pub generation: u64,
}

pub trait ChartEmbedder {
    fn embed(&mut self, container: &ContainerId, options: &EmbedOptions) -> DeskResult<ChartEmbed>;

    /// Tear down whatever was mounted in `container`. Unknown containers are
    /// ignored.
    fn release(&mut self, _container: &ContainerId) {}
}

/// Embedder for the terminal front end. Charts are drawn by the chart card
/// component from the returned [`ChartEmbed`]; this only tracks which
/// containers are live.
#[derive(Debug, Default)]
pub struct TerminalChartEmbedder {
    live: BTreeMap<ContainerId, u64>,
}

impl TerminalChartEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_live(&self, container: &ContainerId) -> bool {
        self.live.contains_key(container)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

impl ChartEmbedder for TerminalChartEmbedder {
    fn embed(&mut self, container: &ContainerId, options: &EmbedOptions) -> DeskResult<ChartEmbed> {
        if container.as_str().is_empty() {
            return Err(DeskError::EmbedFailed {
                container: container.clone(),
                reason: "empty container id".to_string(),
            });
        }
        let generation = self
            .live
            .entry(container.clone())
            .and_modify(|g| *g += 1)
            .or_insert(1);
        tracing::debug!(
            container = %container,
            symbol = %options.symbol,
            interval = options.interval.label(),
            "chart embedded"
        );
        Ok(ChartEmbed {
            container: container.clone(),
            options: options.clone(),
            generation: *generation,
        })
    }

    fn release(&mut self, container: &ContainerId) {
        if self.live.remove(container).is_some() {
            tracing::debug!(container = %container, "chart released");
        }
    }
}
