use std::time::Duration;

use clap::Parser;
use tracing::Level;

use crate::constants::{
    CREATION_DELAY, DEFAULT_API_BASE, DEFAULT_INTEL_INTERVAL, DEFAULT_PIZZA_INTERVAL,
    DEFAULT_REQUEST_TIMEOUT, MIN_WINDOW_HEIGHT, MIN_WINDOW_WIDTH,
};
use crate::embed::ChartTheme;
use crate::window::Ticker;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "tickerdesk",
    version = env!("CARGO_PKG_VERSION"),
    about = "Floating-window market terminal for the desk backend"
)]
pub struct Cli {
    /// Base URL of the backend.
    #[arg(long, env = "TICKERDESK_API", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Chat session to attach to. A fresh one is generated when omitted.
    #[arg(long, env = "TICKERDESK_SESSION")]
    pub session: Option<String>,

    /// Pause between two ticker windows appearing.
    #[arg(long, value_name = "MS", default_value_t = CREATION_DELAY.as_millis() as u64)]
    pub creation_delay_ms: u64,

    /// Smallest width a window can be resized to, in pixels.
    #[arg(long, value_name = "PX", default_value_t = MIN_WINDOW_WIDTH)]
    pub min_width: i32,

    /// Smallest height a window can be resized to, in pixels.
    #[arg(long, value_name = "PX", default_value_t = MIN_WINDOW_HEIGHT)]
    pub min_height: i32,

    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_INTEL_INTERVAL.as_secs())]
    pub intel_interval_secs: u64,

    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_PIZZA_INTERVAL.as_secs())]
    pub pizza_interval_secs: u64,

    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs())]
    pub request_timeout_secs: u64,

    /// trace, debug, info, warn or error.
    #[arg(long, value_name = "LEVEL", default_value = "debug")]
    pub log_level: String,

    /// Run without a backend; the watchlist comes from --favorite.
    #[arg(long)]
    pub offline: bool,

    /// Ticker to put on the watchlist at startup (repeatable).
    #[arg(long = "favorite", value_name = "TICKER")]
    pub favorites: Vec<String>,

    /// Use the light chart theme.
    #[arg(long)]
    pub light: bool,
}

/// Resolved, validated settings handed to every constructor that needs them.
#[derive(Debug, Clone)]
pub struct DeskConfig {
    pub api_base: String,
    pub session_id: String,
    pub creation_delay: Duration,
    pub min_width: i32,
    pub min_height: i32,
    pub intel_interval: Duration,
    pub pizza_interval: Duration,
    pub request_timeout: Duration,
    pub log_level: Level,
    pub offline: bool,
    pub favorites: Vec<Ticker>,
    pub theme: ChartTheme,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            session_id: "desk-session".to_string(),
            creation_delay: CREATION_DELAY,
            min_width: MIN_WINDOW_WIDTH,
            min_height: MIN_WINDOW_HEIGHT,
            intel_interval: DEFAULT_INTEL_INTERVAL,
            pizza_interval: DEFAULT_PIZZA_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            log_level: Level::DEBUG,
            offline: false,
            favorites: Vec::new(),
            theme: ChartTheme::Dark,
        }
    }
}

/// Session id in the same shape the web client generated: a millisecond
/// timestamp with a prefix.
pub fn fresh_session_id() -> String {
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("session-{millis}")
}

impl TryFrom<&Cli> for DeskConfig {
    type Error = String;

    fn try_from(cli: &Cli) -> Result<Self, Self::Error> {
        let api_base = cli.api_base.trim().trim_end_matches('/').to_string();
        if !api_base.starts_with("http://") && !api_base.starts_with("https://") {
            return Err(format!("api base must be an http(s) url, got {api_base:?}"));
        }
        if cli.min_width < 1 || cli.min_height < 1 {
            return Err("minimum window size must be positive".to_string());
        }
        if cli.creation_delay_ms > 10_000 {
            return Err("creation delay must be at most 10000 ms".to_string());
        }
        if cli.request_timeout_secs == 0 {
            return Err("request timeout must be at least one second".to_string());
        }
        let log_level = cli
            .log_level
            .parse::<Level>()
            .map_err(|_| format!("unknown log level {:?}", cli.log_level))?;
        let favorites = cli
            .favorites
            .iter()
            .map(|raw| Ticker::parse(raw).map_err(|e| e.to_string()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            api_base,
            session_id: cli.session.clone().unwrap_or_else(fresh_session_id),
            creation_delay: Duration::from_millis(cli.creation_delay_ms),
            min_width: cli.min_width,
            min_height: cli.min_height,
            intel_interval: Duration::from_secs(cli.intel_interval_secs.max(1)),
            pizza_interval: Duration::from_secs(cli.pizza_interval_secs.max(1)),
            request_timeout: Duration::from_secs(cli.request_timeout_secs),
            log_level,
            offline: cli.offline,
            favorites,
            theme: if cli.light {
                ChartTheme::Light
            } else {
                ChartTheme::Dark
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["tickerdesk"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_resolve() {
        let cli = parse(&["--api-base", "http://localhost:8000/", "--session", "s1"]);
        let cfg = DeskConfig::try_from(&cli).unwrap();
        assert_eq!(cfg.api_base, "http://localhost:8000");
        assert_eq!(cfg.session_id, "s1");
        assert_eq!(cfg.creation_delay, Duration::from_millis(300));
        assert_eq!((cfg.min_width, cfg.min_height), (200, 150));
        assert_eq!(cfg.pizza_interval, Duration::from_secs(1800));
    }

    #[test]
    fn favorites_are_normalized() {
        let cli = parse(&[
            "--api-base",
            "http://x",
            "--offline",
            "--favorite",
            "aapl",
            "--favorite",
            "btc-usd",
        ]);
        let cfg = DeskConfig::try_from(&cli).unwrap();
        assert!(cfg.offline);
        let names: Vec<_> = cfg.favorites.iter().map(|t| t.as_str()).collect();
        assert_eq!(names, ["AAPL", "BTC-USD"]);
    }

    #[test]
    fn rejects_bad_values() {
        let bad_url = parse(&["--api-base", "localhost"]);
        assert!(DeskConfig::try_from(&bad_url).is_err());
        let bad_level = parse(&["--api-base", "http://x", "--log-level", "loud"]);
        assert!(DeskConfig::try_from(&bad_level).is_err());
        let bad_ticker = parse(&["--api-base", "http://x", "--favorite", "A B"]);
        assert!(DeskConfig::try_from(&bad_ticker).is_err());
    }

    #[test]
    fn intervals_are_clamped() {
        let cli = parse(&["--api-base", "http://x", "--pizza-interval-secs", "0"]);
        let cfg = DeskConfig::try_from(&cli).unwrap();
        assert_eq!(cfg.pizza_interval, Duration::from_secs(1));
    }
}
