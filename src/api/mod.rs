//! Blocking client for the desk backend.
//!
//! Every call is synchronous and meant to run off the UI thread, either on
//! the [`worker::ApiWorker`] thread or inside a [`poller::Poller`].

pub mod poller;
pub mod worker;

use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::constants::INTEL_SESSION_ID;
use crate::error::{DeskError, DeskResult};
use crate::window::Ticker;

/// Answer to `POST /api/query`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryAnswer {
    pub answer_text: String,
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub status: String,
}

impl QueryAnswer {
    /// The ticker the answer is about, when the backend named a valid one.
    pub fn ticker(&self) -> Option<Ticker> {
        self.ticker.as_deref().and_then(|raw| Ticker::parse(raw).ok())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatSession {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl ChatSession {
    pub fn label(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoredMessage {
    pub role: String,
    pub content: String,
}

/// One pizza-index target from `GET /api/pizza`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PizzaReading {
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub spike_pct: i64,
    #[serde(default)]
    pub live_value: f64,
    #[serde(default)]
    pub historical: Vec<f64>,
    #[serde(default)]
    pub current_hour: usize,
}

/// Volatility surface extracted from the Plotly figure the backend returns.
#[derive(Debug, Clone, PartialEq)]
pub enum VolSurface {
    Grid {
        z: Vec<Vec<f64>>,
        x: Vec<f64>,
        y: Vec<f64>,
    },
    /// Placeholder figure; the backend puts the reason in the layout title.
    Message(String),
}

fn number_row(value: &Value) -> Vec<f64> {
    value
        .as_array()
        .map(|row| row.iter().map(|v| v.as_f64().unwrap_or(f64::NAN)).collect())
        .unwrap_or_default()
}

impl VolSurface {
    pub fn from_figure(figure: &Value) -> Self {
        let trace = figure.get("data").and_then(|d| d.get(0));
        let z: Vec<Vec<f64>> = trace
            .and_then(|t| t.get("z"))
            .and_then(Value::as_array)
            .map(|rows| rows.iter().map(number_row).collect())
            .unwrap_or_default();
        if z.iter().any(|row| !row.is_empty()) {
            let axis = |name: &str| trace.and_then(|t| t.get(name)).map(number_row).unwrap_or_default();
            return VolSurface::Grid {
                x: axis("x"),
                y: axis("y"),
                z,
            };
        }
        let title = figure.pointer("/layout/title/text").and_then(Value::as_str);
        VolSurface::Message(title.unwrap_or("NO SURFACE").to_string())
    }
}

/// Percent-encode one path segment.
pub fn encode_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

/// Watchlist entries that are not valid tickers are dropped with a warning.
pub fn parse_favorites(raw: Vec<String>) -> Vec<Ticker> {
    raw.into_iter()
        .filter_map(|s| match Ticker::parse(&s) {
            Ok(t) => Some(t),
            Err(error) => {
                tracing::warn!(%error, "ignoring watchlist entry");
                None
            }
        })
        .collect()
}

/// The collaborator endpoints the desk consumes.
pub trait Backend: Send + Sync + 'static {
    fn favorites(&self) -> DeskResult<Vec<Ticker>>;
    fn add_favorite(&self, ticker: &Ticker) -> DeskResult<()>;
    fn remove_favorite(&self, ticker: &Ticker) -> DeskResult<()>;
    fn query(&self, text: &str, session_id: &str) -> DeskResult<QueryAnswer>;
    fn sessions(&self) -> DeskResult<Vec<ChatSession>>;
    fn history(&self, session_id: &str) -> DeskResult<Vec<StoredMessage>>;
    fn delete_session(&self, session_id: &str) -> DeskResult<()>;
    fn pizza(&self) -> DeskResult<Vec<PizzaReading>>;
    fn surface(&self, ticker: &Ticker) -> DeskResult<VolSurface>;

    fn intel(&self) -> DeskResult<Vec<StoredMessage>> {
        self.history(INTEL_SESSION_ID)
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base: String,
    http: reqwest::blocking::Client,
}

impl ApiClient {
    pub fn new(base: &str, timeout: Duration) -> DeskResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tickerdesk/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn check(
        path: &str,
        response: reqwest::blocking::Response,
    ) -> DeskResult<reqwest::blocking::Response> {
        let status = response.status();
        if !status.is_success() {
            return Err(DeskError::Status {
                endpoint: path.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    fn decode<T: DeserializeOwned>(path: &str, response: reqwest::blocking::Response) -> DeskResult<T> {
        let text = Self::check(path, response)?.text()?;
        Ok(serde_json::from_str(&text)?)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> DeskResult<T> {
        let response = self.http.get(self.url(path)).send()?;
        Self::decode(path, response)
    }

    fn delete(&self, path: &str) -> DeskResult<()> {
        let response = self.http.delete(self.url(path)).send()?;
        Self::check(path, response)?;
        Ok(())
    }
}

impl Backend for ApiClient {
    fn favorites(&self) -> DeskResult<Vec<Ticker>> {
        let raw: Vec<String> = self.get_json("/api/favorites")?;
        Ok(parse_favorites(raw))
    }

    fn add_favorite(&self, ticker: &Ticker) -> DeskResult<()> {
        let path = "/api/favorites";
        let response = self
            .http
            .post(self.url(path))
            .json(&serde_json::json!({ "ticker": ticker.as_str() }))
            .send()?;
        Self::check(path, response)?;
        Ok(())
    }

    fn remove_favorite(&self, ticker: &Ticker) -> DeskResult<()> {
        self.delete(&format!("/api/favorites/{}", encode_segment(ticker.as_str())))
    }

    fn query(&self, text: &str, session_id: &str) -> DeskResult<QueryAnswer> {
        let path = "/api/query";
        let response = self
            .http
            .post(self.url(path))
            .form(&[("query_text", text), ("session_id", session_id)])
            .send()?;
        Self::decode(path, response)
    }

    fn sessions(&self) -> DeskResult<Vec<ChatSession>> {
        self.get_json("/api/chats")
    }

    fn history(&self, session_id: &str) -> DeskResult<Vec<StoredMessage>> {
        self.get_json(&format!("/api/chats/{}/messages", encode_segment(session_id)))
    }

    fn delete_session(&self, session_id: &str) -> DeskResult<()> {
        self.delete(&format!("/api/chats/{}", encode_segment(session_id)))
    }

    fn pizza(&self) -> DeskResult<Vec<PizzaReading>> {
        self.get_json("/api/pizza")
    }

    fn surface(&self, ticker: &Ticker) -> DeskResult<VolSurface> {
        let path = "/api/quant/surface";
        let response = self
            .http
            .get(self.url(path))
            .query(&[("ticker", ticker.as_str())])
            .send()?;
        let figure: Value = Self::decode(path, response)?;
        Ok(VolSurface::from_figure(&figure))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn answer_decodes_with_optional_ticker() {
        let a: QueryAnswer = serde_json::from_value(json!({
            "answer_text": "hi",
            "ticker": null,
            "status": "success"
        }))
        .unwrap();
        assert_eq!(a.ticker(), None);
        let b: QueryAnswer =
            serde_json::from_value(json!({"answer_text": "x", "ticker": "btc-usd"})).unwrap();
        assert_eq!(b.ticker().unwrap().as_str(), "BTC-USD");
    }

    #[test]
    fn pizza_accepts_integer_fields() {
        let readings: Vec<PizzaReading> = serde_json::from_value(json!([{
            "name": "DOMINO'S (PENTAGON)",
            "status": "SPIKE",
            "spike_pct": 300,
            "live_value": 100,
            "historical": [5, 10, 15],
            "current_hour": 2
        }]))
        .unwrap();
        assert_eq!(readings[0].spike_pct, 300);
        assert_eq!(readings[0].historical, vec![5.0, 10.0, 15.0]);
    }

    #[test]
    fn surface_from_figure() {
        let grid = VolSurface::from_figure(&json!({
            "data": [{"type": "surface", "z": [[0.1, 0.2], [0.3, 0.4]], "x": [1, 2], "y": [30, 60]}],
            "layout": {}
        }));
        assert!(matches!(grid, VolSurface::Grid { ref z, .. } if z.len() == 2));

        let empty = VolSurface::from_figure(&json!({
            "data": [],
            "layout": {"title": {"text": "NO DATA FOR XYZ"}}
        }));
        assert_eq!(empty, VolSurface::Message("NO DATA FOR XYZ".into()));
    }

    #[test]
    fn segments_are_encoded() {
        assert_eq!(encode_segment("BTC-USD"), "BTC-USD");
        assert_eq!(encode_segment("^GSPC"), "%5EGSPC");
        assert_eq!(encode_segment("a b"), "a%20b");
    }

    #[test]
    fn bad_watchlist_entries_are_dropped() {
        let favs = parse_favorites(vec!["aapl".into(), "not a ticker".into(), "SPY".into()]);
        let names: Vec<_> = favs.iter().map(Ticker::as_str).collect();
        assert_eq!(names, ["AAPL", "SPY"]);
    }

    #[test]
    fn urls_join_base_and_path() {
        let client = ApiClient::new("http://127.0.0.1:8000/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.url("/api/pizza"), "http://127.0.0.1:8000/api/pizza");
    }
}
