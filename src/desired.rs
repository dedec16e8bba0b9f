use crate::window::Ticker;

/// The ordered watchlist mirror that decides which ticker windows exist.
///
/// Every effective element-level change bumps `revision`, so an observer can
/// tell "the list changed" apart from "the same list was assigned again".
#[derive(Debug, Clone, Default)]
pub struct DesiredSet {
    items: Vec<Ticker>,
    revision: u64,
}

impl DesiredSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tickers<I: IntoIterator<Item = Ticker>>(tickers: I) -> Self {
        let mut set = Self::new();
        set.replace(tickers);
        set
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn contains(&self, ticker: &Ticker) -> bool {
        self.items.contains(ticker)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ticker> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[Ticker] {
        &self.items
    }

    pub fn insert(&mut self, ticker: Ticker) -> bool {
        if self.items.contains(&ticker) {
            return false;
        }
        self.items.push(ticker);
        self.revision += 1;
        true
    }

    pub fn remove(&mut self, ticker: &Ticker) -> bool {
        let before = self.items.len();
        self.items.retain(|t| t != ticker);
        let changed = self.items.len() != before;
        if changed {
            self.revision += 1;
        }
        changed
    }

    /// Replace the whole list, keeping first occurrences of duplicates.
    /// Returns whether anything actually changed.
    pub fn replace<I: IntoIterator<Item = Ticker>>(&mut self, tickers: I) -> bool {
        let mut next: Vec<Ticker> = Vec::new();
        for ticker in tickers {
            if !next.contains(&ticker) {
                next.push(ticker);
            }
        }
        if next == self.items {
            return false;
        }
        self.items = next;
        self.revision += 1;
        true
    }
}
