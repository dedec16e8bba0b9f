use std::collections::BTreeSet;

use crate::host::WindowHost;
use crate::window::{Ticker, WindowId};

/// Tickers that currently have a mounted window.
#[derive(Debug, Default)]
pub struct WidgetRegistry {
    mounted: BTreeSet<Ticker>,
}

impl WidgetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, ticker: &Ticker) -> bool {
        self.mounted.contains(ticker)
    }

    /// Track `ticker` as mounted. Returns `false` if it already was.
    pub fn add(&mut self, ticker: Ticker) -> bool {
        self.mounted.insert(ticker)
    }

    /// Forget `ticker`. Safe to call for tickers that were never added.
    pub fn remove(&mut self, ticker: &Ticker) -> bool {
        self.mounted.remove(ticker)
    }

    /// Duplicate-mount guard: a ticker can be mounted only if neither the
    /// registry nor the host already has a window for it.
    pub fn can_mount<H: WindowHost + ?Sized>(&self, ticker: &Ticker, host: &H) -> bool {
        !self.has(ticker) && !host.contains(&WindowId::Ticker(ticker.clone()))
    }

    pub fn len(&self) -> usize {
        self.mounted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounted.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ticker> {
        self.mounted.iter()
    }
}
