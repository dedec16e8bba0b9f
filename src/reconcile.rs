//! Diffing the watchlist against the windows that exist.

use std::collections::BTreeSet;

use crate::desired::DesiredSet;
use crate::queue::CreationQueue;
use crate::registry::WidgetRegistry;
use crate::window::Ticker;

/// What one reconciliation pass wants done.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// New tickers in watchlist order; these go through the creation queue.
    pub additions: Vec<Ticker>,
    /// Tickers to tear down right away, whether mounted or still queued.
    pub removals: Vec<Ticker>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct ReconciliationEngine {
    previous: Vec<Ticker>,
    seen_revision: Option<u64>,
}

impl ReconciliationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `desired` changed since the last plan.
    pub fn is_stale(&self, desired: &DesiredSet) -> bool {
        self.seen_revision != Some(desired.revision())
    }

    pub fn previous(&self) -> &[Ticker] {
        &self.previous
    }

    /// Compute additions and removals and remember `desired` as the new
    /// baseline.
    ///
    /// Removals cover the previous watchlist plus anything mounted or queued
    /// that is no longer wanted, so stray windows heal on the next pass.
    pub fn plan(
        &mut self,
        desired: &DesiredSet,
        registry: &WidgetRegistry,
        queue: &CreationQueue,
    ) -> ReconcilePlan {
        let additions: Vec<Ticker> = desired
            .iter()
            .filter(|t| !registry.has(t) && !queue.is_pending(t))
            .cloned()
            .collect();

        let known: BTreeSet<&Ticker> = self
            .previous
            .iter()
            .chain(registry.iter())
            .chain(queue.pending())
            .collect();
        let removals: Vec<Ticker> = known
            .into_iter()
            .filter(|t| !desired.contains(t))
            .cloned()
            .collect();

        self.previous = desired.as_slice().to_vec();
        self.seen_revision = Some(desired.revision());
        ReconcilePlan {
            additions,
            removals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> Ticker {
        Ticker::parse(s).unwrap()
    }

    #[test]
    fn additions_follow_watchlist_order() {
        let mut engine = ReconciliationEngine::new();
        let desired = DesiredSet::from_tickers([t("GOOG"), t("AAPL"), t("MSFT")]);
        let plan = engine.plan(&desired, &WidgetRegistry::new(), &CreationQueue::default());
        assert_eq!(plan.additions, vec![t("GOOG"), t("AAPL"), t("MSFT")]);
        assert!(plan.removals.is_empty());
    }

    #[test]
    fn mounted_and_pending_are_not_re_added() {
        let mut engine = ReconciliationEngine::new();
        let mut reg = WidgetRegistry::new();
        reg.add(t("AAPL"));
        let mut q = CreationQueue::default();
        q.enqueue(t("MSFT"), &reg);
        let desired = DesiredSet::from_tickers([t("AAPL"), t("MSFT"), t("GOOG")]);
        let plan = engine.plan(&desired, &reg, &q);
        assert_eq!(plan.additions, vec![t("GOOG")]);
    }

    #[test]
    fn dropped_tickers_are_removed_including_queued_ones() {
        let mut engine = ReconciliationEngine::new();
        let mut reg = WidgetRegistry::new();
        let mut q = CreationQueue::default();
        let mut desired = DesiredSet::from_tickers([t("AAPL"), t("MSFT")]);
        engine.plan(&desired, &reg, &q);
        reg.add(t("AAPL"));
        q.enqueue(t("MSFT"), &reg);
        desired.replace([]);
        let plan = engine.plan(&desired, &reg, &q);
        assert_eq!(plan.removals, vec![t("AAPL"), t("MSFT")]);
        assert!(plan.additions.is_empty());
    }

    #[test]
    fn stray_registry_entries_heal() {
        let mut engine = ReconciliationEngine::new();
        let mut reg = WidgetRegistry::new();
        reg.add(t("TSLA"));
        let desired = DesiredSet::from_tickers([t("AAPL")]);
        let plan = engine.plan(&desired, &reg, &CreationQueue::default());
        assert_eq!(plan.removals, vec![t("TSLA")]);
    }

    #[test]
    fn staleness_follows_revision() {
        let mut engine = ReconciliationEngine::new();
        let mut desired = DesiredSet::new();
        assert!(engine.is_stale(&desired));
        engine.plan(&desired, &WidgetRegistry::new(), &CreationQueue::default());
        assert!(!engine.is_stale(&desired));
        desired.insert(t("AAPL"));
        assert!(engine.is_stale(&desired));
    }
}
