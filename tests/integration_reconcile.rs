use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use tickerdesk::config::DeskConfig;
use tickerdesk::desk::Desk;
use tickerdesk::embed::TerminalChartEmbedder;
use tickerdesk::host::{Desktop, WindowHost};
use tickerdesk::queue::{Drained, Skip};
use tickerdesk::window::{Ticker, WindowId};

type TestDesk = Desk<Desktop, TerminalChartEmbedder>;

fn t(s: &str) -> Ticker {
    Ticker::parse(s).unwrap()
}

fn desk() -> TestDesk {
    Desk::new(
        Desktop::new(),
        TerminalChartEmbedder::new(),
        &DeskConfig::default(),
    )
}

fn ticker_windows(desk: &TestDesk) -> BTreeSet<Ticker> {
    desk.host()
        .ids()
        .into_iter()
        .filter_map(|id| match id {
            WindowId::Ticker(t) => Some(t),
            WindowId::Utility(_) => None,
        })
        .collect()
}

fn settle(desk: &mut TestDesk, mut now: Instant) -> Instant {
    while !desk.queue().is_empty() {
        desk.tick(now);
        now += Duration::from_millis(100);
    }
    now
}

#[test]
fn burst_of_three_materializes_one_per_delay() {
    let mut d = desk();
    let t0 = Instant::now();
    d.set_favorites([t("AAPL"), t("MSFT"), t("GOOG")]);
    assert_eq!(d.queue().len(), 3);

    assert!(matches!(d.tick(t0), Drained::Materialized(ref x) if *x == t("AAPL")));
    assert!(matches!(
        d.tick(t0 + Duration::from_millis(299)),
        Drained::Skipped(Skip::Processing)
    ));
    assert!(matches!(
        d.tick(t0 + Duration::from_millis(300)),
        Drained::Materialized(ref x) if *x == t("MSFT")
    ));
    assert!(matches!(
        d.tick(t0 + Duration::from_millis(450)),
        Drained::Skipped(Skip::Processing)
    ));
    assert!(matches!(
        d.tick(t0 + Duration::from_millis(600)),
        Drained::Materialized(ref x) if *x == t("GOOG")
    ));
    assert!(matches!(
        d.tick(t0 + Duration::from_millis(900)),
        Drained::Skipped(Skip::Empty)
    ));

    let registry: BTreeSet<Ticker> = d.registry().iter().cloned().collect();
    assert_eq!(registry, BTreeSet::from([t("AAPL"), t("MSFT"), t("GOOG")]));
    assert_eq!(ticker_windows(&d), registry);
    assert_eq!(d.active(), Some(&WindowId::Ticker(t("GOOG"))));
}

#[test]
fn add_then_remove_before_creation_leaves_nothing() {
    let mut d = desk();
    let t0 = Instant::now();
    d.add_favorite(t("MSFT"));
    d.tick(t0);
    d.add_favorite(t("AAPL"));
    assert!(d.queue().is_pending(&t("AAPL")));

    let plan = d.remove_favorite(&t("AAPL"));
    assert_eq!(plan.removals, vec![t("AAPL")]);
    assert!(d.queue().is_empty());

    settle(&mut d, t0 + Duration::from_secs(1));
    assert!(!d.host().contains(&WindowId::Ticker(t("AAPL"))));
    assert!(!d.registry().has(&t("AAPL")));
    assert!(d.chart(&t("AAPL")).is_none());
    assert_eq!(ticker_windows(&d), BTreeSet::from([t("MSFT")]));
}

#[test]
fn repeated_adds_never_duplicate_windows() {
    let mut d = desk();
    d.add_favorite(t("AAPL"));
    d.add_favorite(t("AAPL"));
    d.set_favorites([t("AAPL"), t("AAPL")]);
    assert_eq!(d.queue().len(), 1);

    let now = settle(&mut d, Instant::now());
    d.set_favorites([t("AAPL"), t("NVDA")]);
    assert_eq!(d.queue().pending().collect::<Vec<_>>(), vec![&t("NVDA")]);
    settle(&mut d, now + Duration::from_secs(1));

    assert_eq!(d.registry().len(), 2);
    assert_eq!(d.host().ids().len(), 2);
}

#[test]
fn lowercase_and_uppercase_name_the_same_window() {
    let mut d = desk();
    d.set_favorites([t("aapl"), t("AAPL"), t(" Aapl ")]);
    settle(&mut d, Instant::now());
    assert_eq!(ticker_windows(&d), BTreeSet::from([t("AAPL")]));
}

/// Small deterministic generator so the mutation sequence is reproducible.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }
}

#[test]
fn arbitrary_mutations_converge_to_the_watchlist() {
    let pool = ["AAPL", "MSFT", "GOOG", "NVDA", "TSLA", "AMZN", "META", "SPY"];
    for seed in 1..=20u64 {
        let mut rng = Lcg(seed);
        let mut d = desk();
        let mut now = Instant::now();
        for _ in 0..40 {
            let ticker = t(pool[(rng.next() % pool.len() as u64) as usize]);
            match rng.next() % 4 {
                0 | 1 => {
                    d.add_favorite(ticker);
                }
                2 => {
                    d.remove_favorite(&ticker);
                }
                _ => {
                    let keep: Vec<Ticker> = pool
                        .iter()
                        .filter(|_| rng.next() % 2 == 0)
                        .map(|s| t(s))
                        .collect();
                    d.set_favorites(keep);
                }
            }
            if rng.next() % 3 == 0 {
                d.tick(now);
            }
            now += Duration::from_millis(rng.next() % 400);
        }
        settle(&mut d, now);

        let desired: BTreeSet<Ticker> = d.desired().iter().cloned().collect();
        let registry: BTreeSet<Ticker> = d.registry().iter().cloned().collect();
        assert_eq!(ticker_windows(&d), desired, "seed {seed}");
        assert_eq!(registry, desired, "seed {seed}");
        assert!(d.is_settled());
        assert_eq!(d.embedder().live_count(), desired.len());
    }
}
