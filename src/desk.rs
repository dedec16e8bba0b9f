//! The desk ties the window core together.
//!
//! Watchlist edits go through [`Desk::set_favorites`], [`Desk::add_favorite`]
//! and [`Desk::remove_favorite`]; each one reconciles immediately. Removals
//! happen on the spot, additions wait in the creation queue until
//! [`Desk::tick`] materializes them one at a time.

use std::collections::BTreeMap;
use std::time::Instant;

use crate::chat::{ChatWidgetInjector, Mount, Role, Transcript};
use crate::config::DeskConfig;
use crate::constants::{TICKER_WINDOW_HEIGHT, TICKER_WINDOW_WIDTH};
use crate::desired::DesiredSet;
use crate::embed::{ChartEmbedder, ChartTheme, ContainerId, EmbedOptions, Interval};
use crate::error::{DeskError, DeskResult};
use crate::host::WindowHost;
use crate::queue::{CreationQueue, Drained};
use crate::reconcile::{ReconcilePlan, ReconciliationEngine};
use crate::registry::WidgetRegistry;
use crate::stack::StackOrder;
use crate::window::{
    HitRegion, PointerEvent, PointerKind, Ticker, UtilityKind, WindowController, WindowId,
    WindowSpec,
};

/// The chart living inside a ticker window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerChart {
    pub container: ContainerId,
    pub options: EmbedOptions,
    pub mount: Mount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerOutcome {
    /// Nothing on the desk reacted.
    Ignored,
    /// Drag, resize or activation.
    Handled,
    /// The close control was pressed and the window is gone.
    Closed(WindowId),
    /// The interval selector advanced and the chart was re-embedded.
    IntervalChanged { ticker: Ticker, interval: Interval },
}

pub struct Desk<H: WindowHost, E: ChartEmbedder> {
    host: H,
    embedder: E,
    stack: StackOrder,
    controller: WindowController,
    registry: WidgetRegistry,
    queue: CreationQueue,
    desired: DesiredSet,
    engine: ReconciliationEngine,
    charts: BTreeMap<Ticker, TickerChart>,
    theme: ChartTheme,
    transcript: Transcript,
    injector: ChatWidgetInjector,
}

impl<H: WindowHost, E: ChartEmbedder> Desk<H, E> {
    pub fn new(host: H, embedder: E, config: &DeskConfig) -> Self {
        Self {
            host,
            embedder,
            stack: StackOrder::new(),
            controller: WindowController::new(config.min_width, config.min_height),
            registry: WidgetRegistry::new(),
            queue: CreationQueue::new(config.creation_delay),
            desired: DesiredSet::new(),
            engine: ReconciliationEngine::new(),
            charts: BTreeMap::new(),
            theme: config.theme,
            transcript: Transcript::new(),
            injector: ChatWidgetInjector::new(Interval::default(), config.theme),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    pub fn stack(&self) -> &StackOrder {
        &self.stack
    }

    pub fn controller(&self) -> &WindowController {
        &self.controller
    }

    pub fn registry(&self) -> &WidgetRegistry {
        &self.registry
    }

    pub fn queue(&self) -> &CreationQueue {
        &self.queue
    }

    pub fn desired(&self) -> &DesiredSet {
        &self.desired
    }

    pub fn chart(&self, ticker: &Ticker) -> Option<&TickerChart> {
        self.charts.get(ticker)
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn transcript_mut(&mut self) -> &mut Transcript {
        &mut self.transcript
    }

    pub fn active(&self) -> Option<&WindowId> {
        self.stack.active()
    }

    /// No reconciliation outstanding and nothing waiting to be created.
    pub fn is_settled(&self) -> bool {
        !self.engine.is_stale(&self.desired) && self.queue.is_empty()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.next_deadline()
    }

    /// Replace the watchlist mirror, e.g. after `GET /api/favorites`.
    pub fn set_favorites<I: IntoIterator<Item = Ticker>>(&mut self, tickers: I) -> ReconcilePlan {
        self.desired.replace(tickers);
        self.reconcile()
    }

    pub fn add_favorite(&mut self, ticker: Ticker) -> ReconcilePlan {
        self.desired.insert(ticker);
        self.reconcile()
    }

    pub fn remove_favorite(&mut self, ticker: &Ticker) -> ReconcilePlan {
        self.desired.remove(ticker);
        self.reconcile()
    }

    /// Apply the diff between the watchlist and the mounted windows. A no-op
    /// when the watchlist has not changed since the last pass.
    pub fn reconcile(&mut self) -> ReconcilePlan {
        if !self.engine.is_stale(&self.desired) {
            return ReconcilePlan::default();
        }
        let plan = self
            .engine
            .plan(&self.desired, &self.registry, &self.queue);
        for ticker in &plan.removals {
            self.unmount(ticker);
        }
        for ticker in &plan.additions {
            self.queue.enqueue(ticker.clone(), &self.registry);
        }
        if !plan.is_empty() {
            tracing::info!(
                added = plan.additions.len(),
                removed = plan.removals.len(),
                revision = self.desired.revision(),
                "reconciled watchlist"
            );
        }
        plan
    }

    /// Tear down everything belonging to `ticker`, mounted or still queued.
    fn unmount(&mut self, ticker: &Ticker) {
        let id = WindowId::Ticker(ticker.clone());
        self.controller.detach(&id);
        self.host.destroy(&id);
        self.registry.remove(ticker);
        self.queue.cancel(ticker);
        self.stack.forget(&id, &mut self.host);
        if let Some(chart) = self.charts.remove(ticker) {
            self.embedder.release(&chart.container);
        }
    }

    /// Let the creation queue materialize its head entry if it is due.
    pub fn tick(&mut self, now: Instant) -> Drained {
        let Self {
            host,
            embedder,
            stack,
            controller,
            registry,
            queue,
            charts,
            theme,
            ..
        } = self;
        let mut mounter = Mounter {
            host,
            embedder,
            stack,
            controller,
            registry,
            charts,
            theme: *theme,
        };
        queue.drain(now, |ticker| mounter.mount(ticker))
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) -> PointerOutcome {
        if self
            .controller
            .handle_pointer(event, &mut self.host, &mut self.stack)
        {
            return PointerOutcome::Handled;
        }
        if event.kind != PointerKind::Down {
            return PointerOutcome::Ignored;
        }
        let Some(hit) = self.host.hit_test(event.x, event.y) else {
            return PointerOutcome::Ignored;
        };
        match hit.region {
            HitRegion::Close => {
                if self.close_window(&hit.id) {
                    PointerOutcome::Closed(hit.id)
                } else {
                    PointerOutcome::Ignored
                }
            }
            HitRegion::Select => {
                let Some(ticker) = hit.id.as_ticker().cloned() else {
                    return PointerOutcome::Ignored;
                };
                match self.cycle_interval(&ticker) {
                    Some(interval) => PointerOutcome::IntervalChanged { ticker, interval },
                    None => PointerOutcome::Ignored,
                }
            }
            HitRegion::Title | HitRegion::ResizeHandle | HitRegion::Body => {
                PointerOutcome::Ignored
            }
        }
    }

    /// Open a utility window, or raise it if it is already open. Returns
    /// whether a new window was created.
    pub fn open_utility(&mut self, kind: UtilityKind) -> DeskResult<bool> {
        let id = WindowId::Utility(kind);
        if self.host.contains(&id) {
            self.stack.activate(&id, &mut self.host);
            return Ok(false);
        }
        self.host
            .create(WindowSpec::new(id.clone(), kind.default_rect()))?;
        self.controller.attach(&id, &mut self.host);
        self.stack.activate(&id, &mut self.host);
        Ok(true)
    }

    /// Close the utility if it is the active window, otherwise open or raise
    /// it.
    pub fn toggle_utility(&mut self, kind: UtilityKind) -> DeskResult<bool> {
        let id = WindowId::Utility(kind);
        if self.host.contains(&id) && self.stack.active() == Some(&id) {
            self.close_window(&id);
            return Ok(false);
        }
        self.open_utility(kind)?;
        Ok(true)
    }

    pub fn is_open(&self, id: &WindowId) -> bool {
        self.host.contains(id)
    }

    /// Close a window the way its close control does. Ticker windows leave
    /// the watchlist and go away through reconciliation.
    pub fn close_window(&mut self, id: &WindowId) -> bool {
        let existed = self.host.contains(id);
        match id {
            WindowId::Ticker(ticker) => {
                let removed = self.desired.contains(ticker);
                self.remove_favorite(ticker);
                if self.host.contains(id) {
                    self.unmount(ticker);
                }
                existed || removed
            }
            WindowId::Utility(_) => {
                self.controller.detach(id);
                let destroyed = self.host.destroy(id);
                self.stack.forget(id, &mut self.host);
                destroyed
            }
        }
    }

    /// Advance the interval selector of a ticker window and re-embed its
    /// chart.
    pub fn cycle_interval(&mut self, ticker: &Ticker) -> Option<Interval> {
        let chart = self.charts.get_mut(ticker)?;
        let options = chart
            .options
            .clone()
            .with_interval(chart.options.interval.next());
        chart.mount = match self.embedder.embed(&chart.container, &options) {
            Ok(embed) => Mount::Mounted(embed),
            Err(error) => {
                tracing::warn!(ticker = %ticker, %error, "chart re-embed failed");
                Mount::Failed(error.to_string())
            }
        };
        chart.options = options;
        Some(chart.options.interval)
    }

    /// Raise the window after the active one, wrapping around.
    pub fn cycle_active(&mut self) -> Option<WindowId> {
        let ids = self.host.ids();
        if ids.is_empty() {
            return None;
        }
        let next = match self.stack.active() {
            Some(active) => ids
                .iter()
                .position(|id| id == active)
                .map(|i| (i + 1) % ids.len())
                .unwrap_or(0),
            None => 0,
        };
        let id = ids[next].clone();
        self.stack.activate(&id, &mut self.host)?;
        Some(id)
    }

    /// Record an answer and mount charts into any placeholders it carries.
    pub fn push_answer(&mut self, text: &str, ticker: Option<Ticker>) -> Vec<ContainerId> {
        self.transcript.push_assistant(text, ticker);
        self.injector
            .inject_all(&mut self.transcript, &mut self.embedder)
    }

    /// Replace the transcript with a stored session. Charts mounted in the
    /// previous conversation are released.
    pub fn load_history<I>(&mut self, history: I)
    where
        I: IntoIterator<Item = (Role, String)>,
    {
        self.release_chat_charts();
        self.transcript.load_history(history);
    }

    /// Start an empty conversation.
    pub fn reset_chat(&mut self) {
        self.release_chat_charts();
        self.transcript.clear();
    }

    fn release_chat_charts(&mut self) {
        for message in self.transcript.messages() {
            for placeholder in message.placeholders() {
                if let Mount::Mounted(embed) = &placeholder.mount {
                    self.embedder.release(&embed.container);
                }
            }
        }
    }

    /// Mount one chart into the next empty chat placeholder, if any.
    pub fn inject_chat_widget(&mut self) -> DeskResult<Option<ContainerId>> {
        self.injector
            .inject(&mut self.transcript, &mut self.embedder)
    }

    /// Stop creating windows and release every mounted chart.
    pub fn shutdown(&mut self) {
        self.queue.shutdown();
        for chart in self.charts.values() {
            self.embedder.release(&chart.container);
        }
        self.release_chat_charts();
        tracing::info!(windows = self.registry.len(), "desk shut down");
    }
}

/// Split borrow of the desk used while the queue is draining.
struct Mounter<'a, H: WindowHost, E: ChartEmbedder> {
    host: &'a mut H,
    embedder: &'a mut E,
    stack: &'a mut StackOrder,
    controller: &'a mut WindowController,
    registry: &'a mut WidgetRegistry,
    charts: &'a mut BTreeMap<Ticker, TickerChart>,
    theme: ChartTheme,
}

impl<H: WindowHost, E: ChartEmbedder> Mounter<'_, H, E> {
    fn mount(&mut self, ticker: &Ticker) -> DeskResult<()> {
        let id = WindowId::Ticker(ticker.clone());
        if !self.registry.can_mount(ticker, self.host) {
            return Err(DeskError::DuplicateWindow(id));
        }
        let rect = self
            .host
            .next_placement(TICKER_WINDOW_WIDTH, TICKER_WINDOW_HEIGHT);
        self.host.create(WindowSpec::new(id.clone(), rect))?;
        self.controller.attach(&id, self.host);

        let container = ContainerId::for_ticker(ticker);
        let options = EmbedOptions::new(ticker.clone()).with_theme(self.theme);
        let mount = match self.embedder.embed(&container, &options) {
            Ok(embed) => Mount::Mounted(embed),
            Err(error) => {
                tracing::warn!(ticker = %ticker, %error, "chart embed failed");
                Mount::Failed(error.to_string())
            }
        };
        self.charts.insert(
            ticker.clone(),
            TickerChart {
                container,
                options,
                mount,
            },
        );
        self.registry.add(ticker.clone());
        self.stack.activate(&id, self.host);
        tracing::info!(ticker = %ticker, "materialized window");
        Ok(())
    }
}

impl<H: WindowHost, E: ChartEmbedder> std::fmt::Debug for Desk<H, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Desk")
            .field("desired", &self.desired)
            .field("registry", &self.registry)
            .field("queue", &self.queue)
            .field("active", &self.stack.active())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::TerminalChartEmbedder;
    use crate::host::Desktop;
    use crate::window::{FloatRect, Interaction};
    use std::time::Duration;

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

    fn settle(desk: &mut TestDesk, start: Instant) -> Instant {
        let mut now = start;
        while !desk.queue().is_empty() {
            desk.tick(now);
            now += Duration::from_millis(50);
        }
        now
    }

    #[test]
    fn materialized_window_is_wired_and_active() {
        let mut d = desk();
        d.add_favorite(t("AAPL"));
        assert!(matches!(d.tick(Instant::now()), Drained::Materialized(_)));
        let id = WindowId::Ticker(t("AAPL"));
        let window = d.host().window(&id).unwrap();
        assert!(window.resize_handle);
        assert!(window.active);
        assert_eq!(d.active(), Some(&id));
        assert!(d.registry().has(&t("AAPL")));
        assert!(matches!(
            d.chart(&t("AAPL")).unwrap().mount,
            Mount::Mounted(_)
        ));
        assert!(d.embedder().is_live(&ContainerId::for_ticker(&t("AAPL"))));
    }

    #[test]
    fn removal_releases_chart_and_window() {
        let mut d = desk();
        d.set_favorites([t("AAPL"), t("MSFT")]);
        settle(&mut d, Instant::now());
        let plan = d.remove_favorite(&t("AAPL"));
        assert_eq!(plan.removals, vec![t("AAPL")]);
        assert!(!d.host().contains(&WindowId::Ticker(t("AAPL"))));
        assert!(d.chart(&t("AAPL")).is_none());
        assert_eq!(d.embedder().live_count(), 1);
    }

    #[test]
    fn unchanged_watchlist_does_not_reconcile() {
        let mut d = desk();
        d.set_favorites([t("AAPL")]);
        let plan = d.set_favorites([t("AAPL")]);
        assert!(plan.is_empty());
        assert_eq!(d.queue().len(), 1);
    }

    #[test]
    fn close_control_removes_favorite() {
        let mut d = desk();
        d.add_favorite(t("AAPL"));
        d.tick(Instant::now());
        let rect = d.host().window(&WindowId::Ticker(t("AAPL"))).unwrap().rect;
        let outcome = d.handle_pointer(PointerEvent::down(rect.right() - 4, rect.top + 4));
        assert_eq!(outcome, PointerOutcome::Closed(WindowId::Ticker(t("AAPL"))));
        assert!(d.desired().is_empty());
        assert!(d.registry().is_empty());
        assert!(d.host().is_empty());
    }

    #[test]
    fn select_control_cycles_interval() {
        let mut d = desk();
        d.add_favorite(t("AAPL"));
        d.tick(Instant::now());
        let rect = d.host().window(&WindowId::Ticker(t("AAPL"))).unwrap().rect;
        let outcome = d.handle_pointer(PointerEvent::down(rect.right() - 40, rect.top + 4));
        assert_eq!(
            outcome,
            PointerOutcome::IntervalChanged {
                ticker: t("AAPL"),
                interval: Interval::Week1
            }
        );
        let chart = d.chart(&t("AAPL")).unwrap();
        assert!(matches!(&chart.mount, Mount::Mounted(e) if e.generation == 2));
    }

    #[test]
    fn title_drag_moves_window() {
        let mut d = desk();
        d.open_utility(UtilityKind::Chat).unwrap();
        let id = WindowId::Utility(UtilityKind::Chat);
        let start = d.host().window(&id).unwrap().rect;
        let (x, y) = (start.left + 40, start.top + 4);
        assert_eq!(d.handle_pointer(PointerEvent::down(x, y)), PointerOutcome::Handled);
        assert_eq!(
            d.host().window(&id).unwrap().interaction,
            Interaction::Dragging
        );
        d.handle_pointer(PointerEvent::moved(x + 24, y + 32));
        d.handle_pointer(PointerEvent::up(x + 24, y + 32));
        let moved = d.host().window(&id).unwrap().rect;
        assert_eq!(
            moved,
            FloatRect::new(start.top + 32, start.left + 24, start.width, start.height)
        );
    }

    #[test]
    fn utilities_toggle_and_cycle() {
        let mut d = desk();
        assert!(d.open_utility(UtilityKind::Intel).unwrap());
        assert!(!d.open_utility(UtilityKind::Intel).unwrap());
        d.open_utility(UtilityKind::Pizza).unwrap();
        let next = d.cycle_active().unwrap();
        assert_eq!(next, WindowId::Utility(UtilityKind::Intel));
        assert!(!d.toggle_utility(UtilityKind::Intel).unwrap());
        assert!(!d.is_open(&WindowId::Utility(UtilityKind::Intel)));
        assert!(d.toggle_utility(UtilityKind::Intel).unwrap());
    }

    #[test]
    fn answers_with_marker_mount_inline_charts() {
        let mut d = desk();
        let filled = d.push_answer("chart: [TRADINGVIEW_WIDGET]", Some(t("NVDA")));
        assert_eq!(filled.len(), 1);
        assert!(d.registry().is_empty());
        assert!(d.queue().is_empty());
        assert_eq!(d.inject_chat_widget().unwrap(), None);
    }

    #[test]
    fn restored_history_mounts_and_reset_releases() {
        let mut d = desk();
        d.push_answer("[TRADINGVIEW_WIDGET]", Some(t("TSLA")));
        assert_eq!(d.embedder().live_count(), 1);
        d.load_history([
            (Role::User, "show me aapl".to_string()),
            (Role::Assistant, "[TRADINGVIEW_WIDGET]".to_string()),
        ]);
        assert_eq!(d.transcript().len(), 2);
        assert_eq!(d.transcript().placeholder_count(), 1);
        assert_eq!(d.embedder().live_count(), 0);
        d.push_answer("again [TRADINGVIEW_WIDGET]", Some(t("TSLA")));
        assert_eq!(d.embedder().live_count(), 1);
        d.reset_chat();
        assert!(d.transcript().is_empty());
        assert_eq!(d.embedder().live_count(), 0);
    }

    #[test]
    fn stale_queue_entry_for_a_mounted_ticker_creates_nothing() {
        let mut d = desk();
        d.add_favorite(t("AAPL"));
        let t0 = Instant::now();
        d.tick(t0);
        // Slipped past the registry check, e.g. queued before a mount.
        d.queue.enqueue(t("AAPL"), &WidgetRegistry::new());
        let out = d.tick(t0 + Duration::from_millis(300));
        assert!(matches!(out, Drained::AlreadyMounted(ref x) if *x == t("AAPL")));
        assert_eq!(d.host().len(), 1);
        assert!(d.queue().is_empty());
    }

    #[test]
    fn closing_the_active_window_hands_focus_to_the_next() {
        let mut d = desk();
        d.open_utility(UtilityKind::Chat).unwrap();
        d.set_favorites([t("AAPL"), t("MSFT")]);
        settle(&mut d, Instant::now());
        let msft = WindowId::Ticker(t("MSFT"));
        assert_eq!(d.active(), Some(&msft));

        assert!(d.close_window(&msft));
        let aapl = WindowId::Ticker(t("AAPL"));
        assert_eq!(d.active(), Some(&aapl));
        assert!(d.host().window(&aapl).unwrap().active);
        assert_eq!(d.cycle_interval(&t("AAPL")), Some(Interval::Week1));

        let chat = WindowId::Utility(UtilityKind::Chat);
        d.remove_favorite(&t("AAPL"));
        assert_eq!(d.active(), Some(&chat));
        assert!(d.close_window(&chat));
        assert!(d.active().is_none());
    }

    #[test]
    fn shutdown_discards_pending_windows() {
        let mut d = desk();
        d.set_favorites([t("AAPL"), t("MSFT")]);
        d.tick(Instant::now());
        d.shutdown();
        assert!(d.queue().is_empty());
        assert!(matches!(
            d.tick(Instant::now() + Duration::from_secs(1)),
            Drained::Skipped(_)
        ));
        assert_eq!(d.embedder().live_count(), 0);
    }
}
