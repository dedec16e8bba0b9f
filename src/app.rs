//! The running terminal.
//!
//! `App` owns the desk, the backend worker, the pollers and one panel per
//! utility window. Input and backend events are turned into desk operations
//! here; everything is drawn from desk state once per loop iteration.

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{Event, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};

use crate::api::poller::Poller;
use crate::api::worker::{ApiEvent, ApiRequest, ApiWorker, serve};
use crate::api::{ApiClient, Backend};
use crate::chat::{Mount, Role};
use crate::components::debug_log::take_panic_pending;
use crate::components::{
    ChartCard, ChatPanel, Component, ComponentContext, DebugLogComponent, HelpPanel, IntelPanel,
    Intent, PizzaPanel, QuantPanel, SessionsPanel, StatusBar, WatchRow, WatchState,
    WatchlistPanel,
};
use crate::config::{DeskConfig, fresh_session_id};
use crate::constants::FRAME_INTERVAL;
use crate::desk::{Desk, PointerOutcome};
use crate::drivers::{InputDriver, OutputDriver};
use crate::embed::TerminalChartEmbedder;
use crate::error::DeskResult;
use crate::event_loop::{ControlFlow, EventLoop};
use crate::host::{Desktop, WindowHost};
use crate::keybindings::{Action, KeyBindings};
use crate::queue::Drained;
use crate::ui::UiFrame;
use crate::window::chrome::{cell_center_px, cell_rect, content_area, render_chrome, visible_cells};
use crate::window::{PointerEvent, UtilityKind, WindowId};

pub type TerminalDesk = Desk<Desktop, TerminalChartEmbedder>;

struct Panels {
    watchlist: WatchlistPanel,
    chat: ChatPanel,
    sessions: SessionsPanel,
    intel: IntelPanel,
    pizza: PizzaPanel,
    quant: QuantPanel,
    debug_log: DebugLogComponent,
    help: HelpPanel,
}

impl Panels {
    fn get_mut(&mut self, kind: UtilityKind) -> &mut dyn Component {
        match kind {
            UtilityKind::Favorites => &mut self.watchlist,
            UtilityKind::Chat => &mut self.chat,
            UtilityKind::Sessions => &mut self.sessions,
            UtilityKind::Intel => &mut self.intel,
            UtilityKind::Pizza => &mut self.pizza,
            UtilityKind::Quant => &mut self.quant,
            UtilityKind::DebugLog => &mut self.debug_log,
            UtilityKind::Help => &mut self.help,
        }
    }
}

pub struct App {
    config: DeskConfig,
    desk: TerminalDesk,
    bindings: KeyBindings,
    backend: Option<Arc<dyn Backend>>,
    api: Option<ApiWorker>,
    intel_poller: Option<Poller>,
    pizza_poller: Option<Poller>,
    session_id: String,
    panels: Panels,
    status: StatusBar,
    notice: Option<String>,
    chat_dirty: bool,
    /// Bumped on every local watchlist edit. Favorites replies stamped with
    /// an older value describe the server before that edit and are dropped.
    favorites_epoch: u64,
}

impl App {
    /// Build the app against the HTTP backend, or without one in offline
    /// mode.
    pub fn new(config: DeskConfig, debug_log: DebugLogComponent) -> DeskResult<Self> {
        let backend = if config.offline {
            None
        } else {
            let client = ApiClient::new(&config.api_base, config.request_timeout)?;
            tracing::info!(api = client.base(), "using backend");
            Some(Arc::new(client) as Arc<dyn Backend>)
        };
        Self::with_backend(config, debug_log, backend)
    }

    pub fn with_backend(
        config: DeskConfig,
        debug_log: DebugLogComponent,
        backend: Option<Arc<dyn Backend>>,
    ) -> DeskResult<Self> {
        let api = match &backend {
            Some(backend) => Some(ApiWorker::spawn(Arc::clone(backend))?),
            None => None,
        };
        let bindings = KeyBindings::default();
        let panels = Panels {
            watchlist: WatchlistPanel::new(),
            chat: ChatPanel::new(),
            sessions: SessionsPanel::new(),
            intel: IntelPanel::new(),
            pizza: PizzaPanel::new(),
            quant: QuantPanel::new(),
            debug_log,
            help: HelpPanel::new(&bindings),
        };
        let desk = Desk::new(Desktop::new(), TerminalChartEmbedder::new(), &config);
        let session_id = config.session_id.clone();
        let mut app = Self {
            config,
            desk,
            bindings,
            backend,
            api,
            intel_poller: None,
            pizza_poller: None,
            session_id,
            panels,
            status: StatusBar::new(),
            notice: None,
            chat_dirty: true,
            favorites_epoch: 0,
        };
        app.start()?;
        Ok(app)
    }

    fn start(&mut self) -> DeskResult<()> {
        self.desk.open_utility(UtilityKind::Favorites)?;
        self.desk.open_utility(UtilityKind::Chat)?;
        self.panels.chat.set_session_label(self.session_id.clone());
        self.panels.sessions.set_current(&self.session_id);
        if self.api.is_some() {
            self.load_favorites();
            for ticker in self.config.favorites.clone() {
                self.send(ApiRequest::AddFavorite(ticker));
            }
            self.send(ApiRequest::LoadSessions);
            self.send(ApiRequest::LoadHistory(self.session_id.clone()));
        } else {
            self.desk.set_favorites(self.config.favorites.clone());
            self.notice = Some("offline: watchlist edits stay local".to_string());
        }
        Ok(())
    }

    pub fn desk(&self) -> &TerminalDesk {
        &self.desk
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn is_waiting_for_answer(&self) -> bool {
        self.panels.chat.is_waiting()
    }

    /// Queue a backend call. Returns `false` when there is no backend to
    /// call.
    fn send(&mut self, request: ApiRequest) -> bool {
        let Some(api) = &self.api else {
            return false;
        };
        match api.send(request) {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(%error, "backend worker unavailable");
                self.notice = Some(error.to_string());
                false
            }
        }
    }

    /// Requests run in order on one worker, so a reload sent now sees every
    /// edit sent before it.
    fn load_favorites(&mut self) -> bool {
        self.send(ApiRequest::LoadFavorites {
            epoch: self.favorites_epoch,
        })
    }

    /// One loop iteration's worth of background work: backend results,
    /// window creation, pollers and panel state.
    pub fn tick(&mut self, now: Instant) {
        let events = self.api.as_ref().map(ApiWorker::drain).unwrap_or_default();
        for event in events {
            self.apply_event(event);
        }
        if take_panic_pending() {
            if let Err(error) = self.desk.open_utility(UtilityKind::DebugLog) {
                tracing::warn!(%error, "could not open debug log");
            }
            self.notice = Some("a background thread panicked, see the debug log".to_string());
        }
        match self.desk.tick(now) {
            Drained::Materialized(ticker) => tracing::debug!(ticker = %ticker, "window ready"),
            Drained::AlreadyMounted(_) => {}
            Drained::Failed { ticker, error } => {
                self.notice = Some(format!("{ticker}: {error}"));
            }
            Drained::Skipped(_) => {}
        }
        self.sync_pollers();
        self.sync_watchlist();
        if self.chat_dirty {
            self.panels.chat.sync(self.desk.transcript());
            self.chat_dirty = false;
        }
    }

    fn apply_event(&mut self, event: ApiEvent) {
        match event {
            ApiEvent::Favorites { epoch, tickers } => {
                if epoch != self.favorites_epoch {
                    tracing::debug!(epoch, current = self.favorites_epoch, "dropping stale favorites");
                    return;
                }
                self.desk.set_favorites(tickers);
            }
            ApiEvent::FavoriteAdded(_) | ApiEvent::FavoriteRemoved(_) => {
                self.load_favorites();
            }
            ApiEvent::Answer(answer) => {
                self.panels.chat.set_waiting(false);
                self.desk.push_answer(&answer.answer_text, answer.ticker());
                self.chat_dirty = true;
                self.send(ApiRequest::LoadSessions);
            }
            ApiEvent::Sessions(sessions) => self.panels.sessions.set_sessions(sessions),
            ApiEvent::History {
                session_id,
                messages,
            } => {
                if session_id != self.session_id {
                    tracing::debug!(session = %session_id, "dropping stale history");
                    return;
                }
                self.desk.load_history(
                    messages
                        .into_iter()
                        .map(|m| (Role::parse(&m.role), m.content)),
                );
                self.chat_dirty = true;
            }
            ApiEvent::SessionDeleted(id) => {
                if id == self.session_id {
                    self.start_new_session();
                }
                self.send(ApiRequest::LoadSessions);
            }
            ApiEvent::Surface { ticker, surface } => self.panels.quant.set_surface(ticker, surface),
            ApiEvent::Intel(items) => self.panels.intel.set_items(&items),
            ApiEvent::Pizza(readings) => self.panels.pizza.set_readings(readings),
            ApiEvent::Failed { request, message } => {
                self.notice = Some(format!("{} failed: {message}", request.label()));
                match request {
                    ApiRequest::Query { .. } => {
                        self.panels.chat.set_waiting(false);
                        self.desk
                            .transcript_mut()
                            .push_system(&format!("The request failed: {message}"));
                        self.chat_dirty = true;
                    }
                    ApiRequest::LoadSurface(_) => self.panels.quant.set_error(message),
                    ApiRequest::AddFavorite(ticker) => {
                        self.desk.remove_favorite(&ticker);
                        self.load_favorites();
                    }
                    ApiRequest::RemoveFavorite(ticker) => {
                        self.desk.add_favorite(ticker);
                        self.load_favorites();
                    }
                    _ => {}
                }
            }
        }
    }

    fn start_new_session(&mut self) {
        self.session_id = fresh_session_id();
        self.desk.reset_chat();
        self.panels.chat.set_session_label(self.session_id.clone());
        self.panels.sessions.set_current(&self.session_id);
        self.chat_dirty = true;
    }

    /// Pollers run only while their window is open.
    fn sync_pollers(&mut self) {
        let intel_open = self.desk.is_open(&WindowId::Utility(UtilityKind::Intel));
        let pizza_open = self.desk.is_open(&WindowId::Utility(UtilityKind::Pizza));
        Self::ensure_poller(
            &mut self.intel_poller,
            intel_open,
            "intel",
            self.config.intel_interval,
            ApiRequest::LoadIntel,
            self.backend.as_ref(),
            self.api.as_ref(),
        );
        Self::ensure_poller(
            &mut self.pizza_poller,
            pizza_open,
            "pizza",
            self.config.pizza_interval,
            ApiRequest::LoadPizza,
            self.backend.as_ref(),
            self.api.as_ref(),
        );
    }

    fn ensure_poller(
        slot: &mut Option<Poller>,
        wanted: bool,
        name: &'static str,
        interval: Duration,
        request: ApiRequest,
        backend: Option<&Arc<dyn Backend>>,
        api: Option<&ApiWorker>,
    ) {
        if !wanted {
            if let Some(poller) = slot.take() {
                poller.cancel();
            }
            return;
        }
        if slot.is_some() {
            return;
        }
        let (Some(backend), Some(api)) = (backend, api) else {
            return;
        };
        let backend = Arc::clone(backend);
        let events = api.event_sender();
        let job = move || events.send(serve(backend.as_ref(), request.clone())).is_ok();
        match Poller::spawn(name, interval, job) {
            Ok(poller) => *slot = Some(poller),
            Err(error) => tracing::warn!(poller = name, %error, "could not start poller"),
        }
    }

    fn sync_watchlist(&mut self) {
        let rows = self
            .desk
            .desired()
            .iter()
            .map(|ticker| {
                let state = match self.desk.chart(ticker) {
                    Some(chart) if matches!(chart.mount, Mount::Failed(_)) => {
                        WatchState::ChartFailed
                    }
                    Some(_) => WatchState::Open,
                    None => WatchState::Queued,
                };
                WatchRow {
                    ticker: ticker.clone(),
                    state,
                }
            })
            .collect();
        self.panels.watchlist.sync(rows);
    }

    pub fn handle_event(&mut self, event: &Event) -> ControlFlow {
        match event {
            Event::Key(key) => self.handle_key(key, event),
            Event::Mouse(mouse) => {
                self.handle_mouse(mouse);
                ControlFlow::Continue
            }
            _ => ControlFlow::Continue,
        }
    }

    fn handle_key(&mut self, key: &KeyEvent, event: &Event) -> ControlFlow {
        if let Some(action) = self.bindings.action_for_key(key) {
            return self.run_action(action);
        }
        if let Some(WindowId::Utility(kind)) = self.desk.active().cloned() {
            let ctx = ComponentContext::new(true);
            let panel = self.panels.get_mut(kind);
            panel.handle_event(event, &ctx);
            if let Some(intent) = panel.take_intent() {
                self.handle_intent(intent);
            }
        }
        ControlFlow::Continue
    }

    fn run_action(&mut self, action: Action) -> ControlFlow {
        tracing::trace!(%action, "key action");
        match action {
            Action::Quit => return ControlFlow::Quit,
            Action::CycleWindow => {
                self.desk.cycle_active();
            }
            Action::CloseWindow => {
                if let Some(id) = self.desk.active().cloned()
                    && self.desk.close_window(&id)
                {
                    self.on_closed(id);
                }
            }
            Action::CycleInterval => {
                if let Some(WindowId::Ticker(ticker)) = self.desk.active().cloned()
                    && let Some(interval) = self.desk.cycle_interval(&ticker)
                {
                    self.notice = Some(format!("{ticker} interval {}", interval.label()));
                }
            }
            Action::Toggle(kind) => match self.desk.toggle_utility(kind) {
                Ok(true) if kind == UtilityKind::Sessions => {
                    self.send(ApiRequest::LoadSessions);
                }
                Ok(_) => {}
                Err(error) => self.notice = Some(error.to_string()),
            },
            Action::Refresh => self.refresh_active(),
        }
        ControlFlow::Continue
    }

    fn refresh_active(&mut self) {
        let request = match self.desk.active() {
            Some(WindowId::Utility(kind)) => match kind {
                UtilityKind::Favorites => Some(ApiRequest::LoadFavorites {
                    epoch: self.favorites_epoch,
                }),
                UtilityKind::Chat => Some(ApiRequest::LoadHistory(self.session_id.clone())),
                UtilityKind::Sessions => Some(ApiRequest::LoadSessions),
                UtilityKind::Intel => Some(ApiRequest::LoadIntel),
                UtilityKind::Pizza => Some(ApiRequest::LoadPizza),
                UtilityKind::Quant => self
                    .panels
                    .quant
                    .loading()
                    .cloned()
                    .map(ApiRequest::LoadSurface),
                UtilityKind::DebugLog | UtilityKind::Help => None,
            },
            Some(WindowId::Ticker(_)) | None => Some(ApiRequest::LoadFavorites {
                epoch: self.favorites_epoch,
            }),
        };
        if let Some(request) = request
            && !self.send(request)
        {
            self.notice = Some("offline: nothing to refresh".to_string());
        }
    }

    /// A window went away through its close control or the close key.
    fn on_closed(&mut self, id: WindowId) {
        tracing::debug!(window = %id, "window closed");
        if let WindowId::Ticker(ticker) = id {
            self.favorites_epoch += 1;
            self.send(ApiRequest::RemoveFavorite(ticker));
        }
    }

    fn handle_mouse(&mut self, mouse: &MouseEvent) {
        let (x, y) = cell_center_px(mouse.column, mouse.row);
        let pointer = match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => Some(PointerEvent::down(x, y)),
            MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
                Some(PointerEvent::moved(x, y))
            }
            MouseEventKind::Up(MouseButton::Left) => Some(PointerEvent::up(x, y)),
            _ => None,
        };
        if let Some(pointer) = pointer {
            match self.desk.handle_pointer(pointer) {
                PointerOutcome::Closed(id) => self.on_closed(id),
                PointerOutcome::IntervalChanged { ticker, interval } => {
                    self.notice = Some(format!("{ticker} interval {}", interval.label()));
                }
                PointerOutcome::Handled | PointerOutcome::Ignored => {}
            }
            return;
        }
        let Some(hit) = self.desk.host().hit_test(x, y) else {
            return;
        };
        if let WindowId::Utility(kind) = &hit.id {
            let focused = self.desk.active() == Some(&hit.id);
            let ctx = ComponentContext::new(focused)
                .with_capturing(self.desk.controller().is_capturing());
            self.panels
                .get_mut(*kind)
                .handle_event(&Event::Mouse(*mouse), &ctx);
        }
    }

    fn handle_intent(&mut self, intent: Intent) {
        tracing::debug!(?intent, "panel intent");
        match intent {
            // Applied locally at once; a failed call is undone when its
            // `Failed` event comes back.
            Intent::AddFavorite(ticker) => {
                self.favorites_epoch += 1;
                self.desk.add_favorite(ticker.clone());
                self.send(ApiRequest::AddFavorite(ticker));
            }
            Intent::RemoveFavorite(ticker) => {
                self.favorites_epoch += 1;
                self.desk.remove_favorite(&ticker);
                self.send(ApiRequest::RemoveFavorite(ticker));
            }
            Intent::SendQuery(text) => {
                self.desk.transcript_mut().push_user(&text);
                self.chat_dirty = true;
                let request = ApiRequest::Query {
                    text,
                    session_id: self.session_id.clone(),
                };
                if self.send(request) {
                    self.panels.chat.set_waiting(true);
                } else {
                    self.desk
                        .transcript_mut()
                        .push_system("Offline: there is no backend to answer.");
                }
            }
            Intent::OpenSession(id) => {
                if id != self.session_id {
                    self.session_id = id.clone();
                    self.desk.reset_chat();
                    self.panels.chat.set_session_label(id.clone());
                    self.panels.sessions.set_current(&id);
                    self.chat_dirty = true;
                }
                if !self.send(ApiRequest::LoadHistory(id)) {
                    self.notice = Some("offline: history unavailable".to_string());
                }
            }
            Intent::DeleteSession(id) => {
                if !self.send(ApiRequest::DeleteSession(id)) {
                    self.notice = Some("offline: sessions are read-only".to_string());
                }
            }
            Intent::LoadSurface(ticker) => {
                if !self.send(ApiRequest::LoadSurface(ticker)) {
                    self.panels.quant.set_error("offline: no surface data");
                }
            }
        }
    }

    pub fn render(&mut self, frame: &mut UiFrame<'_>) {
        let area = frame.area();
        if area.width == 0 || area.height == 0 {
            return;
        }
        let desk_area = Rect {
            height: area.height.saturating_sub(1),
            ..area
        };
        let background = Style::default().bg(Color::Black);
        frame.fill(desk_area, background);

        let capturing = self.desk.controller().is_capturing();
        let empty = Mount::Empty;
        let desk = &self.desk;
        let panels = &mut self.panels;
        for window in desk.host().draw_order() {
            let cells = visible_cells(cell_rect(window.rect), desk_area);
            if cells.width == 0 || cells.height == 0 {
                continue;
            }
            frame.fill(cells, background);
            let chart = window.id.as_ticker().and_then(|t| desk.chart(t));
            let label = chart.map(|c| c.options.interval.label());
            render_chrome(frame, window, desk_area, label);

            let inner = content_area(window, desk_area);
            if inner.width == 0 || inner.height == 0 {
                continue;
            }
            let ctx = ComponentContext::new(window.active).with_capturing(capturing);
            match &window.id {
                WindowId::Ticker(_) => {
                    let card = match chart {
                        Some(c) => ChartCard::new(Some(&c.options), &c.mount),
                        None => ChartCard::new(None, &empty),
                    };
                    frame.render_widget(card, inner);
                }
                WindowId::Utility(kind) => panels.get_mut(*kind).render(frame, inner, &ctx),
            }
        }

        self.status.set_left(format!(
            " {} watching · {} queued · {}",
            self.desk.desired().len(),
            self.desk.queue().len(),
            self.session_id,
        ));
        let hint = format!(
            "{} help · {} quit ",
            self.bindings
                .combos_for(Action::Toggle(UtilityKind::Help))
                .join("/"),
            self.bindings.combos_for(Action::Quit).join("/"),
        );
        self.status
            .set_right(self.notice.clone().map(|n| format!("{n} ")).unwrap_or(hint));
        let bar = Rect {
            y: area.bottom() - 1,
            height: 1,
            ..area
        };
        self.status.render(frame, bar, &ComponentContext::default());
    }

    /// Stop pollers, the backend worker and the creation queue, and release
    /// every chart.
    pub fn shutdown(&mut self) {
        for poller in [self.intel_poller.take(), self.pizza_poller.take()]
            .into_iter()
            .flatten()
        {
            poller.cancel();
        }
        if let Some(mut api) = self.api.take() {
            api.shutdown();
        }
        self.desk.shutdown();
    }

    /// Drive the app until quit. The output driver is left in its normal
    /// state on return, even when the loop fails.
    pub fn run<I, O>(mut self, input: I, output: &mut O) -> io::Result<()>
    where
        I: InputDriver,
        O: OutputDriver,
    {
        output.enter()?;
        let mut event_loop = EventLoop::new(input, FRAME_INTERVAL);
        event_loop.driver().set_mouse_capture(true)?;
        let result = event_loop.run(|_, event| match event {
            None => {
                self.tick(Instant::now());
                output.draw(|mut frame| self.render(&mut frame))?;
                Ok(ControlFlow::Continue)
            }
            Some(event) => Ok(self.handle_event(&event)),
        });
        self.shutdown();
        let _ = event_loop.driver().set_mouse_capture(false);
        output.exit()?;
        result
    }
}
