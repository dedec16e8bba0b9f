use std::io;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use super::{Backend, ChatSession, PizzaReading, QueryAnswer, StoredMessage, VolSurface};
use crate::error::{DeskError, DeskResult};
use crate::window::Ticker;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiRequest {
    /// `epoch` is echoed back so replies that predate a local watchlist
    /// edit can be recognised.
    LoadFavorites { epoch: u64 },
    AddFavorite(Ticker),
    RemoveFavorite(Ticker),
    Query { text: String, session_id: String },
    LoadSessions,
    LoadHistory(String),
    DeleteSession(String),
    LoadSurface(Ticker),
    LoadIntel,
    LoadPizza,
}

impl ApiRequest {
    pub fn label(&self) -> &'static str {
        match self {
            ApiRequest::LoadFavorites { .. } => "favorites",
            ApiRequest::AddFavorite(_) => "add favorite",
            ApiRequest::RemoveFavorite(_) => "remove favorite",
            ApiRequest::Query { .. } => "query",
            ApiRequest::LoadSessions => "sessions",
            ApiRequest::LoadHistory(_) => "history",
            ApiRequest::DeleteSession(_) => "delete session",
            ApiRequest::LoadSurface(_) => "surface",
            ApiRequest::LoadIntel => "intel",
            ApiRequest::LoadPizza => "pizza",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiEvent {
    Favorites { epoch: u64, tickers: Vec<Ticker> },
    FavoriteAdded(Ticker),
    FavoriteRemoved(Ticker),
    Answer(QueryAnswer),
    Sessions(Vec<ChatSession>),
    History {
        session_id: String,
        messages: Vec<StoredMessage>,
    },
    SessionDeleted(String),
    Surface {
        ticker: Ticker,
        surface: VolSurface,
    },
    Intel(Vec<StoredMessage>),
    Pizza(Vec<PizzaReading>),
    /// A call failed. The request comes back so its effect can be undone.
    Failed {
        request: ApiRequest,
        message: String,
    },
}

impl ApiEvent {
    fn failed(request: ApiRequest, error: DeskError) -> Self {
        tracing::warn!(request = request.label(), %error, "backend call failed");
        ApiEvent::Failed {
            request,
            message: error.to_string(),
        }
    }
}

/// Run one request against the backend.
pub fn serve<B: Backend + ?Sized>(backend: &B, request: ApiRequest) -> ApiEvent {
    let result = match &request {
        ApiRequest::LoadFavorites { epoch } => backend.favorites().map(|tickers| {
            ApiEvent::Favorites {
                epoch: *epoch,
                tickers,
            }
        }),
        ApiRequest::AddFavorite(t) => backend
            .add_favorite(t)
            .map(|()| ApiEvent::FavoriteAdded(t.clone())),
        ApiRequest::RemoveFavorite(t) => backend
            .remove_favorite(t)
            .map(|()| ApiEvent::FavoriteRemoved(t.clone())),
        ApiRequest::Query { text, session_id } => {
            backend.query(text, session_id).map(ApiEvent::Answer)
        }
        ApiRequest::LoadSessions => backend.sessions().map(ApiEvent::Sessions),
        ApiRequest::LoadHistory(id) => backend.history(id).map(|messages| ApiEvent::History {
            session_id: id.clone(),
            messages,
        }),
        ApiRequest::DeleteSession(id) => backend
            .delete_session(id)
            .map(|()| ApiEvent::SessionDeleted(id.clone())),
        ApiRequest::LoadSurface(t) => backend.surface(t).map(|surface| ApiEvent::Surface {
            ticker: t.clone(),
            surface,
        }),
        ApiRequest::LoadIntel => backend.intel().map(ApiEvent::Intel),
        ApiRequest::LoadPizza => backend.pizza().map(ApiEvent::Pizza),
    };
    result.unwrap_or_else(|error| ApiEvent::failed(request, error))
}

/// Background thread that executes backend calls in order and reports back
/// over a channel the UI loop drains every frame.
pub struct ApiWorker {
    requests: Option<Sender<ApiRequest>>,
    events_tx: Sender<ApiEvent>,
    events: Receiver<ApiEvent>,
    handle: Option<JoinHandle<()>>,
}

impl ApiWorker {
    pub fn spawn<B: Backend + ?Sized>(backend: Arc<B>) -> io::Result<Self> {
        let (req_tx, req_rx) = mpsc::channel::<ApiRequest>();
        let (events_tx, events) = mpsc::channel::<ApiEvent>();
        let out = events_tx.clone();
        let handle = thread::Builder::new()
            .name("api-worker".to_string())
            .spawn(move || {
                for request in req_rx {
                    tracing::debug!(request = request.label(), "backend call");
                    if out.send(serve(backend.as_ref(), request)).is_err() {
                        break;
                    }
                }
            })?;
        Ok(Self {
            requests: Some(req_tx),
            events_tx,
            events,
            handle: Some(handle),
        })
    }

    pub fn send(&self, request: ApiRequest) -> DeskResult<()> {
        self.requests
            .as_ref()
            .ok_or(DeskError::Cancelled)?
            .send(request)
            .map_err(|_| DeskError::Cancelled)
    }

    /// Sender for pollers that report into the same event stream.
    pub fn event_sender(&self) -> Sender<ApiEvent> {
        self.events_tx.clone()
    }

    pub fn try_recv(&self) -> Option<ApiEvent> {
        match self.events.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    pub fn drain(&self) -> Vec<ApiEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    /// Close the request channel and wait for the in-flight call to finish.
    pub fn shutdown(&mut self) {
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ApiWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
