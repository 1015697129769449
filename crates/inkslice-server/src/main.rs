//! InkSlice Stroke Log Server
//!
//! Hosts one append-only stroke log per room and exposes the five gateway operations
//! over HTTP. Clients subscribe to a room's WebSocket to learn when to resync.
//!
//! ## Routes
//!
//! ```text
//! POST   /rooms/{room}/strokes      { "stroke": {..}, "author_id": "alice" }
//! GET    /rooms/{room}/strokes?since=N
//! DELETE /rooms/{room}/strokes
//! POST   /rooms/{room}/undo         { "author_id": "alice" }
//! POST   /rooms/{room}/redo         { "author_id": "alice" }
//! GET    /rooms/{room}/events       (WebSocket)
//! ```
//!
//! Event messages are JSON:
//! ```json
//! { "type": "log_changed", "len": 12 }
//! ```

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use dashmap::DashMap;
use dashmap::mapref::one::RefMut;
use futures_util::{SinkExt, StreamExt};
use inkslice_core::{GatewayError, GatewayResult, Stroke, StrokeId, StrokeLog};
use serde::{Deserialize, Serialize};
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
};
use tokio::sync::broadcast;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, warn};
use uuid::Uuid;

const DEFAULT_PORT: u16 = 3030;
const DEFAULT_CHANNEL_CAPACITY: usize = 256;
const ADDR_VAR: &str = "INKSLICE_ADDR";
const CHANNEL_CAPACITY_VAR: &str = "INKSLICE_CHANNEL_CAPACITY";

/// Server configuration, read from the environment.
#[derive(Debug, Clone, PartialEq)]
struct ServerConfig {
    addr: SocketAddr,
    /// Pending events buffered per room before slow subscribers start lagging.
    channel_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl ServerConfig {
    fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from a variable lookup. Unparseable values fall back to the default.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(ADDR_VAR) {
            match raw.parse() {
                Ok(addr) => config.addr = addr,
                Err(e) => warn!("Ignoring {}={:?}: {}", ADDR_VAR, raw, e),
            }
        }

        if let Some(raw) = lookup(CHANNEL_CAPACITY_VAR) {
            match raw.parse::<usize>() {
                Ok(0) => warn!("Ignoring {}=0: capacity must be positive", CHANNEL_CAPACITY_VAR),
                Ok(capacity) => config.channel_capacity = capacity,
                Err(e) => warn!("Ignoring {}={:?}: {}", CHANNEL_CAPACITY_VAR, raw, e),
            }
        }

        config
    }
}

/// Body of an append request.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AppendRequest {
    stroke: Stroke,
    author_id: String,
}

/// Body of an undo/redo request.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AuthorRequest {
    author_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ListQuery {
    #[serde(default)]
    since: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct AppendResponse {
    /// `false` when the stroke id was already in the log.
    appended: bool,
    len: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StepResponse {
    stroke_id: StrokeId,
    len: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct LogStatus {
    len: usize,
}

/// A message pushed to room subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerMessage {
    /// The room's log changed; `len` is the number of visible strokes.
    LogChanged { len: usize },
}

/// Gateway error rendered as a JSON response
#[derive(Debug)]
struct ApiError(GatewayError);

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            GatewayError::NothingToUndo | GatewayError::NothingToRedo => StatusCode::CONFLICT,
            GatewayError::Rejected(_) => StatusCode::BAD_REQUEST,
            GatewayError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// Room state
struct Room {
    log: StrokeLog,
    /// Broadcast channel for this room
    tx: broadcast::Sender<ServerMessage>,
}

impl Room {
    fn new(channel_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(channel_capacity);
        Self {
            log: StrokeLog::new(),
            tx,
        }
    }

    /// Tell subscribers the log changed. Returns the visible length.
    fn notify(&self) -> usize {
        let len = self.log.active_len();
        // No subscribers is fine.
        let _ = self.tx.send(ServerMessage::LogChanged { len });
        len
    }
}

/// Shared application state
struct AppState {
    rooms: DashMap<String, Room>,
    channel_capacity: usize,
}

impl AppState {
    fn new(channel_capacity: usize) -> Self {
        Self {
            rooms: DashMap::new(),
            channel_capacity,
        }
    }

    fn room_mut(&self, room_id: &str) -> RefMut<'_, String, Room> {
        self.rooms
            .entry(room_id.to_string())
            .or_insert_with(|| Room::new(self.channel_capacity))
    }

    fn append(&self, room_id: &str, stroke: Stroke, author_id: &str) -> AppendResponse {
        let mut room = self.room_mut(room_id);
        let appended = room.log.append(stroke, author_id);
        let len = if appended {
            room.notify()
        } else {
            room.log.active_len()
        };
        AppendResponse { appended, len }
    }

    fn list(&self, room_id: &str, since: usize) -> Vec<Stroke> {
        self.rooms
            .get(room_id)
            .map(|room| room.log.list(since))
            .unwrap_or_default()
    }

    fn undo(&self, room_id: &str, author_id: &str) -> GatewayResult<StepResponse> {
        let mut room = self
            .rooms
            .get_mut(room_id)
            .ok_or(GatewayError::NothingToUndo)?;
        let stroke_id = room.log.undo_last(author_id)?;
        Ok(StepResponse {
            stroke_id,
            len: room.notify(),
        })
    }

    fn redo(&self, room_id: &str, author_id: &str) -> GatewayResult<StepResponse> {
        let mut room = self
            .rooms
            .get_mut(room_id)
            .ok_or(GatewayError::NothingToRedo)?;
        let stroke_id = room.log.redo_last(author_id)?;
        Ok(StepResponse {
            stroke_id,
            len: room.notify(),
        })
    }

    fn clear(&self, room_id: &str) -> LogStatus {
        let mut room = self.room_mut(room_id);
        room.log.clear();
        LogStatus { len: room.notify() }
    }

    fn subscribe(&self, room_id: &str) -> (broadcast::Receiver<ServerMessage>, usize) {
        let room = self.room_mut(room_id);
        (room.tx.subscribe(), room.log.active_len())
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkslice_server=info,tower_http=info".into()),
        )
        .init();

    let config = ServerConfig::from_env();
    let state = Arc::new(AppState::new(config.channel_capacity));
    let app = router(state);

    info!("InkSlice stroke log server listening on {}", config.addr);
    info!("Events endpoint: ws://{}/rooms/{{room}}/events", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route(
            "/rooms/{room}/strokes",
            get(list_strokes).post(append_stroke).delete(clear_strokes),
        )
        .route("/rooms/{room}/undo", post(undo_last))
        .route("/rooms/{room}/redo", post(redo_last))
        .route("/rooms/{room}/events", get(events_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Index page
async fn index() -> &'static str {
    "InkSlice Stroke Log Server - see /rooms/{room}/strokes"
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

async fn append_stroke(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
    Json(req): Json<AppendRequest>,
) -> Json<AppendResponse> {
    let stroke_id = req.stroke.id;
    let response = state.append(&room, req.stroke, &req.author_id);
    if response.appended {
        info!("{} appended {} to room {}", req.author_id, stroke_id, room);
    } else {
        debug!("Duplicate append of {} to room {}", stroke_id, room);
    }
    Json(response)
}

async fn list_strokes(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<Stroke>> {
    Json(state.list(&room, query.since))
}

async fn undo_last(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
    Json(req): Json<AuthorRequest>,
) -> Result<Json<StepResponse>, ApiError> {
    let response = state.undo(&room, &req.author_id)?;
    info!("{} undid {} in room {}", req.author_id, response.stroke_id, room);
    Ok(Json(response))
}

async fn redo_last(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
    Json(req): Json<AuthorRequest>,
) -> Result<Json<StepResponse>, ApiError> {
    let response = state.redo(&room, &req.author_id)?;
    info!("{} redid {} in room {}", req.author_id, response.stroke_id, room);
    Ok(Json(response))
}

async fn clear_strokes(State(state): State<Arc<AppState>>, Path(room): Path<String>) -> Json<LogStatus> {
    info!("Clearing room {}", room);
    Json(state.clear(&room))
}

/// WebSocket upgrade handler
async fn events_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, room))
}

/// Forward a room's change notifications to one subscriber
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, room: String) {
    let subscriber_id = Uuid::new_v4();
    info!("Subscriber {} joined room {}", subscriber_id, room);

    let (mut sender, mut receiver) = socket.split();
    let (mut rx, len) = state.subscribe(&room);

    // Current length first, so the client can resync immediately.
    if send_message(&mut sender, &ServerMessage::LogChanged { len }).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // Subscribers only listen
                    Some(Err(e)) => {
                        warn!("WebSocket error for {}: {}", subscriber_id, e);
                        break;
                    }
                }
            }

            event = rx.recv() => {
                match event {
                    Ok(server_msg) => {
                        if send_message(&mut sender, &server_msg).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!("Subscriber {} lagged by {} event(s)", subscriber_id, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    info!("Subscriber {} left room {}", subscriber_id, room);
}

async fn send_message<S>(sender: &mut S, msg: &ServerMessage) -> Result<(), ()>
where
    S: SinkExt<Message> + Unpin,
{
    let json = serde_json::to_string(msg).map_err(|e| warn!("Could not encode event: {}", e))?;
    sender.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkslice_core::Point;

    fn stroke(author: &str) -> Stroke {
        Stroke::freehand(author, vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)])
    }

    #[test]
    fn test_config_defaults() {
        let config = ServerConfig::from_lookup(|_| None);
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.addr.port(), 3030);
        assert_eq!(config.channel_capacity, 256);
    }

    #[test]
    fn test_config_from_lookup() {
        let config = ServerConfig::from_lookup(|key| match key {
            ADDR_VAR => Some("127.0.0.1:8080".to_string()),
            CHANNEL_CAPACITY_VAR => Some("16".to_string()),
            _ => None,
        });
        assert_eq!(config.addr, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.channel_capacity, 16);
    }

    #[test]
    fn test_config_ignores_bad_values() {
        let config = ServerConfig::from_lookup(|key| match key {
            ADDR_VAR => Some("not an address".to_string()),
            CHANNEL_CAPACITY_VAR => Some("0".to_string()),
            _ => None,
        });
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_rooms_are_isolated() {
        let state = AppState::new(8);
        state.append("a", stroke("alice"), "alice");
        state.append("a", stroke("alice"), "alice");
        state.append("b", stroke("bob"), "bob");

        assert_eq!(state.list("a", 0).len(), 2);
        assert_eq!(state.list("b", 0).len(), 1);
        assert!(state.list("missing", 0).is_empty());
    }

    #[test]
    fn test_duplicate_append_is_acknowledged() {
        let state = AppState::new(8);
        let s = stroke("alice");
        assert!(state.append("a", s.clone(), "alice").appended);
        let again = state.append("a", s, "alice");
        assert!(!again.appended);
        assert_eq!(again.len, 1);
    }

    #[test]
    fn test_undo_redo_per_author() {
        let state = AppState::new(8);
        let a = stroke("alice");
        let b = stroke("bob");
        state.append("r", a.clone(), "alice");
        state.append("r", b.clone(), "bob");

        let undone = state.undo("r", "alice").unwrap();
        assert_eq!(undone.stroke_id, a.id);
        assert_eq!(state.list("r", 0), vec![b]);

        assert_eq!(state.undo("r", "alice").unwrap_err(), GatewayError::NothingToUndo);
        assert_eq!(state.redo("r", "alice").unwrap().len, 2);
        assert_eq!(state.redo("missing", "alice").unwrap_err(), GatewayError::NothingToRedo);
    }

    #[test]
    fn test_mutations_notify_subscribers() {
        let state = AppState::new(8);
        let (mut rx, len) = state.subscribe("r");
        assert_eq!(len, 0);

        state.append("r", stroke("alice"), "alice");
        state.undo("r", "alice").unwrap();
        state.clear("r");

        assert_eq!(rx.try_recv().unwrap(), ServerMessage::LogChanged { len: 1 });
        assert_eq!(rx.try_recv().unwrap(), ServerMessage::LogChanged { len: 0 });
        assert_eq!(rx.try_recv().unwrap(), ServerMessage::LogChanged { len: 0 });
    }

    #[test]
    fn test_error_status_codes() {
        let conflict = ApiError(GatewayError::NothingToUndo).into_response();
        assert_eq!(conflict.status(), StatusCode::CONFLICT);
        let rejected = ApiError(GatewayError::Rejected("bad".into())).into_response();
        assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
        let unavailable = ApiError(GatewayError::Unavailable("down".into())).into_response();
        assert_eq!(unavailable.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_event_wire_format() {
        let json = serde_json::to_string(&ServerMessage::LogChanged { len: 3 }).unwrap();
        assert_eq!(json, r#"{"type":"log_changed","len":3}"#);
    }

    #[tokio::test]
    async fn test_handlers_round_trip() {
        let state = Arc::new(AppState::new(8));
        let s = stroke("alice");

        let Json(appended) = append_stroke(
            State(state.clone()),
            Path("room".to_string()),
            Json(AppendRequest {
                stroke: s.clone(),
                author_id: "alice".to_string(),
            }),
        )
        .await;
        assert_eq!(appended, AppendResponse { appended: true, len: 1 });

        let Json(listed) = list_strokes(
            State(state.clone()),
            Path("room".to_string()),
            Query(ListQuery::default()),
        )
        .await;
        assert_eq!(listed, vec![s.clone()]);

        let Json(step) = undo_last(
            State(state.clone()),
            Path("room".to_string()),
            Json(AuthorRequest {
                author_id: "alice".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(step, StepResponse { stroke_id: s.id, len: 0 });

        let err = undo_last(
            State(state.clone()),
            Path("room".to_string()),
            Json(AuthorRequest {
                author_id: "alice".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);

        let Json(status) = clear_strokes(State(state), Path("room".to_string())).await;
        assert_eq!(status, LogStatus { len: 0 });
    }
}
