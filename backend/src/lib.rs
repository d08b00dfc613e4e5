use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use futures::{SinkExt, StreamExt};
use game_core::{GameView, Intent, Roster, RosterError};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

pub mod config;
pub mod session;
pub mod store;

pub use config::PickerConfig;
pub use session::{ServerMessage, SessionError, SessionHandle};
pub use store::RosterStore;

#[derive(Clone)]
pub struct AppState {
    session: SessionHandle,
    roster: Arc<RwLock<Roster>>,
    defaults: Roster,
    store: RosterStore,
}

impl AppState {
    /// Loads the saved participant list (falling back to the configured
    /// defaults) and starts the game session.
    pub async fn new(config: &PickerConfig) -> Result<Self, RosterError> {
        let defaults = Roster::new(&config.default_names)?;
        let store = RosterStore::new(config.persist_path.clone());
        let roster = store.load().await.unwrap_or_else(|| defaults.clone());
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        tracing::info!(participants = roster.len(), seeded = config.seed.is_some(), "starting game");
        let session = SessionHandle::spawn(roster.clone(), rng, config.game, config.audio.clone());
        Ok(Self {
            session,
            roster: Arc::new(RwLock::new(roster)),
            defaults,
            store,
        })
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub async fn roster(&self) -> Roster {
        self.roster.read().await.clone()
    }

    /// Applies an edit to the participant list, persists it and starts a
    /// new game with the result.
    async fn update_roster(
        &self,
        edit: impl FnOnce(&mut Roster) -> Result<(), RosterError>,
    ) -> Result<Roster, ApiError> {
        let mut roster = self.roster.write().await;
        let mut updated = roster.clone();
        edit(&mut updated)?;
        self.store.save(&updated).await;
        self.session.replace_roster(updated.clone()).await?;
        *roster = updated.clone();
        tracing::info!(participants = updated.len(), "names updated");
        Ok(updated)
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/state", get(get_state))
        .route("/intent", post(post_intent))
        .route("/game/reset", post(reset_game))
        .route("/names", get(get_names).post(add_name))
        .route("/names/reset", post(reset_names))
        .route("/names/:name", delete(remove_name))
        .route("/ws", get(ws_handler))
        .with_state(state)
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Roster(RosterError::DuplicateName(_)) => StatusCode::CONFLICT,
            ApiError::Roster(RosterError::UnknownName(_)) => StatusCode::NOT_FOUND,
            ApiError::Roster(_) => StatusCode::BAD_REQUEST,
            ApiError::Session(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, self.to_string()).into_response()
    }
}

#[derive(Deserialize)]
struct AddNameRequest {
    name: String,
}

#[derive(Serialize)]
struct NamesResponse {
    names: Vec<String>,
}

impl From<Roster> for NamesResponse {
    fn from(roster: Roster) -> Self {
        Self {
            names: roster.into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    Intent { intent: Intent },
}

async fn get_state(State(state): State<AppState>) -> Result<Json<GameView>, ApiError> {
    Ok(Json(state.session.snapshot().await?))
}

async fn post_intent(
    State(state): State<AppState>,
    Json(intent): Json<Intent>,
) -> Result<Json<GameView>, ApiError> {
    Ok(Json(state.session.intent(intent).await?))
}

async fn reset_game(State(state): State<AppState>) -> Result<Json<GameView>, ApiError> {
    tracing::info!("game reset requested");
    Ok(Json(state.session.reset_game().await?))
}

async fn get_names(State(state): State<AppState>) -> Json<NamesResponse> {
    Json(state.roster().await.into())
}

async fn add_name(
    State(state): State<AppState>,
    Json(payload): Json<AddNameRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let roster = state
        .update_roster(|roster| roster.add(&payload.name).map(|_| ()))
        .await?;
    Ok((StatusCode::CREATED, Json(NamesResponse::from(roster))))
}

async fn remove_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<NamesResponse>, ApiError> {
    let roster = state.update_roster(|roster| roster.remove(&name)).await?;
    Ok(Json(roster.into()))
}

async fn reset_names(State(state): State<AppState>) -> Result<Json<NamesResponse>, ApiError> {
    let defaults = state.defaults.clone();
    let roster = state
        .update_roster(|roster| {
            *roster = defaults;
            Ok(())
        })
        .await?;
    Ok(Json(roster.into()))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(stream: WebSocket, state: AppState) {
    let connection_id = Uuid::new_v4();
    tracing::info!(%connection_id, "screen connected");

    let (sender, mut receiver) = stream.split();
    let sender = Arc::new(tokio::sync::Mutex::new(sender));
    let rx = state.session.subscribe();

    let greeting = state.session.catch_up().await.unwrap_or_else(|err| {
        vec![ServerMessage::Error {
            message: err.to_string(),
        }]
    });
    for message in &greeting {
        if send_json(&sender, message).await.is_err() {
            return;
        }
    }

    // Task to forward broadcasts
    let sender_clone = sender.clone();
    let mut send_task = tokio::spawn(async move {
        let mut rx = rx;
        loop {
            match rx.recv().await {
                Ok(msg) => {
                    if send_json(&sender_clone, &msg).await.is_err() {
                        break;
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(%connection_id, skipped, "screen lagging behind");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let session = state.session.clone();
    let sender_err = sender.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            let text = match message {
                Message::Text(text) => text,
                Message::Close(_) => break,
                _ => continue,
            };
            let result = match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Intent { intent }) => {
                    session.intent(intent).await.map(|_| ()).map_err(|e| e.to_string())
                }
                Err(err) => Err(format!("invalid message: {err}")),
            };
            if let Err(message) = result {
                tracing::debug!(%connection_id, %message, "rejected client message");
                let _ = send_json(&sender_err, &ServerMessage::Error { message }).await;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    tracing::info!(%connection_id, "screen disconnected");
}

async fn send_json<S>(sender: &tokio::sync::Mutex<S>, message: &ServerMessage) -> Result<(), ()>
where
    S: futures::Sink<Message> + Unpin,
{
    let text = serde_json::to_string(message).map_err(|err| {
        tracing::warn!(error = %err, "could not encode server message");
    })?;
    sender.lock().await.send(Message::Text(text)).await.map_err(|_| ())
}
