//! REST endpoints + per-session WebSocket event stream.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::assistant::{KeyPress, Panel};
use crate::config::AppConfig;
use crate::error::{self, ConfigError, SessionError};
use crate::journey::model::{COLORS, GENDERS, OCCASIONS, STYLES};
use crate::journey::{JourneyView, ProfileField, SelectionField, SkinTone};
use crate::session::{Session, SessionRegistry, SessionView};
use crate::showcase::OUTFITS;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let status = match self {
            SessionError::NotFound { .. } => StatusCode::NOT_FOUND,
            SessionError::InvalidOutfit { .. } | SessionError::InvalidField(_) => {
                StatusCode::BAD_REQUEST
            }
            SessionError::JourneyNotOpen => StatusCode::CONFLICT,
        };
        (status, Json(serde_json::json!({"error": self.to_string()}))).into_response()
    }
}

/// Build the router with all REST and WebSocket routes.
pub fn api_routes(registry: Arc<SessionRegistry>) -> Router {
    let state = AppState { registry };

    Router::new()
        .route("/health", get(health))
        .route("/api/outfits", get(list_outfits))
        .route("/api/journey/options", get(journey_options))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", get(get_session).delete(delete_session))
        .route("/ws/sessions/{id}", get(ws_handler))
        // assistant
        .route("/api/sessions/{id}/panels/{panel}/open", post(open_panel))
        .route("/api/sessions/{id}/panels/{panel}/close", post(close_panel))
        .route("/api/sessions/{id}/panels/{panel}/toggle", post(toggle_panel))
        .route("/api/sessions/{id}/chat/input", put(set_chat_input))
        .route("/api/sessions/{id}/chat", post(submit_chat))
        .route("/api/sessions/{id}/weather/input", put(set_weather_input))
        .route("/api/sessions/{id}/weather", post(submit_weather))
        .route("/api/sessions/{id}/weather/use-in-chat", post(use_weather_in_chat))
        .route("/api/sessions/{id}/keys", post(key_press))
        // showcase
        .route("/api/sessions/{id}/outfits/{index}/like", post(toggle_like))
        // journey
        .route("/api/sessions/{id}/journey", get(get_journey).post(open_journey))
        .route("/api/sessions/{id}/journey/advance", post(advance_journey))
        .route("/api/sessions/{id}/journey/retreat", post(retreat_journey))
        .route("/api/sessions/{id}/journey/fields/{field}", put(set_journey_field))
        .route("/api/sessions/{id}/journey/toggle", post(toggle_journey_selection))
        .route("/api/sessions/{id}/journey/skin-tone", put(select_skin_tone))
        .route("/api/sessions/{id}/journey/submit", post(submit_journey))
        .route("/api/sessions/{id}/journey/cancel", post(cancel_journey))
        .with_state(state)
}

/// The full application: routes plus the CORS policy from `config`.
pub fn app(registry: Arc<SessionRegistry>, config: &AppConfig) -> error::Result<Router> {
    let cors = cors_layer(config)?;
    Ok(api_routes(registry).layer(ServiceBuilder::new().layer(cors)))
}

fn cors_layer(config: &AppConfig) -> Result<CorsLayer, ConfigError> {
    match config.cors_origin.as_deref() {
        None => Ok(CorsLayer::permissive()),
        Some(origin) => {
            let origin =
                HeaderValue::from_str(origin).map_err(|e| ConfigError::InvalidValue {
                    key: "OUTFIT_PLANNER_CORS_ORIGIN".to_string(),
                    message: e.to_string(),
                })?;
            Ok(CorsLayer::new()
                .allow_origin(origin)
                .allow_methods(Any)
                .allow_headers(Any))
        }
    }
}

async fn session(state: &AppState, id: Uuid) -> Result<Arc<Session>, SessionError> {
    state.registry.get(id).await
}

// ── Static content ──────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "outfit-planner"
    }))
}

async fn list_outfits() -> impl IntoResponse {
    Json(OUTFITS.to_vec())
}

#[derive(Serialize)]
struct SkinToneOption {
    tone: SkinTone,
    swatch: &'static str,
}

async fn journey_options() -> impl IntoResponse {
    let option = |(value, label): &(&'static str, &'static str)| {
        serde_json::json!({"value": value, "label": label})
    };
    let skin_tones: Vec<SkinToneOption> = SkinTone::ALL
        .iter()
        .map(|&tone| SkinToneOption {
            tone,
            swatch: tone.swatch(),
        })
        .collect();
    Json(serde_json::json!({
        "colors": COLORS,
        "styles": STYLES,
        "genders": GENDERS.iter().map(option).collect::<Vec<_>>(),
        "occasions": OCCASIONS.iter().map(option).collect::<Vec<_>>(),
        "skin_tones": skin_tones,
    }))
}

// ── Sessions ────────────────────────────────────────────────────────────

async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.registry.create().await;
    (StatusCode::CREATED, Json(session.view().await))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, SessionError> {
    Ok(Json(session(&state, id).await?.view().await))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, SessionError> {
    state.registry.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Assistant ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TextBody {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct Accepted<T> {
    accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<T>,
}

async fn open_panel(
    State(state): State<AppState>,
    Path((id, panel)): Path<(Uuid, Panel)>,
) -> Result<impl IntoResponse, SessionError> {
    let session = session(&state, id).await?;
    session.assistant.open(panel).await;
    Ok(Json(session.assistant.view().await))
}

async fn close_panel(
    State(state): State<AppState>,
    Path((id, panel)): Path<(Uuid, Panel)>,
) -> Result<impl IntoResponse, SessionError> {
    let session = session(&state, id).await?;
    session.assistant.close(panel).await;
    Ok(Json(session.assistant.view().await))
}

async fn toggle_panel(
    State(state): State<AppState>,
    Path((id, panel)): Path<(Uuid, Panel)>,
) -> Result<impl IntoResponse, SessionError> {
    let session = session(&state, id).await?;
    session.assistant.toggle(panel).await;
    Ok(Json(session.assistant.view().await))
}

async fn set_chat_input(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<TextBody>,
) -> Result<StatusCode, SessionError> {
    let session = session(&state, id).await?;
    session
        .assistant
        .set_chat_input(body.text.unwrap_or_default())
        .await;
    Ok(StatusCode::NO_CONTENT)
}

/// Submit chat text (or the input buffer when `text` is absent). Returns
/// as soon as the user message is recorded; the reply arrives as an event.
async fn submit_chat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<TextBody>,
) -> Result<Response, SessionError> {
    let session = session(&state, id).await?;
    let text = match body.text {
        Some(text) => text,
        None => session.assistant.view().await.chat_input,
    };
    let response = match session.assistant.start_chat(&text).await {
        Some(message) => (
            StatusCode::ACCEPTED,
            Json(Accepted {
                accepted: true,
                message: Some(message),
            }),
        )
            .into_response(),
        None => {
            debug!(session_id = %id, "Blank chat submission ignored");
            Json(Accepted::<()> {
                accepted: false,
                message: None,
            })
            .into_response()
        }
    };
    Ok(response)
}

async fn set_weather_input(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<TextBody>,
) -> Result<StatusCode, SessionError> {
    let session = session(&state, id).await?;
    session
        .assistant
        .set_weather_input(body.text.unwrap_or_default())
        .await;
    Ok(StatusCode::NO_CONTENT)
}

async fn submit_weather(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<TextBody>,
) -> Result<Response, SessionError> {
    let session = session(&state, id).await?;
    let city = match body.text {
        Some(city) => city,
        None => session.assistant.view().await.weather_input,
    };
    let accepted = session.assistant.start_weather(&city).await;
    let status = if accepted {
        StatusCode::ACCEPTED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(Accepted::<()> {
            accepted,
            message: None,
        }),
    )
        .into_response())
}

async fn use_weather_in_chat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, SessionError> {
    let session = session(&state, id).await?;
    let response = match session.assistant.use_result_for_chat_prompt().await {
        Some(prompt) => Json(serde_json::json!({"prompt": prompt})).into_response(),
        None => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({"error": "No weather reading to use"})),
        )
            .into_response(),
    };
    Ok(response)
}

async fn key_press(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(key): Json<KeyPress>,
) -> Result<impl IntoResponse, SessionError> {
    let session = session(&state, id).await?;
    let submitted = session.assistant.start_key(&key).await;
    Ok(Json(serde_json::json!({"submitted": submitted})))
}

// ── Showcase ────────────────────────────────────────────────────────────

async fn toggle_like(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> Result<impl IntoResponse, SessionError> {
    let liked = session(&state, id).await?.toggle_like(index).await?;
    Ok(Json(serde_json::json!({"index": index, "liked": liked})))
}

// ── Journey ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ValueBody {
    value: String,
}

#[derive(Debug, Deserialize)]
struct ToggleBody {
    field: SelectionField,
    value: String,
}

#[derive(Debug, Deserialize)]
struct SkinToneBody {
    tone: SkinTone,
}

async fn open_journey(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JourneyView>, SessionError> {
    Ok(Json(session(&state, id).await?.open_journey().await))
}

async fn get_journey(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JourneyView>, SessionError> {
    let view = session(&state, id).await?.with_journey(|j| j.view()).await?;
    Ok(Json(view))
}

async fn advance_journey(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JourneyView>, SessionError> {
    let view = session(&state, id)
        .await?
        .with_journey(|j| {
            j.advance();
            j.view()
        })
        .await?;
    Ok(Json(view))
}

async fn retreat_journey(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JourneyView>, SessionError> {
    let view = session(&state, id)
        .await?
        .with_journey(|j| {
            j.retreat();
            j.view()
        })
        .await?;
    Ok(Json(view))
}

async fn set_journey_field(
    State(state): State<AppState>,
    Path((id, field)): Path<(Uuid, String)>,
    Json(body): Json<ValueBody>,
) -> Result<Json<JourneyView>, SessionError> {
    let field: ProfileField = field.parse()?;
    let view = session(&state, id)
        .await?
        .with_journey(|j| {
            j.set_field(field, body.value);
            j.view()
        })
        .await?;
    Ok(Json(view))
}

async fn toggle_journey_selection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ToggleBody>,
) -> Result<Json<JourneyView>, SessionError> {
    let view = session(&state, id)
        .await?
        .with_journey(|j| {
            j.toggle(body.field, &body.value);
            j.view()
        })
        .await?;
    Ok(Json(view))
}

async fn select_skin_tone(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<SkinToneBody>,
) -> Result<Json<JourneyView>, SessionError> {
    let view = session(&state, id)
        .await?
        .with_journey(|j| {
            j.select_skin_tone(body.tone);
            j.view()
        })
        .await?;
    Ok(Json(view))
}

async fn submit_journey(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, SessionError> {
    session(&state, id).await?.submit_journey().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn cancel_journey(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, SessionError> {
    session(&state, id).await?.cancel_journey().await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── WebSocket ───────────────────────────────────────────────────────────

/// Actions a client may send over the session socket.
#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientAction {
    Key {
        key: String,
        #[serde(default)]
        shift: bool,
    },
    ChatInput { text: String },
    WeatherInput { text: String },
    TogglePanel { panel: Panel },
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SyncMessage {
    SessionSync { session: SessionView },
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, SessionError> {
    let session = session(&state, id).await?;
    info!(session_id = %id, "WebSocket client connecting");
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, session)))
}

async fn send_sync(socket: &mut WebSocket, session: &Session) -> bool {
    let sync = SyncMessage::SessionSync {
        session: session.view().await,
    };
    match serde_json::to_string(&sync) {
        Ok(json) => socket.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            warn!(error = %e, "Failed to serialize session sync");
            true
        }
    }
}

async fn handle_socket(mut socket: WebSocket, session: Arc<Session>) {
    let _connection = session.connect();
    let mut closed = session.closed();
    // subscribe before the sync so no event falls between them
    let mut rx = session.assistant.subscribe();

    if session.is_closed() {
        let _ = socket.send(Message::Close(None)).await;
        return;
    }
    if !send_sync(&mut socket, &session).await {
        warn!(session_id = %session.id, "Failed to send initial sync, client disconnected");
        return;
    }

    loop {
        tokio::select! {
            _ = closed.changed() => {
                info!(session_id = %session.id, "Session removed, closing socket");
                let _ = socket.send(Message::Close(None)).await;
                break;
            }

            result = rx.recv() => {
                match result {
                    Ok(event) => {
                        if let Ok(json) = serde_json::to_string(&event) {
                            if socket.send(Message::Text(json.into())).await.is_err() {
                                debug!("Client disconnected during send");
                                break;
                            }
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        warn!(missed = n, "WS client lagged behind session events");
                        if !send_sync(&mut socket, &session).await {
                            break;
                        }
                    }
                    Err(RecvError::Closed) => {
                        debug!("Session event channel closed");
                        break;
                    }
                }
            }

            result = socket.recv() => {
                match result {
                    Some(Ok(Message::Text(text))) => {
                        handle_client_action(&text, &session).await;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!(session_id = %session.id, "WebSocket client disconnected");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    // idle clock starts when the last socket goes away
    session.touch().await;
    info!(session_id = %session.id, "WebSocket connection closed");
}

async fn handle_client_action(text: &str, session: &Session) {
    session.touch().await;
    match serde_json::from_str::<ClientAction>(text) {
        Ok(ClientAction::Key { key, shift }) => {
            let submitted = session.assistant.start_key(&KeyPress { key, shift }).await;
            debug!(session_id = %session.id, submitted = ?submitted, "Key via WS");
        }
        Ok(ClientAction::ChatInput { text }) => session.assistant.set_chat_input(text).await,
        Ok(ClientAction::WeatherInput { text }) => {
            session.assistant.set_weather_input(text).await
        }
        Ok(ClientAction::TogglePanel { panel }) => {
            session.assistant.toggle(panel).await;
        }
        Err(e) => {
            debug!(error = %e, text = text, "Unrecognized WS message from client");
        }
    }
}
