use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json,
    },
    routing::{delete, get, post},
    Router,
};
use fixchain_session::UsageSummary;
use futures::StreamExt;
use serde_json::{json, Value};
use tokio_stream::wrappers::ReceiverStream;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer};

use crate::{AppState, AuthUser, ChatRequest, Exchange, ServerError};

const SERVICE_NAME: &str = "Fixchain Repair Assistant";
const MAX_BODY_BYTES: usize = 64 * 1024;
pub const SESSION_ID_HEADER: &str = "x-session-id";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/api/sessions", post(create_session).get(list_sessions))
        .route("/api/sessions/:session_id", delete(delete_session))
        .route("/api/sessions/:session_id/messages", get(session_messages))
        .route("/api/sessions/:session_id/cancel", post(cancel_exchange))
        .route("/api/chat/stream", post(chat_stream))
        .route("/api/usage", get(usage))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

/// CORS for the browser frontend at `origin`.
pub fn cors_layer(origin: &str) -> Result<CorsLayer, ServerError> {
    let origin = HeaderValue::from_str(origin)
        .map_err(|err| ServerError::Config(format!("allowed origin '{origin}': {err}")))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers([HeaderName::from_static(SESSION_ID_HEADER)]))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn ensure_owner(
    state: &AppState,
    session_id: &str,
    user_id: &str,
) -> Result<(), ServerError> {
    match state.history.session_owner(session_id).await? {
        Some(owner) if owner == user_id => Ok(()),
        _ => Err(ServerError::NotFound("Session")),
    }
}

async fn create_session(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, ServerError> {
    let session = state.history.create_session(&user_id).await?;
    tracing::info!(session_id = %session.session_id, user_id = %user_id, "created session");
    Ok(Json(session))
}

async fn list_sessions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Value>, ServerError> {
    let sessions = state.history.list_sessions(&user_id).await?;
    Ok(Json(json!({ "sessions": sessions })))
}

async fn session_messages(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, ServerError> {
    ensure_owner(&state, &session_id, &user_id).await?;
    let messages = state.history.load(&session_id).await?;
    Ok(Json(json!({ "messages": messages })))
}

async fn delete_session(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, ServerError> {
    ensure_owner(&state, &session_id, &user_id).await?;
    state.active.cancel(&session_id);
    if !state.history.delete_session(&session_id).await? {
        return Err(ServerError::NotFound("Session"));
    }
    Ok(Json(json!({ "message": "Session deleted successfully" })))
}

async fn cancel_exchange(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, ServerError> {
    ensure_owner(&state, &session_id, &user_id).await?;
    let cancelled = state.active.cancel(&session_id);
    Ok(Json(json!({ "cancelled": cancelled })))
}

async fn chat_stream(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(request): Json<ChatRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let exchange = Exchange::open(&state, user_id, request).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static("x-accel-buffering"),
        HeaderValue::from_static("no"),
    );
    if let Ok(value) = HeaderValue::from_str(&exchange.session_id) {
        headers.insert(HeaderName::from_static(SESSION_ID_HEADER), value);
    }

    let events = ReceiverStream::new(exchange.spawn(state))
        .map(|event| Ok::<_, Infallible>(Event::default().data(event.to_json())));
    Ok((headers, Sse::new(events).keep_alive(KeepAlive::default())))
}

async fn usage(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UsageSummary>, ServerError> {
    Ok(Json(state.usage.total(&user_id).await?))
}
