use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fixchain_session::SessionError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("missing or invalid credentials")]
    Unauthorized,
    #[error("{0}")]
    BadRequest(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) | Self::Session(SessionError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Config(_) | Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            Self::Session(SessionError::NotFound(_)) => "Session not found".to_string(),
            Self::Session(err) => {
                tracing::error!(error = %err, "history store failed");
                "History store unavailable (see server logs)".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
