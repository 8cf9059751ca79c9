//! HTTP surface of the repair assistant: session endpoints, the streaming
//! chat endpoint and the exchange runner that ties a request to one pipeline
//! run and its history.

pub mod auth;
pub mod config;
mod error;
mod exchange;
mod routes;
mod state;

pub use auth::{AuthUser, Authenticator, HeaderAuthenticator};
pub use config::Settings;
pub use error::ServerError;
pub use exchange::{ActiveExchanges, ChatRequest, Exchange, HISTORY_UNAVAILABLE_MESSAGE};
pub use routes::{cors_layer, router, SESSION_ID_HEADER};
pub use state::AppState;
