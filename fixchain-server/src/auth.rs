//! Who is calling. Credentials are checked here and nowhere else; handlers only
//! ever see the resulting user id.

use std::collections::HashMap;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use crate::{AppState, ServerError};

#[async_trait::async_trait]
pub trait Authenticator: Send + Sync + 'static {
    async fn authenticate(&self, headers: &HeaderMap) -> Result<String, ServerError>;
}

/// Bearer tokens mapped to user ids, fixed at startup.
#[derive(Clone, Debug, Default)]
pub struct HeaderAuthenticator {
    tokens: HashMap<String, String>,
}

impl HeaderAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, user_id: impl Into<String>) -> Self {
        self.tokens.insert(token.into(), user_id.into());
        self
    }

    /// Parses `token=user,token=user`; blank entries are skipped.
    pub fn from_pairs(pairs: &str) -> Result<Self, ServerError> {
        let mut auth = Self::new();
        for pair in pairs.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (token, user) = pair.split_once('=').ok_or_else(|| {
                ServerError::Config(format!("token entry '{pair}' is not token=user"))
            })?;
            let (token, user) = (token.trim(), user.trim());
            if token.is_empty() || user.is_empty() {
                return Err(ServerError::Config(format!(
                    "token entry '{pair}' has an empty side"
                )));
            }
            auth = auth.with_token(token, user);
        }
        Ok(auth)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait::async_trait]
impl Authenticator for HeaderAuthenticator {
    async fn authenticate(&self, headers: &HeaderMap) -> Result<String, ServerError> {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or(ServerError::Unauthorized)?;
        self.tokens
            .get(token)
            .cloned()
            .ok_or(ServerError::Unauthorized)
    }
}

/// Extractor for the authenticated user id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser(pub String);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        state.auth.authenticate(&parts.headers).await.map(AuthUser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_token_pairs() {
        let auth = HeaderAuthenticator::from_pairs("abc=alice, def=bob,").unwrap();
        assert_eq!(auth.len(), 2);
        assert!(HeaderAuthenticator::from_pairs("abc").is_err());
        assert!(HeaderAuthenticator::from_pairs("=alice").is_err());
    }

    #[tokio::test]
    async fn resolves_bearer_tokens() {
        let auth = HeaderAuthenticator::new().with_token("abc", "alice");
        let mut headers = HeaderMap::new();
        assert!(auth.authenticate(&headers).await.is_err());

        headers.insert(AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert_eq!(auth.authenticate(&headers).await.unwrap(), "alice");

        headers.insert(AUTHORIZATION, "Bearer nope".parse().unwrap());
        assert!(matches!(
            auth.authenticate(&headers).await,
            Err(ServerError::Unauthorized)
        ));
    }
}
