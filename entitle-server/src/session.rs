//! Resolves the calling actor from request headers.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use entitle_service::Actor;
use std::collections::HashMap;

/// Maps request headers to an authenticated [`Actor`].
///
/// Unknown or missing credentials resolve to [`Actor::anonymous`].
pub trait SessionResolver: Send + Sync {
    fn resolve(&self, headers: &HeaderMap) -> Actor;
}

/// Resolves `Authorization: Bearer <token>` against a fixed token table.
#[derive(Debug, Default, Clone)]
pub struct StaticSessionResolver {
    tokens: HashMap<String, Actor>,
}

impl StaticSessionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, actor: Actor) -> Self {
        self.tokens.insert(token.into(), actor);
        self
    }
}

impl SessionResolver for StaticSessionResolver {
    fn resolve(&self, headers: &HeaderMap) -> Actor {
        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .and_then(|token| self.tokens.get(token.trim()))
            .cloned()
            .unwrap_or_else(Actor::anonymous)
    }
}
