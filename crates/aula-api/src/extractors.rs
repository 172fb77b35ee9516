//! Bearer credential extractors

use std::convert::Infallible;

use aula_core::Actor;
use aula_security::Session;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::ApiError;
use crate::state::AppState;

/// Token from `Authorization: Bearer <token>`.
///
/// `Ok(None)` when the header is absent; a header with any other shape is
/// an authentication error.
fn bearer_token(parts: &Parts) -> Result<Option<String>, ApiError> {
    let Some(value) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value
        .to_str()
        .map_err(|_| ApiError::Unauthorized("malformed authorization header".to_string()))?;

    match value.trim().split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(Some(token.trim().to_string()))
        }
        _ => Err(ApiError::Unauthorized(
            "authorization header must be 'Bearer <token>'".to_string(),
        )),
    }
}

/// Raw bearer token, required but not checked against the session table.
pub struct BearerToken(pub String);

impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        bearer_token(parts)?
            .map(BearerToken)
            .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))
    }
}

/// Bearer credentials resolved on demand, so a handler can report an
/// unknown collection before any authentication failure.
pub struct Credentials(Result<Option<String>, ApiError>);

impl Credentials {
    pub fn resolve(self, state: &AppState) -> Result<Actor, ApiError> {
        match self.0? {
            None => Ok(Actor::Anonymous),
            Some(token) => Ok(Actor::from(&state.auth.authorize(&token)?)),
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Credentials {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Credentials(bearer_token(parts)))
    }
}

/// A live session; the header is mandatory.
pub struct CurrentSession(pub Session);

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        Ok(CurrentSession(state.auth.authorize(&token)?))
    }
}
