// ============================================================================
// Aula API - Auth Handlers
// File: crates/aula-api/src/handlers/auth.rs
// ============================================================================
//! Login, logout and the caller's own profile

use aula_core::{LoginResult, Record, USUARIOS};
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use crate::error::ApiError;
use crate::extractors::{BearerToken, CurrentSession};
use crate::state::AppState;

/// Login request payload
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub senha: String,
}

/// Login handler - POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResult>, ApiError> {
    let Json(payload) = payload?;
    payload.validate()?;

    Ok(Json(state.auth.login(&payload.email, &payload.senha)?))
}

/// Logout handler - POST /auth/logout
///
/// Succeeds for unknown and expired tokens too.
pub async fn logout(State(state): State<AppState>, BearerToken(token): BearerToken) -> Json<Value> {
    state.auth.logout(&token);
    Json(json!({ "message": "logged out" }))
}

/// Profile handler - GET /auth/perfil
pub async fn profile(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Record>, ApiError> {
    Ok(Json(state.store.get(USUARIOS, session.owner_id)?))
}
