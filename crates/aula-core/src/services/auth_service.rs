// ============================================================================
// Aula Core - Authentication Service
// File: crates/aula-core/src/services/auth_service.rs
// ============================================================================
//! Login against the configured credential pair, bearer sessions

use aula_security::{CredentialPair, Session};
use aula_shared::constants::TOKEN_TYPE_BEARER;
use aula_shared::RecordId;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::DomainError;
use crate::session_store::SessionStore;

/// Token handed back by a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub access_token: String,
    pub token_type: &'static str,
    /// Seconds until the session expires.
    pub expires_in: i64,
}

/// Session guard: one accepted e-mail/password pair, mapped to the admin user.
pub struct AuthService {
    credentials: CredentialPair,
    admin_id: RecordId,
    sessions: SessionStore,
}

impl AuthService {
    pub fn new(credentials: CredentialPair, admin_id: RecordId, sessions: SessionStore) -> Self {
        Self { credentials, admin_id, sessions }
    }

    /// Issues a session on an exact match. A mismatch leaves the session
    /// table untouched.
    pub fn login(&self, email: &str, senha: &str) -> Result<LoginResult, DomainError> {
        info!("Login attempt for email: {}", email);

        if !self.credentials.matches(email, senha) {
            warn!("Login failed: invalid credentials for: {}", email);
            return Err(DomainError::Authentication("invalid email or password".to_string()));
        }

        let session = self.sessions.issue(self.admin_id)?;
        info!("Login successful for: {}", email);

        Ok(LoginResult {
            access_token: session.token,
            token_type: TOKEN_TYPE_BEARER,
            expires_in: self.sessions.ttl().num_seconds(),
        })
    }

    pub fn authorize(&self, token: &str) -> Result<Session, DomainError> {
        self.sessions.resolve(token)
    }

    /// Idempotent. Returns whether a session was actually removed.
    pub fn logout(&self, token: &str) -> bool {
        let removed = self.sessions.revoke(token);
        if removed {
            info!("Session revoked");
        }
        removed
    }

    pub fn sweep_expired(&self) -> usize {
        self.sessions.sweep_expired()
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }
}
