//! Bearer session table

use std::sync::Arc;

use aula_security::Session;
use aula_shared::constants::MAX_SESSION_TTL_SECONDS;
use aula_shared::RecordId;
use chrono::Duration;
use dashmap::DashMap;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::error::DomainError;

/// Thread-safe token -> session map.
///
/// Expiry is checked lazily on `resolve`; `sweep_expired` is the only batch
/// removal.
pub struct SessionStore {
    storage: DashMap<String, Session>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl SessionStore {
    /// Fails unless `0 < ttl <= MAX_SESSION_TTL_SECONDS`.
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Result<Self, DomainError> {
        if ttl <= Duration::zero() {
            return Err(DomainError::Internal(format!(
                "session ttl must be positive, got {}s",
                ttl.num_seconds()
            )));
        }
        if ttl.num_seconds() > MAX_SESSION_TTL_SECONDS {
            return Err(DomainError::Internal(format!(
                "session ttl must be at most {}s, got {}s",
                MAX_SESSION_TTL_SECONDS,
                ttl.num_seconds()
            )));
        }
        Ok(Self { storage: DashMap::new(), ttl, clock })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, owner_id: RecordId) -> Result<Session, DomainError> {
        let now = self.clock.now();
        let session = Session::new(owner_id, now, self.ttl).ok_or_else(|| {
            DomainError::Internal(format!("session expiry out of range at {}", now))
        })?;
        self.storage.insert(session.token.clone(), session.clone());
        debug!("Issued session for user {} (expires {})", owner_id, session.expires_at);
        Ok(session)
    }

    /// Returns the live session for `token`. An expired entry is removed
    /// under the map's per-key lock, and only if it is still expired there.
    pub fn resolve(&self, token: &str) -> Result<Session, DomainError> {
        let now = self.clock.now();

        let session = match self.storage.get(token) {
            Some(entry) => entry.value().clone(),
            None => {
                return Err(DomainError::Authentication(
                    "invalid or expired token".to_string(),
                ))
            }
        };

        if session.is_valid_at(now) {
            return Ok(session);
        }

        self.storage.remove_if(token, |_, s| !s.is_valid_at(now));
        debug!("Session for user {} expired, removed", session.owner_id);
        Err(DomainError::Authentication("token expired".to_string()))
    }

    /// Idempotent; returns whether a session was present.
    pub fn revoke(&self, token: &str) -> bool {
        self.storage.remove(token).is_some()
    }

    /// Removes every expired session in one pass. Only removals made by
    /// this pass are counted.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut count = 0;
        self.storage.retain(|_, session| {
            let keep = session.is_valid_at(now);
            if !keep {
                count += 1;
            }
            keep
        });

        if count > 0 {
            info!("Cleaned up {} expired sessions", count);
        }
        count
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}
