//! Session records

use aula_shared::RecordId;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::token::generate_session_token;

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    /// Id of the `usuarios` record this session authenticates.
    pub owner_id: RecordId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// `None` when `now + ttl` is past the representable range.
    pub fn new(owner_id: RecordId, now: DateTime<Utc>, ttl: Duration) -> Option<Self> {
        let expires_at = now.checked_add_signed(ttl)?;
        Some(Self {
            token: generate_session_token(),
            owner_id,
            created_at: now,
            expires_at,
        })
    }

    /// Valid strictly before `expires_at`; the expiry instant itself is not.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}
