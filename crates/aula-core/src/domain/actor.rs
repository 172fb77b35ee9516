//! Caller identity passed into store operations

use aula_security::Session;
use aula_shared::RecordId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// No bearer token on the request.
    Anonymous,
    /// Authenticated as the `usuarios` record with this id.
    User(RecordId),
}

impl Actor {
    pub fn user_id(&self) -> Option<RecordId> {
        match self {
            Actor::Anonymous => None,
            Actor::User(id) => Some(*id),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Actor::User(_))
    }
}

impl From<&Session> for Actor {
    fn from(session: &Session) -> Self {
        Actor::User(session.owner_id)
    }
}
