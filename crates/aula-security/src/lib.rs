//! # Aula Security
//!
//! Security utilities: opaque session tokens, password hashing, sessions.

pub mod password;
pub mod session;
pub mod token;

pub use password::{CredentialPair, PasswordService};
pub use session::Session;
pub use token::generate_session_token;
