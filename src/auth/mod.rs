// Authentication
// Password hashing, JWTs, sessions and one-time email tokens

pub mod jwt;
pub mod password;
pub mod tokens;

use thiserror::Error;

pub use jwt::{AccessClaims, JwtKeys, RefreshClaims};
pub use tokens::{OneTimeTokens, Sessions};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    Expired,

    #[error("Wrong token type")]
    WrongTokenKind,

    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}
