// JWT token creation and verification
// Access tokens carry the session id; refresh tokens only the account

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use super::AuthError;
use crate::domain::account::{Account, Role};

/// Distinguishes access from refresh tokens signed with the same key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Access token claims
///
/// # Fields
/// * `sub` - Account ID
/// * `sid` - Session ID; the token is only honoured while the session exists
/// * `exp` - Expiry time (seconds since epoch)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessClaims {
    pub sub: Uuid,
    pub username: String,
    pub role: Role,
    pub sid: Uuid,
    pub typ: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

/// Refresh token claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub typ: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 signing keys with the configured token lifetimes
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtKeys {
    /// # Example
    /// ```
    /// use agrotrade_api::auth::jwt::JwtKeys;
    /// use chrono::Duration;
    ///
    /// let keys = JwtKeys::new("your-secret-key", Duration::days(3), Duration::days(365));
    /// let token = keys.issue_refresh(uuid::Uuid::new_v4()).expect("valid token");
    /// assert!(keys.verify_refresh(&token).is_ok());
    /// ```
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Creates an access token for an account bound to a session
    pub fn issue_access(&self, account: &Account, session_id: Uuid) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: account.id,
            username: account.username.clone(),
            role: account.role,
            sid: session_id,
            typ: TokenKind::Access,
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };
        self.sign(&claims)
    }

    pub fn issue_refresh(&self, account_id: Uuid) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = RefreshClaims {
            sub: account_id,
            typ: TokenKind::Refresh,
            iat: now.timestamp(),
            exp: (now + self.refresh_ttl).timestamp(),
        };
        self.sign(&claims)
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let claims: AccessClaims = self.decode(token)?;
        if claims.typ != TokenKind::Access {
            return Err(AuthError::WrongTokenKind);
        }
        Ok(claims)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, AuthError> {
        let claims: RefreshClaims = self.decode(token)?;
        if claims.typ != TokenKind::Refresh {
            return Err(AuthError::WrongTokenKind);
        }
        Ok(claims)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, AuthError> {
        encode(&Header::default(), claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, token: &str) -> Result<T, AuthError> {
        decode::<T>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken(e.to_string()),
            })
    }
}
