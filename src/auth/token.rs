use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Token lifetime. Tokens issued by [`TokenService::issue`] expire 24 hours
/// after issuance.
const TOKEN_TTL_HOURS: i64 = 24;

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject of the token: the user's unique identifier.
    pub sub: Uuid,
    /// Email address the token was issued for.
    pub email: String,
    /// Issuance timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

/// Why a token failed verification.
///
/// Both variants map to HTTP 401 at the boundary; the distinction exists for
/// logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// The token's `exp` claim is in the past.
    Expired,
    /// Anything else: bad signature, malformed token, wrong claim types.
    Invalid,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenError::Expired => write!(f, "token expired"),
            TokenError::Invalid => write!(f, "token invalid"),
        }
    }
}

/// Issues and verifies signed bearer tokens.
///
/// Constructed once at startup from the configured secret and shared through
/// `web::Data`; nothing in here reads the environment.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Signs `{sub, email, iat, exp}` for the given user. Expiry is fixed at
    /// 24 hours from now.
    pub fn issue(&self, user_id: Uuid, email: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + chrono::Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
    }

    /// Verifies a token and decodes its claims.
    ///
    /// Expiration failures are reported distinctly from every other failure
    /// mode so the caller can log which check rejected the token.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

/// Parses an `Authorization` header value of the form `"Bearer <token>"`.
///
/// Returns `None` for any malformed input (missing prefix, wrong part count)
/// rather than an error: this is a boundary parsing contract, not a
/// cryptographic one.
pub fn extract_from_header(value: &str) -> Option<&str> {
    let parts: Vec<&str> = value.split(' ').collect();
    if parts.len() != 2 || parts[0] != "Bearer" {
        return None;
    }
    Some(parts[1])
}
