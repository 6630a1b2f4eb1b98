use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Account roles recognized by the authorization layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Client,
    TattooArtist,
    Shop,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::TattooArtist => "tattoo_artist",
            Role::Shop => "shop",
            Role::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "client" => Some(Role::Client),
            "tattoo_artist" => Some(Role::TattooArtist),
            "shop" => Some(Role::Shop),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Claims carried by a bearer token: identity, role and expiry.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(id: Uuid, email: String, role: String, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            id,
            email,
            role,
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT secret is not configured")]
    MissingSecret,

    #[error("token creation failed: {0}")]
    TokenCreation(String),

    #[error("invalid or expired token")]
    InvalidToken,
}

/// Sign the claims into a compact JWT (HS256).
pub fn generate_token(claims: &Claims, secret: &str) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::TokenCreation(e.to_string()))
}

/// Verify signature and expiry, returning the decoded claims.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AuthError::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn token_round_trip_preserves_identity() {
        let id = Uuid::new_v4();
        let claims = Claims::new(id, "artist@example.com".into(), "tattoo_artist".into(), 1);
        let token = generate_token(&claims, SECRET).unwrap();

        let decoded = decode_token(&token, SECRET).unwrap();
        assert_eq!(decoded.id, id);
        assert_eq!(decoded.email, "artist@example.com");
        assert_eq!(decoded.role, "tattoo_artist");
        assert!(decoded.exp > Utc::now().timestamp());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let claims = Claims::new(Uuid::new_v4(), "a@b.com".into(), "client".into(), 1);
        let token = generate_token(&claims, SECRET).unwrap();

        assert!(matches!(
            decode_token(&token, "a-different-secret"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        // Issue a token that expired well outside the default leeway window.
        let now = Utc::now();
        let claims = Claims {
            id: Uuid::new_v4(),
            email: "a@b.com".into(),
            role: "client".into(),
            exp: (now - Duration::hours(2)).timestamp(),
            iat: (now - Duration::hours(3)).timestamp(),
        };
        let token = generate_token(&claims, SECRET).unwrap();

        assert!(matches!(
            decode_token(&token, SECRET),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn empty_secret_is_refused() {
        let claims = Claims::new(Uuid::new_v4(), "a@b.com".into(), "client".into(), 1);
        assert!(matches!(
            generate_token(&claims, ""),
            Err(AuthError::MissingSecret)
        ));
    }

    #[test]
    fn role_parsing_covers_known_roles() {
        for role in ["client", "tattoo_artist", "shop", "admin"] {
            assert_eq!(Role::parse(role).unwrap().as_str(), role);
        }
        assert!(Role::parse("superuser").is_none());
    }
}
