use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::{decode_token, Claims, Role};
use crate::config;
use crate::error::ApiError;

/// Authenticated identity extracted from a bearer token.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl TryFrom<Claims> for AuthUser {
    type Error = ApiError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let role = Role::parse(&claims.role)
            .ok_or_else(|| ApiError::unauthorized("Invalid or expired token."))?;
        Ok(Self {
            id: claims.id,
            email: claims.email,
            role,
        })
    }
}

/// Identity for routes that work with or without a token.
#[derive(Clone, Debug)]
pub struct MaybeUser(pub Option<AuthUser>);

/// Succeeds iff the identity's role is in the allowed set.
pub fn authorize(user: &AuthUser, allowed: &[Role]) -> Result<(), ApiError> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(ApiError::forbidden("Access denied for this role."))
    }
}

/// Require a valid bearer token and attach the identity to the request.
/// A missing token is 403, an invalid or expired one is 401.
pub async fn require_auth(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| ApiError::forbidden("Token required."))?;
    let user = verify(&token)?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Attach an identity when a token is present, proceed anonymously when it
/// is absent. A token that is present but malformed or expired is still
/// rejected rather than downgraded to anonymous.
pub async fn optional_auth(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let user = match bearer_token(request.headers()) {
        Some(token) => MaybeUser(Some(verify(&token)?)),
        None => MaybeUser(None),
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn verify(token: &str) -> Result<AuthUser, ApiError> {
    let secret = &config::config().security.jwt_secret;
    let claims = decode_token(token, secret)?;
    AuthUser::try_from(claims)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers.get("authorization")?.to_str().ok()?;
    let token = auth_header.strip_prefix("Bearer ")?;
    if token.trim().is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn client_user() -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            email: "c@example.com".to_string(),
            role: Role::Client,
        }
    }

    #[test]
    fn authorize_accepts_listed_role() {
        let user = client_user();
        assert!(authorize(&user, &[Role::Client, Role::Admin]).is_ok());
    }

    #[test]
    fn admin_only_rejects_every_other_role() {
        for role in [Role::Client, Role::TattooArtist, Role::Shop] {
            let user = AuthUser {
                role,
                ..client_user()
            };
            assert!(authorize(&user, &[Role::Admin]).is_err());
        }
    }

    #[test]
    fn bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn missing_or_malformed_header_yields_none() {
        assert!(bearer_token(&HeaderMap::new()).is_none());

        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Token abc"));
        assert!(bearer_token(&headers).is_none());

        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer "));
        assert!(bearer_token(&headers).is_none());
    }

    #[test]
    fn claims_with_unknown_role_are_rejected() {
        let claims = Claims::new(
            Uuid::new_v4(),
            "x@example.com".to_string(),
            "superuser".to_string(),
            1,
        );
        assert!(AuthUser::try_from(claims).is_err());
    }
}
