use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::auth::{generate_token, Claims, Role};
use crate::config;
use crate::database::models::user::{hash_password, verify_password};
use crate::database::models::{to_json, User};
use crate::database::Repository;
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
}

/// POST /api/auth/register - Create an account.
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (Some(email), Some(password), Some(role), Some(name)) = (
        payload.email,
        payload.password,
        payload.role,
        payload.name,
    ) else {
        return Err(ApiError::bad_request("Required fields are missing."));
    };

    if Role::parse(&role).is_none() {
        return Err(ApiError::bad_request("Invalid role."));
    }

    let mut values = Map::new();
    values.insert("email".to_string(), Value::String(email));
    values.insert(
        "password".to_string(),
        Value::String(hash_password(&password)?),
    );
    values.insert("role".to_string(), Value::String(role));
    values.insert("name".to_string(), Value::String(name));
    if let Some(phone_number) = payload.phone_number {
        values.insert("phone_number".to_string(), Value::String(phone_number));
    }
    if let Some(address) = payload.address {
        values.insert("address".to_string(), Value::String(address));
    }

    let users: Repository<User> = Repository::new("users", state.pool.clone());
    let user = users.insert_one(&values).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created successfully.",
            "user": to_json(&user),
        })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// POST /api/auth/login - Check credentials and issue a bearer token.
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (Some(email), Some(password)) = (payload.email, payload.password) else {
        return Err(ApiError::bad_request("Email and password are required."));
    };

    let users: Repository<User> = Repository::new("users", state.pool.clone());
    let user = users
        .select_optional(FilterData {
            where_clause: Some(json!({ "email": email })),
            ..Default::default()
        })
        .await?
        .ok_or_else(|| ApiError::bad_request("User not found."))?;

    if !verify_password(&password, &user.password)? {
        return Err(ApiError::bad_request("Incorrect password."));
    }

    let security = &config::config().security;
    let claims = Claims::new(
        user.id,
        user.email.clone(),
        user.role.clone(),
        security.jwt_expiry_hours,
    );
    let token = generate_token(&claims, &security.jwt_secret)?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "token": token,
            "user": to_json(&user),
        })),
    ))
}
