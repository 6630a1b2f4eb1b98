use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::auth::Role;
use crate::database::models::user::{hash_password, AdminUserUpdate};
use crate::database::models::{to_json, User};
use crate::database::Repository;
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::{authorize, AuthUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub role: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// GET /api/admin/users - All accounts, optionally filtered.
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<UserListQuery>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::Admin])?;

    let mut conditions = Map::new();
    if let Some(role) = query.role {
        conditions.insert("role".to_string(), Value::String(role));
    }
    if let Some(name) = query.name {
        conditions.insert("name".to_string(), json!({ "$ilike": format!("%{}%", name) }));
    }
    if let Some(email) = query.email {
        conditions.insert(
            "email".to_string(),
            json!({ "$ilike": format!("%{}%", email) }),
        );
    }

    let users: Repository<User> = Repository::new("users", state.pool.clone());
    let rows = users
        .select_any(FilterData {
            where_clause: Some(Value::Object(conditions)),
            ..Default::default()
        })
        .await?;

    let payload: Vec<Value> = rows.iter().map(to_json).collect();
    Ok((StatusCode::OK, Json(Value::Array(payload))))
}

/// GET /api/admin/users/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::Admin])?;

    let users: Repository<User> = Repository::new("users", state.pool.clone());
    let found = users
        .select_optional(FilterData {
            where_clause: Some(json!({ "id": id })),
            ..Default::default()
        })
        .await?
        .ok_or_else(|| ApiError::not_found("User not found."))?;

    Ok((StatusCode::OK, Json(to_json(&found))))
}

#[derive(Debug, Deserialize)]
pub struct AdminUserCreate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub profile_image: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub social_links: Option<Value>,
}

/// POST /api/admin/users - Create an account with any role.
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<AdminUserCreate>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::Admin])?;

    let (Some(name), Some(email), Some(password), Some(role)) = (
        payload.name,
        payload.email,
        payload.password,
        payload.role,
    ) else {
        return Err(ApiError::bad_request(
            "The name, email, password and role fields are required.",
        ));
    };
    if Role::parse(&role).is_none() {
        return Err(ApiError::bad_request("Invalid role."));
    }

    let mut values = Map::new();
    values.insert("name".to_string(), Value::String(name));
    values.insert("email".to_string(), Value::String(email));
    values.insert(
        "password".to_string(),
        Value::String(hash_password(&password)?),
    );
    values.insert("role".to_string(), Value::String(role));
    if let Some(phone_number) = payload.phone_number {
        values.insert("phone_number".to_string(), Value::String(phone_number));
    }
    if let Some(address) = payload.address {
        values.insert("address".to_string(), Value::String(address));
    }
    if let Some(profile_image) = payload.profile_image {
        values.insert("profile_image".to_string(), Value::String(profile_image));
    }
    if let Some(description) = payload.description {
        values.insert("description".to_string(), Value::String(description));
    }
    if let Some(location) = payload.location {
        values.insert("location".to_string(), Value::String(location));
    }
    if let Some(social_links) = payload.social_links {
        values.insert("social_links".to_string(), social_links);
    }

    let users: Repository<User> = Repository::new("users", state.pool.clone());
    let created = users.insert_one(&values).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created successfully.",
            "user": to_json(&created),
        })),
    ))
}

/// PUT /api/admin/users/:id - Full update, including the role.
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdminUserUpdate>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::Admin])?;

    if let Some(role) = payload.role.as_deref() {
        if Role::parse(role).is_none() {
            return Err(ApiError::bad_request("Invalid role."));
        }
    }
    let updates = payload.into_update_map()?;
    if updates.is_empty() {
        return Err(ApiError::bad_request("No update fields provided."));
    }

    let users: Repository<User> = Repository::new("users", state.pool.clone());
    let updated = users
        .update_where(
            FilterData {
                where_clause: Some(json!({ "id": id })),
                ..Default::default()
            },
            &updates,
        )
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::not_found("User not found."))?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "User updated successfully.",
            "user": to_json(&updated),
        })),
    ))
}

/// DELETE /api/admin/users/:id
pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::Admin])?;

    let users: Repository<User> = Repository::new("users", state.pool.clone());
    let deleted = users
        .delete_where(FilterData {
            where_clause: Some(json!({ "id": id })),
            ..Default::default()
        })
        .await?;

    if deleted.is_empty() {
        return Err(ApiError::not_found("User not found."));
    }

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "User deleted successfully." })),
    ))
}
