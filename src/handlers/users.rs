use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::put,
    Extension, Json, Router,
};
use serde_json::{json, Value};

use crate::database::models::user::ProfileUpdate;
use crate::database::models::{to_json, User};
use crate::database::Repository;
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::{require_auth, AuthUser};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/me", put(update_me))
        .route_layer(middleware::from_fn(require_auth))
}

/// PUT /api/users/me - Self-service profile update. The payload carries no
/// role field, so the role cannot change through this path.
async fn update_me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let updates = payload.into_update_map()?;
    if updates.is_empty() {
        return Err(ApiError::bad_request("No update fields provided."));
    }

    let users: Repository<User> = Repository::new("users", state.pool.clone());
    let updated = users
        .update_where(
            FilterData {
                where_clause: Some(json!({ "id": user.id })),
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
            "message": "Profile updated successfully.",
            "user": to_json(&updated),
        })),
    ))
}
