use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::auth::Role;
use crate::database::models::{to_json, Favorite};
use crate::database::Repository;
use crate::enrich::{self, EmbedRule, Projection};
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::guard;
use crate::middleware::{authorize, require_auth, AuthUser};
use crate::state::AppState;

pub const FLASH_TATTOO_EMBED: EmbedRule = EmbedRule {
    fk: "flash_tattoo_id",
    table: "flashtattoos",
    columns: &["title", "image_url", "price"],
    key: "flash_tattoo",
    projection: Projection::Object,
};

pub const ARTIST_EMBED: EmbedRule = EmbedRule {
    fk: "tattoo_artist_id",
    table: "users",
    columns: &["name", "profile_image"],
    key: "tattoo_artist",
    projection: Projection::Object,
};

pub const SHOP_EMBED: EmbedRule = EmbedRule {
    fk: "shop_id",
    table: "shops",
    columns: &["name", "location"],
    key: "shop",
    projection: Projection::Object,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_favorites))
        .route("/", post(create_favorite))
        .route("/:id/check", get(check_favorite))
        .route("/:id", delete(delete_favorite))
        .route_layer(middleware::from_fn(require_auth))
}

/// GET /api/favorites - The caller's favorites with their targets attached.
async fn list_favorites(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::Client])?;

    let favorites: Repository<Favorite> = Repository::new("favorites", state.pool.clone());
    let rows = favorites
        .select_any(FilterData {
            where_clause: Some(json!({ "client_id": user.id })),
            ..Default::default()
        })
        .await?;

    let mut payload: Vec<Value> = rows.iter().map(to_json).collect();
    enrich::embed(
        &state.pool,
        &mut payload,
        &[FLASH_TATTOO_EMBED, ARTIST_EMBED, SHOP_EMBED],
    )
    .await?;

    Ok((StatusCode::OK, Json(json!({ "favorites": payload }))))
}

/// GET /api/favorites/:id/check - Does this favorite belong to the caller?
async fn check_favorite(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::Client])?;

    let favorites: Repository<Favorite> = Repository::new("favorites", state.pool.clone());
    let favorite = favorites
        .select_optional(FilterData {
            where_clause: Some(json!({ "id": id, "client_id": user.id })),
            ..Default::default()
        })
        .await?;

    match favorite {
        Some(_) => Ok((StatusCode::OK, Json(json!({ "checked": true })))),
        None => Ok((StatusCode::NOT_FOUND, Json(json!({ "checked": false })))),
    }
}

#[derive(Debug, Deserialize)]
pub struct FavoriteCreate {
    pub flash_tattoo_id: Option<Uuid>,
    pub tattoo_artist_id: Option<Uuid>,
    pub shop_id: Option<Uuid>,
}

/// POST /api/favorites - Add a favorite for the caller. An artist target
/// must actually be a tattoo artist.
async fn create_favorite(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<FavoriteCreate>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::Client])?;

    guard::validate_favorite_target(
        payload.flash_tattoo_id,
        payload.tattoo_artist_id,
        payload.shop_id,
    )?;
    if let Some(artist_id) = payload.tattoo_artist_id {
        guard::ensure_tattoo_artist(&state.pool, artist_id).await?;
    }

    let mut values = Map::new();
    values.insert("client_id".to_string(), Value::String(user.id.to_string()));
    if let Some(flash_tattoo_id) = payload.flash_tattoo_id {
        values.insert(
            "flash_tattoo_id".to_string(),
            Value::String(flash_tattoo_id.to_string()),
        );
    }
    if let Some(tattoo_artist_id) = payload.tattoo_artist_id {
        values.insert(
            "tattoo_artist_id".to_string(),
            Value::String(tattoo_artist_id.to_string()),
        );
    }
    if let Some(shop_id) = payload.shop_id {
        values.insert("shop_id".to_string(), Value::String(shop_id.to_string()));
    }

    let favorites: Repository<Favorite> = Repository::new("favorites", state.pool.clone());
    let favorite = favorites.insert_one(&values).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Favorite added successfully.",
            "favorite": to_json(&favorite),
        })),
    ))
}

/// DELETE /api/favorites/:id - Owner-scoped unless the caller is an admin.
async fn delete_favorite(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::Client, Role::Admin])?;

    let mut conditions = Map::new();
    conditions.insert("id".to_string(), json!(id));
    if let Some(owner_id) = guard::owner_scope(&user) {
        conditions.insert("client_id".to_string(), json!(owner_id));
    }

    let favorites: Repository<Favorite> = Repository::new("favorites", state.pool.clone());
    let deleted = favorites
        .delete_where(FilterData {
            where_clause: Some(Value::Object(conditions)),
            ..Default::default()
        })
        .await?;

    if deleted.is_empty() {
        return Err(ApiError::not_found("Favorite not found."));
    }

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Favorite deleted successfully." })),
    ))
}
