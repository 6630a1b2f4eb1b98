use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
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
use crate::handlers::favorites::{ARTIST_EMBED, FLASH_TATTOO_EMBED, SHOP_EMBED};
use crate::middleware::{authorize, AuthUser};
use crate::state::AppState;

const CLIENT_EMBED: EmbedRule = EmbedRule {
    fk: "client_id",
    table: "users",
    columns: &["name", "email"],
    key: "client",
    projection: Projection::Object,
};

#[derive(Debug, Deserialize)]
pub struct AdminFavoriteListQuery {
    pub client_id: Option<Uuid>,
    pub tattoo_artist_id: Option<Uuid>,
    pub shop_id: Option<Uuid>,
    pub flash_tattoo_id: Option<Uuid>,
}

/// GET /api/admin/favorites - All favorites with client and target embeds.
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<AdminFavoriteListQuery>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::Admin])?;

    let mut conditions = Map::new();
    if let Some(client_id) = query.client_id {
        conditions.insert("client_id".to_string(), json!(client_id));
    }
    if let Some(tattoo_artist_id) = query.tattoo_artist_id {
        conditions.insert("tattoo_artist_id".to_string(), json!(tattoo_artist_id));
    }
    if let Some(shop_id) = query.shop_id {
        conditions.insert("shop_id".to_string(), json!(shop_id));
    }
    if let Some(flash_tattoo_id) = query.flash_tattoo_id {
        conditions.insert("flash_tattoo_id".to_string(), json!(flash_tattoo_id));
    }

    let favorites: Repository<Favorite> = Repository::new("favorites", state.pool.clone());
    let rows = favorites
        .select_any(FilterData {
            where_clause: Some(Value::Object(conditions)),
            ..Default::default()
        })
        .await?;

    let mut payload: Vec<Value> = rows.iter().map(to_json).collect();
    enrich::embed(
        &state.pool,
        &mut payload,
        &[CLIENT_EMBED, FLASH_TATTOO_EMBED, ARTIST_EMBED, SHOP_EMBED],
    )
    .await?;

    Ok((StatusCode::OK, Json(json!({ "favorites": payload }))))
}

#[derive(Debug, Deserialize)]
pub struct AdminFavoriteCreate {
    pub client_id: Option<Uuid>,
    pub flash_tattoo_id: Option<Uuid>,
    pub tattoo_artist_id: Option<Uuid>,
    pub shop_id: Option<Uuid>,
}

/// POST /api/admin/favorites - Add a favorite for any client.
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<AdminFavoriteCreate>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::Admin])?;

    let Some(client_id) = payload.client_id else {
        return Err(ApiError::bad_request(
            "The client_id field and at least one favorite target (flash_tattoo_id, tattoo_artist_id, shop_id) are required.",
        ));
    };
    guard::validate_favorite_target(
        payload.flash_tattoo_id,
        payload.tattoo_artist_id,
        payload.shop_id,
    )?;
    if let Some(artist_id) = payload.tattoo_artist_id {
        guard::ensure_tattoo_artist(&state.pool, artist_id).await?;
    }

    let mut values = Map::new();
    values.insert("client_id".to_string(), Value::String(client_id.to_string()));
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

/// DELETE /api/admin/favorites/:id
pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::Admin])?;

    let favorites: Repository<Favorite> = Repository::new("favorites", state.pool.clone());
    let deleted = favorites
        .delete_where(FilterData {
            where_clause: Some(json!({ "id": id })),
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
