use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::auth::Role;
use crate::database::models::flash_tattoo::to_public_json;
use crate::database::models::{Favorite, FlashTattoo};
use crate::database::Repository;
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::guard;
use crate::middleware::{authorize, optional_auth, require_auth, AuthUser, MaybeUser};
use crate::state::AppState;
use crate::uploads;

pub fn routes() -> Router<AppState> {
    let public = Router::new().route("/:id", get(get_tattoo));

    let listing = Router::new()
        .route("/", get(list_tattoos))
        .route_layer(middleware::from_fn(optional_auth));

    let protected = Router::new()
        .route("/", post(create_tattoo))
        .route("/:id", axum::routing::put(update_tattoo).delete(delete_tattoo))
        .route("/:id/favorite", get(favorite_check))
        .route_layer(middleware::from_fn(require_auth));

    public.merge(listing).merge(protected)
}

/// Collect the multipart form for a flash tattoo create/update. Text parts
/// become columns; an `image` part is stored on disk and becomes the
/// image_url column.
async fn read_tattoo_form(mut multipart: Multipart) -> Result<Map<String, Value>, ApiError> {
    let mut fields = Map::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::bad_request("Malformed multipart form."))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| ApiError::bad_request("Malformed multipart form."))?;
                if bytes.is_empty() {
                    continue;
                }
                let path = uploads::save_image(&bytes, &content_type).await?;
                fields.insert("image_url".to_string(), Value::String(path));
            }
            "title" | "description" | "size" | "image_url" => {
                let text = field
                    .text()
                    .await
                    .map_err(|_| ApiError::bad_request("Malformed multipart form."))?;
                fields.insert(name, Value::String(text));
            }
            "price" => {
                let text = field
                    .text()
                    .await
                    .map_err(|_| ApiError::bad_request("Malformed multipart form."))?;
                let price: f64 = text
                    .parse()
                    .map_err(|_| ApiError::bad_request("Invalid price."))?;
                fields.insert("price".to_string(), json!(price));
            }
            "color" | "available" => {
                let text = field
                    .text()
                    .await
                    .map_err(|_| ApiError::bad_request("Malformed multipart form."))?;
                let flag: bool = text
                    .parse()
                    .map_err(|_| ApiError::bad_request(format!("Invalid boolean for {}.", name)))?;
                fields.insert(name, Value::Bool(flag));
            }
            // Unknown parts are ignored
            _ => {}
        }
    }

    Ok(fields)
}

/// POST /api/tattoos - Create a listing for the authenticated artist.
async fn create_tattoo(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::TattooArtist])?;

    let mut values = read_tattoo_form(multipart).await?;

    let has_title = values.get("title").and_then(Value::as_str).is_some();
    let has_price = values.contains_key("price");
    let size = values.get("size").and_then(Value::as_str);
    if !has_title || !has_price || size.is_none() {
        return Err(ApiError::bad_request("Title, price and size are required."));
    }
    guard::validate_size(size.unwrap_or_default())?;
    if let Some(price) = values.get("price").and_then(Value::as_f64) {
        guard::validate_price(price)?;
    }

    values.insert("user_id".to_string(), Value::String(user.id.to_string()));

    let tattoos: Repository<FlashTattoo> = Repository::new("flashtattoos", state.pool.clone());
    let tattoo = tattoos.insert_one(&values).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Flash tattoo created successfully.",
            "tattoo": to_public_json(&tattoo),
        })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct TattooListQuery {
    pub user_id: Option<Uuid>,
    pub available: Option<bool>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub size: Option<String>,
    pub color: Option<bool>,
    pub favorites: Option<bool>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

/// GET /api/tattoos - Public catalog with optional filters. With
/// `favorites=true` the result is restricted to the caller's favorite
/// designs; anonymous callers simply get an empty list.
async fn list_tattoos(
    State(state): State<AppState>,
    Extension(MaybeUser(maybe_user)): Extension<MaybeUser>,
    Query(query): Query<TattooListQuery>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut conditions = Map::new();
    if let Some(user_id) = query.user_id {
        conditions.insert("user_id".to_string(), json!(user_id));
    }
    if let Some(available) = query.available {
        conditions.insert("available".to_string(), Value::Bool(available));
    }
    if let Some(size) = query.size {
        conditions.insert("size".to_string(), Value::String(size));
    }
    if let Some(color) = query.color {
        conditions.insert("color".to_string(), Value::Bool(color));
    }
    let mut price = Map::new();
    if let Some(min_price) = query.min_price {
        price.insert("$gte".to_string(), json!(min_price));
    }
    if let Some(max_price) = query.max_price {
        price.insert("$lte".to_string(), json!(max_price));
    }
    if !price.is_empty() {
        conditions.insert("price".to_string(), Value::Object(price));
    }

    if query.favorites == Some(true) {
        // Resolve the caller's favorite designs first; without a caller
        // there is nothing to match.
        let Some(user) = maybe_user else {
            return Ok((StatusCode::OK, Json(json!([]))));
        };

        let favorites: Repository<Favorite> = Repository::new("favorites", state.pool.clone());
        let favorite_ids: Vec<Uuid> = favorites
            .select_any(FilterData {
                where_clause: Some(json!({ "client_id": user.id })),
                ..Default::default()
            })
            .await?
            .into_iter()
            .filter_map(|favorite| favorite.flash_tattoo_id)
            .collect();

        if favorite_ids.is_empty() {
            return Ok((StatusCode::OK, Json(json!([]))));
        }
        conditions.insert("id".to_string(), json!({ "$in": favorite_ids }));
    }

    let tattoos: Repository<FlashTattoo> = Repository::new("flashtattoos", state.pool.clone());
    let rows = tattoos
        .select_any(FilterData {
            where_clause: Some(Value::Object(conditions)),
            order: Some(json!("created_at desc")),
            limit: query.limit,
            offset: query.offset,
            ..Default::default()
        })
        .await?;

    let payload: Vec<Value> = rows.iter().map(to_public_json).collect();
    Ok((StatusCode::OK, Json(Value::Array(payload))))
}

/// GET /api/tattoos/:id - Public detail view.
async fn get_tattoo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let tattoos: Repository<FlashTattoo> = Repository::new("flashtattoos", state.pool.clone());
    let tattoo = tattoos
        .select_optional(FilterData {
            where_clause: Some(json!({ "id": id })),
            ..Default::default()
        })
        .await?
        .ok_or_else(|| ApiError::not_found("Flash tattoo not found."))?;

    Ok((StatusCode::OK, Json(to_public_json(&tattoo))))
}

/// GET /api/tattoos/:id/favorite - Is this design in the caller's favorites?
async fn favorite_check(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let favorites: Repository<Favorite> = Repository::new("favorites", state.pool.clone());
    let favorite = favorites
        .select_optional(FilterData {
            where_clause: Some(json!({
                "flash_tattoo_id": id,
                "client_id": user.id,
            })),
            ..Default::default()
        })
        .await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "checked": favorite.is_some(),
            "favorite_id": favorite.map(|f| f.id),
        })),
    ))
}

/// PUT /api/tattoos/:id - Update a listing; owner or admin only.
async fn update_tattoo(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::TattooArtist, Role::Admin])?;

    let tattoos: Repository<FlashTattoo> = Repository::new("flashtattoos", state.pool.clone());
    let existing = tattoos
        .select_optional(FilterData {
            where_clause: Some(json!({ "id": id })),
            ..Default::default()
        })
        .await?
        .ok_or_else(|| ApiError::not_found("Flash tattoo not found."))?;

    if !guard::can_modify_tattoo(&user, &existing) {
        return Err(ApiError::forbidden("You do not own this flash tattoo."));
    }

    let values = read_tattoo_form(multipart).await?;
    if values.is_empty() {
        return Err(ApiError::bad_request("No update fields provided."));
    }
    if let Some(size) = values.get("size").and_then(Value::as_str) {
        guard::validate_size(size)?;
    }
    if let Some(price) = values.get("price").and_then(Value::as_f64) {
        guard::validate_price(price)?;
    }

    let updated = tattoos
        .update_where(
            FilterData {
                where_clause: Some(json!({ "id": id })),
                ..Default::default()
            },
            &values,
        )
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::not_found("Flash tattoo not found."))?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Flash tattoo updated successfully.",
            "tattoo": to_public_json(&updated),
        })),
    ))
}

/// DELETE /api/tattoos/:id - Remove a listing; owner or admin only.
async fn delete_tattoo(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::TattooArtist, Role::Admin])?;

    let tattoos: Repository<FlashTattoo> = Repository::new("flashtattoos", state.pool.clone());
    let existing = tattoos
        .select_optional(FilterData {
            where_clause: Some(json!({ "id": id })),
            ..Default::default()
        })
        .await?
        .ok_or_else(|| ApiError::not_found("Flash tattoo not found."))?;

    if !guard::can_modify_tattoo(&user, &existing) {
        return Err(ApiError::forbidden("You do not own this flash tattoo."));
    }

    tattoos
        .delete_where(FilterData {
            where_clause: Some(json!({ "id": id })),
            ..Default::default()
        })
        .await?;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Flash tattoo deleted successfully." })),
    ))
}
