use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::auth::Role;
use crate::database::models::flash_tattoo::{publicize_image_url, to_public_json, TattooUpdate};
use crate::database::models::FlashTattoo;
use crate::database::models::to_json;
use crate::database::Repository;
use crate::enrich::{self, EmbedRule, Projection};
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::guard;
use crate::middleware::{authorize, AuthUser};
use crate::state::AppState;

const ARTIST_NAME: EmbedRule = EmbedRule {
    fk: "user_id",
    table: "users",
    columns: &["name"],
    key: "artist_name",
    projection: Projection::Field("name"),
};

#[derive(Debug, Deserialize)]
pub struct AdminTattooCreate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<f64>,
    pub color: Option<bool>,
    pub size: Option<String>,
    pub available: Option<bool>,
    pub user_id: Option<Uuid>,
}

/// POST /api/admin/tattoos - Create a listing for any artist.
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<AdminTattooCreate>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::Admin])?;

    let (Some(title), Some(price), Some(size), Some(user_id)) =
        (payload.title, payload.price, payload.size, payload.user_id)
    else {
        return Err(ApiError::bad_request(
            "The title, price, size and user_id fields are required.",
        ));
    };
    guard::validate_size(&size)?;
    guard::validate_price(price)?;

    let mut values = Map::new();
    values.insert("title".to_string(), Value::String(title));
    if let Some(description) = payload.description {
        values.insert("description".to_string(), Value::String(description));
    }
    if let Some(image_url) = payload.image_url {
        values.insert("image_url".to_string(), Value::String(image_url));
    }
    values.insert("price".to_string(), json!(price));
    values.insert(
        "color".to_string(),
        Value::Bool(payload.color.unwrap_or(false)),
    );
    values.insert("size".to_string(), Value::String(size));
    values.insert(
        "available".to_string(),
        Value::Bool(payload.available.unwrap_or(true)),
    );
    values.insert("user_id".to_string(), Value::String(user_id.to_string()));

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
pub struct AdminTattooListQuery {
    pub user_id: Option<Uuid>,
    pub available: Option<bool>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub size: Option<String>,
    pub color: Option<bool>,
}

/// GET /api/admin/tattoos - Catalog with the owning artist's name attached.
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<AdminTattooListQuery>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::Admin])?;

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

    let tattoos: Repository<FlashTattoo> = Repository::new("flashtattoos", state.pool.clone());
    let rows = tattoos
        .select_any(FilterData {
            where_clause: Some(Value::Object(conditions)),
            ..Default::default()
        })
        .await?;

    let mut payload: Vec<Value> = rows.iter().map(to_json).collect();
    enrich::embed(&state.pool, &mut payload, &[ARTIST_NAME]).await?;
    for row in &mut payload {
        publicize_image_url(row);
    }

    Ok((StatusCode::OK, Json(Value::Array(payload))))
}

/// GET /api/admin/tattoos/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::Admin])?;

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

/// PUT /api/admin/tattoos/:id - Update any listing.
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TattooUpdate>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::Admin])?;

    if let Some(size) = payload.size.as_deref() {
        guard::validate_size(size)?;
    }
    if let Some(price) = payload.price {
        guard::validate_price(price)?;
    }
    let updates = payload.into_update_map();
    if updates.is_empty() {
        return Err(ApiError::bad_request("No update fields provided."));
    }

    let tattoos: Repository<FlashTattoo> = Repository::new("flashtattoos", state.pool.clone());
    let updated = tattoos
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
        .ok_or_else(|| ApiError::not_found("Flash tattoo not found."))?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Flash tattoo updated successfully.",
            "tattoo": to_public_json(&updated),
        })),
    ))
}

/// DELETE /api/admin/tattoos/:id
pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::Admin])?;

    let tattoos: Repository<FlashTattoo> = Repository::new("flashtattoos", state.pool.clone());
    let deleted = tattoos
        .delete_where(FilterData {
            where_clause: Some(json!({ "id": id })),
            ..Default::default()
        })
        .await?;

    if deleted.is_empty() {
        return Err(ApiError::not_found("Flash tattoo not found."));
    }

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Flash tattoo deleted successfully." })),
    ))
}
