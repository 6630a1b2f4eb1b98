use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::auth::Role;
use crate::database::models::booking::AdminBookingUpdate;
use crate::database::models::{to_json, Booking};
use crate::database::Repository;
use crate::enrich::{self, EmbedRule, Projection};
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::guard;
use crate::middleware::{authorize, AuthUser};
use crate::state::AppState;

const CLIENT_NAME: EmbedRule = EmbedRule {
    fk: "client_id",
    table: "users",
    columns: &["name"],
    key: "client_name",
    projection: Projection::Field("name"),
};

const ARTIST_NAME: EmbedRule = EmbedRule {
    fk: "tattoo_artist_id",
    table: "users",
    columns: &["name"],
    key: "artist_name",
    projection: Projection::Field("name"),
};

const TATTOO_TITLE: EmbedRule = EmbedRule {
    fk: "flash_tattoo_id",
    table: "flashtattoos",
    columns: &["title"],
    key: "tattoo_title",
    projection: Projection::Field("title"),
};

const FLASH_TATTOO_DETAIL: EmbedRule = EmbedRule {
    fk: "flash_tattoo_id",
    table: "flashtattoos",
    columns: &["title", "image_url"],
    key: "flash_tattoo",
    projection: Projection::Object,
};

const CLIENT_DETAIL: EmbedRule = EmbedRule {
    fk: "client_id",
    table: "users",
    columns: &["name", "email"],
    key: "client",
    projection: Projection::Object,
};

const ARTIST_DETAIL: EmbedRule = EmbedRule {
    fk: "tattoo_artist_id",
    table: "users",
    columns: &["name", "email"],
    key: "tattoo_artist",
    projection: Projection::Object,
};

#[derive(Debug, Deserialize)]
pub struct AdminBookingListQuery {
    pub client_id: Option<Uuid>,
    pub tattoo_artist_id: Option<Uuid>,
    pub status: Option<String>,
}

/// GET /api/admin/bookings - Flat summaries: who, with whom, which design.
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<AdminBookingListQuery>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::Admin])?;

    let mut conditions = Map::new();
    if let Some(client_id) = query.client_id {
        conditions.insert("client_id".to_string(), json!(client_id));
    }
    if let Some(tattoo_artist_id) = query.tattoo_artist_id {
        conditions.insert("tattoo_artist_id".to_string(), json!(tattoo_artist_id));
    }
    if let Some(status) = query.status {
        conditions.insert("status".to_string(), Value::String(status));
    }

    let bookings: Repository<Booking> = Repository::new("bookings", state.pool.clone());
    let rows = bookings
        .select_any(FilterData {
            where_clause: Some(Value::Object(conditions)),
            ..Default::default()
        })
        .await?;

    let mut enriched: Vec<Value> = rows.iter().map(to_json).collect();
    enrich::embed(
        &state.pool,
        &mut enriched,
        &[CLIENT_NAME, ARTIST_NAME, TATTOO_TITLE],
    )
    .await?;

    let payload: Vec<Value> = enriched
        .iter()
        .map(|row| {
            json!({
                "id": row["id"],
                "client_name": row["client_name"],
                "artist_name": row["artist_name"],
                "tattoo_title": row["tattoo_title"],
                "date": row["date"],
                "time": row["time"],
                "status": row["status"],
            })
        })
        .collect();

    Ok((StatusCode::OK, Json(json!({ "bookings": payload }))))
}

/// GET /api/admin/bookings/:id - Full record with embedded parties.
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::Admin])?;

    let bookings: Repository<Booking> = Repository::new("bookings", state.pool.clone());
    let booking = bookings
        .select_optional(FilterData {
            where_clause: Some(json!({ "id": id })),
            ..Default::default()
        })
        .await?
        .ok_or_else(|| ApiError::not_found("Booking not found."))?;

    let mut payload = vec![to_json(&booking)];
    enrich::embed(
        &state.pool,
        &mut payload,
        &[FLASH_TATTOO_DETAIL, CLIENT_DETAIL, ARTIST_DETAIL],
    )
    .await?;

    Ok((StatusCode::OK, Json(payload.remove(0))))
}

#[derive(Debug, Deserialize)]
pub struct AdminBookingCreate {
    pub client_id: Option<Uuid>,
    pub flash_tattoo_id: Option<Uuid>,
    pub tattoo_artist_id: Option<Uuid>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub status: Option<String>,
}

/// POST /api/admin/bookings - Create a booking on behalf of any client.
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<AdminBookingCreate>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::Admin])?;

    let (Some(client_id), Some(tattoo_artist_id), Some(date), Some(time)) = (
        payload.client_id,
        payload.tattoo_artist_id,
        payload.date,
        payload.time,
    ) else {
        return Err(ApiError::bad_request(
            "The client_id, tattoo_artist_id, date and time fields are required.",
        ));
    };
    guard::validate_booking_schedule(Some(&date), Some(&time))?;

    let mut values = Map::new();
    values.insert("client_id".to_string(), Value::String(client_id.to_string()));
    if let Some(flash_tattoo_id) = payload.flash_tattoo_id {
        values.insert(
            "flash_tattoo_id".to_string(),
            Value::String(flash_tattoo_id.to_string()),
        );
    }
    values.insert(
        "tattoo_artist_id".to_string(),
        Value::String(tattoo_artist_id.to_string()),
    );
    values.insert("date".to_string(), Value::String(date));
    values.insert("time".to_string(), Value::String(time));
    values.insert(
        "status".to_string(),
        Value::String(payload.status.unwrap_or_else(|| "pending".to_string())),
    );

    let bookings: Repository<Booking> = Repository::new("bookings", state.pool.clone());
    let booking = bookings.insert_one(&values).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Booking created successfully.",
            "booking": to_json(&booking),
        })),
    ))
}

/// PUT /api/admin/bookings/:id - Any field may be reassigned.
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdminBookingUpdate>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::Admin])?;

    guard::validate_booking_schedule(
        payload.schedule.date.as_deref(),
        payload.schedule.time.as_deref(),
    )?;
    let updates = payload.into_update_map();
    if updates.is_empty() {
        return Err(ApiError::bad_request("No update fields provided."));
    }

    let bookings: Repository<Booking> = Repository::new("bookings", state.pool.clone());
    let updated = bookings
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
        .ok_or_else(|| ApiError::not_found("Booking not found."))?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Booking updated successfully.",
            "booking": to_json(&updated),
        })),
    ))
}

/// DELETE /api/admin/bookings/:id
pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::Admin])?;

    let bookings: Repository<Booking> = Repository::new("bookings", state.pool.clone());
    let deleted = bookings
        .delete_where(FilterData {
            where_clause: Some(json!({ "id": id })),
            ..Default::default()
        })
        .await?;

    if deleted.is_empty() {
        return Err(ApiError::not_found("Booking not found."));
    }

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Booking deleted successfully." })),
    ))
}
