use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::auth::Role;
use crate::database::models::booking::BookingUpdate;
use crate::database::models::{to_json, Booking};
use crate::database::Repository;
use crate::enrich::{self, EmbedRule, Projection};
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::guard;
use crate::middleware::{authorize, require_auth, AuthUser};
use crate::state::AppState;

const FLASH_TATTOO_EMBED: EmbedRule = EmbedRule {
    fk: "flash_tattoo_id",
    table: "flashtattoos",
    columns: &["id", "title", "image_url"],
    key: "flash_tattoo",
    projection: Projection::Object,
};

const CLIENT_EMBED: EmbedRule = EmbedRule {
    fk: "client_id",
    table: "users",
    columns: &["id", "name", "email"],
    key: "client",
    projection: Projection::Object,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_booking))
        .route("/client", get(client_bookings))
        .route("/artist", get(artist_bookings))
        .route("/:id", put(update_booking))
        .route("/:id", delete(delete_booking))
        .route_layer(middleware::from_fn(require_auth))
}

#[derive(Debug, Deserialize)]
pub struct BookingCreate {
    pub flash_tattoo_id: Option<Uuid>,
    pub tattoo_artist_id: Option<Uuid>,
    pub date: Option<String>,
    pub time: Option<String>,
}

/// POST /api/bookings - Client books an artist. The booking always starts
/// out pending, with the caller as its client.
async fn create_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<BookingCreate>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::Client])?;

    let (Some(date), Some(time), Some(tattoo_artist_id)) =
        (payload.date, payload.time, payload.tattoo_artist_id)
    else {
        return Err(ApiError::bad_request(
            "The date, time and tattoo_artist_id fields are required.",
        ));
    };
    guard::validate_booking_schedule(Some(&date), Some(&time))?;

    let mut values = Map::new();
    values.insert("client_id".to_string(), Value::String(user.id.to_string()));
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
    values.insert("status".to_string(), Value::String("pending".to_string()));

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

/// GET /api/bookings/client - The caller's bookings with their flash
/// tattoo details attached.
async fn client_bookings(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::Client])?;

    let bookings: Repository<Booking> = Repository::new("bookings", state.pool.clone());
    let rows = bookings
        .select_any(FilterData {
            where_clause: Some(json!({ "client_id": user.id })),
            ..Default::default()
        })
        .await?;

    let mut payload: Vec<Value> = rows.iter().map(to_json).collect();
    enrich::embed(&state.pool, &mut payload, &[FLASH_TATTOO_EMBED]).await?;

    Ok((StatusCode::OK, Json(json!({ "bookings": payload }))))
}

/// GET /api/bookings/artist - Bookings addressed to the calling artist,
/// with client and flash tattoo details attached.
async fn artist_bookings(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::TattooArtist])?;

    let bookings: Repository<Booking> = Repository::new("bookings", state.pool.clone());
    let rows = bookings
        .select_any(FilterData {
            where_clause: Some(json!({ "tattoo_artist_id": user.id })),
            ..Default::default()
        })
        .await?;

    let mut payload: Vec<Value> = rows.iter().map(to_json).collect();
    enrich::embed(&state.pool, &mut payload, &[CLIENT_EMBED, FLASH_TATTOO_EMBED]).await?;

    Ok((StatusCode::OK, Json(json!({ "bookings": payload }))))
}

/// PUT /api/bookings/:id - Artists and admins adjust schedule or status.
async fn update_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<BookingUpdate>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::TattooArtist, Role::Admin])?;

    guard::validate_booking_schedule(payload.date.as_deref(), payload.time.as_deref())?;
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

/// DELETE /api/bookings/:id - Allowed for the booking's client, its
/// artist, or an admin.
async fn delete_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::Client, Role::TattooArtist, Role::Admin])?;

    let bookings: Repository<Booking> = Repository::new("bookings", state.pool.clone());
    let booking = bookings
        .select_optional(FilterData {
            where_clause: Some(json!({ "id": id })),
            ..Default::default()
        })
        .await?
        .ok_or_else(|| ApiError::not_found("Booking not found."))?;

    if !guard::can_delete_booking(&user, &booking) {
        return Err(ApiError::forbidden("You cannot delete this booking."));
    }

    bookings
        .delete_where(FilterData {
            where_clause: Some(json!({ "id": id })),
            ..Default::default()
        })
        .await?;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Booking deleted successfully." })),
    ))
}
