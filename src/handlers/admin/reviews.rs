use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::auth::Role;
use crate::database::models::review::ReviewUpdate;
use crate::database::models::{to_json, Review};
use crate::database::Repository;
use crate::enrich;
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::guard;
use crate::handlers::reviews::CLIENT_EMBED;
use crate::middleware::{authorize, AuthUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AdminReviewListQuery {
    pub tattoo_artist_id: Option<Uuid>,
    pub shop_id: Option<Uuid>,
}

/// GET /api/admin/reviews - All reviews, optionally filtered by target.
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<AdminReviewListQuery>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::Admin])?;

    let mut conditions = Map::new();
    if let Some(tattoo_artist_id) = query.tattoo_artist_id {
        conditions.insert("tattoo_artist_id".to_string(), json!(tattoo_artist_id));
    }
    if let Some(shop_id) = query.shop_id {
        conditions.insert("shop_id".to_string(), json!(shop_id));
    }

    let reviews: Repository<Review> = Repository::new("reviews", state.pool.clone());
    let rows = reviews
        .select_any(FilterData {
            where_clause: Some(Value::Object(conditions)),
            ..Default::default()
        })
        .await?;

    let mut payload: Vec<Value> = rows.iter().map(to_json).collect();
    enrich::embed(&state.pool, &mut payload, &[CLIENT_EMBED]).await?;

    Ok((StatusCode::OK, Json(json!({ "reviews": payload }))))
}

#[derive(Debug, Deserialize)]
pub struct AdminReviewCreate {
    pub client_id: Option<Uuid>,
    pub tattoo_artist_id: Option<Uuid>,
    pub shop_id: Option<Uuid>,
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

/// POST /api/admin/reviews - Record a review on behalf of any client.
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<AdminReviewCreate>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::Admin])?;

    let (Some(client_id), Some(rating)) = (payload.client_id, payload.rating) else {
        return Err(ApiError::bad_request(
            "The client_id, rating, and a target (tattoo_artist_id or shop_id) are required.",
        ));
    };
    guard::validate_review_target(payload.tattoo_artist_id, payload.shop_id)?;
    guard::validate_rating(rating)?;

    let mut values = Map::new();
    values.insert("client_id".to_string(), Value::String(client_id.to_string()));
    if let Some(tattoo_artist_id) = payload.tattoo_artist_id {
        values.insert(
            "tattoo_artist_id".to_string(),
            Value::String(tattoo_artist_id.to_string()),
        );
    }
    if let Some(shop_id) = payload.shop_id {
        values.insert("shop_id".to_string(), Value::String(shop_id.to_string()));
    }
    values.insert("rating".to_string(), json!(rating));
    if let Some(comment) = payload.comment {
        values.insert("comment".to_string(), Value::String(comment));
    }

    let reviews: Repository<Review> = Repository::new("reviews", state.pool.clone());
    let review = reviews.insert_one(&values).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Review added successfully.",
            "review": to_json(&review),
        })),
    ))
}

/// PUT /api/admin/reviews/:id - Edit any review.
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewUpdate>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::Admin])?;

    if let Some(rating) = payload.rating {
        guard::validate_rating(rating)?;
    }
    let updates = payload.into_update_map();
    if updates.is_empty() {
        return Err(ApiError::bad_request(
            "At least one field (rating or comment) must be provided.",
        ));
    }

    let reviews: Repository<Review> = Repository::new("reviews", state.pool.clone());
    let updated = reviews
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
        .ok_or_else(|| ApiError::not_found("Review not found."))?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Review updated successfully.",
            "review": to_json(&updated),
        })),
    ))
}

/// DELETE /api/admin/reviews/:id
pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::Admin])?;

    let reviews: Repository<Review> = Repository::new("reviews", state.pool.clone());
    let deleted = reviews
        .delete_where(FilterData {
            where_clause: Some(json!({ "id": id })),
            ..Default::default()
        })
        .await?;

    if deleted.is_empty() {
        return Err(ApiError::not_found("Review not found."));
    }

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Review deleted successfully." })),
    ))
}
