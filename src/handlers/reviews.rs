use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::auth::Role;
use crate::database::models::review::ReviewUpdate;
use crate::database::models::{to_json, Review};
use crate::database::Repository;
use crate::enrich::{self, EmbedRule, Projection};
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::guard;
use crate::middleware::{authorize, require_auth, AuthUser};
use crate::state::AppState;

pub const CLIENT_EMBED: EmbedRule = EmbedRule {
    fk: "client_id",
    table: "users",
    columns: &["name", "email"],
    key: "client",
    projection: Projection::Object,
};

pub fn routes() -> Router<AppState> {
    let public = Router::new().route("/", get(list_reviews));

    let protected = Router::new()
        .route("/", post(create_review))
        .route("/:id", put(update_review))
        .route("/:id", delete(delete_review))
        .route_layer(middleware::from_fn(require_auth));

    public.merge(protected)
}

#[derive(Debug, Deserialize)]
pub struct ReviewListQuery {
    pub tattoo_artist_id: Option<Uuid>,
    pub shop_id: Option<Uuid>,
}

/// GET /api/reviews - Public reviews for one artist or one shop.
async fn list_reviews(
    State(state): State<AppState>,
    Query(query): Query<ReviewListQuery>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let conditions = match (query.tattoo_artist_id, query.shop_id) {
        (Some(artist_id), _) => json!({ "tattoo_artist_id": artist_id }),
        (None, Some(shop_id)) => json!({ "shop_id": shop_id }),
        (None, None) => {
            return Err(ApiError::bad_request(
                "A tattoo_artist or shop identifier is required.",
            ))
        }
    };

    let reviews: Repository<Review> = Repository::new("reviews", state.pool.clone());
    let rows = reviews
        .select_any(FilterData {
            where_clause: Some(conditions),
            ..Default::default()
        })
        .await?;

    let mut payload: Vec<Value> = rows.iter().map(to_json).collect();
    enrich::embed(&state.pool, &mut payload, &[CLIENT_EMBED]).await?;

    Ok((StatusCode::OK, Json(json!({ "reviews": payload }))))
}

#[derive(Debug, Deserialize)]
pub struct ReviewCreate {
    pub tattoo_artist_id: Option<Uuid>,
    pub shop_id: Option<Uuid>,
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

/// POST /api/reviews - Leave a review as the authenticated client.
async fn create_review(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<ReviewCreate>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::Client, Role::Admin])?;

    let Some(rating) = payload.rating else {
        return Err(ApiError::bad_request(
            "A review requires a rating and a target (tattoo_artist_id or shop_id).",
        ));
    };
    guard::validate_review_target(payload.tattoo_artist_id, payload.shop_id)?;
    guard::validate_rating(rating)?;

    let mut values = Map::new();
    values.insert("client_id".to_string(), Value::String(user.id.to_string()));
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

/// PUT /api/reviews/:id - Authors edit their own reviews; admins any.
async fn update_review(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewUpdate>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::Client, Role::Admin])?;

    if let Some(rating) = payload.rating {
        guard::validate_rating(rating)?;
    }
    let updates = payload.into_update_map();
    if updates.is_empty() {
        return Err(ApiError::bad_request(
            "At least one field (rating or comment) must be provided.",
        ));
    }

    let mut conditions = Map::new();
    conditions.insert("id".to_string(), json!(id));
    if let Some(owner_id) = guard::owner_scope(&user) {
        conditions.insert("client_id".to_string(), json!(owner_id));
    }

    let reviews: Repository<Review> = Repository::new("reviews", state.pool.clone());
    let updated = reviews
        .update_where(
            FilterData {
                where_clause: Some(Value::Object(conditions)),
                ..Default::default()
            },
            &updates,
        )
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::not_found("Review not found or not yours."))?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Review updated successfully.",
            "review": to_json(&updated),
        })),
    ))
}

/// DELETE /api/reviews/:id - Same ownership rule as updates.
async fn delete_review(
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

    let reviews: Repository<Review> = Repository::new("reviews", state.pool.clone());
    let deleted = reviews
        .delete_where(FilterData {
            where_clause: Some(Value::Object(conditions)),
            ..Default::default()
        })
        .await?;

    if deleted.is_empty() {
        return Err(ApiError::not_found("Review not found or not yours."));
    }

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Review deleted successfully." })),
    ))
}
