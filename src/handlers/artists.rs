use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::auth::Role;
use crate::database::models::{to_json, User};
use crate::database::Repository;
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_artists))
        .route("/:id", get(get_artist))
}

#[derive(Debug, Deserialize)]
pub struct ArtistListQuery {
    pub name: Option<String>,
    pub location: Option<String>,
}

/// GET /api/artists - Public tattoo artist directory.
async fn list_artists(
    State(state): State<AppState>,
    Query(query): Query<ArtistListQuery>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut conditions = Map::new();
    conditions.insert(
        "role".to_string(),
        Value::String(Role::TattooArtist.as_str().to_string()),
    );
    if let Some(name) = query.name {
        conditions.insert("name".to_string(), json!({ "$ilike": format!("%{}%", name) }));
    }
    if let Some(location) = query.location {
        conditions.insert(
            "location".to_string(),
            json!({ "$ilike": format!("%{}%", location) }),
        );
    }

    let users: Repository<User> = Repository::new("users", state.pool.clone());
    let artists = users
        .select_any(FilterData {
            where_clause: Some(Value::Object(conditions)),
            order: Some(json!("name asc")),
            ..Default::default()
        })
        .await?;

    let payload: Vec<Value> = artists.iter().map(to_json).collect();
    Ok((StatusCode::OK, Json(Value::Array(payload))))
}

/// GET /api/artists/:id - Public artist profile.
async fn get_artist(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let users: Repository<User> = Repository::new("users", state.pool.clone());
    let artist = users
        .select_optional(FilterData {
            where_clause: Some(json!({
                "id": id,
                "role": Role::TattooArtist.as_str(),
            })),
            ..Default::default()
        })
        .await?
        .ok_or_else(|| ApiError::not_found("Artist not found."))?;

    Ok((StatusCode::OK, Json(to_json(&artist))))
}
