use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A client's favorite: exactly one of the three targets is expected to be
/// set (enforced by the guard before insert and by a table constraint).
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Favorite {
    pub id: Uuid,
    pub client_id: Uuid,
    pub flash_tattoo_id: Option<Uuid>,
    pub tattoo_artist_id: Option<Uuid>,
    pub shop_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
