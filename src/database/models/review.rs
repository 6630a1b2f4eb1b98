use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use uuid::Uuid;

/// A 1-5 star review left by a client for an artist or a shop.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub client_id: Uuid,
    pub tattoo_artist_id: Option<Uuid>,
    pub shop_id: Option<Uuid>,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewUpdate {
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

impl ReviewUpdate {
    /// Build the update map; every accepted edit also bumps updated_at.
    pub fn into_update_map(self) -> Map<String, Value> {
        let mut updates = Map::new();
        if let Some(rating) = self.rating {
            updates.insert("rating".to_string(), serde_json::json!(rating));
        }
        if let Some(comment) = self.comment {
            updates.insert("comment".to_string(), Value::String(comment));
        }
        if !updates.is_empty() {
            updates.insert(
                "updated_at".to_string(),
                Value::String(Utc::now().to_rfc3339()),
            );
        }
        updates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_update_builds_empty_map() {
        let payload = ReviewUpdate {
            rating: None,
            comment: None,
        };
        assert!(payload.into_update_map().is_empty());
    }

    #[test]
    fn any_edit_touches_updated_at() {
        let payload = ReviewUpdate {
            rating: Some(4),
            comment: None,
        };
        let updates = payload.into_update_map();
        assert_eq!(updates["rating"], 4);
        assert!(updates.contains_key("updated_at"));
    }
}
