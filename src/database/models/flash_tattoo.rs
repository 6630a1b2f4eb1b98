use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use uuid::Uuid;

pub const SIZES: [&str; 3] = ["small", "medium", "large"];

/// A flash tattoo design listed by its owning artist.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FlashTattoo {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: Decimal,
    pub color: bool,
    pub size: String,
    pub available: bool,
    pub created_at: DateTime<Utc>,
}

/// Partial update payload for the admin JSON route.
#[derive(Debug, Deserialize)]
pub struct TattooUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<f64>,
    pub color: Option<bool>,
    pub size: Option<String>,
    pub available: Option<bool>,
}

impl TattooUpdate {
    pub fn into_update_map(self) -> Map<String, Value> {
        let mut updates = Map::new();
        if let Some(title) = self.title {
            updates.insert("title".to_string(), Value::String(title));
        }
        if let Some(description) = self.description {
            updates.insert("description".to_string(), Value::String(description));
        }
        if let Some(image_url) = self.image_url {
            updates.insert("image_url".to_string(), Value::String(image_url));
        }
        if let Some(price) = self.price {
            updates.insert("price".to_string(), serde_json::json!(price));
        }
        if let Some(color) = self.color {
            updates.insert("color".to_string(), Value::Bool(color));
        }
        if let Some(size) = self.size {
            updates.insert("size".to_string(), Value::String(size));
        }
        if let Some(available) = self.available {
            updates.insert("available".to_string(), Value::Bool(available));
        }
        updates
    }
}

/// Serialize for a response, turning a stored `/uploads/...` path into an
/// absolute URL under the configured public base.
pub fn to_public_json(tattoo: &FlashTattoo) -> Value {
    let mut value = super::to_json(tattoo);
    publicize_image_url(&mut value);
    value
}

pub fn publicize_image_url(value: &mut Value) {
    let Some(path) = value.get("image_url").and_then(Value::as_str) else {
        return;
    };
    if path.starts_with('/') {
        let url = crate::uploads::public_url(path);
        value["image_url"] = Value::String(url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn update_map_keeps_only_present_fields() {
        let payload = TattooUpdate {
            title: Some("Rose".to_string()),
            description: None,
            image_url: None,
            price: Some(75.5),
            color: None,
            size: None,
            available: Some(false),
        };
        let updates = payload.into_update_map();
        assert_eq!(updates.len(), 3);
        assert_eq!(updates["title"], "Rose");
        assert_eq!(updates["price"], json!(75.5));
        assert_eq!(updates["available"], json!(false));
    }

    #[test]
    fn stored_upload_paths_become_absolute() {
        let mut value = json!({ "image_url": "/uploads/abc.png" });
        publicize_image_url(&mut value);
        let url = value["image_url"].as_str().unwrap();
        assert!(url.starts_with("http"));
        assert!(url.ends_with("/uploads/abc.png"));
    }

    #[test]
    fn external_urls_are_left_alone() {
        let mut value = json!({ "image_url": "https://cdn.example.com/rose.png" });
        publicize_image_url(&mut value);
        assert_eq!(value["image_url"], "https://cdn.example.com/rose.png");
    }

    #[test]
    fn missing_image_is_a_no_op() {
        let mut value = json!({ "image_url": null, "title": "Rose" });
        publicize_image_url(&mut value);
        assert_eq!(value["image_url"], Value::Null);
    }
}
