use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use uuid::Uuid;

/// A booking request from a client to a tattoo artist, optionally tied to
/// a flash tattoo design. Status is open-ended text, "pending" at creation.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub client_id: Uuid,
    pub tattoo_artist_id: Uuid,
    pub flash_tattoo_id: Option<Uuid>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Date/time/status edits available to artists and admins.
#[derive(Debug, Deserialize)]
pub struct BookingUpdate {
    pub date: Option<String>,
    pub time: Option<String>,
    pub status: Option<String>,
}

impl BookingUpdate {
    pub fn into_update_map(self) -> Map<String, Value> {
        let mut updates = Map::new();
        if let Some(date) = self.date {
            updates.insert("date".to_string(), Value::String(date));
        }
        if let Some(time) = self.time {
            updates.insert("time".to_string(), Value::String(time));
        }
        if let Some(status) = self.status {
            updates.insert("status".to_string(), Value::String(status));
        }
        updates
    }
}

/// Admin-side booking update: every field may be reassigned.
#[derive(Debug, Deserialize)]
pub struct AdminBookingUpdate {
    pub client_id: Option<Uuid>,
    pub flash_tattoo_id: Option<Uuid>,
    pub tattoo_artist_id: Option<Uuid>,
    #[serde(flatten)]
    pub schedule: BookingUpdate,
}

impl AdminBookingUpdate {
    pub fn into_update_map(self) -> Map<String, Value> {
        let mut updates = self.schedule.into_update_map();
        if let Some(client_id) = self.client_id {
            updates.insert("client_id".to_string(), Value::String(client_id.to_string()));
        }
        if let Some(flash_tattoo_id) = self.flash_tattoo_id {
            updates.insert(
                "flash_tattoo_id".to_string(),
                Value::String(flash_tattoo_id.to_string()),
            );
        }
        if let Some(tattoo_artist_id) = self.tattoo_artist_id {
            updates.insert(
                "tattoo_artist_id".to_string(),
                Value::String(tattoo_artist_id.to_string()),
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
        let payload = BookingUpdate {
            date: None,
            time: None,
            status: None,
        };
        assert!(payload.into_update_map().is_empty());
    }

    #[test]
    fn admin_update_flattens_schedule_fields() {
        let client_id = Uuid::new_v4();
        let payload = AdminBookingUpdate {
            client_id: Some(client_id),
            flash_tattoo_id: None,
            tattoo_artist_id: None,
            schedule: BookingUpdate {
                date: Some("2025-03-01".to_string()),
                time: None,
                status: Some("confirmed".to_string()),
            },
        };
        let updates = payload.into_update_map();
        assert_eq!(updates.len(), 3);
        assert_eq!(updates["client_id"], client_id.to_string());
        assert_eq!(updates["status"], "confirmed");
    }
}
