use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use uuid::Uuid;

/// A marketplace account: client, tattoo artist, shop or admin. The
/// password hash is deliberately never serialized into responses.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: String,
    pub name: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub profile_image: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub social_links: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// Self-service profile update (`PUT /api/users/me`). Role is absent by
/// construction: only the admin payload can change it.
#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub profile_image: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub social_links: Option<Value>,
}

impl ProfileUpdate {
    pub fn into_update_map(self) -> Result<Map<String, Value>, bcrypt::BcryptError> {
        let mut updates = Map::new();
        if let Some(name) = self.name {
            updates.insert("name".to_string(), Value::String(name));
        }
        if let Some(email) = self.email {
            updates.insert("email".to_string(), Value::String(email));
        }
        if let Some(phone_number) = self.phone_number {
            updates.insert("phone_number".to_string(), Value::String(phone_number));
        }
        if let Some(address) = self.address {
            updates.insert("address".to_string(), Value::String(address));
        }
        if let Some(profile_image) = self.profile_image {
            updates.insert("profile_image".to_string(), Value::String(profile_image));
        }
        if let Some(description) = self.description {
            updates.insert("description".to_string(), Value::String(description));
        }
        if let Some(location) = self.location {
            updates.insert("location".to_string(), Value::String(location));
        }
        if let Some(social_links) = self.social_links {
            updates.insert("social_links".to_string(), social_links);
        }
        if let Some(password) = self.password {
            updates.insert(
                "password".to_string(),
                Value::String(hash_password(&password)?),
            );
        }
        Ok(updates)
    }
}

/// Admin-side user update (`PUT /api/admin/users/:id`): the profile fields
/// plus the role, which only this path may touch.
#[derive(Debug, Deserialize)]
pub struct AdminUserUpdate {
    #[serde(flatten)]
    pub profile: ProfileUpdate,
    pub role: Option<String>,
}

impl AdminUserUpdate {
    pub fn into_update_map(self) -> Result<Map<String, Value>, bcrypt::BcryptError> {
        let role = self.role.clone();
        let mut updates = self.profile.into_update_map()?;
        if let Some(role) = role {
            updates.insert("role".to_string(), Value::String(role));
        }
        Ok(updates)
    }
}

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(password, hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_profile() -> ProfileUpdate {
        ProfileUpdate {
            name: None,
            email: None,
            password: None,
            phone_number: None,
            address: None,
            profile_image: None,
            description: None,
            location: None,
            social_links: None,
        }
    }

    #[test]
    fn empty_payload_builds_empty_map() {
        let updates = empty_profile().into_update_map().unwrap();
        assert!(updates.is_empty());
    }

    #[test]
    fn password_is_hashed_and_verifiable() {
        let payload = ProfileUpdate {
            password: Some("hunter2".to_string()),
            ..empty_profile()
        };
        let updates = payload.into_update_map().unwrap();
        let stored = updates["password"].as_str().unwrap();

        assert_ne!(stored, "hunter2");
        assert!(verify_password("hunter2", stored).unwrap());
        assert!(!verify_password("wrong-password", stored).unwrap());
    }

    #[test]
    fn only_present_fields_are_applied() {
        let payload = ProfileUpdate {
            name: Some("Ana".to_string()),
            location: Some("Lyon".to_string()),
            ..empty_profile()
        };
        let updates = payload.into_update_map().unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates["name"], "Ana");
        assert_eq!(updates["location"], "Lyon");
    }

    #[test]
    fn admin_update_may_set_role() {
        let payload = AdminUserUpdate {
            profile: empty_profile(),
            role: Some("tattoo_artist".to_string()),
        };
        let updates = payload.into_update_map().unwrap();
        assert_eq!(updates["role"], "tattoo_artist");
    }

    #[test]
    fn serialized_user_never_exposes_password() {
        let user = User {
            id: uuid::Uuid::new_v4(),
            email: "a@b.com".to_string(),
            password: "$2b$12$secret-hash".to_string(),
            role: "client".to_string(),
            name: "Ana".to_string(),
            phone_number: None,
            address: None,
            profile_image: None,
            description: None,
            location: None,
            social_links: None,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("password").is_none());
        assert_eq!(value["email"], "a@b.com");
    }
}
