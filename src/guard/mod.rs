// Ownership and referential checks executed before writes. Each guard is a
// plain predicate: on failure the handler returns before any persistence
// call is made.

use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::Role;
use crate::database::models::flash_tattoo::SIZES;
use crate::database::models::{Booking, FlashTattoo, User};
use crate::database::Repository;
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::AuthUser;

pub fn validate_size(size: &str) -> Result<(), ApiError> {
    if SIZES.contains(&size) {
        Ok(())
    } else {
        Err(ApiError::bad_request(
            "Size must be 'small', 'medium' or 'large'.",
        ))
    }
}

pub fn validate_price(price: f64) -> Result<(), ApiError> {
    if price >= 0.0 {
        Ok(())
    } else {
        Err(ApiError::bad_request("Price must be non-negative."))
    }
}

pub fn validate_rating(rating: i32) -> Result<(), ApiError> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(ApiError::bad_request("Rating must be between 1 and 5."))
    }
}

/// A review needs at least one target.
pub fn validate_review_target(
    tattoo_artist_id: Option<Uuid>,
    shop_id: Option<Uuid>,
) -> Result<(), ApiError> {
    if tattoo_artist_id.is_none() && shop_id.is_none() {
        return Err(ApiError::bad_request(
            "A review requires a target (tattoo_artist_id or shop_id).",
        ));
    }
    Ok(())
}

/// A favorite needs at least one target.
pub fn validate_favorite_target(
    flash_tattoo_id: Option<Uuid>,
    tattoo_artist_id: Option<Uuid>,
    shop_id: Option<Uuid>,
) -> Result<(), ApiError> {
    if flash_tattoo_id.is_none() && tattoo_artist_id.is_none() && shop_id.is_none() {
        return Err(ApiError::bad_request(
            "A favorite target (flash_tattoo_id, tattoo_artist_id or shop_id) is required.",
        ));
    }
    Ok(())
}

/// Booking dates and times arrive as strings; reject unparseable values
/// before they reach the store.
pub fn validate_booking_schedule(
    date: Option<&str>,
    time: Option<&str>,
) -> Result<(), ApiError> {
    if let Some(date) = date {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| ApiError::bad_request("Invalid date format, expected YYYY-MM-DD."))?;
    }
    if let Some(time) = time {
        NaiveTime::parse_from_str(time, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M"))
            .map_err(|_| ApiError::bad_request("Invalid time format, expected HH:MM."))?;
    }
    Ok(())
}

/// Confirm that a referenced user exists and actually is a tattoo artist.
/// Runs as its own lookup right before the insert; the race with a
/// concurrent role change is accepted.
pub async fn ensure_tattoo_artist(pool: &PgPool, artist_id: Uuid) -> Result<(), ApiError> {
    let users: Repository<User> = Repository::new("users", pool.clone());
    let artist = users
        .select_optional(FilterData {
            where_clause: Some(json!({
                "id": artist_id,
                "role": Role::TattooArtist.as_str(),
            })),
            ..Default::default()
        })
        .await?;

    if artist.is_none() {
        return Err(ApiError::bad_request(
            "The provided ID does not belong to a valid tattoo artist.",
        ));
    }
    Ok(())
}

/// Bookings can be deleted by their client, their artist, or an admin.
pub fn can_delete_booking(user: &AuthUser, booking: &Booking) -> bool {
    user.role == Role::Admin || booking.client_id == user.id || booking.tattoo_artist_id == user.id
}

/// Flash tattoos can only be changed by their owning artist or an admin.
pub fn can_modify_tattoo(user: &AuthUser, tattoo: &FlashTattoo) -> bool {
    user.role == Role::Admin || tattoo.user_id == user.id
}

/// Ownership scope for mutations on client-owned rows: admins operate
/// unscoped, everyone else is restricted to their own rows.
pub fn owner_scope(user: &AuthUser) -> Option<Uuid> {
    if user.role == Role::Admin {
        None
    } else {
        Some(user.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user_with_role(id: Uuid, role: Role) -> AuthUser {
        AuthUser {
            id,
            email: "t@example.com".to_string(),
            role,
        }
    }

    fn booking_between(client_id: Uuid, artist_id: Uuid) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            client_id,
            tattoo_artist_id: artist_id,
            flash_tattoo_id: None,
            date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            time: NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
            status: "pending".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn size_validation() {
        for size in SIZES {
            assert!(validate_size(size).is_ok());
        }
        assert!(validate_size("enormous").is_err());
        assert!(validate_size("Small").is_err());
    }

    #[test]
    fn rating_bounds_are_inclusive() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
    }

    #[test]
    fn negative_price_is_rejected() {
        assert!(validate_price(0.0).is_ok());
        assert!(validate_price(49.99).is_ok());
        assert!(validate_price(-0.01).is_err());
    }

    #[test]
    fn review_needs_a_target() {
        assert!(validate_review_target(None, None).is_err());
        assert!(validate_review_target(Some(Uuid::new_v4()), None).is_ok());
        assert!(validate_review_target(None, Some(Uuid::new_v4())).is_ok());
    }

    #[test]
    fn favorite_needs_a_target() {
        assert!(validate_favorite_target(None, None, None).is_err());
        assert!(validate_favorite_target(Some(Uuid::new_v4()), None, None).is_ok());
    }

    #[test]
    fn schedule_validation() {
        assert!(validate_booking_schedule(Some("2025-03-01"), Some("14:30")).is_ok());
        assert!(validate_booking_schedule(Some("2025-03-01"), Some("14:30:15")).is_ok());
        assert!(validate_booking_schedule(None, None).is_ok());
        assert!(validate_booking_schedule(Some("01/03/2025"), None).is_err());
        assert!(validate_booking_schedule(None, Some("half past two")).is_err());
    }

    #[test]
    fn booking_delete_permission_matrix() {
        let client_id = Uuid::new_v4();
        let artist_id = Uuid::new_v4();
        let booking = booking_between(client_id, artist_id);

        assert!(can_delete_booking(
            &user_with_role(client_id, Role::Client),
            &booking
        ));
        assert!(can_delete_booking(
            &user_with_role(artist_id, Role::TattooArtist),
            &booking
        ));
        assert!(can_delete_booking(
            &user_with_role(Uuid::new_v4(), Role::Admin),
            &booking
        ));
        // An unrelated client may not delete someone else's booking
        assert!(!can_delete_booking(
            &user_with_role(Uuid::new_v4(), Role::Client),
            &booking
        ));
    }

    #[test]
    fn tattoo_ownership_matrix() {
        let owner_id = Uuid::new_v4();
        let tattoo = FlashTattoo {
            id: Uuid::new_v4(),
            user_id: owner_id,
            title: "Rose".to_string(),
            description: None,
            image_url: None,
            price: rust_decimal::Decimal::new(5000, 2),
            color: false,
            size: "small".to_string(),
            available: true,
            created_at: Utc::now(),
        };

        assert!(can_modify_tattoo(
            &user_with_role(owner_id, Role::TattooArtist),
            &tattoo
        ));
        assert!(can_modify_tattoo(
            &user_with_role(Uuid::new_v4(), Role::Admin),
            &tattoo
        ));
        assert!(!can_modify_tattoo(
            &user_with_role(Uuid::new_v4(), Role::TattooArtist),
            &tattoo
        ));
    }

    #[test]
    fn owner_scope_is_lifted_for_admins() {
        let id = Uuid::new_v4();
        assert_eq!(owner_scope(&user_with_role(id, Role::Client)), Some(id));
        assert_eq!(owner_scope(&user_with_role(id, Role::Admin)), None);
    }
}
