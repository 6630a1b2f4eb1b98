pub mod booking;
pub mod favorite;
pub mod flash_tattoo;
pub mod review;
pub mod user;

pub use booking::Booking;
pub use favorite::Favorite;
pub use flash_tattoo::FlashTattoo;
pub use review::Review;
pub use user::User;

/// Serialize an entity for a JSON response body.
pub fn to_json<T: serde::Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}
