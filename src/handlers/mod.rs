pub mod admin;
pub mod artists;
pub mod auth;
pub mod bookings;
pub mod favorites;
pub mod reviews;
pub mod tattoos;
pub mod users;
