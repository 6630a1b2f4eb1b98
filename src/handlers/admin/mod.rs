// Administrative surface: the same entities, unscoped, gated on the admin
// role. Every handler re-checks the role after the auth middleware.

pub mod bookings;
pub mod favorites;
pub mod reviews;
pub mod tattoos;
pub mod users;

use axum::{
    middleware,
    routing::{delete, get, put},
    Router,
};

use crate::middleware::require_auth;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(users::list).post(users::create))
        .route(
            "/users/:id",
            get(users::get).put(users::update).delete(users::remove),
        )
        .route("/tattoos", get(tattoos::list).post(tattoos::create))
        .route(
            "/tattoos/:id",
            get(tattoos::get).put(tattoos::update).delete(tattoos::remove),
        )
        .route("/bookings", get(bookings::list).post(bookings::create))
        .route(
            "/bookings/:id",
            get(bookings::get)
                .put(bookings::update)
                .delete(bookings::remove),
        )
        .route("/favorites", get(favorites::list).post(favorites::create))
        .route("/favorites/:id", delete(favorites::remove))
        .route("/reviews", get(reviews::list).post(reviews::create))
        .route(
            "/reviews/:id",
            put(reviews::update).delete(reviews::remove),
        )
        .route_layer(middleware::from_fn(require_auth))
}
