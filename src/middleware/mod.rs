pub mod auth;

pub use auth::{authorize, optional_auth, require_auth, AuthUser, MaybeUser};
