use sqlx::PgPool;

/// Application context handed to every handler. The pool is built once at
/// startup; cloning is cheap (it is reference-counted internally).
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
}
