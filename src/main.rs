use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

mod auth;
mod config;
mod database;
mod enrich;
mod error;
mod filter;
mod guard;
mod handlers;
mod middleware;
mod state;
mod uploads;

use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    let config = crate::config::config();
    tracing_subscriber::fmt::init();
    tracing::info!("Starting Platypink API in {:?} mode", config.environment);

    let pool = database::manager::connect_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app = app(AppState { pool });

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        // Public service endpoints
        .route("/", get(root))
        .route("/health", get(health))
        // Entity routes
        .nest("/api/auth", handlers::auth::routes())
        .nest("/api/users", handlers::users::routes())
        .nest("/api/artists", handlers::artists::routes())
        .nest("/api/tattoos", handlers::tattoos::routes())
        .nest("/api/bookings", handlers::bookings::routes())
        .nest("/api/favorites", handlers::favorites::routes())
        .nest("/api/reviews", handlers::reviews::routes())
        .nest("/api/admin", handlers::admin::routes())
        // Uploaded images are served straight from disk
        .nest_service("/uploads", ServeDir::new(&config::config().uploads.dir))
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Platypink API",
        "version": version,
        "description": "Booking marketplace backend for tattoo artists, shops and their clients",
        "endpoints": {
            "auth": "/api/auth/register, /api/auth/login (public)",
            "artists": "/api/artists[/:id] (public)",
            "tattoos": "/api/tattoos[/:id] (public listing/detail, protected mutations)",
            "reviews": "/api/reviews (public listing, protected mutations)",
            "bookings": "/api/bookings/* (protected)",
            "favorites": "/api/favorites/* (protected)",
            "users": "/api/users/me (protected)",
            "admin": "/api/admin/* (admin role)",
            "uploads": "/uploads/* (public static files)",
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match database::manager::health_check(&state.pool).await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "degraded",
                "timestamp": now,
                "database_error": e.to_string()
            })),
        ),
    }
}
