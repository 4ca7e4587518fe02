use axum::routing::{delete, get, post};
use axum::Router;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use veil_core::config::AppConfig;
use veil_core::{routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    veil_shared::middleware::init_tracing("veil-core");

    let config = AppConfig::load()?;
    let port = config.port;

    let manager = ConnectionManager::<PgConnection>::new(&config.database_url);
    let db = Pool::builder().max_size(10).build(manager)?;

    let metrics_handle = veil_shared::middleware::init_metrics();

    let state = Arc::new(AppState { db, config, metrics_handle });

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::health::metrics))
        .route("/me", get(routes::profile::me))
        .route("/discover", get(routes::discover::discover))
        .route("/profiles/:id", get(routes::profile::view_profile))
        .route("/likes/:target_id", post(routes::likes::like_user))
        .route("/matches/:match_id/reveal", post(routes::reveal::request_reveal))
        .route("/matches/:match_id/reveal/accept", post(routes::reveal::accept_reveal))
        .route("/chat", get(routes::chat::chat_list))
        .route("/chat/unread-count", get(routes::chat::unread_count))
        .route("/chat/:match_id", get(routes::chat::open_thread))
        .route(
            "/chat/rooms/:room_id/messages",
            get(routes::chat::fetch_messages).post(routes::chat::send_message),
        )
        .route("/chat/messages/:message_id", delete(routes::chat::delete_message))
        // Internal service-to-service endpoints (no auth)
        .route("/internal/presence", post(routes::internal::update_presence))
        .layer(axum::middleware::from_fn(veil_shared::middleware::metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "veil-core starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
