use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

mod config;
mod models;
mod routes;
mod schema;
mod services;

#[cfg(test)]
mod test_support;

use config::AppConfig;
use kith_shared::clients::db::{create_pool, DbPool};
use kith_shared::clients::media::MediaStore;
use kith_shared::middleware::PrometheusHandle;

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub media: MediaStore,
    pub metrics_handle: PrometheusHandle,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    kith_shared::middleware::init_tracing("kith-feed");

    let config = AppConfig::load()?;
    let port = config.port;
    let media_root = config.media_root.clone();

    let db = create_pool(&config.database_url, config.db_pool_size)?;
    let media = MediaStore::new(&config.media_root, &config.media_public_url).await;
    let metrics_handle = kith_shared::middleware::init_metrics();

    let state = Arc::new(AppState {
        db,
        config,
        media,
        metrics_handle,
    });

    let app = Router::new()
        .route("/", get(routes::health::index))
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::health::metrics))
        .route("/profile", get(routes::profile::view_profile).post(routes::profile::update_profile))
        .route("/posts/new", get(routes::posts::new_post_form)
            .post(routes::posts::create_post)
            .layer(DefaultBodyLimit::max(10 * 1024 * 1024)))
        .route("/posts/:post_id/comments", get(routes::comments::view_comments).post(routes::comments::add_comment))
        .route("/feed", get(routes::feed::my_feed))
        .route("/feed/friends", get(routes::feed::friends_feed).post(routes::feed::submit_like))
        .route("/friends", get(routes::friends::friends_page).post(routes::friends::friends_action))
        .nest_service("/media", ServeDir::new(&media_root))
        .layer(axum::middleware::from_fn(kith_shared::middleware::metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "kith-feed starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
