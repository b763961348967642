use axum::{
    Router,
    routing::{get, post},
};

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> Router<AppState> {
    Router::new()
        .route("/ping", get(handlers::health::ping))
        .route(
            "/upload.cgi",
            post(handlers::upload::upload_picture)
                .layer(handlers::upload::upload_body_limit(&config.upload)),
        )
        // `/<hash>` and `/<hash>.png` share a segment; the handler tells them apart.
        .route("/{name}", get(handlers::picture::get_picture))
}
