//! HTTP route definitions

use crate::{handlers, AppState};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Create the main router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Account
        .route("/b2api/v1/b2_authorize_account", get(handlers::authorize_account))
        // Buckets
        .route("/b2api/v1/b2_create_bucket", get(handlers::create_bucket))
        .route("/b2api/v1/b2_delete_bucket", post(handlers::delete_bucket))
        .route("/b2api/v1/b2_update_bucket", post(handlers::update_bucket))
        .route("/b2api/v1/b2_list_buckets", post(handlers::list_buckets))
        // Uploads
        .route("/b2api/v1/b2_get_upload_url", post(handlers::get_upload_url))
        .route("/b2api/v1/b2_upload_file/{bucket_id}", post(handlers::upload_file))
        // Files
        .route("/b2api/v1/b2_list_file_names", post(handlers::list_file_names))
        .route("/b2api/v1/b2_list_file_versions", post(handlers::list_file_versions))
        .route("/b2api/v1/b2_get_file_info", post(handlers::get_file_info))
        .route("/b2api/v1/b2_delete_file_version", post(handlers::delete_file_version))
        .route("/b2api/v1/b2_hide_file", post(handlers::hide_file))
        // Downloads
        .route("/b2api/v1/b2_download_file_by_id", get(handlers::download_file_by_id))
        .route("/file/{bucket_name}/{*file_name}", get(handlers::download_file_by_name))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(state.config.max_upload_size))
        .with_state(state)
}
