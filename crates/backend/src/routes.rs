use axum::{
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::handlers;
use crate::usecases::u101_import_estimate::ImportExecutor;

/// Общее состояние обработчиков
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub import_executor: Arc<ImportExecutor>,
}

/// Конфигурация всех роутов приложения
pub fn configure_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // A001 Estimate handlers
        .route(
            "/api/estimate",
            get(handlers::a001_estimate::list_all).post(handlers::a001_estimate::upsert),
        )
        .route(
            "/api/estimate/:id",
            get(handlers::a001_estimate::get_by_id).delete(handlers::a001_estimate::delete),
        )
        .route(
            "/api/estimate/:id/items",
            get(handlers::a001_estimate::list_items),
        )
        // UseCase u101: Import estimate from file
        .route(
            "/api/u101/import/start",
            post(handlers::usecases::u101_start_import),
        )
        .route(
            "/api/u101/import/:session_id/progress",
            get(handlers::usecases::u101_get_progress),
        )
        .with_state(state)
}
