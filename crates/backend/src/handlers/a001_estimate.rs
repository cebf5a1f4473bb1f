use axum::{
    extract::{Path, State},
    Json,
};
use contracts::domain::a001_estimate::aggregate::{Estimate, EstimateDto};
use contracts::domain::a002_estimate_item::EstimateItem;
use serde_json::json;

use crate::domain::{a001_estimate, a002_estimate_item};
use crate::routes::AppState;

fn parse_id(id: &str) -> Result<uuid::Uuid, axum::http::StatusCode> {
    uuid::Uuid::parse_str(id).map_err(|_| axum::http::StatusCode::BAD_REQUEST)
}

/// GET /api/estimate
pub async fn list_all(
    State(state): State<AppState>,
) -> Result<Json<Vec<Estimate>>, axum::http::StatusCode> {
    match a001_estimate::service::list_all(&state.db).await {
        Ok(v) => Ok(Json(v)),
        Err(e) => {
            tracing::error!("Failed to list estimates: {}", e);
            Err(axum::http::StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /api/estimate/:id
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Estimate>, axum::http::StatusCode> {
    let uuid = parse_id(&id)?;
    match a001_estimate::service::get_by_id(&state.db, uuid).await {
        Ok(Some(v)) => Ok(Json(v)),
        Ok(None) => Err(axum::http::StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to load estimate {}: {}", id, e);
            Err(axum::http::StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// POST /api/estimate
pub async fn upsert(
    State(state): State<AppState>,
    Json(dto): Json<EstimateDto>,
) -> Result<Json<serde_json::Value>, axum::http::StatusCode> {
    match a001_estimate::service::upsert(&state.db, dto).await {
        Ok(id) => Ok(Json(json!({"id": id.to_string()}))),
        Err(e) => {
            tracing::error!("Failed to save estimate: {}", e);
            Err(axum::http::StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// DELETE /api/estimate/:id
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(), axum::http::StatusCode> {
    let uuid = parse_id(&id)?;
    match a001_estimate::service::delete(&state.db, uuid).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(axum::http::StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to delete estimate {}: {}", id, e);
            Err(axum::http::StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /api/estimate/:id/items
pub async fn list_items(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<EstimateItem>>, axum::http::StatusCode> {
    let uuid = parse_id(&id)?;
    match a002_estimate_item::repository::list_by_estimate(&state.db, uuid).await {
        Ok(items) => Ok(Json(items)),
        Err(e) => {
            tracing::error!("Failed to list items of estimate {}: {}", id, e);
            Err(axum::http::StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
