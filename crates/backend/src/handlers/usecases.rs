use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use contracts::usecases::u101_import_estimate::{
    progress::ImportProgress, ImportRequest, ImportResponse,
};

use crate::domain::a001_estimate;
use crate::routes::AppState;

// ============================================================================
// UseCase u101: Import estimate from file
// ============================================================================

/// Поля multipart-формы запуска импорта
#[derive(Default)]
struct ImportForm {
    estimate_id: Option<String>,
    replace_existing: bool,
    file_name: Option<String>,
    content: Option<Vec<u8>>,
}

async fn read_import_form(multipart: &mut Multipart) -> anyhow::Result<ImportForm> {
    let mut form = ImportForm::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "estimate_id" => form.estimate_id = Some(field.text().await?.trim().to_string()),
            "replace_existing" => {
                let value = field.text().await?.trim().to_lowercase();
                form.replace_existing = matches!(value.as_str(), "true" | "1" | "on" | "yes");
            }
            "file" => {
                form.file_name = field.file_name().map(str::to_string);
                form.content = Some(field.bytes().await?.to_vec());
            }
            other => tracing::debug!("Ignoring multipart field '{}'", other),
        }
    }
    Ok(form)
}

/// POST /api/u101/import/start
pub async fn u101_start_import(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ImportResponse>, axum::http::StatusCode> {
    let form = match read_import_form(&mut multipart).await {
        Ok(form) => form,
        Err(e) => {
            tracing::error!("Failed to read import upload: {}", e);
            return Err(axum::http::StatusCode::BAD_REQUEST);
        }
    };

    let (Some(estimate_id), Some(content)) = (form.estimate_id, form.content) else {
        return Err(axum::http::StatusCode::BAD_REQUEST);
    };
    let uuid = uuid::Uuid::parse_str(&estimate_id)
        .map_err(|_| axum::http::StatusCode::BAD_REQUEST)?;

    match a001_estimate::service::get_by_id(&state.db, uuid).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(axum::http::StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to load estimate {}: {}", estimate_id, e);
            return Err(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    let request = ImportRequest {
        estimate_id,
        file_name: form.file_name.unwrap_or_default(),
        replace_existing: form.replace_existing,
    };
    match state.import_executor.start_import(request, content).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            tracing::error!("Failed to start estimate import: {}", e);
            Err(axum::http::StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /api/u101/import/:session_id/progress
pub async fn u101_get_progress(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ImportProgress>, axum::http::StatusCode> {
    match state.import_executor.get_progress(&session_id) {
        Some(progress) => Ok(Json(progress)),
        None => Err(axum::http::StatusCode::NOT_FOUND),
    }
}
