use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
};

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, ClaveRequest, EncasteDto, MessageResponse, AppState};
use crate::constants::fotos::ENCASTE_SLOTS;
use crate::models::EncasteInput;
use crate::services::UploadBatch;

struct EncasteForm {
    input: EncasteInput,
    imagenes: HashMap<String, String>,
    clave: Option<String>,
}

/// Multipart parsing mirrors the gallo form: photos stream through `batch`,
/// text fields land in the input, and the caller owns rollback.
async fn parse_form(
    user_id: i32,
    mut multipart: Multipart,
    batch: &mut UploadBatch<'_>,
) -> Result<EncasteForm, ApiError> {
    let mut form = EncasteForm {
        input: EncasteInput::default(),
        imagenes: HashMap::new(),
        clave: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Invalid multipart payload: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if let Some(file_name) = field.file_name().map(ToString::to_string) {
            if !ENCASTE_SLOTS.contains(&name.as_str()) {
                continue;
            }
            let content_type = field.content_type().map(ToString::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::validation(format!("Invalid photo upload: {e}")))?;
            if file_name.is_empty() || bytes.is_empty() {
                continue;
            }
            let url = batch
                .save(user_id, &file_name, content_type.as_deref(), &bytes)
                .await?;
            form.imagenes.insert(name, url);
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::validation(format!("Invalid form field: {e}")))?;
            if name == "clave_edicion" {
                form.clave = Some(value);
            } else {
                form.input
                    .set_field(&name, value)
                    .map_err(ApiError::validation)?;
            }
        }
    }

    Ok(form)
}

/// GET /api/encastes
pub async fn list_encastes(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<EncasteDto>>>, ApiError> {
    let encastes = state.store().list_encastes(current.id).await?;
    let dtos = encastes.into_iter().map(EncasteDto::from).collect();
    Ok(Json(ApiResponse::success(dtos)))
}

/// GET /api/encastes/{id}
pub async fn get_encaste(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<EncasteDto>>, ApiError> {
    let encaste = state
        .store()
        .get_encaste(&id, current.id)
        .await?
        .ok_or_else(|| ApiError::encaste_not_found(&id))?;
    Ok(Json(ApiResponse::success(EncasteDto::from(encaste))))
}

/// POST /api/encastes
///
/// Multipart form. The mating date and both plate numbers are required; egg
/// and hatch tracking fields may arrive later through edits.
pub async fn create_encaste(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<EncasteDto>>, ApiError> {
    let mut batch = UploadBatch::new(state.photos());
    let form = match parse_form(current.id, multipart, &mut batch).await {
        Ok(form) => form,
        Err(e) => {
            batch.rollback().await;
            return Err(e);
        }
    };

    let missing = [
        ("fecha_encaste", &form.input.fecha_encaste),
        ("placa_padrote", &form.input.placa_padrote),
        ("placa_gallina", &form.input.placa_gallina),
    ]
    .into_iter()
    .find(|(_, value)| value.as_deref().is_none_or(|v| v.trim().is_empty()));

    if let Some((field, _)) = missing {
        batch.rollback().await;
        return Err(ApiError::validation(format!("{field} es obligatorio")));
    }

    match state
        .store()
        .add_encaste(current.id, &form.input, &form.imagenes)
        .await
    {
        Ok(created) => {
            batch.commit();
            Ok(Json(ApiResponse::success(EncasteDto::from(created))))
        }
        Err(e) => {
            batch.rollback().await;
            Err(e.into())
        }
    }
}

/// PUT /api/encastes/{id}
pub async fn update_encaste(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<EncasteDto>>, ApiError> {
    let existing = state
        .store()
        .get_encaste(&id, current.id)
        .await?
        .ok_or_else(|| ApiError::encaste_not_found(&id))?;

    let mut batch = UploadBatch::new(state.photos());
    let form = match parse_form(current.id, multipart, &mut batch).await {
        Ok(form) => form,
        Err(e) => {
            batch.rollback().await;
            return Err(e);
        }
    };

    let verdict = match state
        .gate()
        .verify(existing.user_id, current.id, form.clave.as_deref().unwrap_or(""))
        .await
    {
        Ok(verdict) => verdict,
        Err(e) => {
            batch.rollback().await;
            return Err(e.into());
        }
    };
    if !verdict.is_authorized() {
        batch.rollback().await;
        return Err(ApiError::clave_incorrecta());
    }

    let replaced = replaced_urls(&existing, &form.imagenes);

    match state
        .store()
        .update_encaste(existing, &form.input, &form.imagenes)
        .await
    {
        Ok(updated) => {
            batch.commit();
            for url in replaced {
                if let Err(e) = state.photos().remove(&url).await {
                    tracing::warn!("Failed to remove replaced photo {url}: {e}");
                }
            }
            Ok(Json(ApiResponse::success(EncasteDto::from(updated))))
        }
        Err(e) => {
            batch.rollback().await;
            Err(e.into())
        }
    }
}

/// DELETE /api/encastes/{id}
pub async fn delete_encaste(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<ClaveRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let existing = state
        .store()
        .get_encaste(&id, current.id)
        .await?
        .ok_or_else(|| ApiError::encaste_not_found(&id))?;

    let verdict = state
        .gate()
        .verify(existing.user_id, current.id, &payload.clave_edicion)
        .await?;
    if !verdict.is_authorized() {
        return Err(ApiError::clave_incorrecta());
    }

    let urls = photo_urls(&existing);
    state.photos().remove_all(&urls).await?;

    let removed = state.store().remove_encaste(&id, current.id).await?;
    if !removed {
        return Err(ApiError::encaste_not_found(&id));
    }

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Encaste eliminado",
    ))))
}

fn photo_urls(encaste: &crate::entities::encastes::Model) -> Vec<String> {
    [
        &encaste.imagen_padrote,
        &encaste.imagen_gallina,
        &encaste.imagen_nido,
    ]
    .into_iter()
    .filter_map(|url| url.clone())
    .collect()
}

fn replaced_urls(
    encaste: &crate::entities::encastes::Model,
    imagenes: &HashMap<String, String>,
) -> Vec<String> {
    let slots: [(&str, &Option<String>); 3] = [
        ("imagen_padrote", &encaste.imagen_padrote),
        ("imagen_gallina", &encaste.imagen_gallina),
        ("imagen_nido", &encaste.imagen_nido),
    ];
    slots
        .into_iter()
        .filter_map(|(slot, old)| match (imagenes.get(slot), old) {
            (Some(new), Some(old)) if new != old => Some(old.clone()),
            _ => None,
        })
        .collect()
}
