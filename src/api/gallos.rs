use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
};

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, ClaveRequest, GalloDto, MessageResponse, AppState};
use crate::constants::fotos::GALLO_SLOTS;
use crate::models::{GalloInput, TipoBrida};
use crate::services::UploadBatch;

/// Text fields, uploaded photo URLs and the optional inline edit key
/// extracted from one multipart form submission.
struct GalloForm {
    input: GalloInput,
    fotos: HashMap<String, String>,
    clave: Option<String>,
}

/// Drains the multipart body, writing photo parts through `batch` as they
/// arrive. The caller must roll the batch back when this returns an error or
/// when anything later in the request fails.
async fn parse_form(
    user_id: i32,
    mut multipart: Multipart,
    batch: &mut UploadBatch<'_>,
) -> Result<GalloForm, ApiError> {
    let mut form = GalloForm {
        input: GalloInput::default(),
        fotos: HashMap::new(),
        clave: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Invalid multipart payload: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if let Some(file_name) = field.file_name().map(ToString::to_string) {
            if !GALLO_SLOTS.contains(&name.as_str()) {
                continue;
            }
            let content_type = field.content_type().map(ToString::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::validation(format!("Invalid photo upload: {e}")))?;
            // Browsers submit empty file parts for untouched slots.
            if file_name.is_empty() || bytes.is_empty() {
                continue;
            }
            let url = batch
                .save(user_id, &file_name, content_type.as_deref(), &bytes)
                .await?;
            form.fotos.insert(name, url);
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::validation(format!("Invalid form field: {e}")))?;
            if name == "clave_edicion" {
                form.clave = Some(value);
            } else {
                form.input.set_field(&name, value);
            }
        }
    }

    Ok(form)
}

fn validate_input(input: &GalloInput) -> Result<(), ApiError> {
    if let Some(tipo) = input.tipo_brida.as_deref().map(str::trim)
        && !tipo.is_empty()
        && TipoBrida::parse(tipo).is_none()
    {
        return Err(ApiError::validation(
            "tipo_brida debe ser 'brida' o 'tairra'",
        ));
    }
    Ok(())
}

/// GET /api/gallos
pub async fn list_gallos(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<GalloDto>>>, ApiError> {
    let gallos = state.store().list_gallos(current.id).await?;
    let dtos = gallos.into_iter().map(GalloDto::from).collect();
    Ok(Json(ApiResponse::success(dtos)))
}

/// GET /api/gallos/{id}
pub async fn get_gallo(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<GalloDto>>, ApiError> {
    let gallo = state
        .store()
        .get_gallo(&id, current.id)
        .await?
        .ok_or_else(|| ApiError::gallo_not_found(&id))?;
    Ok(Json(ApiResponse::success(GalloDto::from(gallo))))
}

/// POST /api/gallos
///
/// Multipart form. Only `nombre` is required; photo slots are optional and
/// staged to disk before the row is inserted, then removed again if the
/// insert fails.
pub async fn create_gallo(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<GalloDto>>, ApiError> {
    let mut batch = UploadBatch::new(state.photos());
    let form = match parse_form(current.id, multipart, &mut batch).await {
        Ok(form) => form,
        Err(e) => {
            batch.rollback().await;
            return Err(e);
        }
    };

    if form
        .input
        .nombre
        .as_deref()
        .is_none_or(|n| n.trim().is_empty())
    {
        batch.rollback().await;
        return Err(ApiError::validation("El nombre del gallo es obligatorio"));
    }

    if let Err(e) = validate_input(&form.input) {
        batch.rollback().await;
        return Err(e);
    }

    match state
        .store()
        .add_gallo(current.id, &form.input, &form.fotos)
        .await
    {
        Ok(created) => {
            batch.commit();
            Ok(Json(ApiResponse::success(GalloDto::from(created))))
        }
        Err(e) => {
            batch.rollback().await;
            Err(e.into())
        }
    }
}

/// PUT /api/gallos/{id}
///
/// Multipart form carrying any subset of fields plus the edit key as
/// `clave_edicion`. Blank fields keep stored values; a slot with a new photo
/// replaces the old one, whose blob is removed once the row is saved.
pub async fn update_gallo(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<GalloDto>>, ApiError> {
    let existing = state
        .store()
        .get_gallo(&id, current.id)
        .await?
        .ok_or_else(|| ApiError::gallo_not_found(&id))?;

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

    if let Err(e) = validate_input(&form.input) {
        batch.rollback().await;
        return Err(e);
    }

    let replaced = replaced_urls(&existing, &form.fotos);

    match state
        .store()
        .update_gallo(existing, &form.input, &form.fotos)
        .await
    {
        Ok(updated) => {
            batch.commit();
            for url in replaced {
                if let Err(e) = state.photos().remove(&url).await {
                    tracing::warn!("Failed to remove replaced photo {url}: {e}");
                }
            }
            Ok(Json(ApiResponse::success(GalloDto::from(updated))))
        }
        Err(e) => {
            batch.rollback().await;
            Err(e.into())
        }
    }
}

/// DELETE /api/gallos/{id}
///
/// Body carries the edit key. Photo blobs are removed before the row; when a
/// blob removal fails the record is kept and the error surfaced, so a row
/// never outlives the request while still pointing at missing files silently.
pub async fn delete_gallo(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<ClaveRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let existing = state
        .store()
        .get_gallo(&id, current.id)
        .await?
        .ok_or_else(|| ApiError::gallo_not_found(&id))?;

    let verdict = state
        .gate()
        .verify(existing.user_id, current.id, &payload.clave_edicion)
        .await?;
    if !verdict.is_authorized() {
        return Err(ApiError::clave_incorrecta());
    }

    let urls = photo_urls(&existing);
    state.photos().remove_all(&urls).await?;

    let removed = state.store().remove_gallo(&id, current.id).await?;
    if !removed {
        return Err(ApiError::gallo_not_found(&id));
    }

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Gallo eliminado",
    ))))
}

fn photo_urls(gallo: &crate::entities::gallos::Model) -> Vec<String> {
    [
        &gallo.foto_gallo,
        &gallo.foto_padre,
        &gallo.foto_madre,
        &gallo.foto_abuelo,
        &gallo.foto_abuela,
    ]
    .into_iter()
    .filter_map(|url| url.clone())
    .collect()
}

fn replaced_urls(
    gallo: &crate::entities::gallos::Model,
    fotos: &HashMap<String, String>,
) -> Vec<String> {
    let slots: [(&str, &Option<String>); 5] = [
        ("foto_gallo", &gallo.foto_gallo),
        ("foto_padre", &gallo.foto_padre),
        ("foto_madre", &gallo.foto_madre),
        ("foto_abuelo", &gallo.foto_abuelo),
        ("foto_abuela", &gallo.foto_abuela),
    ];
    slots
        .into_iter()
        .filter_map(|(slot, old)| match (fotos.get(slot), old) {
            (Some(new), Some(old)) if new != old => Some(old.clone()),
            _ => None,
        })
        .collect()
}
