use std::sync::Arc;

use axum::{Extension, Json, extract::State};
use serde::Serialize;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState, CambioClaveRequest, ClaveRequest, MessageResponse};

#[derive(Debug, Serialize)]
pub struct VerificacionResponse {
    pub autorizado: bool,
}

/// POST /api/seguridad/verificar
///
/// Checks the submitted edit key without performing any mutation. Forms use
/// this to unlock their edit controls; the key is still re-verified on every
/// actual mutation.
pub async fn verificar_clave(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<ClaveRequest>,
) -> Result<Json<ApiResponse<VerificacionResponse>>, ApiError> {
    let verdict = state
        .gate()
        .verify(current.id, current.id, &payload.clave_edicion)
        .await?;

    Ok(Json(ApiResponse::success(VerificacionResponse {
        autorizado: verdict.is_authorized(),
    })))
}

/// PUT /api/seguridad/clave
pub async fn cambiar_clave(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<CambioClaveRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .gate()
        .change_clave(
            current.id,
            &payload.clave_actual,
            &payload.clave_nueva,
            &payload.confirmacion,
        )
        .await?;

    tracing::info!("Edit key changed for user: {}", current.username);

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Clave de edición actualizada",
    ))))
}

/// POST /api/seguridad/reset
///
/// Restores the documented default edit key. Only the owner's login session
/// guards this; it exists so a forgotten key never locks records permanently.
pub async fn reset_clave(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.gate().reset_to_default(current.id).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Clave de edición restablecida",
    ))))
}
