use axum::{
    Extension, Json,
    extract::{Query, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_sessions::Session;
use uuid::Uuid;

use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::constants::seguridad::{LOGIN_CODE_TTL_SECS, MIN_PASSWORD_LEN};

/// Session keys. Both are written at login and read together by the
/// middleware so authenticated handlers never need a user lookup.
pub(crate) const SESSION_USER_ID: &str = "user_id";
const SESSION_USERNAME: &str = "user";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub username: String,
    pub api_key: String,
}

#[derive(Serialize)]
pub struct UserInfoResponse {
    pub username: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Serialize)]
pub struct LoginCodeResponse {
    pub code: String,
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub code: String,
}

/// Authenticated requester, resolved once by [`auth_middleware`] and handed
/// to handlers as a request extension.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i32,
    pub username: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Authentication middleware that checks:
/// 1. Session cookie (from login)
/// 2. `X-Api-Key` header
/// 3. `Authorization: Bearer <api_key>` header
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    // Check session first (fastest path for web UI)
    if let Ok(Some(user_id)) = session.get::<i32>(SESSION_USER_ID).await
        && let Ok(Some(username)) = session.get::<String>(SESSION_USERNAME).await
    {
        tracing::Span::current().record("user_id", user_id);
        request.extensions_mut().insert(CurrentUser {
            id: user_id,
            username,
        });
        return Ok(next.run(request).await);
    }

    if let Some(key) = extract_api_key(&headers)
        && let Ok(Some(user)) = state.store().verify_api_key(&key).await
    {
        tracing::Span::current().record("user_id", user.id);
        request.extensions_mut().insert(CurrentUser {
            id: user.id,
            username: user.username,
        });
        return Ok(next.run(request).await);
    }

    let response = (StatusCode::UNAUTHORIZED, "Unauthorized");
    Ok(response.into_response())
}

/// Extract API key from headers
fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    // Check X-Api-Key header
    if let Some(api_key) = headers.get("X-Api-Key")
        && let Ok(key_str) = api_key.to_str()
    {
        return Some(key_str.to_string());
    }

    // Check Authorization: Bearer header
    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/login
/// Authenticate with username and password, returns API key on success
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let is_valid = state
        .store()
        .verify_user_password(&payload.username, &payload.password)
        .await
        .map_err(|e| ApiError::internal(format!("Authentication error: {e}")))?;

    if !is_valid {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let user = state
        .store()
        .get_user_by_username(&payload.username)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get user: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;

    establish_session(&session, user.id, &user.username).await?;

    Ok(Json(ApiResponse::success(LoginResponse {
        username: user.username,
        api_key: user.api_key,
    })))
}

/// POST /api/auth/register
/// Create a new account and start a session for it
pub async fn register(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    if payload.username.trim().is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let existing = state
        .store()
        .get_user_by_username(payload.username.trim())
        .await
        .map_err(|e| ApiError::internal(format!("Failed to check username: {e}")))?;
    if existing.is_some() {
        return Err(ApiError::validation("Username is already taken"));
    }

    let security = state.config().await.security;
    let user = state
        .store()
        .create_user(payload.username.trim(), &payload.password, &security)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create user: {e}")))?;

    tracing::info!("Registered new user: {}", user.username);

    establish_session(&session, user.id, &user.username).await?;

    Ok(Json(ApiResponse::success(LoginResponse {
        username: user.username,
        api_key: user.api_key,
    })))
}

/// POST /api/auth/logout
/// Invalidate the current session
pub async fn logout(session: Session) -> Json<ApiResponse<MessageResponse>> {
    let _ = session.flush().await;
    Json(ApiResponse::success(MessageResponse::new("Logged out")))
}

/// GET /api/auth/me
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<UserInfoResponse>>, ApiError> {
    let user = state
        .store()
        .get_user_by_id(current.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get user: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;

    Ok(Json(ApiResponse::success(UserInfoResponse {
        username: user.username,
        created_at: user.created_at,
        updated_at: user.updated_at,
    })))
}

/// PUT /api/auth/password
/// Change password (requires current password verification)
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    if payload.new_password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "New password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    if payload.current_password == payload.new_password {
        return Err(ApiError::validation(
            "New password must be different from current password",
        ));
    }

    let is_valid = state
        .store()
        .verify_user_password(&current.username, &payload.current_password)
        .await
        .map_err(|e| ApiError::internal(format!("Password verification error: {e}")))?;

    if !is_valid {
        return Err(ApiError::validation("Current password is incorrect"));
    }

    let security = state.config().await.security;
    state
        .store()
        .update_user_password(&current.username, &payload.new_password, &security)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to update password: {e}")))?;

    tracing::info!("Password changed for user: {}", current.username);

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password updated successfully",
    ))))
}

/// POST /api/auth/code
///
/// Mints a single-use login code for the session user. Exchanged via
/// GET /auth/callback, which lets a sign-in link carry authentication
/// across a browser navigation without ever exposing credentials in a URL.
pub async fn create_login_code(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Json<ApiResponse<LoginCodeResponse>> {
    let code = Uuid::new_v4().to_string();
    let mut codes = state.login_codes.lock().await;
    codes.retain(|_, (_, minted)| minted.elapsed() < Duration::from_secs(LOGIN_CODE_TTL_SECS));
    codes.insert(code.clone(), (current.id, Instant::now()));
    drop(codes);

    Json(ApiResponse::success(LoginCodeResponse { code }))
}

/// GET /auth/callback?code=...
///
/// Public route. Consumes a minted login code: on success the browser gets
/// a session and lands on the dashboard, otherwise it bounces back to login
/// with an error marker. Codes are one-shot and expire after five minutes.
pub async fn auth_callback(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Redirect {
    if query.code.is_empty() {
        return Redirect::to("/login?error=codigo_faltante");
    }

    let user_id = {
        let mut codes = state.login_codes.lock().await;
        match codes.remove(&query.code) {
            Some((user_id, minted))
                if minted.elapsed() < Duration::from_secs(LOGIN_CODE_TTL_SECS) =>
            {
                Some(user_id)
            }
            _ => None,
        }
    };

    let Some(user_id) = user_id else {
        tracing::warn!("Rejected invalid or expired login code");
        return Redirect::to("/login?error=codigo_invalido");
    };

    let user = match state.store().get_user_by_id(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return Redirect::to("/login?error=codigo_invalido"),
        Err(e) => {
            tracing::error!("Login code exchange failed: {e}");
            return Redirect::to("/login?error=codigo_invalido");
        }
    };

    if establish_session(&session, user.id, &user.username)
        .await
        .is_err()
    {
        return Redirect::to("/login?error=sesion");
    }

    Redirect::to("/")
}

// ============================================================================
// Helpers
// ============================================================================

async fn establish_session(session: &Session, user_id: i32, username: &str) -> Result<(), ApiError> {
    session
        .insert(SESSION_USER_ID, user_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;
    session
        .insert(SESSION_USERNAME, username)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;
    Ok(())
}
